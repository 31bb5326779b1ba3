use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::error;

use heartlink_types::api::{Claims, DiscoverCard};

use crate::auth::AppState;

#[derive(Debug, Deserialize)]
pub struct DiscoverQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    10
}

pub async fn get_candidates(
    State(state): State<AppState>,
    Query(query): Query<DiscoverQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let user_id = claims.sub;
    let limit = query.limit.min(100);

    // Run blocking DB work off the async runtime
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.discover_candidates(user_id, limit))
        .await
        .map_err(|e| { error!("spawn_blocking join error: {}", e); StatusCode::INTERNAL_SERVER_ERROR })?
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let cards: Vec<DiscoverCard> = rows
        .into_iter()
        .map(|row| DiscoverCard {
            user: row.user,
            profile: row.profile,
        })
        .collect();

    Ok(Json(cards))
}
