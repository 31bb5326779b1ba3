use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{error, info};

use heartlink_db::StoreError;
use heartlink_types::api::{Claims, CreateLikeRequest, LikeResponse};

use crate::auth::AppState;

pub async fn create_like(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateLikeRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let liker_id = claims.sub;
    let liked_id = req.liked_id;

    if liker_id == liked_id {
        return Err(StatusCode::BAD_REQUEST);
    }

    // The target has to exist
    if state
        .db
        .get_user(liked_id)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .is_none()
    {
        return Err(StatusCode::NOT_FOUND);
    }

    // Run blocking DB work off the async runtime
    let db = state.clone();
    let outcome = tokio::task::spawn_blocking(move || db.db.create_like(liker_id, liked_id))
        .await
        .map_err(|e| { error!("spawn_blocking join error: {}", e); StatusCode::INTERNAL_SERVER_ERROR })?
        .map_err(|e| match e {
            StoreError::DuplicateLike { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        })?;

    if let Some(pairing) = &outcome.matched {
        info!(
            "Users {} and {} matched (match {})",
            pairing.user1_id, pairing.user2_id, pairing.id
        );
    }

    let is_match = outcome.matched.is_some();
    Ok((
        StatusCode::CREATED,
        Json(LikeResponse {
            like: outcome.like,
            pairing: outcome.matched,
            is_match,
        }),
    ))
}
