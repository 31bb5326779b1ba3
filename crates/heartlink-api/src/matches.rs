use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::error;

use heartlink_types::api::{Claims, MatchSummary, MatchedUser};

use crate::auth::AppState;

/// The caller's match list. Unread counts here are a passive report;
/// nothing gets marked read until the conversation itself is opened.
pub async fn list_matches(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let user_id = claims.sub;

    // Run blocking DB work off the async runtime
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.match_summaries(user_id))
        .await
        .map_err(|e| { error!("spawn_blocking join error: {}", e); StatusCode::INTERNAL_SERVER_ERROR })?
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let summaries: Vec<MatchSummary> = rows
        .into_iter()
        .map(|row| MatchSummary {
            pairing: row.pairing,
            other_user: row.other_user.map(|user| MatchedUser {
                id: user.id,
                username: user.username,
                first_name: user.first_name,
                last_name: user.last_name,
            }),
            other_profile: row.other_profile,
            last_message: row.last_message,
            unread_count: row.unread_count,
        })
        .collect();

    Ok(Json(summaries))
}
