use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;

use heartlink_db::Database;
use heartlink_types::api::{Claims, SendMessageRequest};
use heartlink_types::models::Match;

use crate::auth::AppState;

/// Membership gate shared by both message routes: 404 when the match does
/// not exist, 403 when the caller is not one of its two members.
fn member_match(db: &Database, match_id: i64, user_id: i64) -> Result<Match, StatusCode> {
    let pairing = db
        .get_match(match_id)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    if !pairing.involves(user_id) {
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(pairing)
}

pub async fn get_messages(
    State(state): State<AppState>,
    Path(match_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let viewer_id = claims.sub;

    // Run blocking DB work off the async runtime
    let db = state.clone();
    let messages = tokio::task::spawn_blocking(move || {
        member_match(&db.db, match_id, viewer_id)?;
        // Opening the conversation marks everything addressed to the
        // viewer as read
        db.db
            .list_and_mark_read(match_id, viewer_id)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
    })
    .await
    .map_err(|e| { error!("spawn_blocking join error: {}", e); StatusCode::INTERNAL_SERVER_ERROR })??;

    Ok(Json(messages))
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(match_id): Path<i64>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if req.content.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let sender_id = claims.sub;

    // Run blocking DB work off the async runtime
    let db = state.clone();
    let message = tokio::task::spawn_blocking(move || {
        let pairing = member_match(&db.db, match_id, sender_id)?;
        // The receiver is always the other member
        let receiver_id = pairing.other_member(sender_id);
        db.db
            .create_message(match_id, sender_id, receiver_id, &req.content)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
    })
    .await
    .map_err(|e| { error!("spawn_blocking join error: {}", e); StatusCode::INTERNAL_SERVER_ERROR })??;

    Ok((StatusCode::CREATED, Json(message)))
}
