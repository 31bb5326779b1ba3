use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

use heartlink_db::models::ProfileChanges;
use heartlink_types::api::{Claims, UpdateProfileRequest};

use crate::auth::AppState;

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    // Checking your own profile counts as activity
    state
        .db
        .touch_last_active(claims.sub)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let profile = state
        .db
        .get_profile(claims.sub)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(profile))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let changes = ProfileChanges {
        bio: req.bio,
        country: req.country,
        state: req.state,
        city: req.city,
        vicinity: req.vicinity,
        coordinates: req.coordinates,
        profession: req.profession,
        interests: req.interests,
        photos: req.photos,
    };

    let profile = state
        .db
        .update_profile(claims.sub, &changes)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(profile))
}
