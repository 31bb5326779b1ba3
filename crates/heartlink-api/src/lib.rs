pub mod auth;
pub mod discover;
pub mod likes;
pub mod matches;
pub mod messages;
pub mod middleware;
pub mod profile;

use axum::{
    Router,
    routing::{get, post, put},
};

pub use auth::{AppState, AppStateInner};

/// Assemble the full API surface. Everything past the public auth routes
/// requires a bearer token.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/verification/{token}", get(auth::verification_info))
        .route("/api/auth/verify", post(auth::verify))
        .route("/api/auth/forgot-password", post(auth::forgot_password))
        .route("/api/auth/reset-password", post(auth::reset_password))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/profile", get(profile::get_profile))
        .route("/api/profile", put(profile::update_profile))
        .route("/api/discover", get(discover::get_candidates))
        .route("/api/likes", post(likes::create_like))
        .route("/api/matches", get(matches::list_matches))
        .route("/api/matches/{match_id}/messages", get(messages::get_messages))
        .route("/api/matches/{match_id}/messages", post(messages::send_message))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}
