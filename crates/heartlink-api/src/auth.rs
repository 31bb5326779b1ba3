use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use heartlink_db::{Database, models::NewUser, models::UserRow};
use heartlink_types::api::{
    AuthResponse, Claims, ForgotPasswordRequest, LoginRequest, RegisterRequest,
    ResetPasswordRequest, VerificationInfo, VerifyRequest,
};
use heartlink_types::models::User;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

/// Verification links live for a day, password-reset links for an hour.
const VERIFY_TOKEN_HOURS: i64 = 24;
const RESET_TOKEN_HOURS: i64 = 1;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    // Validate input
    if req.username.len() < 3 || req.username.len() > 32 {
        return Err(StatusCode::BAD_REQUEST);
    }
    if req.password.len() < 8 {
        return Err(StatusCode::BAD_REQUEST);
    }
    if !req.email.contains('@') {
        return Err(StatusCode::BAD_REQUEST);
    }

    // Username and email are both unique
    if state
        .db
        .get_user_by_username(&req.username)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .is_some()
    {
        return Err(StatusCode::CONFLICT);
    }
    if state
        .db
        .get_user_by_email(&req.email)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .is_some()
    {
        return Err(StatusCode::CONFLICT);
    }

    // Hash password with Argon2id
    let password_hash = hash_password(&req.password)?;

    let verification_token = fresh_token();
    let row = state
        .db
        .create_user(&NewUser {
            username: &req.username,
            email: &req.email,
            password: &password_hash,
            first_name: &req.first_name,
            last_name: req.last_name.as_deref(),
            date_of_birth: &req.date_of_birth,
            gender: &req.gender,
            interested_in: &req.interested_in,
            verification_token: &verification_token,
            verification_token_expiry: Utc::now() + Duration::hours(VERIFY_TOKEN_HOURS),
        })
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    // Every account starts with an empty profile
    state
        .db
        .create_profile(row.id)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    // No mailer wired up; log the link instead
    info!(
        "Verification link for {}: /verify?token={}",
        row.username, verification_token
    );

    let token = create_token(&state.jwt_secret, row.id, &row.username)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: row.into(),
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let user = state
        .db
        .get_user_by_username(&req.username)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // Verify password
    let parsed_hash =
        PasswordHash::new(&user.password).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    // Logging in counts as activity
    state
        .db
        .touch_last_active(user.id)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let token = create_token(&state.jwt_secret, user.id, &user.username)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(AuthResponse {
        user: user.into(),
        token,
    }))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let user = state
        .db
        .get_user(claims.sub)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(User::from(user)))
}

/// What a verification link points at before the user commits: lets the
/// client show who is being verified.
pub async fn verification_info(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let row = user_for_live_token(&state.db, &token)?;

    Ok(Json(VerificationInfo {
        valid: true,
        user_id: row.id,
        first_name: row.first_name,
        is_verified: row.is_verified,
    }))
}

pub async fn verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let row = user_for_live_token(&state.db, &req.token)?;

    state
        .db
        .mark_user_verified(row.id)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let token = create_token(&state.jwt_secret, row.id, &row.username)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let user = User {
        is_verified: true,
        ..row.into()
    };

    Ok(Json(AuthResponse { user, token }))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    // Same response whether or not the account exists
    if let Some(user) = state
        .db
        .get_user_by_email(&req.email)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    {
        let reset_token = fresh_token();
        state
            .db
            .set_user_token(
                user.id,
                &reset_token,
                Utc::now() + Duration::hours(RESET_TOKEN_HOURS),
            )
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

        // No mailer wired up; log the link instead
        info!(
            "Password reset link for {}: /reset-password?token={}",
            user.username, reset_token
        );
    }

    Ok(Json(json!({
        "message": "If that email is registered, reset instructions are on their way"
    })))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if req.password.len() < 8 {
        return Err(StatusCode::BAD_REQUEST);
    }

    let row = user_for_live_token(&state.db, &req.token)?;

    let password_hash = hash_password(&req.password)?;
    state
        .db
        .update_password(row.id, &password_hash)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(json!({ "message": "Password reset successful" })))
}

/// Token lookup shared by the verification and reset endpoints. Unknown
/// and expired tokens look the same to the caller.
fn user_for_live_token(db: &Database, token: &str) -> Result<UserRow, StatusCode> {
    let row = db
        .get_user_by_token(token)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::BAD_REQUEST)?;

    match row.verification_token_expiry {
        Some(expiry) if expiry > Utc::now() => Ok(row),
        _ => Err(StatusCode::BAD_REQUEST),
    }
}

fn hash_password(password: &str) -> Result<String, StatusCode> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Opaque single-use token for verification and reset links.
fn fresh_token() -> String {
    Uuid::new_v4().simple().to_string()
}

fn create_token(secret: &str, user_id: i64, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (Utc::now() + Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
