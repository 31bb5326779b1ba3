use serde::{Deserialize, Serialize};

use crate::models::{Like, Match, Message, Profile, User};

// -- JWT Claims --

/// JWT claims carried by every authenticated request. Canonical definition
/// lives here in heartlink-types so the REST middleware and the handlers
/// that issue tokens agree on the shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i64,
    pub username: String,
    /// Expiry as a unix timestamp.
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    pub date_of_birth: String,
    pub gender: String,
    pub interested_in: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyRequest {
    pub token: String,
}

/// What a verification link resolves to before the user acts on it.
#[derive(Debug, Serialize)]
pub struct VerificationInfo {
    pub valid: bool,
    pub user_id: i64,
    pub first_name: String,
    pub is_verified: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

// -- Profiles --

/// Partial profile update. Fields left out of the request body stay
/// unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub bio: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub vicinity: Option<String>,
    pub coordinates: Option<String>,
    pub profession: Option<String>,
    pub interests: Option<Vec<String>>,
    pub photos: Option<Vec<String>>,
}

// -- Discovery --

/// One candidate in the discovery feed.
#[derive(Debug, Serialize)]
pub struct DiscoverCard {
    #[serde(flatten)]
    pub user: User,
    pub profile: Option<Profile>,
}

// -- Likes --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateLikeRequest {
    pub liked_id: i64,
}

/// Outcome of a like: the stored like itself, plus the match when this
/// like completed a mutual pair.
#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub like: Like,
    #[serde(rename = "match")]
    pub pairing: Option<Match>,
    pub is_match: bool,
}

// -- Matches and messages --

/// Projection of the other member shown in the match list.
#[derive(Debug, Serialize)]
pub struct MatchedUser {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MatchSummary {
    #[serde(rename = "match")]
    pub pairing: Match,
    pub other_user: Option<MatchedUser>,
    pub other_profile: Option<Profile>,
    pub last_message: Option<Message>,
    pub unread_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub content: String,
}
