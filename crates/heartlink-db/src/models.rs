//! Row and composite result types for the store. Only the user row
//! differs from its public model (password hash and verification-token
//! columns never leave this crate); Profile, Like, Match and Message are
//! read straight into the heartlink-types models.

use chrono::{DateTime, Utc};

use heartlink_types::models::{Like, Match, Message, Profile, User};

/// Full user row, secrets included.
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub date_of_birth: String,
    pub gender: String,
    pub interested_in: String,
    pub is_verified: bool,
    pub verification_token: Option<String>,
    pub verification_token_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            date_of_birth: row.date_of_birth,
            gender: row.gender,
            interested_in: row.interested_in,
            is_verified: row.is_verified,
            created_at: row.created_at,
        }
    }
}

/// Column set for inserting a new user.
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: Option<&'a str>,
    pub date_of_birth: &'a str,
    pub gender: &'a str,
    pub interested_in: &'a str,
    pub verification_token: &'a str,
    pub verification_token_expiry: DateTime<Utc>,
}

/// Partial profile update. `None` leaves the column as it is.
#[derive(Default)]
pub struct ProfileChanges {
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

/// What recording a like produced: the like itself, and the match when it
/// completed a mutual pair.
#[derive(Debug)]
pub struct LikeOutcome {
    pub like: Like,
    pub matched: Option<Match>,
}

/// One row of the match-list view.
pub struct MatchSummaryRow {
    pub pairing: Match,
    pub other_user: Option<User>,
    pub other_profile: Option<Profile>,
    pub last_message: Option<Message>,
    pub unread_count: u32,
}

/// One discovery candidate, with their profile when one exists.
pub struct DiscoverRow {
    pub user: User,
    pub profile: Option<Profile>,
}
