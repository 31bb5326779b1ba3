use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account, as served by the API. The password hash and the
/// verification-token columns stay inside the store and never appear here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub date_of_birth: String,
    pub gender: String,
    pub interested_in: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Dating profile attached to a user. Created empty at registration and
/// filled in later through partial updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub user_id: i64,
    pub bio: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub vicinity: Option<String>,
    pub coordinates: Option<String>,
    pub profession: String,
    pub interests: Vec<String>,
    pub photos: Vec<String>,
    pub last_active: Option<DateTime<Utc>>,
}

/// One-directional expression of interest. Likes are never edited or
/// removed once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub id: i64,
    pub liker_id: i64,
    pub liked_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Mutual pairing between two users. `user1_id` is whoever completed the
/// pair; the ordering carries no other meaning, so consumers wanting "the
/// other member" must compare against both ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: i64,
    pub user1_id: i64,
    pub user2_id: i64,
    pub matched_at: DateTime<Utc>,
}

impl Match {
    pub fn involves(&self, user_id: i64) -> bool {
        self.user1_id == user_id || self.user2_id == user_id
    }

    /// The member who is not `user_id`. Only meaningful when
    /// `involves(user_id)` holds.
    pub fn other_member(&self, user_id: i64) -> i64 {
        if self.user1_id == user_id {
            self.user2_id
        } else {
            self.user1_id
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub match_id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub is_read: bool,
}
