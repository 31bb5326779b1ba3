use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::warn;

use crate::models::{DiscoverRow, LikeOutcome, MatchSummaryRow, NewUser, ProfileChanges, UserRow};
use crate::{Database, Result, StoreError};
use heartlink_types::models::{Like, Match, Message, Profile, User};

const USER_COLUMNS: &str = "id, username, email, password, first_name, last_name, date_of_birth, \
     gender, interested_in, is_verified, verification_token, verification_token_expiry, created_at";

const PROFILE_COLUMNS: &str = "id, user_id, bio, country, state, city, vicinity, coordinates, \
     profession, interests, photos, last_active";

const MATCH_COLUMNS: &str = "id, user1_id, user2_id, matched_at";

const MESSAGE_COLUMNS: &str = "id, match_id, sender_id, receiver_id, content, sent_at, is_read";

impl Database {
    // -- Users --

    pub fn create_user(&self, new: &NewUser<'_>) -> Result<UserRow> {
        self.with_conn(|conn| {
            let created_at = Utc::now();
            conn.execute(
                "INSERT INTO users (username, email, password, first_name, last_name,
                                    date_of_birth, gender, interested_in, verification_token,
                                    verification_token_expiry, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    new.username,
                    new.email,
                    new.password,
                    new.first_name,
                    new.last_name,
                    new.date_of_birth,
                    new.gender,
                    new.interested_in,
                    new.verification_token,
                    new.verification_token_expiry,
                    created_at,
                ],
            )?;
            Ok(UserRow {
                id: conn.last_insert_rowid(),
                username: new.username.to_string(),
                email: new.email.to_string(),
                password: new.password.to_string(),
                first_name: new.first_name.to_string(),
                last_name: new.last_name.map(str::to_string),
                date_of_birth: new.date_of_birth.to_string(),
                gender: new.gender.to_string(),
                interested_in: new.interested_in.to_string(),
                is_verified: false,
                verification_token: Some(new.verification_token.to_string()),
                verification_token_expiry: Some(new.verification_token_expiry),
                created_at,
            })
        })
    }

    pub fn get_user(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", [id]))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username = ?1", [username]))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email = ?1", [email]))
    }

    pub fn get_user_by_token(&self, token: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "verification_token = ?1", [token]))
    }

    /// Rotate the verification/reset token. The same column pair backs
    /// both flows; issuing one kind invalidates the other.
    pub fn set_user_token(
        &self,
        id: i64,
        token: &str,
        expiry: chrono::DateTime<Utc>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET verification_token = ?2, verification_token_expiry = ?3
                 WHERE id = ?1",
                params![id, token, expiry],
            )?;
            Ok(())
        })
    }

    /// Flip the verified flag and consume the token.
    pub fn mark_user_verified(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET is_verified = 1, verification_token = NULL,
                                  verification_token_expiry = NULL
                 WHERE id = ?1",
                [id],
            )?;
            Ok(())
        })
    }

    /// Store a new password hash and consume the reset token.
    pub fn update_password(&self, id: i64, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET password = ?2, verification_token = NULL,
                                  verification_token_expiry = NULL
                 WHERE id = ?1",
                params![id, password_hash],
            )?;
            Ok(())
        })
    }

    // -- Profiles --

    pub fn create_profile(&self, user_id: i64) -> Result<Profile> {
        self.with_conn(|conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO profiles (user_id, bio, interests, photos, last_active)
                 VALUES (?1, '', '[]', '[]', ?2)",
                params![user_id, now],
            )?;
            Ok(Profile {
                id: conn.last_insert_rowid(),
                user_id,
                bio: Some(String::new()),
                country: None,
                state: None,
                city: None,
                vicinity: None,
                coordinates: None,
                profession: String::new(),
                interests: Vec::new(),
                photos: Vec::new(),
                last_active: Some(now),
            })
        })
    }

    pub fn get_profile(&self, user_id: i64) -> Result<Option<Profile>> {
        self.with_conn(|conn| query_profile_by_user(conn, user_id))
    }

    /// Partial merge: only supplied fields change, everything else keeps
    /// its stored value. `last_active` is refreshed on every update.
    pub fn update_profile(
        &self,
        user_id: i64,
        changes: &ProfileChanges,
    ) -> Result<Option<Profile>> {
        self.with_conn(|conn| {
            let Some(current) = query_profile_by_user(conn, user_id)? else {
                return Ok(None);
            };

            let interests = changes.interests.as_ref().unwrap_or(&current.interests);
            let photos = changes.photos.as_ref().unwrap_or(&current.photos);

            conn.execute(
                "UPDATE profiles
                 SET bio = ?2, country = ?3, state = ?4, city = ?5, vicinity = ?6,
                     coordinates = ?7, profession = ?8, interests = ?9, photos = ?10,
                     last_active = ?11
                 WHERE user_id = ?1",
                params![
                    user_id,
                    changes.bio.as_deref().or(current.bio.as_deref()),
                    changes.country.as_deref().or(current.country.as_deref()),
                    changes.state.as_deref().or(current.state.as_deref()),
                    changes.city.as_deref().or(current.city.as_deref()),
                    changes.vicinity.as_deref().or(current.vicinity.as_deref()),
                    changes.coordinates.as_deref().or(current.coordinates.as_deref()),
                    changes.profession.as_deref().unwrap_or(&current.profession),
                    serde_json::to_string(interests)?,
                    serde_json::to_string(photos)?,
                    Utc::now(),
                ],
            )?;

            query_profile_by_user(conn, user_id)
        })
    }

    /// Refresh `last_active` without touching anything else. No-op when
    /// the user has no profile row.
    pub fn touch_last_active(&self, user_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE profiles SET last_active = ?2 WHERE user_id = ?1",
                params![user_id, Utc::now()],
            )?;
            Ok(())
        })
    }

    // -- Likes and matches --

    pub fn get_like_between(&self, liker_id: i64, liked_id: i64) -> Result<Option<Like>> {
        self.with_conn(|conn| query_like(conn, liker_id, liked_id))
    }

    /// Record a like and form the match when it completes a mutual pair.
    ///
    /// The duplicate check, the insert, the reverse-edge lookup and the
    /// match creation all run in one transaction under the store lock, so
    /// two racing calls cannot slip past each other's checks. The
    /// completing liker is stored as `user1_id`.
    pub fn create_like(&self, liker_id: i64, liked_id: i64) -> Result<LikeOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if query_like(&tx, liker_id, liked_id)?.is_some() {
                return Err(StoreError::DuplicateLike { liker_id, liked_id });
            }

            let created_at = Utc::now();
            tx.execute(
                "INSERT INTO likes (liker_id, liked_id, created_at) VALUES (?1, ?2, ?3)",
                params![liker_id, liked_id, created_at],
            )?;
            let like = Like {
                id: tx.last_insert_rowid(),
                liker_id,
                liked_id,
                created_at,
            };

            // A like back from the target completes the pair. Guard against
            // minting a second match if one already exists for these two.
            let matched = if query_like(&tx, liked_id, liker_id)?.is_some() {
                match query_match_between(&tx, liker_id, liked_id)? {
                    Some(existing) => Some(existing),
                    None => {
                        let matched_at = Utc::now();
                        tx.execute(
                            "INSERT INTO matches (user1_id, user2_id, matched_at)
                             VALUES (?1, ?2, ?3)",
                            params![liker_id, liked_id, matched_at],
                        )?;
                        Some(Match {
                            id: tx.last_insert_rowid(),
                            user1_id: liker_id,
                            user2_id: liked_id,
                            matched_at,
                        })
                    }
                }
            } else {
                None
            };

            tx.commit()?;
            Ok(LikeOutcome { like, matched })
        })
    }

    pub fn get_match(&self, id: i64) -> Result<Option<Match>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = ?1"))?;
            let row = stmt.query_row([id], match_from_row).optional()?;
            Ok(row)
        })
    }

    pub fn get_match_between(&self, a: i64, b: i64) -> Result<Option<Match>> {
        self.with_conn(|conn| query_match_between(conn, a, b))
    }

    pub fn matches_for_user(&self, user_id: i64) -> Result<Vec<Match>> {
        self.with_conn(|conn| query_matches_for_user(conn, user_id))
    }

    /// Match-list view for `user_id`: each match they belong to, with the
    /// other member's public user and profile, the latest message and the
    /// count of messages they have not read yet. Listing never marks
    /// anything read; only opening the conversation does.
    pub fn match_summaries(&self, user_id: i64) -> Result<Vec<MatchSummaryRow>> {
        self.with_conn(|conn| {
            let pairings = query_matches_for_user(conn, user_id)?;

            let mut rows = Vec::with_capacity(pairings.len());
            for pairing in pairings {
                let other_id = pairing.other_member(user_id);
                let other_user = query_user(conn, "id = ?1", [other_id])?.map(User::from);
                let other_profile = query_profile_by_user(conn, other_id)?;

                let last_message = conn
                    .query_row(
                        &format!(
                            "SELECT {MESSAGE_COLUMNS} FROM messages
                             WHERE match_id = ?1 ORDER BY sent_at DESC, id DESC LIMIT 1"
                        ),
                        [pairing.id],
                        message_from_row,
                    )
                    .optional()?;

                let unread_count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM messages
                     WHERE match_id = ?1 AND receiver_id = ?2 AND is_read = 0",
                    params![pairing.id, user_id],
                    |row| row.get(0),
                )?;

                rows.push(MatchSummaryRow {
                    pairing,
                    other_user,
                    other_profile,
                    last_message,
                    unread_count: unread_count as u32,
                });
            }

            Ok(rows)
        })
    }

    // -- Messages --

    /// The conversation for a match in send order, marking every message
    /// addressed to `viewer_id` as read. Both steps run under one lock
    /// acquisition, and the returned rows carry the read flags as they
    /// were when fetched.
    pub fn list_and_mark_read(&self, match_id: i64, viewer_id: i64) -> Result<Vec<Message>> {
        self.with_conn(|conn| {
            let messages = query_messages(conn, match_id)?;
            conn.execute(
                "UPDATE messages SET is_read = 1
                 WHERE match_id = ?1 AND receiver_id = ?2 AND is_read = 0",
                params![match_id, viewer_id],
            )?;
            Ok(messages)
        })
    }

    pub fn messages_for_match(&self, match_id: i64) -> Result<Vec<Message>> {
        self.with_conn(|conn| query_messages(conn, match_id))
    }

    pub fn create_message(
        &self,
        match_id: i64,
        sender_id: i64,
        receiver_id: i64,
        content: &str,
    ) -> Result<Message> {
        self.with_conn(|conn| {
            let sent_at = Utc::now();
            conn.execute(
                "INSERT INTO messages (match_id, sender_id, receiver_id, content, sent_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![match_id, sender_id, receiver_id, content, sent_at],
            )?;
            Ok(Message {
                id: conn.last_insert_rowid(),
                match_id,
                sender_id,
                receiver_id,
                content: content.to_string(),
                sent_at,
                is_read: false,
            })
        })
    }

    // -- Discovery --

    /// Candidate feed for `user_id`: every other user, minus anyone they
    /// have already liked and minus the other member of any match they are
    /// in, in insertion order. Someone filtered out here never reappears,
    /// no matter how often the feed is refetched.
    pub fn discover_candidates(&self, user_id: i64, limit: u32) -> Result<Vec<DiscoverRow>> {
        self.with_conn(|conn| {
            // JOIN profiles in the same query (eliminates N+1)
            let mut stmt = conn.prepare(
                "SELECT u.id, u.username, u.email, u.first_name, u.last_name, u.date_of_birth,
                        u.gender, u.interested_in, u.is_verified, u.created_at,
                        p.id, p.user_id, p.bio, p.country, p.state, p.city, p.vicinity,
                        p.coordinates, p.profession, p.interests, p.photos, p.last_active
                 FROM users u
                 LEFT JOIN profiles p ON p.user_id = u.id
                 WHERE u.id <> ?1
                   AND u.id NOT IN (SELECT liked_id FROM likes WHERE liker_id = ?1)
                   AND u.id NOT IN (SELECT CASE WHEN user1_id = ?1 THEN user2_id
                                                ELSE user1_id END
                                    FROM matches WHERE user1_id = ?1 OR user2_id = ?1)
                 ORDER BY u.id
                 LIMIT ?2",
            )?;

            let rows = stmt
                .query_map(params![user_id, limit], |row| {
                    let user = User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        email: row.get(2)?,
                        first_name: row.get(3)?,
                        last_name: row.get(4)?,
                        date_of_birth: row.get(5)?,
                        gender: row.get(6)?,
                        interested_in: row.get(7)?,
                        is_verified: row.get(8)?,
                        created_at: row.get(9)?,
                    };
                    // Profile columns are all NULL when the join found nothing
                    let profile = match row.get::<_, Option<i64>>(10)? {
                        Some(profile_id) => Some(Profile {
                            id: profile_id,
                            user_id: row.get(11)?,
                            bio: row.get(12)?,
                            country: row.get(13)?,
                            state: row.get(14)?,
                            city: row.get(15)?,
                            vicinity: row.get(16)?,
                            coordinates: row.get(17)?,
                            profession: row.get(18)?,
                            interests: decode_list(&row.get::<_, String>(19)?),
                            photos: decode_list(&row.get::<_, String>(20)?),
                            last_active: row.get(21)?,
                        }),
                        None => None,
                    };
                    Ok(DiscoverRow { user, profile })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn query_user(
    conn: &Connection,
    predicate: &str,
    params: impl rusqlite::Params,
) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE {predicate}"))?;
    let row = stmt.query_row(params, user_from_row).optional()?;
    Ok(row)
}

fn query_profile_by_user(conn: &Connection, user_id: i64) -> Result<Option<Profile>> {
    let mut stmt =
        conn.prepare(&format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = ?1"))?;
    let row = stmt.query_row([user_id], profile_from_row).optional()?;
    Ok(row)
}

fn query_like(conn: &Connection, liker_id: i64, liked_id: i64) -> Result<Option<Like>> {
    let mut stmt = conn.prepare(
        "SELECT id, liker_id, liked_id, created_at FROM likes
         WHERE liker_id = ?1 AND liked_id = ?2",
    )?;
    let row = stmt
        .query_row(params![liker_id, liked_id], like_from_row)
        .optional()?;
    Ok(row)
}

fn query_match_between(conn: &Connection, a: i64, b: i64) -> Result<Option<Match>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MATCH_COLUMNS} FROM matches
         WHERE (user1_id = ?1 AND user2_id = ?2) OR (user1_id = ?2 AND user2_id = ?1)"
    ))?;
    let row = stmt.query_row(params![a, b], match_from_row).optional()?;
    Ok(row)
}

fn query_matches_for_user(conn: &Connection, user_id: i64) -> Result<Vec<Match>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MATCH_COLUMNS} FROM matches
         WHERE user1_id = ?1 OR user2_id = ?1
         ORDER BY id"
    ))?;
    let rows = stmt
        .query_map([user_id], match_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_messages(conn: &Connection, match_id: i64) -> Result<Vec<Message>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages
         WHERE match_id = ?1
         ORDER BY sent_at, id"
    ))?;
    let rows = stmt
        .query_map([match_id], message_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        first_name: row.get(4)?,
        last_name: row.get(5)?,
        date_of_birth: row.get(6)?,
        gender: row.get(7)?,
        interested_in: row.get(8)?,
        is_verified: row.get(9)?,
        verification_token: row.get(10)?,
        verification_token_expiry: row.get(11)?,
        created_at: row.get(12)?,
    })
}

fn profile_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: row.get(0)?,
        user_id: row.get(1)?,
        bio: row.get(2)?,
        country: row.get(3)?,
        state: row.get(4)?,
        city: row.get(5)?,
        vicinity: row.get(6)?,
        coordinates: row.get(7)?,
        profession: row.get(8)?,
        interests: decode_list(&row.get::<_, String>(9)?),
        photos: decode_list(&row.get::<_, String>(10)?),
        last_active: row.get(11)?,
    })
}

fn like_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Like> {
    Ok(Like {
        id: row.get(0)?,
        liker_id: row.get(1)?,
        liked_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn match_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Match> {
    Ok(Match {
        id: row.get(0)?,
        user1_id: row.get(1)?,
        user2_id: row.get(2)?,
        matched_at: row.get(3)?,
    })
}

fn message_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        match_id: row.get(1)?,
        sender_id: row.get(2)?,
        receiver_id: row.get(3)?,
        content: row.get(4)?,
        sent_at: row.get(5)?,
        is_read: row.get(6)?,
    })
}

/// JSON-array text column to list. Corrupt values decode to empty rather
/// than failing the whole row.
fn decode_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!("Corrupt list column {:?}: {}", raw, e);
        Vec::new()
    })
}
