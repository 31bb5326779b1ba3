use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id                          INTEGER PRIMARY KEY AUTOINCREMENT,
            username                    TEXT NOT NULL UNIQUE,
            email                       TEXT NOT NULL UNIQUE,
            password                    TEXT NOT NULL,
            first_name                  TEXT NOT NULL,
            last_name                   TEXT,
            date_of_birth               TEXT NOT NULL,
            gender                      TEXT NOT NULL,
            interested_in               TEXT NOT NULL,
            is_verified                 INTEGER NOT NULL DEFAULT 0,
            verification_token          TEXT,
            verification_token_expiry   TEXT,
            created_at                  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS profiles (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         INTEGER NOT NULL UNIQUE REFERENCES users(id),
            bio             TEXT,
            country         TEXT,
            state           TEXT,
            city            TEXT,
            vicinity        TEXT,
            coordinates     TEXT,
            profession      TEXT NOT NULL DEFAULT '',
            interests       TEXT NOT NULL DEFAULT '[]',
            photos          TEXT NOT NULL DEFAULT '[]',
            last_active     TEXT
        );

        CREATE TABLE IF NOT EXISTS likes (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            liker_id    INTEGER NOT NULL REFERENCES users(id),
            liked_id    INTEGER NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL,
            UNIQUE(liker_id, liked_id)
        );

        CREATE INDEX IF NOT EXISTS idx_likes_liked
            ON likes(liked_id);

        CREATE TABLE IF NOT EXISTS matches (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user1_id    INTEGER NOT NULL REFERENCES users(id),
            user2_id    INTEGER NOT NULL REFERENCES users(id),
            matched_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_matches_user1
            ON matches(user1_id);

        CREATE INDEX IF NOT EXISTS idx_matches_user2
            ON matches(user2_id);

        CREATE TABLE IF NOT EXISTS messages (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            match_id    INTEGER NOT NULL REFERENCES matches(id),
            sender_id   INTEGER NOT NULL REFERENCES users(id),
            receiver_id INTEGER NOT NULL REFERENCES users(id),
            content     TEXT NOT NULL,
            sent_at     TEXT NOT NULL,
            is_read     INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_messages_match
            ON messages(match_id, sent_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
