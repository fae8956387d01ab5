use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,                     // assigned once at signup
    pub name: String,                 // display name
    pub email: String,                // unique lookup key
    #[serde(skip_serializing)]
    pub password_hash: String,        // Argon2 hash, not exposed in JSON
    pub recs: Vec<i64>,               // recommended movie ids
    pub watchlist: Vec<i64>,          // saved movie ids
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            recs: Vec::new(),
            watchlist: Vec::new(),
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

/// The client-writable part of a user. Applied as a whole: every field
/// overwrites the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserReplacement {
    pub name: String,
    pub recs: Vec<i64>,
    pub watchlist: Vec<i64>,
}
