use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{User, UserReplacement};

/// Persistence seam for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;

    /// Inserts `user` unless its email is taken, as one atomic step.
    /// Returns `None` when another user already owns the email.
    async fn insert_if_absent(&self, user: &User) -> anyhow::Result<Option<User>>;

    /// Overwrites the writable fields of the user owning `email`.
    async fn replace_by_email(
        &self,
        email: &str,
        replacement: &UserReplacement,
    ) -> anyhow::Result<Option<User>>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, recs, watchlist, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, recs, watchlist, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn insert_if_absent(&self, user: &User) -> anyhow::Result<Option<User>> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash, recs, watchlist, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, name, email, password_hash, recs, watchlist, created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.recs)
        .bind(&user.watchlist)
        .bind(user.created_at)
        .fetch_optional(&self.db)
        .await
        .context("insert user")?;
        Ok(created)
    }

    async fn replace_by_email(
        &self,
        email: &str,
        replacement: &UserReplacement,
    ) -> anyhow::Result<Option<User>> {
        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET name = $2, recs = $3, watchlist = $4
             WHERE email = $1
            RETURNING id, name, email, password_hash, recs, watchlist, created_at
            "#,
        )
        .bind(email)
        .bind(&replacement.name)
        .bind(&replacement.recs)
        .bind(&replacement.watchlist)
        .fetch_optional(&self.db)
        .await
        .context("replace user")?;
        Ok(updated)
    }
}
