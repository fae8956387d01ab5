use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::warn;

use crate::auth::session::SessionManager;
use crate::config::AppConfig;
use crate::users::{
    memory::MemoryUserStore,
    repo::{PgUserStore, UserStore},
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub sessions: SessionManager,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let users = if config.database_url.starts_with("memory:") {
            warn!("using in-memory user store; data is lost on restart");
            Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>
        } else {
            let db = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(&config.database_url)
                .await
                .context("connect to database")?;

            sqlx::migrate!("./migrations")
                .run(&db)
                .await
                .context("run migrations")?;

            Arc::new(PgUserStore::new(db)) as Arc<dyn UserStore>
        };

        Ok(Self::from_parts(users, config))
    }

    pub fn from_parts(users: Arc<dyn UserStore>, config: Arc<AppConfig>) -> Self {
        let sessions = SessionManager::new(&config.session);
        Self {
            users,
            sessions,
            config,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::fake_with(|_| {})
    }

    #[cfg(test)]
    pub fn fake_with(tweak: impl FnOnce(&mut AppConfig)) -> Self {
        let mut config = AppConfig {
            database_url: "memory://".into(),
            max_connections: 1,
            session: crate::config::SessionConfig {
                secret: "test".into(),
                issuer: "test".into(),
                ttl_minutes: 5,
                cookie_name: "cineswipe.sid".into(),
                secure_cookie: false,
            },
            host: "127.0.0.1".into(),
            port: 0,
            update_requires_session: false,
        };
        tweak(&mut config);

        Self::from_parts(Arc::new(MemoryUserStore::new()), Arc::new(config))
    }

    #[cfg(test)]
    pub fn fake_with_store(users: Arc<dyn UserStore>) -> Self {
        let config = Self::fake().config;
        Self::from_parts(users, config)
    }
}
