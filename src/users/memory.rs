use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{
    repo::UserStore,
    repo_types::{User, UserReplacement},
};

/// In-process user store keyed by email. Backs `DATABASE_URL=memory://` and the tests.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.users.read().len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self.users.read().get(email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.users.read().values().find(|u| u.id == id).cloned())
    }

    async fn insert_if_absent(&self, user: &User) -> anyhow::Result<Option<User>> {
        let mut users = self.users.write();
        if users.contains_key(&user.email) {
            return Ok(None);
        }
        users.insert(user.email.clone(), user.clone());
        Ok(Some(user.clone()))
    }

    async fn replace_by_email(
        &self,
        email: &str,
        replacement: &UserReplacement,
    ) -> anyhow::Result<Option<User>> {
        let mut users = self.users.write();
        Ok(users.get_mut(email).map(|user| {
            user.name = replacement.name.clone();
            user.recs = replacement.recs.clone();
            user.watchlist = replacement.watchlist.clone();
            user.clone()
        }))
    }
}
