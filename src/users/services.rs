use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, error, info, warn};

use super::{
    dto::{SignupForm, UpdateUserRequest},
    repo::UserStore,
    repo_types::User,
};
use crate::{
    auth::password::{hash_password, verify_against_dummy, verify_password},
    error::GatewayError,
};

pub const HOME_ROUTE: &str = "/";
pub const SWIPE_ROUTE: &str = "/cineSwipe";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Creates a user with empty lists. The email check and insert are one store operation.
pub async fn signup(users: &dyn UserStore, form: SignupForm) -> Result<User, GatewayError> {
    let email = normalize_email(&form.email);

    if !is_valid_email(&email) {
        return Err(GatewayError::Validation("Invalid email".into()));
    }
    if form.password.is_empty() {
        return Err(GatewayError::Validation("Password must not be empty".into()));
    }

    let hash = hash_password(&form.password)?;
    let user = User::new(form.name.trim().to_string(), email, hash);

    match users.insert_if_absent(&user).await? {
        Some(created) => {
            info!(user_id = %created.id, email = %created.email, "user registered");
            Ok(created)
        }
        None => {
            info!(email = %user.email, "signup for existing email");
            Err(GatewayError::DuplicateUser)
        }
    }
}

/// Checks an email/password pair. Unknown email and wrong password fail the same way.
pub async fn authenticate(
    users: &dyn UserStore,
    email: &str,
    password: &str,
) -> Result<User, GatewayError> {
    let email = normalize_email(email);

    let Some(user) = users.find_by_email(&email).await? else {
        verify_against_dummy(password);
        debug!(email = %email, "login unknown email");
        return Err(GatewayError::InvalidCredentials);
    };

    match verify_password(password, &user.password_hash) {
        Ok(true) => Ok(user),
        Ok(false) => {
            warn!(user_id = %user.id, "login invalid password");
            Err(GatewayError::InvalidCredentials)
        }
        Err(e) => {
            error!(error = %e, user_id = %user.id, "stored password hash is unreadable");
            Err(GatewayError::InvalidCredentials)
        }
    }
}

/// Users without recommendations yet start in the swipe flow.
pub fn landing_route(user: &User) -> &'static str {
    if user.recs.is_empty() {
        SWIPE_ROUTE
    } else {
        HOME_ROUTE
    }
}

/// Replaces the writable state of the user owning `req.email` and returns the stored result.
pub async fn update_user(
    users: &dyn UserStore,
    req: &UpdateUserRequest,
) -> Result<User, GatewayError> {
    let email = normalize_email(&req.email);
    users
        .replace_by_email(&email, &req.replacement())
        .await?
        .ok_or(GatewayError::UnknownUser)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::memory::MemoryUserStore;

    fn form(name: &str, email: &str, password: &str) -> SignupForm {
        SignupForm {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("not an email"));
        assert!(!is_valid_email(""));
    }

    #[tokio::test]
    async fn signup_then_authenticate() {
        let store = MemoryUserStore::new();
        let created = signup(&store, form("A", " A@X.com ", "pw")).await.unwrap();
        assert_eq!(created.email, "a@x.com");
        assert!(created.recs.is_empty());
        assert!(created.watchlist.is_empty());
        assert_ne!(created.password_hash, "pw");

        let user = authenticate(&store, "a@x.com", "pw").await.unwrap();
        assert_eq!(user.id, created.id);
    }

    #[tokio::test]
    async fn duplicate_signup_leaves_original_untouched() {
        let store = MemoryUserStore::new();
        let original = signup(&store, form("A", "a@x.com", "pw")).await.unwrap();

        let err = signup(&store, form("B", "a@x.com", "other")).await.unwrap_err();
        assert!(matches!(err, GatewayError::DuplicateUser));

        let stored = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(stored.id, original.id);
        assert_eq!(stored.name, "A");
        assert_eq!(stored.password_hash, original.password_hash);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn signup_rejects_empty_password_and_bad_email() {
        let store = MemoryUserStore::new();
        assert!(matches!(
            signup(&store, form("A", "a@x.com", "")).await,
            Err(GatewayError::Validation(_))
        ));
        assert!(matches!(
            signup(&store, form("A", "nope", "pw")).await,
            Err(GatewayError::Validation(_))
        ));
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_fail_identically() {
        let store = MemoryUserStore::new();
        signup(&store, form("A", "a@x.com", "pw")).await.unwrap();

        let wrong = authenticate(&store, "a@x.com", "nope").await.unwrap_err();
        let unknown = authenticate(&store, "b@x.com", "pw").await.unwrap_err();
        assert!(matches!(wrong, GatewayError::InvalidCredentials));
        assert!(matches!(unknown, GatewayError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn landing_route_follows_recommendations() {
        let store = MemoryUserStore::new();
        let user = signup(&store, form("A", "a@x.com", "pw")).await.unwrap();
        assert_eq!(landing_route(&user), SWIPE_ROUTE);

        let updated = update_user(
            &store,
            &UpdateUserRequest {
                email: "a@x.com".into(),
                name: "A".into(),
                recs: vec![1, 2, 3],
                watchlist: vec![1],
            },
        )
        .await
        .unwrap();
        assert_eq!(landing_route(&updated), HOME_ROUTE);
    }

    #[tokio::test]
    async fn update_of_unknown_email_fails() {
        let store = MemoryUserStore::new();
        let err = update_user(
            &store,
            &UpdateUserRequest {
                email: "ghost@x.com".into(),
                name: String::new(),
                recs: vec![],
                watchlist: vec![],
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, GatewayError::UnknownUser));
    }
}
