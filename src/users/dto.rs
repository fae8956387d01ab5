use serde::{Deserialize, Serialize};

use super::repo_types::{User, UserReplacement};
use crate::auth::session::FlashMessages;

/// Form body for signup. Missing fields arrive empty and fail validation.
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Form body for login.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// HTML forms can only POST; `?_method=DELETE` marks a logout sent that way.
#[derive(Debug, Default, Deserialize)]
pub struct MethodOverride {
    #[serde(rename = "_method")]
    pub method: Option<String>,
}

impl MethodOverride {
    pub fn is_delete(&self) -> bool {
        self.method
            .as_deref()
            .is_some_and(|m| m.eq_ignore_ascii_case("DELETE"))
    }
}

/// Full user representation accepted by `/api/updateUser`.
///
/// Any writable field left out is stored as empty. Identity, password and
/// unknown fields sent by the client are ignored.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub recs: Vec<i64>,
    #[serde(default)]
    pub watchlist: Vec<i64>,
}

impl UpdateUserRequest {
    pub fn replacement(&self) -> UserReplacement {
        UserReplacement {
            name: self.name.clone(),
            recs: self.recs.clone(),
            watchlist: self.watchlist.clone(),
        }
    }
}

/// View model handed to the page renderer.
#[derive(Debug, Serialize)]
pub struct PageView {
    pub view: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<User>,
    #[serde(skip_serializing_if = "FlashMessages::is_empty")]
    pub message: FlashMessages,
}

impl PageView {
    pub fn with_user(view: &'static str, user: User) -> Self {
        Self {
            view,
            data: Some(user),
            message: FlashMessages::new(),
        }
    }

    pub fn with_flash(view: &'static str, message: FlashMessages) -> Self {
        Self {
            view,
            data: None,
            message,
        }
    }
}
