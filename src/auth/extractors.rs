use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use super::session::SessionView;
use crate::{state::AppState, users::repo_types::User};

/// The caller's session as resolved from its cookie. Never rejects: a
/// request without a valid cookie simply has no session.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientSession(pub SessionView);

impl ClientSession {
    pub fn id(&self) -> Option<Uuid> {
        self.0.id
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.0.user_id
    }
}

#[async_trait]
impl FromRequestParts<AppState> for ClientSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(ClientSession(state.sessions.resolve(&parts.headers)))
    }
}

/// The authenticated user, attached to the request by `require_authenticated`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);
