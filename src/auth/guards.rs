use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{error, warn};

use super::extractors::{ClientSession, CurrentUser};
use crate::{state::AppState, users::repo_types::User};

/// A request is authenticated when its session is bound to a user the
/// credential store still knows about. Store failures count as "not authenticated".
pub async fn authenticated_user(state: &AppState, session: &ClientSession) -> Option<User> {
    let user_id = session.user_id()?;
    match state.users.find_by_id(user_id).await {
        Ok(Some(user)) => Some(user),
        Ok(None) => {
            warn!(%user_id, "session bound to unknown user");
            None
        }
        Err(e) => {
            error!(error = %e, %user_id, "user lookup failed during authorization");
            None
        }
    }
}

/// Redirects to `/login` unless authenticated; otherwise exposes [`CurrentUser`] to the handler.
pub async fn require_authenticated(
    State(state): State<AppState>,
    session: ClientSession,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticated_user(&state, &session).await {
        Some(user) => {
            request.extensions_mut().insert(CurrentUser(user));
            next.run(request).await
        }
        None => Redirect::to("/login").into_response(),
    }
}

/// Redirects authenticated clients to `/`.
pub async fn require_unauthenticated(
    State(state): State<AppState>,
    session: ClientSession,
    request: Request,
    next: Next,
) -> Response {
    if authenticated_user(&state, &session).await.is_some() {
        return Redirect::to("/").into_response();
    }
    next.run(request).await
}
