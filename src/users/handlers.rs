use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    middleware,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    routing::{delete, get, post},
    Extension, Form, Json, Router,
};
use tracing::{error, info, instrument, warn};

use super::{
    dto::{LoginForm, MethodOverride, PageView, SignupForm, UpdateUserRequest},
    repo_types::User,
    services,
};
use crate::{
    auth::{
        extractors::{ClientSession, CurrentUser},
        guards::{authenticated_user, require_authenticated, require_unauthenticated},
    },
    error::GatewayError,
    state::AppState,
};

pub const LOGIN_ROUTE: &str = "/login";
pub const SIGNUP_ROUTE: &str = "/signup";
pub const INTERMEDIARY_ROUTE: &str = "/homepage-intermediary";

const LOGIN_UNAVAILABLE: &str = "Something went wrong, please try again";

pub fn page_routes(state: AppState) -> Router<AppState> {
    let members = Router::new()
        .route(services::HOME_ROUTE, get(home))
        .route(INTERMEDIARY_ROUTE, get(homepage_intermediary))
        .route(services::SWIPE_ROUTE, get(cine_swipe))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_authenticated,
        ));

    let guests = Router::new()
        .route(LOGIN_ROUTE, get(login_page).post(login))
        .route(SIGNUP_ROUTE, get(signup_page).post(signup))
        .route_layer(middleware::from_fn_with_state(
            state,
            require_unauthenticated,
        ));

    Router::new()
        .merge(members)
        .merge(guests)
        .route("/logout", delete(logout).post(logout_override))
}

pub fn api_routes() -> Router<AppState> {
    Router::new().route("/api/updateUser", post(update_user))
}

// --- pages ---

pub async fn home(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<PageView> {
    Json(PageView::with_user("index", user))
}

pub async fn cine_swipe(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<PageView> {
    Json(PageView::with_user("cineSwipe", user))
}

pub async fn homepage_intermediary(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Redirect {
    Redirect::to(services::landing_route(&user))
}

pub async fn login_page(State(state): State<AppState>, session: ClientSession) -> Json<PageView> {
    Json(PageView::with_flash(
        "login",
        state.sessions.take_flash(session.id()),
    ))
}

pub async fn signup_page(State(state): State<AppState>, session: ClientSession) -> Json<PageView> {
    Json(PageView::with_flash(
        "signup",
        state.sessions.take_flash(session.id()),
    ))
}

// --- forms ---

#[instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    session: ClientSession,
    Form(form): Form<SignupForm>,
) -> Response {
    match services::signup(state.users.as_ref(), form).await {
        Ok(_) => Redirect::to(LOGIN_ROUTE).into_response(),
        Err(e @ GatewayError::DuplicateUser) => {
            flash_redirect(&state, &session, &e.to_string(), LOGIN_ROUTE)
        }
        Err(GatewayError::Validation(reason)) => {
            warn!(%reason, "signup rejected");
            flash_redirect(&state, &session, &reason, SIGNUP_ROUTE)
        }
        Err(e) => {
            error!(error = %e, "signup failed");
            Redirect::to(SIGNUP_ROUTE).into_response()
        }
    }
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: ClientSession,
    Form(form): Form<LoginForm>,
) -> Response {
    match services::authenticate(state.users.as_ref(), &form.email, &form.password).await {
        Ok(user) => match state.sessions.establish(user.id, session.id()) {
            Ok(cookie) => {
                info!(user_id = %user.id, "user logged in");
                (
                    [(header::SET_COOKIE, cookie)],
                    Redirect::to(INTERMEDIARY_ROUTE),
                )
                    .into_response()
            }
            Err(e) => {
                error!(error = %e, user_id = %user.id, "session could not be established");
                flash_redirect(&state, &session, LOGIN_UNAVAILABLE, LOGIN_ROUTE)
            }
        },
        Err(e @ GatewayError::InvalidCredentials) => {
            flash_redirect(&state, &session, &e.to_string(), LOGIN_ROUTE)
        }
        Err(e) => {
            error!(error = %e, "login failed");
            flash_redirect(&state, &session, LOGIN_UNAVAILABLE, LOGIN_ROUTE)
        }
    }
}

#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, session: ClientSession) -> Response {
    let cookie = state.sessions.end(session.id());
    ([(header::SET_COOKIE, cookie)], Redirect::to(LOGIN_ROUTE)).into_response()
}

/// `POST /logout?_method=DELETE`, for forms that cannot send DELETE.
pub async fn logout_override(
    state: State<AppState>,
    session: ClientSession,
    Query(method): Query<MethodOverride>,
) -> Response {
    if !method.is_delete() {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    logout(state, session).await
}

// --- api ---

#[instrument(skip_all)]
pub async fn update_user(
    State(state): State<AppState>,
    session: ClientSession,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>, GatewayError> {
    if state.config.update_requires_session {
        let owner = authenticated_user(&state, &session)
            .await
            .ok_or(GatewayError::Unauthorized)?;
        if owner.email != services::normalize_email(&payload.email) {
            warn!(user_id = %owner.id, "update for another user's email refused");
            return Err(GatewayError::Unauthorized);
        }
    }

    let user = services::update_user(state.users.as_ref(), &payload).await?;
    info!(user_id = %user.id, recs = user.recs.len(), watchlist = user.watchlist.len(), "user updated");
    Ok(Json(user))
}

fn flash_redirect(state: &AppState, session: &ClientSession, message: &str, to: &str) -> Response {
    match state.sessions.flash(session.id(), "error", message) {
        Ok(cookie) => (
            AppendHeaders(cookie.map(|c| (header::SET_COOKIE, c))),
            Redirect::to(to),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "flash message could not be stored");
            Redirect::to(to).into_response()
        }
    }
}
