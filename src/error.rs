use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failures of the user-state gateway.
///
/// Page handlers turn the expected variants into a flash message plus a
/// redirect; only the JSON API renders them as status codes.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User already exists")]
    DuplicateUser,

    #[error("no user with that email")]
    UnknownUser,

    #[error("authenticated session required")]
    Unauthorized,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Persistence(#[from] anyhow::Error),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::DuplicateUser => StatusCode::CONFLICT,
            Self::UnknownUser => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Persistence(e) => {
                error!(error = %e, "persistence failure");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
