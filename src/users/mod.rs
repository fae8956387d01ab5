use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod memory;
pub mod repo;
pub mod repo_types;
pub mod services;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(handlers::page_routes(state))
        .merge(handlers::api_routes())
}
