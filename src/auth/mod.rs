use crate::state::AppState;
use axum::Router;

mod dto;
pub(crate) mod extractors;
mod handlers;
pub mod jwt;
mod password;
mod repo;
pub mod repo_types;
mod services;

pub use dto::PublicUser;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes())
}
