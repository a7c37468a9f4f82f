//! Dashboard pipeline: collectors feed the aggregator, whose output feeds
//! the derived metrics.

pub mod aggregate;
pub mod collectors;
mod dto;
mod handlers;
pub mod metrics;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
