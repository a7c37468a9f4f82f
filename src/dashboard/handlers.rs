use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{DashboardQuery, DashboardSummary},
    services::build_summary,
};
use crate::{
    auth::extractors::CurrentSession,
    error::AppResult,
    goals::services::load_goals,
    state::AppState,
    users::services::resolve_target,
    window::{self, WindowQuery},
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(get_dashboard))
}

#[instrument(skip(state, session))]
pub async fn get_dashboard(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(q): Query<DashboardQuery>,
) -> AppResult<Json<DashboardSummary>> {
    let cfg = &state.config.dashboard;
    let window = WindowQuery {
        start_date: q.start_date,
        end_date: q.end_date,
    }
    .resolve(window::today(cfg.utc_offset), cfg.default_window_days)?;

    let target = resolve_target(&state.db, &session, q.user_id).await?;
    let goals = load_goals(&state.db, &state.config.retry, target).await;

    let summary = build_summary(
        state.entries.as_ref(),
        &state.config.retry,
        cfg,
        target,
        window,
        goals,
    )
    .await?;
    Ok(Json(summary))
}
