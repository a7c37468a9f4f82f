use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{GoalsQuery, GoalsResponse, UpsertGoalsRequest},
    repo::{self, GoalRow},
};
use crate::{
    auth::extractors::CurrentSession, error::AppResult, state::AppState,
    users::services::resolve_target,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/goals", get(get_goals).put(put_goals))
}

#[instrument(skip(state, session))]
pub async fn get_goals(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(q): Query<GoalsQuery>,
) -> AppResult<Json<GoalsResponse>> {
    let target = resolve_target(&state.db, &session, q.user_id).await?;
    let row = repo::find(&state.db, target).await?;
    Ok(Json(GoalsResponse {
        user_id: target,
        goals: GoalRow::resolve(row.as_ref()),
        customized: row.is_some(),
    }))
}

#[instrument(skip(state, session, body))]
pub async fn put_goals(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<UpsertGoalsRequest>,
) -> AppResult<Json<GoalsResponse>> {
    body.validate()?;
    let target = resolve_target(&state.db, &session, body.user_id).await?;
    let row = repo::upsert(
        &state.db,
        target,
        body.daily_calories_kcal,
        body.daily_water_ml,
        body.target_weight_kg,
    )
    .await?;
    info!(user_id = %target, updated_by = %session.user_id, "goals updated");
    Ok(Json(GoalsResponse {
        user_id: target,
        goals: GoalRow::resolve(Some(&row)),
        customized: true,
    }))
}
