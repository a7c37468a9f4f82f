use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{CreateHydrationRequest, CreateNutritionRequest, CreateWeightRequest, ListQuery},
    repo::{self, NewNutrition},
    repo_types::{Domain, HydrationEntry, NutritionEntry, WeightEntry},
};
use crate::{
    access::Session,
    auth::{extractors::CurrentSession, repo_types::User},
    dashboard::collectors,
    error::{AppError, AppResult},
    state::AppState,
    users::services::resolve_target,
    window::{self, DateWindow, WindowQuery},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/nutrition", get(list_nutrition).post(create_nutrition))
        .route("/nutrition/:id", delete(delete_nutrition))
        .route("/weight", get(list_weight).post(create_weight))
        .route("/weight/:id", delete(delete_weight))
        .route("/hydration", get(list_hydration).post(create_hydration))
        .route("/hydration/:id", delete(delete_hydration))
}

fn listing_window(state: &AppState, q: &ListQuery) -> AppResult<DateWindow> {
    let cfg = &state.config.dashboard;
    WindowQuery {
        start_date: q.start_date,
        end_date: q.end_date,
    }
    .resolve(window::today(cfg.utc_offset), cfg.default_window_days)
}

#[instrument(skip(state, session))]
pub async fn list_nutrition(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(q): Query<ListQuery>,
) -> AppResult<Json<Vec<NutritionEntry>>> {
    let window = listing_window(&state, &q)?;
    let target = resolve_target(&state.db, &session, q.user_id).await?;
    let range = window.to_range(state.config.dashboard.utc_offset);
    let rows = collectors::nutrition(state.entries.as_ref(), &state.config.retry, target, range).await;
    Ok(Json(rows))
}

#[instrument(skip(state, session, body))]
pub async fn create_nutrition(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<CreateNutritionRequest>,
) -> AppResult<(StatusCode, Json<NutritionEntry>)> {
    body.validate()?;
    let target = resolve_target(&state.db, &session, body.user_id).await?;
    let description = body
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());
    let entry = repo::insert_nutrition(
        &state.db,
        target,
        NewNutrition {
            consumed_at: body.consumed_at.unwrap_or_else(OffsetDateTime::now_utc),
            calories: body.calories,
            protein_g: body.protein_g,
            carbs_g: body.carbs_g,
            fat_g: body.fat_g,
            description,
        },
    )
    .await?;
    info!(user_id = %target, entry_id = %entry.id, calories = entry.calories, "meal logged");
    Ok((StatusCode::CREATED, Json(entry)))
}

#[instrument(skip(state, session))]
pub async fn list_weight(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(q): Query<ListQuery>,
) -> AppResult<Json<Vec<WeightEntry>>> {
    let window = listing_window(&state, &q)?;
    let target = resolve_target(&state.db, &session, q.user_id).await?;
    let range = window.to_range(state.config.dashboard.utc_offset);
    let rows = collectors::weight(state.entries.as_ref(), &state.config.retry, target, range).await;
    Ok(Json(rows))
}

#[instrument(skip(state, session, body))]
pub async fn create_weight(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<CreateWeightRequest>,
) -> AppResult<(StatusCode, Json<WeightEntry>)> {
    body.validate()?;
    let target = resolve_target(&state.db, &session, body.user_id).await?;
    let measured_at = body.measured_at.unwrap_or_else(OffsetDateTime::now_utc);
    let entry = repo::insert_weight(&state.db, target, measured_at, body.weight_kg).await?;
    info!(user_id = %target, entry_id = %entry.id, weight_kg = entry.weight_kg, "weight logged");
    Ok((StatusCode::CREATED, Json(entry)))
}

#[instrument(skip(state, session))]
pub async fn list_hydration(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(q): Query<ListQuery>,
) -> AppResult<Json<Vec<HydrationEntry>>> {
    let window = listing_window(&state, &q)?;
    let target = resolve_target(&state.db, &session, q.user_id).await?;
    let range = window.to_range(state.config.dashboard.utc_offset);
    let rows = collectors::hydration(state.entries.as_ref(), &state.config.retry, target, range).await;
    Ok(Json(rows))
}

#[instrument(skip(state, session, body))]
pub async fn create_hydration(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<CreateHydrationRequest>,
) -> AppResult<(StatusCode, Json<HydrationEntry>)> {
    body.validate()?;
    let target = resolve_target(&state.db, &session, body.user_id).await?;
    let consumed_at = body.consumed_at.unwrap_or_else(OffsetDateTime::now_utc);
    let entry = repo::insert_hydration(&state.db, target, consumed_at, body.volume_ml).await?;
    info!(user_id = %target, entry_id = %entry.id, volume_ml = entry.volume_ml, "hydration logged");
    Ok((StatusCode::CREATED, Json(entry)))
}

#[instrument(skip(state, session))]
pub async fn delete_nutrition(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    soft_delete_entry(&state, &session, Domain::Nutrition, id).await
}

#[instrument(skip(state, session))]
pub async fn delete_weight(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    soft_delete_entry(&state, &session, Domain::Weight, id).await
}

#[instrument(skip(state, session))]
pub async fn delete_hydration(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    soft_delete_entry(&state, &session, Domain::Hydration, id).await
}

async fn soft_delete_entry(
    state: &AppState,
    session: &Session,
    domain: Domain,
    id: Uuid,
) -> AppResult<StatusCode> {
    let owner = repo::find_owner(&state.db, domain, id)
        .await?
        .ok_or(AppError::NotFound("entry"))?;
    if owner != session.user_id {
        let owner_user = User::find_by_id(&state.db, owner)
            .await?
            .ok_or(AppError::NotFound("entry"))?;
        session.ensure_may_view(&owner_user.subject())?;
    }
    if !repo::soft_delete(&state.db, domain, id).await? {
        warn!(%domain, %id, "entry vanished before delete");
        return Err(AppError::NotFound("entry"));
    }
    info!(%domain, %id, deleted_by = %session.user_id, "entry soft-deleted");
    Ok(StatusCode::NO_CONTENT)
}
