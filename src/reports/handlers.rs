use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{CreateReportRequest, ListReportsQuery, ReportResponse, UpdateStatusRequest},
    repo::{self, NewReport},
    repo_types::ReportRow,
    services::{authorize, build_report_content, log_created, ReportOptions},
};
use crate::{
    access::Session,
    auth::extractors::CurrentSession,
    error::{AppError, AppResult},
    state::AppState,
    users::services::resolve_target,
    window::DateWindow,
};

const MAX_PAGE: i64 = 100;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports", get(list_reports).post(create_report))
        .route("/reports/:id", get(get_report).delete(delete_report))
        .route("/reports/:id/status", patch(update_status))
}

async fn load_authorized(state: &AppState, session: &Session, id: Uuid) -> AppResult<ReportRow> {
    let report = repo::find(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("report"))?;
    authorize(&state.db, session, &report).await?;
    Ok(report)
}

#[instrument(skip(state, session, body))]
pub async fn create_report(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<CreateReportRequest>,
) -> AppResult<(StatusCode, Json<ReportResponse>)> {
    let window = DateWindow::new(body.start_date, body.end_date)?;
    let target = resolve_target(&state.db, &session, body.user_id).await?;

    let content = build_report_content(
        state.entries.as_ref(),
        state.narrative.as_ref(),
        &state.config.retry,
        state.config.dashboard.utc_offset,
        target,
        window,
        ReportOptions {
            narrative: body.narrative,
            compare_previous: body.compare_previous,
        },
    )
    .await?;

    let row = repo::insert(
        &state.db,
        NewReport {
            user_id: target,
            created_by: session.user_id,
            window,
            nutrition: &content.nutrition,
            narrative: content.narrative.as_deref(),
            comparison: content.comparison.as_ref(),
        },
    )
    .await?;
    log_created(&row);
    Ok((StatusCode::CREATED, Json(row.into())))
}

#[instrument(skip(state, session))]
pub async fn list_reports(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(q): Query<ListReportsQuery>,
) -> AppResult<Json<Vec<ReportResponse>>> {
    let target = resolve_target(&state.db, &session, q.user_id).await?;
    let rows = repo::list_by_user(&state.db, target, q.limit.clamp(1, MAX_PAGE), q.offset.max(0)).await?;
    Ok(Json(rows.into_iter().map(ReportResponse::from).collect()))
}

#[instrument(skip(state, session))]
pub async fn get_report(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ReportResponse>> {
    let report = load_authorized(&state, &session, id).await?;
    Ok(Json(report.into()))
}

#[instrument(skip(state, session))]
pub async fn delete_report(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    load_authorized(&state, &session, id).await?;
    if !repo::delete(&state.db, id).await? {
        return Err(AppError::NotFound("report"));
    }
    info!(report_id = %id, deleted_by = %session.user_id, "report deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, session, body))]
pub async fn update_status(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateStatusRequest>,
) -> AppResult<Json<ReportResponse>> {
    load_authorized(&state, &session, id).await?;
    let row = repo::update_status(&state.db, id, body.status)
        .await?
        .ok_or(AppError::NotFound("report"))?;
    info!(report_id = %id, status = body.status.as_str(), "report status updated");
    Ok(Json(row.into()))
}
