use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use crate::{
    auth::{extractors::CurrentSession, repo_types::User, PublicUser},
    error::AppResult,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/users/visible", get(list_visible))
}

/// Users the caller may select as the viewed target, self included.
#[instrument(skip(state, session))]
pub async fn list_visible(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> AppResult<Json<Vec<PublicUser>>> {
    let all = User::list_all(&state.db).await?;
    let visible = session
        .visible_users(&all, User::subject)
        .into_iter()
        .cloned()
        .map(PublicUser::from)
        .collect();
    Ok(Json(visible))
}
