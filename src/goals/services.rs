use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use super::repo::{self, GoalRow};
use crate::dashboard::metrics::Goals;
use crate::retry::RetryPolicy;

/// Resolved goals for `user_id`. A failed read falls back to the defaults.
pub async fn load_goals(db: &PgPool, policy: &RetryPolicy, user_id: Uuid) -> Goals {
    match policy.run("goals", || repo::find(db, user_id)).await {
        Ok(row) => GoalRow::resolve(row.as_ref()),
        Err(e) => {
            warn!(%user_id, error = %e, "goal lookup failed; using defaults");
            Goals::default()
        }
    }
}
