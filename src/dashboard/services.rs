use tracing::{info, warn};
use uuid::Uuid;

use super::aggregate::{aggregate, summarize};
use super::collectors::collect_all;
use super::dto::DashboardSummary;
use super::metrics::{derive, DeriveInput, Goals};
use crate::config::DashboardConfig;
use crate::entries::repo::EntryStore;
use crate::error::{AppError, AppResult};
use crate::retry::RetryPolicy;
use crate::window::DateWindow;

/// Fetch, aggregate and derive. The concurrent fetch is raced against
/// `cfg.summary_timeout`; everything after it is synchronous.
pub async fn build_summary(
    store: &dyn EntryStore,
    policy: &RetryPolicy,
    cfg: &DashboardConfig,
    user_id: Uuid,
    window: DateWindow,
    goals: Goals,
) -> AppResult<DashboardSummary> {
    let range = window.to_range(cfg.utc_offset);
    let collected = tokio::time::timeout(cfg.summary_timeout, collect_all(store, policy, user_id, range))
        .await
        .map_err(|_| {
            warn!(%user_id, timeout_ms = cfg.summary_timeout.as_millis() as u64, "dashboard fetch timed out");
            AppError::Timeout
        })?;

    let nutrition = aggregate(&collected.nutrition, &window, cfg.utc_offset);
    let hydration = aggregate(&collected.hydration, &window, cfg.utc_offset);
    let weight = aggregate(&collected.weight, &window, cfg.utc_offset);

    let derived = derive(
        DeriveInput {
            nutrition: &nutrition,
            hydration: &hydration,
            weight: &weight,
        },
        &goals,
        cfg.insight_cap,
    );

    info!(
        %user_id,
        days = window.len(),
        insights = derived.insights.len(),
        "dashboard built"
    );

    Ok(DashboardSummary {
        user_id,
        window,
        goals,
        nutrition_summary: summarize(&nutrition),
        hydration_summary: summarize(&hydration),
        nutrition,
        hydration,
        weight,
        derived,
    })
}
