use std::fmt::Write as _;

use sqlx::PgPool;
use time::UtcOffset;
use tracing::{info, warn};
use uuid::Uuid;

use super::narrative::NarrativeWriter;
use super::repo_types::{Comparison, NutritionPayload, ReportRow};
use crate::{
    access::Session,
    auth::repo_types::User,
    dashboard::{
        aggregate::{aggregate, summarize},
        collectors,
    },
    entries::repo::EntryStore,
    error::{AppError, AppResult},
    retry::RetryPolicy,
    window::DateWindow,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub narrative: bool,
    pub compare_previous: bool,
}

/// Everything a report stores besides its identity and status.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportContent {
    pub nutrition: NutritionPayload,
    pub comparison: Option<Comparison>,
    pub narrative: Option<String>,
}

async fn nutrition_payload(
    store: &dyn EntryStore,
    policy: &RetryPolicy,
    offset: UtcOffset,
    user_id: Uuid,
    window: DateWindow,
) -> NutritionPayload {
    let rows = collectors::nutrition(store, policy, user_id, window.to_range(offset)).await;
    let daily = aggregate(&rows, &window, offset);
    let summary = summarize(&daily);
    NutritionPayload { daily, summary }
}

fn compare(current: &NutritionPayload, previous_window: DateWindow, previous: &NutritionPayload) -> Comparison {
    let now = current.summary;
    let before = previous.summary;
    let average_calories_delta = now.average.calories - before.average.calories;
    let average_calories_change_percent = (before.average.calories > 0.0)
        .then(|| average_calories_delta / before.average.calories * 100.0);
    Comparison {
        previous_window,
        previous: before,
        total_calories_delta: now.total.calories - before.total.calories,
        average_calories_delta,
        average_calories_change_percent,
    }
}

/// Plain-text summary handed to the narrative service.
pub fn narrative_prompt(window: &DateWindow, nutrition: &NutritionPayload, comparison: Option<&Comparison>) -> String {
    let s = &nutrition.summary;
    let mut prompt = format!(
        "Period {} to {} ({} days, {} with meals logged).\n\
         Total: {:.0} kcal, {:.0} g protein, {:.0} g carbs, {:.0} g fat.\n\
         Daily average on logged days: {:.0} kcal, {:.0} g protein, {:.0} g carbs, {:.0} g fat.\n",
        window.start,
        window.end,
        window.len(),
        s.logged_days,
        s.total.calories,
        s.total.protein_g,
        s.total.carbs_g,
        s.total.fat_g,
        s.average.calories,
        s.average.protein_g,
        s.average.carbs_g,
        s.average.fat_g,
    );
    if let Some(c) = comparison {
        let _ = writeln!(
            prompt,
            "Previous period ({} to {}) daily average: {:.0} kcal; change {:+.0} kcal.",
            c.previous_window.start, c.previous_window.end, c.previous.average.calories, c.average_calories_delta,
        );
    }
    prompt
}

/// Builds report content from the same collectors and aggregator the
/// dashboard uses. Narrative failures only drop the narrative.
pub async fn build_report_content(
    store: &dyn EntryStore,
    writer: &dyn NarrativeWriter,
    policy: &RetryPolicy,
    offset: UtcOffset,
    user_id: Uuid,
    window: DateWindow,
    opts: ReportOptions,
) -> AppResult<ReportContent> {
    let previous_window = if opts.compare_previous {
        Some(window.previous()?)
    } else {
        None
    };

    let (nutrition, comparison) = if let Some(previous_window) = previous_window {
        let (current, previous) = tokio::join!(
            nutrition_payload(store, policy, offset, user_id, window),
            nutrition_payload(store, policy, offset, user_id, previous_window),
        );
        let comparison = compare(&current, previous_window, &previous);
        (current, Some(comparison))
    } else {
        (nutrition_payload(store, policy, offset, user_id, window).await, None)
    };

    let narrative = if !opts.narrative {
        None
    } else if !writer.enabled() {
        warn!(%user_id, "narrative requested but no text service is configured");
        None
    } else {
        let prompt = narrative_prompt(&window, &nutrition, comparison.as_ref());
        match policy.run("narrative", || writer.write(&prompt)).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(%user_id, error = %e, "narrative generation failed; saving report without it");
                None
            }
        }
    };

    Ok(ReportContent {
        nutrition,
        comparison,
        narrative,
    })
}

/// A report is visible to its subject, its creator, and anyone whose role
/// gate covers the subject.
pub async fn authorize(db: &PgPool, session: &Session, report: &ReportRow) -> AppResult<()> {
    if report.user_id == session.user_id || report.created_by == session.user_id {
        return Ok(());
    }
    let subject = User::find_by_id(db, report.user_id)
        .await?
        .ok_or(AppError::NotFound("report"))?;
    session.ensure_may_view(&subject.subject())
}

pub fn log_created(report: &ReportRow) {
    info!(
        report_id = %report.id,
        user_id = %report.user_id,
        created_by = %report.created_by,
        narrative = report.narrative.is_some(),
        comparison = report.comparison.is_some(),
        "report created"
    );
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use time::macros::{date, datetime};

    use super::*;
    use crate::dashboard::collectors::fakes::FakeStore;
    use crate::entries::repo_types::NutritionEntry;

    struct FixedWriter(&'static str);

    #[async_trait]
    impl NarrativeWriter for FixedWriter {
        async fn write(&self, _prompt: &str) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[derive(Default)]
    struct BrokenWriter(AtomicU32);

    #[async_trait]
    impl NarrativeWriter for BrokenWriter {
        async fn write(&self, _prompt: &str) -> anyhow::Result<String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("rate limited")
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    fn meal(at: time::OffsetDateTime, calories: f64) -> NutritionEntry {
        NutritionEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            consumed_at: at,
            calories,
            protein_g: 20.0,
            carbs_g: 50.0,
            fat_g: 10.0,
            description: None,
            deleted_at: None,
            created_at: at,
        }
    }

    fn store() -> FakeStore {
        // The fake ignores ranges, so the aggregator's window check decides
        // which period each row lands in.
        FakeStore {
            nutrition: vec![
                meal(datetime!(2024-01-01 12:00 UTC), 1500.0),
                meal(datetime!(2024-01-04 12:00 UTC), 1800.0),
                meal(datetime!(2024-01-05 12:00 UTC), 2200.0),
            ],
            ..Default::default()
        }
    }

    fn window() -> DateWindow {
        DateWindow::new(date!(2024 - 01 - 04), date!(2024 - 01 - 06)).unwrap()
    }

    #[tokio::test]
    async fn payload_has_daily_total_and_average() {
        let content = build_report_content(
            &store(),
            &FixedWriter("unused"),
            &policy(),
            UtcOffset::UTC,
            Uuid::nil(),
            window(),
            ReportOptions::default(),
        )
        .await
        .unwrap();
        let n = &content.nutrition;
        assert_eq!(n.daily.len(), 3);
        assert_eq!(n.summary.total.calories, 4000.0);
        assert_eq!(n.summary.average.calories, 2000.0);
        assert!(content.narrative.is_none());
        assert!(content.comparison.is_none());

        let json = serde_json::to_value(n).unwrap();
        assert!(json.get("diarios").is_some());
        assert_eq!(json["total"]["calorias"], 4000.0);
        assert_eq!(json["media"]["calorias"], 2000.0);
    }

    #[tokio::test]
    async fn comparison_uses_previous_period() {
        let content = build_report_content(
            &store(),
            &FixedWriter("unused"),
            &policy(),
            UtcOffset::UTC,
            Uuid::nil(),
            window(),
            ReportOptions {
                compare_previous: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let c = content.comparison.unwrap();
        assert_eq!(c.previous_window.start, date!(2024 - 01 - 01));
        assert_eq!(c.previous_window.end, date!(2024 - 01 - 03));
        assert_eq!(c.previous.total.calories, 1500.0);
        assert_eq!(c.total_calories_delta, 2500.0);
        assert_eq!(c.average_calories_delta, 500.0);
        let pct = c.average_calories_change_percent.unwrap();
        assert!((pct - 33.333).abs() < 0.01);
    }

    #[tokio::test]
    async fn empty_previous_period_has_no_percentage() {
        let store = FakeStore {
            nutrition: vec![meal(datetime!(2024-01-05 12:00 UTC), 900.0)],
            ..Default::default()
        };
        let content = build_report_content(
            &store,
            &FixedWriter("unused"),
            &policy(),
            UtcOffset::UTC,
            Uuid::nil(),
            window(),
            ReportOptions {
                compare_previous: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(content.comparison.unwrap().average_calories_change_percent, None);
    }

    #[tokio::test]
    async fn narrative_is_attached_when_requested() {
        let content = build_report_content(
            &store(),
            &FixedWriter("Solid week."),
            &policy(),
            UtcOffset::UTC,
            Uuid::nil(),
            window(),
            ReportOptions {
                narrative: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(content.narrative.as_deref(), Some("Solid week."));
    }

    #[tokio::test]
    async fn narrative_failure_is_retried_then_dropped() {
        let writer = BrokenWriter::default();
        let content = build_report_content(
            &store(),
            &writer,
            &policy(),
            UtcOffset::UTC,
            Uuid::nil(),
            window(),
            ReportOptions {
                narrative: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(content.narrative.is_none());
        assert_eq!(writer.0.load(Ordering::SeqCst), 3);
        assert_eq!(content.nutrition.summary.total.calories, 4000.0);
    }

    #[tokio::test]
    async fn comparison_before_earliest_day_is_rejected() {
        let store = store();
        let w = DateWindow::new(date!(1900 - 01 - 01), date!(1900 - 01 - 07)).unwrap();
        let err = build_report_content(
            &store,
            &FixedWriter("unused"),
            &policy(),
            UtcOffset::UTC,
            Uuid::nil(),
            w,
            ReportOptions {
                compare_previous: true,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn prompt_mentions_period_and_comparison() {
        let w = window();
        let payload = NutritionPayload {
            daily: Vec::new(),
            summary: Default::default(),
        };
        let c = compare(&payload, w.previous().unwrap(), &payload);
        let prompt = narrative_prompt(&w, &payload, Some(&c));
        assert!(prompt.contains("2024-01-04 to 2024-01-06"));
        assert!(prompt.contains("Previous period (2024-01-01 to 2024-01-03)"));
    }
}
