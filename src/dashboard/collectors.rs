//! Per-domain fetches with retry and failure isolation.

use std::future::Future;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::entries::{
    repo::EntryStore,
    repo_types::{Domain, HydrationEntry, NutritionEntry, WeightEntry},
};
use crate::retry::RetryPolicy;
use crate::window::TimeRange;

/// Raw rows for the three domains, each fetched into its own slot.
#[derive(Debug, Default)]
pub struct Collected {
    pub nutrition: Vec<NutritionEntry>,
    pub weight: Vec<WeightEntry>,
    pub hydration: Vec<HydrationEntry>,
}

/// Runs `fetch` under `policy`. Once retries are exhausted the error is
/// logged and an empty result is returned in its place.
pub async fn collect<T, F, Fut>(domain: Domain, user_id: Uuid, policy: &RetryPolicy, fetch: F) -> Vec<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<Vec<T>>>,
{
    match policy.run(domain.as_str(), fetch).await {
        Ok(rows) => {
            debug!(%domain, %user_id, rows = rows.len(), "collected");
            rows
        }
        Err(e) => {
            warn!(%domain, %user_id, error = %e, "collector failed; continuing with no data");
            Vec::new()
        }
    }
}

pub async fn nutrition(
    store: &dyn EntryStore,
    policy: &RetryPolicy,
    user_id: Uuid,
    range: TimeRange,
) -> Vec<NutritionEntry> {
    collect(Domain::Nutrition, user_id, policy, || store.nutrition(user_id, range)).await
}

pub async fn weight(
    store: &dyn EntryStore,
    policy: &RetryPolicy,
    user_id: Uuid,
    range: TimeRange,
) -> Vec<WeightEntry> {
    collect(Domain::Weight, user_id, policy, || store.weight(user_id, range)).await
}

pub async fn hydration(
    store: &dyn EntryStore,
    policy: &RetryPolicy,
    user_id: Uuid,
    range: TimeRange,
) -> Vec<HydrationEntry> {
    collect(Domain::Hydration, user_id, policy, || store.hydration(user_id, range)).await
}

/// Fires the three fetches concurrently; each settles on its own.
pub async fn collect_all(
    store: &dyn EntryStore,
    policy: &RetryPolicy,
    user_id: Uuid,
    range: TimeRange,
) -> Collected {
    let (nutrition, weight, hydration) = tokio::join!(
        nutrition(store, policy, user_id, range),
        weight(store, policy, user_id, range),
        hydration(store, policy, user_id, range),
    );
    Collected {
        nutrition,
        weight,
        hydration,
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;

    /// In-memory store. Domains listed in `failing` always error; `delay`
    /// stalls every call.
    #[derive(Default)]
    pub struct FakeStore {
        pub nutrition: Vec<NutritionEntry>,
        pub weight: Vec<WeightEntry>,
        pub hydration: Vec<HydrationEntry>,
        pub failing: Vec<Domain>,
        pub delay: Option<Duration>,
        pub calls: AtomicU32,
    }

    impl FakeStore {
        async fn serve<T: Clone>(&self, domain: Domain, rows: &[T]) -> anyhow::Result<Vec<T>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
            if self.failing.contains(&domain) {
                anyhow::bail!("{domain} backend unavailable");
            }
            Ok(rows.to_vec())
        }
    }

    #[async_trait]
    impl EntryStore for FakeStore {
        async fn nutrition(&self, _u: Uuid, _r: TimeRange) -> anyhow::Result<Vec<NutritionEntry>> {
            self.serve(Domain::Nutrition, &self.nutrition).await
        }
        async fn weight(&self, _u: Uuid, _r: TimeRange) -> anyhow::Result<Vec<WeightEntry>> {
            self.serve(Domain::Weight, &self.weight).await
        }
        async fn hydration(&self, _u: Uuid, _r: TimeRange) -> anyhow::Result<Vec<HydrationEntry>> {
            self.serve(Domain::Hydration, &self.hydration).await
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use time::macros::{date, datetime};
    use time::UtcOffset;

    use super::fakes::FakeStore;
    use super::*;
    use crate::window::DateWindow;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    fn range() -> TimeRange {
        DateWindow::new(date!(2024 - 01 - 01), date!(2024 - 01 - 07))
            .unwrap()
            .to_range(UtcOffset::UTC)
    }

    fn water(volume_ml: f64) -> HydrationEntry {
        HydrationEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            consumed_at: datetime!(2024-01-02 10:00 UTC),
            volume_ml,
            deleted_at: None,
            created_at: datetime!(2024-01-02 10:00 UTC),
        }
    }

    #[tokio::test]
    async fn failing_domain_degrades_to_empty() {
        let store = FakeStore {
            hydration: vec![water(300.0), water(200.0)],
            failing: vec![Domain::Nutrition],
            ..Default::default()
        };
        let got = collect_all(&store, &policy(), Uuid::nil(), range()).await;
        assert!(got.nutrition.is_empty());
        assert_eq!(got.hydration.len(), 2);
        assert!(got.weight.is_empty());
    }

    #[tokio::test]
    async fn failing_domain_is_retried_per_policy() {
        let store = FakeStore {
            failing: vec![Domain::Weight],
            ..Default::default()
        };
        let rows = weight(&store, &policy(), Uuid::nil(), range()).await;
        assert!(rows.is_empty());
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn domains_are_fetched_concurrently() {
        let store = FakeStore {
            delay: Some(Duration::from_millis(200)),
            ..Default::default()
        };
        let started = std::time::Instant::now();
        collect_all(&store, &policy(), Uuid::nil(), range()).await;
        assert!(started.elapsed() < Duration::from_millis(550));
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    }
}
