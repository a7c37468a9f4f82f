//! Per-day grouping of raw entries with gap filling.

use std::collections::BTreeMap;
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, UtcOffset};

use crate::window::{local_day, DateWindow};

/// Numeric fields summed per day.
pub trait Totals: Copy + Default + AddAssign {
    /// Applied once per day after all rows were summed.
    fn finish(self, _entries: u32) -> Self {
        self
    }

    fn scaled(self, factor: f64) -> Self;
}

/// A raw row that can be folded into a [`DailyAggregate`].
pub trait Sample {
    type Totals: Totals;

    fn recorded_at(&self) -> OffsetDateTime;
    fn deleted_at(&self) -> Option<OffsetDateTime>;
    fn totals(&self) -> Self::Totals;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate<T> {
    #[serde(rename = "data")]
    pub day: Date,
    #[serde(rename = "registros")]
    pub entries: u32,
    #[serde(flatten)]
    pub totals: T,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionTotals {
    #[serde(rename = "calorias")]
    pub calories: f64,
    #[serde(rename = "proteinas")]
    pub protein_g: f64,
    #[serde(rename = "carboidratos")]
    pub carbs_g: f64,
    #[serde(rename = "gorduras")]
    pub fat_g: f64,
}

impl AddAssign for NutritionTotals {
    fn add_assign(&mut self, rhs: Self) {
        self.calories += rhs.calories;
        self.protein_g += rhs.protein_g;
        self.carbs_g += rhs.carbs_g;
        self.fat_g += rhs.fat_g;
    }
}

impl Totals for NutritionTotals {
    fn scaled(self, factor: f64) -> Self {
        Self {
            calories: self.calories * factor,
            protein_g: self.protein_g * factor,
            carbs_g: self.carbs_g * factor,
            fat_g: self.fat_g * factor,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HydrationTotals {
    #[serde(rename = "agua_ml")]
    pub volume_ml: f64,
}

impl AddAssign for HydrationTotals {
    fn add_assign(&mut self, rhs: Self) {
        self.volume_ml += rhs.volume_ml;
    }
}

impl Totals for HydrationTotals {
    fn scaled(self, factor: f64) -> Self {
        Self {
            volume_ml: self.volume_ml * factor,
        }
    }
}

/// Weight is the mean of the day's samples, not their sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightTotals {
    #[serde(rename = "peso_kg")]
    pub weight_kg: f64,
}

impl AddAssign for WeightTotals {
    fn add_assign(&mut self, rhs: Self) {
        self.weight_kg += rhs.weight_kg;
    }
}

impl Totals for WeightTotals {
    fn finish(self, entries: u32) -> Self {
        if entries == 0 {
            return self;
        }
        Self {
            weight_kg: self.weight_kg / entries as f64,
        }
    }

    fn scaled(self, factor: f64) -> Self {
        Self {
            weight_kg: self.weight_kg * factor,
        }
    }
}

/// Groups `rows` by local day and emits exactly one aggregate per day of
/// `window`, zero-filled where nothing was logged. Soft-deleted rows and rows
/// outside the window are skipped.
pub fn aggregate<S: Sample>(
    rows: &[S],
    window: &DateWindow,
    offset: UtcOffset,
) -> Vec<DailyAggregate<S::Totals>> {
    let mut groups: BTreeMap<Date, (u32, S::Totals)> = BTreeMap::new();
    for row in rows {
        if row.deleted_at().is_some() {
            continue;
        }
        let day = local_day(row.recorded_at(), offset);
        if !window.contains(day) {
            continue;
        }
        let slot = groups.entry(day).or_default();
        slot.0 += 1;
        slot.1 += row.totals();
    }

    window
        .days()
        .map(|day| {
            let (entries, totals) = groups.remove(&day).unwrap_or_default();
            DailyAggregate {
                day,
                entries,
                totals: totals.finish(entries),
            }
        })
        .collect()
}

/// Window total and per-logged-day average.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary<T> {
    pub total: T,
    #[serde(rename = "media")]
    pub average: T,
    #[serde(rename = "dias_com_registro")]
    pub logged_days: u32,
}

/// The average divides by days that have at least one entry, so empty days
/// don't drag it down. With no logged days both values are zero.
pub fn summarize<T: Totals>(daily: &[DailyAggregate<T>]) -> Summary<T> {
    let mut total = T::default();
    let mut logged_days = 0u32;
    for d in daily.iter().filter(|d| d.entries > 0) {
        total += d.totals;
        logged_days += 1;
    }
    let average = if logged_days == 0 {
        T::default()
    } else {
        total.scaled(1.0 / logged_days as f64)
    };
    Summary {
        total,
        average,
        logged_days,
    }
}

/// Total number of raw rows folded into the aggregates.
pub fn entry_count<T>(daily: &[DailyAggregate<T>]) -> u32 {
    daily.iter().map(|d| d.entries).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime, offset};

    struct Meal {
        at: OffsetDateTime,
        calories: f64,
        deleted: bool,
    }

    impl Sample for Meal {
        type Totals = NutritionTotals;

        fn recorded_at(&self) -> OffsetDateTime {
            self.at
        }
        fn deleted_at(&self) -> Option<OffsetDateTime> {
            self.deleted.then_some(self.at)
        }
        fn totals(&self) -> NutritionTotals {
            NutritionTotals {
                calories: self.calories,
                ..Default::default()
            }
        }
    }

    fn meal(at: OffsetDateTime, calories: f64) -> Meal {
        Meal {
            at,
            calories,
            deleted: false,
        }
    }

    struct Weighing(OffsetDateTime, f64);

    impl Sample for Weighing {
        type Totals = WeightTotals;

        fn recorded_at(&self) -> OffsetDateTime {
            self.0
        }
        fn deleted_at(&self) -> Option<OffsetDateTime> {
            None
        }
        fn totals(&self) -> WeightTotals {
            WeightTotals { weight_kg: self.1 }
        }
    }

    fn window(start: Date, end: Date) -> DateWindow {
        DateWindow::new(start, end).unwrap()
    }

    #[test]
    fn sums_per_day_and_fills_gaps() {
        let rows = vec![
            meal(datetime!(2024-01-01 12:00 UTC), 500.0),
            meal(datetime!(2024-01-01 19:00 UTC), 300.0),
            meal(datetime!(2024-01-03 12:00 UTC), 1000.0),
        ];
        let w = window(date!(2024 - 01 - 01), date!(2024 - 01 - 03));
        let out = aggregate(&rows, &w, UtcOffset::UTC);

        let calories: Vec<(Date, f64)> = out.iter().map(|d| (d.day, d.totals.calories)).collect();
        assert_eq!(
            calories,
            vec![
                (date!(2024 - 01 - 01), 800.0),
                (date!(2024 - 01 - 02), 0.0),
                (date!(2024 - 01 - 03), 1000.0),
            ]
        );
        assert_eq!(out[1].entries, 0);
        assert_eq!(out[0].entries, 2);
    }

    #[test]
    fn always_one_entry_per_day() {
        let w = window(date!(2024 - 02 - 01), date!(2024 - 02 - 29));
        let empty: Vec<Meal> = Vec::new();
        assert_eq!(aggregate(&empty, &w, UtcOffset::UTC).len(), 29);

        let sparse = vec![meal(datetime!(2024-02-15 08:00 UTC), 10.0)];
        let out = aggregate(&sparse, &w, UtcOffset::UTC);
        assert_eq!(out.len(), 29);
        assert_eq!(out.iter().filter(|d| d.entries > 0).count(), 1);
    }

    #[test]
    fn repeated_aggregation_is_stable() {
        let rows = vec![
            meal(datetime!(2024-01-01 12:00 UTC), 500.0),
            meal(datetime!(2024-01-02 12:00 UTC), 250.0),
        ];
        let w = window(date!(2024 - 01 - 01), date!(2024 - 01 - 02));
        let first = aggregate(&rows, &w, UtcOffset::UTC);
        let second = aggregate(&rows, &w, UtcOffset::UTC);
        assert_eq!(first, second);
        assert_eq!(summarize(&first).total.calories, 750.0);
    }

    #[test]
    fn soft_deleted_rows_never_count() {
        let mut gone = meal(datetime!(2024-01-01 12:00 UTC), 9999.0);
        gone.deleted = true;
        let rows = vec![gone, meal(datetime!(2024-01-01 13:00 UTC), 100.0)];
        let w = window(date!(2024 - 01 - 01), date!(2024 - 01 - 01));
        let out = aggregate(&rows, &w, UtcOffset::UTC);
        assert_eq!(out[0].totals.calories, 100.0);
        assert_eq!(out[0].entries, 1);
    }

    #[test]
    fn rows_outside_window_are_ignored() {
        let rows = vec![
            meal(datetime!(2023-12-31 12:00 UTC), 400.0),
            meal(datetime!(2024-01-02 12:00 UTC), 200.0),
        ];
        let w = window(date!(2024 - 01 - 01), date!(2024 - 01 - 01));
        let out = aggregate(&rows, &w, UtcOffset::UTC);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].totals.calories, 0.0);
    }

    #[test]
    fn day_boundary_follows_local_offset() {
        // 23:30 local on Jan 1st at -03:00 is already Jan 2nd in UTC.
        let rows = vec![meal(datetime!(2024-01-02 02:30 UTC), 600.0)];
        let w = window(date!(2024 - 01 - 01), date!(2024 - 01 - 02));
        let out = aggregate(&rows, &w, offset!(-3));
        assert_eq!(out[0].totals.calories, 600.0);
        assert_eq!(out[1].totals.calories, 0.0);
    }

    #[test]
    fn weight_is_averaged_per_day() {
        let rows = vec![
            Weighing(datetime!(2024-01-01 07:00 UTC), 80.0),
            Weighing(datetime!(2024-01-01 21:00 UTC), 81.0),
        ];
        let w = window(date!(2024 - 01 - 01), date!(2024 - 01 - 02));
        let out = aggregate(&rows, &w, UtcOffset::UTC);
        assert_eq!(out[0].totals.weight_kg, 80.5);
        assert_eq!(out[1].totals.weight_kg, 0.0);
    }

    #[test]
    fn average_skips_empty_days() {
        let rows = vec![
            meal(datetime!(2024-01-01 12:00 UTC), 1800.0),
            meal(datetime!(2024-01-03 12:00 UTC), 2200.0),
        ];
        let w = window(date!(2024 - 01 - 01), date!(2024 - 01 - 04));
        let s = summarize(&aggregate(&rows, &w, UtcOffset::UTC));
        assert_eq!(s.total.calories, 4000.0);
        assert_eq!(s.average.calories, 2000.0);
        assert_eq!(s.logged_days, 2);
    }

    #[test]
    fn summary_of_nothing_is_zero() {
        let s: Summary<NutritionTotals> = summarize(&[]);
        assert_eq!(s.total, NutritionTotals::default());
        assert_eq!(s.average, NutritionTotals::default());
    }

    #[test]
    fn daily_aggregate_serializes_flat() {
        let d = DailyAggregate {
            day: date!(2024 - 01 - 01),
            entries: 2,
            totals: NutritionTotals {
                calories: 800.0,
                ..Default::default()
            },
        };
        let v = serde_json::to_value(d).unwrap();
        assert_eq!(v["data"], "2024-01-01");
        assert_eq!(v["calorias"], 800.0);
        assert_eq!(v["registros"], 2);
    }
}
