//! Goal comparison, trends and insight rules layered over daily aggregates.
//!
//! Nothing here fails: missing data degrades to zero or to an omitted value.

use serde::Serialize;

use super::aggregate::{entry_count, DailyAggregate, HydrationTotals, NutritionTotals, WeightTotals};

pub const DEFAULT_DAILY_CALORIES: f64 = 2000.0;
pub const DEFAULT_DAILY_WATER_ML: f64 = 2000.0;

/// Fewer rows than this across all domains triggers the engagement hint.
const LOW_ENGAGEMENT_RECORDS: u32 = 10;
/// Below this many points the trend line is a straight interpolation.
const TREND_MIN_POINTS: usize = 5;
const WEIGHT_TARGET_TOLERANCE_KG: f64 = 1.0;

/// Goals after defaults were applied. A goal of zero means "no goal".
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Goals {
    pub daily_calories_kcal: f64,
    pub daily_water_ml: f64,
    pub target_weight_kg: Option<f64>,
}

impl Default for Goals {
    fn default() -> Self {
        Self {
            daily_calories_kcal: DEFAULT_DAILY_CALORIES,
            daily_water_ml: DEFAULT_DAILY_WATER_ML,
            target_weight_kg: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GoalProgress {
    pub value: f64,
    pub goal: f64,
    /// Unclamped, for numeric display.
    pub percent: f64,
    /// Clamped to `[0, 100]`, for progress bars.
    pub bar: f64,
}

pub fn percent_of_goal(value: f64, goal: f64) -> Option<GoalProgress> {
    if !goal.is_finite() || goal <= 0.0 {
        return None;
    }
    let value = if value.is_finite() { value } else { 0.0 };
    let percent = value / goal * 100.0;
    Some(GoalProgress {
        value,
        goal,
        percent,
        bar: percent.clamp(0.0, 100.0),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Trend {
    pub latest: Option<f64>,
    /// Latest minus the previous point.
    pub day_over_day: Option<f64>,
    /// Latest minus the first point of the window.
    pub period_over_period: Option<f64>,
    /// Series for the chart line.
    pub line: Vec<f64>,
}

pub fn trend(values: &[f64]) -> Trend {
    let latest = values.last().copied();
    let (day_over_day, period_over_period) = match values {
        [.., prev, last] => (Some(last - prev), Some(last - values[0])),
        _ => (None, None),
    };
    Trend {
        latest,
        day_over_day,
        period_over_period,
        line: trend_line(values),
    }
}

fn trend_line(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n >= TREND_MIN_POINTS || n < 2 {
        return values.to_vec();
    }
    let first = values[0];
    let step = (values[n - 1] - first) / (n - 1) as f64;
    (0..n).map(|i| first + step * i as f64).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightCategory {
    Success,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    HydrationLow,
    CaloriesOver,
    HydrationMet,
    CaloriesOnTarget,
    WeightTargetNear,
    LowEngagement,
    WeightTrend,
}

impl InsightKind {
    pub fn category(self) -> InsightCategory {
        match self {
            InsightKind::HydrationLow | InsightKind::CaloriesOver => InsightCategory::Warning,
            InsightKind::HydrationMet
            | InsightKind::CaloriesOnTarget
            | InsightKind::WeightTargetNear => InsightCategory::Success,
            InsightKind::LowEngagement | InsightKind::WeightTrend => InsightCategory::Info,
        }
    }

    /// Lower is shown first.
    pub fn priority(self) -> u8 {
        match self {
            InsightKind::HydrationLow => 1,
            InsightKind::CaloriesOver => 2,
            InsightKind::HydrationMet => 3,
            InsightKind::CaloriesOnTarget => 4,
            InsightKind::WeightTargetNear => 5,
            InsightKind::LowEngagement => 6,
            InsightKind::WeightTrend => 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub category: InsightCategory,
    pub message: String,
}

impl Insight {
    fn new(kind: InsightKind, message: String) -> Self {
        Self {
            kind,
            category: kind.category(),
            message,
        }
    }
}

/// Daily aggregates for the three domains over the same window.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeriveInput<'a> {
    pub nutrition: &'a [DailyAggregate<NutritionTotals>],
    pub hydration: &'a [DailyAggregate<HydrationTotals>],
    pub weight: &'a [DailyAggregate<WeightTotals>],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Derived {
    /// Last day of the window against the daily calorie goal.
    pub calories: Option<GoalProgress>,
    /// Last day of the window against the daily water goal.
    pub hydration: Option<GoalProgress>,
    /// Latest weight minus target; negative means below target.
    pub weight_to_target_kg: Option<f64>,
    pub calories_trend: Trend,
    pub hydration_trend: Trend,
    /// Only days with a weighing contribute.
    pub weight_trend: Trend,
    pub insights: Vec<Insight>,
}

pub fn derive(input: DeriveInput<'_>, goals: &Goals, insight_cap: usize) -> Derived {
    let calories_series: Vec<f64> = input.nutrition.iter().map(|d| d.totals.calories).collect();
    let water_series: Vec<f64> = input.hydration.iter().map(|d| d.totals.volume_ml).collect();
    let weight_series: Vec<f64> = input
        .weight
        .iter()
        .filter(|d| d.entries > 0)
        .map(|d| d.totals.weight_kg)
        .collect();

    let calories_today = calories_series.last().copied().unwrap_or(0.0);
    let water_today = water_series.last().copied().unwrap_or(0.0);

    let calories = percent_of_goal(calories_today, goals.daily_calories_kcal);
    let hydration = percent_of_goal(water_today, goals.daily_water_ml);
    let weight_trend = trend(&weight_series);
    let weight_to_target_kg = match (weight_trend.latest, goals.target_weight_kg) {
        (Some(latest), Some(target)) if target > 0.0 => Some(latest - target),
        _ => None,
    };

    let records = entry_count(input.nutrition) + entry_count(input.hydration) + entry_count(input.weight);

    let mut insights = evaluate_rules(&RuleInput {
        calories_percent: calories.map(|p| p.percent),
        hydration_percent: hydration.map(|p| p.percent),
        weight_to_target_kg,
        weight_change_kg: weight_trend.period_over_period,
        records,
    });
    insights.sort_by_key(|i| i.kind.priority());
    insights.truncate(insight_cap);

    Derived {
        calories,
        hydration,
        weight_to_target_kg,
        calories_trend: trend(&calories_series),
        hydration_trend: trend(&water_series),
        weight_trend,
        insights,
    }
}

struct RuleInput {
    calories_percent: Option<f64>,
    hydration_percent: Option<f64>,
    weight_to_target_kg: Option<f64>,
    weight_change_kg: Option<f64>,
    records: u32,
}

/// Every rule is checked; each match yields one insight.
fn evaluate_rules(r: &RuleInput) -> Vec<Insight> {
    let mut out = Vec::new();

    if let Some(p) = r.hydration_percent {
        if p < 50.0 {
            out.push(Insight::new(
                InsightKind::HydrationLow,
                format!("Hydration is at {p:.0}% of today's goal. Drink some water."),
            ));
        }
        if p >= 100.0 {
            out.push(Insight::new(
                InsightKind::HydrationMet,
                format!("Hydration goal reached ({p:.0}%)."),
            ));
        }
    }

    if let Some(p) = r.calories_percent {
        if p > 120.0 {
            out.push(Insight::new(
                InsightKind::CaloriesOver,
                format!("Calories are at {p:.0}% of today's goal."),
            ));
        }
        if (80.0..=100.0).contains(&p) {
            out.push(Insight::new(
                InsightKind::CaloriesOnTarget,
                format!("Calories are right on target ({p:.0}% of goal)."),
            ));
        }
    }

    if let Some(diff) = r.weight_to_target_kg {
        if diff.abs() <= WEIGHT_TARGET_TOLERANCE_KG {
            out.push(Insight::new(
                InsightKind::WeightTargetNear,
                format!("Within {:.1} kg of the target weight.", diff.abs()),
            ));
        }
    }

    if r.records < LOW_ENGAGEMENT_RECORDS {
        out.push(Insight::new(
            InsightKind::LowEngagement,
            format!(
                "Only {} records in this period. Logging more often gives better insights.",
                r.records
            ),
        ));
    }

    if let Some(change) = r.weight_change_kg.filter(|c| *c != 0.0) {
        let direction = if change < 0.0 { "down" } else { "up" };
        out.push(Insight::new(
            InsightKind::WeightTrend,
            format!("Weight is {direction} {:.1} kg over the period.", change.abs()),
        ));
    }

    out
}
