use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use super::aggregate::{DailyAggregate, HydrationTotals, NutritionTotals, Summary, WeightTotals};
use super::metrics::{Derived, Goals};
use crate::window::DateWindow;

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub user_id: Option<Uuid>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub user_id: Uuid,
    pub window: DateWindow,
    pub goals: Goals,
    pub nutrition: Vec<DailyAggregate<NutritionTotals>>,
    pub hydration: Vec<DailyAggregate<HydrationTotals>>,
    pub weight: Vec<DailyAggregate<WeightTotals>>,
    pub nutrition_summary: Summary<NutritionTotals>,
    pub hydration_summary: Summary<HydrationTotals>,
    pub derived: Derived,
}
