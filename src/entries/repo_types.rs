use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dashboard::aggregate::{HydrationTotals, NutritionTotals, Sample, WeightTotals};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct NutritionEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub consumed_at: OffsetDateTime,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    /// Free text or the AI-derived meal description.
    pub description: Option<String>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WeightEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub measured_at: OffsetDateTime,
    pub weight_kg: f64,
    #[serde(skip_serializing)]
    pub deleted_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct HydrationEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub consumed_at: OffsetDateTime,
    pub volume_ml: f64,
    #[serde(skip_serializing)]
    pub deleted_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Sample for NutritionEntry {
    type Totals = NutritionTotals;

    fn recorded_at(&self) -> OffsetDateTime {
        self.consumed_at
    }

    fn deleted_at(&self) -> Option<OffsetDateTime> {
        self.deleted_at
    }

    fn totals(&self) -> NutritionTotals {
        NutritionTotals {
            calories: self.calories,
            protein_g: self.protein_g,
            carbs_g: self.carbs_g,
            fat_g: self.fat_g,
        }
    }
}

impl Sample for WeightEntry {
    type Totals = WeightTotals;

    fn recorded_at(&self) -> OffsetDateTime {
        self.measured_at
    }

    fn deleted_at(&self) -> Option<OffsetDateTime> {
        self.deleted_at
    }

    fn totals(&self) -> WeightTotals {
        WeightTotals {
            weight_kg: self.weight_kg,
        }
    }
}

impl Sample for HydrationEntry {
    type Totals = HydrationTotals;

    fn recorded_at(&self) -> OffsetDateTime {
        self.consumed_at
    }

    fn deleted_at(&self) -> Option<OffsetDateTime> {
        self.deleted_at
    }

    fn totals(&self) -> HydrationTotals {
        HydrationTotals {
            volume_ml: self.volume_ml,
        }
    }
}

/// The three logged data domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Nutrition,
    Weight,
    Hydration,
}

impl Domain {
    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Nutrition => "nutrition",
            Domain::Weight => "weight",
            Domain::Hydration => "hydration",
        }
    }

    pub(crate) fn table(self) -> &'static str {
        match self {
            Domain::Nutrition => "nutrition_entries",
            Domain::Weight => "weight_entries",
            Domain::Hydration => "hydration_entries",
        }
    }

    pub(crate) fn time_column(self) -> &'static str {
        match self {
            Domain::Nutrition | Domain::Hydration => "consumed_at",
            Domain::Weight => "measured_at",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
