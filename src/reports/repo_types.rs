use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::dashboard::aggregate::{DailyAggregate, NutritionTotals, Summary};
use crate::window::DateWindow;

/// Delivery state of a report. Only this (and `sent_at`) changes after
/// creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    #[serde(rename = "pendente")]
    Pending,
    #[serde(rename = "enviado")]
    Sent,
    #[serde(rename = "falha")]
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pendente",
            DeliveryStatus::Sent => "enviado",
            DeliveryStatus::Failed => "falha",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pendente" => Some(DeliveryStatus::Pending),
            "enviado" => Some(DeliveryStatus::Sent),
            "falha" => Some(DeliveryStatus::Failed),
            _ => None,
        }
    }
}

/// Nutrition payload persisted verbatim: `{diarios, total, media}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionPayload {
    #[serde(rename = "diarios")]
    pub daily: Vec<DailyAggregate<NutritionTotals>>,
    #[serde(flatten)]
    pub summary: Summary<NutritionTotals>,
}

/// Current window against the same-length window right before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub previous_window: DateWindow,
    pub previous: Summary<NutritionTotals>,
    pub total_calories_delta: f64,
    pub average_calories_delta: f64,
    /// Omitted when the previous period has no calories to compare with.
    pub average_calories_change_percent: Option<f64>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ReportRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_by: Uuid,
    pub start_date: Date,
    pub end_date: Date,
    pub nutrition: Json<NutritionPayload>,
    pub narrative: Option<String>,
    pub comparison: Option<Json<Comparison>>,
    pub status: String,
    pub sent_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}
