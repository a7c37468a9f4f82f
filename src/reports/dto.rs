use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::repo_types::{Comparison, DeliveryStatus, NutritionPayload, ReportRow};

#[derive(Debug, Deserialize)]
pub struct CreateReportRequest {
    #[serde(default)]
    pub user_id: Option<Uuid>,
    pub start_date: Date,
    pub end_date: Date,
    /// Ask the text service for a narrative.
    #[serde(default)]
    pub narrative: bool,
    /// Attach the previous-period comparison.
    #[serde(default)]
    pub compare_previous: bool,
}

#[derive(Debug, Deserialize)]
pub struct ListReportsQuery {
    pub user_id: Option<Uuid>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: DeliveryStatus,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_by: Uuid,
    pub start_date: Date,
    pub end_date: Date,
    #[serde(rename = "dados_nutricionais")]
    pub nutrition: NutritionPayload,
    pub narrative: Option<String>,
    pub comparison: Option<Comparison>,
    /// `None` if the stored value is not a known status.
    pub status: Option<DeliveryStatus>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub sent_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<ReportRow> for ReportResponse {
    fn from(r: ReportRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            created_by: r.created_by,
            start_date: r.start_date,
            end_date: r.end_date,
            nutrition: r.nutrition.0,
            narrative: r.narrative,
            comparison: r.comparison.map(|c| c.0),
            status: DeliveryStatus::parse(&r.status),
            sent_at: r.sent_at,
            created_at: r.created_at,
        }
    }
}
