use anyhow::Context;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::repo_types::{Comparison, DeliveryStatus, NutritionPayload, ReportRow};
use crate::window::DateWindow;

const REPORT_COLUMNS: &str = "id, user_id, created_by, start_date, end_date, nutrition, narrative, \
                              comparison, status, sent_at, created_at";

pub struct NewReport<'a> {
    pub user_id: Uuid,
    pub created_by: Uuid,
    pub window: DateWindow,
    pub nutrition: &'a NutritionPayload,
    pub narrative: Option<&'a str>,
    pub comparison: Option<&'a Comparison>,
}

pub async fn insert(db: &PgPool, new: NewReport<'_>) -> anyhow::Result<ReportRow> {
    sqlx::query_as::<_, ReportRow>(&format!(
        r#"
        INSERT INTO reports (id, user_id, created_by, start_date, end_date, nutrition, narrative, comparison, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {REPORT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(new.user_id)
    .bind(new.created_by)
    .bind(new.window.start)
    .bind(new.window.end)
    .bind(Json(new.nutrition))
    .bind(new.narrative)
    .bind(new.comparison.map(Json))
    .bind(DeliveryStatus::Pending.as_str())
    .fetch_one(db)
    .await
    .context("insert report")
}

pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<ReportRow>> {
    sqlx::query_as::<_, ReportRow>(&format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("select report")
}

pub async fn list_by_user(db: &PgPool, user_id: Uuid, limit: i64, offset: i64) -> anyhow::Result<Vec<ReportRow>> {
    sqlx::query_as::<_, ReportRow>(&format!(
        r#"
        SELECT {REPORT_COLUMNS}
          FROM reports
         WHERE user_id = $1
         ORDER BY created_at DESC
         LIMIT $2 OFFSET $3
        "#
    ))
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .context("list reports")
}

/// Sets the delivery status; `enviado` also stamps `sent_at`.
pub async fn update_status(db: &PgPool, id: Uuid, status: DeliveryStatus) -> anyhow::Result<Option<ReportRow>> {
    sqlx::query_as::<_, ReportRow>(&format!(
        r#"
        UPDATE reports
           SET status = $2,
               sent_at = CASE WHEN $2 = 'enviado' THEN now() ELSE sent_at END
         WHERE id = $1
        RETURNING {REPORT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(status.as_str())
    .fetch_optional(db)
    .await
    .context("update report status")
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM reports WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("delete report")?;
    Ok(res.rows_affected() > 0)
}
