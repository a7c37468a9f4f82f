use anyhow::Context;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dashboard::metrics::Goals;

/// Stored goals; every target is optional.
#[derive(Debug, Clone, FromRow)]
pub struct GoalRow {
    pub user_id: Uuid,
    pub daily_calories_kcal: Option<f64>,
    pub daily_water_ml: Option<f64>,
    pub target_weight_kg: Option<f64>,
    pub updated_at: OffsetDateTime,
}

impl GoalRow {
    /// Applies the fixed defaults to whatever is missing.
    pub fn resolve(row: Option<&GoalRow>) -> Goals {
        let defaults = Goals::default();
        match row {
            None => defaults,
            Some(r) => Goals {
                daily_calories_kcal: r.daily_calories_kcal.unwrap_or(defaults.daily_calories_kcal),
                daily_water_ml: r.daily_water_ml.unwrap_or(defaults.daily_water_ml),
                target_weight_kg: r.target_weight_kg,
            },
        }
    }
}

pub async fn find(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<GoalRow>> {
    sqlx::query_as::<_, GoalRow>(
        r#"
        SELECT user_id, daily_calories_kcal, daily_water_ml, target_weight_kg, updated_at
          FROM goals
         WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("select goals")
}

pub async fn upsert(
    db: &PgPool,
    user_id: Uuid,
    daily_calories_kcal: Option<f64>,
    daily_water_ml: Option<f64>,
    target_weight_kg: Option<f64>,
) -> anyhow::Result<GoalRow> {
    sqlx::query_as::<_, GoalRow>(
        r#"
        INSERT INTO goals (user_id, daily_calories_kcal, daily_water_ml, target_weight_kg)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id) DO UPDATE
           SET daily_calories_kcal = EXCLUDED.daily_calories_kcal,
               daily_water_ml = EXCLUDED.daily_water_ml,
               target_weight_kg = EXCLUDED.target_weight_kg,
               updated_at = now()
        RETURNING user_id, daily_calories_kcal, daily_water_ml, target_weight_kg, updated_at
        "#,
    )
    .bind(user_id)
    .bind(daily_calories_kcal)
    .bind(daily_water_ml)
    .bind(target_weight_kg)
    .fetch_one(db)
    .await
    .context("upsert goals")
}
