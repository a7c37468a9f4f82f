use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Domain, HydrationEntry, NutritionEntry, WeightEntry};
use crate::window::TimeRange;

const NUTRITION_COLUMNS: &str =
    "id, user_id, consumed_at, calories, protein_g, carbs_g, fat_g, description, deleted_at, created_at";
const WEIGHT_COLUMNS: &str = "id, user_id, measured_at, weight_kg, deleted_at, created_at";
const HYDRATION_COLUMNS: &str = "id, user_id, consumed_at, volume_ml, deleted_at, created_at";

/// Read side used by the collectors. Every method returns live rows only,
/// ordered by timestamp ascending.
#[async_trait]
pub trait EntryStore: Send + Sync {
    async fn nutrition(&self, user_id: Uuid, range: TimeRange) -> anyhow::Result<Vec<NutritionEntry>>;
    async fn weight(&self, user_id: Uuid, range: TimeRange) -> anyhow::Result<Vec<WeightEntry>>;
    async fn hydration(&self, user_id: Uuid, range: TimeRange) -> anyhow::Result<Vec<HydrationEntry>>;
}

#[derive(Clone)]
pub struct PgEntryStore {
    db: PgPool,
}

impl PgEntryStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn range_query(domain: Domain, columns: &str) -> String {
    format!(
        r#"
        SELECT {columns}
          FROM {table}
         WHERE user_id = $1
           AND deleted_at IS NULL
           AND {ts} >= $2 AND {ts} < $3
         ORDER BY {ts} ASC
        "#,
        table = domain.table(),
        ts = domain.time_column(),
    )
}

#[async_trait]
impl EntryStore for PgEntryStore {
    async fn nutrition(&self, user_id: Uuid, range: TimeRange) -> anyhow::Result<Vec<NutritionEntry>> {
        sqlx::query_as::<_, NutritionEntry>(&range_query(Domain::Nutrition, NUTRITION_COLUMNS))
            .bind(user_id)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.db)
            .await
            .context("select nutrition entries")
    }

    async fn weight(&self, user_id: Uuid, range: TimeRange) -> anyhow::Result<Vec<WeightEntry>> {
        sqlx::query_as::<_, WeightEntry>(&range_query(Domain::Weight, WEIGHT_COLUMNS))
            .bind(user_id)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.db)
            .await
            .context("select weight entries")
    }

    async fn hydration(&self, user_id: Uuid, range: TimeRange) -> anyhow::Result<Vec<HydrationEntry>> {
        sqlx::query_as::<_, HydrationEntry>(&range_query(Domain::Hydration, HYDRATION_COLUMNS))
            .bind(user_id)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.db)
            .await
            .context("select hydration entries")
    }
}

pub struct NewNutrition<'a> {
    pub consumed_at: OffsetDateTime,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub description: Option<&'a str>,
}

pub async fn insert_nutrition(
    db: &PgPool,
    user_id: Uuid,
    new: NewNutrition<'_>,
) -> anyhow::Result<NutritionEntry> {
    sqlx::query_as::<_, NutritionEntry>(&format!(
        r#"
        INSERT INTO nutrition_entries (id, user_id, consumed_at, calories, protein_g, carbs_g, fat_g, description)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {NUTRITION_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(new.consumed_at)
    .bind(new.calories)
    .bind(new.protein_g)
    .bind(new.carbs_g)
    .bind(new.fat_g)
    .bind(new.description)
    .fetch_one(db)
    .await
    .context("insert nutrition entry")
}

pub async fn insert_weight(
    db: &PgPool,
    user_id: Uuid,
    measured_at: OffsetDateTime,
    weight_kg: f64,
) -> anyhow::Result<WeightEntry> {
    sqlx::query_as::<_, WeightEntry>(&format!(
        r#"
        INSERT INTO weight_entries (id, user_id, measured_at, weight_kg)
        VALUES ($1, $2, $3, $4)
        RETURNING {WEIGHT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(measured_at)
    .bind(weight_kg)
    .fetch_one(db)
    .await
    .context("insert weight entry")
}

pub async fn insert_hydration(
    db: &PgPool,
    user_id: Uuid,
    consumed_at: OffsetDateTime,
    volume_ml: f64,
) -> anyhow::Result<HydrationEntry> {
    sqlx::query_as::<_, HydrationEntry>(&format!(
        r#"
        INSERT INTO hydration_entries (id, user_id, consumed_at, volume_ml)
        VALUES ($1, $2, $3, $4)
        RETURNING {HYDRATION_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(consumed_at)
    .bind(volume_ml)
    .fetch_one(db)
    .await
    .context("insert hydration entry")
}

/// Owner of a live entry, if it exists and was not deleted yet.
pub async fn find_owner(db: &PgPool, domain: Domain, id: Uuid) -> anyhow::Result<Option<Uuid>> {
    let owner = sqlx::query_scalar::<_, Uuid>(&format!(
        "SELECT user_id FROM {} WHERE id = $1 AND deleted_at IS NULL",
        domain.table()
    ))
    .bind(id)
    .fetch_optional(db)
    .await
    .with_context(|| format!("find {domain} entry owner"))?;
    Ok(owner)
}

/// Marks an entry deleted. Returns false if it was already gone.
pub async fn soft_delete(db: &PgPool, domain: Domain, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query(&format!(
        "UPDATE {} SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
        domain.table()
    ))
    .bind(id)
    .execute(db)
    .await
    .with_context(|| format!("soft delete {domain} entry"))?;
    Ok(res.rows_affected() > 0)
}
