use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CreateNutritionRequest {
    /// Log on behalf of another user the caller may manage.
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub consumed_at: Option<OffsetDateTime>,
    pub calories: f64,
    #[serde(default)]
    pub protein_g: f64,
    #[serde(default)]
    pub carbs_g: f64,
    #[serde(default)]
    pub fat_g: f64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateWeightRequest {
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub measured_at: Option<OffsetDateTime>,
    pub weight_kg: f64,
}

#[derive(Debug, Deserialize)]
pub struct CreateHydrationRequest {
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub consumed_at: Option<OffsetDateTime>,
    pub volume_ml: f64,
}

const MAX_CALORIES_PER_ENTRY: f64 = 20_000.0;
const MAX_WEIGHT_KG: f64 = 700.0;
const MAX_VOLUME_ML: f64 = 10_000.0;

fn non_negative(field: &str, v: f64) -> Result<(), AppError> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(AppError::Validation(format!("{field} must be a non-negative number")))
    }
}

impl CreateNutritionRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        non_negative("calories", self.calories)?;
        non_negative("protein_g", self.protein_g)?;
        non_negative("carbs_g", self.carbs_g)?;
        non_negative("fat_g", self.fat_g)?;
        if self.calories > MAX_CALORIES_PER_ENTRY {
            return Err(AppError::Validation("calories out of range".into()));
        }
        Ok(())
    }
}

impl CreateWeightRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.weight_kg.is_finite() || self.weight_kg <= 0.0 || self.weight_kg > MAX_WEIGHT_KG {
            return Err(AppError::Validation("weight_kg out of range".into()));
        }
        Ok(())
    }
}

impl CreateHydrationRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.volume_ml.is_finite() || self.volume_ml <= 0.0 || self.volume_ml > MAX_VOLUME_ML {
            return Err(AppError::Validation("volume_ml out of range".into()));
        }
        Ok(())
    }
}

/// `?user_id=&start_date=&end_date=` for listings.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub user_id: Option<Uuid>,
    pub start_date: Option<time::Date>,
    pub end_date: Option<time::Date>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nutrition_body_defaults_macros() {
        let req: CreateNutritionRequest =
            serde_json::from_str(r#"{"calories": 450, "description": "feijoada"}"#).unwrap();
        assert_eq!(req.protein_g, 0.0);
        assert!(req.consumed_at.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn negative_macros_are_rejected() {
        let req: CreateNutritionRequest =
            serde_json::from_str(r#"{"calories": 100, "fat_g": -1}"#).unwrap();
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn zero_weight_and_volume_are_rejected() {
        let w: CreateWeightRequest = serde_json::from_str(r#"{"weight_kg": 0}"#).unwrap();
        assert!(w.validate().is_err());
        let h: CreateHydrationRequest = serde_json::from_str(r#"{"volume_ml": 0}"#).unwrap();
        assert!(h.validate().is_err());
        let h: CreateHydrationRequest = serde_json::from_str(r#"{"volume_ml": 250}"#).unwrap();
        assert!(h.validate().is_ok());
    }

    #[test]
    fn timestamps_parse_as_rfc3339() {
        let w: CreateWeightRequest = serde_json::from_str(
            r#"{"weight_kg": 72.4, "measured_at": "2024-01-01T07:30:00-03:00"}"#,
        )
        .unwrap();
        assert_eq!(w.measured_at.unwrap().offset().whole_hours(), -3);
    }
}
