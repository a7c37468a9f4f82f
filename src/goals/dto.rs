use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dashboard::metrics::Goals;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct UpsertGoalsRequest {
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub daily_calories_kcal: Option<f64>,
    #[serde(default)]
    pub daily_water_ml: Option<f64>,
    #[serde(default)]
    pub target_weight_kg: Option<f64>,
}

impl UpsertGoalsRequest {
    /// Zero is allowed and means "no goal"; negatives are not.
    pub fn validate(&self) -> Result<(), AppError> {
        let fields = [
            ("daily_calories_kcal", self.daily_calories_kcal),
            ("daily_water_ml", self.daily_water_ml),
            ("target_weight_kg", self.target_weight_kg),
        ];
        for (name, value) in fields {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(AppError::Validation(format!("{name} must be a non-negative number")));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct GoalsQuery {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct GoalsResponse {
    pub user_id: Uuid,
    /// Values after defaults were applied.
    pub goals: Goals,
    /// Whether the user has stored goals at all.
    pub customized: bool,
}
