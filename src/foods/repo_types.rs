use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::nutrition::NutritionEstimate;

/// Confirmed food log record. Never updated once stored.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FoodLogEntry {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub description: String,
    pub calories: i32,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub alcohol: f64,
    pub protein_percent: f64,
    pub carbs_percent: f64,
    pub fat_percent: f64,
    pub alcohol_percent: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Input to `FoodLogStore::create_entry`; id and timestamp are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewFoodEntry {
    pub user_id: String,
    pub description: String,
    pub estimate: NutritionEstimate,
}

impl NewFoodEntry {
    pub fn into_entry(self, id: Uuid, created_at: OffsetDateTime) -> FoodLogEntry {
        let NutritionEstimate {
            name,
            calories,
            protein,
            carbs,
            fat,
            alcohol,
            protein_percent,
            carbs_percent,
            fat_percent,
            alcohol_percent,
        } = self.estimate;
        FoodLogEntry {
            id,
            user_id: self.user_id,
            name,
            description: self.description,
            calories,
            protein,
            carbs,
            fat,
            alcohol,
            protein_percent,
            carbs_percent,
            fat_percent,
            alcohol_percent,
            created_at,
        }
    }
}
