use serde::{Deserialize, Serialize};

/// Candidate nutrition record for one food description. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionEstimate {
    pub name: String,
    pub calories: i32,
    pub protein: f64, // grams
    pub carbs: f64,   // grams
    pub fat: f64,     // grams
    pub alcohol: f64, // grams
    pub protein_percent: f64,
    pub carbs_percent: f64,
    pub fat_percent: f64,
    pub alcohol_percent: f64,
}

impl NutritionEstimate {
    pub fn percent_sum(&self) -> f64 {
        self.protein_percent + self.carbs_percent + self.fat_percent + self.alcohol_percent
    }
}

/// Shape the AI service must answer with. Every field is required.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawEstimate {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub alcohol: f64,
    pub protein_percent: f64,
    pub carbs_percent: f64,
    pub fat_percent: f64,
    pub alcohol_percent: f64,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub description: String,
}
