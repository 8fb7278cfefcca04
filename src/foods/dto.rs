use serde::{Deserialize, Serialize};

/// Body of `POST /api/foods`: a confirmed estimate plus the text it came from.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFoodEntryRequest {
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
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: String,
    pub entry_count: usize,
    pub total_calories: i64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub alcohol: f64,
    pub protein_percent: f64,
    pub carbs_percent: f64,
    pub fat_percent: f64,
    pub alcohol_percent: f64,
    pub daily_calorie_goal: i32,
    /// Share of the goal reached, capped at 100.
    pub goal_progress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCalories {
    pub date: String,
    pub calories: i64,
}
