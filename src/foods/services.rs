use time::{Date, Duration, UtcOffset};

use super::{
    dto::{CreateFoodEntryRequest, DailySummary, DayCalories},
    repo_types::{FoodLogEntry, NewFoodEntry},
};
use crate::{
    error::AppError,
    nutrition::{
        services::{
            percent_in_range, ALCOHOL_KCAL_PER_G, CARBS_KCAL_PER_G, FAT_KCAL_PER_G,
            PROTEIN_KCAL_PER_G,
        },
        NutritionEstimate,
    },
};

/// Checks a confirmation request and binds it to `user_id`.
pub fn validate_new_entry(
    user_id: &str,
    req: CreateFoodEntryRequest,
) -> Result<NewFoodEntry, AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }
    let description = req.description.trim();
    if description.is_empty() {
        return Err(AppError::Validation("description is required".into()));
    }
    if req.calories < 0 {
        return Err(AppError::Validation("calories must not be negative".into()));
    }
    for (field, value) in [
        ("protein", req.protein),
        ("carbs", req.carbs),
        ("fat", req.fat),
        ("alcohol", req.alcohol),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(AppError::Validation(format!("{field} must not be negative")));
        }
    }
    for (field, value) in [
        ("proteinPercent", req.protein_percent),
        ("carbsPercent", req.carbs_percent),
        ("fatPercent", req.fat_percent),
        ("alcoholPercent", req.alcohol_percent),
    ] {
        if !percent_in_range(value) {
            return Err(AppError::Validation(format!(
                "{field} must be between 0 and 100"
            )));
        }
    }

    Ok(NewFoodEntry {
        user_id: user_id.to_string(),
        description: description.to_string(),
        estimate: NutritionEstimate {
            name: name.to_string(),
            calories: req.calories,
            protein: req.protein,
            carbs: req.carbs,
            fat: req.fat,
            alcohol: req.alcohol,
            protein_percent: req.protein_percent,
            carbs_percent: req.carbs_percent,
            fat_percent: req.fat_percent,
            alcohol_percent: req.alcohol_percent,
        },
    })
}

/// Totals for one day's entries. Percentages come from the summed grams.
pub fn summarize_day(
    date: Date,
    entries: &[FoodLogEntry],
    daily_calorie_goal: i32,
) -> DailySummary {
    let total_calories: i64 = entries.iter().map(|e| i64::from(e.calories)).sum();
    let protein: f64 = entries.iter().map(|e| e.protein).sum();
    let carbs: f64 = entries.iter().map(|e| e.carbs).sum();
    let fat: f64 = entries.iter().map(|e| e.fat).sum();
    let alcohol: f64 = entries.iter().map(|e| e.alcohol).sum();

    let macro_kcal = protein * PROTEIN_KCAL_PER_G
        + carbs * CARBS_KCAL_PER_G
        + fat * FAT_KCAL_PER_G
        + alcohol * ALCOHOL_KCAL_PER_G;
    let share = |kcal: f64| {
        if macro_kcal > 0.0 {
            (kcal / macro_kcal * 100.0).round()
        } else {
            0.0
        }
    };

    let goal_progress = if daily_calorie_goal > 0 {
        (total_calories as f64 / f64::from(daily_calorie_goal) * 100.0).min(100.0)
    } else {
        0.0
    };

    DailySummary {
        date: date.to_string(),
        entry_count: entries.len(),
        total_calories,
        protein,
        carbs,
        fat,
        alcohol,
        protein_percent: share(protein * PROTEIN_KCAL_PER_G),
        carbs_percent: share(carbs * CARBS_KCAL_PER_G),
        fat_percent: share(fat * FAT_KCAL_PER_G),
        alcohol_percent: share(alcohol * ALCOHOL_KCAL_PER_G),
        daily_calorie_goal,
        goal_progress,
    }
}

/// Calories per local day for the seven days ending `today`, oldest first.
pub fn weekly_calories(
    entries: &[FoodLogEntry],
    today: Date,
    offset: UtcOffset,
) -> Vec<DayCalories> {
    (0..7i64)
        .rev()
        .map(|back| today - Duration::days(back))
        .map(|day| DayCalories {
            date: day.to_string(),
            calories: entries
                .iter()
                .filter(|e| e.created_at.to_offset(offset).date() == day)
                .map(|e| i64::from(e.calories))
                .sum(),
        })
        .collect()
}
