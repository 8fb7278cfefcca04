use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::get,
    Json, Router,
};
use time::{macros::format_description, Date, OffsetDateTime};
use tracing::{info, instrument};

use super::{
    dto::{CreateFoodEntryRequest, DailySummary, DayCalories},
    repo_types::FoodLogEntry,
    services::{summarize_day, validate_new_entry, weekly_calories},
};
use crate::{error::AppError, state::AppState};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/foods/today", get(list_today))
        .route("/foods/today/summary", get(today_summary))
        .route("/foods/weekly", get(weekly))
        .route("/foods/date/:date", get(list_on_date))
}

pub fn write_routes() -> Router<AppState> {
    Router::new().route("/foods", get(list_all).post(create_food_entry))
}

fn today(state: &AppState) -> Date {
    OffsetDateTime::now_utc()
        .to_offset(state.config.utc_offset)
        .date()
}

#[instrument(skip(state, payload))]
pub async fn create_food_entry(
    State(state): State<AppState>,
    payload: Result<Json<CreateFoodEntryRequest>, JsonRejection>,
) -> Result<Json<FoodLogEntry>, AppError> {
    let Json(body) = payload?;
    let new = validate_new_entry(&state.user_id, body)?;
    let entry = state.foods.create_entry(new).await?;
    info!(entry_id = %entry.id, user_id = %entry.user_id, calories = entry.calories, "food entry logged");
    Ok(Json(entry))
}

#[instrument(skip(state))]
pub async fn list_all(State(state): State<AppState>) -> Result<Json<Vec<FoodLogEntry>>, AppError> {
    let entries = state.foods.list_entries_for_user(&state.user_id).await?;
    Ok(Json(entries))
}

#[instrument(skip(state))]
pub async fn list_today(
    State(state): State<AppState>,
) -> Result<Json<Vec<FoodLogEntry>>, AppError> {
    let entries = state
        .foods
        .list_entries_for_user_on_date(&state.user_id, today(&state))
        .await?;
    Ok(Json(entries))
}

#[instrument(skip(state))]
pub async fn list_on_date(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<Vec<FoodLogEntry>>, AppError> {
    let date = Date::parse(&raw, format_description!("[year]-[month]-[day]"))
        .map_err(|_| AppError::Validation(format!("invalid date {raw}, expected YYYY-MM-DD")))?;
    let entries = state
        .foods
        .list_entries_for_user_on_date(&state.user_id, date)
        .await?;
    Ok(Json(entries))
}

#[instrument(skip(state))]
pub async fn today_summary(State(state): State<AppState>) -> Result<Json<DailySummary>, AppError> {
    let user = state
        .users
        .get_user(&state.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    let day = today(&state);
    let entries = state
        .foods
        .list_entries_for_user_on_date(&state.user_id, day)
        .await?;
    Ok(Json(summarize_day(day, &entries, user.daily_calorie_goal)))
}

#[instrument(skip(state))]
pub async fn weekly(State(state): State<AppState>) -> Result<Json<Vec<DayCalories>>, AppError> {
    let entries = state.foods.list_entries_for_user(&state.user_id).await?;
    Ok(Json(weekly_calories(
        &entries,
        today(&state),
        state.config.utc_offset,
    )))
}
