use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{AnalyzeRequest, NutritionEstimate};
use crate::{error::AppError, state::AppState};

pub fn analyze_routes() -> Router<AppState> {
    Router::new().route("/foods/analyze", post(analyze_food))
}

#[instrument(skip(state, payload))]
pub async fn analyze_food(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<NutritionEstimate>, AppError> {
    let Json(body) = payload?;
    let estimate = state.estimator.estimate(&body.description).await?;
    info!(name = %estimate.name, calories = estimate.calories, "food analyzed");
    Ok(Json(estimate))
}
