pub mod dto;
pub mod handlers;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use dto::NutritionEstimate;
pub use services::NutritionEstimator;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::analyze_routes())
}
