use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::dto::PublicUser;
use crate::{error::AppError, state::AppState};

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/user", get(get_user))
}

#[instrument(skip(state))]
pub async fn get_user(State(state): State<AppState>) -> Result<Json<PublicUser>, AppError> {
    let user = state
        .users
        .get_user(&state.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(Json(user.into()))
}
