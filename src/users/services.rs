use tracing::info;

use super::{password::hash_password, repo_types::NewUser, repo_types::User};
use crate::{config::DemoUserConfig, error::AppError, store::UserStore};

/// Creates a user, storing only the hashed password.
pub async fn register_user(
    users: &dyn UserStore,
    username: &str,
    password: &str,
    daily_calorie_goal: i32,
) -> Result<User, AppError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::Validation("username is required".into()));
    }
    if daily_calorie_goal <= 0 {
        return Err(AppError::Validation(
            "daily calorie goal must be positive".into(),
        ));
    }
    let password_hash =
        hash_password(password).map_err(|e| AppError::Internal(format!("hash password: {e}")))?;

    users
        .create_user(NewUser {
            username: username.to_string(),
            password_hash,
            daily_calorie_goal,
        })
        .await
}

/// Returns the single demo user, creating it on first start.
pub async fn ensure_demo_user(
    users: &dyn UserStore,
    cfg: &DemoUserConfig,
) -> Result<User, AppError> {
    if let Some(existing) = users.get_user_by_username(&cfg.username).await? {
        return Ok(existing);
    }
    let user = register_user(users, &cfg.username, &cfg.password, cfg.daily_calorie_goal).await?;
    info!(user_id = %user.id, username = %user.username, "demo user created");
    Ok(user)
}
