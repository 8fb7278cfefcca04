use serde::Serialize;
use sqlx::FromRow;

/// User record. Only the owning key for food entries and the calorie goal matter here.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String, // Argon2 PHC string
    pub daily_calorie_goal: i32,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub daily_calorie_goal: i32,
}
