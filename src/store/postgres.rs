use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use time::{Date, OffsetDateTime, UtcOffset};
use uuid::Uuid;

use super::{creation_timestamp, day_bounds, FoodLogStore, UserStore};
use crate::{
    error::AppError,
    foods::repo_types::{FoodLogEntry, NewFoodEntry},
    users::repo_types::{NewUser, User},
};

const ENTRY_COLUMNS: &str = r#"
    id, user_id, name, description, calories,
    protein, carbs, fat, alcohol,
    protein_percent, carbs_percent, fat_percent, alcohol_percent,
    created_at
"#;

/// PostgreSQL backend over the `users` and `food_entries` tables.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
    offset: UtcOffset,
}

impl PgStore {
    pub async fn connect(database_url: &str, offset: UtcOffset) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db, offset })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

#[async_trait]
impl FoodLogStore for PgStore {
    async fn create_entry(&self, entry: NewFoodEntry) -> Result<FoodLogEntry, AppError> {
        let e = entry.into_entry(Uuid::new_v4(), creation_timestamp());
        let sql = format!(
            r#"
            INSERT INTO food_entries (
                id, user_id, name, description, calories,
                protein, carbs, fat, alcohol,
                protein_percent, carbs_percent, fat_percent, alcohol_percent,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {ENTRY_COLUMNS}
            "#
        );
        let stored = sqlx::query_as::<_, FoodLogEntry>(&sql)
            .bind(e.id)
            .bind(&e.user_id)
            .bind(&e.name)
            .bind(&e.description)
            .bind(e.calories)
            .bind(e.protein)
            .bind(e.carbs)
            .bind(e.fat)
            .bind(e.alcohol)
            .bind(e.protein_percent)
            .bind(e.carbs_percent)
            .bind(e.fat_percent)
            .bind(e.alcohol_percent)
            .bind(e.created_at)
            .fetch_one(&self.db)
            .await?;
        Ok(stored)
    }

    async fn list_entries_for_user(&self, user_id: &str) -> Result<Vec<FoodLogEntry>, AppError> {
        let sql = format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM food_entries
            WHERE user_id = $1
            ORDER BY created_at DESC, seq DESC
            "#
        );
        let rows = sqlx::query_as::<_, FoodLogEntry>(&sql)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn list_entries_for_user_on_date(
        &self,
        user_id: &str,
        date: Date,
    ) -> Result<Vec<FoodLogEntry>, AppError> {
        let (start, end) = day_bounds(date, self.offset);
        let sql = format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM food_entries
            WHERE user_id = $1 AND created_at >= $2 AND created_at < $3
            ORDER BY created_at DESC, seq DESC
            "#
        );
        let rows = sqlx::query_as::<_, FoodLogEntry>(&sql)
            .bind(user_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password, daily_calorie_goal
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password, daily_calorie_goal
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, password, daily_calorie_goal)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, password, daily_calorie_goal
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.daily_calorie_goal)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return AppError::Validation(format!(
                        "username {} is already taken",
                        user.username
                    ));
                }
            }
            AppError::from(e)
        })?;
        Ok(created)
    }
}
