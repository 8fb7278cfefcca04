use std::collections::HashMap;

use async_trait::async_trait;
use time::{Date, OffsetDateTime, UtcOffset};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{creation_timestamp, day_bounds, FoodLogStore, UserStore};
use crate::{
    error::AppError,
    foods::repo_types::{FoodLogEntry, NewFoodEntry},
    users::repo_types::{NewUser, User},
};

/// In-process backend. Data lives as long as the process.
pub struct MemoryStore {
    offset: UtcOffset,
    // insertion order
    entries: RwLock<Vec<FoodLogEntry>>,
    users: RwLock<HashMap<String, User>>,
}

impl MemoryStore {
    pub fn new(offset: UtcOffset) -> Self {
        Self {
            offset,
            entries: RwLock::new(Vec::new()),
            users: RwLock::new(HashMap::new()),
        }
    }

    async fn collect<F>(&self, keep: F) -> Vec<FoodLogEntry>
    where
        F: Fn(&FoodLogEntry) -> bool,
    {
        let entries = self.entries.read().await;
        let mut out: Vec<FoodLogEntry> = entries
            .iter()
            .rev()
            .filter(|&e| keep(e))
            .cloned()
            .collect();
        // stable: equal timestamps keep newest-insert-first
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }
}

#[async_trait]
impl FoodLogStore for MemoryStore {
    async fn create_entry(&self, entry: NewFoodEntry) -> Result<FoodLogEntry, AppError> {
        let stored = entry.into_entry(Uuid::new_v4(), creation_timestamp());
        self.entries.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn list_entries_for_user(&self, user_id: &str) -> Result<Vec<FoodLogEntry>, AppError> {
        Ok(self.collect(|e| e.user_id == user_id).await)
    }

    async fn list_entries_for_user_on_date(
        &self,
        user_id: &str,
        date: Date,
    ) -> Result<Vec<FoodLogEntry>, AppError> {
        let (start, end) = day_bounds(date, self.offset);
        Ok(self
            .collect(|e| e.user_id == user_id && e.created_at >= start && e.created_at < end)
            .await)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == user.username) {
            return Err(AppError::Validation(format!(
                "username {} is already taken",
                user.username
            )));
        }
        let created = User {
            id: Uuid::new_v4().to_string(),
            username: user.username,
            password: user.password_hash,
            daily_calorie_goal: user.daily_calorie_goal,
        };
        users.insert(created.id.clone(), created.clone());
        Ok(created)
    }
}

#[cfg(test)]
impl MemoryStore {
    /// Inserts an entry with a fixed timestamp.
    pub(crate) async fn insert_at(
        &self,
        entry: NewFoodEntry,
        created_at: OffsetDateTime,
    ) -> FoodLogEntry {
        let stored = entry.into_entry(Uuid::new_v4(), created_at);
        self.entries.write().await.push(stored.clone());
        stored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::NutritionEstimate;
    use std::collections::HashSet;
    use time::macros::{date, datetime, offset};

    fn new_entry(user_id: &str, name: &str) -> NewFoodEntry {
        NewFoodEntry {
            user_id: user_id.into(),
            description: format!("a plate of {name}"),
            estimate: NutritionEstimate {
                name: name.into(),
                calories: 350,
                protein: 20.0,
                carbs: 30.0,
                fat: 10.0,
                alcohol: 0.0,
                protein_percent: 23.0,
                carbs_percent: 34.0,
                fat_percent: 26.0,
                alcohol_percent: 0.0,
            },
        }
    }

    #[tokio::test]
    async fn create_assigns_unique_id_and_fresh_timestamp() {
        let store = MemoryStore::new(UtcOffset::UTC);
        let before = OffsetDateTime::now_utc();

        let mut ids = HashSet::new();
        for i in 0..20 {
            let e = store
                .create_entry(new_entry("u1", &format!("food {i}")))
                .await
                .unwrap();
            assert!(!e.id.is_nil());
            assert!(e.created_at >= before);
            assert_eq!(e.user_id, "u1");
            assert!(ids.insert(e.id));
        }
    }

    #[tokio::test]
    async fn list_is_newest_first_and_scoped_to_user() {
        let store = MemoryStore::new(UtcOffset::UTC);
        store
            .insert_at(new_entry("u1", "eggs"), datetime!(2024-06-15 08:00 UTC))
            .await;
        store
            .insert_at(new_entry("u2", "soup"), datetime!(2024-06-15 12:00 UTC))
            .await;
        store
            .insert_at(new_entry("u1", "steak"), datetime!(2024-06-15 19:00 UTC))
            .await;
        store
            .insert_at(new_entry("u1", "toast"), datetime!(2024-06-14 07:30 UTC))
            .await;

        let names: Vec<_> = store
            .list_entries_for_user("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["steak", "eggs", "toast"]);
    }

    #[tokio::test]
    async fn equal_timestamps_list_latest_insert_first() {
        let store = MemoryStore::new(UtcOffset::UTC);
        let at = datetime!(2024-06-15 12:00 UTC);
        store.insert_at(new_entry("u1", "first"), at).await;
        store.insert_at(new_entry("u1", "second"), at).await;

        let names: Vec<_> = store
            .list_entries_for_user("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["second", "first"]);
    }

    #[tokio::test]
    async fn date_filter_is_half_open() {
        let store = MemoryStore::new(UtcOffset::UTC);
        store
            .insert_at(new_entry("u1", "late snack"), datetime!(2024-06-15 23:59:59 UTC))
            .await;
        store
            .insert_at(new_entry("u1", "midnight"), datetime!(2024-06-16 00:00 UTC))
            .await;
        store
            .insert_at(new_entry("u1", "breakfast"), datetime!(2024-06-15 00:00 UTC))
            .await;
        store
            .insert_at(new_entry("u1", "day before"), datetime!(2024-06-14 23:59:59 UTC))
            .await;
        store
            .insert_at(new_entry("u2", "not mine"), datetime!(2024-06-15 10:00 UTC))
            .await;

        let names: Vec<_> = store
            .list_entries_for_user_on_date("u1", date!(2024 - 06 - 15))
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["late snack", "breakfast"]);
    }

    #[tokio::test]
    async fn date_filter_uses_configured_offset() {
        let store = MemoryStore::new(offset!(+2));
        // 23:30 local on the 15th
        store
            .insert_at(new_entry("u1", "dinner"), datetime!(2024-06-15 21:30 UTC))
            .await;
        // 00:30 local on the 16th
        store
            .insert_at(new_entry("u1", "night"), datetime!(2024-06-15 22:30 UTC))
            .await;

        let on_15th = store
            .list_entries_for_user_on_date("u1", date!(2024 - 06 - 15))
            .await
            .unwrap();
        assert_eq!(on_15th.len(), 1);
        assert_eq!(on_15th[0].name, "dinner");

        let on_16th = store
            .list_entries_for_user_on_date("u1", date!(2024 - 06 - 16))
            .await
            .unwrap();
        assert_eq!(on_16th.len(), 1);
        assert_eq!(on_16th[0].name, "night");
    }

    #[tokio::test]
    async fn unknown_user_gets_empty_lists() {
        let store = MemoryStore::new(UtcOffset::UTC);
        store.create_entry(new_entry("u1", "eggs")).await.unwrap();

        assert!(store.list_entries_for_user("nobody").await.unwrap().is_empty());
        assert!(store
            .list_entries_for_user_on_date("nobody", date!(2024 - 06 - 15))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn repeated_listing_is_identical() {
        let store = MemoryStore::new(UtcOffset::UTC);
        for name in ["a", "b", "c"] {
            store.create_entry(new_entry("u1", name)).await.unwrap();
        }
        let first = store.list_entries_for_user("u1").await.unwrap();
        let second = store.list_entries_for_user("u1").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[tokio::test]
    async fn users_are_unique_by_username() {
        let store = MemoryStore::new(UtcOffset::UTC);
        let user = store
            .create_user(NewUser {
                username: "demo".into(),
                password_hash: "$argon2id$stub".into(),
                daily_calorie_goal: 2000,
            })
            .await
            .unwrap();

        assert_eq!(store.get_user(&user.id).await.unwrap(), Some(user.clone()));
        assert_eq!(
            store.get_user_by_username("demo").await.unwrap().map(|u| u.id),
            Some(user.id)
        );
        assert!(store.get_user("missing").await.unwrap().is_none());

        let dup = store
            .create_user(NewUser {
                username: "demo".into(),
                password_hash: "x".into(),
                daily_calorie_goal: 1500,
            })
            .await;
        assert!(matches!(dup, Err(AppError::Validation(_))));
    }
}
