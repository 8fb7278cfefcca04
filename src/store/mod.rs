use async_trait::async_trait;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::{
    error::AppError,
    foods::repo_types::{FoodLogEntry, NewFoodEntry},
    users::repo_types::{NewUser, User},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Append-only per-user food log.
///
/// Listings are ordered by `created_at` descending, newest insert first on ties.
#[async_trait]
pub trait FoodLogStore: Send + Sync {
    /// Assigns id and creation time, stores the entry and returns it.
    async fn create_entry(&self, entry: NewFoodEntry) -> Result<FoodLogEntry, AppError>;

    async fn list_entries_for_user(&self, user_id: &str) -> Result<Vec<FoodLogEntry>, AppError>;

    /// Entries whose `created_at` falls on `date` in the store's local offset.
    async fn list_entries_for_user_on_date(
        &self,
        user_id: &str,
        date: Date,
    ) -> Result<Vec<FoodLogEntry>, AppError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: &str) -> Result<Option<User>, AppError>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// Fails with `Validation` when the username is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;
}

/// Current time rounded up to whole microseconds, the precision of
/// TIMESTAMPTZ, so every backend returns the value it stored and the
/// result is never earlier than the call.
pub fn creation_timestamp() -> OffsetDateTime {
    round_up_to_micros(OffsetDateTime::now_utc())
}

fn round_up_to_micros(t: OffsetDateTime) -> OffsetDateTime {
    let sub_micro = t.nanosecond() % 1_000;
    if sub_micro == 0 {
        t
    } else {
        t + Duration::nanoseconds(i64::from(1_000 - sub_micro))
    }
}

/// Half-open `[start, end)` instants covering calendar day `date` at `offset`.
pub fn day_bounds(date: Date, offset: UtcOffset) -> (OffsetDateTime, OffsetDateTime) {
    let start = date.midnight().assume_offset(offset);
    let end = match date.next_day() {
        Some(next) => next.midnight().assume_offset(offset),
        None => PrimitiveDateTime::MAX.assume_offset(offset),
    };
    (start, end)
}
