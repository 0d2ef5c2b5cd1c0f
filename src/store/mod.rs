//! Persistence layer.
//!
//! All access to the user and token tables goes through the [`BankStore`]
//! trait so the backend is picked once at startup instead of being decided
//! by scattered conditionals. Two implementations exist: [`SqliteStore`]
//! for a local file (or in-memory) database and [`PgStore`] for Postgres.

use async_trait::async_trait;
use rust_decimal::Decimal;
use time::OffsetDateTime;

mod postgres;
mod sqlite;
mod types;

pub use postgres::PgStore;
pub use sqlite::SqliteStore;
pub use types::{NewUser, SessionToken, User, DEFAULT_ROLE, STARTING_BALANCE};

#[async_trait]
pub trait BankStore: Send + Sync {
    /// Create the schema if it does not exist yet.
    async fn init_schema(&self) -> sqlx::Result<()>;

    /// Existence probe used for the friendly duplicate-registration error.
    /// The UNIQUE constraints are the actual enforcement.
    async fn find_user_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> sqlx::Result<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> sqlx::Result<Option<User>>;

    /// Insert a user and return its assigned id.
    async fn create_user(&self, user: &NewUser) -> sqlx::Result<i64>;

    async fn balance_of(&self, username: &str) -> sqlx::Result<Option<Decimal>>;

    async fn insert_token(
        &self,
        token: &str,
        uid: i64,
        expiry: OffsetDateTime,
    ) -> sqlx::Result<()>;

    /// Look up the exact token string for the given user.
    async fn find_token(&self, token: &str, uid: i64) -> sqlx::Result<Option<SessionToken>>;

    /// Delete a token row; returns the number of rows removed (0 or more,
    /// so logout stays idempotent).
    async fn delete_token(&self, token: &str) -> sqlx::Result<u64>;

    /// Close the underlying pool. Called once at shutdown.
    async fn close(&self);
}
