use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// Every new account starts with the same demo balance.
pub const STARTING_BALANCE: Decimal = Decimal::from_parts(10_000_000, 0, 0, false, 2);

pub const DEFAULT_ROLE: &str = "customer";

/// User record in the `koduser` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub uid: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone: Option<String>,
    pub role: String,
    pub balance: Decimal,
    pub created_at: OffsetDateTime,
}

/// Fields needed to insert a user; `uid` and `created_at` are assigned by
/// the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub role: String,
    pub balance: Decimal,
}

impl NewUser {
    pub fn customer(username: &str, email: &str, password_hash: &str, phone: Option<String>) -> Self {
        Self {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            phone,
            role: DEFAULT_ROLE.to_string(),
            balance: STARTING_BALANCE,
        }
    }
}

/// Issued-session record in the `usertoken` table.
///
/// A row is live while `now < expiry` and the row still exists; deleting it
/// revokes the session no matter what the signed token claims.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionToken {
    pub tid: i64,
    pub token: String,
    pub uid: i64,
    pub expiry: OffsetDateTime,
}
