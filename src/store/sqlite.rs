use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Row, SqlitePool,
};
use time::OffsetDateTime;

use super::{BankStore, NewUser, SessionToken, User};

/// Local SQLite store.
///
/// The pool is capped at a single connection: SQLite serializes statements
/// anyway, and a lazily-opened `:memory:` database would otherwise give
/// every pool connection its own empty database.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(url: &str) -> sqlx::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }
}

/// SQLite has no decimal type; balances live in a TEXT column and are
/// parsed on the way out.
fn user_from_row(row: &SqliteRow) -> sqlx::Result<User> {
    let balance: String = row.try_get("balance")?;
    let balance = Decimal::from_str(&balance).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    Ok(User {
        uid: row.try_get("uid")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        phone: row.try_get("phone")?,
        role: row.try_get("role")?,
        balance,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl BankStore for SqliteStore {
    async fn init_schema(&self) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS koduser (
                uid INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                phone TEXT,
                role TEXT NOT NULL DEFAULT 'customer',
                balance TEXT NOT NULL DEFAULT '100000.00',
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS usertoken (
                tid INTEGER PRIMARY KEY AUTOINCREMENT,
                token TEXT NOT NULL,
                uid INTEGER NOT NULL REFERENCES koduser(uid) ON DELETE CASCADE,
                expiry TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_usertoken_uid ON usertoken(uid)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_usertoken_expiry ON usertoken(expiry)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_user_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> sqlx::Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT uid, username, email, password_hash, phone, role, balance, created_at
            FROM koduser
            WHERE username = ? OR email = ?
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_user_by_username(&self, username: &str) -> sqlx::Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT uid, username, email, password_hash, phone, role, balance, created_at
            FROM koduser
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn create_user(&self, user: &NewUser) -> sqlx::Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO koduser (username, email, password_hash, phone, role, balance, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.phone)
        .bind(&user.role)
        .bind(user.balance.to_string())
        .bind(OffsetDateTime::now_utc())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn balance_of(&self, username: &str) -> sqlx::Result<Option<Decimal>> {
        let balance: Option<String> =
            sqlx::query_scalar("SELECT balance FROM koduser WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        balance
            .map(|b| Decimal::from_str(&b).map_err(|e| sqlx::Error::Decode(Box::new(e))))
            .transpose()
    }

    async fn insert_token(
        &self,
        token: &str,
        uid: i64,
        expiry: OffsetDateTime,
    ) -> sqlx::Result<()> {
        sqlx::query("INSERT INTO usertoken (token, uid, expiry) VALUES (?, ?, ?)")
            .bind(token)
            .bind(uid)
            .bind(expiry)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_token(&self, token: &str, uid: i64) -> sqlx::Result<Option<SessionToken>> {
        sqlx::query_as::<_, SessionToken>(
            "SELECT tid, token, uid, expiry FROM usertoken WHERE token = ? AND uid = ?",
        )
        .bind(token)
        .bind(uid)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_token(&self, token: &str) -> sqlx::Result<u64> {
        let result = sqlx::query("DELETE FROM usertoken WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::STARTING_BALANCE;
    use time::Duration;

    async fn memory_store() -> SqliteStore {
        let store = SqliteStore::connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        store.init_schema().await.expect("schema");
        store
    }

    fn alice() -> NewUser {
        NewUser::customer("alice1", "a@x.com", "$argon2id$fake-hash", None)
    }

    #[tokio::test]
    async fn create_and_find_user() {
        let store = memory_store().await;
        let uid = store.create_user(&alice()).await.expect("insert");
        assert!(uid > 0);

        let user = store
            .find_user_by_username("alice1")
            .await
            .expect("query")
            .expect("row");
        assert_eq!(user.uid, uid);
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.role, "customer");
        assert_eq!(user.balance, STARTING_BALANCE);
        assert!(user.phone.is_none());
    }

    #[tokio::test]
    async fn find_by_username_or_email_matches_either_column() {
        let store = memory_store().await;
        store.create_user(&alice()).await.expect("insert");

        let by_name = store
            .find_user_by_username_or_email("alice1", "other@x.com")
            .await
            .expect("query");
        assert!(by_name.is_some());

        let by_email = store
            .find_user_by_username_or_email("someoneelse", "a@x.com")
            .await
            .expect("query");
        assert!(by_email.is_some());

        let neither = store
            .find_user_by_username_or_email("bob2", "b@x.com")
            .await
            .expect("query");
        assert!(neither.is_none());
    }

    #[tokio::test]
    async fn duplicate_username_rejected_by_unique_constraint() {
        let store = memory_store().await;
        store.create_user(&alice()).await.expect("first insert");

        let mut dup = alice();
        dup.email = "different@x.com".into();
        let err = store.create_user(&dup).await.unwrap_err();
        assert!(err.as_database_error().is_some());
    }

    #[tokio::test]
    async fn duplicate_email_rejected_by_unique_constraint() {
        let store = memory_store().await;
        store.create_user(&alice()).await.expect("first insert");

        let mut dup = alice();
        dup.username = "alice2".into();
        assert!(store.create_user(&dup).await.is_err());
    }

    #[tokio::test]
    async fn balance_of_returns_stored_value() {
        let store = memory_store().await;
        store.create_user(&alice()).await.expect("insert");

        let balance = store.balance_of("alice1").await.expect("query");
        assert_eq!(balance, Some(STARTING_BALANCE));

        let missing = store.balance_of("nobody").await.expect("query");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn token_lifecycle_roundtrip() {
        let store = memory_store().await;
        let uid = store.create_user(&alice()).await.expect("insert");
        let expiry = OffsetDateTime::now_utc() + Duration::hours(24);

        store
            .insert_token("tok-abc", uid, expiry)
            .await
            .expect("insert token");

        let row = store
            .find_token("tok-abc", uid)
            .await
            .expect("query")
            .expect("row");
        assert_eq!(row.uid, uid);
        assert!(row.expiry > OffsetDateTime::now_utc());

        // Wrong uid must not match even with the right token string.
        assert!(store
            .find_token("tok-abc", uid + 1)
            .await
            .expect("query")
            .is_none());

        assert_eq!(store.delete_token("tok-abc").await.expect("delete"), 1);
        assert!(store
            .find_token("tok-abc", uid)
            .await
            .expect("query")
            .is_none());

        // Idempotent delete.
        assert_eq!(store.delete_token("tok-abc").await.expect("delete"), 0);
    }

    #[tokio::test]
    async fn multiple_sessions_per_user_allowed() {
        let store = memory_store().await;
        let uid = store.create_user(&alice()).await.expect("insert");
        let expiry = OffsetDateTime::now_utc() + Duration::hours(24);

        store.insert_token("tok-1", uid, expiry).await.expect("t1");
        store.insert_token("tok-2", uid, expiry).await.expect("t2");

        assert!(store.find_token("tok-1", uid).await.unwrap().is_some());
        assert!(store.find_token("tok-2", uid).await.unwrap().is_some());
    }
}
