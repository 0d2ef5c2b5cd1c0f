use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, PgPool};
use time::OffsetDateTime;

use super::{BankStore, NewUser, SessionToken, User};

/// Networked Postgres store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str) -> sqlx::Result<Self> {
        let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl BankStore for PgStore {
    async fn init_schema(&self) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS koduser (
                uid BIGSERIAL PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                phone TEXT,
                role TEXT NOT NULL DEFAULT 'customer',
                balance NUMERIC(15, 2) NOT NULL DEFAULT 100000.00,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS usertoken (
                tid BIGSERIAL PRIMARY KEY,
                token TEXT NOT NULL,
                uid BIGINT NOT NULL REFERENCES koduser(uid) ON DELETE CASCADE,
                expiry TIMESTAMPTZ NOT NULL
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
        sqlx::query_as::<_, User>(
            r#"
            SELECT uid, username, email, password_hash, phone, role, balance, created_at
            FROM koduser
            WHERE username = $1 OR email = $2
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_user_by_username(&self, username: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT uid, username, email, password_hash, phone, role, balance, created_at
            FROM koduser
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_user(&self, user: &NewUser) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO koduser (username, email, password_hash, phone, role, balance, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING uid
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.phone)
        .bind(&user.role)
        .bind(user.balance)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(&self.pool)
        .await
    }

    async fn balance_of(&self, username: &str) -> sqlx::Result<Option<Decimal>> {
        sqlx::query_scalar::<_, Decimal>("SELECT balance FROM koduser WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
    }

    async fn insert_token(
        &self,
        token: &str,
        uid: i64,
        expiry: OffsetDateTime,
    ) -> sqlx::Result<()> {
        sqlx::query("INSERT INTO usertoken (token, uid, expiry) VALUES ($1, $2, $3)")
            .bind(token)
            .bind(uid)
            .bind(expiry)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_token(&self, token: &str, uid: i64) -> sqlx::Result<Option<SessionToken>> {
        sqlx::query_as::<_, SessionToken>(
            "SELECT tid, token, uid, expiry FROM usertoken WHERE token = $1 AND uid = $2",
        )
        .bind(token)
        .bind(uid)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_token(&self, token: &str) -> sqlx::Result<u64> {
        let result = sqlx::query("DELETE FROM usertoken WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
