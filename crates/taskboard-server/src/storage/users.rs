//! User credential queries

use super::password::{hash_password, verify_password};
use super::db::is_unique_violation;
use super::{Database, UserStore};
use crate::error::StoreError;
use async_trait::async_trait;
use taskboard_types::Credentials;
use tracing::debug;

#[async_trait]
impl UserStore for Database {
    async fn insert_user(&self, credentials: &Credentials) -> Result<i64, StoreError> {
        let hash = hash_password(&credentials.password)?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (login, hash)
            VALUES (?1, ?2)
            RETURNING id
            "#,
        )
        .bind(&credentials.login)
        .bind(&hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::LoginTaken(credentials.login.clone())
            } else {
                StoreError::Database(e)
            }
        })?;

        debug!(user_id = id, login = %credentials.login, "Inserted user");

        Ok(id)
    }

    async fn check_user(&self, credentials: &Credentials) -> Result<i64, StoreError> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT id, hash FROM users WHERE login = ?1")
                .bind(&credentials.login)
                .fetch_optional(&self.pool)
                .await?;

        let (id, hash) = row.ok_or_else(|| StoreError::UserNotFound(credentials.login.clone()))?;

        if !verify_password(&credentials.password, &hash)? {
            return Err(StoreError::IncorrectPassword);
        }

        Ok(id)
    }
}
