//! Role document store.
//!
//! Sole writer of `user_roles` documents, keyed by account id.

use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::UserRole;

#[derive(Clone)]
pub struct RoleStore {
    pool: SqlitePool,
}

impl RoleStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Point lookup of an account's role document.
    pub async fn get_role(&self, account_id: &str) -> Result<Option<UserRole>, AppError> {
        let row = sqlx::query("SELECT is_admin FROM user_roles WHERE account_id = ?")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| {
            let is_admin: i64 = row.get("is_admin");
            UserRole {
                is_admin: is_admin != 0,
            }
        }))
    }

    /// Fetch the role document, writing the non-admin default on first sight.
    ///
    /// The insert ignores conflicts, so two racing first logins both land on
    /// the same persisted default.
    pub async fn fetch_or_create(&self, account_id: &str) -> Result<UserRole, AppError> {
        if let Some(role) = self.get_role(account_id).await? {
            return Ok(role);
        }

        sqlx::query("INSERT OR IGNORE INTO user_roles (account_id, is_admin) VALUES (?, 0)")
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(self.get_role(account_id).await?.unwrap_or_default())
    }

    /// Upsert the admin flag for an account.
    pub async fn set_admin(&self, account_id: &str, is_admin: bool) -> Result<(), AppError> {
        sqlx::query(
            r#"INSERT INTO user_roles (account_id, is_admin) VALUES (?, ?)
               ON CONFLICT(account_id) DO UPDATE SET is_admin = excluded.is_admin"#,
        )
        .bind(account_id)
        .bind(is_admin as i64)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
