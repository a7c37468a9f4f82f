use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use crate::access::Role;
use crate::auth::repo_types::User;

const USER_COLUMNS: &str = "id, email, name, role, principal_id, password_hash, created_at";

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    /// Every account, oldest first. The role gate narrows this down per caller.
    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))
        .fetch_all(db)
        .await
        .context("list users")?;
        Ok(users)
    }

    /// Create a new self-registered user with a hashed password.
    pub async fn create(
        db: &PgPool,
        email: &str,
        name: Option<&str>,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, name, role, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(name)
        .bind(Role::Client.as_str())
        .bind(password_hash)
        .fetch_one(db)
        .await
        .context("insert user")?;
        Ok(user)
    }
}
