use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::access::{Role, Subject};

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    /// Raw role column; parsed through [`Role::parse`].
    pub role: Option<String>,
    /// Managing account for dependents.
    pub principal_id: Option<Uuid>,
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn role(&self) -> Option<Role> {
        self.role.as_deref().and_then(Role::parse)
    }

    pub fn subject(&self) -> Subject {
        Subject {
            id: self.id,
            role: self.role(),
        }
    }
}
