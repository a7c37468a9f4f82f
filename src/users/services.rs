use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::{
    access::{Session, Subject},
    auth::repo_types::User,
    error::{AppError, AppResult},
};

/// Whose data a request acts on, before any lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Caller(Uuid),
    Other(Uuid),
}

/// No id, or the caller's own id, means the caller.
pub fn classify(session: &Session, requested: Option<Uuid>) -> Target {
    match requested {
        Some(id) if id != session.user_id => Target::Other(id),
        _ => Target::Caller(session.user_id),
    }
}

/// Gate decision for another user, given what the lookup found.
pub fn admit(session: &Session, target: Uuid, found: Option<Subject>) -> AppResult<Uuid> {
    let subject = found.ok_or(AppError::NotFound("user"))?;
    if !session.may_view(&subject) {
        warn!(viewer = %session.user_id, %target, "role gate denied access");
        return Err(AppError::Forbidden);
    }
    Ok(target)
}

/// Picks the user a request acts on. Anyone other than the caller must pass
/// the role gate.
pub async fn resolve_target(db: &PgPool, session: &Session, requested: Option<Uuid>) -> AppResult<Uuid> {
    match classify(session, requested) {
        Target::Caller(id) => Ok(id),
        Target::Other(id) => {
            let found = User::find_by_id(db, id).await?.map(|u| u.subject());
            admit(session, id, found)
        }
    }
}
