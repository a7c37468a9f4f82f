//! Role gate: which users a session may view or manage.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Account role. Stored as the Portuguese role names used by the product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "cliente")]
    Client,
    #[serde(rename = "socio")]
    Partner,
    #[serde(rename = "gestor")]
    Manager,
    #[serde(rename = "dependente")]
    Dependent,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Client => "cliente",
            Role::Partner => "socio",
            Role::Manager => "gestor",
            Role::Dependent => "dependente",
        }
    }

    /// Unknown strings map to `None`, which the gate treats as self-only.
    pub fn parse(raw: &str) -> Option<Role> {
        match raw.trim() {
            "cliente" => Some(Role::Client),
            "socio" => Some(Role::Partner),
            "gestor" => Some(Role::Manager),
            "dependente" => Some(Role::Dependent),
            _ => None,
        }
    }
}

/// Identity of the caller, built once per request and passed down explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub role: Option<Role>,
}

/// Minimal view of a user the gate needs to decide visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject {
    pub id: Uuid,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Everyone,
    /// Self plus every user holding one of these roles.
    SelfAnd(&'static [Role]),
    SelfOnly,
}

impl Visibility {
    fn covers(self, viewer: Uuid, target: &Subject) -> bool {
        if target.id == viewer {
            return true;
        }
        match self {
            Visibility::Everyone => true,
            Visibility::SelfAnd(roles) => target.role.is_some_and(|r| roles.contains(&r)),
            Visibility::SelfOnly => false,
        }
    }
}

pub fn visibility(role: Option<Role>) -> Visibility {
    match role {
        Some(Role::Manager) => Visibility::Everyone,
        Some(Role::Partner) => Visibility::SelfAnd(&[Role::Client, Role::Dependent]),
        Some(Role::Client) | Some(Role::Dependent) | None => Visibility::SelfOnly,
    }
}

impl Session {
    pub fn may_view(&self, target: &Subject) -> bool {
        visibility(self.role).covers(self.user_id, target)
    }

    /// Filters `candidates` down to the users this session may select.
    pub fn visible_users<'a, T>(&self, candidates: &'a [T], subject: impl Fn(&T) -> Subject) -> Vec<&'a T> {
        let vis = visibility(self.role);
        candidates
            .iter()
            .filter(|c| vis.covers(self.user_id, &subject(*c)))
            .collect()
    }

    pub fn ensure_may_view(&self, target: &Subject) -> Result<(), AppError> {
        if self.may_view(target) {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(role: Option<Role>) -> Subject {
        Subject {
            id: Uuid::new_v4(),
            role,
        }
    }

    fn population(me: Uuid, my_role: Option<Role>) -> Vec<Subject> {
        vec![
            Subject { id: me, role: my_role },
            subject(Some(Role::Client)),
            subject(Some(Role::Dependent)),
            subject(Some(Role::Partner)),
            subject(Some(Role::Manager)),
            subject(None),
        ]
    }

    #[test]
    fn client_sees_only_self() {
        let me = Uuid::new_v4();
        let session = Session { user_id: me, role: Some(Role::Client) };
        let all = population(me, session.role);
        let visible = session.visible_users(&all, |s| *s);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, me);
    }

    #[test]
    fn dependent_sees_only_self() {
        let me = Uuid::new_v4();
        let session = Session { user_id: me, role: Some(Role::Dependent) };
        let all = population(me, session.role);
        assert_eq!(session.visible_users(&all, |s| *s).len(), 1);
    }

    #[test]
    fn partner_sees_self_clients_and_dependents() {
        let me = Uuid::new_v4();
        let session = Session { user_id: me, role: Some(Role::Partner) };
        let all = population(me, session.role);
        let visible = session.visible_users(&all, |s| *s);
        assert_eq!(visible.len(), 3);
        assert!(visible.iter().any(|s| s.id == me));
        assert!(visible
            .iter()
            .filter(|s| s.id != me)
            .all(|s| matches!(s.role, Some(Role::Client) | Some(Role::Dependent))));
    }

    #[test]
    fn manager_sees_everyone() {
        let me = Uuid::new_v4();
        let session = Session { user_id: me, role: Some(Role::Manager) };
        let all = population(me, session.role);
        assert_eq!(session.visible_users(&all, |s| *s).len(), all.len());
    }

    #[test]
    fn unknown_role_fails_closed() {
        let me = Uuid::new_v4();
        let session = Session { user_id: me, role: None };
        let all = population(me, None);
        let visible = session.visible_users(&all, |s| *s);
        assert_eq!(visible.len(), 1);
        assert!(session.ensure_may_view(&subject(Some(Role::Client))).is_err());
        assert_eq!(Role::parse("admin"), None);
    }

    #[test]
    fn role_names_round_trip_through_serde() {
        let json = serde_json::to_string(&Role::Partner).unwrap();
        assert_eq!(json, "\"socio\"");
        for role in [Role::Client, Role::Partner, Role::Manager, Role::Dependent] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }
}
