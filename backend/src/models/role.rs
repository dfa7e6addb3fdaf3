//! Role catalog model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppError;

/// Canonical role names within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "role_kind", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum RoleKind {
    Owner,
    Developer,
    Viewer,
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RoleKind::Owner => "OWNER",
            RoleKind::Developer => "DEVELOPER",
            RoleKind::Viewer => "VIEWER",
        })
    }
}

impl FromStr for RoleKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "OWNER" => Ok(RoleKind::Owner),
            "DEVELOPER" => Ok(RoleKind::Developer),
            "VIEWER" => Ok(RoleKind::Viewer),
            _ => Err(AppError::Validation(format!("unknown role: {s}"))),
        }
    }
}

/// Role entity. Immutable catalog row; the store seeds the canonical set.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Role {
    pub id: Uuid,
    pub name: RoleKind,
    pub created_at: DateTime<Utc>,
}

impl Role {
    pub fn new(name: RoleKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_role_names_case_insensitively() {
        assert_eq!("OWNER".parse::<RoleKind>().unwrap(), RoleKind::Owner);
        assert_eq!("developer".parse::<RoleKind>().unwrap(), RoleKind::Developer);
        assert_eq!("Viewer".parse::<RoleKind>().unwrap(), RoleKind::Viewer);
    }

    #[test]
    fn rejects_unknown_role_name() {
        let err = "ADMIN".parse::<RoleKind>().unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn display_matches_stored_form() {
        assert_eq!(RoleKind::Owner.to_string(), "OWNER");
        assert_eq!(RoleKind::Developer.to_string(), "DEVELOPER");
    }
}
