//! Resource ownership model.
//!
//! A `Resource` is an entitlement record binding a domain object (identified
//! by a kind tag plus the domain object's id) to exactly one owner, either a
//! single user or a group.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppError;

/// Discriminator for who owns a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "owner_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    User,
    Group,
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OwnerKind::User => "user",
            OwnerKind::Group => "group",
        })
    }
}

impl FromStr for OwnerKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(OwnerKind::User),
            "group" => Ok(OwnerKind::Group),
            _ => Err(AppError::Validation(format!("unknown owner kind: {s}"))),
        }
    }
}

/// Operations subject to authorization.
///
/// External text is validated here, once; downstream code only ever sees the
/// closed enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "operation_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    View,
    Update,
    Delete,
    Publish,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::View => "view",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Publish => "publish",
        })
    }
}

impl FromStr for Operation {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "view" => Ok(Operation::View),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            "publish" => Ok(Operation::Publish),
            _ => Err(AppError::UnknownOperation(s.to_string())),
        }
    }
}

/// Resource entity
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Resource {
    pub id: Uuid,
    /// Opaque domain discriminator, e.g. "pipeline".
    pub kind: String,
    /// Id of the domain object this entitlement record protects.
    pub external_id: Uuid,
    pub owner_kind: OwnerKind,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    pub fn new(kind: &str, external_id: Uuid, owner_kind: OwnerKind, owner_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind: kind.to_string(),
            external_id,
            owner_kind,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }
}
