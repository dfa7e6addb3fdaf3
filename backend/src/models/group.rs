//! User group and membership models.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// User group entity
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserGroup {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserGroup {
    pub fn new(name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Membership row tying exactly one role to a (user, group) pair.
///
/// At most one row exists per pair; role reassignment mutates the row in
/// place rather than inserting a second one.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GroupMembership {
    pub id: Uuid,
    pub user_id: Uuid,
    pub group_id: Uuid,
    pub role_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GroupMembership {
    pub fn new(user_id: Uuid, group_id: Uuid, role_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            group_id,
            role_id,
            created_at: now,
            updated_at: now,
        }
    }
}
