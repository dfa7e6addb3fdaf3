//! Operation approval model.
//!
//! An `ApprovalRequest` is a pending authorization exception for an operation
//! a developer cannot perform unilaterally on a group-owned resource. Status
//! moves `PENDING -> APPROVED` or `PENDING -> REJECTED` and never leaves a
//! terminal state.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::resource::Operation;

/// Approval request status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "approval_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(self) -> bool {
        !matches!(self, ApprovalStatus::Pending)
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        })
    }
}

impl FromStr for ApprovalStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "rejected" => Ok(ApprovalStatus::Rejected),
            _ => Err(AppError::Validation(format!("unknown approval status: {s}"))),
        }
    }
}

/// Approval request entity
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ApprovalRequest {
    pub id: Uuid,
    pub resource_id: Uuid,
    pub operation: Operation,
    pub requested_by: Uuid,
    /// Set on resolution only.
    pub approved_by: Option<Uuid>,
    pub status: ApprovalStatus,
    pub requested_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ApprovalRequest {
    /// New `PENDING` request stamped with the current time.
    pub fn new(resource_id: Uuid, operation: Operation, requested_by: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            resource_id,
            operation,
            requested_by,
            approved_by: None,
            status: ApprovalStatus::Pending,
            requested_at: Utc::now(),
            resolved_at: None,
        }
    }
}
