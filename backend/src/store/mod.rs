//! Store contracts and adapters.
//!
//! The services consume durable state through these traits only; storage
//! internals stay behind the boundary. Lookups return `Ok(None)` or an empty
//! vector for absence, never an error.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::approval::{ApprovalRequest, ApprovalStatus};
use crate::models::group::{GroupMembership, UserGroup};
use crate::models::pipeline::Pipeline;
use crate::models::resource::{OwnerKind, Resource};
use crate::models::role::{Role, RoleKind};
use crate::models::user::User;

/// Query and mutation contracts for the entitlement core.
#[async_trait]
pub trait EntitlementStore: Send + Sync {
    // --- users ---

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn list_users(&self) -> Result<Vec<User>>;
    async fn insert_user(&self, user: &User) -> Result<()>;
    async fn update_user(&self, user: &User) -> Result<()>;
    /// Returns false when no row existed.
    async fn delete_user(&self, id: Uuid) -> Result<bool>;

    // --- groups ---

    async fn find_group_by_id(&self, id: Uuid) -> Result<Option<UserGroup>>;
    async fn find_group_by_name(&self, name: &str) -> Result<Option<UserGroup>>;
    async fn insert_group(&self, group: &UserGroup) -> Result<()>;

    // --- roles ---

    async fn find_role_by_id(&self, id: Uuid) -> Result<Option<Role>>;
    async fn find_role_by_name(&self, name: RoleKind) -> Result<Option<Role>>;
    async fn list_roles(&self) -> Result<Vec<Role>>;

    // --- memberships ---

    async fn find_membership(&self, user_id: Uuid, group_id: Uuid)
        -> Result<Option<GroupMembership>>;
    async fn find_memberships_by_user(&self, user_id: Uuid) -> Result<Vec<GroupMembership>>;
    async fn find_memberships_by_group(&self, group_id: Uuid) -> Result<Vec<GroupMembership>>;
    async fn insert_membership(&self, membership: &GroupMembership) -> Result<()>;
    async fn update_membership(&self, membership: &GroupMembership) -> Result<()>;
    /// Returns false when no row existed.
    async fn delete_membership(&self, user_id: Uuid, group_id: Uuid) -> Result<bool>;

    // --- resources ---

    async fn find_resource_by_id(&self, id: Uuid) -> Result<Option<Resource>>;
    async fn find_resources_by_owner(
        &self,
        owner_kind: OwnerKind,
        owner_id: Uuid,
    ) -> Result<Vec<Resource>>;
    async fn find_resources_by_kind(&self, kind: &str) -> Result<Vec<Resource>>;
    async fn insert_resource(&self, resource: &Resource) -> Result<()>;
    /// Returns false when no row existed.
    async fn delete_resource(&self, id: Uuid) -> Result<bool>;

    // --- approvals ---

    async fn find_approval_by_id(&self, id: Uuid) -> Result<Option<ApprovalRequest>>;
    async fn find_approvals_by_resource(&self, resource_id: Uuid)
        -> Result<Vec<ApprovalRequest>>;
    async fn find_approvals_by_requester(&self, user_id: Uuid) -> Result<Vec<ApprovalRequest>>;
    async fn insert_approval(&self, approval: &ApprovalRequest) -> Result<()>;

    /// Atomically transition a `PENDING` approval to a terminal status,
    /// recording the approver and resolution time.
    ///
    /// Returns the updated row, or `None` when the approval is missing or no
    /// longer `PENDING`. Implementations must make the check-and-write a
    /// single atomic step so that of two concurrent transitions exactly one
    /// observes `PENDING`.
    async fn transition_approval(
        &self,
        id: Uuid,
        approver_id: Uuid,
        status: ApprovalStatus,
        resolved_at: DateTime<Utc>,
    ) -> Result<Option<ApprovalRequest>>;
}

/// Store contract for the pipeline adapter. Kept separate so the core
/// entitlement contract stays free of domain objects.
#[async_trait]
pub trait PipelineStore: Send + Sync {
    async fn find_pipeline_by_id(&self, id: Uuid) -> Result<Option<Pipeline>>;
    async fn pipeline_name_exists(&self, name: &str, owner_id: Uuid) -> Result<bool>;
    async fn insert_pipeline(&self, pipeline: &Pipeline) -> Result<()>;
    async fn update_pipeline(&self, pipeline: &Pipeline) -> Result<()>;
    /// Returns false when no row existed.
    async fn delete_pipeline(&self, id: Uuid) -> Result<bool>;
}
