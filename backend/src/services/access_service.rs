//! Access decision engine.
//!
//! Maps (user, resource, operation) to a single closed `Decision`. Ownership
//! is checked before role: a privately-owned resource has no role concept,
//! so group roles never apply outside their group.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::resource::{Operation, OwnerKind, Resource};
use crate::models::role::RoleKind;
use crate::store::EntitlementStore;

/// Outcome of an authorization check.
///
/// `NeedsApproval` is distinct from `Denied` so callers can branch into the
/// approval workflow instead of failing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The caller may perform the operation.
    Allowed,
    /// The caller may perform the operation once a group owner approves it.
    NeedsApproval,
    /// The caller may not perform the operation.
    Denied(DenyReason),
}

/// Why an operation was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The resource belongs to another user.
    NotOwner,
    /// The caller is not a member of the owning group.
    NotInGroup,
    /// The caller's role does not permit the operation.
    InsufficientRole,
}

impl DenyReason {
    /// Convert a denial into its caller-visible error kind.
    pub fn into_error(self, user_id: Uuid, resource: &Resource, operation: Operation) -> AppError {
        match self {
            DenyReason::NotOwner => AppError::NotOwner(resource.id),
            DenyReason::NotInGroup => AppError::NotInGroup(user_id, resource.owner_id),
            DenyReason::InsufficientRole => AppError::InsufficientRole(format!(
                "operation {operation} is not allowed for the caller's role"
            )),
        }
    }
}

/// Access decision engine
#[derive(Clone)]
pub struct AccessService {
    store: Arc<dyn EntitlementStore>,
}

impl AccessService {
    pub fn new(store: Arc<dyn EntitlementStore>) -> Self {
        Self { store }
    }

    /// Decide whether `user_id` may perform `operation` on `resource_id`.
    ///
    /// Fails `NotFound` when the resource does not exist; every other outcome
    /// is a `Decision`.
    pub async fn authorize(
        &self,
        user_id: Uuid,
        resource_id: Uuid,
        operation: Operation,
    ) -> Result<Decision> {
        let resource = self
            .store
            .find_resource_by_id(resource_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("resource {resource_id}")))?;

        let decision = self.decide(&resource, user_id, operation).await?;
        tracing::debug!(
            user_id = %user_id,
            resource_id = %resource_id,
            operation = %operation,
            ?decision,
            "authorization decision"
        );
        Ok(decision)
    }

    /// Like [`authorize`](Self::authorize), but folds every non-`Allowed`
    /// outcome into the error taxonomy. For callers that must act
    /// immediately and cannot route through the approval workflow.
    pub async fn require_allowed(
        &self,
        user_id: Uuid,
        resource_id: Uuid,
        operation: Operation,
    ) -> Result<()> {
        let resource = self
            .store
            .find_resource_by_id(resource_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("resource {resource_id}")))?;

        match self.decide(&resource, user_id, operation).await? {
            Decision::Allowed => Ok(()),
            Decision::NeedsApproval => Err(AppError::InsufficientRole(format!(
                "operation {operation} requires owner approval"
            ))),
            Decision::Denied(reason) => Err(reason.into_error(user_id, &resource, operation)),
        }
    }

    pub(crate) async fn decide(
        &self,
        resource: &Resource,
        user_id: Uuid,
        operation: Operation,
    ) -> Result<Decision> {
        match resource.owner_kind {
            OwnerKind::User => Ok(if resource.owner_id == user_id {
                Decision::Allowed
            } else {
                Decision::Denied(DenyReason::NotOwner)
            }),
            OwnerKind::Group => {
                self.group_decision(user_id, resource.owner_id, operation)
                    .await
            }
        }
    }

    async fn group_decision(
        &self,
        user_id: Uuid,
        group_id: Uuid,
        operation: Operation,
    ) -> Result<Decision> {
        let Some(membership) = self.store.find_membership(user_id, group_id).await? else {
            return Ok(Decision::Denied(DenyReason::NotInGroup));
        };
        let role = self
            .store
            .find_role_by_id(membership.role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role {}", membership.role_id)))?;

        Ok(match role.name {
            RoleKind::Owner => Decision::Allowed,
            RoleKind::Developer => match operation {
                Operation::View | Operation::Update => Decision::Allowed,
                Operation::Delete | Operation::Publish => Decision::NeedsApproval,
            },
            RoleKind::Viewer => match operation {
                Operation::View => Decision::Allowed,
                _ => Decision::Denied(DenyReason::InsufficientRole),
            },
        })
    }
}
