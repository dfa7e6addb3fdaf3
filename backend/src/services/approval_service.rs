//! Approval workflow service.
//!
//! State machine over `ApprovalRequest`: `PENDING -> APPROVED` or
//! `PENDING -> REJECTED`, resolved only by a group owner. Preconditions are
//! validated eagerly; a failed call leaves every entity unchanged.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::approval::{ApprovalRequest, ApprovalStatus};
use crate::models::resource::{Operation, OwnerKind};
use crate::models::role::RoleKind;
use crate::services::access_service::{AccessService, Decision};
use crate::store::EntitlementStore;

/// Approval workflow service
#[derive(Clone)]
pub struct ApprovalService {
    store: Arc<dyn EntitlementStore>,
    access: AccessService,
}

impl ApprovalService {
    pub fn new(store: Arc<dyn EntitlementStore>, access: AccessService) -> Self {
        Self { store, access }
    }

    /// Open a `PENDING` request for an operation the engine gates for the
    /// requester. Fails `ApprovalNotNeeded` when the engine already decided
    /// the triple either way.
    pub async fn create_approval(
        &self,
        resource_id: Uuid,
        operation: Operation,
        requester_id: Uuid,
    ) -> Result<ApprovalRequest> {
        let resource = self
            .store
            .find_resource_by_id(resource_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("resource {resource_id}")))?;
        let requester = self
            .store
            .find_user_by_id(requester_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {requester_id}")))?;

        match self
            .access
            .authorize(requester_id, resource_id, operation)
            .await?
        {
            Decision::NeedsApproval => {}
            Decision::Allowed | Decision::Denied(_) => {
                return Err(AppError::ApprovalNotNeeded(operation));
            }
        }

        let approval = ApprovalRequest::new(resource.id, operation, requester.id);
        self.store.insert_approval(&approval).await?;
        tracing::info!(
            approval_id = %approval.id,
            resource_id = %resource.id,
            operation = %operation,
            requested_by = %requester.id,
            "approval requested"
        );
        Ok(approval)
    }

    /// Resolve a `PENDING` request to a terminal status. Only an `OWNER` of
    /// the owning group may resolve, regardless of who requested.
    ///
    /// The final write is a compare-and-set at the store boundary: of two
    /// concurrent resolutions exactly one wins and the other fails
    /// `AlreadyProcessed`.
    pub async fn resolve(
        &self,
        approval_id: Uuid,
        approver_id: Uuid,
        outcome: ApprovalStatus,
    ) -> Result<ApprovalRequest> {
        if !outcome.is_terminal() {
            return Err(AppError::Validation(
                "resolution outcome must be approved or rejected".to_string(),
            ));
        }

        let approval = self
            .store
            .find_approval_by_id(approval_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("approval {approval_id}")))?;
        if approval.status != ApprovalStatus::Pending {
            return Err(AppError::AlreadyProcessed(approval_id));
        }

        let approver = self
            .store
            .find_user_by_id(approver_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {approver_id}")))?;
        let resource = self
            .store
            .find_resource_by_id(approval.resource_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("resource {}", approval.resource_id)))?;

        // Creation preconditions only ever gate group-owned resources.
        if resource.owner_kind != OwnerKind::Group {
            return Err(AppError::ApprovalNotNeeded(approval.operation));
        }

        let membership = self
            .store
            .find_membership(approver.id, resource.owner_id)
            .await?
            .ok_or(AppError::ApproverNotInGroup(approver_id))?;
        let role = self
            .store
            .find_role_by_id(membership.role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role {}", membership.role_id)))?;
        if role.name != RoleKind::Owner {
            return Err(AppError::InsufficientRole(format!(
                "role {} may not resolve approvals",
                role.name
            )));
        }

        let resolved = self
            .store
            .transition_approval(approval_id, approver_id, outcome, Utc::now())
            .await?
            // A concurrent resolution won between our status read and the write.
            .ok_or(AppError::AlreadyProcessed(approval_id))?;

        tracing::info!(
            approval_id = %approval_id,
            approver_id = %approver_id,
            status = %resolved.status,
            "approval resolved"
        );
        Ok(resolved)
    }

    /// Requests for the resource still awaiting resolution.
    pub async fn list_pending(&self, resource_id: Uuid) -> Result<Vec<ApprovalRequest>> {
        let approvals = self.store.find_approvals_by_resource(resource_id).await?;
        Ok(approvals
            .into_iter()
            .filter(|a| a.status == ApprovalStatus::Pending)
            .collect())
    }

    /// Every request opened by the user, in any status.
    pub async fn list_requested_by(&self, user_id: Uuid) -> Result<Vec<ApprovalRequest>> {
        self.store.find_approvals_by_requester(user_id).await
    }

    /// Whether the engine gates this (resource, operation, user) triple.
    pub async fn needs_approval(
        &self,
        resource_id: Uuid,
        operation: Operation,
        user_id: Uuid,
    ) -> Result<bool> {
        let decision = self
            .access
            .authorize(user_id, resource_id, operation)
            .await?;
        Ok(decision == Decision::NeedsApproval)
    }
}
