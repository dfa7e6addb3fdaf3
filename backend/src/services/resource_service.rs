//! Resource ownership registry.
//!
//! Associates an opaque domain object (kind + external id) with exactly one
//! owner, either a user or a group. Ownership transfer is not exposed.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::resource::{OwnerKind, Resource};
use crate::models::role::RoleKind;
use crate::store::EntitlementStore;

/// Resource ownership registry
#[derive(Clone)]
pub struct ResourceService {
    store: Arc<dyn EntitlementStore>,
}

impl ResourceService {
    pub fn new(store: Arc<dyn EntitlementStore>) -> Self {
        Self { store }
    }

    /// Register a resource. With `Some(group_id)` the resource is group-owned
    /// and the caller must hold `OWNER` in that group; with `None` it is
    /// owned by the caller directly.
    pub async fn register(
        &self,
        caller_id: Uuid,
        kind: &str,
        external_id: Uuid,
        group_id: Option<Uuid>,
    ) -> Result<Resource> {
        let resource = match group_id {
            Some(group_id) => {
                let membership = self
                    .store
                    .find_membership(caller_id, group_id)
                    .await?
                    .ok_or(AppError::NotInGroup(caller_id, group_id))?;
                let role = self
                    .store
                    .find_role_by_id(membership.role_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("role {}", membership.role_id)))?;
                if role.name != RoleKind::Owner {
                    return Err(AppError::InsufficientRole(format!(
                        "role {} may not register group resources",
                        role.name
                    )));
                }
                Resource::new(kind, external_id, OwnerKind::Group, group_id)
            }
            None => Resource::new(kind, external_id, OwnerKind::User, caller_id),
        };

        self.store.insert_resource(&resource).await?;
        tracing::info!(
            resource_id = %resource.id,
            kind,
            owner_kind = %resource.owner_kind,
            owner_id = %resource.owner_id,
            "registered resource"
        );
        Ok(resource)
    }

    pub async fn lookup(&self, resource_id: Uuid) -> Result<Resource> {
        self.store
            .find_resource_by_id(resource_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("resource {resource_id}")))
    }

    pub async fn find_by_owner(
        &self,
        owner_kind: OwnerKind,
        owner_id: Uuid,
    ) -> Result<Vec<Resource>> {
        self.store.find_resources_by_owner(owner_kind, owner_id).await
    }

    pub async fn find_by_kind(&self, kind: &str) -> Result<Vec<Resource>> {
        self.store.find_resources_by_kind(kind).await
    }

    /// Remove an entitlement record. Maintenance path for adapters that have
    /// already authorized the deletion of the protected domain object.
    pub async fn deregister(&self, resource_id: Uuid) -> Result<()> {
        if !self.store.delete_resource(resource_id).await? {
            return Err(AppError::NotFound(format!("resource {resource_id}")));
        }
        tracing::info!(resource_id = %resource_id, "deregistered resource");
        Ok(())
    }
}
