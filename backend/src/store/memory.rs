//! In-memory store adapter.
//!
//! Backs the test suite and embedded callers that do not want a database.
//! Each entity lives in its own `RwLock<HashMap>` registry; the approval
//! transition holds the write lock across the check-and-write so concurrent
//! resolutions serialize.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;
use crate::models::approval::{ApprovalRequest, ApprovalStatus};
use crate::models::group::{GroupMembership, UserGroup};
use crate::models::pipeline::Pipeline;
use crate::models::resource::{OwnerKind, Resource};
use crate::models::role::{Role, RoleKind};
use crate::models::user::User;

use super::{EntitlementStore, PipelineStore};

/// In-memory implementation of the store contracts.
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    groups: RwLock<HashMap<Uuid, UserGroup>>,
    roles: RwLock<HashMap<Uuid, Role>>,
    memberships: RwLock<HashMap<(Uuid, Uuid), GroupMembership>>,
    resources: RwLock<HashMap<Uuid, Resource>>,
    approvals: RwLock<HashMap<Uuid, ApprovalRequest>>,
    pipelines: RwLock<HashMap<Uuid, Pipeline>>,
}

impl MemoryStore {
    /// Create an empty store with the canonical role catalog seeded.
    pub fn new() -> Self {
        let mut roles = HashMap::new();
        for kind in [RoleKind::Owner, RoleKind::Developer, RoleKind::Viewer] {
            let role = Role::new(kind);
            roles.insert(role.id, role);
        }
        Self {
            users: RwLock::new(HashMap::new()),
            groups: RwLock::new(HashMap::new()),
            roles: RwLock::new(roles),
            memberships: RwLock::new(HashMap::new()),
            resources: RwLock::new(HashMap::new()),
            approvals: RwLock::new(HashMap::new()),
            pipelines: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn sorted_by_creation<T, F>(mut items: Vec<T>, created_at: F) -> Vec<T>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    items.sort_by_key(created_at);
    items
}

#[async_trait]
impl EntitlementStore for MemoryStore {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let users = self.users.read().await.values().cloned().collect();
        Ok(sorted_by_creation(users, |u: &User| u.created_at))
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        self.users.write().await.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        self.users.write().await.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool> {
        Ok(self.users.write().await.remove(&id).is_some())
    }

    async fn find_group_by_id(&self, id: Uuid) -> Result<Option<UserGroup>> {
        Ok(self.groups.read().await.get(&id).cloned())
    }

    async fn find_group_by_name(&self, name: &str) -> Result<Option<UserGroup>> {
        Ok(self
            .groups
            .read()
            .await
            .values()
            .find(|g| g.name == name)
            .cloned())
    }

    async fn insert_group(&self, group: &UserGroup) -> Result<()> {
        self.groups.write().await.insert(group.id, group.clone());
        Ok(())
    }

    async fn find_role_by_id(&self, id: Uuid) -> Result<Option<Role>> {
        Ok(self.roles.read().await.get(&id).cloned())
    }

    async fn find_role_by_name(&self, name: RoleKind) -> Result<Option<Role>> {
        Ok(self
            .roles
            .read()
            .await
            .values()
            .find(|r| r.name == name)
            .cloned())
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        let roles = self.roles.read().await.values().cloned().collect();
        Ok(sorted_by_creation(roles, |r: &Role| r.created_at))
    }

    async fn find_membership(
        &self,
        user_id: Uuid,
        group_id: Uuid,
    ) -> Result<Option<GroupMembership>> {
        Ok(self
            .memberships
            .read()
            .await
            .get(&(user_id, group_id))
            .cloned())
    }

    async fn find_memberships_by_user(&self, user_id: Uuid) -> Result<Vec<GroupMembership>> {
        let memberships = self
            .memberships
            .read()
            .await
            .values()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        Ok(sorted_by_creation(memberships, |m: &GroupMembership| {
            m.created_at
        }))
    }

    async fn find_memberships_by_group(&self, group_id: Uuid) -> Result<Vec<GroupMembership>> {
        let memberships = self
            .memberships
            .read()
            .await
            .values()
            .filter(|m| m.group_id == group_id)
            .cloned()
            .collect();
        Ok(sorted_by_creation(memberships, |m: &GroupMembership| {
            m.created_at
        }))
    }

    async fn insert_membership(&self, membership: &GroupMembership) -> Result<()> {
        self.memberships
            .write()
            .await
            .insert((membership.user_id, membership.group_id), membership.clone());
        Ok(())
    }

    async fn update_membership(&self, membership: &GroupMembership) -> Result<()> {
        self.memberships
            .write()
            .await
            .insert((membership.user_id, membership.group_id), membership.clone());
        Ok(())
    }

    async fn delete_membership(&self, user_id: Uuid, group_id: Uuid) -> Result<bool> {
        Ok(self
            .memberships
            .write()
            .await
            .remove(&(user_id, group_id))
            .is_some())
    }

    async fn find_resource_by_id(&self, id: Uuid) -> Result<Option<Resource>> {
        Ok(self.resources.read().await.get(&id).cloned())
    }

    async fn find_resources_by_owner(
        &self,
        owner_kind: OwnerKind,
        owner_id: Uuid,
    ) -> Result<Vec<Resource>> {
        let resources = self
            .resources
            .read()
            .await
            .values()
            .filter(|r| r.owner_kind == owner_kind && r.owner_id == owner_id)
            .cloned()
            .collect();
        Ok(sorted_by_creation(resources, |r: &Resource| r.created_at))
    }

    async fn find_resources_by_kind(&self, kind: &str) -> Result<Vec<Resource>> {
        let resources = self
            .resources
            .read()
            .await
            .values()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect();
        Ok(sorted_by_creation(resources, |r: &Resource| r.created_at))
    }

    async fn insert_resource(&self, resource: &Resource) -> Result<()> {
        self.resources
            .write()
            .await
            .insert(resource.id, resource.clone());
        Ok(())
    }

    async fn delete_resource(&self, id: Uuid) -> Result<bool> {
        Ok(self.resources.write().await.remove(&id).is_some())
    }

    async fn find_approval_by_id(&self, id: Uuid) -> Result<Option<ApprovalRequest>> {
        Ok(self.approvals.read().await.get(&id).cloned())
    }

    async fn find_approvals_by_resource(
        &self,
        resource_id: Uuid,
    ) -> Result<Vec<ApprovalRequest>> {
        let approvals = self
            .approvals
            .read()
            .await
            .values()
            .filter(|a| a.resource_id == resource_id)
            .cloned()
            .collect();
        Ok(sorted_by_creation(approvals, |a: &ApprovalRequest| {
            a.requested_at
        }))
    }

    async fn find_approvals_by_requester(&self, user_id: Uuid) -> Result<Vec<ApprovalRequest>> {
        let approvals = self
            .approvals
            .read()
            .await
            .values()
            .filter(|a| a.requested_by == user_id)
            .cloned()
            .collect();
        Ok(sorted_by_creation(approvals, |a: &ApprovalRequest| {
            a.requested_at
        }))
    }

    async fn insert_approval(&self, approval: &ApprovalRequest) -> Result<()> {
        self.approvals
            .write()
            .await
            .insert(approval.id, approval.clone());
        Ok(())
    }

    async fn transition_approval(
        &self,
        id: Uuid,
        approver_id: Uuid,
        status: ApprovalStatus,
        resolved_at: DateTime<Utc>,
    ) -> Result<Option<ApprovalRequest>> {
        let mut approvals = self.approvals.write().await;
        match approvals.get_mut(&id) {
            Some(approval) if approval.status == ApprovalStatus::Pending => {
                approval.status = status;
                approval.approved_by = Some(approver_id);
                approval.resolved_at = Some(resolved_at);
                Ok(Some(approval.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl PipelineStore for MemoryStore {
    async fn find_pipeline_by_id(&self, id: Uuid) -> Result<Option<Pipeline>> {
        Ok(self.pipelines.read().await.get(&id).cloned())
    }

    async fn pipeline_name_exists(&self, name: &str, owner_id: Uuid) -> Result<bool> {
        Ok(self
            .pipelines
            .read()
            .await
            .values()
            .any(|p| p.name == name && p.owner_id == owner_id))
    }

    async fn insert_pipeline(&self, pipeline: &Pipeline) -> Result<()> {
        self.pipelines
            .write()
            .await
            .insert(pipeline.id, pipeline.clone());
        Ok(())
    }

    async fn update_pipeline(&self, pipeline: &Pipeline) -> Result<()> {
        self.pipelines
            .write()
            .await
            .insert(pipeline.id, pipeline.clone());
        Ok(())
    }

    async fn delete_pipeline(&self, id: Uuid) -> Result<bool> {
        Ok(self.pipelines.write().await.remove(&id).is_some())
    }
}
