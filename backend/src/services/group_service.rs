//! Group and membership service.
//!
//! Group deletion is intentionally not exposed; resources stay bound to a
//! live group for their whole lifetime.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::group::{GroupMembership, UserGroup};
use crate::models::role::Role;
use crate::models::user::User;
use crate::store::EntitlementStore;

/// Group and membership service
#[derive(Clone)]
pub struct GroupService {
    store: Arc<dyn EntitlementStore>,
}

impl GroupService {
    pub fn new(store: Arc<dyn EntitlementStore>) -> Self {
        Self { store }
    }

    pub async fn create_group(&self, name: &str) -> Result<UserGroup> {
        if self.store.find_group_by_name(name).await?.is_some() {
            return Err(AppError::DuplicateGroupName(name.to_string()));
        }

        let group = UserGroup::new(name);
        self.store.insert_group(&group).await?;
        tracing::info!(group_id = %group.id, name, "created group");
        Ok(group)
    }

    pub async fn find_group(&self, id: Uuid) -> Result<Option<UserGroup>> {
        self.store.find_group_by_id(id).await
    }

    /// Add a user to a group with the given role. Fails `AlreadyMember` when
    /// a membership row exists for the pair; there is no silent upsert.
    pub async fn add_member(
        &self,
        user_id: Uuid,
        group_id: Uuid,
        role_id: Uuid,
    ) -> Result<GroupMembership> {
        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))?;
        let group = self
            .store
            .find_group_by_id(group_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("group {group_id}")))?;
        let role = self
            .store
            .find_role_by_id(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role {role_id}")))?;

        if self.store.find_membership(user_id, group_id).await?.is_some() {
            return Err(AppError::AlreadyMember(user_id, group_id));
        }

        let membership = GroupMembership::new(user.id, group.id, role.id);
        self.store.insert_membership(&membership).await?;
        tracing::info!(
            user_id = %user_id,
            group_id = %group_id,
            role = %role.name,
            "added group member"
        );
        Ok(membership)
    }

    /// Remove a user from a group. No-op when no membership exists.
    pub async fn remove_member(&self, user_id: Uuid, group_id: Uuid) -> Result<()> {
        if self.store.delete_membership(user_id, group_id).await? {
            tracing::info!(user_id = %user_id, group_id = %group_id, "removed group member");
        }
        Ok(())
    }

    /// Reassign a member's role in place.
    pub async fn change_role(
        &self,
        user_id: Uuid,
        group_id: Uuid,
        new_role_id: Uuid,
    ) -> Result<GroupMembership> {
        let mut membership = self
            .store
            .find_membership(user_id, group_id)
            .await?
            .ok_or(AppError::NotAMember(user_id, group_id))?;
        let role = self
            .store
            .find_role_by_id(new_role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role {new_role_id}")))?;

        membership.role_id = role.id;
        membership.updated_at = Utc::now();
        self.store.update_membership(&membership).await?;
        tracing::info!(
            user_id = %user_id,
            group_id = %group_id,
            role = %role.name,
            "changed member role"
        );
        Ok(membership)
    }

    /// The user's role in the group, if they are a member.
    pub async fn role_of(&self, user_id: Uuid, group_id: Uuid) -> Result<Option<Role>> {
        let Some(membership) = self.store.find_membership(user_id, group_id).await? else {
            return Ok(None);
        };
        let role = self
            .store
            .find_role_by_id(membership.role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role {}", membership.role_id)))?;
        Ok(Some(role))
    }

    pub async fn groups_of(&self, user_id: Uuid) -> Result<Vec<UserGroup>> {
        let memberships = self.store.find_memberships_by_user(user_id).await?;
        let mut groups = Vec::with_capacity(memberships.len());
        for membership in memberships {
            let group = self
                .store
                .find_group_by_id(membership.group_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("group {}", membership.group_id)))?;
            groups.push(group);
        }
        Ok(groups)
    }

    pub async fn members_of(&self, group_id: Uuid) -> Result<Vec<User>> {
        let memberships = self.store.find_memberships_by_group(group_id).await?;
        let mut users = Vec::with_capacity(memberships.len());
        for membership in memberships {
            let user = self
                .store
                .find_user_by_id(membership.user_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("user {}", membership.user_id)))?;
            users.push(user);
        }
        Ok(users)
    }
}
