//! PostgreSQL store adapter.
//!
//! Schema lives in `migrations/`; see `db::run_migrations`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::approval::{ApprovalRequest, ApprovalStatus};
use crate::models::group::{GroupMembership, UserGroup};
use crate::models::pipeline::Pipeline;
use crate::models::resource::{OwnerKind, Resource};
use crate::models::role::{Role, RoleKind};
use crate::models::user::User;

use super::{EntitlementStore, PipelineStore};

/// Postgres implementation of the store contracts.
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const USER_COLUMNS: &str = "id, username, password_hash, email, phone, created_at, updated_at";
const GROUP_COLUMNS: &str = "id, name, created_at, updated_at";
const MEMBERSHIP_COLUMNS: &str = "id, user_id, group_id, role_id, created_at, updated_at";
const RESOURCE_COLUMNS: &str =
    "id, kind, external_id, owner_kind, owner_id, created_at, updated_at";
const APPROVAL_COLUMNS: &str =
    "id, resource_id, operation, requested_by, approved_by, status, requested_at, resolved_at";
const PIPELINE_COLUMNS: &str =
    "id, name, description, configuration, owner_id, status, created_at, updated_at";

#[async_trait]
impl EntitlementStore for PgStore {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, email, phone, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET username = $2, password_hash = $3, email = $4, phone = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(user.updated_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_group_by_id(&self, id: Uuid) -> Result<Option<UserGroup>> {
        let group = sqlx::query_as::<_, UserGroup>(&format!(
            "SELECT {GROUP_COLUMNS} FROM user_groups WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(group)
    }

    async fn find_group_by_name(&self, name: &str) -> Result<Option<UserGroup>> {
        let group = sqlx::query_as::<_, UserGroup>(&format!(
            "SELECT {GROUP_COLUMNS} FROM user_groups WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.db)
        .await?;
        Ok(group)
    }

    async fn insert_group(&self, group: &UserGroup) -> Result<()> {
        sqlx::query(
            "INSERT INTO user_groups (id, name, created_at, updated_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(group.id)
        .bind(&group.name)
        .bind(group.created_at)
        .bind(group.updated_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn find_role_by_id(&self, id: Uuid) -> Result<Option<Role>> {
        let role =
            sqlx::query_as::<_, Role>("SELECT id, name, created_at FROM roles WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.db)
                .await?;
        Ok(role)
    }

    async fn find_role_by_name(&self, name: RoleKind) -> Result<Option<Role>> {
        let role =
            sqlx::query_as::<_, Role>("SELECT id, name, created_at FROM roles WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.db)
                .await?;
        Ok(role)
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        let roles =
            sqlx::query_as::<_, Role>("SELECT id, name, created_at FROM roles ORDER BY name")
                .fetch_all(&self.db)
                .await?;
        Ok(roles)
    }

    async fn find_membership(
        &self,
        user_id: Uuid,
        group_id: Uuid,
    ) -> Result<Option<GroupMembership>> {
        let membership = sqlx::query_as::<_, GroupMembership>(&format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM group_memberships WHERE user_id = $1 AND group_id = $2"
        ))
        .bind(user_id)
        .bind(group_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(membership)
    }

    async fn find_memberships_by_user(&self, user_id: Uuid) -> Result<Vec<GroupMembership>> {
        let memberships = sqlx::query_as::<_, GroupMembership>(&format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM group_memberships WHERE user_id = $1 ORDER BY created_at ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(memberships)
    }

    async fn find_memberships_by_group(&self, group_id: Uuid) -> Result<Vec<GroupMembership>> {
        let memberships = sqlx::query_as::<_, GroupMembership>(&format!(
            "SELECT {MEMBERSHIP_COLUMNS} FROM group_memberships WHERE group_id = $1 ORDER BY created_at ASC"
        ))
        .bind(group_id)
        .fetch_all(&self.db)
        .await?;
        Ok(memberships)
    }

    async fn insert_membership(&self, membership: &GroupMembership) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO group_memberships (id, user_id, group_id, role_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(membership.id)
        .bind(membership.user_id)
        .bind(membership.group_id)
        .bind(membership.role_id)
        .bind(membership.created_at)
        .bind(membership.updated_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn update_membership(&self, membership: &GroupMembership) -> Result<()> {
        sqlx::query(
            "UPDATE group_memberships SET role_id = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(membership.id)
        .bind(membership.role_id)
        .bind(membership.updated_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn delete_membership(&self, user_id: Uuid, group_id: Uuid) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM group_memberships WHERE user_id = $1 AND group_id = $2")
                .bind(user_id)
                .bind(group_id)
                .execute(&self.db)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_resource_by_id(&self, id: Uuid) -> Result<Option<Resource>> {
        let resource = sqlx::query_as::<_, Resource>(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(resource)
    }

    async fn find_resources_by_owner(
        &self,
        owner_kind: OwnerKind,
        owner_id: Uuid,
    ) -> Result<Vec<Resource>> {
        let resources = sqlx::query_as::<_, Resource>(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources WHERE owner_kind = $1 AND owner_id = $2 ORDER BY created_at ASC"
        ))
        .bind(owner_kind)
        .bind(owner_id)
        .fetch_all(&self.db)
        .await?;
        Ok(resources)
    }

    async fn find_resources_by_kind(&self, kind: &str) -> Result<Vec<Resource>> {
        let resources = sqlx::query_as::<_, Resource>(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources WHERE kind = $1 ORDER BY created_at ASC"
        ))
        .bind(kind)
        .fetch_all(&self.db)
        .await?;
        Ok(resources)
    }

    async fn insert_resource(&self, resource: &Resource) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO resources (id, kind, external_id, owner_kind, owner_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(resource.id)
        .bind(&resource.kind)
        .bind(resource.external_id)
        .bind(resource.owner_kind)
        .bind(resource.owner_id)
        .bind(resource.created_at)
        .bind(resource.updated_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn delete_resource(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM resources WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_approval_by_id(&self, id: Uuid) -> Result<Option<ApprovalRequest>> {
        let approval = sqlx::query_as::<_, ApprovalRequest>(&format!(
            "SELECT {APPROVAL_COLUMNS} FROM operation_approvals WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(approval)
    }

    async fn find_approvals_by_resource(
        &self,
        resource_id: Uuid,
    ) -> Result<Vec<ApprovalRequest>> {
        let approvals = sqlx::query_as::<_, ApprovalRequest>(&format!(
            "SELECT {APPROVAL_COLUMNS} FROM operation_approvals WHERE resource_id = $1 ORDER BY requested_at ASC"
        ))
        .bind(resource_id)
        .fetch_all(&self.db)
        .await?;
        Ok(approvals)
    }

    async fn find_approvals_by_requester(&self, user_id: Uuid) -> Result<Vec<ApprovalRequest>> {
        let approvals = sqlx::query_as::<_, ApprovalRequest>(&format!(
            "SELECT {APPROVAL_COLUMNS} FROM operation_approvals WHERE requested_by = $1 ORDER BY requested_at ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(approvals)
    }

    async fn insert_approval(&self, approval: &ApprovalRequest) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO operation_approvals
                (id, resource_id, operation, requested_by, approved_by, status, requested_at, resolved_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(approval.id)
        .bind(approval.resource_id)
        .bind(approval.operation)
        .bind(approval.requested_by)
        .bind(approval.approved_by)
        .bind(approval.status)
        .bind(approval.requested_at)
        .bind(approval.resolved_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn transition_approval(
        &self,
        id: Uuid,
        approver_id: Uuid,
        status: ApprovalStatus,
        resolved_at: DateTime<Utc>,
    ) -> Result<Option<ApprovalRequest>> {
        // Conditional UPDATE: of two concurrent transitions only one can
        // match the PENDING row.
        let approval = sqlx::query_as::<_, ApprovalRequest>(&format!(
            r#"
            UPDATE operation_approvals
            SET status = $2, approved_by = $3, resolved_at = $4
            WHERE id = $1 AND status = 'pending'
            RETURNING {APPROVAL_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .bind(approver_id)
        .bind(resolved_at)
        .fetch_optional(&self.db)
        .await?;
        Ok(approval)
    }
}

#[async_trait]
impl PipelineStore for PgStore {
    async fn find_pipeline_by_id(&self, id: Uuid) -> Result<Option<Pipeline>> {
        let pipeline = sqlx::query_as::<_, Pipeline>(&format!(
            "SELECT {PIPELINE_COLUMNS} FROM pipelines WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(pipeline)
    }

    async fn pipeline_name_exists(&self, name: &str, owner_id: Uuid) -> Result<bool> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM pipelines WHERE name = $1 AND owner_id = $2",
        )
        .bind(name)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.is_some())
    }

    async fn insert_pipeline(&self, pipeline: &Pipeline) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pipelines
                (id, name, description, configuration, owner_id, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(pipeline.id)
        .bind(&pipeline.name)
        .bind(&pipeline.description)
        .bind(&pipeline.configuration)
        .bind(pipeline.owner_id)
        .bind(pipeline.status)
        .bind(pipeline.created_at)
        .bind(pipeline.updated_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn update_pipeline(&self, pipeline: &Pipeline) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE pipelines
            SET name = $2, description = $3, configuration = $4, status = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(pipeline.id)
        .bind(&pipeline.name)
        .bind(&pipeline.description)
        .bind(&pipeline.configuration)
        .bind(pipeline.status)
        .bind(pipeline.updated_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn delete_pipeline(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM pipelines WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
