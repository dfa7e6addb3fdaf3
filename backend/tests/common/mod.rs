//! Common test utilities for backend integration tests.
//!
//! Wires every service over a shared in-memory store and provides fixture
//! factories for users, groups, memberships, and resources.

#![allow(dead_code)]

use std::sync::Arc;

use uuid::Uuid;

use gatekeeper_backend::models::group::UserGroup;
use gatekeeper_backend::models::resource::Resource;
use gatekeeper_backend::models::role::RoleKind;
use gatekeeper_backend::models::user::User;
use gatekeeper_backend::services::access_service::AccessService;
use gatekeeper_backend::services::approval_service::ApprovalService;
use gatekeeper_backend::services::group_service::GroupService;
use gatekeeper_backend::services::pipeline_service::PipelineService;
use gatekeeper_backend::services::resource_service::ResourceService;
use gatekeeper_backend::services::user_service::UserService;
use gatekeeper_backend::store::memory::MemoryStore;
use gatekeeper_backend::store::EntitlementStore;

/// Test context containing every service over one in-memory store.
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub users: UserService,
    pub groups: GroupService,
    pub resources: ResourceService,
    pub access: AccessService,
    pub approvals: ApprovalService,
    pub pipelines: PipelineService,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let entitlement: Arc<dyn EntitlementStore> = store.clone();
        let users = UserService::new(entitlement.clone());
        let groups = GroupService::new(entitlement.clone());
        let resources = ResourceService::new(entitlement.clone());
        let access = AccessService::new(entitlement.clone());
        let approvals = ApprovalService::new(entitlement, access.clone());
        let pipelines = PipelineService::new(
            store.clone(),
            resources.clone(),
            access.clone(),
            approvals.clone(),
        );
        Self {
            store,
            users,
            groups,
            resources,
            access,
            approvals,
            pipelines,
        }
    }

    pub async fn user(&self, name: &str) -> User {
        self.users
            .create_user(name, None, Some(format!("{name}@test.local")), None)
            .await
            .expect("create user")
    }

    pub async fn group(&self, name: &str) -> UserGroup {
        self.groups.create_group(name).await.expect("create group")
    }

    pub async fn role_id(&self, kind: RoleKind) -> Uuid {
        self.store
            .find_role_by_name(kind)
            .await
            .expect("role lookup")
            .expect("role seeded")
            .id
    }

    pub async fn add_member(&self, user: &User, group: &UserGroup, kind: RoleKind) {
        let role_id = self.role_id(kind).await;
        self.groups
            .add_member(user.id, group.id, role_id)
            .await
            .expect("add member");
    }

    /// Group-owned resource registered by `owner` (who must hold OWNER).
    pub async fn group_resource(&self, owner: &User, group: &UserGroup) -> Resource {
        self.resources
            .register(owner.id, "pipeline", Uuid::new_v4(), Some(group.id))
            .await
            .expect("register group resource")
    }

    /// Resource owned directly by `owner`.
    pub async fn user_resource(&self, owner: &User) -> Resource {
        self.resources
            .register(owner.id, "pipeline", Uuid::new_v4(), None)
            .await
            .expect("register user resource")
    }
}

/// Group with one member per role plus a group-owned resource.
pub struct GroupScenario {
    pub group: UserGroup,
    pub owner: User,
    pub developer: User,
    pub viewer: User,
    pub resource: Resource,
}

impl GroupScenario {
    pub async fn setup(ctx: &TestContext) -> Self {
        let group = ctx.group("platform").await;
        let owner = ctx.user("alice").await;
        let developer = ctx.user("bob").await;
        let viewer = ctx.user("carol").await;
        ctx.add_member(&owner, &group, RoleKind::Owner).await;
        ctx.add_member(&developer, &group, RoleKind::Developer).await;
        ctx.add_member(&viewer, &group, RoleKind::Viewer).await;
        let resource = ctx.group_resource(&owner, &group).await;
        Self {
            group,
            owner,
            developer,
            viewer,
            resource,
        }
    }
}
