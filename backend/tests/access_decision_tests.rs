//! Decision-table tests for the access decision engine.

mod common;

use gatekeeper_backend::error::AppError;
use gatekeeper_backend::models::resource::Operation;
use gatekeeper_backend::models::role::RoleKind;
use gatekeeper_backend::services::access_service::{Decision, DenyReason};
use uuid::Uuid;

use common::{GroupScenario, TestContext};

const ALL_OPERATIONS: [Operation; 4] = [
    Operation::View,
    Operation::Update,
    Operation::Delete,
    Operation::Publish,
];

#[tokio::test]
async fn user_owned_resource_answers_only_to_its_owner() {
    let ctx = TestContext::new();
    let owner = ctx.user("alice").await;
    let stranger = ctx.user("bob").await;
    let resource = ctx.user_resource(&owner).await;

    for op in ALL_OPERATIONS {
        let owner_decision = ctx.access.authorize(owner.id, resource.id, op).await.unwrap();
        assert_eq!(owner_decision, Decision::Allowed, "owner denied {op}");

        let stranger_decision = ctx
            .access
            .authorize(stranger.id, resource.id, op)
            .await
            .unwrap();
        assert_eq!(
            stranger_decision,
            Decision::Denied(DenyReason::NotOwner),
            "stranger not denied {op}"
        );
    }
}

#[tokio::test]
async fn group_roles_never_apply_to_user_owned_resources() {
    let ctx = TestContext::new();
    let scenario = GroupScenario::setup(&ctx).await;
    // Resource owned directly by the group owner, outside the group.
    let private = ctx.user_resource(&scenario.owner).await;

    // The developer holds a role in the owner's group, but that grants
    // nothing on the owner's private resource, not even view.
    let decision = ctx
        .access
        .authorize(scenario.developer.id, private.id, Operation::View)
        .await
        .unwrap();
    assert_eq!(decision, Decision::Denied(DenyReason::NotOwner));
}

#[tokio::test]
async fn group_owner_is_allowed_every_operation() {
    let ctx = TestContext::new();
    let scenario = GroupScenario::setup(&ctx).await;

    for op in ALL_OPERATIONS {
        let decision = ctx
            .access
            .authorize(scenario.owner.id, scenario.resource.id, op)
            .await
            .unwrap();
        assert_eq!(decision, Decision::Allowed, "owner denied {op}");
    }
}

#[tokio::test]
async fn developer_is_gated_on_delete_and_publish() {
    let ctx = TestContext::new();
    let scenario = GroupScenario::setup(&ctx).await;
    let dev = scenario.developer.id;
    let resource = scenario.resource.id;

    assert_eq!(
        ctx.access.authorize(dev, resource, Operation::View).await.unwrap(),
        Decision::Allowed
    );
    assert_eq!(
        ctx.access.authorize(dev, resource, Operation::Update).await.unwrap(),
        Decision::Allowed
    );
    assert_eq!(
        ctx.access.authorize(dev, resource, Operation::Delete).await.unwrap(),
        Decision::NeedsApproval
    );
    assert_eq!(
        ctx.access.authorize(dev, resource, Operation::Publish).await.unwrap(),
        Decision::NeedsApproval
    );
}

#[tokio::test]
async fn viewer_is_allowed_view_only() {
    let ctx = TestContext::new();
    let scenario = GroupScenario::setup(&ctx).await;

    for op in ALL_OPERATIONS {
        let decision = ctx
            .access
            .authorize(scenario.viewer.id, scenario.resource.id, op)
            .await
            .unwrap();
        let expected = if op == Operation::View {
            Decision::Allowed
        } else {
            Decision::Denied(DenyReason::InsufficientRole)
        };
        assert_eq!(decision, expected, "viewer decision wrong for {op}");
    }
}

#[tokio::test]
async fn non_member_is_denied_even_view() {
    let ctx = TestContext::new();
    let scenario = GroupScenario::setup(&ctx).await;
    let outsider = ctx.user("mallory").await;

    let decision = ctx
        .access
        .authorize(outsider.id, scenario.resource.id, Operation::View)
        .await
        .unwrap();
    assert_eq!(decision, Decision::Denied(DenyReason::NotInGroup));
}

#[tokio::test]
async fn missing_resource_is_not_found() {
    let ctx = TestContext::new();
    let user = ctx.user("alice").await;

    let err = ctx
        .access
        .authorize(user.id, Uuid::new_v4(), Operation::View)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn decision_follows_role_reassignment() {
    let ctx = TestContext::new();
    let scenario = GroupScenario::setup(&ctx).await;

    // Demote the developer to viewer; delete flips from gated to denied.
    let viewer_role = ctx.role_id(RoleKind::Viewer).await;
    ctx.groups
        .change_role(scenario.developer.id, scenario.group.id, viewer_role)
        .await
        .unwrap();

    let decision = ctx
        .access
        .authorize(scenario.developer.id, scenario.resource.id, Operation::Delete)
        .await
        .unwrap();
    assert_eq!(decision, Decision::Denied(DenyReason::InsufficientRole));
}

#[tokio::test]
async fn membership_removal_revokes_access() {
    let ctx = TestContext::new();
    let scenario = GroupScenario::setup(&ctx).await;

    ctx.groups
        .remove_member(scenario.developer.id, scenario.group.id)
        .await
        .unwrap();

    let decision = ctx
        .access
        .authorize(scenario.developer.id, scenario.resource.id, Operation::View)
        .await
        .unwrap();
    assert_eq!(decision, Decision::Denied(DenyReason::NotInGroup));
}
