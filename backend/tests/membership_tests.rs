//! Identity and membership model tests.

mod common;

use gatekeeper_backend::error::AppError;
use gatekeeper_backend::models::role::RoleKind;
use gatekeeper_backend::services::user_service::UpdateUser;
use uuid::Uuid;

use common::TestContext;

#[tokio::test]
async fn usernames_are_unique() {
    let ctx = TestContext::new();
    ctx.user("alice").await;

    let err = ctx
        .users
        .create_user("alice", None, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicateUsername(name) if name == "alice"));
}

#[tokio::test]
async fn group_names_are_unique() {
    let ctx = TestContext::new();
    ctx.group("platform").await;

    let err = ctx.groups.create_group("platform").await.unwrap_err();
    assert!(matches!(err, AppError::DuplicateGroupName(name) if name == "platform"));
}

#[tokio::test]
async fn a_user_holds_one_role_per_group() {
    let ctx = TestContext::new();
    let user = ctx.user("alice").await;
    let group = ctx.group("platform").await;
    ctx.add_member(&user, &group, RoleKind::Developer).await;

    // A second membership for the pair is rejected, not upserted.
    let owner_role = ctx.role_id(RoleKind::Owner).await;
    let err = ctx
        .groups
        .add_member(user.id, group.id, owner_role)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyMember(u, g) if u == user.id && g == group.id));

    let role = ctx.groups.role_of(user.id, group.id).await.unwrap().unwrap();
    assert_eq!(role.name, RoleKind::Developer);
}

#[tokio::test]
async fn add_member_validates_user_group_and_role() {
    let ctx = TestContext::new();
    let user = ctx.user("alice").await;
    let group = ctx.group("platform").await;
    let role_id = ctx.role_id(RoleKind::Viewer).await;

    let err = ctx
        .groups
        .add_member(Uuid::new_v4(), group.id, role_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = ctx
        .groups
        .add_member(user.id, Uuid::new_v4(), role_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = ctx
        .groups
        .add_member(user.id, group.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn change_role_requires_an_existing_membership() {
    let ctx = TestContext::new();
    let user = ctx.user("alice").await;
    let group = ctx.group("platform").await;
    let owner_role = ctx.role_id(RoleKind::Owner).await;

    let err = ctx
        .groups
        .change_role(user.id, group.id, owner_role)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotAMember(u, g) if u == user.id && g == group.id));
}

#[tokio::test]
async fn change_role_mutates_the_membership_in_place() {
    let ctx = TestContext::new();
    let user = ctx.user("alice").await;
    let group = ctx.group("platform").await;
    ctx.add_member(&user, &group, RoleKind::Viewer).await;

    let developer_role = ctx.role_id(RoleKind::Developer).await;
    ctx.groups
        .change_role(user.id, group.id, developer_role)
        .await
        .unwrap();

    let role = ctx.groups.role_of(user.id, group.id).await.unwrap().unwrap();
    assert_eq!(role.name, RoleKind::Developer);
}

#[tokio::test]
async fn remove_member_is_a_no_op_when_absent() {
    let ctx = TestContext::new();
    let user = ctx.user("alice").await;
    let group = ctx.group("platform").await;

    // Absent membership: nothing to remove, nothing to fail.
    ctx.groups.remove_member(user.id, group.id).await.unwrap();

    ctx.add_member(&user, &group, RoleKind::Developer).await;
    ctx.groups.remove_member(user.id, group.id).await.unwrap();
    assert!(ctx.groups.role_of(user.id, group.id).await.unwrap().is_none());
}

#[tokio::test]
async fn membership_projections_cover_both_directions() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;
    let bob = ctx.user("bob").await;
    let platform = ctx.group("platform").await;
    let data = ctx.group("data").await;
    ctx.add_member(&alice, &platform, RoleKind::Owner).await;
    ctx.add_member(&alice, &data, RoleKind::Viewer).await;
    ctx.add_member(&bob, &platform, RoleKind::Developer).await;

    let alice_groups = ctx.groups.groups_of(alice.id).await.unwrap();
    assert_eq!(alice_groups.len(), 2);

    let platform_members = ctx.groups.members_of(platform.id).await.unwrap();
    let mut names: Vec<_> = platform_members.iter().map(|u| u.username.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["alice", "bob"]);
}

#[tokio::test]
async fn user_updates_keep_unspecified_fields() {
    let ctx = TestContext::new();
    let user = ctx.user("alice").await;

    let updated = ctx
        .users
        .update_user(
            user.id,
            UpdateUser {
                phone: Some("555-0100".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.username, "alice");
    assert_eq!(updated.email.as_deref(), Some("alice@test.local"));
    assert_eq!(updated.phone.as_deref(), Some("555-0100"));
}

#[tokio::test]
async fn deleting_a_missing_user_is_not_found() {
    let ctx = TestContext::new();
    let user = ctx.user("alice").await;

    ctx.users.delete_user(user.id).await.unwrap();
    let err = ctx.users.delete_user(user.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
