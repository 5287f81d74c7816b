use instructable::{
    Actor,
    edit::ProfileSubmission,
    query::UserQuery,
    store::UserStore,
    user::{NewUser, Role},
};

use crate::helpers::*;

#[tokio::test]
async fn test_anonymous_cannot_list() {
    let directory = test_directory().await;
    create_numbered_users(&directory, 3).await;

    let err = directory
        .list_users(&Actor::Anonymous, UserQuery::new(), directory.page(1))
        .await
        .unwrap_err();
    assert!(err.is_permission_denied());
    assert_eq!(err.to_string(), "Not authorized");
}

#[tokio::test]
async fn test_every_non_admin_role_is_refused() {
    let directory = test_directory().await;
    let target = create(&directory, NewUser::new("Target", "target@example.com")).await;

    for role in [
        Role::Coordinator,
        Role::Instructor,
        Role::PuStaff,
        Role::Proofreader,
    ] {
        let actor = actor_with_role(&directory, role).await;

        let listed = directory
            .list_users(&actor, UserQuery::new(), directory.page(1))
            .await;
        assert!(
            listed.is_err_and(|e| e.is_permission_denied()),
            "{role} listed users"
        );

        let form = directory.edit_form(&actor, target.id).await;
        assert!(form.is_err_and(|e| e.is_permission_denied()), "{role} opened edit form");
    }
}

#[tokio::test]
async fn test_refused_update_changes_nothing() {
    let directory = test_directory().await;
    let target = create(&directory, NewUser::new("Target", "target@example.com")).await;
    let instructor = actor_with_role(&directory, Role::Instructor).await;

    let submission = ProfileSubmission {
        email: "hijacked@example.com".to_string(),
        mundane_name: "Hijacked".to_string(),
        sca_name: String::new(),
    };
    let err = directory
        .update_user(&instructor, target.id, submission)
        .await
        .unwrap_err();
    assert!(err.is_permission_denied());

    let stored = directory.store().get(target.id).await.unwrap();
    assert_eq!(stored.email, "target@example.com");
}

#[tokio::test]
async fn test_gate_runs_before_lookup() {
    let directory = test_directory().await;

    // A missing id must not reveal itself to a non-admin.
    let err = directory
        .edit_form(&Actor::Anonymous, instructable::user::UserId(999))
        .await
        .unwrap_err();
    assert!(err.is_permission_denied());
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn test_admin_passes() {
    let directory = test_directory().await;
    let admin = admin(&directory).await;

    let page = directory
        .list_users(&admin, UserQuery::new(), directory.page(1))
        .await
        .unwrap();
    assert_eq!(page.total, 1);
}
