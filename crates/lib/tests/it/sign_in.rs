use instructable::{
    Actor,
    store::UserStore,
    user::{NewUser, Role, UserId},
};

use crate::helpers::*;

#[tokio::test]
async fn test_authenticate_with_password() {
    let directory = test_directory().await;
    let created = create(
        &directory,
        NewUser::new("Admin", "admin@example.com")
            .with_role(Role::Admin)
            .with_password("correct horse"),
    )
    .await;
    assert!(created.password_hash.is_some());

    let user = directory
        .authenticate("ADMIN@example.com", "correct horse")
        .await
        .unwrap();
    assert_eq!(user.id, created.id);
}

#[tokio::test]
async fn test_authenticate_failures_look_alike() {
    let directory = test_directory().await;
    create(
        &directory,
        NewUser::new("Admin", "admin@example.com").with_password("correct horse"),
    )
    .await;
    create(&directory, NewUser::new("NoPassword", "nopass@example.com")).await;

    for (email, password) in [
        ("admin@example.com", "wrong"),
        ("nobody@example.com", "correct horse"),
        ("nopass@example.com", ""),
    ] {
        let err = directory.authenticate(email, password).await.unwrap_err();
        assert!(err.is_authentication_error(), "{email}");
        assert_eq!(err.to_string(), "Invalid email or password");
    }
}

#[tokio::test]
async fn test_resolve_actor() {
    let directory = test_directory().await;
    let user = create(&directory, NewUser::new("Someone", "someone@example.com")).await;

    assert_eq!(directory.resolve_actor(None).await.unwrap(), Actor::Anonymous);
    assert_eq!(
        directory.resolve_actor(Some(UserId(999))).await.unwrap(),
        Actor::Anonymous
    );
    assert_eq!(
        directory.resolve_actor(Some(user.id)).await.unwrap(),
        Actor::User(user)
    );
}

#[tokio::test]
async fn test_create_user_rejects_duplicate_email() {
    let directory = test_directory().await;
    create(&directory, NewUser::new("First", "dup@example.com")).await;

    let err = directory
        .create_user(NewUser::new("Second", "DUP@example.com"))
        .await
        .unwrap_err();
    assert!(err.is_validation_error());
}

#[tokio::test]
async fn test_create_user_validates_fields() {
    let directory = test_directory().await;

    let err = directory
        .create_user(NewUser::new("", "bad"))
        .await
        .unwrap_err();
    assert!(err.is_validation_error());
    assert_eq!(directory.store().count().await.unwrap(), 0);
}
