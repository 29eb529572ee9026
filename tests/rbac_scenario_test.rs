mod common;

use rolekeeper_backend::coordinators::{AssociationCoordinator, IdentityCoordinator, RoleCoordinator};
use rolekeeper_backend::errors::{ErrorKind, ServiceError};
use rolekeeper_backend::types::{AssignOutcome, NewUser, PageRequest, PasswordHash};

fn new_user(username: &str, email: &str) -> NewUser {
    NewUser::new(username, email, PasswordHash::new("secret1")).expect("valid user")
}

#[tokio::test]
async fn test_membership_follows_committed_associations() {
    let app_data = common::setup_app_data().await;
    let identity = IdentityCoordinator::new(app_data.clone());
    let roles = RoleCoordinator::new(app_data.clone());
    let associations = AssociationCoordinator::new(app_data.clone());

    let user = identity.create_user(&new_user("alice", "alice@x.com")).await.unwrap();
    assert_eq!(user.id, 1);

    let err = identity.create_user(&new_user("alice", "other@x.com")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateKey);

    let admin = roles.create_role("admin").await.unwrap();
    assert_eq!(admin.id, 1);

    assert_eq!(associations.add_user_role(1, 1).await.unwrap(), AssignOutcome::Inserted);
    assert!(associations.user_has_role(1, "admin").await.unwrap());

    associations.remove_user_role(1, 1).await.unwrap();
    assert!(!associations.user_has_role(1, "admin").await.unwrap());
}

#[tokio::test]
async fn test_duplicate_username_fails_in_either_order() {
    for (first, second) in [("alice@x.com", "alice@y.com"), ("alice@y.com", "alice@x.com")] {
        let app_data = common::setup_app_data().await;
        let identity = IdentityCoordinator::new(app_data);

        let results = [
            identity.create_user(&new_user("alice", first)).await,
            identity.create_user(&new_user("alice", second)).await,
        ];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(matches!(results[1], Err(ServiceError::DuplicateKey(_))));
    }
}

#[tokio::test]
async fn test_duplicate_email_is_case_insensitive() {
    let app_data = common::setup_app_data().await;
    let identity = IdentityCoordinator::new(app_data);

    identity.create_user(&new_user("alice", "Alice@X.com")).await.unwrap();
    let err = identity.create_user(&new_user("alicia", "alice@x.COM")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DuplicateKey);
    assert_eq!(identity.count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn test_concurrent_creates_yield_one_winner() {
    let app_data = common::setup_app_data().await;
    let identity = IdentityCoordinator::new(app_data);

    let first = new_user("alice", "a1@x.com");
    let second = new_user("alice", "a2@x.com");
    let (a, b) = tokio::join!(identity.create_user(&first), identity.create_user(&second));

    assert_eq!([&a, &b].iter().filter(|r| r.is_ok()).count(), 1);
    let failure = if a.is_err() { a } else { b };
    assert_eq!(failure.unwrap_err().kind(), ErrorKind::DuplicateKey);
}

#[tokio::test]
async fn test_role_name_check_requires_two_characters() {
    let app_data = common::setup_app_data().await;
    let associations = AssociationCoordinator::new(app_data);

    let err = associations.user_has_role(1, "a").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert!(!associations.user_has_role(1, "qa").await.unwrap());
}

#[tokio::test]
async fn test_update_user_keeps_hash_unless_password_given() {
    let app_data = common::setup_app_data().await;
    let identity = IdentityCoordinator::new(app_data);
    let user = identity.register_user("alice", "alice@x.com", "secret1").await.unwrap();

    let renamed = identity.update_user(user.id, "alice2", "alice2@x.com", None).await.unwrap();
    assert_eq!(renamed.username, "alice2");
    assert_eq!(renamed.password_hash, user.password_hash);
    assert!(identity.login("alice2", "secret1").await.is_ok());

    identity.update_user(user.id, "alice2", "alice2@x.com", Some("new-secret")).await.unwrap();
    assert_eq!(
        identity.login("alice2", "secret1").await.unwrap_err(),
        ServiceError::InvalidCredentials
    );
    assert!(identity.login("alice2", "new-secret").await.is_ok());
}

#[tokio::test]
async fn test_update_user_rejects_taken_email_and_missing_id() {
    let app_data = common::setup_app_data().await;
    let identity = IdentityCoordinator::new(app_data);
    let owner = identity.create_user(&new_user("alice", "alice@x.com")).await.unwrap();
    identity.create_user(&NewUser::new("bob", "bob@x.com", PasswordHash::new("d")).unwrap()).await.unwrap();

    let err = identity.update_user(owner.id, "alice", "bob@x.com", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateKey);

    let err = identity.update_user(42, "ghost", "ghost@x.com", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_delete_user_removes_role_links() {
    let app_data = common::setup_app_data().await;
    let identity = IdentityCoordinator::new(app_data.clone());
    let roles = RoleCoordinator::new(app_data.clone());
    let associations = AssociationCoordinator::new(app_data.clone());

    let user = identity.create_user(&new_user("alice", "alice@x.com")).await.unwrap();
    let admin = roles.create_role("admin").await.unwrap();
    associations.add_user_role(user.id, admin.id).await.unwrap();

    identity.delete_user(user.id).await.unwrap();

    assert_eq!(identity.get_user(user.id).await.unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(identity.delete_user(user.id).await.unwrap_err().kind(), ErrorKind::NotFound);
    assert!(associations.get_roles_by_user_id(user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_and_paging() {
    let app_data = common::setup_app_data().await;
    let identity = IdentityCoordinator::new(app_data);
    for (name, domain) in [("alice", "corp.com"), ("bob", "home.net"), ("carol", "corp.com")] {
        identity
            .create_user(&NewUser::new(name, &format!("{}@{}", name, domain), PasswordHash::new("d")).unwrap())
            .await
            .unwrap();
    }

    let corp = identity
        .search_users("corp", PageRequest::default())
        .await
        .unwrap();
    assert_eq!(corp.iter().map(|u| u.username.as_str()).collect::<Vec<_>>(), ["alice", "carol"]);

    let second = identity
        .list_users(PageRequest::new(1, 2))
        .await
        .unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].username, "carol");

    assert_eq!(
        identity.search_users("  ", Default::default()).await.unwrap_err().kind(),
        ErrorKind::BadRequest
    );
}

#[tokio::test]
async fn test_search_wildcards_match_literally() {
    let app_data = common::setup_app_data().await;
    let identity = IdentityCoordinator::new(app_data);
    identity.create_user(&new_user("alice", "alice@x.com")).await.unwrap();
    identity.create_user(&new_user("bob", "bob@x.com")).await.unwrap();

    for query in ["%", "_"] {
        assert!(identity.search_users(query, Default::default()).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_far_pages_are_empty() {
    let app_data = common::setup_app_data().await;
    let identity = IdentityCoordinator::new(app_data.clone());
    let roles = RoleCoordinator::new(app_data);
    identity.create_user(&new_user("alice", "alice@x.com")).await.unwrap();
    roles.create_role("admin").await.unwrap();

    let far = PageRequest::new(1 << 62, 100);
    assert!(roles.list_roles(far).await.unwrap().is_empty());
    assert!(identity.search_users("alice", far).await.unwrap().is_empty());

    let parsed = PageRequest::parse(Some("18446744073709551615"), Some("100"));
    assert!(identity.list_users(parsed).await.unwrap().is_empty());
}
