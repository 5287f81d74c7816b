//! Behavior every `UserStore` must share, run against each local store.

use instructable::{
    SearchMode,
    query::{PageRequest, UserQuery},
    store::{StoreKind, UserStore},
    user::{NewUser, ProfileUpdate, Role, Track, UserId},
};

use crate::helpers::*;

#[tokio::test]
async fn test_create_and_get_round_trip() {
    for store in local_stores().await {
        let created = store
            .create(
                NewUser::new("Fred", "fred@example.com")
                    .with_sca_name("Fritz")
                    .with_role(Role::Instructor)
                    .with_role(Role::PuStaff)
                    .with_track(Track::MiddleEastern)
                    .with_track(Track::GlassArts),
                Some("$argon2id$placeholder".to_string()),
            )
            .await
            .unwrap();

        let fetched = store.get(created.id).await.unwrap();
        assert_eq!(fetched, created, "{}", store.kind());
    }
}

#[tokio::test]
async fn test_absent_optionals_round_trip() {
    for store in local_stores().await {
        let created = store
            .create(NewUser::new("Plain", "plain@example.com"), None)
            .await
            .unwrap();
        let fetched = store.get(created.id).await.unwrap();

        assert_eq!(fetched.sca_name, None, "{}", store.kind());
        assert_eq!(fetched.password_hash, None);
        assert!(fetched.roles.is_empty());
        assert!(fetched.tracks.is_empty());
    }
}

#[tokio::test]
async fn test_missing_user_is_not_found() {
    for store in local_stores().await {
        let err = store.get(UserId(77)).await.unwrap_err();
        assert!(err.is_not_found(), "{}", store.kind());

        let update = ProfileUpdate {
            email: "x@example.com".to_string(),
            mundane_name: "X".to_string(),
            sca_name: None,
        };
        let err = store.update_profile(UserId(77), &update).await.unwrap_err();
        assert!(err.is_not_found(), "{}", store.kind());
    }
}

#[tokio::test]
async fn test_email_uniqueness_ignores_case() {
    for store in local_stores().await {
        let a = store
            .create(NewUser::new("A", "a@example.com"), None)
            .await
            .unwrap();
        let b = store
            .create(NewUser::new("B", "b@example.com"), None)
            .await
            .unwrap();

        let err = store
            .create(NewUser::new("C", "A@EXAMPLE.COM"), None)
            .await
            .unwrap_err();
        assert!(err.is_conflict(), "{}", store.kind());

        let steal = ProfileUpdate {
            email: "A@example.com".to_string(),
            mundane_name: "B".to_string(),
            sca_name: None,
        };
        let err = store.update_profile(b.id, &steal).await.unwrap_err();
        assert!(err.is_conflict(), "{}", store.kind());

        let found = store.find_by_email("  A@Example.com ").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(a.id));
    }
}

#[tokio::test]
async fn test_stores_agree_on_listing() {
    let stores = local_stores().await;
    let fixtures = [
        NewUser::new("zed", "zed@example.com").with_role(Role::Proofreader),
        NewUser::new("Alpha", "alpha@example.com")
            .with_sca_name("Flarg the Bold")
            .with_role(Role::Instructor),
        NewUser::new("beta", "flarg@example.com").with_role(Role::Instructor),
        NewUser::new("beta", "beta2@example.com"),
        NewUser::new("gamma", "gamma@example.com").with_role(Role::Admin),
    ];
    for store in &stores {
        for fixture in fixtures.clone() {
            store.create(fixture, None).await.unwrap();
        }
    }

    let queries = [
        UserQuery::new(),
        UserQuery::new().with_search("flarg"),
        UserQuery::new().with_search("FLARG"),
        UserQuery::new().with_role(Role::Instructor),
        UserQuery::new()
            .with_search("example")
            .with_role(Role::Proofreader),
        UserQuery::new().with_search("nobody"),
    ];

    for mode in [SearchMode::CaseInsensitive, SearchMode::CaseSensitive] {
        for query in &queries {
            for page in [PageRequest::new(1, 2), PageRequest::new(2, 2), PageRequest::new(4, 2)] {
                let mut results = Vec::new();
                for store in &stores {
                    let listed = store.list(query, mode, page).await.unwrap();
                    let ids: Vec<UserId> = listed.items.iter().map(|u| u.id).collect();
                    results.push((store.kind(), listed.total, ids));
                }
                let (_, total, ids) = &results[0];
                for (kind, other_total, other_ids) in &results[1..] {
                    assert_eq!(other_total, total, "{kind} total for {query:?} {mode:?}");
                    assert_eq!(other_ids, ids, "{kind} page {page:?} for {query:?} {mode:?}");
                }
            }
        }
    }
}

#[tokio::test]
async fn test_listing_order_breaks_ties_by_id() {
    for store in local_stores().await {
        let first = store
            .create(NewUser::new("same", "1@example.com"), None)
            .await
            .unwrap();
        let second = store
            .create(NewUser::new("same", "2@example.com"), None)
            .await
            .unwrap();

        let page = store
            .list(&UserQuery::new(), SearchMode::default(), PageRequest::first(30))
            .await
            .unwrap();
        let ids: Vec<UserId> = page.items.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![first.id, second.id], "{}", store.kind());
    }
}

#[tokio::test]
async fn test_huge_page_numbers_list_nothing() {
    for store in local_stores().await {
        for email in ["a@example.com", "b@example.com", "c@example.com"] {
            store.create(NewUser::new("User", email), None).await.unwrap();
        }

        for page in [
            PageRequest::new(usize::MAX, 30),
            PageRequest::new(usize::MAX / 30 + 2, 30),
            PageRequest::new(2, usize::MAX),
        ] {
            let listed = store
                .list(&UserQuery::new(), SearchMode::default(), page)
                .await
                .unwrap();
            assert!(listed.items.is_empty(), "{} {page:?}", store.kind());
            assert_eq!(listed.total, 3, "{} {page:?}", store.kind());
        }

        let everyone = store
            .list(
                &UserQuery::new(),
                SearchMode::default(),
                PageRequest::new(1, usize::MAX),
            )
            .await
            .unwrap();
        assert_eq!(everyone.items.len(), 3, "{}", store.kind());
    }
}

#[tokio::test]
async fn test_kinds() {
    let stores = local_stores().await;
    assert_eq!(stores[0].kind(), StoreKind::InMemory);
    #[cfg(feature = "sqlite")]
    assert_eq!(stores[1].kind(), StoreKind::Sqlite);
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_sqlite_file_persists_across_reopen() {
    use instructable::store::SqlxStore;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("instructable.db");

    let id = {
        let store = SqlxStore::open_sqlite(&path).await.unwrap();
        store
            .create(NewUser::new("Kept", "kept@example.com"), None)
            .await
            .unwrap()
            .id
    };

    let reopened = SqlxStore::open_sqlite(&path).await.unwrap();
    assert_eq!(reopened.get(id).await.unwrap().mundane_name, "Kept");
    assert_eq!(reopened.count().await.unwrap(), 1);
}
