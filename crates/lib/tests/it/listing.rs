use instructable::{
    DirectoryConfig, SearchMode,
    pagination::PageLink,
    query::UserQuery,
    user::{NewUser, Role, Track},
};

use crate::helpers::*;

#[tokio::test]
async fn test_rows_render_roles_name_email_and_tracks() {
    let directory = test_directory().await;
    let fred = create(
        &directory,
        NewUser::new("Fred", "fred@example.com")
            .with_role(Role::Admin)
            .with_role(Role::Coordinator)
            .with_track(Track::ALL[0])
            .with_track(Track::ALL[Track::ALL.len() - 1]),
    )
    .await;
    let actor = instructable::Actor::User(fred);

    let page = directory
        .list_users(&actor, UserQuery::new(), directory.page(1))
        .await
        .unwrap();
    let rows = page.rows();
    assert_eq!(rows.len(), 1);

    let row = &rows[0];
    assert_eq!(row.roles, vec!["Admin", "Coordinator"]);
    assert_eq!(row.display_name, "Fred");
    assert_eq!(row.email, "fred@example.com");
    assert!(row.tracks.contains(Track::ALL[0].name()));
    assert!(row.tracks.contains(Track::ALL[Track::ALL.len() - 1].name()));
}

#[tokio::test]
async fn test_no_tracks_renders_dash() {
    let directory = test_directory().await;
    let admin = admin(&directory).await;

    let page = directory
        .list_users(&admin, UserQuery::new(), directory.page(1))
        .await
        .unwrap();
    assert_eq!(page.rows()[0].tracks, "-");
}

#[tokio::test]
async fn test_search_on_email() {
    let directory = test_directory().await;
    let (admin, _) = search_fixtures(&directory).await;

    let page = directory
        .list_users(
            &admin,
            UserQuery::new().with_search("flargemail"),
            directory.page(1),
        )
        .await
        .unwrap();
    assert_eq!(names(&page.items), vec!["mundaneflarg"]);
}

#[tokio::test]
async fn test_search_on_mundane_name() {
    let directory = test_directory().await;
    let (admin, _) = search_fixtures(&directory).await;

    let page = directory
        .list_users(
            &admin,
            UserQuery::new().with_search("mundaneflarg"),
            directory.page(1),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.rows()[0].display_name, "scaflarg");
}

#[tokio::test]
async fn test_search_on_sca_name() {
    let directory = test_directory().await;
    let (admin, _) = search_fixtures(&directory).await;

    let page = directory
        .list_users(
            &admin,
            UserQuery::new().with_search("scaflarg"),
            directory.page(1),
        )
        .await
        .unwrap();
    assert_eq!(names(&page.items), vec!["mundaneflarg"]);
}

#[tokio::test]
async fn test_search_is_substring_and_trimmed() {
    let directory = test_directory().await;
    let (admin, _) = search_fixtures(&directory).await;

    let page = directory
        .list_users(
            &admin,
            UserQuery::new().with_search("  mundane  "),
            directory.page(1),
        )
        .await
        .unwrap();
    assert_eq!(names(&page.items), vec!["mundanebaz", "mundaneflarg"]);
}

#[tokio::test]
async fn test_search_case_insensitive_by_default() {
    let directory = test_directory().await;
    let (admin, _) = search_fixtures(&directory).await;

    let page = directory
        .list_users(
            &admin,
            UserQuery::new().with_search("FLARGEMAIL"),
            directory.page(1),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn test_search_case_sensitive_when_configured() {
    let directory =
        test_directory_with(DirectoryConfig::default().with_search_mode(SearchMode::CaseSensitive))
            .await;
    let (admin, _) = search_fixtures(&directory).await;

    let upper = directory
        .list_users(
            &admin,
            UserQuery::new().with_search("FLARGEMAIL"),
            directory.page(1),
        )
        .await
        .unwrap();
    assert_eq!(upper.total, 0);

    let exact = directory
        .list_users(
            &admin,
            UserQuery::new().with_search("flargemail"),
            directory.page(1),
        )
        .await
        .unwrap();
    assert_eq!(exact.total, 1);
}

#[tokio::test]
async fn test_filter_by_each_role() {
    let directory = test_directory().await;
    let (admin, users) = search_fixtures(&directory).await;

    for role in Role::ALL {
        let page = directory
            .list_users(&admin, UserQuery::new().with_role(role), directory.page(1))
            .await
            .unwrap();

        let mut expected: Vec<&str> = users
            .iter()
            .filter(|u| u.has_role(role))
            .map(|u| u.mundane_name.as_str())
            .collect();
        expected.sort();

        assert_eq!(names(&page.items), expected, "role filter {role}");
    }
}

#[tokio::test]
async fn test_search_and_role_are_conjunctive() {
    let directory = test_directory().await;
    let (admin, _) = search_fixtures(&directory).await;

    let page = directory
        .list_users(
            &admin,
            UserQuery::new()
                .with_search("baz")
                .with_role(Role::Instructor),
            directory.page(1),
        )
        .await
        .unwrap();
    assert_eq!(names(&page.items), vec!["mundanebaz"]);

    let none = directory
        .list_users(
            &admin,
            UserQuery::new()
                .with_search("baz")
                .with_role(Role::Proofreader),
            directory.page(1),
        )
        .await
        .unwrap();
    assert!(none.is_empty());
    assert_eq!(none.total, 0);
}

#[tokio::test]
async fn test_clear_restores_full_listing() {
    let directory = test_directory().await;
    let (admin, users) = search_fixtures(&directory).await;

    let filtered = directory
        .list_users(
            &admin,
            UserQuery::new().with_search("scaflarg"),
            directory.page(1),
        )
        .await
        .unwrap();
    assert_eq!(filtered.total, 1);

    let cleared = directory
        .list_users(&admin, UserQuery::cleared(), directory.page(1))
        .await
        .unwrap();
    assert_eq!(cleared.total, users.len());
    let listed = names(&cleared.items);
    assert!(listed.contains(&"mundaneflarg"));
    assert!(listed.contains(&"mundanebaz"));
}

#[tokio::test]
async fn test_blank_search_lists_everyone() {
    let directory = test_directory().await;
    let (admin, users) = search_fixtures(&directory).await;

    let page = directory
        .list_users(&admin, UserQuery::new().with_search("   "), directory.page(1))
        .await
        .unwrap();
    assert_eq!(page.total, users.len());
}

#[tokio::test]
async fn test_listing_is_ordered_by_mundane_name() {
    let directory = test_directory().await;
    let (admin, _) = search_fixtures(&directory).await;

    let page = directory
        .list_users(&admin, UserQuery::new(), directory.page(1))
        .await
        .unwrap();
    let listed = names(&page.items);
    let mut sorted = listed.clone();
    sorted.sort();
    assert_eq!(listed, sorted);
}

#[tokio::test]
async fn test_thirty_users_fit_one_page_plus_admin() {
    let directory = test_directory().await;
    create_numbered_users(&directory, 30).await;
    let admin = admin(&directory).await;

    let first = directory
        .list_users(&admin, UserQuery::new(), directory.page(1))
        .await
        .unwrap();
    assert_eq!(first.total, 31);
    assert_eq!(first.items.len(), 30);
    assert!(first.has_more());
    assert_eq!(first.total_pages(), 2);

    let second = directory
        .list_users(&admin, UserQuery::new(), directory.page(2))
        .await
        .unwrap();
    assert_eq!(second.items.len(), 1);
    assert!(!second.has_more());
}

#[tokio::test]
async fn test_seventy_users_paginate() {
    let directory = test_directory().await;
    create_numbered_users(&directory, 70).await;
    let admin = admin(&directory).await;

    let mut seen = Vec::new();
    for number in 1..=3 {
        let page = directory
            .list_users(&admin, UserQuery::new(), directory.page(number))
            .await
            .unwrap();
        assert_eq!(page.total, 71);
        assert_eq!(page.total_pages(), 3);
        seen.extend(page.items.into_iter().map(|u| u.id));
    }

    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 71);
}

#[tokio::test]
async fn test_page_past_end_is_empty() {
    let directory = test_directory().await;
    create_numbered_users(&directory, 5).await;
    let admin = admin(&directory).await;

    let page = directory
        .list_users(&admin, UserQuery::new(), directory.page(9))
        .await
        .unwrap();
    assert!(page.is_empty());
    assert_eq!(page.total, 6);
    assert!(!page.has_more());
}

#[tokio::test]
async fn test_small_page_size_shows_gap() {
    let directory = test_directory_with(DirectoryConfig::default().with_page_size(2)).await;
    create_numbered_users(&directory, 40).await;
    let admin = admin(&directory).await;

    let page = directory
        .list_users(&admin, UserQuery::new(), directory.page(1))
        .await
        .unwrap();
    assert_eq!(page.total_pages(), 21);

    let links = page.pagination().links();
    assert!(links.contains(&PageLink::Gap));
    assert!(links.contains(&PageLink::Page {
        number: 21,
        current: false
    }));
    assert!(links.contains(&PageLink::Page {
        number: 1,
        current: true
    }));
    assert!(
        links
            .windows(2)
            .all(|pair| !(pair[0] == PageLink::Gap && pair[1] == PageLink::Gap))
    );
}
