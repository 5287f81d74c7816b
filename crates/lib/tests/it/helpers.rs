use std::sync::Arc;

use instructable::{
    Actor, DirectoryConfig, UserDirectory,
    store::{InMemoryStore, UserStore},
    user::{NewUser, Role, Track, User},
};

// ==========================
// CORE TEST FACTORIES
// ==========================

/// Creates a test store based on the TEST_BACKEND env var.
///
/// Supported values:
/// - "inmemory" or unset: InMemoryStore (default)
/// - "sqlite": SQLite in-memory store (requires `sqlite` feature)
/// - "postgres": PostgreSQL store in an isolated schema (requires `postgres`
///   feature and TEST_POSTGRES_URL)
///
/// ```bash
/// TEST_BACKEND=sqlite cargo test
/// TEST_BACKEND=postgres TEST_POSTGRES_URL="postgres://localhost/instructable_test" cargo test
/// ```
pub async fn test_store() -> Arc<dyn UserStore> {
    match std::env::var("TEST_BACKEND").as_deref() {
        Ok("sqlite") => {
            #[cfg(feature = "sqlite")]
            {
                Arc::new(
                    instructable::store::SqlxStore::sqlite_in_memory()
                        .await
                        .expect("Failed to create SQLite store"),
                )
            }
            #[cfg(not(feature = "sqlite"))]
            {
                panic!("TEST_BACKEND=sqlite requires the 'sqlite' feature to be enabled")
            }
        }
        Ok("postgres") => {
            #[cfg(feature = "postgres")]
            {
                let url = std::env::var("TEST_POSTGRES_URL")
                    .unwrap_or_else(|_| "postgres://localhost/instructable_test".to_string());
                Arc::new(
                    instructable::store::SqlxStore::connect_postgres_isolated(&url)
                        .await
                        .expect("Failed to connect to PostgreSQL"),
                )
            }
            #[cfg(not(feature = "postgres"))]
            {
                panic!("TEST_BACKEND=postgres requires the 'postgres' feature to be enabled")
            }
        }
        Ok("inmemory") | Ok("") | Err(_) => Arc::new(InMemoryStore::new()),
        Ok(other) => {
            panic!("Unknown TEST_BACKEND value: {other}. Supported: inmemory, sqlite, postgres")
        }
    }
}

/// Every store that can run without external services.
///
/// Used by tests that check the implementations agree with each other.
pub async fn local_stores() -> Vec<Arc<dyn UserStore>> {
    #[allow(unused_mut)]
    let mut stores: Vec<Arc<dyn UserStore>> = vec![Arc::new(InMemoryStore::new())];
    #[cfg(feature = "sqlite")]
    stores.push(Arc::new(
        instructable::store::SqlxStore::sqlite_in_memory()
            .await
            .expect("Failed to create SQLite store"),
    ));
    stores
}

/// A directory over [`test_store`] with the default configuration.
pub async fn test_directory() -> UserDirectory {
    UserDirectory::new(test_store().await)
}

pub async fn test_directory_with(config: DirectoryConfig) -> UserDirectory {
    UserDirectory::with_config(test_store().await, config)
}

// ==========================
// FIXTURES
// ==========================

/// Creates a user or panics.
pub async fn create(directory: &UserDirectory, new_user: NewUser) -> User {
    directory
        .create_user(new_user)
        .await
        .expect("Failed to create user")
}

/// A signed-in admin with persona name `adminofdoom`.
pub async fn admin(directory: &UserDirectory) -> Actor {
    let user = create(
        directory,
        NewUser::new("Admin Person", "admin@example.com")
            .with_sca_name("adminofdoom")
            .with_role(Role::Admin)
            .with_role(Role::Coordinator),
    )
    .await;
    Actor::User(user)
}

/// A signed-in user holding only `role`.
pub async fn actor_with_role(directory: &UserDirectory, role: Role) -> Actor {
    let user = create(
        directory,
        NewUser::new(
            format!("{} person", role.label()),
            format!("{}@example.com", role.as_str()),
        )
        .with_role(role),
    )
    .await;
    Actor::User(user)
}

/// The search fixture set: returns the admin actor and every user created.
pub async fn search_fixtures(directory: &UserDirectory) -> (Actor, Vec<User>) {
    let admin = admin(directory).await;
    let mut users = vec![admin.user().cloned().expect("admin is signed in")];

    let fixtures = [
        NewUser::new("mundaneflarg", "flargemail@example.com")
            .with_sca_name("scaflarg")
            .with_role(Role::Instructor),
        NewUser::new("mundanebaz", "bazemail@example.com")
            .with_sca_name("scabaz")
            .with_role(Role::Instructor),
        NewUser::new("notateacher", "notateacher@example.com"),
        NewUser::new("proofer", "proofer@example.com").with_role(Role::Proofreader),
        NewUser::new("tracker", "tracker@example.com").with_track(Track::MiddleEastern),
        NewUser::new("pu-staffer", "pu-staffer@example.com").with_role(Role::PuStaff),
    ];
    for fixture in fixtures {
        users.push(create(directory, fixture).await);
    }

    (admin, users)
}

/// Creates `count` plain users named `user001`, `user002`, ...
pub async fn create_numbered_users(directory: &UserDirectory, count: usize) -> Vec<User> {
    let mut users = Vec::with_capacity(count);
    for i in 1..=count {
        users.push(
            create(
                directory,
                NewUser::new(format!("user{i:03}"), format!("user{i:03}@example.com")),
            )
            .await,
        );
    }
    users
}

/// Mundane names in the order they were listed.
pub fn names(users: &[User]) -> Vec<&str> {
    users.iter().map(|u| u.mundane_name.as_str()).collect()
}
