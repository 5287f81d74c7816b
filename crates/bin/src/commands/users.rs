//! User management commands.
//!
//! The operator running the CLI has direct access to the store and acts as
//! an administrator.

use serde::Serialize;

use instructable::{
    DirectoryConfig, SearchMode, UserDirectory,
    query::{PageRequest, UserPage, UserQuery, UserRow},
    user::NewUser,
};

use crate::backend::{create_store, data_dir, save_if_in_memory};
use crate::cli::{CreateArgs, ListArgs};
use crate::output::{OutputFormat, print_json, print_table};

#[derive(Serialize)]
struct ListingJson {
    page: usize,
    total_pages: usize,
    total: usize,
    users: Vec<UserRow>,
}

impl From<&UserPage> for ListingJson {
    fn from(page: &UserPage) -> Self {
        Self {
            page: page.page,
            total_pages: page.total_pages(),
            total: page.total,
            users: page.rows(),
        }
    }
}

/// Run the `users list` command
pub async fn list(args: &ListArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = create_store(&args.store).await?;

    let mut query = UserQuery::new();
    if let Some(search) = &args.search {
        query = query.with_search(search.as_str());
    }
    if let Some(role) = args.role {
        query = query.with_role(role);
    }
    let mode = if args.case_sensitive_search {
        SearchMode::CaseSensitive
    } else {
        SearchMode::CaseInsensitive
    };
    let request = PageRequest::new(args.page, args.page_size);

    let page = store.list(&query.normalized(), mode, request).await?;

    match args.format {
        OutputFormat::Human => {
            if page.is_empty() {
                println!("No users found.");
                return Ok(());
            }
            print_table(&["ID", "ROLES", "NAME", "EMAIL", "TRACKS"], &table_rows(&page));
            println!();
            println!(
                "Page {} of {} ({} {})",
                page.page,
                page.total_pages(),
                page.total,
                if page.total == 1 { "user" } else { "users" }
            );
        }
        OutputFormat::Json => print_json(&ListingJson::from(&page))?,
    }

    Ok(())
}

fn table_rows(page: &UserPage) -> Vec<Vec<String>> {
    page.rows()
        .into_iter()
        .map(|row| {
            let roles = if row.roles.is_empty() {
                "-".to_string()
            } else {
                row.roles.join(",")
            };
            vec![
                row.id.to_string(),
                roles,
                row.display_name,
                row.email,
                row.tracks,
            ]
        })
        .collect()
}

fn new_user(args: &CreateArgs) -> NewUser {
    let mut new_user = NewUser::new(args.mundane_name.as_str(), args.email.as_str());
    if let Some(sca_name) = &args.sca_name {
        new_user = new_user.with_sca_name(sca_name.as_str());
    }
    if let Some(password) = &args.password {
        new_user = new_user.with_password(password.as_str());
    }
    for role in &args.roles {
        new_user = new_user.with_role(*role);
    }
    for track in &args.tracks {
        new_user = new_user.with_track(*track);
    }
    new_user
}

/// Run the `users create` command
pub async fn create(args: &CreateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = create_store(&args.store).await?;
    let directory = UserDirectory::with_config(store.clone(), DirectoryConfig::default());

    let user = directory.create_user(new_user(args)).await?;
    save_if_in_memory(store.as_ref(), &data_dir(&args.store)).await?;

    println!("Created user {} ({})", user.id, user.display_name());
    if user.password_hash.is_none() {
        println!("No password set; this account cannot sign in to the web interface.");
    }
    Ok(())
}
