//! Directory queries: search and role filters, page requests and result pages.
//!
//! Stores evaluate a [`UserQuery`] and return a [`UserPage`]. The in-memory
//! store uses [`UserQuery::matches`] and [`paginate`] directly; the SQL store
//! translates the same rules into a `WHERE` clause and must agree with them.

use std::cmp::Ordering;

use serde::Serialize;

use crate::config::SearchMode;
use crate::pagination::Pagination;
use crate::user::{Role, User, UserId};

/// Filters for a directory listing. Both filters are conjunctive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    /// Substring matched against email, mundane name and SCA name.
    pub search: Option<String>,
    pub role: Option<Role>,
}

impl UserQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// The unfiltered listing.
    pub fn cleared() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Trim the search term; a blank term means no search.
    pub fn normalized(self) -> Self {
        Self {
            search: crate::user::validation::normalize_optional(self.search.as_deref()),
            role: self.role,
        }
    }

    pub fn is_filtered(&self) -> bool {
        self.search.is_some() || self.role.is_some()
    }

    /// Whether `user` belongs in the listing for this query.
    ///
    /// Expects a normalized query.
    pub fn matches(&self, user: &User, mode: SearchMode) -> bool {
        if let Some(role) = self.role
            && !user.has_role(role)
        {
            return false;
        }

        match &self.search {
            None => true,
            Some(term) => {
                mode.contains(&user.email, term)
                    || mode.contains(&user.mundane_name, term)
                    || user
                        .sca_name
                        .as_deref()
                        .is_some_and(|sca| mode.contains(sca, term))
            }
        }
    }
}

/// Listing order shared by every store: mundane name, then id.
pub fn listing_order(a: &User, b: &User) -> Ordering {
    a.mundane_name
        .cmp(&b.mundane_name)
        .then_with(|| a.id.cmp(&b.id))
}

/// A 1-based page of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub per_page: usize,
}

impl PageRequest {
    /// Page 0 is treated as page 1 and a zero page size as one.
    pub fn new(page: usize, per_page: usize) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn first(per_page: usize) -> Self {
        Self::new(1, per_page)
    }

    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

/// One page of matching users plus the total match count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPage {
    pub items: Vec<User>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
}

impl UserPage {
    pub fn has_more(&self) -> bool {
        self.page.saturating_mul(self.per_page) < self.total
    }

    /// At least one, so an empty listing still has a page to show.
    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.per_page).max(1)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn rows(&self) -> Vec<UserRow> {
        self.items.iter().map(UserRow::from).collect()
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.total_pages())
    }
}

/// Slice an already filtered and ordered list into a page.
pub fn paginate(users: Vec<User>, request: PageRequest) -> UserPage {
    let total = users.len();
    let items = users
        .into_iter()
        .skip(request.offset())
        .take(request.per_page)
        .collect();

    UserPage {
        items,
        page: request.page,
        per_page: request.per_page,
        total,
    }
}

/// What the listing view shows for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRow {
    pub id: UserId,
    pub roles: Vec<&'static str>,
    pub display_name: String,
    pub mundane_name: String,
    pub email: String,
    pub tracks: String,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            roles: user.roles.labels(),
            display_name: user.display_name().to_string(),
            mundane_name: user.mundane_name.clone(),
            email: user.email.clone(),
            tracks: user.tracks_display(),
        }
    }
}
