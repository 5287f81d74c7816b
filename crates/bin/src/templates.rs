//! HTML templates for web interface
//!
//! Simple inline HTML templates without a template engine. Every value that
//! came from a user or the store goes through [`html_escape`].

use instructable::{
    edit::EditForm,
    pagination::PageLink,
    query::{UserPage, UserQuery, UserRow},
    user::{Role, User},
};
use url::form_urlencoded;

/// Common CSS styles for all pages
const COMMON_STYLES: &str = r#"
    body {
        font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
        max-width: 1100px;
        margin: 40px auto;
        padding: 0 20px;
        background: #f5f5f5;
    }
    .container {
        background: white;
        padding: 30px;
        border-radius: 8px;
        box-shadow: 0 2px 4px rgba(0,0,0,0.1);
    }
    h1 {
        color: #333;
        border-bottom: 2px solid #0066cc;
        padding-bottom: 10px;
    }
    .nav {
        text-align: right;
        color: #666;
        margin-bottom: 10px;
    }
    .form-group {
        margin: 15px 0;
    }
    label {
        display: block;
        font-weight: bold;
        margin-bottom: 5px;
        color: #333;
    }
    .filter label, .filter input, .filter select {
        display: inline-block;
        width: auto;
        margin-right: 8px;
    }
    input[type="text"],
    input[type="email"],
    input[type="password"] {
        width: 100%;
        padding: 10px;
        border: 1px solid #ddd;
        border-radius: 4px;
        font-size: 14px;
        box-sizing: border-box;
    }
    button {
        background: #0066cc;
        color: white;
        padding: 10px 20px;
        border: none;
        border-radius: 4px;
        cursor: pointer;
        font-size: 14px;
        font-weight: bold;
    }
    button:hover {
        background: #0052a3;
    }
    .logout-btn {
        background: #999;
        padding: 4px 10px;
    }
    table {
        width: 100%;
        border-collapse: collapse;
        margin: 20px 0;
    }
    th, td {
        text-align: left;
        padding: 12px;
        border-bottom: 1px solid #ddd;
        vertical-align: top;
    }
    th {
        background: #f0f0f0;
        color: #333;
    }
    .badge {
        display: inline-block;
        background: #5bc0de;
        color: white;
        font-size: 12px;
        padding: 2px 6px;
        border-radius: 3px;
        margin: 0 2px 2px 0;
    }
    .email {
        color: #666;
        font-size: 13px;
    }
    .pagination {
        list-style: none;
        padding: 0;
    }
    .pagination li {
        display: inline-block;
        margin-right: 4px;
    }
    .pagination .active span {
        font-weight: bold;
    }
    .flash {
        color: #3c763d;
        background: #dff0d8;
        padding: 10px;
        border-radius: 4px;
        margin: 10px 0;
    }
    .error, .field-error {
        color: #d9534f;
    }
    .error {
        background: #f2dede;
        padding: 10px;
        border-radius: 4px;
        margin: 10px 0;
    }
"#;

fn layout(title: &str, current_user: Option<&User>, flash: Option<&str>, body: &str) -> String {
    let nav = current_user.map_or(String::new(), |user| {
        format!(
            r#"<div class="nav">Signed in as {}
            <form method="POST" action="/logout" style="display: inline;">
                <button type="submit" class="logout-btn">Sign out</button>
            </form>
        </div>"#,
            html_escape(user.display_name())
        )
    });
    let flash = flash.map_or(String::new(), |message| {
        format!(r#"<div class="flash">{}</div>"#, html_escape(message))
    });
    let title = html_escape(title);

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Instructable - {title}</title>
    <style>{COMMON_STYLES}</style>
</head>
<body>
    <div class="container">
        {nav}
        {flash}
        {body}
    </div>
</body>
</html>"#
    )
}

/// Render the sign-in page
pub fn login_page(error: Option<&str>, email: &str) -> String {
    let error_html = error.map_or(String::new(), |e| {
        format!(r#"<div class="error">{}</div>"#, html_escape(e))
    });
    let email = html_escape(email);

    let body = format!(
        r#"<h1>Sign in</h1>
        {error_html}
        <form method="POST" action="/login">
            <div class="form-group">
                <label for="email">Email address</label>
                <input type="email" id="email" name="email" value="{email}" required autofocus>
            </div>
            <div class="form-group">
                <label for="password">Password</label>
                <input type="password" id="password" name="password">
            </div>
            <button type="submit">Sign in</button>
        </form>"#
    );
    layout("Sign in", None, None, &body)
}

/// Render the user listing
pub fn users_page(
    current_user: &User,
    query: &UserQuery,
    page: &UserPage,
    flash: Option<&str>,
) -> String {
    let rows = page.rows();
    let table = if rows.is_empty() {
        r#"<p class="empty" style="color: #666; font-style: italic;">No users found.</p>"#
            .to_string()
    } else {
        let rows: String = rows.iter().map(user_row).collect();
        format!(
            r#"<table class="users">
            <tr>
                <th>Roles</th>
                <th>Name</th>
                <th>Tracks</th>
            </tr>
            {rows}
        </table>"#
        )
    };

    let body = format!(
        r#"<h1>Users</h1>
        {filter}
        <p class="summary">{total} {noun}</p>
        {table}
        {pagination}"#,
        filter = filter_form(query),
        total = page.total,
        noun = if page.total == 1 { "user" } else { "users" },
        pagination = pagination_links(page, query),
    );
    layout("Users", Some(current_user), flash, &body)
}

fn filter_form(query: &UserQuery) -> String {
    let search = html_escape(query.search.as_deref().unwrap_or(""));
    let any_selected = if query.role.is_none() { " selected" } else { "" };
    let options: String = Role::ALL
        .iter()
        .map(|role| {
            let selected = if query.role == Some(*role) { " selected" } else { "" };
            format!(
                r#"<option value="{}"{selected}>{}</option>"#,
                role.as_str(),
                html_escape(role.label())
            )
        })
        .collect();

    format!(
        r#"<form method="GET" action="/admin/users" class="filter">
            <label for="search">Search</label>
            <input type="text" id="search" name="search" value="{search}">
            <label for="role">Role</label>
            <select id="role" name="role">
                <option value=""{any_selected}>Any role</option>
                {options}
            </select>
            <button type="submit">Filter</button>
            <a href="/admin/users?clear=1">Clear</a>
        </form>"#
    )
}

fn user_row(row: &UserRow) -> String {
    let badges: String = row
        .roles
        .iter()
        .map(|label| format!(r#"<span class="badge">{}</span>"#, html_escape(label)))
        .collect();

    format!(
        r#"<tr id="user_{id}">
                <td class="roles">{badges}</td>
                <td class="display_name"><a id="edit_user_{id}" href="/admin/users/{id}/edit">{name}</a><br><span class="email">{email}</span></td>
                <td class="tracks">{tracks}</td>
            </tr>"#,
        id = row.id,
        name = html_escape(&row.display_name),
        email = html_escape(&row.email),
        tracks = html_escape(&row.tracks),
    )
}

/// Listing URL for `page`, keeping the active filters.
pub fn listing_href(query: &UserQuery, page: usize) -> String {
    let mut params = form_urlencoded::Serializer::new(String::new());
    if let Some(search) = &query.search {
        params.append_pair("search", search);
    }
    if let Some(role) = query.role {
        params.append_pair("role", role.as_str());
    }
    params.append_pair("page", &page.to_string());
    format!("/admin/users?{}", params.finish())
}

fn pagination_links(page: &UserPage, query: &UserQuery) -> String {
    let links = page.pagination().links();
    if links.is_empty() {
        return String::new();
    }

    let items: String = links
        .iter()
        .map(|link| match *link {
            PageLink::Previous { number } => format!(
                r#"<li class="prev"><a href="{}" rel="prev">&larr; Previous</a></li>"#,
                html_escape(&listing_href(query, number))
            ),
            PageLink::Page {
                number,
                current: true,
            } => format!(r#"<li class="active"><span>{number}</span></li>"#),
            PageLink::Page { number, .. } => format!(
                r#"<li><a href="{}">{number}</a></li>"#,
                html_escape(&listing_href(query, number))
            ),
            PageLink::Gap => r#"<li class="gap disabled"><span>&hellip;</span></li>"#.to_string(),
            PageLink::Next { number } => format!(
                r#"<li class="next"><a href="{}" rel="next">Next &rarr;</a></li>"#,
                html_escape(&listing_href(query, number))
            ),
        })
        .collect();

    format!(r#"<ul class="pagination">{items}</ul>"#)
}

/// Render the profile edit form, with any field errors next to their inputs
pub fn edit_page(current_user: &User, form: &EditForm) -> String {
    let summary = if form.has_errors() {
        let items: String = form
            .errors
            .iter()
            .map(|(field, message)| {
                format!(
                    "<li>{} {}</li>",
                    html_escape(field_label(field)),
                    html_escape(message)
                )
            })
            .collect();
        format!(r#"<div class="error"><ul>{items}</ul></div>"#)
    } else {
        String::new()
    };

    let body = format!(
        r#"<h1>{title}</h1>
        {summary}
        <form method="POST" action="/admin/users/{id}">
            {email}
            {mundane_name}
            {sca_name}
            <button type="submit">Update user</button>
        </form>
        <p><a href="/admin/users">Back to users</a></p>"#,
        title = html_escape(&form.title),
        id = form.id,
        email = text_field(form, "email", "email", &form.email),
        mundane_name = text_field(form, "mundane_name", "text", &form.mundane_name),
        sca_name = text_field(form, "sca_name", "text", &form.sca_name),
    );
    layout(&form.title, Some(current_user), None, &body)
}

fn field_label(field: &str) -> &'static str {
    match field {
        "email" => "Email address",
        "mundane_name" => "Mundane name",
        "sca_name" => "SCA name",
        _ => "Field",
    }
}

fn text_field(form: &EditForm, name: &str, input_type: &str, value: &str) -> String {
    let errors: String = form
        .errors
        .messages(name)
        .iter()
        .map(|message| format!(r#"<span class="field-error">{}</span>"#, html_escape(message)))
        .collect();

    format!(
        r#"<div class="form-group">
                <label for="user_{name}">{label}</label>
                <input type="{input_type}" id="user_{name}" name="{name}" value="{value}">
                {errors}
            </div>"#,
        label = field_label(name),
        value = html_escape(value),
    )
}

/// 403 page. Reveals nothing about the requested resource.
pub fn not_authorized_page(current_user: Option<&User>) -> String {
    let body = r#"<h1>Not authorized</h1>
        <p>You are not allowed to view this page.</p>
        <p><a href="/login">Sign in as a different user</a></p>"#;
    layout("Not authorized", current_user, None, body)
}

pub fn not_found_page(current_user: Option<&User>, message: &str) -> String {
    let body = format!(
        r#"<h1>{}</h1>
        <p><a href="/admin/users">Back to users</a></p>"#,
        html_escape(message)
    );
    layout(message, current_user, None, &body)
}

pub fn bad_request_page(message: &str) -> String {
    let body = format!(
        r#"<h1>Bad request</h1>
        <p class="error">{}</p>"#,
        html_escape(message)
    );
    layout("Bad request", None, None, &body)
}

pub fn error_page() -> String {
    let body = r#"<h1>Something went wrong</h1>
        <p>The request could not be completed. Please try again.</p>"#;
    layout("Error", None, None, body)
}

/// Escape HTML special characters
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
