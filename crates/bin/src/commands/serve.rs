//! Serve command - runs the Instructable web server.

use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tokio::signal::unix::{SignalKind, signal};
use tower_cookies::{Cookie, CookieManagerLayer, Cookies};

use instructable::{
    Actor, DirectoryConfig, SearchMode, UserDirectory, authz,
    edit::{EditOutcome, ProfileSubmission},
    query::UserQuery,
    user::{User, UserId, ValidationError},
};

use crate::backend::{create_store, data_dir, save_if_in_memory};
use crate::cli::ServeArgs;
use crate::session::SessionStore;
use crate::templates;

const SESSION_COOKIE: &str = "instructable_session";
const UPDATED_FLASH: &str = "User updated.";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    directory: UserDirectory,
    sessions: SessionStore,
}

impl AppState {
    pub fn new(directory: UserDirectory) -> Self {
        Self {
            directory,
            sessions: SessionStore::new(),
        }
    }
}

/// Sign-in form data
#[derive(Deserialize)]
struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// Query string of the listing page
#[derive(Debug, Default, Deserialize)]
struct ListParams {
    search: Option<String>,
    role: Option<String>,
    page: Option<String>,
    clear: Option<String>,
}

impl ListParams {
    fn query(&self) -> Result<UserQuery, ValidationError> {
        if self.clear.is_some() {
            return Ok(UserQuery::cleared());
        }
        let mut query = UserQuery::new();
        if let Some(search) = &self.search {
            query = query.with_search(search.as_str());
        }
        match self.role.as_deref().map(str::trim) {
            None | Some("") => {}
            Some(role) => query = query.with_role(role.parse()?),
        }
        Ok(query.normalized())
    }

    /// Requested page number. Missing or blank means the first page.
    fn page_number(&self) -> Result<usize, String> {
        match self.page.as_deref().map(str::trim) {
            None | Some("") => Ok(1),
            Some(page) => page
                .parse()
                .map_err(|_| format!("Invalid page number: {page}")),
        }
    }
}

/// The requester, as far as the session cookie tells us.
struct Visitor {
    token: Option<String>,
    actor: Actor,
}

/// Failures a handler turns into an error page.
enum AppError {
    NotAuthorized(Option<User>),
    NotFound(Option<User>),
    BadRequest(String),
    Internal(instructable::Error),
}

impl AppError {
    fn from_directory(err: instructable::Error, current_user: &User) -> Self {
        if err.is_permission_denied() {
            AppError::NotAuthorized(Some(current_user.clone()))
        } else if err.is_not_found() {
            AppError::NotFound(Some(current_user.clone()))
        } else {
            AppError::Internal(err)
        }
    }
}

impl From<instructable::Error> for AppError {
    fn from(err: instructable::Error) -> Self {
        AppError::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotAuthorized(user) => (
                StatusCode::FORBIDDEN,
                Html(templates::not_authorized_page(user.as_ref())),
            )
                .into_response(),
            AppError::NotFound(user) => (
                StatusCode::NOT_FOUND,
                Html(templates::not_found_page(user.as_ref(), "User not found")),
            )
                .into_response(),
            AppError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Html(templates::bad_request_page(&message)),
            )
                .into_response(),
            AppError::Internal(err) => {
                tracing::error!(module = err.module(), "Request failed: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(templates::error_page()),
                )
                    .into_response()
            }
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_root_request))
        .route("/health", get(handle_health_endpoint))
        .route("/login", get(handle_login_page).post(handle_login_submit))
        .route("/logout", post(handle_logout))
        .route("/admin/users", get(handle_user_list))
        .route("/admin/users/{id}/edit", get(handle_edit_form))
        .route("/admin/users/{id}", post(handle_user_update))
        .layer(CookieManagerLayer::new())
        .with_state(state)
}

/// Run the Instructable server
pub async fn run(args: &ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = create_store(&args.store).await?;

    let search_mode = if args.case_sensitive_search {
        SearchMode::CaseSensitive
    } else {
        SearchMode::CaseInsensitive
    };
    let config = DirectoryConfig::default()
        .with_page_size(args.page_size)
        .with_search_mode(search_mode);
    let directory = UserDirectory::with_config(store.clone(), config);
    tracing::info!(backend = %directory.store_kind(), ?config, "User directory ready");

    if store.count().await? == 0 {
        tracing::warn!(
            "No users yet; create an administrator with `instructable users create --role admin`"
        );
    }

    let app = router(AppState::new(directory));

    // Bind server
    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    println!("Instructable server started");
    println!();
    println!("Web Interface: http://localhost:{}", local_addr.port());
    println!();
    println!("Available endpoints:");
    println!("  GET  /                        - Redirect to sign-in or user listing");
    println!("  GET  /login                   - Sign-in page");
    println!("  POST /login                   - Sign-in submission");
    println!("  POST /logout                  - Sign out");
    println!("  GET  /admin/users             - User listing (admins only)");
    println!("  GET  /admin/users/{{id}}/edit   - Edit a user (admins only)");
    println!("  POST /admin/users/{{id}}        - Save a user (admins only)");
    println!("  GET  /health                  - Health check");
    println!();
    println!("Press Ctrl+C to shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Save users on shutdown (only needed for the in-memory store)
    match save_if_in_memory(store.as_ref(), &data_dir(&args.store)).await {
        Ok(true) => println!("\nUsers saved successfully"),
        Ok(false) => {}
        Err(e) => {
            tracing::error!("Failed to save users: {e}");
            eprintln!("Failed to save users: {e}");
        }
    }

    println!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let (mut sigterm, mut sigint) =
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!("Failed to set up signal handlers ({e}), waiting for Ctrl+C");
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Failed to listen for Ctrl+C: {e}");
                }
                return;
            }
        };

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("Received SIGTERM, initiating graceful shutdown..."),
        _ = sigint.recv() => tracing::info!("Received SIGINT, initiating graceful shutdown..."),
    }
}

async fn visitor(state: &AppState, cookies: &Cookies) -> Result<Visitor, AppError> {
    let token = cookies
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string());
    let user_id = match &token {
        Some(token) => state.sessions.get_user_id(token).await,
        None => None,
    };
    let actor = state.directory.resolve_actor(user_id).await?;
    Ok(Visitor { token, actor })
}

fn require_admin(actor: &Actor) -> Result<&User, AppError> {
    authz::require_admin(actor).map_err(|_| AppError::NotAuthorized(actor.user().cloned()))
}

// ============================================================================
// Authentication Handlers
// ============================================================================

/// Handler for GET / - Root redirect
async fn handle_root_request(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<Redirect, AppError> {
    let visitor = visitor(&state, &cookies).await?;
    if visitor.actor.is_signed_in() {
        Ok(Redirect::to("/admin/users"))
    } else {
        Ok(Redirect::to("/login"))
    }
}

/// Handler for GET /login - Show sign-in page
async fn handle_login_page(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<Response, AppError> {
    if visitor(&state, &cookies).await?.actor.is_signed_in() {
        return Ok(Redirect::to("/admin/users").into_response());
    }
    Ok(Html(templates::login_page(None, "")).into_response())
}

/// Handler for POST /login - Process sign-in
async fn handle_login_submit(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match state.directory.authenticate(&form.email, &form.password).await {
        Ok(user) => {
            let session_token = state.sessions.create_session(user.id).await;
            let mut cookie = Cookie::new(SESSION_COOKIE, session_token);
            cookie.set_http_only(true);
            cookie.set_path("/");
            cookies.add(cookie);
            Ok(Redirect::to("/admin/users").into_response())
        }
        Err(e) if e.is_authentication_error() => {
            tracing::info!("Failed sign-in attempt");
            Ok(Html(templates::login_page(Some(&e.to_string()), &form.email)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Handler for POST /logout - Sign out and destroy session
async fn handle_logout(State(state): State<AppState>, cookies: Cookies) -> Redirect {
    if let Some(cookie) = cookies.get(SESSION_COOKIE) {
        state.sessions.destroy_session(cookie.value()).await;
        let mut removal = Cookie::from(SESSION_COOKIE);
        removal.set_path("/");
        cookies.remove(removal);
        let active_sessions = state.sessions.session_count().await;
        tracing::debug!(active_sessions, "Signed out");
    }
    Redirect::to("/login")
}

// ============================================================================
// User Administration Handlers
// ============================================================================

/// Handler for GET /admin/users - Listing with search, role filter and pages
async fn handle_user_list(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(params): Query<ListParams>,
) -> Result<Response, AppError> {
    let visitor = visitor(&state, &cookies).await?;
    let admin = require_admin(&visitor.actor)?;

    let query = params
        .query()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let page_number = params.page_number().map_err(AppError::BadRequest)?;
    let page_request = state.directory.page(page_number);

    let page = state
        .directory
        .list_users(&visitor.actor, query.clone(), page_request)
        .await
        .map_err(|e| AppError::from_directory(e, admin))?;

    let flash = match &visitor.token {
        Some(token) => state.sessions.take_flash(token).await,
        None => None,
    };

    Ok(Html(templates::users_page(admin, &query, &page, flash.as_deref())).into_response())
}

/// Handler for GET /admin/users/{id}/edit - Show the edit form
async fn handle_edit_form(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let visitor = visitor(&state, &cookies).await?;
    let admin = require_admin(&visitor.actor)?;

    let form = state
        .directory
        .edit_form(&visitor.actor, UserId(id))
        .await
        .map_err(|e| AppError::from_directory(e, admin))?;

    Ok(Html(templates::edit_page(admin, &form)).into_response())
}

/// Handler for POST /admin/users/{id} - Save the edit form
async fn handle_user_update(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(id): Path<i64>,
    Form(submission): Form<ProfileSubmission>,
) -> Result<Response, AppError> {
    let visitor = visitor(&state, &cookies).await?;
    let admin = require_admin(&visitor.actor)?;

    let outcome = state
        .directory
        .update_user(&visitor.actor, UserId(id), submission)
        .await
        .map_err(|e| AppError::from_directory(e, admin))?;

    match outcome {
        EditOutcome::Saved(_) => {
            if let Some(token) = &visitor.token {
                state.sessions.set_flash(token, UPDATED_FLASH).await;
            }
            Ok(Redirect::to("/admin/users").into_response())
        }
        EditOutcome::Rejected(form) => Ok(Html(templates::edit_page(admin, &form)).into_response()),
    }
}

// ============================================================================
// Health Handler
// ============================================================================

/// Health check response
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    backend: &'static str,
}

/// Handler for GET /health - Health check endpoint
async fn handle_health_endpoint(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        backend: state.directory.store_kind().as_str(),
    })
}
