//! SQL-based user store.
//!
//! [`SqlxStore`] keeps users in a relational database through sqlx's
//! `AnyPool`, so a single implementation serves both dialects:
//!
//! - **SQLite** (feature: `sqlite`): embedded database, also used in-memory by tests
//! - **PostgreSQL** (feature: `postgres`)
//!
//! The schema is created on connect. See [`schema`] for the table layout and
//! the migration system.

/// Schema definition and migration system.
pub mod schema;

use std::any::Any;
use std::collections::BTreeSet;
#[cfg(feature = "postgres")]
use std::time::Duration;

use async_trait::async_trait;
use sqlx::any::{AnyPoolOptions, AnyRow};
#[cfg(feature = "postgres")]
use sqlx::Executor;
use sqlx::{AnyPool, Row};

use super::{StoreError, StoreKind, UserStore};
use crate::config::SearchMode;
use crate::query::{PageRequest, UserPage, UserQuery};
use crate::user::{NewUser, ProfileUpdate, Role, RoleSet, Track, User, UserId};
use crate::{Error, Result};

/// Extension trait for sqlx Result types to simplify error handling.
///
/// Converts sqlx errors to `StoreError::Sqlx` with a context message.
pub(crate) trait SqlxResultExt<T> {
    fn sql_context(self, context: &str) -> Result<T>;
}

impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn sql_context(self, context: &str) -> Result<T> {
        self.map_err(|e| {
            StoreError::Sqlx {
                reason: format!("{context}: {e}"),
                source: Some(e),
            }
            .into()
        })
    }
}

/// Database kind for SQL dialect selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    Sqlite,
    Postgres,
}

const SELECT_USER: &str = "SELECT id, mundane_name, sca_name, email, password_hash, \
     admin, coordinator, instructor, pu_staff, proofreader, tracks FROM users";

/// Columns a search term is matched against.
const SEARCH_COLUMNS: [&str; 3] = ["email", "mundane_name", "sca_name"];

/// A [`UserStore`] backed by SQLite or PostgreSQL.
pub struct SqlxStore {
    pool: AnyPool,
    kind: DbKind,
}

impl SqlxStore {
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn db_kind(&self) -> DbKind {
        self.kind
    }

    /// Build the `WHERE` clause for `query` and the value bound to `$1`.
    ///
    /// Role columns are interpolated from [`Role::as_str`]; user input only
    /// ever travels as a bound parameter.
    fn filter(&self, query: &UserQuery, mode: SearchMode) -> (String, Option<String>) {
        let mut conditions = Vec::new();

        if let Some(role) = query.role {
            conditions.push(format!("{} = 1", role.as_str()));
        }

        let mut term = None;
        if let Some(search) = &query.search {
            let (matchers, value): (Vec<String>, String) = match mode {
                SearchMode::CaseInsensitive => (
                    SEARCH_COLUMNS
                        .iter()
                        .map(|col| format!("LOWER({col}) LIKE $1 ESCAPE '\\'"))
                        .collect(),
                    format!("%{}%", escape_like(&search.to_lowercase())),
                ),
                SearchMode::CaseSensitive => {
                    let position = match self.kind {
                        DbKind::Sqlite => "instr",
                        DbKind::Postgres => "strpos",
                    };
                    (
                        SEARCH_COLUMNS
                            .iter()
                            .map(|col| format!("{position}({col}, $1) > 0"))
                            .collect(),
                        search.clone(),
                    )
                }
            };
            conditions.push(format!("({})", matchers.join(" OR ")));
            term = Some(value);
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        (clause, term)
    }

    /// Byte-wise ordering on both dialects, matching the in-memory store.
    fn order_by(&self) -> &'static str {
        match self.kind {
            DbKind::Sqlite => " ORDER BY mundane_name, id",
            DbKind::Postgres => " ORDER BY mundane_name COLLATE \"C\", id",
        }
    }
}

// SQLite-specific constructors
#[cfg(feature = "sqlite")]
impl SqlxStore {
    /// Open a SQLite database file, creating it and the schema if needed.
    pub async fn open_sqlite<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        // mode=rwc: read-write-create
        let url = format!("sqlite:{}?mode=rwc", path.as_ref().display());
        Self::connect_sqlite(&url).await
    }

    /// Connect to a SQLite database using a connection URL.
    pub async fn connect_sqlite(url: &str) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let is_in_memory = url.contains("mode=memory");

        // A shared-cache in-memory database disappears with its last
        // connection, so keep one open for the life of the pool.
        let pool = if is_in_memory {
            AnyPoolOptions::new()
                .max_connections(5)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect(url)
                .await
                .sql_context("Failed to connect to SQLite")?
        } else {
            AnyPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await
                .sql_context("Failed to connect to SQLite")?
        };

        let pragmas = if is_in_memory {
            "PRAGMA busy_timeout = 5000;"
        } else {
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;"
        };
        sqlx::query(pragmas)
            .execute(&pool)
            .await
            .sql_context("Failed to configure SQLite")?;

        let store = Self {
            pool,
            kind: DbKind::Sqlite,
        };
        schema::initialize(&store).await?;

        tracing::debug!(in_memory = is_in_memory, "SQLite user store ready");
        Ok(store)
    }

    /// A private in-memory SQLite database, dropped with the store.
    pub async fn sqlite_in_memory() -> Result<Self> {
        // Shared cache so every pooled connection sees the same database;
        // a unique name so separate stores never share one.
        let unique_id = uuid::Uuid::new_v4();
        let url = format!("sqlite:file:mem_{unique_id}?mode=memory&cache=shared");
        Self::connect_sqlite(&url).await
    }
}

// PostgreSQL-specific constructors
#[cfg(feature = "postgres")]
impl SqlxStore {
    /// Connect to a PostgreSQL database using a connection URL.
    ///
    /// Tables live in the default (public) schema.
    pub async fn connect_postgres(url: &str) -> Result<Self> {
        Self::connect_postgres_with_schema(url, None).await
    }

    /// Connect using a fresh, uniquely named schema.
    ///
    /// Tests use this so parallel runs never see each other's users.
    pub async fn connect_postgres_isolated(url: &str) -> Result<Self> {
        // Schema names must start with a letter.
        let schema = format!("test_{}", uuid::Uuid::new_v4().simple());
        Self::connect_postgres_with_schema(url, Some(schema)).await
    }

    async fn connect_postgres_with_schema(url: &str, schema: Option<String>) -> Result<Self> {
        sqlx::any::install_default_drivers();

        if let Some(schema) = &schema {
            let setup = AnyPoolOptions::new()
                .max_connections(1)
                .connect(url)
                .await
                .sql_context("Failed to connect to PostgreSQL")?;
            sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {schema}"))
                .execute(&setup)
                .await
                .sql_context(&format!("Failed to create schema {schema}"))?;
            setup.close().await;
        }

        let mut options = AnyPoolOptions::new();
        options = if schema.is_some() {
            options
                .max_connections(2)
                .acquire_timeout(Duration::from_secs(30))
        } else {
            options.max_connections(5)
        };

        // search_path is per connection, so set it on every new one.
        let pool = options
            .after_connect(move |conn, _meta| {
                let schema = schema.clone();
                Box::pin(async move {
                    if let Some(schema) = schema {
                        conn.execute(format!("SET search_path TO {schema}").as_str())
                            .await?;
                    }
                    Ok(())
                })
            })
            .connect(url)
            .await
            .sql_context("Failed to connect to PostgreSQL")?;

        let store = Self {
            pool,
            kind: DbKind::Postgres,
        };
        schema::initialize(&store).await?;

        Ok(store)
    }
}

/// Escape `LIKE` wildcards so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn bool_flag(enabled: bool) -> i64 {
    i64::from(enabled)
}

/// Map a failed write, turning a unique-index hit into `EmailTaken`.
fn write_error(err: sqlx::Error, email: &str, context: &str) -> Error {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.is_unique_violation()
    {
        return StoreError::EmailTaken {
            email: email.to_string(),
        }
        .into();
    }
    StoreError::Sqlx {
        reason: format!("{context}: {err}"),
        source: Some(err),
    }
    .into()
}

fn user_from_row(row: &AnyRow) -> Result<User> {
    let id = UserId(row.try_get::<i64, _>("id").sql_context("Failed to read user id")?);
    let text = |column: &str| -> Result<String> {
        row.try_get::<String, _>(column)
            .sql_context(&format!("Failed to read users.{column}"))
    };
    let optional = |value: String| if value.is_empty() { None } else { Some(value) };

    let mut roles = RoleSet::new();
    for role in Role::ALL {
        let flag: i64 = row
            .try_get(role.as_str())
            .sql_context(&format!("Failed to read users.{role}"))?;
        roles.set(role, flag != 0);
    }

    let tracks: BTreeSet<Track> =
        serde_json::from_str(&text("tracks")?).map_err(|e| StoreError::CorruptRecord {
            id,
            reason: format!("tracks: {e}"),
        })?;

    Ok(User {
        id,
        mundane_name: text("mundane_name")?,
        sca_name: optional(text("sca_name")?),
        email: text("email")?,
        roles,
        tracks,
        password_hash: optional(text("password_hash")?),
    })
}

#[async_trait]
impl UserStore for SqlxStore {
    fn kind(&self) -> StoreKind {
        match self.kind {
            DbKind::Sqlite => StoreKind::Sqlite,
            DbKind::Postgres => StoreKind::Postgres,
        }
    }

    async fn get(&self, id: UserId) -> Result<User> {
        let row = sqlx::query(&format!("{SELECT_USER} WHERE id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .sql_context("Failed to fetch user")?
            .ok_or(StoreError::UserNotFound { id })?;
        user_from_row(&row)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("{SELECT_USER} WHERE LOWER(email) = LOWER($1)"))
            .bind(email.trim().to_string())
            .fetch_optional(&self.pool)
            .await
            .sql_context("Failed to look up user by email")?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn create(&self, user: NewUser, password_hash: Option<String>) -> Result<User> {
        if self.find_by_email(&user.email).await?.is_some() {
            return Err(StoreError::EmailTaken { email: user.email }.into());
        }

        let tracks = serde_json::to_string(&user.tracks)
            .map_err(|e| -> Error { StoreError::SerializationFailed { source: e }.into() })?;

        let row = sqlx::query(
            "INSERT INTO users (mundane_name, sca_name, email, password_hash, \
             admin, coordinator, instructor, pu_staff, proofreader, tracks) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING id",
        )
        .bind(user.mundane_name.clone())
        .bind(user.sca_name.clone().unwrap_or_default())
        .bind(user.email.clone())
        .bind(password_hash.clone().unwrap_or_default())
        .bind(bool_flag(user.roles.contains(Role::Admin)))
        .bind(bool_flag(user.roles.contains(Role::Coordinator)))
        .bind(bool_flag(user.roles.contains(Role::Instructor)))
        .bind(bool_flag(user.roles.contains(Role::PuStaff)))
        .bind(bool_flag(user.roles.contains(Role::Proofreader)))
        .bind(tracks)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, &user.email, "Failed to insert user"))?;

        let id = UserId(row.try_get::<i64, _>("id").sql_context("Failed to read new user id")?);
        tracing::debug!(%id, "Inserted user");

        Ok(User {
            id,
            mundane_name: user.mundane_name,
            sca_name: user.sca_name,
            email: user.email,
            roles: user.roles,
            tracks: user.tracks,
            password_hash,
        })
    }

    async fn update_profile(&self, id: UserId, update: &ProfileUpdate) -> Result<User> {
        if let Some(owner) = self.find_by_email(&update.email).await?
            && owner.id != id
        {
            return Err(StoreError::EmailTaken {
                email: update.email.clone(),
            }
            .into());
        }

        let result =
            sqlx::query("UPDATE users SET email = $1, mundane_name = $2, sca_name = $3 WHERE id = $4")
                .bind(update.email.clone())
                .bind(update.mundane_name.clone())
                .bind(update.sca_name.clone().unwrap_or_default())
                .bind(id.0)
                .execute(&self.pool)
                .await
                .map_err(|e| write_error(e, &update.email, "Failed to update user"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::UserNotFound { id }.into());
        }

        self.get(id).await
    }

    async fn list(
        &self,
        query: &UserQuery,
        mode: SearchMode,
        page: PageRequest,
    ) -> Result<UserPage> {
        let (where_sql, term) = self.filter(query, mode);

        let count_sql = format!("SELECT COUNT(*) FROM users{where_sql}");
        let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql);
        if let Some(term) = &term {
            count_query = count_query.bind(term.clone());
        }
        let (total,) = count_query
            .fetch_one(&self.pool)
            .await
            .sql_context("Failed to count users")?;
        let total = usize::try_from(total).unwrap_or(0);

        // Past the last row, or further than a BIGINT offset reaches.
        let offset = match i64::try_from(page.offset()) {
            Ok(offset) if page.offset() < total => offset,
            _ => {
                return Ok(UserPage {
                    items: Vec::new(),
                    page: page.page,
                    per_page: page.per_page,
                    total,
                });
            }
        };
        let limit = i64::try_from(page.per_page).unwrap_or(i64::MAX);

        let limit_param = if term.is_some() { 2 } else { 1 };
        let list_sql = format!(
            "{SELECT_USER}{where_sql}{} LIMIT ${limit_param} OFFSET ${}",
            self.order_by(),
            limit_param + 1
        );
        let mut list_query = sqlx::query(&list_sql);
        if let Some(term) = term {
            list_query = list_query.bind(term);
        }
        let rows = list_query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .sql_context("Failed to list users")?;

        let items = rows.iter().map(user_from_row).collect::<Result<Vec<_>>>()?;

        Ok(UserPage {
            items,
            page: page.page,
            per_page: page.per_page,
            total,
        })
    }

    async fn count(&self) -> Result<usize> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .sql_context("Failed to count users")?;
        Ok(total as usize)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
