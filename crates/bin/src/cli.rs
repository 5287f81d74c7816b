//! CLI argument definitions for the Instructable binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use instructable::user::{Role, Track, ValidationError};

use crate::output::OutputFormat;

/// Storage backend type
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Backend {
    /// SQLite database (default)
    Sqlite,
    /// PostgreSQL database
    Postgres,
    /// In-memory with JSON persistence (for development and demos)
    Inmemory,
}

/// Instructable user administration
#[derive(Parser, Debug)]
#[command(name = "instructable")]
#[command(about = "Instructable: user administration for class scheduling")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the web server
    Serve(ServeArgs),
    /// Manage user accounts from the command line
    #[command(subcommand)]
    Users(UsersCommand),
    /// Check health of a running Instructable server
    Health(HealthArgs),
}

/// Where users are stored. Shared by every command that opens the store.
#[derive(clap::Args, Debug, Clone)]
pub struct StoreArgs {
    /// Storage backend to use
    #[arg(short, long, default_value = "sqlite", env = "INSTRUCTABLE_BACKEND")]
    pub backend: Backend,

    /// Data directory for storage files.
    /// For SQLite: stores instructable.db
    /// For InMemory: stores instructable.json
    #[arg(short = 'D', long, env = "INSTRUCTABLE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// PostgreSQL connection URL (required when backend=postgres)
    #[arg(long, env = "INSTRUCTABLE_POSTGRES_URL")]
    pub postgres_url: Option<String>,
}

/// Arguments for the serve command
#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = 3000, env = "INSTRUCTABLE_PORT")]
    pub port: u16,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0", env = "INSTRUCTABLE_HOST")]
    pub host: String,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Users shown per listing page
    #[arg(
        long,
        default_value_t = instructable::config::DEFAULT_PAGE_SIZE,
        env = "INSTRUCTABLE_PAGE_SIZE"
    )]
    pub page_size: usize,

    /// Match search terms case-sensitively
    #[arg(long, env = "INSTRUCTABLE_CASE_SENSITIVE_SEARCH")]
    pub case_sensitive_search: bool,
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// Print one page of the user listing
    List(ListArgs),
    /// Create a user account
    Create(CreateArgs),
}

/// Arguments for `users list`
#[derive(clap::Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Substring of email, mundane name or SCA name
    #[arg(short, long)]
    pub search: Option<String>,

    /// Only users holding this role
    #[arg(short, long, value_parser = parse_role)]
    pub role: Option<Role>,

    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Users per page
    #[arg(
        long,
        default_value_t = instructable::config::DEFAULT_PAGE_SIZE,
        env = "INSTRUCTABLE_PAGE_SIZE"
    )]
    pub page_size: usize,

    /// Match the search term case-sensitively
    #[arg(long, env = "INSTRUCTABLE_CASE_SENSITIVE_SEARCH")]
    pub case_sensitive_search: bool,

    #[arg(long, value_enum, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `users create`
#[derive(clap::Args, Debug)]
pub struct CreateArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub mundane_name: String,

    #[arg(long)]
    pub sca_name: Option<String>,

    /// Password for signing in to the web interface.
    /// Accounts without one cannot sign in.
    #[arg(long, env = "INSTRUCTABLE_USER_PASSWORD")]
    pub password: Option<String>,

    /// Role to grant; repeat for several
    #[arg(long = "role", value_parser = parse_role)]
    pub roles: Vec<Role>,

    /// Track by display name, e.g. "Middle Eastern"; repeat for several
    #[arg(long = "track", value_parser = parse_track)]
    pub tracks: Vec<Track>,
}

/// Arguments for the health command
#[derive(clap::Args, Debug)]
pub struct HealthArgs {
    /// Port of the server to check
    #[arg(short, long, default_value_t = 3000, env = "INSTRUCTABLE_PORT")]
    pub port: u16,

    /// Host of the server to check
    #[arg(long, default_value = "127.0.0.1", env = "INSTRUCTABLE_HOST")]
    pub host: String,

    /// Timeout in seconds
    #[arg(short, long, default_value_t = 5)]
    pub timeout: u64,
}

fn parse_role(value: &str) -> Result<Role, ValidationError> {
    value.parse()
}

fn parse_track(value: &str) -> Result<Track, ValidationError> {
    value.parse()
}
