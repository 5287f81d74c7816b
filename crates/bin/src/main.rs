use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

mod backend;
mod cli;
mod commands;
mod output;
mod session;
mod templates;

use cli::{Cli, Commands, UsersCommand};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("instructable=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve(args)) => commands::serve::run(&args).await,
        Some(Commands::Users(UsersCommand::List(args))) => commands::users::list(&args).await,
        Some(Commands::Users(UsersCommand::Create(args))) => commands::users::create(&args).await,
        Some(Commands::Health(args)) => commands::health::run(&args).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}
