//! Foreman CLI entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use foreman::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { force } => foreman::cli::commands::init::execute(force, cli.json).await,
        Commands::Task(command) => foreman::cli::commands::task::execute(command, cli.json).await,
        Commands::Team => foreman::cli::commands::team::execute(cli.json).await,
        Commands::Plan => foreman::cli::commands::run::execute_plan(cli.json).await,
        Commands::Run { cap, gate_tasks } => {
            foreman::cli::commands::run::execute(cap, gate_tasks, cli.json).await
        }
    };

    if let Err(err) = result {
        foreman::cli::handle_error(err, cli.json);
    }
}
