//! Docket CLI - query law-firm tasks from the command line or over HTTP

use anyhow::Context;
use clap::Parser;
use docket_cli::logging::init_logging;
use docket_cli::{init_database, print_response, run_query, server, Cli, Commands};
use docket_core::{SqliteTaskStore, TaskQueryService};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli.load_config().context("Failed to load configuration")?;
    let _guard = init_logging(&config.logging, cli.verbose)?;

    match cli.command {
        Commands::Init { demo } => {
            init_database(&config, demo)
                .await
                .with_context(|| format!("Failed to initialize {}", config.database.path.display()))?;
            info!("Database ready at {}", config.database.path.display());
            println!("Initialized {}", config.database.path.display());
        }
        Commands::Query {
            params,
            user_id,
            pretty,
        } => {
            let store = SqliteTaskStore::connect(&config.database).await?;
            let service = TaskQueryService::new(Arc::new(store), config);
            let (rendered, ok) = run_query(&service, &params, user_id, pretty).await?;
            print_response(&rendered, &mut std::io::stdout())?;
            if !ok {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let store = SqliteTaskStore::connect(&config.database).await?;
            let service = TaskQueryService::new(Arc::new(store), config);
            server::serve(service, &host, port)
                .await
                .with_context(|| format!("Server on {host}:{port} failed"))?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
