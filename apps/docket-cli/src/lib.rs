//! Docket CLI library
//!
//! Command definitions and the handlers behind the `docket` binary.

pub mod logging;
pub mod server;

use chrono::Utc;
use clap::{Parser, Subcommand};
use docket_core::test_utils::sample_tasks;
use docket_core::{
    ApiResponse, ConfigLoader, DocketError, QueryConfig, Result, SqliteTaskStore, Task,
    TaskQueryService, TaskStore,
};
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "docket")]
#[command(about = "Query law-firm tasks with filters, search and pagination")]
#[command(version)]
pub struct Cli {
    /// Configuration file (YAML or JSON)
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database path
    #[arg(long, short, global = true, env = "DOCKET_DATABASE_PATH")]
    pub database: Option<PathBuf>,

    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Create the database schema
    Init {
        /// Seed the database with example tasks
        #[arg(long)]
        demo: bool,
    },
    /// Run a task query and print the response envelope
    Query {
        /// Query parameters, e.g. `status=pending sortBy=dueDate`
        #[arg(value_parser = parse_key_value)]
        params: Vec<(String, String)>,
        /// Requesting user, for `myTasksOnly=true`
        #[arg(long, short)]
        user_id: Option<i64>,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Serve `GET /api/tasks` and `GET /health` over HTTP
    Serve {
        /// Address to bind, defaults to the configured host
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on, defaults to the configured port
        #[arg(long, short)]
        port: Option<u16>,
    },
}

/// Parse a `KEY=VALUE` argument
///
/// # Errors
/// Returns an error if the argument has no `=` or an empty key
pub fn parse_key_value(arg: &str) -> std::result::Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{arg}'")),
    }
}

impl Cli {
    /// Resolve configuration from the config file, environment and flags
    ///
    /// # Errors
    /// Returns an error if the configuration cannot be loaded or is invalid
    pub fn load_config(&self) -> Result<QueryConfig> {
        let mut loader = ConfigLoader::new();
        if let Some(path) = &self.config {
            loader = loader.add_config_path(path);
        }
        let mut config = loader.load()?;

        if let Some(path) = &self.database {
            config.database.path.clone_from(path);
        }
        if self.json_logs {
            config.logging.json = true;
        }
        Ok(config)
    }
}

/// Create the schema and optionally seed example tasks
///
/// # Errors
/// Returns an error if the database cannot be opened or written
pub async fn init_database(config: &QueryConfig, demo: bool) -> Result<SqliteTaskStore> {
    let store = SqliteTaskStore::connect(&config.database).await?;
    if demo {
        let tasks = sample_tasks(Utc::now());
        for task in &tasks {
            store.insert(task).await?;
        }
        info!("Seeded {} example tasks", tasks.len());
    }
    Ok(store)
}

/// Run a query and render the envelope
///
/// Returns the rendered JSON and whether the query succeeded.
///
/// # Errors
/// Returns an error only if the envelope cannot be serialized
pub async fn run_query<S: TaskStore>(
    service: &TaskQueryService<S>,
    params: &[(String, String)],
    user_id: Option<i64>,
    pretty: bool,
) -> Result<(String, bool)> {
    let query: HashMap<String, String> = params.iter().cloned().collect();
    let response: ApiResponse<Task> = service.execute_raw(&query, user_id).await.into();
    let ok = response.is_success();

    let rendered = if pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    Ok((rendered, ok))
}

/// Write a rendered envelope followed by a newline
///
/// # Errors
/// Returns an error if writing fails
pub fn print_response<W: Write>(rendered: &str, writer: &mut W) -> Result<()> {
    writeln!(writer, "{rendered}").map_err(DocketError::from)
}
