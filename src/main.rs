mod cli;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use concord::config::ConcordConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "concord", version, about = "Unified cross-interface memory MCP server")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server (transport from config: stdio or http)
    Serve {
        /// Keep everything in memory instead of the configured database
        #[arg(long)]
        ephemeral: bool,
    },
    /// Map an identifier (email, phone, ...) to a canonical user id
    Alias {
        alias: String,
        canonical_id: String,
    },
    /// Show the context window and entities stored for a user
    Inspect { user_id: String },
    /// Run one operation, e.g. `concord call get_unified_context --args '{"user_id":"u1"}'`
    Call {
        operation: String,
        /// JSON object with the operation's arguments
        #[arg(long)]
        args: Option<String>,
    },
    /// Check database health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConcordConfig::load()?;

    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve { ephemeral } => server::serve(config, ephemeral).await?,
        Command::Alias {
            alias,
            canonical_id,
        } => cli::alias::alias(&config, &alias, &canonical_id)?,
        Command::Inspect { user_id } => cli::inspect::inspect(&config, &user_id)?,
        Command::Call { operation, args } => {
            cli::call::call(&config, &operation, args.as_deref())?
        }
        Command::Doctor => cli::doctor::doctor(&config)?,
    }

    Ok(())
}
