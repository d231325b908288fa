// ABOUTME: evalkit command line - maintenance commands for sandbox providers.
// ABOUTME: Loads .env, configures logging, then dispatches the subcommand.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use evalkit::config::Config;
use evalkit::sandbox::{SandboxProviderRegistry, cli_cleanup};

#[derive(Parser)]
#[command(name = "evalkit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Evaluation runtime utilities", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is not set (e.g. info, evalkit=debug)
    #[arg(long, global = true, env = "EVALKIT_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage sandbox environments
    Sandbox {
        #[command(subcommand)]
        command: SandboxCommands,
    },
}

#[derive(Subcommand)]
enum SandboxCommands {
    /// Remove environments left behind by earlier runs
    Cleanup {
        /// Sandbox type (e.g. local)
        #[arg(value_name = "TYPE")]
        kind: String,

        /// Environment id to remove; all environments when omitted
        id: Option<String>,
    },

    /// List registered sandbox types
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::from_env().context("invalid environment configuration")?;
    evalkit::logging::init(cli.log_level.as_deref().or(config.log_level.as_deref()));
    config.apply();

    let registry = SandboxProviderRegistry::with_builtins().await;

    match cli.command {
        Commands::Sandbox { command } => match command {
            SandboxCommands::Cleanup { kind, id } => {
                cli_cleanup(&registry, &kind, id.as_deref())
                    .await
                    .with_context(|| format!("sandbox cleanup for '{}' failed", kind))?;
                tracing::info!(sandbox = %kind, "cleanup complete");
            }
            SandboxCommands::List => {
                for kind in registry.list().await {
                    println!("{}", kind);
                }
            }
        },
    }

    Ok(())
}
