use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use hallpass::cli::{
    AdminCommands, GroupCommands, open_warden, run_check, run_group, run_info, run_init,
};
use hallpass::server::{AppState, create_router};
use hallpass::types::UserId;

#[derive(Parser)]
#[command(name = "hallpass")]
#[command(about = "Command authorization and group management for chat bots", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Inspect and change groups
    Group {
        #[command(subcommand)]
        command: GroupCommands,
    },

    /// Check whether a user may run a command
    Check {
        user: UserId,

        /// Command path, e.g. `autolabel add`
        #[arg(required = true, num_args = 1..)]
        command: Vec<String>,

        /// Output the decision as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP server
    Serve {
        /// Host to bind to, overriding the configuration
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to, overriding the configuration
        #[arg(long, short)]
        port: Option<u16>,
    },
}

async fn serve(
    config_path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, warden) = open_warden(config_path)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    if config.authority.override_user.is_none() {
        tracing::warn!("no override user configured; protected memberships cannot be changed");
    }
    if config.server.api_token.is_none() {
        tracing::warn!("no API token configured; the API is open to anyone who can reach it");
    }

    let state = Arc::new(AppState::new(warden, config.server.api_token.as_deref()));
    let app = create_router(state);
    let addr = config.server.socket_addr()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("hallpass=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init { group } => run_init(config, &group)?,
            AdminCommands::Info { json } => run_info(config, json)?,
        },
        Commands::Group { command } => run_group(config, command)?,
        Commands::Check {
            user,
            command,
            json,
        } => run_check(config, user, &command, json)?,
        Commands::Serve { host, port } => serve(config, host, port).await?,
    }

    Ok(())
}
