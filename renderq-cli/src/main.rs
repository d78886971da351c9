//! renderq CLI
//!
//! Command-line interface for inspecting and driving a renderq queue.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "renderq")]
#[command(about = "renderq job queue CLI", long_about = None)]
struct Cli {
    /// Server URL
    #[arg(long, env = "RENDERQ_URL", default_value = "http://localhost:8080")]
    url: String,

    /// Shared secret of the tenant
    #[arg(long, env = "NEXRENDER_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Tenant name
    #[arg(long, env = "RENDERQ_TENANT")]
    tenant: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        server_url: cli.url,
        secret: cli.secret,
        tenant: cli.tenant,
    };

    handle_command(cli.command, &config).await
}
