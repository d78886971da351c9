//! Server configuration
//!
//! Every option can be given as a flag or through the environment.
//! Extra tenants are read from a JSON file holding an array of tenant entries.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use crate::tenant::{DEFAULT_TENANT, TenantConfig};

#[derive(Debug, Clone, Parser)]
#[command(name = "renderq-server")]
#[command(about = "Multi-tenant render job queue", long_about = None)]
pub struct ServerConfig {
    /// Address the HTTP API listens on
    #[arg(long, env = "RENDERQ_BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: String,

    /// PostgreSQL URL; jobs are kept in memory only when absent
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Maximum database connections
    #[arg(long, env = "RENDERQ_MAX_CONNECTIONS", default_value_t = 10)]
    pub max_connections: u32,

    /// JSON file listing tenants
    #[arg(long, env = "RENDERQ_TENANTS_FILE")]
    pub tenants_file: Option<PathBuf>,

    /// Shared secret of the default tenant
    #[arg(long, env = "NEXRENDER_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Retention sweep interval of the default tenant, in seconds
    #[arg(long, env = "RENDERQ_CLEANUP_INTERVAL")]
    pub cleanup_interval_secs: Option<u64>,
}

impl ServerConfig {
    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if self.max_connections == 0 {
            anyhow::bail!("max_connections must be greater than 0");
        }

        if self.cleanup_interval_secs == Some(0) {
            anyhow::bail!("cleanup_interval must be greater than 0");
        }

        if matches!(self.secret.as_deref(), Some("")) {
            anyhow::bail!("secret cannot be empty");
        }

        Ok(())
    }

    /// Tenants from the tenants file, plus the default tenant from flags
    ///
    /// A `default` entry in the file takes precedence over the flags.
    pub fn tenant_configs(&self) -> anyhow::Result<Vec<TenantConfig>> {
        let mut tenants = match &self.tenants_file {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read tenants file {}", path.display()))?;
                parse_tenants(&raw)
                    .with_context(|| format!("Failed to parse tenants file {}", path.display()))?
            }
            None => Vec::new(),
        };

        if tenants.iter().any(|tenant| tenant.name == DEFAULT_TENANT) {
            if self.secret.is_some() || self.cleanup_interval_secs.is_some() {
                tracing::warn!("Tenants file defines the default tenant; ignoring its flags");
            }
        } else {
            tenants.push(TenantConfig {
                secret: self.secret.clone(),
                cleanup_interval_secs: self.cleanup_interval_secs,
                ..TenantConfig::open(DEFAULT_TENANT)
            });
        }

        Ok(tenants)
    }
}

fn parse_tenants(raw: &str) -> serde_json::Result<Vec<TenantConfig>> {
    serde_json::from_str(raw)
}
