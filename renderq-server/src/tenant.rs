//! Tenant directory
//!
//! Resolves a tenant name to its credentials and its job store. Stores are
//! hydrated lazily: the first operation to reach a tenant loads its jobs and
//! every concurrent operation waits for that load to finish before running.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::OnceCell;

use crate::auth::{AuthError, Credentials, PublicKey};
use crate::repository::{BackingError, BackingProvider, JobBacking};
use crate::service::store::JobStore;

/// Tenant used when a request names none
pub const DEFAULT_TENANT: &str = "default";

/// Header selecting the tenant of a request
pub const TENANT_HEADER: &str = "nexrender-tenant";

/// Tenant directory error type
#[derive(Debug, thiserror::Error)]
pub enum TenantError {
    #[error("tenant {0} is defined more than once")]
    Duplicate(String),

    #[error("tenant name cannot be empty")]
    EmptyName,

    #[error("tenant {0}: cleanup interval must be greater than 0")]
    ZeroCleanupInterval(String),

    #[error("tenant {tenant}: {source}")]
    Credentials {
        tenant: String,
        #[source]
        source: AuthError,
    },
}

/// One tenant as written in the tenants file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TenantConfig {
    pub name: String,
    #[serde(default)]
    pub secret: Option<String>,
    /// PEM encoded public key for bearer tokens
    #[serde(default)]
    pub public_key: Option<String>,
    /// Token algorithm for `public_key`, `EdDSA` when omitted
    #[serde(default)]
    pub algorithm: Option<String>,
    #[serde(default)]
    pub cleanup_interval_secs: Option<u64>,
}

impl TenantConfig {
    pub fn open(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

pub struct Tenant {
    name: String,
    credentials: Credentials,
    cleanup_interval: Option<Duration>,
    backing: Arc<dyn JobBacking>,
    store: OnceCell<Arc<JobStore>>,
}

impl Tenant {
    pub fn new(
        name: impl Into<String>,
        credentials: Credentials,
        cleanup_interval: Option<Duration>,
        backing: Arc<dyn JobBacking>,
    ) -> Self {
        Self {
            name: name.into(),
            credentials,
            cleanup_interval,
            backing,
            store: OnceCell::new(),
        }
    }

    fn from_config(config: TenantConfig, provider: &BackingProvider) -> Result<Self, TenantError> {
        if config.name.is_empty() {
            return Err(TenantError::EmptyName);
        }

        let public_key = config
            .public_key
            .as_deref()
            .map(|pem| PublicKey::from_pem(pem, config.algorithm.as_deref().unwrap_or("EdDSA")))
            .transpose()
            .map_err(|source| TenantError::Credentials {
                tenant: config.name.clone(),
                source,
            })?;
        if let Some(key) = &public_key {
            tracing::info!(
                "Tenant {} accepts bearer tokens signed with {:?}",
                config.name,
                key.algorithm()
            );
        }

        let cleanup_interval = match config.cleanup_interval_secs {
            Some(0) => return Err(TenantError::ZeroCleanupInterval(config.name)),
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        let backing = provider.for_tenant(&config.name);
        Ok(Self::new(
            config.name,
            Credentials::new(config.secret, public_key),
            cleanup_interval,
            backing,
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn cleanup_interval(&self) -> Option<Duration> {
        self.cleanup_interval
    }

    /// The tenant's job store, hydrating it on first use
    ///
    /// A failed hydration leaves the cell empty so the next caller retries.
    pub async fn store(&self) -> Result<Arc<JobStore>, BackingError> {
        self.store
            .get_or_try_init(|| async {
                JobStore::hydrate(self.name.clone(), self.backing.clone())
                    .await
                    .map(Arc::new)
            })
            .await
            .cloned()
    }
}

#[derive(Default)]
pub struct TenantDirectory {
    tenants: HashMap<String, Arc<Tenant>>,
}

impl TenantDirectory {
    /// Build the directory from tenant configs
    ///
    /// An open `default` tenant is added when the configs do not define one.
    pub fn from_configs(
        configs: Vec<TenantConfig>,
        provider: &BackingProvider,
    ) -> Result<Self, TenantError> {
        let mut directory = Self::default();
        for config in configs {
            directory.insert(Tenant::from_config(config, provider)?)?;
        }

        if !directory.tenants.contains_key(DEFAULT_TENANT) {
            directory.insert(Tenant::from_config(
                TenantConfig::open(DEFAULT_TENANT),
                provider,
            )?)?;
        }

        Ok(directory)
    }

    pub fn insert(&mut self, tenant: Tenant) -> Result<(), TenantError> {
        if self.tenants.contains_key(tenant.name()) {
            return Err(TenantError::Duplicate(tenant.name().to_string()));
        }
        self.tenants.insert(tenant.name().to_string(), Arc::new(tenant));
        Ok(())
    }

    /// Look up a tenant; no name means the default tenant
    pub fn resolve(&self, name: Option<&str>) -> Option<Arc<Tenant>> {
        self.tenants.get(name.unwrap_or(DEFAULT_TENANT)).cloned()
    }

    pub fn tenants(&self) -> impl Iterator<Item = &Arc<Tenant>> {
        self.tenants.values()
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tenant_always_present() {
        let directory = TenantDirectory::from_configs(vec![], &BackingProvider::Memory).unwrap();
        assert_eq!(directory.len(), 1);

        let tenant = directory.resolve(None).unwrap();
        assert_eq!(tenant.name(), DEFAULT_TENANT);
        assert!(tenant.credentials().is_open());
        assert!(tenant.cleanup_interval().is_none());
    }

    #[test]
    fn test_configured_default_wins() {
        let mut config = TenantConfig::open(DEFAULT_TENANT);
        config.secret = Some("s".to_string());

        let directory =
            TenantDirectory::from_configs(vec![config], &BackingProvider::Memory).unwrap();
        assert_eq!(directory.len(), 1);
        assert!(!directory.resolve(Some("default")).unwrap().credentials().is_open());
    }

    #[test]
    fn test_unknown_tenant_not_resolved() {
        let directory = TenantDirectory::from_configs(
            vec![TenantConfig::open("studio-a")],
            &BackingProvider::Memory,
        )
        .unwrap();

        assert!(directory.resolve(Some("studio-a")).is_some());
        assert!(directory.resolve(Some("studio-b")).is_none());
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let duplicate = vec![TenantConfig::open("a"), TenantConfig::open("a")];
        assert!(matches!(
            TenantDirectory::from_configs(duplicate, &BackingProvider::Memory),
            Err(TenantError::Duplicate(_))
        ));

        let mut zero = TenantConfig::open("a");
        zero.cleanup_interval_secs = Some(0);
        assert!(matches!(
            TenantDirectory::from_configs(vec![zero], &BackingProvider::Memory),
            Err(TenantError::ZeroCleanupInterval(_))
        ));

        let mut bad_key = TenantConfig::open("a");
        bad_key.public_key = Some("garbage".to_string());
        assert!(matches!(
            TenantDirectory::from_configs(vec![bad_key], &BackingProvider::Memory),
            Err(TenantError::Credentials { .. })
        ));

        assert!(matches!(
            TenantDirectory::from_configs(vec![TenantConfig::open("")], &BackingProvider::Memory),
            Err(TenantError::EmptyName)
        ));
    }

    #[tokio::test]
    async fn test_tenants_are_isolated() {
        let directory = TenantDirectory::from_configs(
            vec![TenantConfig::open("a"), TenantConfig::open("b")],
            &BackingProvider::Memory,
        )
        .unwrap();

        let a = directory.resolve(Some("a")).unwrap().store().await.unwrap();
        let b = directory.resolve(Some("b")).unwrap().store().await.unwrap();

        let job = a.create(serde_json::json!({}), None).await.unwrap();
        assert!(b.get(job.uid()).await.is_err());
        assert!(b.pickup(None, None).await.unwrap().is_none());
        assert_eq!(a.len().await, 1);
    }

    #[tokio::test]
    async fn test_store_hydrated_once() {
        let directory = TenantDirectory::from_configs(vec![], &BackingProvider::Memory).unwrap();
        let tenant = directory.resolve(None).unwrap();

        let first = tenant.store().await.unwrap();
        first.create(serde_json::json!({}), None).await.unwrap();

        let second = tenant.store().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len().await, 1);
    }
}
