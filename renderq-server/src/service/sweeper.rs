//! Retention Sweeper
//!
//! A recurring timer per tenant that removes terminal jobs. Each run is
//! scheduled `cleanup_interval` after the previous one finished. A failed
//! run is logged and retried at the next tick; it never stops the timer.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::service::store::SweepReport;
use crate::tenant::{Tenant, TenantDirectory};

pub struct Sweeper {
    tenant: Arc<Tenant>,
    interval: Duration,
}

impl Sweeper {
    /// `None` when the tenant has no cleanup interval configured
    pub fn for_tenant(tenant: Arc<Tenant>) -> Option<Self> {
        let interval = tenant.cleanup_interval()?;
        Some(Self { tenant, interval })
    }

    /// Spawn one sweeper task per tenant that has a cleanup interval
    pub fn spawn_all(
        directory: &TenantDirectory,
        shutdown: watch::Receiver<bool>,
    ) -> Vec<JoinHandle<()>> {
        directory
            .tenants()
            .filter_map(|tenant| Sweeper::for_tenant(tenant.clone()))
            .map(|sweeper| {
                tracing::info!(
                    "Scheduling retention sweep for tenant {} every {:?}",
                    sweeper.tenant.name(),
                    sweeper.interval
                );
                tokio::spawn(sweeper.run(shutdown.clone()))
            })
            .collect()
    }

    /// Run until the shutdown flag flips or its sender is dropped
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut next = Instant::now() + self.interval;

        loop {
            tokio::select! {
                _ = time::sleep_until(next) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::debug!("Retention sweep for tenant {} stopped", self.tenant.name());
                        return;
                    }
                    continue;
                }
            }

            self.tick().await;
            next = Instant::now() + self.interval;
        }
    }

    /// One sweep invocation. Failures are logged and swallowed.
    pub async fn tick(&self) -> Option<SweepReport> {
        let store = match self.tenant.store().await {
            Ok(store) => store,
            Err(err) => {
                tracing::error!(
                    "Retention sweep for tenant {} skipped, store unavailable: {}",
                    self.tenant.name(),
                    err
                );
                return None;
            }
        };

        match store.sweep().await {
            Ok(report) => {
                if report.removed > 0 {
                    tracing::info!(
                        "Retention sweep for tenant {} removed {} job(s) in {} batch(es)",
                        self.tenant.name(),
                        report.removed,
                        report.batches
                    );
                }
                Some(report)
            }
            Err(err) => {
                tracing::error!(
                    "Retention sweep for tenant {} failed, retrying next cycle: {}",
                    self.tenant.name(),
                    err
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credentials;
    use crate::repository::MemoryBacking;
    use serde_json::json;

    fn tenant(interval: Option<Duration>) -> Arc<Tenant> {
        Arc::new(Tenant::new(
            "sweep-test",
            Credentials::default(),
            interval,
            Arc::new(MemoryBacking::new()),
        ))
    }

    #[test]
    fn test_no_interval_no_sweeper() {
        assert!(Sweeper::for_tenant(tenant(None)).is_none());
    }

    #[tokio::test]
    async fn test_tick_sweeps_terminal_jobs() {
        let tenant = tenant(Some(Duration::from_secs(60)));
        let store = tenant.store().await.unwrap();
        let done = store.create(json!({}), None).await.unwrap();
        store.update(done.uid(), json!({ "state": "finished" })).await.unwrap();
        store.create(json!({}), None).await.unwrap();

        let sweeper = Sweeper::for_tenant(tenant).unwrap();
        let report = sweeper.tick().await.unwrap();

        assert_eq!(report.removed, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_timer_rearms_and_stops_on_shutdown() {
        let tenant = tenant(Some(Duration::from_millis(20)));
        let store = tenant.store().await.unwrap();
        let sweeper = Sweeper::for_tenant(tenant).unwrap();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(sweeper.run(shutdown_rx));

        for round in 0..2 {
            let job = store.create(json!({}), None).await.unwrap();
            store.update(job.uid(), json!({ "state": "error" })).await.unwrap();

            let mut swept = false;
            for _ in 0..100 {
                if store.is_empty().await {
                    swept = true;
                    break;
                }
                time::sleep(Duration::from_millis(10)).await;
            }
            assert!(swept, "round {} was not swept", round);
        }

        shutdown_tx.send(true).unwrap();
        time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }
}
