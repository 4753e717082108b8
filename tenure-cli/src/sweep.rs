//! Periodic eviction of expired leases.

use std::sync::Arc;
use std::time::Duration;

use tenure_core::clock::Clock;
use tenure_core::infrastructure::{EvictedLease, LeaseManager};
use tenure_core::infrastructure_in_memory::InMemoryLeaseRegistry;

/// Extra lease time to grant when the sweep itself ran late.
///
/// If the previous sweep was at `last_run_ms` and the sweep is meant to run
/// every `interval_ms`, anything beyond the interval is time the holders
/// could not have renewed against a timely sweep.
pub fn compensation_ms(last_run_ms: Option<u64>, now_ms: u64, interval_ms: u64) -> u64 {
    match last_run_ms {
        Some(last) => now_ms.saturating_sub(last).saturating_sub(interval_ms),
        None => 0,
    }
}

pub struct EvictionSweeper<T> {
    registry: Arc<InMemoryLeaseRegistry<T>>,
    interval_ms: u64,
    last_run_ms: Option<u64>,
}

impl<T> EvictionSweeper<T> {
    pub fn new(registry: Arc<InMemoryLeaseRegistry<T>>, interval_ms: u64) -> Self {
        Self {
            registry,
            interval_ms,
            last_run_ms: None,
        }
    }

    /// Run one sweep against the registry clock.
    pub fn run_once(&mut self) -> Vec<EvictedLease<T>> {
        let now = self.registry.clock().now_ms();
        let compensation = compensation_ms(self.last_run_ms, now, self.interval_ms);
        self.last_run_ms = Some(now);

        let evicted = self.registry.evict(compensation);
        if !evicted.is_empty() {
            tracing::info!(
                evicted = evicted.len(),
                compensation_ms = compensation,
                remaining = self.registry.len(),
                "Eviction sweep removed expired leases"
            );
        } else {
            tracing::debug!(compensation_ms = compensation, "Eviction sweep found nothing");
        }
        evicted
    }
}

impl<T: Send + Sync + 'static> EvictionSweeper<T> {
    /// Sweep forever on a fixed interval. The first sweep runs immediately.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(Duration::from_millis(self.interval_ms.max(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.run_once();
        }
    }
}
