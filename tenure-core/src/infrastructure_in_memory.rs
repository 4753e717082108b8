use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::clock::{Clock, SystemClock};
use crate::infrastructure::{EvictedLease, LeaseManager};
use crate::types::{Action, Lease};

/// Registry keeping every lease in a process-local map.
///
/// The map lock only guards handle lookups and insert/remove. Renewals and
/// expiry checks run on a cloned `Arc<Lease<T>>` after the lock is released.
#[derive(Debug)]
pub struct InMemoryLeaseRegistry<T> {
    // Map of registry key -> Lease
    leases: RwLock<HashMap<String, Arc<Lease<T>>>>,
    clock: Arc<dyn Clock>,
}

impl<T> InMemoryLeaseRegistry<T> {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Every lease registered here reads time from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            leases: RwLock::new(HashMap::new()),
            clock,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn get(&self, key: &str) -> Option<Arc<Lease<T>>> {
        self.leases
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Mark the holder under `key` as up. Returns false if `key` is unknown.
    pub fn service_up(&self, key: &str) -> bool {
        match self.get(key) {
            Some(lease) => {
                lease.service_up();
                true
            }
            None => false,
        }
    }

    /// All tracked leases, ordered by key.
    pub fn leases(&self) -> Vec<(String, Arc<Lease<T>>)> {
        let mut leases: Vec<_> = self
            .leases
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(key, lease)| (key.clone(), Arc::clone(lease)))
            .collect();
        leases.sort_by(|a, b| a.0.cmp(&b.0));
        leases
    }

    pub fn len(&self) -> usize {
        self.leases
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for InMemoryLeaseRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LeaseManager<T> for InMemoryLeaseRegistry<T> {
    fn register(&self, key: &str, holder: T, duration_in_secs: Option<u32>) -> Arc<Lease<T>> {
        let lease = Arc::new(Lease::with_clock(
            holder,
            duration_in_secs,
            Arc::clone(&self.clock),
        ));

        let previous = self
            .leases
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), Arc::clone(&lease));

        // A re-registering holder keeps the time it first came up
        if let Some(previous) = previous {
            let service_up = previous.service_up_timestamp();
            if service_up > 0 {
                lease.set_service_up_timestamp(service_up);
            }
        }

        tracing::debug!(
            key = %key,
            action = %Action::Register,
            duration_ms = lease.duration_ms(),
            "Lease registered"
        );
        lease
    }

    fn cancel(&self, key: &str) -> bool {
        let removed = self
            .leases
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);

        match removed {
            Some(lease) => {
                lease.cancel();
                tracing::debug!(key = %key, action = %Action::Cancel, "Lease cancelled");
                true
            }
            None => false,
        }
    }

    fn renew(&self, key: &str) -> bool {
        match self.get(key) {
            Some(lease) => {
                lease.renew();
                tracing::trace!(key = %key, action = %Action::Renew, "Lease renewed");
                true
            }
            None => false,
        }
    }

    fn evict(&self, additional_lease_ms: u64) -> Vec<EvictedLease<T>> {
        // Evaluate expiry against a copy of the handles so heartbeats are
        // not blocked behind the sweep.
        let expired: Vec<String> = self
            .leases()
            .into_iter()
            .filter(|(_, lease)| lease.is_expired_with(additional_lease_ms))
            .map(|(key, _)| key)
            .collect();

        if expired.is_empty() {
            return Vec::new();
        }

        let mut leases = self.leases.write().unwrap_or_else(PoisonError::into_inner);
        let mut evicted = Vec::with_capacity(expired.len());
        for key in expired {
            // Re-check under the write lock: a heartbeat or re-registration
            // may have landed since the scan.
            let still_expired = leases
                .get(&key)
                .is_some_and(|lease| lease.is_expired_with(additional_lease_ms));
            if !still_expired {
                continue;
            }
            if let Some(lease) = leases.remove(&key) {
                lease.cancel();
                tracing::info!(
                    key = %key,
                    last_renewal_timestamp = lease.last_renewal_timestamp(),
                    additional_lease_ms,
                    "Lease evicted"
                );
                evicted.push(EvictedLease { key, lease });
            }
        }
        evicted
    }
}
