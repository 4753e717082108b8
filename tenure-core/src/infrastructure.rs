use std::sync::Arc;

use crate::types::Lease;

/// A lease removed from a registry by [`LeaseManager::evict`].
#[derive(Debug)]
pub struct EvictedLease<T> {
    pub key: String,
    pub lease: Arc<Lease<T>>,
}

/// Defines the contract between a registry and the leases it tracks.
///
/// Keys are owned by the registry; the lease never looks at them. Methods
/// take `&self` because heartbeats and the eviction sweep arrive on different
/// threads, so implementations synchronize internally.
pub trait LeaseManager<T> {
    /// Start tracking `holder` under `key`, replacing any existing lease.
    fn register(&self, key: &str, holder: T, duration_in_secs: Option<u32>) -> Arc<Lease<T>>;

    /// Explicitly remove a lease. Returns false if `key` is unknown.
    fn cancel(&self, key: &str) -> bool;

    /// Route a heartbeat to the lease. Returns false if `key` is unknown.
    fn renew(&self, key: &str) -> bool;

    /// Remove every lease that is expired once `additional_lease_ms` of
    /// compensation is granted.
    fn evict(&self, additional_lease_ms: u64) -> Vec<EvictedLease<T>>;
}
