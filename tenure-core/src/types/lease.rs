use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{LeaseSnapshot, LeaseState, DEFAULT_DURATION_IN_SECS};
use crate::clock::{Clock, SystemClock};

/// A time-bound liveness claim on a registered holder.
///
/// The holder keeps the lease alive by calling [`Lease::renew`]. A sweep
/// asks [`Lease::is_expired_with`] and evicts the holder once it answers
/// true; the lease never removes itself.
///
/// All mutators take `&self` and none of them lock, so one thread can renew
/// while another evaluates expiry. The renewal marker is a single atomic
/// word; the write-once fields are claimed with a compare-and-swap from 0.
///
/// Note that [`Lease::renew`] stores `now + duration` rather than `now`, and
/// the expiry check adds `duration` once more. A renewed lease therefore
/// stays valid for twice its duration. Heartbeat intervals in the field are
/// tuned against that window; it must not change.
pub struct Lease<T> {
    holder: T,
    registration_timestamp: u64,
    last_update_timestamp: AtomicU64,
    service_up_timestamp: AtomicU64,
    eviction_timestamp: AtomicU64,
    duration: u64,
    clock: Arc<dyn Clock>,
}

impl<T> Lease<T> {
    /// Creates a lease read against the system clock.
    pub fn new(holder: T, duration_in_secs: Option<u32>) -> Self {
        Self::with_clock(holder, duration_in_secs, Arc::new(SystemClock))
    }

    /// Creates a lease read against `clock`.
    ///
    /// `None` and `Some(0)` both fall back to [`DEFAULT_DURATION_IN_SECS`].
    pub fn with_clock(holder: T, duration_in_secs: Option<u32>, clock: Arc<dyn Clock>) -> Self {
        let secs = match duration_in_secs {
            Some(secs) if secs > 0 => secs,
            _ => DEFAULT_DURATION_IN_SECS,
        };
        let registration_timestamp = clock.now_ms();

        Self {
            holder,
            registration_timestamp,
            last_update_timestamp: AtomicU64::new(registration_timestamp),
            service_up_timestamp: AtomicU64::new(0),
            eviction_timestamp: AtomicU64::new(0),
            duration: u64::from(secs) * 1000,
            clock,
        }
    }

    /// Pushes the renewal marker to `now + duration`.
    pub fn renew(&self) {
        let marker = self.clock.now_ms().saturating_add(self.duration);
        self.last_update_timestamp.store(marker, Ordering::Release);
    }

    /// Records the cancellation time. Only the first call has an effect.
    pub fn cancel(&self) {
        claim_once(&self.eviction_timestamp, self.clock.now_ms());
    }

    /// Marks the holder as up. Only the first call has an effect.
    pub fn service_up(&self) {
        claim_once(&self.service_up_timestamp, self.clock.now_ms());
    }

    /// Overwrites the service-up time regardless of its current value.
    pub fn set_service_up_timestamp(&self, timestamp: u64) {
        self.service_up_timestamp.store(timestamp, Ordering::Release);
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_with(0)
    }

    /// True once the lease is cancelled, or once `now` is past
    /// `last_renewal + duration + additional_lease_ms`.
    ///
    /// `additional_lease_ms` widens the window for this evaluation only, e.g.
    /// to compensate for a delayed sweep.
    pub fn is_expired_with(&self, additional_lease_ms: u64) -> bool {
        if self.eviction_timestamp.load(Ordering::Acquire) > 0 {
            return true;
        }
        let deadline = self
            .last_update_timestamp
            .load(Ordering::Acquire)
            .saturating_add(self.duration)
            .saturating_add(additional_lease_ms);
        self.clock.now_ms() > deadline
    }

    pub fn state(&self) -> LeaseState {
        if self.eviction_timestamp.load(Ordering::Acquire) > 0 {
            LeaseState::Cancelled
        } else if self.is_expired() {
            LeaseState::Expired
        } else {
            LeaseState::Active
        }
    }

    pub fn registration_timestamp(&self) -> u64 {
        self.registration_timestamp
    }

    /// Raw renewal marker. After a renewal this is the renewal instant plus
    /// one duration, not the renewal instant itself.
    pub fn last_renewal_timestamp(&self) -> u64 {
        self.last_update_timestamp.load(Ordering::Acquire)
    }

    /// Cancellation time, 0 if never cancelled.
    pub fn eviction_timestamp(&self) -> u64 {
        self.eviction_timestamp.load(Ordering::Acquire)
    }

    /// First service-up time, 0 if never marked up.
    pub fn service_up_timestamp(&self) -> u64 {
        self.service_up_timestamp.load(Ordering::Acquire)
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration
    }

    pub fn holder(&self) -> &T {
        &self.holder
    }

    pub fn snapshot(&self) -> LeaseSnapshot {
        LeaseSnapshot {
            registration_timestamp: self.registration_timestamp,
            last_renewal_timestamp: self.last_renewal_timestamp(),
            eviction_timestamp: self.eviction_timestamp(),
            service_up_timestamp: self.service_up_timestamp(),
            duration_ms: self.duration,
            state: self.state(),
        }
    }
}

/// First writer wins. Zero is the "unset" sentinel, so a claim made while
/// the clock reads 0 is stored as 1.
fn claim_once(field: &AtomicU64, now: u64) {
    let _ = field.compare_exchange(0, now.max(1), Ordering::AcqRel, Ordering::Acquire);
}

impl<T: fmt::Debug> fmt::Debug for Lease<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lease")
            .field("holder", &self.holder)
            .field("registration_timestamp", &self.registration_timestamp)
            .field("last_renewal_timestamp", &self.last_renewal_timestamp())
            .field("service_up_timestamp", &self.service_up_timestamp())
            .field("eviction_timestamp", &self.eviction_timestamp())
            .field("duration_ms", &self.duration)
            .finish()
    }
}
