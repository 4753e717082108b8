use serde::{Deserialize, Serialize};

/// Lease duration used when the holder does not ask for one.
pub const DEFAULT_DURATION_IN_SECS: u32 = 90;

/// Operations a registry applies to a lease
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Register,
    Cancel,
    Renew,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Register => write!(f, "REGISTER"),
            Action::Cancel => write!(f, "CANCEL"),
            Action::Renew => write!(f, "RENEW"),
        }
    }
}

/// Observable lease states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaseState {
    /// Not cancelled and still inside its renewal window
    Active,
    /// Renewal window elapsed without a heartbeat
    Expired,
    /// Lease was explicitly cancelled
    Cancelled,
}

/// Point-in-time copy of a lease's bookkeeping, all timestamps in
/// milliseconds since the epoch. Zero means "unset".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseSnapshot {
    pub registration_timestamp: u64,
    /// Raw renewal marker: the renewal instant plus one duration
    pub last_renewal_timestamp: u64,
    pub eviction_timestamp: u64,
    pub service_up_timestamp: u64,
    pub duration_ms: u64,
    pub state: LeaseState,
}
