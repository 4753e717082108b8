mod lease;
mod primitives;

pub use lease::Lease;
pub use primitives::{Action, LeaseSnapshot, LeaseState, DEFAULT_DURATION_IN_SECS};
