//! # tenure-core
//!
//! Renewable liveness leases for a service registry.
//! A holder keeps its [`types::Lease`] alive with heartbeats; a periodic
//! sweep evicts holders whose lease has expired, so instances that vanish
//! without deregistering are eventually dropped.

pub mod clock;
pub mod infrastructure;
#[path = "infrastructure_in_memory.rs"]
pub mod infrastructure_in_memory;
pub mod types;

#[cfg(test)]
mod lease_test;
