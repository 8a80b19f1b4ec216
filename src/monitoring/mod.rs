//! Health monitoring and realtime status
//!
//! This module provides health aggregation, request metrics, built-in
//! probes and the realtime broadcast channel.

// Public submodules
pub mod health;
pub mod metrics;
pub mod probes;
pub mod realtime;

// Internal submodules
mod system;

pub use system::HealthSystem;
