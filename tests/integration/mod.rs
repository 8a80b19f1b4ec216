//! Integration tests for healthcast
//!
//! These tests drive the public API end to end with real probes, sockets
//! and an in-process HTTP mock.

pub mod config_tests;
pub mod probe_tests;
pub mod routes_tests;
pub mod system_tests;
