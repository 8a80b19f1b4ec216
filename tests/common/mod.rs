//! Common test utilities for healthcast
//!
//! - Scripted probes whose answers can be changed mid-test
//! - Configurations with short, test-friendly intervals
//! - Health systems wired without network probes

pub mod fixtures;

pub use fixtures::{ScriptedProbe, health_system, no_reuse, test_config};

/// Assert that a result is Ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// Assert that a result is Err
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
            Err(e) => e,
        }
    };
}
