//! Configuration validation
//!
//! The validation is organized into several submodules:
//! - `trait_def`: Core Validate trait definition
//! - `config_validators`: Top-level, server and probe validators
//! - `monitoring_validators`: Health, realtime and metrics validators
//! - `tests`: Test suite for all validators

mod config_validators;
mod monitoring_validators;
mod trait_def;

pub use trait_def::Validate;
