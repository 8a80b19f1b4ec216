//! Built-in health probes
//!
//! Generic transports (TCP, HTTP), in-process probes for the service's own
//! layers, and a placeholder for dependencies a deployment leaves out.

mod builtin;
mod factory;
mod http;
mod tcp;

#[cfg(test)]
mod tests;

pub use builtin::{ApiProbe, LoggerProbe, RealtimeProbe, UnconfiguredProbe};
pub use factory::{ProbeDependencies, build_registry, classification_policy};
pub use http::HttpProbe;
pub use tcp::TcpProbe;
