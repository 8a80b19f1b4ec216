//! HTTP route modules

pub mod health;
pub mod realtime;

pub use health::configure_routes;
