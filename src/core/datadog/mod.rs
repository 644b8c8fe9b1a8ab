//! Datadog user lifecycle client
//!
//! One authenticated session per organization; each operation maps to one
//! logical call against the Datadog v2 users API.

mod client;
mod config;
mod error;

pub use client::UsersClient;
pub use config::DatadogConfig;
pub use error::PlatformError;
