//! Utility modules for the sync processor
//!
//! Error handling and retry machinery shared across the crate.

pub mod error;
pub mod retry;

// Re-export commonly used types
pub use error::{Result, SyncError};
pub use retry::{RetryConfig, RetryPolicy, RetryableError};
