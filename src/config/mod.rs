//! Invocation configuration
//!
//! Settings are read from the environment the way the hosting runtime
//! provides them; every knob has an explicit default.

use std::env;
use std::time::Duration;

use crate::utils::error::{Result, SyncError};

/// Default secret document identifier
pub const DEFAULT_SECRET_NAME: &str = "ddOrgSecret";

/// Default Datadog site
pub const DEFAULT_SITE: &str = "datadoghq.com";

/// Invocation settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Identifier of the secret document holding per-org credentials
    pub secret_name: String,
    /// Datadog site (region/host)
    pub site: String,
    /// Per-request timeout in seconds
    pub request_timeout: u64,
    /// Connection timeout in seconds
    pub connect_timeout: u64,
    /// Overall invocation deadline in seconds; None means unbounded
    pub deadline: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            secret_name: DEFAULT_SECRET_NAME.to_string(),
            site: DEFAULT_SITE.to_string(),
            request_timeout: 30,
            connect_timeout: 10,
            deadline: None,
        }
    }
}

impl Settings {
    /// Load settings from environment variables
    pub fn from_env() -> Result<Self> {
        let mut settings = Self::default();

        if let Ok(name) = env::var("SECRET_NAME") {
            settings.secret_name = name;
        }

        if let Ok(site) = env::var("DATADOG_SITE") {
            settings.site = site;
        }

        if let Ok(timeout) = env::var("REQUEST_TIMEOUT") {
            settings.request_timeout = timeout.parse().unwrap_or(30);
        }

        if let Ok(deadline) = env::var("INVOCATION_DEADLINE") {
            settings.deadline = deadline.parse().ok();
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Settings
    pub fn with_secret_name(mut self, secret_name: impl Into<String>) -> Self {
        self.secret_name = secret_name.into();
        self
    }

    /// Settings
    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = site.into();
        self
    }

    /// Settings
    pub fn with_deadline(mut self, seconds: u64) -> Self {
        self.deadline = Some(seconds);
        self
    }

    /// Overall invocation deadline as a duration
    pub fn deadline_duration(&self) -> Option<Duration> {
        self.deadline.map(Duration::from_secs)
    }

    /// Check the configuration before use
    pub fn validate(&self) -> Result<()> {
        if self.secret_name.is_empty() {
            return Err(SyncError::Config(
                "SECRET_NAME cannot be empty".to_string(),
            ));
        }

        if self.site.is_empty() {
            return Err(SyncError::Config(
                "DATADOG_SITE cannot be empty".to_string(),
            ));
        }

        if self.request_timeout == 0 {
            return Err(SyncError::Config(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.connect_timeout > self.request_timeout {
            return Err(SyncError::Config(
                "Connect timeout cannot be greater than request timeout".to_string(),
            ));
        }

        Ok(())
    }
}
