//! Datadog client configuration

use super::error::PlatformError;
use crate::config::Settings;

/// Default Datadog site (US-1)
pub const DEFAULT_SITE: &str = "datadoghq.com";

/// Client configuration shared by every org session of an invocation
#[derive(Debug, Clone)]
pub struct DatadogConfig {
    /// Datadog site, e.g. `datadoghq.com` or `datadoghq.eu`
    pub site: String,
    /// Full base URL override; takes precedence over `site` when set
    pub base_url: Option<String>,
    /// Request timeout in seconds
    pub request_timeout: u64,
    /// Connection timeout in seconds
    pub connect_timeout: u64,
    /// Page size for paginated user listings
    pub page_size: u32,
}

impl Default for DatadogConfig {
    fn default() -> Self {
        Self {
            site: DEFAULT_SITE.to_string(),
            base_url: None,
            request_timeout: 30,
            connect_timeout: 10,
            page_size: 100,
        }
    }
}

impl DatadogConfig {
    /// Create a config for the given site
    pub fn new(site: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            ..Default::default()
        }
    }

    /// Derive the client config from invocation settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            site: settings.site.clone(),
            request_timeout: settings.request_timeout,
            connect_timeout: settings.connect_timeout,
            ..Default::default()
        }
    }

    /// Settings
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Settings
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout = seconds;
        self
    }

    /// Settings
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Resolved API base URL
    pub fn api_base(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://api.{}", self.site),
        }
    }

    /// Check the configuration before opening sessions
    pub fn validate(&self) -> Result<(), PlatformError> {
        if self.site.is_empty() && self.base_url.is_none() {
            return Err(PlatformError::configuration("Datadog site cannot be empty"));
        }

        if let Some(url) = &self.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(PlatformError::configuration(
                    "Base URL must start with http:// or https://",
                ));
            }
        }

        if self.request_timeout == 0 {
            return Err(PlatformError::configuration(
                "Request timeout must be greater than 0",
            ));
        }

        if self.connect_timeout > self.request_timeout {
            return Err(PlatformError::configuration(
                "Connect timeout cannot be greater than request timeout",
            ));
        }

        if self.page_size == 0 {
            return Err(PlatformError::configuration(
                "Page size must be greater than 0",
            ));
        }

        Ok(())
    }
}
