//! Configuration for a `VigilSystem`
//!
//! One struct gathers the transport timeouts, the feed tuning and the
//! credential location so an application can build everything from a single
//! value, or from the environment.

use std::path::PathBuf;
use std::time::Duration;

use http_client::HttpConfig;
use vigil_api::{DEFAULT_PAGE_SIZE, DEFAULT_STATISTICS_DAYS, MAX_PAGE_SIZE, MAX_STATISTICS_DAYS};
use vigil_state::FeedConfig;

use crate::SdkError;

/// Backend used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Environment variables read by [`ClientConfig::from_env`]
pub mod env {
    pub const API_URL: &str = "VIGIL_API_URL";
    pub const PAGE_SIZE: &str = "VIGIL_PAGE_SIZE";
    pub const REQUEST_TIMEOUT_SECS: &str = "VIGIL_REQUEST_TIMEOUT_SECS";
    pub const CREDENTIALS_PATH: &str = "VIGIL_CREDENTIALS_PATH";
}

/// Configuration for a [`VigilSystem`](crate::VigilSystem)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root, including the version prefix
    /// Default: `http://localhost:8000/api/v1`
    pub base_url: String,

    /// Default: 10 seconds
    pub connect_timeout: Duration,

    /// Default: 30 seconds
    pub request_timeout: Duration,

    /// Events requested per feed page, 1 to 100
    /// Default: 20
    pub page_size: u32,

    /// Statistics window used by refresh, 1 to 365 days
    /// Default: 7
    pub statistics_days: u32,

    /// Credential file; `None` uses the platform config directory
    pub credentials_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let http = HttpConfig::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: http.connect_timeout,
            request_timeout: http.request_timeout,
            page_size: DEFAULT_PAGE_SIZE,
            statistics_days: DEFAULT_STATISTICS_DAYS,
            credentials_path: None,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with the `VIGIL_*` environment variables
    ///
    /// Unset variables keep their defaults; a set but unparsable value is a
    /// configuration error.
    pub fn from_env() -> Result<Self, SdkError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SdkError> {
        let mut config = Self::default();

        if let Some(url) = lookup(env::API_URL) {
            config.base_url = url.trim().to_string();
        }
        if let Some(value) = lookup(env::PAGE_SIZE) {
            config.page_size = parse_number(env::PAGE_SIZE, &value)?;
        }
        if let Some(value) = lookup(env::REQUEST_TIMEOUT_SECS) {
            config.request_timeout = Duration::from_secs(parse_number(env::REQUEST_TIMEOUT_SECS, &value)?);
        }
        if let Some(path) = lookup(env::CREDENTIALS_PATH).filter(|path| !path.trim().is_empty()) {
            config.credentials_path = Some(PathBuf::from(path));
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration and return the first problem found
    pub fn validate(&self) -> Result<(), SdkError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(SdkError::Configuration(format!(
                "base URL must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }

        if self.connect_timeout.is_zero() || self.request_timeout.is_zero() {
            return Err(SdkError::Configuration(
                "Timeouts must be greater than 0".to_string(),
            ));
        }

        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(SdkError::Configuration(format!(
                "Page size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        if !(1..=MAX_STATISTICS_DAYS).contains(&self.statistics_days) {
            return Err(SdkError::Configuration(format!(
                "Statistics window must be between 1 and {} days",
                MAX_STATISTICS_DAYS
            )));
        }

        Ok(())
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeouts(mut self, connect: Duration, request: Duration) -> Self {
        self.connect_timeout = connect;
        self.request_timeout = request;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_statistics_days(mut self, days: u32) -> Self {
        self.statistics_days = days;
        self
    }

    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = Some(path.into());
        self
    }

    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            connect_timeout: self.connect_timeout,
            request_timeout: self.request_timeout,
        }
    }

    pub fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            page_size: self.page_size,
            statistics_days: self.statistics_days,
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, SdkError> {
    value
        .trim()
        .parse()
        .map_err(|_| SdkError::Configuration(format!("{} must be a positive number, got '{}'", key, value)))
}
