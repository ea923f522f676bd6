//! Configuration for the bucket client.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default timeout for listing and download requests: 30 seconds.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for cookie-source requests: 10 seconds.
pub const DEFAULT_COOKIE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default upper bound on pages read by a multi-page walk.
pub const DEFAULT_MAX_PAGES: usize = 10_000;

/// How far a listing walk follows the pagination cursor.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[cfg_attr(feature = "config", derive(ValueEnum))]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PaginationPolicy {
    /// Read the first page only, whatever `IsTruncated` says.
    #[default]
    SinglePage,
    /// Keep reading while `IsTruncated` is `true`.
    MultiPage,
}

/// Configuration for [`BucketClient`](crate::BucketClient).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ClientConfig {
    /// Timeout in seconds for each listing request (0 = default).
    ///
    /// Downloads have no overall deadline; this bounds the wait for response
    /// headers and for each body chunk instead.
    #[cfg_attr(
        feature = "config",
        arg(long = "request-timeout", env = "BUCKETDL_REQUEST_TIMEOUT_SECS", default_value_t = 30)
    )]
    pub request_timeout_secs: u64,

    /// Timeout in seconds for the cookie-source request (0 = default).
    #[cfg_attr(
        feature = "config",
        arg(long = "cookie-timeout", env = "BUCKETDL_COOKIE_TIMEOUT_SECS", default_value_t = 10)
    )]
    pub cookie_timeout_secs: u64,

    /// User-Agent header to send with requests.
    #[cfg_attr(feature = "config", arg(long = "user-agent", env = "BUCKETDL_USER_AGENT"))]
    pub user_agent: Option<String>,

    /// Whether the listing walk follows `IsTruncated` past the first page.
    #[cfg_attr(
        feature = "config",
        arg(long = "pagination", env = "BUCKETDL_PAGINATION", value_enum, default_value_t = PaginationPolicy::SinglePage)
    )]
    #[serde(default)]
    pub pagination: PaginationPolicy,

    /// Maximum number of pages a multi-page walk reads.
    #[cfg_attr(
        feature = "config",
        arg(long = "max-pages", env = "BUCKETDL_MAX_PAGES", default_value_t = DEFAULT_MAX_PAGES)
    )]
    pub max_pages: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            cookie_timeout_secs: DEFAULT_COOKIE_TIMEOUT.as_secs(),
            user_agent: None,
            pagination: PaginationPolicy::default(),
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl ClientConfig {
    /// Returns the default user agent string.
    fn default_user_agent() -> String {
        format!("bucketdl/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs();
        self
    }

    /// Sets the cookie-source timeout.
    #[must_use]
    pub fn with_cookie_timeout(mut self, timeout: Duration) -> Self {
        self.cookie_timeout_secs = timeout.as_secs();
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets the pagination policy.
    #[must_use]
    pub fn with_pagination(mut self, pagination: PaginationPolicy) -> Self {
        self.pagination = pagination;
        self
    }

    /// Sets the page cap for multi-page walks.
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Returns the effective request timeout, using default if zero.
    pub fn request_timeout(&self) -> Duration {
        match self.request_timeout_secs {
            0 => DEFAULT_REQUEST_TIMEOUT,
            secs => Duration::from_secs(secs),
        }
    }

    /// Returns the effective cookie timeout, using default if zero.
    pub fn cookie_timeout(&self) -> Duration {
        match self.cookie_timeout_secs {
            0 => DEFAULT_COOKIE_TIMEOUT,
            secs => Duration::from_secs(secs),
        }
    }

    /// Returns the effective user agent, using default if empty.
    pub fn effective_user_agent(&self) -> String {
        match self.user_agent.as_deref() {
            Some(agent) if !agent.trim().is_empty() => agent.to_owned(),
            _ => Self::default_user_agent(),
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when `max_pages` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_pages == 0 {
            return Err(Error::Config("max_pages must be at least 1".into()));
        }
        Ok(())
    }
}
