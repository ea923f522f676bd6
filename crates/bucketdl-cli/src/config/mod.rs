//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── bucket: BucketArgs    # Listing URL, cookies, prefix, destination
//! └── client: ClientConfig  # Timeouts, user agent, pagination
//! ```
//!
//! Every option can be given as a flag or an environment variable.
//!
//! # Example
//!
//! ```bash
//! bucketdl --bucket-url "https://cdn.example.com/" --prefix "photos/" --folder photos
//!
//! # Or via environment variables
//! BUCKETDL_BUCKET_URL="https://cdn.example.com/" BUCKETDL_PREFIX="photos/" BUCKETDL_FOLDER=photos bucketdl
//! ```

mod bucket;

use std::process;

use anyhow::Context;
use bucketdl_client::ClientConfig;
pub use bucket::BucketArgs;
use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "bucketdl")]
#[command(about = "Lists a bucket and downloads every object it names")]
#[command(version)]
pub struct Cli {
    /// Listing and destination inputs.
    #[clap(flatten)]
    pub bucket: BucketArgs,

    /// HTTP client behaviour.
    #[clap(flatten)]
    pub client: ClientConfig,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.bucket
            .validate()
            .context("invalid bucket configuration")?;
        self.client
            .validate()
            .context("invalid client configuration")?;
        Ok(())
    }

    /// Logs configuration (no cookie values).
    pub fn log(&self) {
        Self::log_build_info();
        self.bucket.log();

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            request_timeout_secs = self.client.request_timeout().as_secs(),
            cookie_timeout_secs = self.client.cookie_timeout().as_secs(),
            pagination = %self.client.pagination,
            max_pages = self.client.max_pages,
            "Client configuration"
        );
    }

    fn log_build_info() {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );
    }

    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
