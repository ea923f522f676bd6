//! Listing and destination inputs.

use std::path::PathBuf;

use anyhow::{Result as AnyhowResult, anyhow};
use bucketdl_client::build_query;
use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::TRACING_TARGET_CONFIG;

/// What to list and where to put it.
///
/// # Environment Variables
///
/// - `BUCKETDL_BUCKET_URL` - Listing base URL; object keys are appended to it
/// - `BUCKETDL_COOKIE_URL` - Page whose cookies authorize the bucket (optional)
/// - `BUCKETDL_PREFIX` - Only list keys under this prefix
/// - `BUCKETDL_MARKER` - Start listing after this key
/// - `BUCKETDL_IGNORE` - Skip keys matching this regex (or containing it, if not a regex)
/// - `BUCKETDL_FOLDER` - Sub-folder of the output root to download into
/// - `BUCKETDL_OUTPUT_ROOT` - Root directory for downloads (default: resources)
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
#[must_use = "config does nothing unless you use it"]
pub struct BucketArgs {
    /// Listing base URL, e.g. `https://cdn.example.com/`.
    #[arg(long, env = "BUCKETDL_BUCKET_URL")]
    pub bucket_url: String,

    /// URL fetched once per operation for authorization cookies.
    #[arg(long, env = "BUCKETDL_COOKIE_URL", default_value = "")]
    #[serde(default)]
    pub cookie_url: String,

    /// Key prefix to list.
    #[arg(long, env = "BUCKETDL_PREFIX", default_value = "")]
    #[serde(default)]
    pub prefix: String,

    /// Key after which the listing starts.
    #[arg(long, env = "BUCKETDL_MARKER", default_value = "")]
    #[serde(default)]
    pub marker: String,

    /// Pattern of keys to leave out.
    #[arg(long, env = "BUCKETDL_IGNORE", default_value = "")]
    #[serde(default)]
    pub ignore: String,

    /// Folder under the output root that receives the files.
    #[arg(long, env = "BUCKETDL_FOLDER", default_value = "")]
    #[serde(default)]
    pub folder: String,

    /// Root directory for all downloads.
    #[arg(long, env = "BUCKETDL_OUTPUT_ROOT", default_value = "resources")]
    pub output_root: PathBuf,
}

impl BucketArgs {
    /// Validates the URLs.
    ///
    /// # Errors
    ///
    /// Returns an error if the bucket or cookie URL is not an absolute
    /// `http`/`https` URL.
    pub fn validate(&self) -> AnyhowResult<()> {
        check_http_url("bucket url", &self.bucket_url)?;
        if !self.cookie_url.is_empty() {
            check_http_url("cookie url", &self.cookie_url)?;
        }
        Ok(())
    }

    /// Returns the initial listing query.
    pub fn query(&self) -> String {
        build_query(&self.prefix, &self.marker)
    }

    /// Returns the directory the files are written to.
    pub fn destination(&self) -> PathBuf {
        self.output_root.join(&self.folder)
    }

    /// Logs the inputs.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            bucket_url = %self.bucket_url,
            cookies = !self.cookie_url.is_empty(),
            prefix = %self.prefix,
            marker = %self.marker,
            ignore = %self.ignore,
            destination = %self.destination().display(),
            "Bucket configuration"
        );
    }
}

fn check_http_url(what: &str, raw: &str) -> AnyhowResult<()> {
    let url = Url::parse(raw).map_err(|err| anyhow!("{what} {raw:?} is invalid: {err}"))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(anyhow!("{what} {raw:?} must use http or https, not {scheme}")),
    }
}
