//! Error types for listing walks and resource downloads.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use strum::{AsRefStr, IntoStaticStr};
use thiserror::Error;

/// Result type alias for bucketdl-client operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors that can occur while listing or downloading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// The cookie source could not be reached.
    CookieFetch,
    /// Transport failure or error status on a listing request.
    Http,
    /// The listing endpoint rejected the request for lack of authorization.
    Auth,
    /// The listing body was not a well-formed listing document.
    Parse,
    /// A listing page contained no entries.
    EmptyResult,
    /// A key carried malformed percent-encoding.
    Decode,
    /// A single resource could not be downloaded.
    Download,
    /// The pagination cursor stopped advancing.
    Pagination,
    /// A URL could not be parsed.
    InvalidUrl,
    /// The client configuration is invalid.
    Configuration,
}

/// Why a single resource failed to download.
#[derive(Debug, Error)]
pub enum DownloadFailure {
    /// Cookies for the request could not be acquired.
    #[error("could not acquire cookies: {0}")]
    Cookies(#[source] Box<Error>),
    /// The request could not be completed or the body stream broke.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
    /// No response or body data arrived within the stall timeout.
    #[error("no data received for {}s", .0.as_secs())]
    Stalled(Duration),
    /// The server answered with something other than `200 OK`.
    #[error("unexpected status code {0}")]
    Status(u16),
    /// The destination directory or file could not be written.
    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Sanitizing the key left nothing to name the local file with.
    #[error("key does not yield a usable local filename")]
    UnusableFilename,
}

/// Error type for bucketdl-client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The cookie source URL could not be fetched.
    #[error("could not fetch cookies from {url}: {source}")]
    CookieFetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A listing request failed in transport or while reading its body.
    #[error("could not fetch bucket listing from {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A listing request returned a status of 400 or above.
    #[error("could not fetch bucket listing: status_code={status} url={url}")]
    HttpStatus { status: u16, url: String },

    /// The listing endpoint reported missing authorization.
    #[error("listing at {url} was not authorized ({code}): {message}")]
    Auth {
        url: String,
        code: String,
        message: String,
    },

    /// The listing body could not be parsed as a listing page.
    #[error("could not parse bucket listing from {url}: {reason}")]
    Parse { url: String, reason: String },

    /// A listing page contained zero entries.
    #[error("no resources found in bucket listing at {url}")]
    EmptyResult { url: String },

    /// A key carried malformed percent-encoding.
    #[error("could not decode key {key:?}: {reason}")]
    Decode { key: String, reason: String },

    /// A single resource could not be downloaded.
    #[error("could not download {url}: {reason}")]
    Download {
        url: String,
        #[source]
        reason: DownloadFailure,
    },

    /// The listing returned the same cursor twice while more pages were announced.
    #[error("pagination cursor stalled at key {key:?}")]
    StalledCursor { key: String },

    /// A URL could not be parsed.
    #[error("invalid url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The client configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Creates a download error for the given resource url.
    pub fn download(url: impl Into<String>, reason: DownloadFailure) -> Self {
        Self::Download {
            url: url.into(),
            reason,
        }
    }

    /// Creates a filesystem download error.
    pub(crate) fn filesystem(url: impl Into<String>, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::download(
            url,
            DownloadFailure::Filesystem {
                path: path.into(),
                source,
            },
        )
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CookieFetch { .. } => ErrorKind::CookieFetch,
            Self::Http { .. } | Self::HttpStatus { .. } => ErrorKind::Http,
            Self::Auth { .. } => ErrorKind::Auth,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::EmptyResult { .. } => ErrorKind::EmptyResult,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Download { .. } => ErrorKind::Download,
            Self::StalledCursor { .. } => ErrorKind::Pagination,
            Self::InvalidUrl { .. } => ErrorKind::InvalidUrl,
            Self::Config(_) => ErrorKind::Configuration,
        }
    }

    /// Returns the error kind as a string.
    pub fn kind_str(&self) -> &'static str {
        self.kind().into()
    }

    /// Returns whether this error ends a listing walk.
    ///
    /// Decode and download errors are scoped to a single item.
    pub fn aborts_listing(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Decode | ErrorKind::Download)
    }

    /// Returns the HTTP status code carried by this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Download {
                reason: DownloadFailure::Status(status),
                ..
            } => Some(*status),
            _ => None,
        }
    }
}
