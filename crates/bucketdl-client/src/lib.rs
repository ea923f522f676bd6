#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod connect;
mod cookie;
mod download;
mod error;
mod listing;
mod resource;

pub use crate::connect::{
    BucketClient, ClientConfig, DEFAULT_COOKIE_TIMEOUT, DEFAULT_MAX_PAGES,
    DEFAULT_REQUEST_TIMEOUT, PaginationPolicy, TRACING_TARGET,
};
pub use crate::cookie::{CookieAcquirer, SessionCookies, cookie_header};
pub use crate::download::{
    DownloadOutcome, DownloadPipeline, DownloadStatus, Downloaded, ILLEGAL_CHARS,
    MAX_FILENAME_CHARS, PipelineEvent, PipelineHandle, PipelineSummary, RESERVED_NAMES,
    sanitize_filename,
};
pub use crate::error::{DownloadFailure, Error, ErrorKind, Result};
pub use crate::listing::{
    Entry, KeyFilter, ListingBody, ListingError, ListingPage, ListingWalk, MISSING_KEY_CODE,
    accept, build_query, rewrite_marker,
};
pub use crate::resource::{ResourceUrl, query_escape, query_unescape};

/// Tracing target for cookie acquisition.
pub const TRACING_TARGET_COOKIE: &str = cookie::TRACING_TARGET;

/// Tracing target for listing walks.
pub const TRACING_TARGET_LISTING: &str = listing::TRACING_TARGET;

/// Tracing target for downloads.
pub const TRACING_TARGET_DOWNLOAD: &str = download::TRACING_TARGET;
