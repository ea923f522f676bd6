//! Bucket client module.
//!
//! This module provides the main client interface: the two operations the
//! outer layer calls, [`BucketClient::search_bucket`] and
//! [`BucketClient::download_resource`], plus the pipeline entry point.

mod client;
mod config;

pub use client::{BucketClient, TRACING_TARGET};
pub use config::{
    ClientConfig, DEFAULT_COOKIE_TIMEOUT, DEFAULT_MAX_PAGES, DEFAULT_REQUEST_TIMEOUT,
    PaginationPolicy,
};
