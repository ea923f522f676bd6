//! Downloading listed resources to local storage.
//!
//! [`DownloadPipeline`] visits resources strictly in sequence order, one
//! request in flight at a time, and reports each [`DownloadOutcome`] to a
//! single consumer through a one-slot hand-off channel.

/// Tracing target for download operations.
pub const TRACING_TARGET: &str = "bucketdl_client::download";

mod fetch;
mod pipeline;
mod sanitize;
#[cfg(test)]
mod trickle;

pub(crate) use fetch::fetch_resource;
pub use fetch::Downloaded;
pub use pipeline::{
    DownloadOutcome, DownloadPipeline, DownloadStatus, PipelineEvent, PipelineHandle,
    PipelineSummary,
};
pub use sanitize::{ILLEGAL_CHARS, MAX_FILENAME_CHARS, RESERVED_NAMES, sanitize_filename};
