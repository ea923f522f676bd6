#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod report;
mod shutdown;
mod telemetry;

use std::process;

use anyhow::Context;
use bucketdl_client::{BucketClient, DownloadPipeline, ListingWalk, ResourceUrl};
use tokio_util::sync::CancellationToken;

use crate::config::Cli;
use crate::report::ProgressReport;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "bucketdl_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "bucketdl_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "bucketdl_cli::config";
pub const TRACING_TARGET_REPORT: &str = "bucketdl_cli::report";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = format!("{error:#}"),
            "bucketdl terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Lists the bucket, then downloads every accepted key in order.
///
/// Item failures are reported but do not fail the run; a listing error does.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    telemetry::init_tracing()?;
    tracing::info!(
        target: TRACING_TARGET_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        "Starting bucketdl"
    );
    cli.log();
    cli.validate()?;

    let client = BucketClient::new(cli.client.clone()).context("failed to create bucket client")?;

    let cancel_token = CancellationToken::new();
    shutdown::cancel_on_shutdown(cancel_token.clone());

    let query = cli.bucket.query();
    let walk = tokio::select! {
        biased;
        () = cancel_token.cancelled() => {
            tracing::info!(target: TRACING_TARGET_SHUTDOWN, "Listing interrupted");
            return Ok(());
        }
        walk = client.walk_listing(
            &cli.bucket.bucket_url,
            &query,
            &cli.bucket.cookie_url,
            &cli.bucket.ignore,
        ) => walk,
    };

    let resources = settle_listing(walk)?;

    let mut handle = DownloadPipeline::new(
        client,
        resources,
        cli.bucket.cookie_url.clone(),
        cli.bucket.destination(),
    )
    .with_cancellation(cancel_token.clone())
    .spawn();

    let mut report = ProgressReport::new(handle.total());
    while let Some(event) = handle.next_event().await {
        report.observe(&event);
    }

    // Stops the shutdown watcher.
    cancel_token.cancel();

    match report.summary() {
        Some(summary) if summary.cancelled => {
            tracing::info!(
                target: TRACING_TARGET_SHUTDOWN,
                processed = summary.processed(),
                total = summary.total,
                "Downloads cancelled"
            );
            Ok(())
        }
        Some(_) => Ok(()),
        None => anyhow::bail!("download pipeline stopped without reporting completion"),
    }
}

/// Logs the walk and turns it into the list of resources, or its error.
fn settle_listing(walk: ListingWalk) -> anyhow::Result<Vec<ResourceUrl>> {
    tracing::info!(
        target: TRACING_TARGET_STARTUP,
        pages = walk.pages,
        resources = walk.resources.len(),
        ignored = walk.ignored,
        "Listing finished"
    );

    if let Some(err) = &walk.error
        && !walk.resources.is_empty()
    {
        tracing::warn!(
            target: TRACING_TARGET_STARTUP,
            kept = walk.resources.len(),
            kind = err.kind_str(),
            "Listing ended early, discarding partial results"
        );
    }

    walk.into_result().context("bucket listing failed")
}
