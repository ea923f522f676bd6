//! Sequential download producer and its event stream.

use std::path::PathBuf;

use strum::{AsRefStr, IntoStaticStr};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::TRACING_TARGET;
use super::fetch::Downloaded;
use crate::connect::BucketClient;
use crate::error::{Error, Result};
use crate::resource::ResourceUrl;

/// Terminal state of one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum DownloadStatus {
    Written,
    Skipped,
    Failed,
}

/// Result of attempting one resource.
#[derive(Debug)]
pub struct DownloadOutcome {
    /// Position of the resource in the pipeline's sequence.
    pub index: usize,
    /// The resource that was attempted.
    pub resource: ResourceUrl,
    /// The local file, or the item-scoped error.
    pub result: Result<Downloaded>,
}

impl DownloadOutcome {
    /// Returns the terminal state of the resource.
    pub fn status(&self) -> DownloadStatus {
        match &self.result {
            Ok(Downloaded::Written { .. }) => DownloadStatus::Written,
            Ok(Downloaded::Skipped { .. }) => DownloadStatus::Skipped,
            Err(_) => DownloadStatus::Failed,
        }
    }

    /// Returns the error, if the resource failed.
    pub fn error(&self) -> Option<&Error> {
        self.result.as_ref().err()
    }

    /// Returns the written path, or the resource url when nothing was written.
    pub fn resolved(&self) -> String {
        match &self.result {
            Ok(Downloaded::Written { path, .. }) => path.display().to_string(),
            Ok(Downloaded::Skipped { .. }) | Err(_) => self.resource.to_string(),
        }
    }
}

/// Counts of what the pipeline did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    /// Length of the resource sequence.
    pub total: usize,
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Whether the producer stopped before reaching the end.
    pub cancelled: bool,
}

impl PipelineSummary {
    fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    fn record(&mut self, status: DownloadStatus) {
        match status {
            DownloadStatus::Written => self.written += 1,
            DownloadStatus::Skipped => self.skipped += 1,
            DownloadStatus::Failed => self.failed += 1,
        }
    }

    /// Number of resources that reached a terminal state.
    pub fn processed(&self) -> usize {
        self.written + self.skipped + self.failed
    }
}

/// Message delivered to the pipeline's single consumer.
#[derive(Debug)]
pub enum PipelineEvent {
    /// One resource reached a terminal state.
    Item(DownloadOutcome),
    /// The producer is done; no further events follow.
    Finished(PipelineSummary),
}

impl PipelineEvent {
    /// Returns the event's index.
    ///
    /// [`Finished`](Self::Finished) carries the sequence length after a full
    /// run and the number of processed items after a cancelled one, so an
    /// index equal to the length always means every item was attempted.
    pub fn index(&self) -> usize {
        match self {
            Self::Item(outcome) => outcome.index,
            Self::Finished(summary) if summary.cancelled => summary.processed(),
            Self::Finished(summary) => summary.total,
        }
    }
}

/// Walks a resource sequence one item at a time, downloading each.
///
/// The producer does not start item `i + 1` until the consumer has received
/// the event for item `i`. Item failures never stop the walk.
#[derive(Debug)]
pub struct DownloadPipeline {
    client: BucketClient,
    resources: Vec<ResourceUrl>,
    cookie_url: String,
    dest_dir: PathBuf,
    cancel_token: CancellationToken,
}

impl DownloadPipeline {
    /// Creates a pipeline over `resources`, writing into `dest_dir`.
    pub fn new(
        client: BucketClient,
        resources: Vec<ResourceUrl>,
        cookie_url: impl Into<String>,
        dest_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            resources,
            cookie_url: cookie_url.into(),
            dest_dir: dest_dir.into(),
            cancel_token: CancellationToken::new(),
        }
    }

    /// Ties the pipeline to an external cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, cancel_token: CancellationToken) -> Self {
        self.cancel_token = cancel_token;
        self
    }

    /// Spawns the producer as a background task.
    pub fn spawn(self) -> PipelineHandle {
        let (events_tx, events_rx) = mpsc::channel(1);
        let total = self.resources.len();
        let cancel_token = self.cancel_token.clone();
        let task = tokio::spawn(async move { self.run(events_tx).await });

        PipelineHandle {
            events: events_rx,
            task,
            cancel_token,
            total,
        }
    }

    async fn run(self, events: mpsc::Sender<PipelineEvent>) -> PipelineSummary {
        let mut summary = PipelineSummary::new(self.resources.len());

        tracing::info!(
            target: TRACING_TARGET,
            total = summary.total,
            dest_dir = %self.dest_dir.display(),
            "Starting download pipeline"
        );

        for (index, resource) in self.resources.iter().enumerate() {
            // Capacity frees up only once the previous event has been received.
            let permit = tokio::select! {
                biased;
                () = self.cancel_token.cancelled() => None,
                permit = events.reserve() => permit.ok(),
            };
            let Some(permit) = permit else {
                summary.cancelled = true;
                break;
            };

            let download =
                self.client
                    .download_resource(resource, &self.cookie_url, &self.dest_dir);
            let result = tokio::select! {
                biased;
                () = self.cancel_token.cancelled() => None,
                result = download => Some(result),
            };
            let Some(result) = result else {
                summary.cancelled = true;
                break;
            };

            let outcome = DownloadOutcome {
                index,
                resource: resource.clone(),
                result,
            };
            summary.record(outcome.status());
            log_outcome(&outcome);

            permit.send(PipelineEvent::Item(outcome));
        }

        if summary.cancelled {
            tracing::info!(
                target: TRACING_TARGET,
                processed = summary.processed(),
                total = summary.total,
                "Download pipeline cancelled"
            );
        } else {
            tracing::info!(
                target: TRACING_TARGET,
                written = summary.written,
                skipped = summary.skipped,
                failed = summary.failed,
                "Download pipeline finished"
            );
        }

        if events.send(PipelineEvent::Finished(summary)).await.is_err() {
            tracing::trace!(target: TRACING_TARGET, "Consumer gone before final event");
        }

        summary
    }
}

fn log_outcome(outcome: &DownloadOutcome) {
    match &outcome.result {
        Ok(_) => tracing::debug!(
            target: TRACING_TARGET,
            index = outcome.index,
            url = %outcome.resource,
            status = outcome.status().as_ref(),
            "Resource done"
        ),
        Err(err) => tracing::warn!(
            target: TRACING_TARGET,
            index = outcome.index,
            url = %outcome.resource,
            error = %err,
            "Resource failed"
        ),
    }
}

/// Consumer side of a spawned [`DownloadPipeline`].
#[derive(Debug)]
pub struct PipelineHandle {
    events: mpsc::Receiver<PipelineEvent>,
    task: JoinHandle<PipelineSummary>,
    cancel_token: CancellationToken,
    total: usize,
}

impl PipelineHandle {
    /// Receives the next event, or `None` once the producer has exited.
    pub async fn next_event(&mut self) -> Option<PipelineEvent> {
        self.events.recv().await
    }

    /// Asks the producer to stop, interrupting any in-flight request.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Returns the length of the resource sequence.
    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Drains remaining events and waits for the producer to exit.
    ///
    /// Returns `None` if the producer task panicked.
    pub async fn join(mut self) -> Option<PipelineSummary> {
        while self.events.recv().await.is_some() {}
        self.task.await.ok()
    }
}
