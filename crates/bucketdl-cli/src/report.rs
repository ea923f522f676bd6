//! Progress reporting for the download pipeline.

use bucketdl_client::{DownloadOutcome, DownloadStatus, PipelineEvent, PipelineSummary};

use crate::TRACING_TARGET_REPORT;

/// Where the consumer is in the event sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Waiting for item events; `seen` have arrived so far.
    Running { seen: usize },
    /// The producer reported completion.
    Finished(PipelineSummary),
}

/// Consumes pipeline events and reports each one.
#[derive(Debug)]
pub struct ProgressReport {
    total: usize,
    progress: Progress,
}

impl ProgressReport {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            progress: Progress::Running { seen: 0 },
        }
    }

    #[inline]
    pub fn progress(&self) -> Progress {
        self.progress
    }

    /// Records one event and logs its line.
    ///
    /// Events after [`Progress::Finished`] are ignored.
    pub fn observe(&mut self, event: &PipelineEvent) {
        let Progress::Running { seen } = self.progress else {
            return;
        };

        match event {
            PipelineEvent::Item(outcome) => {
                let line = describe(outcome, self.total);
                match outcome.status() {
                    DownloadStatus::Failed => {
                        tracing::warn!(target: TRACING_TARGET_REPORT, "{line}");
                    }
                    DownloadStatus::Written | DownloadStatus::Skipped => {
                        tracing::info!(target: TRACING_TARGET_REPORT, "{line}");
                    }
                }
                self.progress = Progress::Running { seen: seen + 1 };
            }
            PipelineEvent::Finished(summary) => {
                tracing::info!(
                    target: TRACING_TARGET_REPORT,
                    total = summary.total,
                    written = summary.written,
                    skipped = summary.skipped,
                    failed = summary.failed,
                    cancelled = summary.cancelled,
                    "Downloads finished"
                );
                self.progress = Progress::Finished(*summary);
            }
        }
    }

    /// Returns the summary once the producer has reported completion.
    pub fn summary(&self) -> Option<PipelineSummary> {
        match self.progress {
            Progress::Finished(summary) => Some(summary),
            Progress::Running { .. } => None,
        }
    }
}

/// Formats one outcome as `✓ [n/total] path` or `X [n/total] url: error`.
pub fn describe(outcome: &DownloadOutcome, total: usize) -> String {
    let position = outcome.index + 1;
    match outcome.error() {
        None => format!("✓ [{position}/{total}] {}", outcome.resolved()),
        Some(err) => format!("X [{position}/{total}] {}: {err}", outcome.resolved()),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use bucketdl_client::{DownloadFailure, Downloaded, Error, ResourceUrl};

    use super::*;

    fn written(index: usize) -> DownloadOutcome {
        DownloadOutcome {
            index,
            resource: ResourceUrl::new("https://cdn.example.com/a.jpg"),
            result: Ok(Downloaded::Written {
                path: PathBuf::from("resources/a.jpg"),
                bytes: 3,
            }),
        }
    }

    fn failed(index: usize) -> DownloadOutcome {
        DownloadOutcome {
            index,
            resource: ResourceUrl::new("https://cdn.example.com/b.jpg"),
            result: Err(Error::download(
                "https://cdn.example.com/b.jpg",
                DownloadFailure::Status(404),
            )),
        }
    }

    #[test]
    fn test_describe_uses_one_based_position() {
        let ok = describe(&written(0), 2);
        assert!(ok.starts_with("✓ [1/2] "));
        assert!(ok.ends_with("a.jpg"));

        let err = describe(&failed(1), 2);
        assert!(err.starts_with("X [2/2] https://cdn.example.com/b.jpg: "));
    }

    #[test]
    fn test_transitions_to_finished() {
        let mut report = ProgressReport::new(2);
        report.observe(&PipelineEvent::Item(written(0)));
        report.observe(&PipelineEvent::Item(failed(1)));
        assert_eq!(report.progress(), Progress::Running { seen: 2 });
        assert!(report.summary().is_none());

        let summary = PipelineSummary {
            total: 2,
            written: 1,
            skipped: 0,
            failed: 1,
            cancelled: false,
        };
        report.observe(&PipelineEvent::Finished(summary));
        assert_eq!(report.summary(), Some(summary));

        report.observe(&PipelineEvent::Item(written(0)));
        assert_eq!(report.progress(), Progress::Finished(summary));
    }
}
