use super::error::{FileFailure, StagingError, TransferFailure};
use crate::upload::{BlobUploader, FileHandle, FileOutcome, UploadError, UploadedBlob};
use futures::future::join_all;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Owns the files staged for upload and reconciles commit results.
///
/// The staged list only grows through [`accept`](Self::accept) and only
/// shrinks through [`cancel`](Self::cancel) or a fully successful commit.
pub struct StagingController {
    uploader: Arc<dyn BlobUploader>,
    staged: Vec<FileHandle>,
    next_batch_id: u64,
    pending: Option<u64>,
}

/// Snapshot of the staged files for one commit.
///
/// Running it spawns one task per file on the current tokio runtime.
pub struct CommitBatch {
    id: u64,
    container: String,
    files: Vec<FileHandle>,
    uploader: Arc<dyn BlobUploader>,
    cancel: CancellationToken,
}

/// Settled results of a [`CommitBatch`], in staged order.
#[derive(Debug)]
pub struct BatchOutcome {
    batch_id: u64,
    pub outcomes: Vec<FileOutcome>,
}

#[derive(Debug)]
pub struct CommitReport {
    pub uploaded: Vec<UploadedBlob>,
    /// The batch settled after the staging state was cancelled; nothing was cleared.
    pub superseded: bool,
}

impl StagingController {
    pub fn new(uploader: Arc<dyn BlobUploader>) -> Self {
        Self {
            uploader,
            staged: Vec::new(),
            next_batch_id: 0,
            pending: None,
        }
    }

    pub fn accept(&mut self, files: impl IntoIterator<Item = FileHandle>) {
        let before = self.staged.len();
        self.staged.extend(files);
        debug!(
            added = self.staged.len() - before,
            staged = self.staged.len(),
            "Accepted files"
        );
    }

    pub fn list(&self) -> Vec<FileHandle> {
        self.staged.clone()
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    pub fn is_committing(&self) -> bool {
        self.pending.is_some()
    }

    /// Drops every staged file. Uploads already in flight keep running;
    /// their results no longer affect this controller.
    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            debug!("Cancelled while a commit was in flight; its result will be discarded");
        }
        self.staged.clear();
    }

    /// Forgets a pending batch whose outcome will never arrive.
    pub fn abandon_commit(&mut self) {
        self.pending = None;
    }

    pub fn begin_commit(&mut self, container: &str) -> Result<CommitBatch, StagingError> {
        if self.staged.is_empty() {
            warn!("No files to upload.");
            return Err(StagingError::EmptySubmission);
        }
        if self.pending.is_some() {
            return Err(StagingError::CommitInProgress);
        }

        let id = self.next_batch_id;
        self.next_batch_id += 1;
        self.pending = Some(id);

        info!(batch = id, files = self.staged.len(), container, "Starting upload");

        Ok(CommitBatch {
            id,
            container: container.to_string(),
            files: self.staged.clone(),
            uploader: Arc::clone(&self.uploader),
            cancel: CancellationToken::new(),
        })
    }

    /// Applies a settled batch: all-or-nothing.
    pub fn finish_commit(&mut self, outcome: BatchOutcome) -> Result<CommitReport, StagingError> {
        let current = self.pending == Some(outcome.batch_id);
        if current {
            self.pending = None;
        }

        let total = outcome.outcomes.len();
        let mut uploaded = Vec::new();
        let mut failures = Vec::new();
        for FileOutcome { name, result } in outcome.outcomes {
            match result {
                Ok(blob) => uploaded.push(blob),
                Err(error) => failures.push(FileFailure { name, error }),
            }
        }

        if !failures.is_empty() {
            warn!(
                batch = outcome.batch_id,
                failed = failures.len(),
                total,
                "Error uploading files"
            );
            return Err(TransferFailure {
                total,
                failures,
                uploaded,
            }
            .into());
        }

        if current {
            // Staging only appends, so the committed files are the first `total`.
            self.staged.drain(..total.min(self.staged.len()));
            info!(batch = outcome.batch_id, total, "All files uploaded successfully");
        } else {
            debug!(batch = outcome.batch_id, "Discarding result of a superseded commit");
        }

        Ok(CommitReport {
            uploaded,
            superseded: !current,
        })
    }

    /// Uploads every staged file concurrently and waits for all of them.
    pub async fn commit(&mut self, container: &str) -> Result<CommitReport, StagingError> {
        let batch = self.begin_commit(container)?;
        let outcome = batch.run().await;
        self.finish_commit(outcome)
    }
}

impl CommitBatch {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Token observed by every upload task of this batch.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn run(self) -> BatchOutcome {
        let handles: Vec<_> = self
            .files
            .iter()
            .cloned()
            .map(|file| {
                let uploader = Arc::clone(&self.uploader);
                let container = self.container.clone();
                let cancel = self.cancel.clone();
                tokio::spawn(async move {
                    let result = tokio::select! {
                        _ = cancel.cancelled() => Err(UploadError::Aborted),
                        result = uploader.upload(&container, &file) => result,
                    };
                    if let Err(e) = &result {
                        warn!(file = %file.name(), error = %e, "Upload failed");
                    }
                    FileOutcome {
                        name: file.name().to_string(),
                        result,
                    }
                })
            })
            .collect();

        let outcomes = join_all(handles)
            .await
            .into_iter()
            .zip(&self.files)
            .map(|(joined, file)| {
                joined.unwrap_or_else(|e| FileOutcome {
                    name: file.name().to_string(),
                    result: Err(UploadError::TaskFailed(e.to_string())),
                })
            })
            .collect();

        BatchOutcome {
            batch_id: self.id,
            outcomes,
        }
    }
}
