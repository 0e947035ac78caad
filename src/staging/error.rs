use crate::upload::{UploadError, UploadedBlob};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StagingError {
    #[error("No files to upload")]
    EmptySubmission,

    #[error("An upload is already in progress")]
    CommitInProgress,

    #[error(transparent)]
    TransferFailure(#[from] TransferFailure),
}

/// One file that did not make it to storage.
#[derive(Debug)]
pub struct FileFailure {
    pub name: String,
    pub error: UploadError,
}

/// Batch-level failure of a commit: at least one upload failed.
///
/// Uploads that did succeed are listed in `uploaded`; they are not rolled back.
#[derive(Debug)]
pub struct TransferFailure {
    pub total: usize,
    pub failures: Vec<FileFailure>,
    pub uploaded: Vec<UploadedBlob>,
}

impl TransferFailure {
    /// The failure that triggered the batch error.
    pub fn cause(&self) -> Option<&FileFailure> {
        self.failures.first()
    }

    pub fn failed_names(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|f| f.name.as_str())
    }
}

impl fmt::Display for TransferFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} uploads failed",
            self.failures.len(),
            self.total
        )?;
        if let Some(first) = self.cause() {
            write!(f, "; {}: {}", first.name, first.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for TransferFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause()
            .map(|f| &f.error as &(dyn std::error::Error + 'static))
    }
}
