mod controller;
mod error;

pub use controller::{BatchOutcome, CommitBatch, CommitReport, StagingController};
pub use error::{FileFailure, StagingError, TransferFailure};
