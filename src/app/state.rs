use crate::staging::{BatchOutcome, StagingError};
use std::sync::mpsc::Receiver;
use tokio_util::sync::CancellationToken;

/// Below this window width the header uses short labels.
pub const NARROW_WIDTH: f32 = 480.0;

const COPY_URL: &str = "Copy URL";
const COPIED_URL: &str = "Copied URL";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PanelState {
    pub share_open: bool,
    pub storage_open: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Warning(String),
    Failure { summary: String, details: Vec<String> },
}

impl Notice {
    pub fn from_error(err: &StagingError) -> Self {
        match err {
            StagingError::EmptySubmission | StagingError::CommitInProgress => {
                Notice::Warning(err.to_string())
            }
            StagingError::TransferFailure(failure) => Notice::Failure {
                summary: format!(
                    "Upload failed: {} of {} files could not be uploaded",
                    failure.failures.len(),
                    failure.total
                ),
                details: failure
                    .failures
                    .iter()
                    .map(|f| format!("{} - {}", f.name, f.error))
                    .collect(),
            },
        }
    }
}

/// Header button labels for the current window width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLabels {
    pub share: Option<&'static str>,
    pub storage: &'static str,
}

impl HeaderLabels {
    pub fn for_width(width: f32) -> Self {
        if width < NARROW_WIDTH {
            Self {
                share: None,
                storage: "S",
            }
        } else {
            Self {
                share: Some("Share"),
                storage: "Storage",
            }
        }
    }
}

/// A commit whose uploads are still running on the runtime.
pub struct InFlightCommit {
    pub total: usize,
    pub token: CancellationToken,
    pub receiver: Receiver<BatchOutcome>,
}

#[derive(Default)]
pub struct ShellState {
    pub panels: PanelState,
    pub copy_clicked: bool,
    pub notice: Option<Notice>,
    pub show_details: bool,
    pub commit: Option<InFlightCommit>,
}

impl ShellState {
    pub fn copy_label(&self) -> &'static str {
        if self.copy_clicked {
            COPIED_URL
        } else {
            COPY_URL
        }
    }

    pub fn open_share(&mut self) {
        self.panels.share_open = true;
    }

    pub fn dismiss_share(&mut self) {
        self.panels.share_open = false;
        self.copy_clicked = false;
    }

    pub fn open_storage(&mut self) {
        self.panels.storage_open = true;
        self.notice = None;
        self.show_details = false;
    }

    pub fn close_storage(&mut self) {
        self.panels.storage_open = false;
    }

    pub fn is_uploading(&self) -> bool {
        self.commit.is_some()
    }
}
