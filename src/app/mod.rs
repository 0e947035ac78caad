mod drop_surface;
mod state;
mod ui;

use crate::config::AppConfig;
use crate::staging::{StagingController, StagingError};
use crate::upload::{AzureBlobClient, BlobUploader, FileHandle};
pub use drop_surface::{DragEvent, DropSurface};
use eframe::{egui, App};
pub use state::{HeaderLabels, InFlightCommit, Notice, PanelState, ShellState};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{debug, error, info};

pub struct ChatShell {
    config: AppConfig,
    runtime: Runtime,
    staging: StagingController,
    drop_surface: DropSurface,
    state: ShellState,
}

impl ChatShell {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig, runtime: Runtime) -> Self {
        let uploader: Arc<dyn BlobUploader> = Arc::new(AzureBlobClient::new(&config.storage));
        Self::with_uploader(config, runtime, uploader)
    }

    pub fn with_uploader(
        config: AppConfig,
        runtime: Runtime,
        uploader: Arc<dyn BlobUploader>,
    ) -> Self {
        info!(title = %config.ui.title, "Initializing chat shell");
        Self {
            config,
            runtime,
            staging: StagingController::new(uploader),
            drop_surface: DropSurface::default(),
            state: ShellState::default(),
        }
    }

    pub fn state(&self) -> &ShellState {
        &self.state
    }

    pub fn staged(&self) -> Vec<FileHandle> {
        self.staging.list()
    }

    pub fn open_storage(&mut self) {
        self.state.open_storage();
    }

    pub fn share_url(&self) -> String {
        self.config
            .ui
            .share_url
            .clone()
            .or_else(|| self.config.storage.container_url().map(String::from))
            .unwrap_or_default()
    }

    pub fn accept_files(&mut self, files: Vec<FileHandle>) {
        if files.is_empty() {
            return;
        }
        self.staging.accept(files);
        self.state.notice = None;
    }

    pub fn start_commit(&mut self, ctx: &egui::Context) {
        let container = self
            .config
            .storage
            .container_name
            .clone()
            .unwrap_or_default();

        match self.staging.begin_commit(&container) {
            Ok(batch) => {
                let (sender, receiver) = std_mpsc::channel();
                self.state.commit = Some(InFlightCommit {
                    total: batch.len(),
                    token: batch.cancellation_token(),
                    receiver,
                });
                self.state.notice = None;
                self.state.show_details = false;

                let ctx = ctx.clone();
                self.runtime.spawn(async move {
                    let outcome = batch.run().await;
                    // The shell drops the receiver when the commit was cancelled.
                    let _ = sender.send(outcome);
                    ctx.request_repaint();
                });
            }
            Err(e) => {
                self.state.notice = Some(Notice::from_error(&e));
            }
        }
    }

    /// Clears staging and closes the storage panel. Uploads already running
    /// are left to finish; their result is ignored.
    pub fn cancel_storage(&mut self) {
        if self.state.commit.take().is_some() {
            debug!("Storage panel closed with uploads in flight");
        }
        self.staging.cancel();
        self.state.close_storage();
    }

    pub fn update_state(&mut self, ctx: &egui::Context) {
        let Some(commit) = &self.state.commit else {
            return;
        };

        let outcome = match commit.receiver.try_recv() {
            Ok(outcome) => outcome,
            Err(std_mpsc::TryRecvError::Empty) => return,
            Err(std_mpsc::TryRecvError::Disconnected) => {
                error!("Upload task ended without reporting a result");
                self.state.commit = None;
                self.staging.abandon_commit();
                self.state.notice = Some(Notice::Failure {
                    summary: "Upload failed: the upload task stopped unexpectedly".to_string(),
                    details: Vec::new(),
                });
                return;
            }
        };

        self.state.commit = None;
        match self.staging.finish_commit(outcome) {
            Ok(report) => {
                self.state.notice = Some(Notice::Success(format!(
                    "Uploaded {} file{}",
                    report.uploaded.len(),
                    if report.uploaded.len() == 1 { "" } else { "s" }
                )));
                self.state.close_storage();
            }
            Err(e) => {
                if let StagingError::TransferFailure(failure) = &e {
                    error!("Error uploading files: {}", failure);
                }
                self.state.notice = Some(Notice::from_error(&e));
            }
        }
        ctx.request_repaint();
    }
}

impl App for ChatShell {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_state(ctx);

        if self.state.panels.storage_open {
            let mut accepted = Vec::new();
            self.drop_surface.observe(ctx, |files| accepted = files);
            self.accept_files(accepted);
        }

        self.render(ctx);
    }
}

impl Drop for ChatShell {
    fn drop(&mut self) {
        if let Some(commit) = self.state.commit.take() {
            info!(files = commit.total, "Aborting uploads still in flight");
            commit.token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::{UploadError, UploadedBlob};
    use async_trait::async_trait;
    use std::time::{Duration, Instant};

    struct NamedFailures;

    #[async_trait]
    impl BlobUploader for NamedFailures {
        async fn upload(
            &self,
            _container: &str,
            file: &FileHandle,
        ) -> Result<UploadedBlob, UploadError> {
            if file.name().starts_with("bad") {
                return Err(UploadError::Rejected {
                    status: 500,
                    code: None,
                });
            }
            Ok(UploadedBlob {
                name: file.name().to_string(),
                blob_name: file.blob_name(),
                confirmation_id: "req".to_string(),
            })
        }
    }

    fn shell() -> ChatShell {
        let mut config = AppConfig::default();
        config.storage.container_name = Some("docs".to_string());
        let runtime = Runtime::new().unwrap();
        let mut shell = ChatShell::with_uploader(config, runtime, Arc::new(NamedFailures));
        shell.open_storage();
        shell
    }

    fn settle(shell: &mut ChatShell, ctx: &egui::Context) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while shell.state().is_uploading() {
            assert!(Instant::now() < deadline, "commit never settled");
            std::thread::sleep(Duration::from_millis(5));
            shell.update_state(ctx);
        }
    }

    #[test]
    fn save_with_nothing_staged_warns() {
        let ctx = egui::Context::default();
        let mut shell = shell();
        shell.start_commit(&ctx);
        assert!(!shell.state().is_uploading());
        assert_eq!(
            shell.state().notice,
            Some(Notice::Warning("No files to upload".to_string()))
        );
        assert!(shell.state().panels.storage_open);
    }

    #[test]
    fn successful_save_closes_storage_panel() {
        let ctx = egui::Context::default();
        let mut shell = shell();
        shell.accept_files(vec![
            FileHandle::from_bytes("a.txt", &b"a"[..]),
            FileHandle::from_bytes("b.txt", &b"b"[..]),
        ]);

        shell.start_commit(&ctx);
        settle(&mut shell, &ctx);

        assert!(shell.staged().is_empty());
        assert!(!shell.state().panels.storage_open);
        assert_eq!(
            shell.state().notice,
            Some(Notice::Success("Uploaded 2 files".to_string()))
        );
    }

    #[test]
    fn failed_save_keeps_files_and_panel() {
        let ctx = egui::Context::default();
        let mut shell = shell();
        shell.accept_files(vec![
            FileHandle::from_bytes("a.txt", &b"a"[..]),
            FileHandle::from_bytes("bad.txt", &b"b"[..]),
        ]);

        shell.start_commit(&ctx);
        settle(&mut shell, &ctx);

        assert_eq!(shell.staged().len(), 2);
        assert!(shell.state().panels.storage_open);
        match &shell.state().notice {
            Some(Notice::Failure { details, .. }) => {
                assert_eq!(details.len(), 1);
                assert!(details[0].starts_with("bad.txt"));
            }
            other => panic!("unexpected notice: {other:?}"),
        }
    }

    #[test]
    fn cancel_clears_staging_and_closes_panel() {
        let mut shell = shell();
        shell.accept_files(vec![FileHandle::from_bytes("a.txt", &b"a"[..])]);
        shell.cancel_storage();
        assert!(shell.staged().is_empty());
        assert!(!shell.state().panels.storage_open);
    }
}
