use crate::upload::FileHandle;
use bytes::Bytes;
use eframe::egui::{self, Align2, Color32, FontId, Sense, Stroke};
use tracing::warn;

/// Drag gestures other than the drop itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEvent {
    Enter,
    Over,
    Leave,
}

/// Turns native file drops into [`FileHandle`]s.
///
/// Only remembers whether a drag is currently hovering; everything dropped
/// is handed to the caller, unfiltered and in platform order.
#[derive(Debug, Default)]
pub struct DropSurface {
    dragging: bool,
}

impl DropSurface {
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn drag(&mut self, event: DragEvent) {
        self.dragging = matches!(event, DragEvent::Enter | DragEvent::Over);
    }

    /// Ends the drag and reports every dropped file exactly once.
    pub fn drop_files<F>(&mut self, dropped: Vec<egui::DroppedFile>, on_files_accepted: F)
    where
        F: FnOnce(Vec<FileHandle>),
    {
        self.dragging = false;
        let files = dropped.into_iter().filter_map(to_file_handle).collect();
        on_files_accepted(files);
    }

    /// Feeds one frame of window input through the surface.
    pub fn observe<F>(&mut self, ctx: &egui::Context, on_files_accepted: F)
    where
        F: FnOnce(Vec<FileHandle>),
    {
        let (hovering, dropped) = ctx.input(|i| {
            (
                !i.raw.hovered_files.is_empty(),
                i.raw.dropped_files.clone(),
            )
        });

        if !dropped.is_empty() {
            self.drop_files(dropped, on_files_accepted);
            return;
        }

        match (hovering, self.dragging) {
            (true, false) => self.drag(DragEvent::Enter),
            (true, true) => self.drag(DragEvent::Over),
            (false, true) => self.drag(DragEvent::Leave),
            (false, false) => {}
        }
    }

    pub fn show(&self, ui: &mut egui::Ui, accent: Color32) -> egui::Response {
        let size = egui::vec2(ui.available_width(), 120.0);
        let (rect, response) = ui.allocate_exact_size(size, Sense::hover());

        let (stroke_color, fill) = if self.dragging {
            (accent, accent.gamma_multiply(0.1))
        } else {
            (Color32::from_gray(180), Color32::TRANSPARENT)
        };

        let painter = ui.painter();
        painter.rect_filled(rect, 5.0, fill);
        painter.rect_stroke(rect, 5.0, Stroke::new(2.0, stroke_color));
        painter.text(
            rect.center(),
            Align2::CENTER_CENTER,
            if self.dragging {
                "Release to add files"
            } else {
                "Drop files here"
            },
            FontId::proportional(16.0),
            ui.visuals().text_color(),
        );

        response
    }
}

fn to_file_handle(file: egui::DroppedFile) -> Option<FileHandle> {
    match (file.path, file.bytes) {
        (Some(path), _) if file.name.is_empty() => Some(FileHandle::from_path(path)),
        (Some(path), _) => Some(FileHandle::from_named_path(file.name, path)),
        (None, Some(bytes)) => Some(FileHandle::from_bytes(file.name, Bytes::from(bytes.to_vec()))),
        (None, None) => {
            warn!(name = %file.name, "Dropped item has no readable content, skipping");
            None
        }
    }
}
