use super::{ChatShell, HeaderLabels, Notice};
use crate::upload::FileHandle;
use crate::utils::color::parse_hex_color;
use crate::utils::file_size::format_size;
use eframe::egui::{self, Align, Color32, RichText};
use rfd::FileDialog;
use tracing::warn;

const DEFAULT_ACCENT: Color32 = Color32::from_rgb(15, 108, 189);
const SUCCESS: Color32 = Color32::from_rgb(0, 180, 0);
const FAILURE: Color32 = Color32::from_rgb(220, 50, 50);
const MUTED: Color32 = Color32::from_rgb(150, 150, 150);

enum StorageAction {
    AddFiles(Vec<FileHandle>),
    Save,
    Cancel,
}

impl ChatShell {
    pub fn render(&mut self, ctx: &egui::Context) {
        let accent = self.accent();
        self.render_header(ctx, accent);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(40.0);
            ui.vertical_centered(|ui| {
                ui.heading(&self.config.ui.title);
                ui.add_space(5.0);
                ui.label(
                    RichText::new("Start chatting")
                        .color(ui.visuals().text_color().gamma_multiply(0.7)),
                );
            });

            if !self.state.panels.storage_open {
                ui.with_layout(egui::Layout::bottom_up(Align::Center), |ui| {
                    ui.add_space(15.0);
                    self.render_notice(ui);
                });
            }
        });

        self.render_share_dialog(ctx);
        self.render_storage_dialog(ctx, accent);
    }

    fn accent(&self) -> Color32 {
        self.config
            .ui
            .accent_color
            .as_deref()
            .and_then(parse_hex_color)
            .unwrap_or(DEFAULT_ACCENT)
    }

    fn render_header(&mut self, ctx: &egui::Context, accent: Color32) {
        let labels = HeaderLabels::for_width(ctx.screen_rect().width());
        let show_share = self.config.ui.show_share_button;
        let show_storage = self.config.ui.show_storage_button;
        let mut open_share = false;
        let mut open_storage = false;

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.label(RichText::new("💬").size(24.0).color(accent));
                ui.heading(&self.config.ui.title);

                ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                    if show_storage && ui.button(format!("🗄 {}", labels.storage)).clicked() {
                        open_storage = true;
                    }
                    if show_share {
                        let text = match labels.share {
                            Some(label) => format!("🔗 {}", label),
                            None => "🔗".to_string(),
                        };
                        if ui.button(text).clicked() {
                            open_share = true;
                        }
                    }
                });
            });
            ui.add_space(8.0);
        });

        if open_share {
            self.state.open_share();
        }
        if open_storage {
            self.state.open_storage();
        }
    }

    fn render_share_dialog(&mut self, ctx: &egui::Context) {
        if !self.state.panels.share_open {
            return;
        }

        let url = self.share_url();
        let copy_label = self.state.copy_label();
        let mut open = true;
        let mut copied = false;

        egui::Window::new("Share the web app")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let mut shown = url.as_str();
                    ui.add(egui::TextEdit::singleline(&mut shown).desired_width(320.0));
                    if ui.button(format!("📋 {}", copy_label)).clicked() {
                        ui.output_mut(|o| o.copied_text = url.clone());
                        copied = true;
                    }
                    if !url.is_empty() && ui.button("Open").clicked() {
                        if let Err(e) = open::that(&url) {
                            warn!("Failed to open link: {}", e);
                        }
                    }
                });
            });

        if copied {
            self.state.copy_clicked = true;
        }
        if !open {
            self.state.dismiss_share();
        }
    }

    fn render_storage_dialog(&mut self, ctx: &egui::Context, accent: Color32) {
        if !self.state.panels.storage_open {
            return;
        }

        let staged = self.staging.list();
        let uploading = self.state.is_uploading();
        let mut open = true;
        let mut action = None;

        egui::Window::new("Add Data to your Chatbot")
            .open(&mut open)
            .collapsible(false)
            .resizable(true)
            .default_width(560.0)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                self.drop_surface.show(ui, accent);
                ui.add_space(8.0);

                if ui.button("📁 Add Files").clicked() {
                    if let Some(paths) = FileDialog::new().pick_files() {
                        action = Some(StorageAction::AddFiles(
                            paths.into_iter().map(FileHandle::from_path).collect(),
                        ));
                    }
                }

                if !staged.is_empty() {
                    ui.add_space(10.0);
                    ui.label(format!("Uploaded files ({}):", staged.len()));
                    egui::ScrollArea::vertical()
                        .max_height(200.0)
                        .show(ui, |ui| {
                            for file in &staged {
                                ui.horizontal(|ui| {
                                    ui.label(file.name());
                                    if let Some(size) = file.size_hint() {
                                        ui.colored_label(MUTED, format_size(size));
                                    }
                                });
                            }
                        });
                }

                if let Some(commit) = &self.state.commit {
                    ui.add_space(10.0);
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label(format!("📤 Uploading {} files...", commit.total));
                    });
                }

                self.render_notice(ui);

                ui.add_space(20.0);
                ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                    if ui.button("Cancel").clicked() {
                        action = Some(StorageAction::Cancel);
                    }
                    let save = egui::Button::new(RichText::new("Save").color(Color32::WHITE))
                        .fill(accent);
                    if ui.add_enabled(!uploading, save).clicked() {
                        action = Some(StorageAction::Save);
                    }
                });
            });

        match action {
            Some(StorageAction::AddFiles(files)) => self.accept_files(files),
            Some(StorageAction::Save) => self.start_commit(ctx),
            Some(StorageAction::Cancel) => self.cancel_storage(),
            None if !open => self.cancel_storage(),
            None => {}
        }
    }

    fn render_notice(&mut self, ui: &mut egui::Ui) {
        let state = &mut self.state;
        let Some(notice) = &state.notice else {
            return;
        };

        ui.add_space(10.0);
        match notice {
            Notice::Success(message) => {
                ui.colored_label(SUCCESS, format!("✅ {}", message));
            }
            Notice::Warning(message) => {
                ui.colored_label(MUTED, format!("⚠ {}", message));
            }
            Notice::Failure { summary, details } => {
                ui.colored_label(FAILURE, format!("❌ {}", summary));
                if !details.is_empty() {
                    render_details(ui, details, &mut state.show_details);
                }
            }
        }
    }
}

fn render_details(ui: &mut egui::Ui, details: &[String], show_details: &mut bool) {
    if ui
        .button(if *show_details {
            "Hide Details"
        } else {
            "Show Details"
        })
        .clicked()
    {
        *show_details = !*show_details;
    }

    if *show_details {
        egui::ScrollArea::vertical()
            .id_source("failure_details")
            .max_height(150.0)
            .show(ui, |ui| {
                egui::Frame::none()
                    .fill(ui.style().visuals.extreme_bg_color)
                    .show(ui, |ui| {
                        ui.add_space(8.0);
                        for line in details {
                            ui.horizontal(|ui| {
                                ui.label("❌");
                                ui.colored_label(FAILURE, line);
                            });
                            ui.add_space(4.0);
                        }
                    });
            });
    }
}
