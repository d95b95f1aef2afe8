//! Panel rendering for the studio window.

use eframe::egui;

use crate::api::types::Emotion;
use crate::api::worker::Job;
use crate::audio::spectrum::BIN_COUNT;
use crate::gui::app::{StatusKind, StudioApp};

/// Soft and hard warning thresholds for the character counter.
pub const COUNTER_WARN: usize = 400;
pub const COUNTER_DANGER: usize = 450;
pub const TEXT_LIMIT: usize = 500;

const VIS_BACKGROUND: egui::Color32 = egui::Color32::from_rgb(248, 249, 250);
const VIS_GRADIENT_BOTTOM: egui::Color32 = egui::Color32::from_rgb(102, 126, 234);
const VIS_GRADIENT_TOP: egui::Color32 = egui::Color32::from_rgb(118, 75, 162);

/// Counter recoloring. Styling only; nothing stops longer input.
pub(crate) fn counter_color(len: usize) -> egui::Color32 {
    if len > COUNTER_DANGER {
        egui::Color32::from_rgb(255, 107, 107)
    } else if len > COUNTER_WARN {
        egui::Color32::from_rgb(255, 212, 59)
    } else {
        egui::Color32::from_rgb(102, 102, 102)
    }
}

pub(crate) fn generate_enabled(text: &str, generating: bool, server_ready: bool) -> bool {
    !text.trim().is_empty() && !generating && server_ready
}

/// `m:ss`, floored, the way players label time.
pub(crate) fn format_time(seconds: f32) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

pub(crate) fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}

fn format_created(secs: f64) -> String {
    chrono::DateTime::from_timestamp(secs as i64, 0)
        .map(|dt| {
            dt.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|| "-".to_string())
}

impl StudioApp {
    pub(crate) fn render_central(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false; 2])
                .show(ui, |ui| {
                    self.render_header(ui);
                    ui.separator();
                    self.render_input_section(ui);
                    ui.add_space(8.0);
                    self.render_voice_settings(ui);
                    ui.add_space(10.0);
                    self.render_actions(ui);
                    ui.separator();
                    self.render_playback(ui);
                    ui.add_space(6.0);
                    self.render_visualizer(ui);
                    ui.separator();
                    self.render_library(ui);
                    self.render_server_settings(ui);
                });
        });
    }

    fn render_header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("🎙 Voicebox Studio");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(&self.status_text);
                let (rect, _) =
                    ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
                let color = match self.status_kind {
                    StatusKind::Ready => egui::Color32::from_rgb(81, 207, 102),
                    StatusKind::Generating => egui::Color32::from_rgb(255, 212, 59),
                };
                ui.painter().circle_filled(rect.center(), 5.0, color);
            });
        });
    }

    fn render_input_section(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("Text").strong());
        ui.add(
            egui::TextEdit::multiline(&mut self.text)
                .desired_width(f32::INFINITY)
                .desired_rows(5)
                .hint_text("Type the text to speak..."),
        );
        let len = self.text.chars().count();
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(
                egui::RichText::new(format!("{len} / {TEXT_LIMIT}")).color(counter_color(len)),
            );
        });
    }

    fn render_voice_settings(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("Voice").strong());
        ui.horizontal(|ui| {
            ui.label("Emotion");
            egui::ComboBox::from_id_salt("emotion_select")
                .selected_text(self.emotion.label())
                .show_ui(ui, |ui| {
                    for emotion in Emotion::ALL {
                        ui.selectable_value(&mut self.emotion, emotion, emotion.label());
                    }
                });
        });
        ui.add(
            egui::Slider::new(&mut self.speed, 0.5..=2.0)
                .step_by(0.1)
                .suffix("x")
                .text("Speed"),
        );
        ui.add(
            egui::Slider::new(&mut self.exaggeration, 0.5..=2.0)
                .step_by(0.1)
                .text("Exaggeration"),
        );
        ui.add(
            egui::Slider::new(&mut self.cfg_weight, 0.0..=1.0)
                .step_by(0.1)
                .text("CFG weight"),
        );
    }

    fn render_actions(&mut self, ui: &mut egui::Ui) {
        let can_generate = generate_enabled(&self.text, self.generating, self.server_ready());
        let has_audio = self.current_audio.is_some();

        let mut generate = false;
        let mut play = false;
        let mut download = false;
        let mut clear = false;
        ui.horizontal(|ui| {
            generate = ui
                .add_enabled(can_generate, egui::Button::new("🎵 Generate"))
                .clicked();
            play = ui.add_enabled(has_audio, egui::Button::new("▶ Play")).clicked();
            download = ui
                .add_enabled(has_audio, egui::Button::new("⬇ Download"))
                .clicked();
            clear = ui.button("🗑 Clear").clicked();
        });

        if generate {
            self.generate();
        }
        if play {
            self.play_action();
        }
        if download {
            self.download();
        }
        if clear {
            self.clear_all();
        }
    }

    fn render_playback(&mut self, ui: &mut egui::Ui) {
        let has_session = self.session.is_some();
        let playing = self
            .session
            .as_ref()
            .map(|s| s.is_playing())
            .unwrap_or(false);
        let duration_secs = self
            .session
            .as_ref()
            .map(|s| s.duration().as_secs_f32())
            .unwrap_or(0.0);

        let mut toggle = false;
        let mut stop = false;
        let mut seek: Option<f32> = None;
        ui.horizontal(|ui| {
            let icon = if playing { "⏸" } else { "▶" };
            toggle = ui.add_enabled(has_session, egui::Button::new(icon)).clicked();
            stop = ui.add_enabled(has_session, egui::Button::new("⏹")).clicked();

            ui.label(format_time(self.seek_pos));
            let slider = ui.add_enabled(
                has_session,
                egui::Slider::new(&mut self.seek_pos, 0.0..=duration_secs.max(0.001))
                    .show_value(false),
            );
            if slider.changed() {
                seek = Some(self.seek_pos);
            }
            ui.label(format_time(duration_secs));
        });

        if toggle {
            self.toggle_playback();
        }
        if stop {
            self.stop_playback();
        }
        if let Some(target) = seek {
            self.seek_to(target);
        }
    }

    fn render_visualizer(&mut self, ui: &mut egui::Ui) {
        let (response, painter) = ui.allocate_painter(
            egui::vec2(ui.available_width(), 120.0),
            egui::Sense::hover(),
        );
        let rect = response.rect;
        let painter = painter.with_clip_rect(rect);
        painter.rect_filled(rect, 4.0, VIS_BACKGROUND);

        if !self.analyzer.is_active() {
            return;
        }
        let bins = self.analyzer.bins();
        let bar_width = rect.width() / BIN_COUNT as f32 * 2.5;
        let mut mesh = egui::Mesh::default();
        let mut x = rect.left();
        for &value in bins.iter() {
            if x > rect.right() {
                break;
            }
            let height = value as f32 / 255.0 * rect.height();
            if height > 0.0 {
                let bar = egui::Rect::from_min_max(
                    egui::pos2(x, rect.bottom() - height),
                    egui::pos2(x + bar_width, rect.bottom()),
                );
                let base = mesh.vertices.len() as u32;
                mesh.colored_vertex(bar.left_top(), VIS_GRADIENT_TOP);
                mesh.colored_vertex(bar.right_top(), VIS_GRADIENT_TOP);
                mesh.colored_vertex(bar.right_bottom(), VIS_GRADIENT_BOTTOM);
                mesh.colored_vertex(bar.left_bottom(), VIS_GRADIENT_BOTTOM);
                mesh.add_triangle(base, base + 1, base + 2);
                mesh.add_triangle(base, base + 2, base + 3);
            }
            x += bar_width + 1.0;
        }
        painter.add(egui::Shape::mesh(mesh));
    }

    fn render_library(&mut self, ui: &mut egui::Ui) {
        egui::CollapsingHeader::new("Library")
            .default_open(false)
            .show(ui, |ui| {
                let mut refresh = false;
                let mut cleanup = false;
                let mut load: Option<String> = None;

                ui.horizontal(|ui| {
                    refresh = ui.button("⟳ Refresh").clicked();
                    cleanup = ui.button("🧹 Keep newest 10").clicked();
                });

                if self.library.is_empty() {
                    ui.weak("No generated files yet.");
                }
                for entry in &self.library {
                    ui.horizontal(|ui| {
                        if ui.link(&entry.filename).clicked() {
                            load = Some(entry.filename.clone());
                        }
                        ui.weak(format_size(entry.size));
                        ui.weak(format_created(entry.created));
                    });
                }

                if refresh {
                    self.worker.submit(Job::RefreshLibrary);
                }
                if cleanup {
                    self.worker.submit(Job::Cleanup { max_files: 10 });
                }
                if let Some(filename) = load {
                    self.load_library_entry(filename);
                }
            });
    }

    fn render_server_settings(&mut self, ui: &mut egui::Ui) {
        egui::CollapsingHeader::new("Server")
            .default_open(false)
            .show(ui, |ui| {
                let mut apply = false;
                ui.horizontal(|ui| {
                    ui.label("URL");
                    let edit = ui.add(
                        egui::TextEdit::singleline(&mut self.server_url_edit)
                            .desired_width(260.0),
                    );
                    apply = ui.button("Apply").clicked()
                        || (edit.lost_focus()
                            && ui.input(|i| i.key_pressed(egui::Key::Enter)));
                });
                if apply {
                    self.apply_server_url();
                }
            });
    }

    pub(crate) fn render_progress_overlay(&mut self, ctx: &egui::Context) {
        if !self.generating {
            return;
        }

        let screen_rect = ctx.screen_rect();
        let backdrop =
            egui::LayerId::new(egui::Order::Middle, egui::Id::new("progress_backdrop"));
        ctx.layer_painter(backdrop)
            .rect_filled(screen_rect, 0.0, egui::Color32::from_black_alpha(120));

        egui::Area::new(egui::Id::new("progress_overlay"))
            .order(egui::Order::Foreground)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add(egui::Spinner::new());
                        ui.label(&self.overlay_text);
                        ui.add(
                            egui::ProgressBar::new(self.progress / 100.0)
                                .desired_width(240.0)
                                .show_percentage(),
                        );
                    });
                });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_color_thresholds() {
        let default = counter_color(0);
        assert_eq!(counter_color(400), default);
        assert_eq!(counter_color(401), egui::Color32::from_rgb(255, 212, 59));
        assert_eq!(counter_color(450), egui::Color32::from_rgb(255, 212, 59));
        assert_eq!(counter_color(451), egui::Color32::from_rgb(255, 107, 107));
        assert_eq!(counter_color(500), egui::Color32::from_rgb(255, 107, 107));
    }

    #[test]
    fn generate_gating() {
        assert!(generate_enabled("hello", false, true));
        assert!(!generate_enabled("", false, true));
        assert!(!generate_enabled("   ", false, true), "whitespace only");
        assert!(!generate_enabled("hello", true, true), "already in flight");
        assert!(!generate_enabled("hello", false, false), "server not ready");
    }

    #[test]
    fn time_formatting() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(7.9), "0:07");
        assert_eq!(format_time(65.0), "1:05");
        assert_eq!(format_time(600.0), "10:00");
        assert_eq!(format_time(-3.0), "0:00");
    }

    #[test]
    fn size_formatting() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
