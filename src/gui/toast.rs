//! Single-slot toast notifications.

use std::time::{Duration, Instant};

use eframe::egui;

pub const TOAST_VISIBLE: Duration = Duration::from_millis(3000);
pub const TOAST_FADE: Duration = Duration::from_millis(300);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Warning,
}

impl ToastKind {
    /// Any kind without an icon of its own gets the success mark.
    pub fn icon(self) -> &'static str {
        match self {
            ToastKind::Error => "✖",
            ToastKind::Warning => "⚠",
            _ => "✔",
        }
    }

    fn accent(self) -> egui::Color32 {
        match self {
            ToastKind::Success => egui::Color32::from_rgb(81, 207, 102),
            ToastKind::Error => egui::Color32::from_rgb(255, 107, 107),
            ToastKind::Warning => egui::Color32::from_rgb(255, 212, 59),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastPhase {
    Visible,
    Fading,
    Hidden,
}

/// Lifecycle position for a toast shown `elapsed` ago: fully visible for
/// 3000 ms, fading for another 300 ms, then gone.
pub fn toast_phase(elapsed: Duration) -> ToastPhase {
    if elapsed < TOAST_VISIBLE {
        ToastPhase::Visible
    } else if elapsed < TOAST_VISIBLE + TOAST_FADE {
        ToastPhase::Fading
    } else {
        ToastPhase::Hidden
    }
}

struct Toast {
    message: String,
    kind: ToastKind,
    shown_at: Instant,
}

#[derive(Default)]
pub struct Toasts {
    current: Option<Toast>,
}

impl Toasts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a toast, replacing whatever is currently up and restarting the
    /// auto-hide clock.
    pub fn show(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.current = Some(Toast {
            message: message.into(),
            kind,
            shown_at: Instant::now(),
        });
    }

    pub fn current(&self) -> Option<(&str, ToastKind)> {
        self.current.as_ref().map(|t| (t.message.as_str(), t.kind))
    }

    pub fn ui(&mut self, ctx: &egui::Context) {
        let elapsed = match &self.current {
            Some(toast) => toast.shown_at.elapsed(),
            None => return,
        };
        if toast_phase(elapsed) == ToastPhase::Hidden {
            self.current = None;
            return;
        }
        let Some(toast) = &self.current else { return };

        let opacity = match toast_phase(elapsed) {
            ToastPhase::Fading => {
                1.0 - (elapsed - TOAST_VISIBLE).as_secs_f32() / TOAST_FADE.as_secs_f32()
            }
            _ => 1.0,
        };

        let accent = toast.kind.accent().gamma_multiply(opacity);
        let text_color = ctx.style().visuals.strong_text_color().gamma_multiply(opacity);

        egui::Area::new(egui::Id::new("toast_banner"))
            .order(egui::Order::Foreground)
            .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-16.0, 16.0))
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style())
                    .fill(ui.style().visuals.extreme_bg_color.gamma_multiply(opacity))
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.label(egui::RichText::new(toast.kind.icon()).color(accent).size(16.0));
                            ui.label(egui::RichText::new(&toast.message).color(text_color));
                        });
                    });
            });

        // Keep repainting so the fade and auto-hide run without input.
        ctx.request_repaint_after(Duration::from_millis(50));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_boundaries() {
        assert_eq!(toast_phase(Duration::ZERO), ToastPhase::Visible);
        assert_eq!(toast_phase(Duration::from_millis(2999)), ToastPhase::Visible);
        assert_eq!(toast_phase(Duration::from_millis(3000)), ToastPhase::Fading);
        assert_eq!(toast_phase(Duration::from_millis(3299)), ToastPhase::Fading);
        assert_eq!(toast_phase(Duration::from_millis(3300)), ToastPhase::Hidden);
    }

    #[test]
    fn a_second_show_replaces_the_first() {
        let mut toasts = Toasts::new();
        toasts.show("saved", ToastKind::Success);
        toasts.show("boom", ToastKind::Error);
        let (message, kind) = toasts.current().unwrap();
        assert_eq!(message, "boom");
        assert_eq!(kind, ToastKind::Error);
    }

    #[test]
    fn every_kind_has_an_icon() {
        assert_ne!(ToastKind::Error.icon(), ToastKind::Success.icon());
        assert_ne!(ToastKind::Warning.icon(), ToastKind::Success.icon());
    }
}
