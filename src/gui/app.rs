//! Application state and the per-frame update loop.

use std::sync::Arc;
use std::time::Duration;

use eframe::egui;
use parking_lot::RwLock;

use crate::api::types::{AudioFileEntry, Emotion, GenerateRequest};
use crate::api::worker::{self, Job, ServerHealth, WorkerEvent, WorkerHandle};
use crate::audio::player::{PlaybackSession, PreparedAudio};
use crate::audio::spectrum::{SpectrumAnalyzer, FFT_SIZE};
use crate::config::Config;
use crate::gui::toast::{ToastKind, Toasts};

/// Status-dot flavors, mirroring the two states the service UI ever shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Ready,
    Generating,
}

pub struct StudioApp {
    pub(crate) config: Arc<RwLock<Config>>,
    pub(crate) worker: WorkerHandle,

    // --- Form state ---
    pub(crate) text: String,
    pub(crate) emotion: Emotion,
    pub(crate) speed: f32,
    pub(crate) exaggeration: f32,
    pub(crate) cfg_weight: f32,

    // --- Server & status line ---
    pub(crate) server: ServerHealth,
    pub(crate) status_text: String,
    pub(crate) status_kind: StatusKind,
    pub(crate) server_url_edit: String,

    // --- Generation ---
    /// True while a request is in flight; also drives the progress overlay.
    pub(crate) generating: bool,
    pub(crate) progress: f32,
    pub(crate) overlay_text: String,

    // --- Playback ---
    pub(crate) current_audio: Option<PreparedAudio>,
    pub(crate) session: Option<PlaybackSession>,
    pub(crate) seek_pos: f32,
    pub(crate) analyzer: SpectrumAnalyzer,

    // --- Decoration ---
    pub(crate) toasts: Toasts,
    pub(crate) library: Vec<AudioFileEntry>,
    /// The id the service minted for this session; library fetches keep
    /// using it after the current audio has been cleared.
    pub(crate) last_user_id: Option<String>,
}

impl StudioApp {
    pub fn new(ctx: &egui::Context, config: Config) -> Self {
        let server_url_edit = config.server_url.clone();
        let config = Arc::new(RwLock::new(config));
        let worker = worker::spawn(config.clone(), ctx.clone());
        worker.submit(Job::PollHealth);

        Self {
            config,
            worker,
            text: String::new(),
            emotion: Emotion::Neutral,
            speed: 1.0,
            exaggeration: 1.0,
            cfg_weight: 0.5,
            server: ServerHealth::Unknown,
            status_text: "Connecting to server...".into(),
            status_kind: StatusKind::Ready,
            server_url_edit,
            generating: false,
            progress: 0.0,
            overlay_text: String::new(),
            current_audio: None,
            session: None,
            seek_pos: 0.0,
            analyzer: SpectrumAnalyzer::new(),
            toasts: Toasts::new(),
            library: Vec::new(),
            last_user_id: None,
        }
    }

    pub(crate) fn set_status(&mut self, text: impl Into<String>, kind: StatusKind) {
        self.status_text = text.into();
        self.status_kind = kind;
    }

    pub(crate) fn server_ready(&self) -> bool {
        matches!(self.server, ServerHealth::Ready { .. })
    }

    // --- Worker events ---

    fn drain_worker_events(&mut self) {
        while let Ok(event) = self.worker.events.try_recv() {
            match event {
                WorkerEvent::Health(health) => self.apply_health(health),
                WorkerEvent::Progress(p) => self.progress = p,
                WorkerEvent::Generated(outcome) => self.apply_generation(*outcome),
                WorkerEvent::Fetched(outcome) => self.apply_fetched(*outcome),
                WorkerEvent::Library(outcome) => match outcome {
                    Ok(files) => self.library = files,
                    Err(e) => self.toasts.show(format!("Library refresh failed: {e}"), ToastKind::Error),
                },
                WorkerEvent::CleanupDone(outcome) => {
                    match outcome {
                        Ok(summary) => {
                            let message = match (summary.message, summary.deleted_count) {
                                (Some(m), _) => m,
                                (None, Some(n)) => format!("Deleted {n} old files"),
                                (None, None) => "Old files cleaned up".to_string(),
                            };
                            self.toasts.show(message, ToastKind::Success);
                        }
                        Err(e) => self.toasts.show(format!("Cleanup failed: {e}"), ToastKind::Error),
                    }
                    self.worker.submit(Job::RefreshLibrary);
                }
            }
        }
    }

    fn apply_health(&mut self, health: ServerHealth) {
        match &health {
            ServerHealth::Ready { device } => {
                let status = match device {
                    Some(d) => format!("Server ready ({d})"),
                    None => "Server ready".to_string(),
                };
                self.set_status(status, StatusKind::Ready);
            }
            ServerHealth::Loading { progress } => {
                let status = match progress {
                    Some(p) => format!("Model loading... {p}%"),
                    None => "Model loading...".to_string(),
                };
                self.set_status(status, StatusKind::Generating);
            }
            ServerHealth::Down(reason) => {
                tracing::warn!(%reason, "server unavailable");
                self.set_status("Server unreachable", StatusKind::Ready);
            }
            ServerHealth::Unknown => {}
        }
        self.server = health;
    }

    /// Terminal event of a generation. The overlay is dropped and the
    /// generate button re-enabled before looking at the outcome, so an
    /// error can never wedge the UI.
    fn apply_generation(&mut self, outcome: anyhow::Result<PreparedAudio>) {
        self.generating = false;
        match outcome {
            Ok(audio) => {
                self.progress = 100.0;
                self.install_audio(audio);
                self.toasts.show("Speech generated!", ToastKind::Success);
                self.set_status("Generation complete", StatusKind::Ready);
                self.worker.submit(Job::RefreshLibrary);
            }
            Err(e) => {
                tracing::error!(error = %e, "generation failed");
                self.toasts.show(format!("Generation failed: {e}"), ToastKind::Error);
                self.set_status("Generation failed", StatusKind::Ready);
            }
        }
    }

    fn apply_fetched(&mut self, outcome: anyhow::Result<PreparedAudio>) {
        match outcome {
            Ok(audio) => {
                let name = audio.file.clone();
                self.install_audio(audio);
                self.toasts.show(format!("Loaded {name}"), ToastKind::Success);
            }
            Err(e) => self.toasts.show(format!("Load failed: {e}"), ToastKind::Error),
        }
    }

    /// Make one fetched file the current audio, replacing any previous
    /// playback session wholesale.
    fn install_audio(&mut self, audio: PreparedAudio) {
        self.analyzer.stop();
        self.seek_pos = 0.0;
        if audio.user_id.is_some() {
            self.last_user_id = audio.user_id.clone();
        }
        tracing::debug!(url = %audio.url, "installing audio");
        match PlaybackSession::new(&audio) {
            Ok(session) => self.session = Some(session),
            Err(e) => {
                tracing::warn!(error = %e, "playback unavailable");
                self.toasts.show(format!("Playback unavailable: {e}"), ToastKind::Warning);
                self.session = None;
            }
        }
        self.current_audio = Some(audio);
    }

    // --- Operations ---

    pub(crate) fn generate(&mut self) {
        let text = self.text.trim().to_string();
        if text.is_empty() {
            self.toasts.show("Enter some text first!", ToastKind::Warning);
            return;
        }
        if self.generating {
            return;
        }

        self.generating = true;
        self.progress = 0.0;
        self.overlay_text = "Generating speech...".into();
        self.set_status("Generating speech...", StatusKind::Generating);

        self.worker.submit(Job::Generate(GenerateRequest {
            text,
            emotion: self.emotion,
            speed: self.speed,
            exaggeration: self.exaggeration,
            cfg_weight: self.cfg_weight,
        }));
    }

    /// The main Play action: toggles when audio exists, warns otherwise.
    pub(crate) fn play_action(&mut self) {
        if self.session.is_some() {
            self.toggle_playback();
        } else {
            self.toasts.show("No audio to play yet", ToastKind::Warning);
        }
    }

    pub(crate) fn toggle_playback(&mut self) {
        let Some(session) = &mut self.session else { return };
        session.toggle();
        if session.is_playing() {
            self.analyzer.start();
        } else {
            self.analyzer.stop();
        }
    }

    pub(crate) fn stop_playback(&mut self) {
        if let Some(session) = &mut self.session {
            session.stop();
            self.seek_pos = 0.0;
        }
        self.analyzer.stop();
    }

    /// Slider writes only land on a live session; without one (hence
    /// without a known duration) seeking is a no-op.
    pub(crate) fn seek_to(&mut self, seconds: f32) {
        if let Some(session) = &mut self.session {
            session.seek(Duration::from_secs_f32(seconds.max(0.0)));
            self.seek_pos = seconds;
        }
    }

    pub(crate) fn download(&mut self) {
        let Some(audio) = &self.current_audio else {
            self.toasts.show("No audio to download yet", ToastKind::Warning);
            return;
        };
        let dir = self.config.read().effective_download_dir();
        let path = dir.join(&audio.file);
        match std::fs::write(&path, &audio.raw) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "audio saved");
                self.toasts
                    .show(format!("Saved to {}", path.display()), ToastKind::Success);
            }
            Err(e) => self.toasts.show(format!("Download failed: {e}"), ToastKind::Error),
        }
    }

    pub(crate) fn clear_all(&mut self) {
        self.text.clear();
        if let Some(mut session) = self.session.take() {
            session.pause();
        }
        self.analyzer.stop();
        self.seek_pos = 0.0;
        self.progress = 0.0;
        self.current_audio = None;
        self.toasts.show("Everything cleared", ToastKind::Success);
    }

    pub(crate) fn apply_server_url(&mut self) {
        let candidate = self.server_url_edit.trim().to_string();
        match url::Url::parse(&candidate) {
            Ok(_) => {
                {
                    let mut config = self.config.write();
                    config.server_url = candidate;
                    if let Err(e) = config.save() {
                        tracing::warn!(error = %e, "failed to persist config");
                    }
                }
                self.server = ServerHealth::Unknown;
                self.set_status("Connecting to server...", StatusKind::Ready);
                self.worker.submit(Job::PollHealth);
            }
            Err(e) => self.toasts.show(format!("Invalid server URL: {e}"), ToastKind::Error),
        }
    }

    pub(crate) fn load_library_entry(&mut self, filename: String) {
        let user_id = self.last_user_id.clone();
        self.worker.submit(Job::FetchExisting { filename, user_id });
    }

    // --- Frame tick ---

    fn tick_playback(&mut self, ctx: &egui::Context) {
        let Some(session) = &mut self.session else { return };

        if session.finished() {
            session.mark_ended();
            self.analyzer.stop();
        }

        if session.is_playing() {
            self.seek_pos = session.position().as_secs_f32();
            let window = session.window_at_playhead(FFT_SIZE);
            self.analyzer.process(&window);
            ctx.request_repaint_after(Duration::from_millis(16));
        }
    }
}

impl eframe::App for StudioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_worker_events();
        self.tick_playback(ctx);

        self.render_central(ctx);
        self.render_progress_overlay(ctx);
        self.toasts.ui(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> StudioApp {
        StudioApp::new(&egui::Context::default(), Config::default())
    }

    #[test]
    fn clear_all_is_idempotent() {
        let mut app = app();
        app.text = "annyeong".into();
        app.progress = 80.0;
        app.seek_pos = 3.0;

        app.clear_all();
        assert!(app.text.is_empty());
        assert!(app.current_audio.is_none());
        assert!(app.session.is_none());
        assert_eq!(app.progress, 0.0);
        assert_eq!(app.seek_pos, 0.0);

        app.clear_all();
        assert!(app.text.is_empty());
        assert!(app.current_audio.is_none());
        assert!(app.session.is_none());
        assert_eq!(app.progress, 0.0);
        assert_eq!(app.seek_pos, 0.0);
    }

    #[test]
    fn generate_with_blank_text_warns_and_stays_idle() {
        let mut app = app();
        app.text = "   ".into();
        app.generate();
        assert!(!app.generating);
        let (_, kind) = app.toasts.current().unwrap();
        assert_eq!(kind, ToastKind::Warning);
    }

    #[test]
    fn generate_marks_in_flight_and_shows_overlay() {
        let mut app = app();
        app.text = "hello there".into();
        app.generate();
        assert!(app.generating);
        assert_eq!(app.overlay_text, "Generating speech...");
        assert_eq!(app.status_kind, StatusKind::Generating);
    }

    #[test]
    fn generation_error_reenables_and_toasts() {
        let mut app = app();
        app.generating = true;
        app.apply_generation(Err(anyhow::anyhow!("server returned HTTP 500")));
        assert!(!app.generating, "error must re-enable generate");
        let (message, kind) = app.toasts.current().unwrap();
        assert_eq!(kind, ToastKind::Error);
        assert!(message.contains("HTTP 500"));
    }

    #[test]
    fn play_without_audio_warns() {
        let mut app = app();
        app.play_action();
        let (_, kind) = app.toasts.current().unwrap();
        assert_eq!(kind, ToastKind::Warning);
    }

    #[test]
    fn seek_without_session_is_a_no_op() {
        let mut app = app();
        app.seek_to(12.0);
        assert_eq!(app.seek_pos, 0.0);
    }

    #[test]
    fn download_without_audio_warns() {
        let mut app = app();
        app.download();
        let (_, kind) = app.toasts.current().unwrap();
        assert_eq!(kind, ToastKind::Warning);
    }
}
