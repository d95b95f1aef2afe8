//! Background thread that owns every network call.
//!
//! The GUI thread submits [`Job`]s and drains [`WorkerEvent`]s each frame;
//! it never blocks on the service itself.

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use eframe::egui;
use parking_lot::RwLock;

use super::client::ApiClient;
use super::types::{AudioFileEntry, CleanupSummary, GenerateRequest};
use crate::audio::player::PreparedAudio;
use crate::config::Config;

/// Fixed delay between health polls while the model is still loading.
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub enum Job {
    PollHealth,
    Generate(GenerateRequest),
    FetchExisting {
        filename: String,
        user_id: Option<String>,
    },
    RefreshLibrary,
    Cleanup {
        max_files: u32,
    },
}

/// Coarse server state derived from health polling.
#[derive(Clone, Debug, PartialEq)]
pub enum ServerHealth {
    Unknown,
    Loading { progress: Option<u8> },
    Ready { device: Option<String> },
    Down(String),
}

pub enum WorkerEvent {
    Health(ServerHealth),
    /// Overlay progress percent. The 20/80 marks are cosmetic, not tied to
    /// transfer progress.
    Progress(f32),
    Generated(Box<Result<PreparedAudio>>),
    Fetched(Box<Result<PreparedAudio>>),
    Library(Result<Vec<AudioFileEntry>>),
    CleanupDone(Result<CleanupSummary>),
}

pub struct WorkerHandle {
    jobs: mpsc::Sender<Job>,
    pub events: mpsc::Receiver<WorkerEvent>,
}

impl WorkerHandle {
    pub fn submit(&self, job: Job) {
        // The worker outlives the app; a send can only fail during teardown.
        let _ = self.jobs.send(job);
    }
}

pub fn spawn(config: Arc<RwLock<Config>>, ctx: egui::Context) -> WorkerHandle {
    let (job_tx, job_rx) = mpsc::channel();
    let (event_tx, event_rx) = mpsc::channel();

    std::thread::spawn(move || run(config, job_rx, event_tx, ctx));

    WorkerHandle {
        jobs: job_tx,
        events: event_rx,
    }
}

fn run(
    config: Arc<RwLock<Config>>,
    jobs: mpsc::Receiver<Job>,
    events: mpsc::Sender<WorkerEvent>,
    ctx: egui::Context,
) {
    let emit = |event: WorkerEvent| {
        let _ = events.send(event);
        ctx.request_repaint();
    };

    while let Ok(job) = jobs.recv() {
        let client = ApiClient::new(config.read().server_url.clone());
        match job {
            Job::PollHealth => poll_health(&client, &emit),
            Job::Generate(req) => {
                emit(WorkerEvent::Progress(20.0));
                let outcome = run_generation(&client, req, &emit);
                emit(WorkerEvent::Generated(Box::new(outcome)));
            }
            Job::FetchExisting { filename, user_id } => {
                let outcome = fetch_existing(&client, filename, user_id);
                emit(WorkerEvent::Fetched(Box::new(outcome)));
            }
            Job::RefreshLibrary => emit(WorkerEvent::Library(client.list_audio())),
            Job::Cleanup { max_files } => {
                emit(WorkerEvent::CleanupDone(client.cleanup(max_files)));
            }
        }
    }
}

/// Polls until the model is ready. Re-polls on a fixed interval while the
/// service reports loading; anything else ends the loop (a failure is
/// terminal until polling is restarted).
fn poll_health(client: &ApiClient, emit: &impl Fn(WorkerEvent)) {
    loop {
        match client.health() {
            Ok(h) if h.model_ready => {
                tracing::info!(device = ?h.device, "server ready");
                emit(WorkerEvent::Health(ServerHealth::Ready { device: h.device }));
                return;
            }
            Ok(h) if h.model_loading => {
                emit(WorkerEvent::Health(ServerHealth::Loading {
                    progress: h.loading_progress,
                }));
                std::thread::sleep(HEALTH_POLL_INTERVAL);
            }
            Ok(h) => {
                tracing::warn!(status = ?h.status, "server reports neither ready nor loading");
                emit(WorkerEvent::Health(ServerHealth::Down(
                    "service is not serving a model".into(),
                )));
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "health check failed");
                emit(WorkerEvent::Health(ServerHealth::Down(e.to_string())));
                return;
            }
        }
    }
}

fn run_generation(
    client: &ApiClient,
    req: GenerateRequest,
    emit: &impl Fn(WorkerEvent),
) -> Result<PreparedAudio> {
    tracing::info!(chars = req.text.chars().count(), emotion = ?req.emotion, "generating");

    let http = client.post_generate(&req);
    // The overlay moves to 80 once the response resolves, ok or not.
    emit(WorkerEvent::Progress(80.0));

    let resp = match http {
        Ok(r) => r
            .into_json::<super::types::GenerateResponse>()
            .context("malformed generation response")?,
        Err(ureq::Error::Status(code, _)) => bail!("server returned HTTP {code}"),
        Err(e) => return Err(e).context("generation request failed"),
    };

    if !resp.success {
        bail!(resp
            .error
            .unwrap_or_else(|| "speech generation failed".to_string()));
    }
    tracing::debug!(
        duration = ?resp.duration,
        sample_rate = ?resp.sample_rate,
        "service metadata"
    );
    let file = resp
        .audio_file
        .context("service reported success without an audio file")?;

    let url = client.audio_url(&file, resp.user_id.as_deref());
    let raw = client.fetch_bytes(&url)?;
    let prepared = PreparedAudio::decode(file, resp.user_id, url, raw)?;
    tracing::info!(
        file = %prepared.file,
        secs = prepared.duration().as_secs_f64(),
        "audio ready"
    );
    Ok(prepared)
}

fn fetch_existing(
    client: &ApiClient,
    filename: String,
    user_id: Option<String>,
) -> Result<PreparedAudio> {
    let url = client.audio_url(&filename, user_id.as_deref());
    let raw = client.fetch_bytes(&url)?;
    PreparedAudio::decode(filename, user_id, url, raw)
}
