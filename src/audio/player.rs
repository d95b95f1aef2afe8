//! Decoded generation results and the playback session around them.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink};

/// A generation result fetched from the service: the raw WAV bytes for
/// download plus decoded PCM for playback and analysis.
pub struct PreparedAudio {
    pub file: String,
    pub user_id: Option<String>,
    pub url: String,
    pub raw: Vec<u8>,
    pub samples: Arc<Vec<f32>>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl PreparedAudio {
    pub fn decode(
        file: String,
        user_id: Option<String>,
        url: String,
        raw: Vec<u8>,
    ) -> Result<Self> {
        let mut reader =
            hound::WavReader::new(Cursor::new(&raw[..])).context("not a readable WAV file")?;
        let spec = reader.spec();

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Int => {
                let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<std::result::Result<_, _>>()
                    .context("corrupt WAV samples")?
            }
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<std::result::Result<_, _>>()
                .context("corrupt WAV samples")?,
        };

        Ok(Self {
            file,
            user_id,
            url,
            raw,
            samples: Arc::new(samples),
            channels: spec.channels,
            sample_rate: spec.sample_rate,
        })
    }

    pub fn duration(&self) -> Duration {
        duration_of(self.samples.len(), self.channels, self.sample_rate)
    }
}

pub fn duration_of(sample_count: usize, channels: u16, sample_rate: u32) -> Duration {
    if channels == 0 || sample_rate == 0 {
        return Duration::ZERO;
    }
    let frames = sample_count / channels as usize;
    Duration::from_secs_f64(frames as f64 / sample_rate as f64)
}

/// Mono window of `len` samples starting at `start_frame`, zero-padded past
/// the end. Interleaved channels are averaged down.
pub fn mono_window(samples: &[f32], channels: u16, start_frame: usize, len: usize) -> Vec<f32> {
    let channels = channels.max(1) as usize;
    let frame_count = samples.len() / channels;
    (0..len)
        .map(|i| {
            let frame = start_frame + i;
            if frame >= frame_count {
                return 0.0;
            }
            let base = frame * channels;
            samples[base..base + channels].iter().sum::<f32>() / channels as f32
        })
        .collect()
}

/// One live audio resource with position, duration and a playing flag.
/// Replaced wholesale on each generation, dropped on clear.
pub struct PlaybackSession {
    _stream: OutputStream,
    sink: Sink,
    samples: Arc<Vec<f32>>,
    channels: u16,
    sample_rate: u32,
    duration: Duration,
    /// Where the currently queued buffer starts; seeking re-queues the tail.
    base_offset: Duration,
    playing: bool,
}

impl PlaybackSession {
    pub fn new(audio: &PreparedAudio) -> Result<Self> {
        let stream = rodio::OutputStreamBuilder::open_default_stream()
            .map_err(|e| anyhow::anyhow!("no audio output device: {e}"))?;
        let sink = Sink::connect_new(stream.mixer());
        sink.pause();

        let mut session = Self {
            _stream: stream,
            sink,
            samples: audio.samples.clone(),
            channels: audio.channels,
            sample_rate: audio.sample_rate,
            duration: audio.duration(),
            base_offset: Duration::ZERO,
            playing: false,
        };
        session.queue_from(Duration::ZERO);
        Ok(session)
    }

    fn queue_from(&mut self, offset: Duration) {
        self.sink.clear();
        let start_frame = (offset.as_secs_f64() * self.sample_rate as f64) as usize;
        let start = (start_frame * self.channels as usize).min(self.samples.len());
        let tail: Vec<f32> = self.samples[start..].to_vec();
        self.sink
            .append(SamplesBuffer::new(self.channels, self.sample_rate, tail));
        self.base_offset = offset;
    }

    pub fn play(&mut self) {
        // Restart from the top once the buffer has drained, the way an
        // audio element replays after "ended".
        if self.sink.empty() {
            self.queue_from(Duration::ZERO);
        }
        self.sink.play();
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.sink.pause();
        self.playing = false;
    }

    pub fn toggle(&mut self) {
        if self.playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Reset to the beginning, paused.
    pub fn stop(&mut self) {
        self.queue_from(Duration::ZERO);
        self.sink.pause();
        self.playing = false;
    }

    pub fn seek(&mut self, position: Duration) {
        let was_playing = self.playing;
        self.queue_from(position.min(self.duration));
        if was_playing {
            self.sink.play();
        } else {
            self.sink.pause();
        }
    }

    pub fn position(&self) -> Duration {
        (self.base_offset + self.sink.get_pos()).min(self.duration)
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// True once a playing buffer has fully drained.
    pub fn finished(&self) -> bool {
        self.playing && self.sink.empty()
    }

    pub fn mark_ended(&mut self) {
        self.playing = false;
    }

    /// Mono samples around the playhead for the analyser.
    pub fn window_at_playhead(&self, len: usize) -> Vec<f32> {
        let frame = (self.position().as_secs_f64() * self.sample_rate as f64) as usize;
        mono_window(&self.samples, self.channels, frame, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(channels: u16, sample_rate: u32, frames: usize) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut out = Vec::new();
        {
            let mut writer = hound::WavWriter::new(Cursor::new(&mut out), spec).unwrap();
            for i in 0..frames {
                for ch in 0..channels {
                    let v = if ch == 0 { (i % 100) as i16 } else { 0 };
                    writer.write_sample(v).unwrap();
                }
            }
            writer.finalize().unwrap();
        }
        out
    }

    #[test]
    fn decode_reads_spec_and_duration() {
        let raw = wav_bytes(1, 24000, 24000);
        let audio =
            PreparedAudio::decode("a.wav".into(), None, "http://x/api/audio/a.wav".into(), raw)
                .unwrap();
        assert_eq!(audio.channels, 1);
        assert_eq!(audio.sample_rate, 24000);
        assert_eq!(audio.samples.len(), 24000);
        assert_eq!(audio.duration(), Duration::from_secs(1));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(PreparedAudio::decode("a.wav".into(), None, String::new(), vec![0; 16]).is_err());
    }

    #[test]
    fn duration_handles_stereo_and_degenerate_specs() {
        assert_eq!(duration_of(48000 * 2, 2, 48000), Duration::from_secs(1));
        assert_eq!(duration_of(100, 0, 48000), Duration::ZERO);
        assert_eq!(duration_of(100, 2, 0), Duration::ZERO);
    }

    #[test]
    fn mono_window_averages_channels() {
        // Two frames of stereo: (1.0, 0.0), (0.5, 0.5).
        let samples = [1.0, 0.0, 0.5, 0.5];
        let window = mono_window(&samples, 2, 0, 2);
        assert_eq!(window, vec![0.5, 0.5]);
    }

    #[test]
    fn mono_window_zero_pads_past_the_end() {
        let samples = [1.0, 1.0];
        let window = mono_window(&samples, 1, 1, 4);
        assert_eq!(window, vec![1.0, 0.0, 0.0, 0.0]);
    }
}
