//! Frequency analyser behind the playback visualizer.
//!
//! 256-point FFT over a Hann-windowed mono slice at the playhead; the lower
//! half of the spectrum becomes 128 byte-valued bins on a dB scale with
//! exponential smoothing, which is what the bar renderer consumes.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

pub const FFT_SIZE: usize = 256;
pub const BIN_COUNT: usize = FFT_SIZE / 2;

const MIN_DB: f32 = -100.0;
const MAX_DB: f32 = -30.0;
const SMOOTHING: f32 = 0.8;

pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    smoothed: [f32; BIN_COUNT],
    bins: [u8; BIN_COUNT],
    active: bool,
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        Self {
            fft: planner.plan_fft_forward(FFT_SIZE),
            window: hann_window(FFT_SIZE),
            smoothed: [0.0; BIN_COUNT],
            bins: [0; BIN_COUNT],
            active: false,
        }
    }

    pub fn start(&mut self) {
        self.active = true;
    }

    /// Stop and blank the display.
    pub fn stop(&mut self) {
        self.active = false;
        self.smoothed = [0.0; BIN_COUNT];
        self.bins = [0; BIN_COUNT];
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Feed one frame worth of mono samples. Ignored while stopped.
    pub fn process(&mut self, samples: &[f32]) {
        if !self.active {
            return;
        }

        let mut buf: Vec<Complex<f32>> = (0..FFT_SIZE)
            .map(|i| Complex {
                re: samples.get(i).copied().unwrap_or(0.0) * self.window[i],
                im: 0.0,
            })
            .collect();
        self.fft.process(&mut buf);

        for i in 0..BIN_COUNT {
            let magnitude = (buf[i].re * buf[i].re + buf[i].im * buf[i].im).sqrt()
                / FFT_SIZE as f32;
            let smoothed = SMOOTHING * self.smoothed[i] + (1.0 - SMOOTHING) * magnitude;
            self.smoothed[i] = smoothed;

            let db = 20.0 * smoothed.max(f32::MIN_POSITIVE).log10();
            let norm = ((db - MIN_DB) / (MAX_DB - MIN_DB)).clamp(0.0, 1.0);
            self.bins[i] = (norm * 255.0) as u8;
        }
    }

    pub fn bins(&self) -> &[u8; BIN_COUNT] {
        &self.bins
    }
}

fn hann_window(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| {
            let phase = 2.0 * std::f32::consts::PI * i as f32 / len as f32;
            0.5 * (1.0 - phase.cos())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_stays_at_zero() {
        let mut analyzer = SpectrumAnalyzer::new();
        analyzer.start();
        analyzer.process(&[0.0; FFT_SIZE]);
        assert!(analyzer.bins().iter().all(|&b| b == 0));
    }

    #[test]
    fn a_loud_tone_lights_its_bin() {
        let mut analyzer = SpectrumAnalyzer::new();
        analyzer.start();
        // Bin 8 of a 256-point FFT: eight full cycles across the window.
        let tone: Vec<f32> = (0..FFT_SIZE)
            .map(|i| (2.0 * std::f32::consts::PI * 8.0 * i as f32 / FFT_SIZE as f32).sin())
            .collect();
        // Run a few frames so smoothing converges upward.
        for _ in 0..10 {
            analyzer.process(&tone);
        }
        assert!(analyzer.bins()[8] > 0, "tone bin should be lit");
        assert!(analyzer.bins()[8] > analyzer.bins()[100]);
    }

    #[test]
    fn stop_blanks_the_bins_and_gates_processing() {
        let mut analyzer = SpectrumAnalyzer::new();
        analyzer.start();
        let noise: Vec<f32> = (0..FFT_SIZE).map(|i| ((i * 7919) % 100) as f32 / 100.0).collect();
        for _ in 0..5 {
            analyzer.process(&noise);
        }
        assert!(analyzer.bins().iter().any(|&b| b > 0));

        analyzer.stop();
        assert!(analyzer.bins().iter().all(|&b| b == 0));

        analyzer.process(&noise);
        assert!(analyzer.bins().iter().all(|&b| b == 0), "stopped analyser must ignore input");
    }

    #[test]
    fn bin_count_matches_half_the_fft() {
        let analyzer = SpectrumAnalyzer::new();
        assert_eq!(analyzer.bins().len(), 128);
    }
}
