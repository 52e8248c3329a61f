use crate::audio::AnalysisSource;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::ops::Range;
use std::sync::Arc;

pub const DEFAULT_FFT_SIZE: usize = 256;
pub const MIN_FFT_SIZE: usize = 32;
pub const MAX_FFT_SIZE: usize = 32_768;

const SMOOTHING: f32 = 0.8;
const MIN_DB: f32 = -100.0;
const MAX_DB: f32 = -30.0;

/// Bins averaged for the bass band.
pub const BASS_BINS: usize = 20;
/// Treble starts at this fraction (of 256) of the spectrum, whatever N is.
const TREBLE_START_OF_256: usize = 150;

pub fn is_valid_fft_size(n: usize) -> bool {
    n.is_power_of_two() && (MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&n)
}

/// Rolling-window spectrum analyser producing byte-scaled frequency and
/// time-domain snapshots.
pub struct Analyser {
    fft_size: usize,
    window: Vec<f32>,
    write_pos: usize,
    blackman: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    fft_buf: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl Analyser {
    /// `fft_size` is rounded into the supported power-of-two range.
    pub fn new(fft_size: usize) -> Self {
        let n = fft_size.clamp(MIN_FFT_SIZE, MAX_FFT_SIZE).next_power_of_two().min(MAX_FFT_SIZE);
        let blackman = (0..n)
            .map(|i| {
                let x = i as f32 / n as f32;
                0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
            })
            .collect();
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(n);
        Self {
            fft_size: n,
            window: vec![0.0; n],
            write_pos: 0,
            blackman,
            fft,
            fft_buf: vec![Complex { re: 0.0, im: 0.0 }; n],
            smoothed: vec![0.0; n / 2],
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    pub fn push_samples(&mut self, samples: &[f32]) {
        for &s in samples {
            self.push_sample(s);
        }
    }

    pub fn push_sample(&mut self, s: f32) {
        self.window[self.write_pos] = if s.is_finite() { s } else { 0.0 };
        self.write_pos = (self.write_pos + 1) % self.fft_size;
    }

    fn ordered(&self, i: usize) -> f32 {
        self.window[(self.write_pos + i) % self.fft_size]
    }

    /// Each call advances the temporal smoothing by one step.
    pub fn byte_frequency(&mut self, out: &mut [u8]) {
        let n = self.fft_size;
        for i in 0..n {
            self.fft_buf[i] = Complex { re: self.ordered(i) * self.blackman[i], im: 0.0 };
        }
        self.fft.process(&mut self.fft_buf);

        let scale = 1.0 / n as f32;
        let range = MAX_DB - MIN_DB;
        for (k, slot) in self.smoothed.iter_mut().enumerate() {
            let mag = self.fft_buf[k].norm() * scale;
            *slot = SMOOTHING * *slot + (1.0 - SMOOTHING) * mag;
            if !slot.is_finite() {
                *slot = 0.0;
            }
        }
        for (k, dst) in out.iter_mut().enumerate() {
            let Some(&mag) = self.smoothed.get(k) else {
                *dst = 0;
                continue;
            };
            let db = if mag > 0.0 { 20.0 * mag.log10() } else { f32::NEG_INFINITY };
            let scaled = 255.0 / range * (db - MIN_DB);
            *dst = if scaled.is_finite() { scaled.floor().clamp(0.0, 255.0) as u8 } else { 0 };
        }
    }

    pub fn byte_time_domain(&self, out: &mut [u8]) {
        let n = self.fft_size;
        let out_len = out.len();
        for (i, dst) in out.iter_mut().enumerate() {
            // The most recent `out.len()` samples when the caller asks for fewer.
            let offset = n.saturating_sub(out_len.min(n));
            let s = if i < n { self.ordered(offset + i) } else { 0.0 };
            *dst = (128.0 * (1.0 + s)).floor().clamp(0.0, 255.0) as u8;
        }
    }
}

/// One tick's worth of analysis data, refreshed in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisFrame {
    pub frequency: Vec<u8>,
    pub waveform: Vec<u8>,
}

impl AnalysisFrame {
    pub fn new(bins: usize) -> Self {
        Self { frequency: vec![0; bins], waveform: vec![128; bins] }
    }

    pub fn from_parts(frequency: Vec<u8>, waveform: Vec<u8>) -> Self {
        Self { frequency, waveform }
    }

    pub fn bin_count(&self) -> usize {
        self.frequency.len()
    }

    pub fn refresh(&mut self, source: &mut dyn AnalysisSource) {
        source.sample_frequency(&mut self.frequency);
        source.sample_waveform(&mut self.waveform);
    }

    /// Bin value, 0 when out of range.
    pub fn bin(&self, i: usize) -> u8 {
        self.frequency.get(i).copied().unwrap_or(0)
    }

    /// Mean of the frequency bins in `range`; an empty slice averages to 0.
    pub fn band_average(&self, range: Range<usize>) -> f32 {
        let end = range.end.min(self.frequency.len());
        let start = range.start.min(end);
        let bins = &self.frequency[start..end];
        if bins.is_empty() {
            return 0.0;
        }
        bins.iter().map(|&v| v as f32).sum::<f32>() / bins.len() as f32
    }

    pub fn bass(&self) -> f32 {
        self.band_average(0..BASS_BINS)
    }

    pub fn treble(&self) -> f32 {
        let n = self.frequency.len();
        self.band_average(n * TREBLE_START_OF_256 / 256..n)
    }

    pub fn energy(&self) -> f32 {
        self.band_average(0..self.frequency.len())
    }
}
