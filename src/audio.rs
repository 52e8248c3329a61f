use crate::analyser::Analyser;
use crate::config::{AudioSource, Config};
use anyhow::{Context, anyhow};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat};
use ringbuf::HeapRb;
use ringbuf::traits::{Consumer as _, Producer as _, Split as _};
use std::f32::consts::PI;
use std::io::{self, Write};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Running,
    Suspended,
}

/// Pull-side contract of the analysis collaborator. Both pulls return
/// immediately with whatever the source currently holds.
pub trait AnalysisSource {
    fn bin_count(&self) -> usize;
    fn sample_frequency(&mut self, out: &mut [u8]);
    fn sample_waveform(&mut self, out: &mut [u8]);

    fn state(&self) -> SourceState {
        SourceState::Running
    }

    fn suspend(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn resume(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<T: AnalysisSource + ?Sized> AnalysisSource for Box<T> {
    fn bin_count(&self) -> usize {
        (**self).bin_count()
    }

    fn sample_frequency(&mut self, out: &mut [u8]) {
        (**self).sample_frequency(out)
    }

    fn sample_waveform(&mut self, out: &mut [u8]) {
        (**self).sample_waveform(out)
    }

    fn state(&self) -> SourceState {
        (**self).state()
    }

    fn suspend(&mut self) -> anyhow::Result<()> {
        (**self).suspend()
    }

    fn resume(&mut self) -> anyhow::Result<()> {
        (**self).resume()
    }
}

pub fn open_source(cfg: &Config) -> anyhow::Result<Box<dyn AnalysisSource>> {
    match cfg.source {
        AudioSource::Mic => Ok(Box::new(
            LiveSource::open(cfg.device.as_deref(), cfg.fft_size)
                .context("open microphone input")?,
        )),
        AudioSource::Synth => Ok(Box::new(SynthSource::new(
            cfg.fft_size,
            48_000,
            cfg.fps,
            cfg.seed.unwrap_or(0x5eed),
        ))),
    }
}

pub fn list_input_devices() -> anyhow::Result<()> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .context("enumerate input devices")?;

    let mut out = io::stdout();
    writeln!(out, "Input devices:")?;
    for dev in devices {
        let name = dev.name().unwrap_or_else(|_| "<unknown>".to_string());
        writeln!(out, "  - {}", name)?;
    }
    Ok(())
}

/// Microphone capture. The stream is built paused; playback starts it.
pub struct LiveSource {
    stream: cpal::Stream,
    cons: ringbuf::HeapCons<f32>,
    analyser: Analyser,
    state: SourceState,
    pub sample_rate_hz: u32,
}

impl LiveSource {
    pub fn open(device_query: Option<&str>, fft_size: usize) -> anyhow::Result<Self> {
        let host = cpal::default_host();
        let device = select_mic_input_device(&host, device_query)?;
        let supported = device
            .default_input_config()
            .context("get default input config")?;
        let sample_rate_hz = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        let config: cpal::StreamConfig = supported.clone().into();

        // A second of headroom; the analyser only ever keeps the newest window.
        let rb = HeapRb::<f32>::new((sample_rate_hz as usize).max(fft_size));
        let (mut prod, cons) = rb.split();

        let err_fn = |err| warn!("audio stream error: {err}");

        let stream = match supported.sample_format() {
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            SampleFormat::U16 => device.build_input_stream(
                &config,
                move |data: &[u16], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            fmt => return Err(anyhow!("unsupported sample format: {fmt:?}")),
        };
        // Some hosts start streams eagerly.
        stream.pause().context("hold input stream until playback")?;

        info!(
            device = %device.name().unwrap_or_else(|_| "<unknown>".to_string()),
            sample_rate_hz,
            channels,
            "input stream ready"
        );

        Ok(Self {
            stream,
            cons,
            analyser: Analyser::new(fft_size),
            state: SourceState::Suspended,
            sample_rate_hz,
        })
    }

    fn drain(&mut self) {
        while let Some(s) = self.cons.try_pop() {
            self.analyser.push_sample(s);
        }
    }
}

impl AnalysisSource for LiveSource {
    fn bin_count(&self) -> usize {
        self.analyser.bin_count()
    }

    fn sample_frequency(&mut self, out: &mut [u8]) {
        self.drain();
        self.analyser.byte_frequency(out);
    }

    fn sample_waveform(&mut self, out: &mut [u8]) {
        self.drain();
        self.analyser.byte_time_domain(out);
    }

    fn state(&self) -> SourceState {
        self.state
    }

    fn suspend(&mut self) -> anyhow::Result<()> {
        self.stream.pause().context("pause input stream")?;
        self.state = SourceState::Suspended;
        debug!("input stream suspended");
        Ok(())
    }

    fn resume(&mut self) -> anyhow::Result<()> {
        self.stream.play().context("start input stream")?;
        self.state = SourceState::Running;
        debug!("input stream resumed");
        Ok(())
    }
}

fn select_mic_input_device(
    host: &cpal::Host,
    device_query: Option<&str>,
) -> anyhow::Result<cpal::Device> {
    let devices = host
        .input_devices()
        .context("enumerate input devices")?
        .collect::<Vec<_>>();

    let want = device_query.map(|s| s.to_lowercase());
    if let Some(want) = want.as_deref() {
        if let Some(dev) = devices.iter().find(|d| {
            d.name()
                .map(|n| n.to_lowercase().contains(want))
                .unwrap_or(false)
        }) {
            return Ok(dev.clone());
        }
        return Err(anyhow!("no input device matching: {want}"));
    }

    host.default_input_device()
        .ok_or_else(|| anyhow!("no default input device found"))
}

fn push_interleaved<T: Sample<Float = f32> + Copy>(
    data: &[T],
    channels: usize,
    prod: &mut ringbuf::HeapProd<f32>,
) {
    let channels = channels.max(1);
    for frame in data.chunks(channels) {
        let mut acc = 0.0f32;
        for s in frame {
            acc += (*s).to_float_sample();
        }
        // Full buffer: drop the sample, the consumer only wants recent audio.
        let _ = prod.try_push(acc / channels as f32);
    }
}

/// Deterministic test program: a 120 BPM kick, a drifting pad chord and
/// seeded off-beat hats. Each frequency pull advances one display tick.
pub struct SynthSource {
    analyser: Analyser,
    rng: fastrand::Rng,
    sample_rate_hz: u32,
    samples_per_tick: usize,
    cursor: u64,
    state: SourceState,
    block: Vec<f32>,
}

impl SynthSource {
    pub fn new(fft_size: usize, sample_rate_hz: u32, fps: u32, seed: u64) -> Self {
        let sample_rate_hz = sample_rate_hz.max(8_000);
        let samples_per_tick = (sample_rate_hz / fps.max(1)).max(1) as usize;
        Self {
            analyser: Analyser::new(fft_size),
            rng: fastrand::Rng::with_seed(seed),
            sample_rate_hz,
            samples_per_tick,
            cursor: 0,
            state: SourceState::Running,
            block: Vec::with_capacity(samples_per_tick),
        }
    }

    /// Starts suspended, the way a fresh audio context does before a play gesture.
    pub fn suspended(mut self) -> Self {
        self.state = SourceState::Suspended;
        self
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.cursor as f32 / self.sample_rate_hz as f32
    }

    fn advance(&mut self) {
        self.block.clear();
        let sr = self.sample_rate_hz as f32;
        for _ in 0..self.samples_per_tick {
            let t = self.cursor as f32 / sr;
            let s = synth_sample(t, self.rng.f32() * 2.0 - 1.0);
            self.block.push(s);
            self.cursor += 1;
        }
        self.analyser.push_samples(&self.block);
    }
}

fn synth_sample(t: f32, noise: f32) -> f32 {
    let beat = 0.5;
    let p = t % beat;
    let kick_env = (-p * 18.0).exp();
    let kick = (2.0 * PI * (50.0 + 70.0 * (-p * 30.0).exp()) * p).sin() * 0.9 * kick_env;

    let a = (2.0 * PI * (110.0 + 8.0 * (t * 0.21).sin()) * t).sin() * 0.30;
    let b = (2.0 * PI * (220.0 + 16.0 * (t * 0.17).cos()) * t).sin() * 0.16;
    let c = (2.0 * PI * (440.0 + 24.0 * (t * 0.13).sin()) * t).sin() * 0.08;

    let q = (t + beat * 0.5) % beat;
    let hat = noise * 0.35 * (-q * 60.0).exp();

    (kick + a + b + c + hat).clamp(-1.0, 1.0)
}

impl AnalysisSource for SynthSource {
    fn bin_count(&self) -> usize {
        self.analyser.bin_count()
    }

    fn sample_frequency(&mut self, out: &mut [u8]) {
        if self.state == SourceState::Running {
            self.advance();
        }
        self.analyser.byte_frequency(out);
    }

    fn sample_waveform(&mut self, out: &mut [u8]) {
        self.analyser.byte_time_domain(out);
    }

    fn state(&self) -> SourceState {
        self.state
    }

    fn suspend(&mut self) -> anyhow::Result<()> {
        self.state = SourceState::Suspended;
        Ok(())
    }

    fn resume(&mut self) -> anyhow::Result<()> {
        self.state = SourceState::Running;
        Ok(())
    }
}
