use crate::analyser::{DEFAULT_FFT_SIZE, MAX_FFT_SIZE, MIN_FFT_SIZE, is_valid_fft_size};
use anyhow::bail;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

pub const MIN_CANVAS_WIDTH: usize = 32;

#[derive(Parser, Debug, Clone)]
#[command(name = "pulse-canvas", version, about = "Audio-reactive 2D canvas visualizer for the terminal")]
pub struct Config {
    #[arg(long, value_enum, default_value_t = AudioSource::Mic)]
    pub source: AudioSource,

    #[arg(long)]
    pub device: Option<String>,

    #[arg(long, default_value_t = false)]
    pub list_devices: bool,

    /// Initial visualizer tag; unknown tags only fade the canvas.
    #[arg(long, default_value = "bars")]
    pub mode: String,

    #[arg(long, value_enum, default_value_t = PresenterMode::HalfBlock)]
    pub presenter: PresenterMode,

    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    #[arg(long, default_value_t = DEFAULT_FFT_SIZE)]
    pub fft_size: usize,

    /// Logical canvas width in pixels; height follows the terminal aspect.
    #[arg(long, default_value_t = 480)]
    pub canvas_width: usize,

    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub sync_updates: bool,

    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AudioSource {
    Mic,
    #[value(alias = "test")]
    Synth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PresenterMode {
    #[value(alias = "ansi", alias = "text")]
    Ascii,
    #[value(name = "half-block", alias = "halfblock", alias = "half_block", alias = "hb")]
    HalfBlock,
}

impl PresenterMode {
    /// Presenter pixels per terminal cell (columns, rows).
    pub fn cell_pixels(self) -> (usize, usize) {
        match self {
            Self::Ascii => (1, 1),
            Self::HalfBlock => (1, 2),
        }
    }
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.fps == 0 {
            bail!("--fps must be at least 1");
        }
        if !is_valid_fft_size(self.fft_size) {
            bail!(
                "--fft-size must be a power of two between {MIN_FFT_SIZE} and {MAX_FFT_SIZE} (got {})",
                self.fft_size
            );
        }
        if self.canvas_width < MIN_CANVAS_WIDTH {
            bail!("--canvas-width must be at least {MIN_CANVAS_WIDTH} (got {})", self.canvas_width);
        }
        Ok(())
    }
}
