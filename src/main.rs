use anyhow::{Context, Result};
use clap::Parser;
use pulse_canvas::config::Config;
use std::fs::File;
use std::sync::Mutex;

fn main() -> Result<()> {
    let cfg = Config::parse();
    cfg.validate()?;

    // The terminal belongs to the canvas, so logs only go to a file.
    if let Some(path) = &cfg.log_file {
        let file = File::create(path).with_context(|| format!("create log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_max_level(cfg.log_level)
            .init();
    }

    if cfg.list_devices {
        pulse_canvas::audio::list_input_devices()?;
        return Ok(());
    }

    pulse_canvas::app::run(cfg)
}
