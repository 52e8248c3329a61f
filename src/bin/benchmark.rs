use std::time::{Duration, Instant};

use anyhow::Result;
use pulse_canvas::analyser::DEFAULT_FFT_SIZE;
use pulse_canvas::audio::{AnalysisSource, SynthSource};
use pulse_canvas::scheduler::{FrameScheduler, ModeSelector};
use pulse_canvas::surface::Raster;
use pulse_canvas::visual::{Mode, Stage};

struct Args {
    frames: usize,
    w: usize,
    h: usize,
    fft_size: usize,
    seed: u64,
    max_ms: Option<f64>,
}

fn parse_args() -> Args {
    let mut args = Args {
        frames: 180,
        w: 480,
        h: 270,
        fft_size: DEFAULT_FFT_SIZE,
        seed: 0x5eed,
        max_ms: None,
    };

    let argv = std::env::args().skip(1).collect::<Vec<_>>();
    let mut i = 0usize;
    while i < argv.len() {
        let k = argv[i].as_str();
        let v = argv.get(i + 1).map(|s| s.as_str());
        match (k, v) {
            ("--frames", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.frames = n.max(1);
                }
                i += 2;
            }
            ("--width", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.w = n.max(1);
                }
                i += 2;
            }
            ("--height", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.h = n.max(1);
                }
                i += 2;
            }
            ("--fft-size", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.fft_size = n;
                }
                i += 2;
            }
            ("--seed", Some(x)) => {
                if let Ok(n) = x.parse::<u64>() {
                    args.seed = n;
                }
                i += 2;
            }
            ("--max-ms", Some(x)) => {
                if let Ok(v) = x.parse::<f64>() {
                    args.max_ms = Some(v.max(0.1));
                }
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }
    args
}

fn main() -> Result<()> {
    let args = parse_args();
    let fps = 60;
    let mut total_time = Duration::ZERO;
    let mut total_frames = 0usize;
    let mut black_modes = Vec::<&'static str>::new();
    let mut slow_modes = Vec::<(&'static str, f64)>::new();

    println!(
        "benchmark: modes={} frames/mode={} size={}x{} fft={}",
        Mode::all().len(),
        args.frames,
        args.w,
        args.h,
        args.fft_size
    );

    for (idx, mode) in Mode::all().iter().copied().enumerate() {
        let source = SynthSource::new(args.fft_size, 48_000, fps, args.seed);
        let mut rng = fastrand::Rng::with_seed(args.seed);
        let stage = Stage::seeded(&mut rng, source.bin_count(), args.w, args.h, 0.0);
        let mut scheduler = FrameScheduler::new(source, stage, ModeSelector::new(mode.tag()));
        scheduler.on_play()?;
        let mut raster = Raster::new(args.w, args.h);

        let start = Instant::now();
        let mut lit = 0usize;
        for f in 0..args.frames {
            let time_ms = f as f64 * 1000.0 / fps as f64;
            scheduler.tick(&mut raster, time_ms);
            if raster
                .pixels()
                .chunks_exact(4)
                .any(|px| px[0] != 0 || px[1] != 0 || px[2] != 0)
            {
                lit += 1;
            }
        }

        let elapsed = start.elapsed();
        total_time += elapsed;
        total_frames += args.frames;
        let ms = elapsed.as_secs_f64() * 1000.0 / args.frames as f64;
        println!("{:>2}. {:<14} {:>8.3} ms/frame  lit={:>3}/{}", idx + 1, mode.tag(), ms, lit, args.frames);
        if lit == 0 {
            black_modes.push(mode.tag());
        }
        if args.max_ms.is_some_and(|max| ms > max) {
            slow_modes.push((mode.tag(), ms));
        }
    }

    let avg_ms = total_time.as_secs_f64() * 1000.0 / total_frames.max(1) as f64;
    let fps = if avg_ms > 0.0 { 1000.0 / avg_ms } else { 0.0 };
    println!("summary: {:>8.3} ms/frame avg  {:>7.2} FPS", avg_ms, fps);

    if let Some(max_ms) = args.max_ms {
        if !black_modes.is_empty() || !slow_modes.is_empty() {
            eprintln!("smoke: FAIL");
            if !black_modes.is_empty() {
                eprintln!("  black modes: {}", black_modes.join(", "));
            }
            for (name, ms) in slow_modes {
                eprintln!("  slow mode: {} ({:.3} ms/frame > {:.3})", name, ms, max_ms);
            }
            anyhow::bail!("smoke failed");
        }
        println!("smoke: PASS (max_ms={:.3})", max_ms);
    }
    Ok(())
}
