use crate::audio::{AnalysisSource, open_source};
use crate::config::Config;
use crate::render::{Frame, Presenter, make_presenter};
use crate::scheduler::{
    Display, FrameScheduler, FrameStatus, ModeSelector, PlaybackSignal, Refresh, TickReport,
};
use crate::surface::{Raster, Surface};
use crate::terminal::TerminalGuard;
use crate::visual::{Mode, Stage};
use anyhow::Context;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::io::{BufWriter, Stdout};
use std::time::{Duration, Instant};
use tracing::{debug, info};

const STATUS_ROWS: u16 = 1;

pub fn run(cfg: Config) -> anyhow::Result<()> {
    cfg.validate()?;

    let source = open_source(&cfg).with_context(|| format!("start audio (source={:?})", cfg.source))?;
    let bins = source.bin_count();

    let term = TerminalGuard::enter()?;
    let mut display = TerminalDisplay::new(&cfg, term.initial_size());
    let (w, h) = (display.raster.width(), display.raster.height());
    let mut rng = match cfg.seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };
    let stage = Stage::seeded(&mut rng, bins, w, h, 0.0);
    info!(bins, canvas_w = w, canvas_h = h, "stage seeded");

    let mut scheduler = FrameScheduler::new(source, stage, ModeSelector::new(cfg.mode.clone()));
    // The input stream is live once we get here; that is the play gesture.
    scheduler.on_play()?;
    scheduler.run(&mut display)
}

/// Canvas size for a terminal area: `canvas_width` wide, with the height
/// keeping the cells' on-screen aspect (a cell is about twice as tall as wide).
pub fn canvas_dims(cols: u16, visual_rows: u16, canvas_width: usize) -> (usize, usize) {
    let cols = cols.max(1) as usize;
    let h = canvas_width * visual_rows as usize * 2 / cols;
    (canvas_width.max(1), h.max(1))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Nothing,
    Quit,
    Playback(PlaybackSignal),
}

pub fn handle_key(
    code: KeyCode,
    mods: KeyModifiers,
    selector: &mut ModeSelector,
    paused: bool,
) -> KeyAction {
    if mods.contains(KeyModifiers::CONTROL) && matches!(code, KeyCode::Char('c')) {
        return KeyAction::Quit;
    }
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => KeyAction::Quit,
        KeyCode::Char(' ') => KeyAction::Playback(if paused {
            PlaybackSignal::Play
        } else {
            PlaybackSignal::Pause
        }),
        KeyCode::Char(c @ '1'..='9') => {
            let idx = c as usize - '1' as usize;
            selector.select_mode(Mode::all()[idx]);
            KeyAction::Nothing
        }
        KeyCode::Right => {
            selector.select_mode(selector.mode().map(Mode::next).unwrap_or(Mode::Bars));
            KeyAction::Nothing
        }
        KeyCode::Left => {
            selector.select_mode(selector.mode().map(Mode::prev).unwrap_or(Mode::Bars));
            KeyAction::Nothing
        }
        _ => KeyAction::Nothing,
    }
}

pub fn status_line(status: &FrameStatus<'_>, fps: f32) -> String {
    let mode = match status.report {
        TickReport::Gated => "waiting for playback".to_string(),
        TickReport::Drawn { mode: Some(_), .. } => status.tag.to_string(),
        TickReport::Drawn { mode: None, .. } => format!("{} (unknown)", status.tag),
    };
    let mut line = format!("{mode} | {fps:.0} fps");
    if status.tag == Mode::Mandelbrot.tag() {
        line.push_str(&format!(" | zoom {:.3} after {:.0}s", status.fractal_zoom, status.fractal_secs));
    }
    if status.paused {
        line.push_str(" | paused");
    }
    line.push_str(" | 1-9 mode  <-/-> cycle  space pause  q quit");
    line
}

struct TerminalDisplay {
    out: BufWriter<Stdout>,
    presenter: Box<dyn Presenter>,
    raster: Raster,
    canvas_width: usize,
    sync_updates: bool,
    size: (u16, u16),
    start: Instant,
    frame_budget: Duration,
    last_frame: Option<Instant>,
    fps: FpsCounter,
    paused: bool,
}

impl TerminalDisplay {
    fn new(cfg: &Config, size: (u16, u16)) -> Self {
        let visual_rows = size.1.saturating_sub(STATUS_ROWS).max(1);
        let (w, h) = canvas_dims(size.0, visual_rows, cfg.canvas_width);
        debug!(presenter = ?cfg.presenter, cells = ?cfg.presenter.cell_pixels(), "display ready");
        Self {
            out: BufWriter::new(TerminalGuard::stdout()),
            presenter: make_presenter(cfg.presenter),
            raster: Raster::new(w, h),
            canvas_width: cfg.canvas_width,
            sync_updates: cfg.sync_updates,
            size,
            start: Instant::now(),
            frame_budget: Duration::from_secs_f32(1.0 / cfg.fps.max(1) as f32),
            last_frame: None,
            fps: FpsCounter::new(),
            paused: false,
        }
    }

    fn visual_rows(&self) -> u16 {
        self.size.1.saturating_sub(STATUS_ROWS).max(1)
    }

    fn resize(&mut self, size: (u16, u16)) {
        if size == self.size {
            return;
        }
        self.size = size;
        let (w, h) = canvas_dims(size.0, self.visual_rows(), self.canvas_width);
        self.raster.resize(w, h);
        info!(cols = size.0, rows = size.1, canvas_w = w, canvas_h = h, "terminal resized");
    }
}

impl Display for TerminalDisplay {
    fn next_refresh(&mut self, selector: &mut ModeSelector) -> anyhow::Result<Option<Refresh>> {
        if let Some(last) = self.last_frame {
            let elapsed = last.elapsed();
            if elapsed < self.frame_budget {
                std::thread::sleep(self.frame_budget - elapsed);
            }
        }
        self.last_frame = Some(Instant::now());

        let mut playback = None;
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(k) if k.kind != KeyEventKind::Release => {
                    match handle_key(k.code, k.modifiers, selector, self.paused) {
                        KeyAction::Quit => return Ok(None),
                        KeyAction::Playback(signal) => {
                            self.paused = signal == PlaybackSignal::Pause;
                            playback = Some(signal);
                        }
                        KeyAction::Nothing => {}
                    }
                }
                Event::Resize(c, r) => self.resize((c, r)),
                _ => {}
            }
        }
        // Resize events can be missed in some terminals.
        self.resize(TerminalGuard::size()?);

        Ok(Some(Refresh {
            time_ms: self.start.elapsed().as_secs_f64() * 1000.0,
            playback,
        }))
    }

    fn surface(&mut self) -> &mut dyn Surface {
        &mut self.raster
    }

    fn present(&mut self, status: &FrameStatus<'_>) -> anyhow::Result<()> {
        self.paused = status.paused;
        self.fps.tick();
        let line = status_line(status, self.fps.fps());
        let frame = Frame {
            term_cols: self.size.0,
            visual_rows: self.visual_rows(),
            raster: &self.raster,
            status: &line,
            status_rows: STATUS_ROWS.min(self.size.1.saturating_sub(1)),
            sync_updates: self.sync_updates,
        };
        self.presenter.present(&frame, &mut self.out)
    }
}

struct FpsCounter {
    last: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last: Instant::now(),
            frames: 0,
            fps: 0.0,
        }
    }

    fn tick(&mut self) {
        self.frames += 1;
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        if dt >= 0.5 {
            self.fps = (self.frames as f32) / dt;
            self.frames = 0;
            self.last = now;
        }
    }

    fn fps(&self) -> f32 {
        self.fps
    }
}
