use crate::analyser::AnalysisFrame;
use crate::audio::{AnalysisSource, SourceState};
use crate::surface::{Paint, Rgba, Surface};
use crate::visual::{Mode, Routine, Stage};
use tracing::{debug, info, warn};

/// Overlay applied before every dispatch so older frames fade into trails.
pub const FRAME_FADE: Rgba = Rgba::new(0, 0, 0, 0.2);

/// Holds the current mode tag as the UI set it. Tags are parsed once per
/// change; an unknown tag stays selected and dispatches nothing.
#[derive(Debug, Clone)]
pub struct ModeSelector {
    tag: String,
    mode: Option<Mode>,
}

impl ModeSelector {
    pub fn new(tag: impl Into<String>) -> Self {
        let mut s = Self { tag: String::new(), mode: None };
        s.select(tag);
        s
    }

    pub fn select(&mut self, tag: impl Into<String>) -> Option<Mode> {
        let tag = tag.into();
        self.mode = match tag.parse::<Mode>() {
            Ok(m) => {
                debug!(mode = %m, "mode selected");
                Some(m)
            }
            Err(err) => {
                warn!("{err}; frames will only fade");
                None
            }
        };
        self.tag = tag;
        self.mode
    }

    pub fn select_mode(&mut self, mode: Mode) {
        self.select(mode.tag());
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackSignal {
    Play,
    Pause,
}

/// One display refresh: the session clock plus any playback gesture since
/// the previous refresh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Refresh {
    pub time_ms: f64,
    pub playback: Option<PlaybackSignal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickReport {
    /// Playback has not begun; nothing was sampled or drawn.
    Gated,
    Drawn {
        mode: Option<Mode>,
        routines: &'static [Routine],
    },
}

#[derive(Debug, Clone, Copy)]
pub struct FrameStatus<'a> {
    pub tag: &'a str,
    pub report: TickReport,
    pub paused: bool,
    pub fractal_zoom: f64,
    /// Seconds since the fractal view started zooming.
    pub fractal_secs: f64,
    pub ticks: u64,
}

/// The refresh-synchronized side of the loop.
pub trait Display {
    /// Blocks until the next refresh; `None` ends the session.
    fn next_refresh(&mut self, selector: &mut ModeSelector) -> anyhow::Result<Option<Refresh>>;
    fn surface(&mut self) -> &mut dyn Surface;
    fn present(&mut self, status: &FrameStatus<'_>) -> anyhow::Result<()>;
}

pub struct FrameScheduler<A: AnalysisSource> {
    source: A,
    frame: AnalysisFrame,
    stage: Stage,
    selector: ModeSelector,
    running: bool,
    ticks: u64,
    dispatched: Option<Option<Mode>>,
}

impl<A: AnalysisSource> FrameScheduler<A> {
    pub fn new(source: A, stage: Stage, selector: ModeSelector) -> Self {
        let frame = AnalysisFrame::new(source.bin_count());
        Self { source, frame, stage, selector, running: false, ticks: 0, dispatched: None }
    }

    /// Playback began: wake a suspended source and arm the loop.
    pub fn on_play(&mut self) -> anyhow::Result<()> {
        if self.source.state() == SourceState::Suspended {
            self.source.resume()?;
            info!("analysis source resumed");
        }
        if !self.running {
            self.running = true;
            info!(mode = %self.selector.tag(), "playback began, frame loop armed");
        }
        Ok(())
    }

    /// Suspends the source. Ticks continue on whatever it last produced.
    pub fn on_pause(&mut self) -> anyhow::Result<()> {
        if self.source.state() == SourceState::Running {
            self.source.suspend()?;
            info!("analysis source suspended");
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn frame(&self) -> &AnalysisFrame {
        &self.frame
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn source(&self) -> &A {
        &self.source
    }

    pub fn selector(&self) -> &ModeSelector {
        &self.selector
    }

    pub fn selector_mut(&mut self) -> &mut ModeSelector {
        &mut self.selector
    }

    /// Sample, fade, dispatch.
    pub fn tick(&mut self, surface: &mut dyn Surface, time_ms: f64) -> TickReport {
        if !self.running {
            return TickReport::Gated;
        }
        self.frame.refresh(&mut self.source);
        surface.fill_all(&Paint::Solid(FRAME_FADE));
        let mode = self.selector.mode();
        let routines = self.stage.dispatch(mode, &self.frame, surface, time_ms);
        if self.dispatched != Some(mode) {
            let names = self.stage.routine_names(mode);
            debug!(tag = %self.selector.tag(), routines = ?names, "dispatch changed");
            self.dispatched = Some(mode);
        }
        self.ticks += 1;
        TickReport::Drawn { mode, routines }
    }

    /// Drives ticks until the display ends the session. Without a prior
    /// play signal the loop never starts.
    pub fn run<D: Display>(&mut self, display: &mut D) -> anyhow::Result<()> {
        if !self.running {
            warn!("no playback yet, frame loop not started");
            return Ok(());
        }
        while let Some(refresh) = display.next_refresh(&mut self.selector)? {
            match refresh.playback {
                Some(PlaybackSignal::Play) => self.on_play()?,
                Some(PlaybackSignal::Pause) => self.on_pause()?,
                None => {}
            }
            let report = self.tick(display.surface(), refresh.time_ms);
            let status = FrameStatus {
                tag: self.selector.tag(),
                report,
                paused: self.source.state() == SourceState::Suspended,
                fractal_zoom: self.stage.mandelbrot.view().zoom(),
                fractal_secs: self.stage.mandelbrot.view().elapsed_secs(refresh.time_ms),
                ticks: self.ticks,
            };
            display.present(&status)?;
        }
        info!(ticks = self.ticks, "frame loop ended");
        Ok(())
    }
}
