mod common;

use common::{Op, RecordingSurface};
use pulse_canvas::audio::{AnalysisSource, SourceState, SynthSource};
use pulse_canvas::scheduler::{
    Display, FRAME_FADE, FrameScheduler, FrameStatus, ModeSelector, PlaybackSignal, Refresh,
    TickReport,
};
use pulse_canvas::surface::{Paint, Surface};
use pulse_canvas::visual::{Mode, Routine, Stage};

const W: usize = 160;
const H: usize = 90;

fn scheduler(tag: &str, source: SynthSource) -> FrameScheduler<SynthSource> {
    let mut rng = fastrand::Rng::with_seed(11);
    let stage = Stage::seeded(&mut rng, source.bin_count(), W, H, 0.0);
    FrameScheduler::new(source, stage, ModeSelector::new(tag))
}

fn synth() -> SynthSource {
    SynthSource::new(256, 48_000, 60, 5)
}

fn is_fade(op: &Op) -> bool {
    matches!(op, Op::FillRect { paint, w, h, .. }
        if *paint == Paint::Solid(FRAME_FADE) && *w == W as f32 && *h == H as f32)
}

// ── Gating ────────────────────────────────────────────────────────────────

#[test]
fn ticks_before_playback_draw_nothing() {
    let mut s = scheduler("bars", synth().suspended());
    let mut surface = RecordingSurface::new(W, H);
    for i in 0..5 {
        assert_eq!(s.tick(&mut surface, i as f64 * 16.0), TickReport::Gated);
    }
    assert!(surface.ops.is_empty());
    assert_eq!(s.ticks(), 0);
    assert!(!s.is_running());
    assert_eq!(s.source().elapsed_secs(), 0.0);
}

#[test]
fn play_resumes_a_suspended_source_and_arms_the_loop() {
    let mut s = scheduler("bars", synth().suspended());
    assert_eq!(s.source().state(), SourceState::Suspended);
    s.on_play().unwrap();
    assert_eq!(s.source().state(), SourceState::Running);
    assert!(s.is_running());

    let mut surface = RecordingSurface::new(W, H);
    let report = s.tick(&mut surface, 0.0);
    assert_eq!(report, TickReport::Drawn { mode: Some(Mode::Bars), routines: &[Routine::Bars] });
    assert!(s.source().elapsed_secs() > 0.0);
    assert_eq!(s.ticks(), 1);
}

#[test]
fn pause_keeps_ticking_on_the_last_frame() {
    let mut s = scheduler("bars", synth());
    s.on_play().unwrap();
    let mut surface = RecordingSurface::new(W, H);
    for i in 0..10 {
        s.tick(&mut surface, i as f64 * 16.0);
    }
    s.on_pause().unwrap();
    assert_eq!(s.source().state(), SourceState::Suspended);
    let elapsed = s.source().elapsed_secs();
    s.tick(&mut surface, 200.0);
    assert_eq!(s.source().elapsed_secs(), elapsed);
    assert_eq!(s.ticks(), 11);
}

// ── Dispatch ──────────────────────────────────────────────────────────────

#[test]
fn every_mode_fades_then_runs_its_routines() {
    for mode in Mode::all() {
        let mut s = scheduler(mode.tag(), synth());
        s.on_play().unwrap();
        let mut surface = RecordingSurface::new(W, H);
        let report = s.tick(&mut surface, 100.0);
        assert_eq!(report, TickReport::Drawn { mode: Some(mode), routines: mode.routines() });
        assert!(is_fade(&surface.ops[0]), "{mode}: first op should be the frame fade");
        assert!(surface.ops.len() > 1, "{mode}: nothing drawn after the fade");
    }
}

#[test]
fn each_classic_mode_draws_what_it_should() {
    let expect = [
        (Mode::Bars, 128, 0, 0),
        (Mode::Waveform, 0, 1, 0),
        (Mode::Spiral, 0, 1, 0),
        (Mode::PixelGrid, 512, 0, 0),
        (Mode::Mandelbrot, 0, 0, 1),
    ];
    for (mode, rects, strokes, images) in expect {
        let mut s = scheduler(mode.tag(), synth());
        s.on_play().unwrap();
        let mut surface = RecordingSurface::new(W, H);
        s.tick(&mut surface, 0.0);
        let ops = &surface.ops[1..];
        assert_eq!(ops.iter().filter(|op| matches!(op, Op::FillRect { .. })).count(), rects, "{mode}");
        assert_eq!(ops.iter().filter(|op| matches!(op, Op::StrokePath { .. })).count(), strokes, "{mode}");
        assert_eq!(ops.iter().filter(|op| matches!(op, Op::PutImage { .. })).count(), images, "{mode}");
    }
}

#[test]
fn unknown_tag_only_fades() {
    let mut s = scheduler("strobe", synth());
    s.on_play().unwrap();
    let mut surface = RecordingSurface::new(W, H);
    let report = s.tick(&mut surface, 0.0);
    assert_eq!(report, TickReport::Drawn { mode: None, routines: &[] });
    assert_eq!(surface.ops.len(), 1);
    assert!(is_fade(&surface.ops[0]));
    assert_eq!(s.selector().tag(), "strobe");
}

#[test]
fn hybrid_runs_nebula_then_kaleidoscope() {
    let mut s = scheduler("hybrid", synth());
    s.on_play().unwrap();
    let mut surface = RecordingSurface::new(W, H);
    let report = s.tick(&mut surface, 0.0);
    assert_eq!(
        report,
        TickReport::Drawn { mode: Some(Mode::Hybrid), routines: &[Routine::Nebula, Routine::Kaleidoscope] }
    );
    // Nebula never saves, so everything before the first save is its pass.
    let first_save = surface.ops.iter().position(|op| *op == Op::Save).unwrap();
    let nebula = &surface.ops[..first_save];
    assert_eq!(nebula.iter().filter(|op| matches!(op, Op::FillCircle { .. })).count(), 250);
    assert!(matches!(&nebula[1], Op::FillRect { paint: Paint::Solid(c), .. } if (c.a - 0.06).abs() < 1e-6));
    // The kaleidoscope fade sits right before its save.
    assert!(matches!(
        &surface.ops[first_save - 1],
        Op::FillRect { paint: Paint::Solid(c), .. } if (c.a - 0.08).abs() < 1e-6
    ));
}

#[test]
fn stage_routines_are_named_after_their_modes() {
    let s = scheduler("bars", synth());
    for mode in Mode::all() {
        let names = s.stage().routine_names(Some(mode));
        if mode == Mode::Hybrid {
            assert_eq!(names, vec!["nebula", "kaleidoscope"]);
        } else {
            assert_eq!(names, vec![mode.tag()]);
        }
    }
    assert!(s.stage().routine_names(None).is_empty());
}

#[test]
fn selecting_a_new_mode_takes_effect_next_tick() {
    let mut s = scheduler("bars", synth());
    s.on_play().unwrap();
    let mut surface = RecordingSurface::new(W, H);
    s.tick(&mut surface, 0.0);
    assert_eq!(s.selector_mut().select("waveform"), Some(Mode::Waveform));
    let report = s.tick(&mut surface, 16.0);
    assert_eq!(report, TickReport::Drawn { mode: Some(Mode::Waveform), routines: &[Routine::Waveform] });
    assert_eq!(s.selector_mut().select("nope"), None);
    assert_eq!(s.tick(&mut surface, 32.0), TickReport::Drawn { mode: None, routines: &[] });
}

// ── run() ─────────────────────────────────────────────────────────────────

struct ScriptedDisplay {
    surface: RecordingSurface,
    script: Vec<Refresh>,
    tags: Vec<(String, Option<Mode>)>,
    statuses: Vec<(TickReport, bool, u64)>,
    switch_at: Option<(usize, &'static str)>,
    served: usize,
}

impl ScriptedDisplay {
    fn new(script: Vec<Refresh>) -> Self {
        Self {
            surface: RecordingSurface::new(W, H),
            script,
            tags: Vec::new(),
            statuses: Vec::new(),
            switch_at: None,
            served: 0,
        }
    }
}

impl Display for ScriptedDisplay {
    fn next_refresh(&mut self, selector: &mut ModeSelector) -> anyhow::Result<Option<Refresh>> {
        if self.served >= self.script.len() {
            return Ok(None);
        }
        if let Some((at, tag)) = self.switch_at {
            if at == self.served {
                selector.select(tag);
            }
        }
        self.tags.push((selector.tag().to_string(), selector.mode()));
        let r = self.script[self.served];
        self.served += 1;
        Ok(Some(r))
    }

    fn surface(&mut self) -> &mut dyn Surface {
        &mut self.surface
    }

    fn present(&mut self, status: &FrameStatus<'_>) -> anyhow::Result<()> {
        self.statuses.push((status.report, status.paused, status.ticks));
        Ok(())
    }
}

fn refreshes(n: usize) -> Vec<Refresh> {
    (0..n).map(|i| Refresh { time_ms: i as f64 * 16.0, playback: None }).collect()
}

#[test]
fn run_without_playback_never_starts() {
    let mut s = scheduler("bars", synth().suspended());
    let mut display = ScriptedDisplay::new(refreshes(5));
    s.run(&mut display).unwrap();
    assert_eq!(display.served, 0);
    assert_eq!(s.ticks(), 0);
    assert!(display.surface.ops.is_empty());
}

#[test]
fn run_ticks_once_per_refresh_until_the_display_ends() {
    let mut s = scheduler("orbits", synth());
    s.on_play().unwrap();
    let mut display = ScriptedDisplay::new(refreshes(7));
    s.run(&mut display).unwrap();
    assert_eq!(s.ticks(), 7);
    assert_eq!(display.statuses.len(), 7);
    assert_eq!(display.statuses.last().map(|st| st.2), Some(7));
    let fades = display.surface.count(is_fade);
    assert_eq!(fades, 7);
}

#[test]
fn run_applies_playback_signals_and_mode_switches() {
    let mut s = scheduler("bars", synth());
    s.on_play().unwrap();
    let mut script = refreshes(6);
    script[2].playback = Some(PlaybackSignal::Pause);
    script[4].playback = Some(PlaybackSignal::Play);
    let mut display = ScriptedDisplay::new(script);
    display.switch_at = Some((3, "spiral"));
    s.run(&mut display).unwrap();

    let paused: Vec<bool> = display.statuses.iter().map(|st| st.1).collect();
    assert_eq!(paused, vec![false, false, true, true, false, false]);
    assert_eq!(display.tags[2], ("bars".to_string(), Some(Mode::Bars)));
    assert_eq!(display.tags[3], ("spiral".to_string(), Some(Mode::Spiral)));
    assert_eq!(
        display.statuses[3].0,
        TickReport::Drawn { mode: Some(Mode::Spiral), routines: &[Routine::Spiral] }
    );
    assert_eq!(s.ticks(), 6);
}
