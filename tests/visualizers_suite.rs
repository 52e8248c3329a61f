mod common;

use common::{Op, RecordingSurface, frame_filled};
use pulse_canvas::analyser::AnalysisFrame;
use pulse_canvas::surface::{Paint, Raster, Rgba, Surface};
use pulse_canvas::visual::particles::{CLUSTER_COUNT, NEBULA_COUNT, ORBIT_COUNT};
use pulse_canvas::visual::{
    Bars, FractalView, INITIAL_ZOOM, Kaleidoscope, Mandelbrot, Nebula, NebulaStore, OrbitStore,
    Orbits, PixelGrid, SatelliteStore, Spiral, Visualizer, Waveform, escape_time, max_iterations,
    pixel_color,
};

const BINS: usize = 128;

fn rng() -> fastrand::Rng {
    fastrand::Rng::with_seed(42)
}

// ── Classic routines ───────────────────────────────────────────────────────

#[test]
fn bars_on_silence_draw_zero_height_bars() {
    let mut surface = RecordingSurface::new(640, 360);
    Bars.render(&frame_filled(BINS, 0, 128), &mut surface, 0.0);

    let rects = surface.rects();
    assert_eq!(rects.len(), BINS);
    let bar_w = 640.0 / BINS as f32 * 2.5;
    for (i, (x, y, w, h)) in rects.iter().enumerate() {
        assert_eq!(*h, 0.0);
        assert_eq!(*y, 360.0);
        assert_eq!(*w, bar_w);
        assert!((x - i as f32 * (bar_w + 1.0)).abs() < 1e-3);
    }
}

#[test]
fn bars_scale_with_bin_value_and_clamp_colour() {
    let mut surface = RecordingSurface::new(640, 360);
    Bars.render(&frame_filled(BINS, 255, 128), &mut surface, 0.0);
    match &surface.ops[0] {
        Op::FillRect { y, h, paint, .. } => {
            assert_eq!(*h, 255.0);
            assert_eq!(*y, 105.0);
            assert_eq!(*paint, Paint::Solid(Rgba::rgb(85, 137, 362)));
        }
        other => panic!("expected a rect, got {other:?}"),
    }
    match &surface.ops[BINS - 1] {
        // Red and blue saturate for the top bin.
        Op::FillRect { paint, .. } => assert_eq!(*paint, Paint::Solid(Rgba::new(255, 10, 255, 1.0))),
        other => panic!("expected a rect, got {other:?}"),
    }
}

#[test]
fn waveform_on_silence_is_a_flat_midline() {
    let mut surface = RecordingSurface::new(400, 200);
    Waveform.render(&frame_filled(BINS, 0, 128), &mut surface, 0.0);

    let strokes = surface.strokes();
    assert_eq!(strokes.len(), 1);
    let points = strokes[0];
    assert_eq!(points.len(), BINS + 1);
    assert!(points.iter().all(|&(_, y)| y == 100.0));
    assert_eq!(points[0].0, 0.0);
    assert_eq!(*points.last().unwrap(), (400.0, 100.0));
}

#[test]
fn waveform_stroke_colour_and_width() {
    let mut surface = RecordingSurface::new(400, 200);
    Waveform.render(&frame_filled(BINS, 0, 0), &mut surface, 0.0);
    match &surface.ops[0] {
        Op::StrokePath { points, color, line_width } => {
            assert_eq!(*color, Rgba::rgb(125, 76, 147));
            assert_eq!(*line_width, 2.0);
            assert_eq!(points[0].1, 0.0);
        }
        other => panic!("expected a stroke, got {other:?}"),
    }
}

#[test]
fn spiral_starts_near_centre_and_cycles_hue_with_time() {
    let mut surface = RecordingSurface::new(300, 200);
    Spiral.render(&frame_filled(BINS, 0, 128), &mut surface, 400.0);
    match &surface.ops[0] {
        Op::StrokePath { points, color, .. } => {
            assert_eq!(points.len(), 100);
            assert_eq!(points[0], (152.0, 100.0));
            assert_eq!(*color, Rgba::hsl(40.0, 100.0, 70.0));
        }
        other => panic!("expected a stroke, got {other:?}"),
    }

    let mut later = RecordingSurface::new(300, 200);
    Spiral.render(&frame_filled(BINS, 0, 128), &mut later, 760.0);
    assert_eq!(surface.ops, later.ops);
}

#[test]
fn loud_spiral_points_sit_twice_as_far_out() {
    let mut quiet = RecordingSurface::new(300, 200);
    let mut loud = RecordingSurface::new(300, 200);
    Spiral.render(&frame_filled(BINS, 0, 128), &mut quiet, 0.0);
    Spiral.render(&frame_filled(BINS, 255, 128), &mut loud, 0.0);
    let (q, l) = (quiet.strokes()[0][50], loud.strokes()[0][50]);
    let dq = ((q.0 - 150.0).powi(2) + (q.1 - 100.0).powi(2)).sqrt();
    let dl = ((l.0 - 150.0).powi(2) + (l.1 - 100.0).powi(2)).sqrt();
    assert!((dl - 2.0 * dq).abs() < 1e-2);
}

#[test]
fn pixel_grid_fills_every_cell() {
    let mut surface = RecordingSurface::new(320, 160);
    PixelGrid.render(&frame_filled(BINS, 0, 128), &mut surface, 0.0);
    let rects = surface.rects();
    assert_eq!(rects.len(), 32 * 16);
    assert_eq!(rects[0], (0.0, 0.0, 10.0, 10.0));
    assert_eq!(rects[33], (10.0, 10.0, 10.0, 10.0));
    assert!(surface.ops.iter().all(|op| matches!(
        op,
        Op::FillRect { paint: Paint::Solid(c), .. } if (c.r, c.g, c.b) == (0, 0, 0)
    )));
}

#[test]
fn pixel_grid_cells_spread_over_the_spectrum() {
    assert_eq!(PixelGrid::cell_bin(0, 128), 0);
    assert_eq!(PixelGrid::cell_bin(4, 128), 1);
    assert_eq!(PixelGrid::cell_bin(511, 128), 127);
    assert_eq!(PixelGrid::cell_bin(511, 1024), 1022);
    assert_eq!(PixelGrid::cell_bin(300, 0), 0);
}

// ── Orbits ────────────────────────────────────────────────────────────────

#[test]
fn orbit_angles_advance_by_speed_even_on_identical_frames() {
    let mut orbits = Orbits::new(OrbitStore::seed(&mut rng(), BINS));
    let frame = frame_filled(BINS, 90, 128);
    let mut surface = RecordingSurface::new(400, 300);

    let before: Vec<_> = orbits.store().particles().to_vec();
    orbits.render(&frame, &mut surface, 0.0);
    let once: Vec<_> = orbits.store().particles().to_vec();
    orbits.render(&frame, &mut surface, 0.0);
    let twice: Vec<_> = orbits.store().particles().to_vec();

    assert_eq!(twice.len(), ORBIT_COUNT);
    for ((b, o), t) in before.iter().zip(&once).zip(&twice) {
        assert_eq!(o.angle, b.angle + b.speed);
        assert_eq!(t.angle, o.angle + o.speed);
        assert_eq!((o.radius, o.size, o.hue, o.band), (b.radius, b.size, b.hue, b.band));
    }
}

#[test]
fn orbits_fade_then_draw_one_circle_per_particle() {
    let mut orbits = Orbits::new(OrbitStore::seed(&mut rng(), BINS));
    let mut surface = RecordingSurface::new(400, 300);
    orbits.render(&frame_filled(BINS, 0, 128), &mut surface, 0.0);

    match &surface.ops[0] {
        Op::FillRect { paint: Paint::Solid(c), w, h, .. } => {
            assert!((c.a - 0.09).abs() < 1e-6);
            assert_eq!((*w, *h), (400.0, 300.0));
        }
        other => panic!("expected the fade, got {other:?}"),
    }
    let circles: Vec<_> = surface
        .ops
        .iter()
        .filter_map(|op| match op {
            Op::FillCircle { r, .. } => Some(*r),
            _ => None,
        })
        .collect();
    assert_eq!(circles.len(), ORBIT_COUNT);
    // Silent bands: circles keep their seeded size.
    for (r, p) in circles.iter().zip(orbits.store().particles()) {
        assert_eq!(*r, p.size);
    }
}

// ── Nebula ────────────────────────────────────────────────────────────────

#[test]
fn nebula_keeps_its_particles_on_the_canvas() {
    let mut nebula = Nebula::new(NebulaStore::seed(&mut rng(), BINS, 200.0, 120.0));
    let frame = frame_filled(BINS, 255, 128);
    let mut surface = RecordingSurface::new(200, 120);
    for tick in 0..300 {
        nebula.render(&frame, &mut surface, tick as f64 * 16.0);
    }
    let particles = nebula.store().particles();
    assert_eq!(particles.len(), NEBULA_COUNT);
    assert!(particles.iter().all(|p| (0.0..=200.0).contains(&p.x) && (0.0..=120.0).contains(&p.y)));
}

#[test]
fn each_nebula_particle_moves_by_its_own_band_energy() {
    let (w, h) = (200.0f32, 120.0f32);
    let mut nebula = Nebula::new(NebulaStore::seed(&mut rng(), BINS, w, h));
    let frequency: Vec<u8> = (0..BINS).map(|i| (i * 2) as u8).collect();
    let frame = AnalysisFrame::from_parts(frequency.clone(), vec![128; BINS]);
    let time_ms = 1234.0;

    let before: Vec<_> = nebula.store().particles().to_vec();
    let mut surface = RecordingSurface::new(w as usize, h as usize);
    nebula.render(&frame, &mut surface, time_ms);

    let mut checked = 0;
    for (b, a) in before.iter().zip(nebula.store().particles()) {
        let e = frequency[b.band] as f32 / 255.0;
        let swirl = ((time_ms * 0.001 + b.band as f64).sin() * 0.5) as f32;
        let angle = b.angle + swirl * 0.01;
        let step = b.speed * (1.0 + 4.0 * e) * 0.5;
        let (x, y) = (b.x + angle.cos() * step, b.y + angle.sin() * step);
        assert!((a.angle - angle).abs() < 1e-6);
        // Wrapped particles are covered by the edge tests.
        if !(0.0..=w).contains(&x) || !(0.0..=h).contains(&y) {
            continue;
        }
        assert!((a.x - x).abs() < 1e-4, "band {}: x {} vs {}", b.band, a.x, x);
        assert!((a.y - y).abs() < 1e-4, "band {}: y {} vs {}", b.band, a.y, y);
        checked += 1;
    }
    assert!(checked > NEBULA_COUNT / 2);
}

#[test]
fn nebula_flashes_only_on_heavy_bass() {
    let mut nebula = Nebula::new(NebulaStore::seed(&mut rng(), BINS, 200.0, 120.0));
    let mut quiet = RecordingSurface::new(200, 120);
    nebula.render(&frame_filled(BINS, 100, 128), &mut quiet, 0.0);
    assert_eq!(quiet.rects().len(), 1);
    assert_eq!(quiet.count(|op| matches!(op, Op::FillCircle { .. })), NEBULA_COUNT);

    let mut loud = RecordingSurface::new(200, 120);
    nebula.render(&frame_filled(BINS, 200, 128), &mut loud, 0.0);
    assert_eq!(loud.rects().len(), 2);
    match loud.ops.last() {
        Some(Op::FillRect { paint: Paint::Solid(c), .. }) => {
            assert_eq!((c.r, c.g, c.b), (255, 255, 255));
            assert!((c.a - 0.02).abs() < 1e-6);
        }
        other => panic!("expected the flash last, got {other:?}"),
    }
}

#[test]
fn nebula_glow_grows_with_energy() {
    let mut a = Nebula::new(NebulaStore::seed(&mut rng(), BINS, 200.0, 120.0));
    let mut b = Nebula::new(NebulaStore::seed(&mut rng(), BINS, 200.0, 120.0));
    let mut quiet = RecordingSurface::new(200, 120);
    let mut loud = RecordingSurface::new(200, 120);
    a.render(&frame_filled(BINS, 0, 128), &mut quiet, 0.0);
    b.render(&frame_filled(BINS, 255, 128), &mut loud, 0.0);
    let radii = |s: &RecordingSurface| -> Vec<f32> {
        s.ops
            .iter()
            .filter_map(|op| match op {
                Op::FillCircle { r, .. } => Some(*r),
                _ => None,
            })
            .collect()
    };
    for (q, l) in radii(&quiet).iter().zip(radii(&loud)) {
        assert!((l / q - 2.3 / 0.5).abs() < 1e-3);
    }
}

// ── Kaleidoscope ──────────────────────────────────────────────────────────

fn kaleidoscope() -> Kaleidoscope {
    let mut r = rng();
    Kaleidoscope::new(SatelliteStore::seed(&mut r), fastrand::Rng::with_seed(7))
}

#[test]
fn kaleidoscope_quiet_frame_draws_five_spikes_per_sector() {
    let mut k = kaleidoscope();
    let mut surface = RecordingSurface::new(400, 300);
    k.render(&frame_filled(BINS, 0, 128), &mut surface, 0.0);

    assert_eq!(surface.strokes().len(), 8 * 5);
    // Fade only: no dust or flash at zero treble and bass.
    assert_eq!(surface.rects().len(), 1);
    assert_eq!(surface.ops[1], Op::Save);
    assert_eq!(surface.ops[2], Op::Translate(200.0, 150.0));
    let saves = surface.count(|op| *op == Op::Save);
    let restores = surface.count(|op| *op == Op::Restore);
    assert_eq!(saves, 9);
    assert_eq!(saves, restores);
}

#[test]
fn kaleidoscope_saturated_frame_draws_twelve_spikes_and_flashes() {
    let mut k = kaleidoscope();
    let mut surface = RecordingSurface::new(400, 300);
    let frame = frame_filled(BINS, 255, 128);
    assert_eq!(frame.bass(), 255.0);
    assert_eq!(frame.treble(), 255.0);
    assert_eq!(frame.energy(), 255.0);

    k.render(&frame, &mut surface, 1000.0);
    let spikes = 12;
    assert_eq!(surface.strokes().len(), 8 * spikes);
    // Tip plus six satellites per spike, plus the core glow.
    assert_eq!(surface.count(|op| matches!(op, Op::FillCircle { .. })), 8 * spikes * 7 + 1);
    let flashes = surface.count(|op| {
        matches!(op, Op::FillRect { paint: Paint::Solid(c), .. } if (c.a - 0.07).abs() < 1e-6)
    });
    assert_eq!(flashes, 8 * spikes);
    // Every dust try lands at full treble.
    let dust = surface.count(|op| matches!(op, Op::FillRect { w, .. } if *w == 1.5));
    assert_eq!(dust, 8 * 100);
}

#[test]
fn kaleidoscope_advances_the_satellites_it_visits() {
    let mut k = kaleidoscope();
    let before: Vec<_> = k.satellites().clusters().to_vec();
    let mut surface = RecordingSurface::new(400, 300);
    k.render(&frame_filled(BINS, 0, 128), &mut surface, 0.0);
    let after = k.satellites().clusters();
    assert_eq!(after.len(), CLUSTER_COUNT);
    // 8 sectors × 5 spikes touch clusters 0..40 once each.
    for c in 0..CLUSTER_COUNT {
        for (b, a) in before[c].iter().zip(&after[c]) {
            if c < 40 {
                assert_eq!(a.angle, b.angle + b.speed);
            } else {
                assert_eq!(a.angle, b.angle);
            }
        }
    }
}

// ── Mandelbrot ────────────────────────────────────────────────────────────

#[test]
fn fractal_zoom_never_decreases() {
    let mut view = FractalView::new(0.0);
    let mut last = view.zoom();
    assert_eq!(last, INITIAL_ZOOM);
    for bass in [0.0, 255.0, 12.0, 0.0, -40.0, f32::NAN, 180.0] {
        view.advance(bass);
        assert!(view.zoom() >= last);
        last = view.zoom();
    }
    let mut quiet = FractalView::new(0.0);
    quiet.advance(0.0);
    assert_eq!(quiet.zoom(), INITIAL_ZOOM);
}

#[test]
fn fractal_clock_counts_from_the_view_start() {
    let view = FractalView::new(2_000.0);
    assert_eq!(view.elapsed_secs(2_000.0), 0.0);
    assert_eq!(view.elapsed_secs(14_500.0), 12.5);
    assert_eq!(view.elapsed_secs(500.0), 0.0);
}

#[test]
fn cardioid_points_never_escape() {
    for (x, y) in [(0.0, 0.0), (-0.5, 0.2), (0.2, 0.0), (-1.0, 0.05)] {
        assert_eq!(escape_time(x, y, 150), 150);
    }
    assert!(escape_time(0.5, 0.5, 150) < 150);
}

#[test]
fn parallel_image_matches_a_sequential_sweep() {
    let (w, h) = (48, 27);
    let mut m = Mandelbrot::new(FractalView::new(0.0));
    let mut raster = Raster::new(w, h);
    let frame = frame_filled(BINS, 200, 128);
    m.render(&frame, &mut raster, 0.0);

    let bass = frame.bass();
    let max_iter = max_iterations(bass);
    assert_eq!(max_iter, 200);
    let view = m.view();
    let mut expected = Vec::with_capacity(w * h * 4);
    for py in 0..h {
        for px in 0..w {
            let (x0, y0) = view.point(px, py, w, h);
            expected.extend_from_slice(&pixel_color(escape_time(x0, y0, max_iter), max_iter, bass));
        }
    }
    assert_eq!(m.image().data, expected);
    assert_eq!(raster.pixels(), expected.as_slice());
}

#[test]
fn mandelbrot_puts_one_canvas_sized_image() {
    let mut m = Mandelbrot::new(FractalView::new(0.0));
    let mut surface = RecordingSurface::new(64, 36);
    m.render(&AnalysisFrame::new(BINS), &mut surface, 0.0);
    assert_eq!(surface.ops, vec![Op::PutImage { width: 64, height: 36 }]);
    assert_eq!(m.view().zoom(), INITIAL_ZOOM);
    assert_eq!(surface.width(), 64);
}
