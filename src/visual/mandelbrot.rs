use crate::analyser::AnalysisFrame;
use crate::surface::{ImageData, Surface};
use crate::visual::Visualizer;
use rayon::prelude::*;

pub const INITIAL_ZOOM: f64 = 1.5;
/// Seahorse valley.
pub const TARGET: (f64, f64) = (-0.7453, 0.1127);
const ZOOM_PER_BASS: f64 = 0.000_05;
const BASE_ITERATIONS: u32 = 100;

/// Zoom state that persists across ticks. `zoom` never decreases.
#[derive(Debug, Clone, PartialEq)]
pub struct FractalView {
    zoom: f64,
    target: (f64, f64),
    started_ms: f64,
}

impl FractalView {
    pub fn new(started_ms: f64) -> Self {
        Self { zoom: INITIAL_ZOOM, target: TARGET, started_ms }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn target(&self) -> (f64, f64) {
        self.target
    }

    pub fn elapsed_secs(&self, now_ms: f64) -> f64 {
        ((now_ms - self.started_ms) / 1000.0).max(0.0)
    }

    pub fn advance(&mut self, bass: f32) {
        let bass = if bass.is_finite() { bass.max(0.0) as f64 } else { 0.0 };
        self.zoom *= 1.0 + bass * ZOOM_PER_BASS;
    }

    /// Complex-plane point under pixel (`px`, `py`) of a `w`×`h` image.
    pub fn point(&self, px: usize, py: usize, w: usize, h: usize) -> (f64, f64) {
        let (w, h) = (w as f64, h as f64);
        let x0 = (px as f64 - w / 2.0) / (0.5 * self.zoom * w) + self.target.0;
        let y0 = (py as f64 - h / 2.0) / (0.5 * self.zoom * h) + self.target.1;
        (x0, y0)
    }
}

pub fn max_iterations(bass: f32) -> u32 {
    BASE_ITERATIONS + (bass.max(0.0) / 2.0).floor() as u32
}

/// Main cardioid or period-2 bulb. Points right on the boundary may be
/// classified differently from the iterated answer.
pub fn in_main_bulbs(x: f64, y: f64) -> bool {
    let xq = x - 0.25;
    let q = xq * xq + y * y;
    let cardioid = q * (q + xq) < 0.25 * y * y;
    let bulb = (x + 1.0) * (x + 1.0) + y * y < 1.0 / 16.0;
    cardioid || bulb
}

/// Iterations before |z| exceeds 2, `max_iter` for points that never escape.
pub fn escape_time(x0: f64, y0: f64, max_iter: u32) -> u32 {
    if in_main_bulbs(x0, y0) {
        return max_iter;
    }
    let (mut zx, mut zy) = (0.0f64, 0.0f64);
    let mut i = 0u32;
    while zx * zx + zy * zy <= 4.0 && i < max_iter {
        let xt = zx * zx - zy * zy + x0;
        zy = 2.0 * zx * zy + y0;
        zx = xt;
        i += 1;
    }
    i
}

pub fn pixel_color(iter: u32, max_iter: u32, bass: f32) -> [u8; 4] {
    let color = if iter >= max_iter {
        0.0
    } else {
        255.0 - (iter as f64 * 255.0 / max_iter.max(1) as f64).floor()
    };
    let byte = |v: f64| (v % 255.0).round_ties_even().clamp(0.0, 255.0) as u8;
    [
        byte(color + bass as f64 * 0.5),
        byte(color * 1.2),
        byte(color * 2.5),
        255,
    ]
}

pub struct Mandelbrot {
    view: FractalView,
    image: ImageData,
}

impl Mandelbrot {
    pub fn new(view: FractalView) -> Self {
        Self { view, image: ImageData::new(0, 0) }
    }

    pub fn view(&self) -> &FractalView {
        &self.view
    }

    pub fn image(&self) -> &ImageData {
        &self.image
    }

    fn fill_image(&mut self, bass: f32) {
        let (w, h) = (self.image.width, self.image.height);
        if w == 0 || h == 0 {
            return;
        }
        let max_iter = max_iterations(bass);
        let view = &self.view;
        // Rows are independent; the result matches a sequential sweep.
        self.image
            .data
            .par_chunks_mut(w * 4)
            .enumerate()
            .for_each(|(py, row)| {
                for (px, out) in row.chunks_exact_mut(4).enumerate() {
                    let (x0, y0) = view.point(px, py, w, h);
                    let iter = escape_time(x0, y0, max_iter);
                    out.copy_from_slice(&pixel_color(iter, max_iter, bass));
                }
            });
    }
}

impl Visualizer for Mandelbrot {
    fn name(&self) -> &'static str {
        "mandelbrot"
    }

    fn render(&mut self, frame: &AnalysisFrame, surface: &mut dyn Surface, _time_ms: f64) {
        let bass = frame.bass();
        self.view.advance(bass);
        self.image.ensure_size(surface.width(), surface.height());
        self.fill_image(bass);
        surface.put_image(&self.image);
    }
}
