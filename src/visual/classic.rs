//! Stateless routines: each draws straight from the current frame.

use crate::analyser::AnalysisFrame;
use crate::surface::{Paint, Path, Rgba, Surface};
use crate::visual::Visualizer;
use std::f32::consts::PI;

pub struct Bars;

impl Visualizer for Bars {
    fn name(&self) -> &'static str {
        "bars"
    }

    fn render(&mut self, frame: &AnalysisFrame, surface: &mut dyn Surface, _time_ms: f64) {
        let n = frame.bin_count();
        if n == 0 {
            return;
        }
        let canvas_h = surface.height() as f32;
        let bar_w = (surface.width() as f32 / n as f32) * 2.5;
        let mut x = 0.0f32;
        for (i, &v) in frame.frequency.iter().enumerate() {
            let height = v as f32;
            let color = Rgba::rgb(85 + i as i32 * 2, 137 - i as i32, 107 + v as i32);
            surface.fill_rect(x, canvas_h - height, bar_w, height, &Paint::Solid(color));
            x += bar_w + 1.0;
        }
    }
}

pub struct Waveform;

impl Waveform {
    /// Vertical position of one sample; 128 sits on the midline.
    pub fn sample_y(sample: u8, canvas_h: f32) -> f32 {
        let v = sample as f32 / 128.0;
        v * canvas_h / 2.0
    }
}

impl Visualizer for Waveform {
    fn name(&self) -> &'static str {
        "waveform"
    }

    fn render(&mut self, frame: &AnalysisFrame, surface: &mut dyn Surface, _time_ms: f64) {
        let n = frame.waveform.len();
        if n == 0 {
            return;
        }
        let (w, h) = (surface.width() as f32, surface.height() as f32);
        let slice_w = w / n as f32;
        let mut path = Path::new();
        let mut x = 0.0f32;
        for (i, &s) in frame.waveform.iter().enumerate() {
            let y = Self::sample_y(s, h);
            if i == 0 {
                path.move_to(x, y);
            } else {
                path.line_to(x, y);
            }
            x += slice_w;
        }
        path.line_to(w, h / 2.0);
        surface.stroke_path(&path, Rgba::rgb(125, 76, 147), 2.0);
    }
}

pub struct Spiral;

const SPIRAL_POINTS: usize = 100;
const SPIRAL_A: f32 = 2.0;
const SPIRAL_B: f32 = 4.0;
const SPIRAL_TURNS: f32 = 3.0;

impl Visualizer for Spiral {
    fn name(&self) -> &'static str {
        "spiral"
    }

    fn render(&mut self, frame: &AnalysisFrame, surface: &mut dyn Surface, time_ms: f64) {
        let n = frame.bin_count();
        let cx = surface.width() as f32 / 2.0;
        let cy = surface.height() as f32 / 2.0;
        let max_theta = 2.0 * PI * SPIRAL_TURNS;

        let mut path = Path::new();
        for i in 0..SPIRAL_POINTS {
            let progress = i as f32 / SPIRAL_POINTS as f32;
            let theta = progress * max_theta;
            let bin = (progress * n as f32).floor() as usize;
            let r = (SPIRAL_A + SPIRAL_B * theta) * (1.0 + frame.bin(bin) as f32 / 255.0);
            let (x, y) = (cx + r * theta.cos(), cy + r * theta.sin());
            if i == 0 {
                path.move_to(x, y);
            } else {
                path.line_to(x, y);
            }
        }
        // One degree of hue per millisecond.
        let hue = time_ms.rem_euclid(360.0) as f32;
        surface.stroke_path(&path, Rgba::hsl(hue, 100.0, 70.0), 2.0);
    }
}

pub struct PixelGrid;

pub const GRID_COLS: usize = 32;
pub const GRID_ROWS: usize = 16;

impl PixelGrid {
    /// Bin sampled by cell `i`: cells spread evenly over the spectrum, which
    /// is a plain `N / cells` stride whenever N is a multiple of the cell count.
    pub fn cell_bin(cell: usize, bins: usize) -> usize {
        cell * bins / (GRID_COLS * GRID_ROWS)
    }
}

impl Visualizer for PixelGrid {
    fn name(&self) -> &'static str {
        "pixelGrid"
    }

    fn render(&mut self, frame: &AnalysisFrame, surface: &mut dyn Surface, _time_ms: f64) {
        let cell_w = surface.width() as f32 / GRID_COLS as f32;
        let cell_h = surface.height() as f32 / GRID_ROWS as f32;
        let bins = frame.bin_count();
        for row in 0..GRID_ROWS {
            for col in 0..GRID_COLS {
                let cell = row * GRID_COLS + col;
                let val = frame.bin(Self::cell_bin(cell, bins)) as f32;
                let hue = 120.0 + val / 2.0;
                let light = val / 255.0 * 70.0;
                surface.fill_rect(
                    col as f32 * cell_w,
                    row as f32 * cell_h,
                    cell_w,
                    cell_h,
                    &Paint::Solid(Rgba::hsl(hue, 100.0, light)),
                );
            }
        }
    }
}
