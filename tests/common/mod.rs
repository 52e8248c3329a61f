#![allow(dead_code)]

use pulse_canvas::surface::{ImageData, Paint, Path, Rgba, Surface};

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Save,
    Restore,
    Translate(f32, f32),
    Rotate(f32),
    FillRect { x: f32, y: f32, w: f32, h: f32, paint: Paint },
    FillCircle { cx: f32, cy: f32, r: f32, paint: Paint },
    StrokePath { points: Vec<(f32, f32)>, color: Rgba, line_width: f32 },
    PutImage { width: usize, height: usize },
}

/// Records every drawing call instead of rasterizing it.
pub struct RecordingSurface {
    pub w: usize,
    pub h: usize,
    pub ops: Vec<Op>,
}

impl RecordingSurface {
    pub fn new(w: usize, h: usize) -> Self {
        Self { w, h, ops: Vec::new() }
    }

    pub fn take(&mut self) -> Vec<Op> {
        std::mem::take(&mut self.ops)
    }

    pub fn rects(&self) -> Vec<(f32, f32, f32, f32)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::FillRect { x, y, w, h, .. } => Some((*x, *y, *w, *h)),
                _ => None,
            })
            .collect()
    }

    pub fn strokes(&self) -> Vec<&Vec<(f32, f32)>> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::StrokePath { points, .. } => Some(points),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Op) -> bool) -> usize {
        self.ops.iter().filter(|op| pred(op)).count()
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> usize {
        self.w
    }

    fn height(&self) -> usize {
        self.h
    }

    fn save(&mut self) {
        self.ops.push(Op::Save);
    }

    fn restore(&mut self) {
        self.ops.push(Op::Restore);
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.ops.push(Op::Translate(dx, dy));
    }

    fn rotate(&mut self, radians: f32) {
        self.ops.push(Op::Rotate(radians));
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, paint: &Paint) {
        self.ops.push(Op::FillRect { x, y, w, h, paint: paint.clone() });
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, paint: &Paint) {
        self.ops.push(Op::FillCircle { cx, cy, r, paint: paint.clone() });
    }

    fn stroke_path(&mut self, path: &Path, color: Rgba, line_width: f32) {
        self.ops.push(Op::StrokePath { points: path.points().collect(), color, line_width });
    }

    fn put_image(&mut self, image: &ImageData) {
        self.ops.push(Op::PutImage { width: image.width, height: image.height });
    }
}

pub fn frame_filled(bins: usize, freq: u8, wave: u8) -> pulse_canvas::analyser::AnalysisFrame {
    pulse_canvas::analyser::AnalysisFrame::from_parts(vec![freq; bins], vec![wave; bins])
}
