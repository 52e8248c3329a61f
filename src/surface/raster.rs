use crate::surface::{ImageData, Paint, Path, Rgba, Surface};

/// Canvas-style affine matrix: `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Transform {
    pub const IDENTITY: Self = Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    pub fn translated(self, dx: f32, dy: f32) -> Self {
        Self {
            e: self.a * dx + self.c * dy + self.e,
            f: self.b * dx + self.d * dy + self.f,
            ..self
        }
    }

    pub fn rotated(self, radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        Self {
            a: self.a * c + self.c * s,
            b: self.b * c + self.d * s,
            c: self.c * c - self.a * s,
            d: self.d * c - self.b * s,
            ..self
        }
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (self.a * x + self.c * y + self.e, self.b * x + self.d * y + self.f)
    }

    pub fn inverse(&self) -> Option<Self> {
        let det = self.a * self.d - self.b * self.c;
        if !det.is_finite() || det.abs() <= f32::EPSILON {
            return None;
        }
        let inv = 1.0 / det;
        Some(Self {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }
}

/// Device-space pixel span touched by a shape, already clipped.
struct Span {
    x0: usize,
    x1: usize,
    y0: usize,
    y1: usize,
}

/// RGBA8 software canvas. Pixels are tested at their centres in user space,
/// so rotated shapes come out right without a separate rasterizer per case.
pub struct Raster {
    w: usize,
    h: usize,
    pixels: Vec<u8>,
    transform: Transform,
    stack: Vec<Transform>,
}

impl Raster {
    pub fn new(w: usize, h: usize) -> Self {
        let mut r = Self {
            w: 0,
            h: 0,
            pixels: Vec::new(),
            transform: Transform::IDENTITY,
            stack: Vec::new(),
        };
        r.resize(w, h);
        r
    }

    /// Reallocates and clears to opaque black; the transform stack resets.
    pub fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        self.pixels = vec![0; w.saturating_mul(h).saturating_mul(4)];
        self.transform = Transform::IDENTITY;
        self.stack.clear();
        self.clear();
    }

    pub fn clear(&mut self) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&[0, 0, 0, 255]);
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.w || y >= self.h {
            return None;
        }
        let i = (y * self.w + x) * 4;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]])
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    fn span_for(&self, ux0: f32, uy0: f32, ux1: f32, uy1: f32) -> Option<Span> {
        if self.w == 0 || self.h == 0 {
            return None;
        }
        let corners = [
            self.transform.apply(ux0, uy0),
            self.transform.apply(ux1, uy0),
            self.transform.apply(ux0, uy1),
            self.transform.apply(ux1, uy1),
        ];
        let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
        let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for (x, y) in corners {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        if !(min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite()) {
            return None;
        }
        let x0 = min_x.floor().max(0.0) as usize;
        let y0 = min_y.floor().max(0.0) as usize;
        let x1 = (max_x.ceil().max(0.0) as usize).min(self.w);
        let y1 = (max_y.ceil().max(0.0) as usize).min(self.h);
        (x0 < x1 && y0 < y1).then_some(Span { x0, x1, y0, y1 })
    }

    fn fill_shape(
        &mut self,
        bounds: (f32, f32, f32, f32),
        paint: &Paint,
        inside: impl Fn(f32, f32) -> bool,
    ) {
        let Some(inv) = self.transform.inverse() else {
            return;
        };
        let Some(span) = self.span_for(bounds.0, bounds.1, bounds.2, bounds.3) else {
            return;
        };
        for py in span.y0..span.y1 {
            for px in span.x0..span.x1 {
                let (ux, uy) = inv.apply(px as f32 + 0.5, py as f32 + 0.5);
                if inside(ux, uy) {
                    let color = paint.color_at(ux, uy);
                    self.blend(px, py, color);
                }
            }
        }
    }

    fn blend(&mut self, x: usize, y: usize, c: Rgba) {
        if c.a <= 0.0 {
            return;
        }
        let i = (y * self.w + x) * 4;
        let px = &mut self.pixels[i..i + 4];
        if c.a >= 1.0 {
            px[0] = c.r;
            px[1] = c.g;
            px[2] = c.b;
        } else {
            let mix = |src: u8, dst: u8| (src as f32 * c.a + dst as f32 * (1.0 - c.a)).round() as u8;
            px[0] = mix(c.r, px[0]);
            px[1] = mix(c.g, px[1]);
            px[2] = mix(c.b, px[2]);
        }
        px[3] = 255;
    }
}

impl Surface for Raster {
    fn width(&self) -> usize {
        self.w
    }

    fn height(&self) -> usize {
        self.h
    }

    fn save(&mut self) {
        self.stack.push(self.transform);
    }

    fn restore(&mut self) {
        if let Some(t) = self.stack.pop() {
            self.transform = t;
        }
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.transform = self.transform.translated(dx, dy);
    }

    fn rotate(&mut self, radians: f32) {
        if radians.is_finite() {
            self.transform = self.transform.rotated(radians);
        }
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, paint: &Paint) {
        let (x0, x1) = if w < 0.0 { (x + w, x) } else { (x, x + w) };
        let (y0, y1) = if h < 0.0 { (y + h, y) } else { (y, y + h) };
        if x1 - x0 <= 0.0 || y1 - y0 <= 0.0 {
            return;
        }
        self.fill_shape((x0, y0, x1, y1), paint, |ux, uy| {
            ux >= x0 && ux < x1 && uy >= y0 && uy < y1
        });
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, paint: &Paint) {
        if !(r > 0.0) {
            return;
        }
        let r2 = r * r;
        self.fill_shape((cx - r, cy - r, cx + r, cy + r), paint, |ux, uy| {
            (ux - cx) * (ux - cx) + (uy - cy) * (uy - cy) <= r2
        });
    }

    fn stroke_path(&mut self, path: &Path, color: Rgba, line_width: f32) {
        if path.is_empty() || !(line_width > 0.0) || color.a <= 0.0 {
            return;
        }
        let Some(inv) = self.transform.inverse() else {
            return;
        };
        let hw = line_width * 0.5;
        let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
        let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for (x, y) in path.points() {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        let Some(area) = self.span_for(min_x - hw, min_y - hw, max_x + hw, max_y + hw) else {
            return;
        };

        // Coverage mask so overlapping segments blend once per pixel.
        let aw = area.x1 - area.x0;
        let mut mask = vec![false; aw * (area.y1 - area.y0)];
        for sp in path.subpaths() {
            for seg in sp.windows(2) {
                let (ax, ay) = seg[0];
                let (bx, by) = seg[1];
                let Some(span) = self.span_for(
                    ax.min(bx) - hw,
                    ay.min(by) - hw,
                    ax.max(bx) + hw,
                    ay.max(by) + hw,
                ) else {
                    continue;
                };
                for py in span.y0.max(area.y0)..span.y1.min(area.y1) {
                    for px in span.x0.max(area.x0)..span.x1.min(area.x1) {
                        let (ux, uy) = inv.apply(px as f32 + 0.5, py as f32 + 0.5);
                        if segment_distance(ux, uy, ax, ay, bx, by) <= hw {
                            mask[(py - area.y0) * aw + (px - area.x0)] = true;
                        }
                    }
                }
            }
        }
        for (i, hit) in mask.iter().enumerate() {
            if *hit {
                self.blend(area.x0 + i % aw, area.y0 + i / aw, color);
            }
        }
    }

    fn put_image(&mut self, image: &ImageData) {
        let cols = image.width.min(self.w);
        let rows = image.height.min(self.h);
        if image.data.len() < image.width * image.height * 4 {
            return;
        }
        for y in 0..rows {
            let src = y * image.width * 4;
            let dst = y * self.w * 4;
            self.pixels[dst..dst + cols * 4].copy_from_slice(&image.data[src..src + cols * 4]);
        }
    }
}

fn segment_distance(px: f32, py: f32, ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let (dx, dy) = (bx - ax, by - ay);
    let len2 = dx * dx + dy * dy;
    let t = if len2 <= f32::EPSILON {
        0.0
    } else {
        (((px - ax) * dx + (py - ay) * dy) / len2).clamp(0.0, 1.0)
    };
    let (cx, cy) = (ax + dx * t, ay + dy * t);
    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}
