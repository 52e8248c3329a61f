mod raster;

pub use raster::{Raster, Transform};

/// 8-bit colour with a straight (non-premultiplied) alpha in 0..=1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Self = Self::new(0, 0, 0, 1.0);
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0.0);

    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Like CSS `rgb()`: out-of-range channels clamp instead of wrapping.
    pub fn rgb(r: i32, g: i32, b: i32) -> Self {
        Self::new(clamp_channel(r), clamp_channel(g), clamp_channel(b), 1.0)
    }

    pub fn hsl(h: f32, s_pct: f32, l_pct: f32) -> Self {
        Self::hsla(h, s_pct, l_pct, 1.0)
    }

    /// CSS `hsla()`: hue in degrees (any value, wrapped), saturation and
    /// lightness in percent.
    pub fn hsla(h: f32, s_pct: f32, l_pct: f32, a: f32) -> Self {
        let h = if h.is_finite() { h.rem_euclid(360.0) / 360.0 } else { 0.0 };
        let s = finite_or_zero(s_pct / 100.0).clamp(0.0, 1.0);
        let l = finite_or_zero(l_pct / 100.0).clamp(0.0, 1.0);
        let [r, g, b] = hsl_to_rgb(h, s, l);
        Self::new(r, g, b, finite_or_zero(a).clamp(0.0, 1.0))
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a: finite_or_zero(a).clamp(0.0, 1.0), ..self }
    }

    fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            self.a + (other.a - self.a) * t,
        )
    }
}

fn clamp_channel(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [u8; 3] {
    if s <= 0.0 {
        let v = (l * 255.0).round() as u8;
        return [v, v, v];
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let channel = |mut t: f32| {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        let v = if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        };
        (v.clamp(0.0, 1.0) * 255.0).round() as u8
    };
    [channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0)]
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Rgba,
}

fn sample_stops(stops: &[ColorStop], t: f32) -> Rgba {
    let Some(first) = stops.first() else {
        return Rgba::TRANSPARENT;
    };
    if t <= first.offset {
        return first.color;
    }
    for pair in stops.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if t <= b.offset {
            let span = b.offset - a.offset;
            if span <= f32::EPSILON {
                return b.color;
            }
            return a.color.lerp(b.color, (t - a.offset) / span);
        }
    }
    stops[stops.len() - 1].color
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradient {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    pub stops: Vec<ColorStop>,
}

impl LinearGradient {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1, stops: Vec::new() }
    }

    pub fn add_stop(mut self, offset: f32, color: Rgba) -> Self {
        push_stop(&mut self.stops, offset, color);
        self
    }

    pub fn color_at(&self, x: f32, y: f32) -> Rgba {
        let dx = self.x1 - self.x0;
        let dy = self.y1 - self.y0;
        let len2 = dx * dx + dy * dy;
        if len2 <= f32::EPSILON {
            return Rgba::TRANSPARENT;
        }
        let t = ((x - self.x0) * dx + (y - self.y0) * dy) / len2;
        sample_stops(&self.stops, t.clamp(0.0, 1.0))
    }
}

/// Concentric radial gradient between `r0` and `r1` around (`cx`, `cy`).
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGradient {
    pub cx: f32,
    pub cy: f32,
    pub r0: f32,
    pub r1: f32,
    pub stops: Vec<ColorStop>,
}

impl RadialGradient {
    pub fn new(cx: f32, cy: f32, r0: f32, r1: f32) -> Self {
        Self { cx, cy, r0, r1, stops: Vec::new() }
    }

    pub fn add_stop(mut self, offset: f32, color: Rgba) -> Self {
        push_stop(&mut self.stops, offset, color);
        self
    }

    pub fn color_at(&self, x: f32, y: f32) -> Rgba {
        let span = self.r1 - self.r0;
        if span <= f32::EPSILON {
            return Rgba::TRANSPARENT;
        }
        let d = ((x - self.cx).powi(2) + (y - self.cy).powi(2)).sqrt();
        sample_stops(&self.stops, ((d - self.r0) / span).clamp(0.0, 1.0))
    }
}

fn push_stop(stops: &mut Vec<ColorStop>, offset: f32, color: Rgba) {
    let offset = finite_or_zero(offset).clamp(0.0, 1.0);
    let at = stops.partition_point(|s| s.offset <= offset);
    stops.insert(at, ColorStop { offset, color });
}

#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Rgba),
    Linear(LinearGradient),
    Radial(RadialGradient),
}

impl Paint {
    pub fn color_at(&self, x: f32, y: f32) -> Rgba {
        match self {
            Self::Solid(c) => *c,
            Self::Linear(g) => g.color_at(x, y),
            Self::Radial(g) => g.color_at(x, y),
        }
    }
}

impl From<Rgba> for Paint {
    fn from(c: Rgba) -> Self {
        Self::Solid(c)
    }
}

/// A set of open polylines built with `move_to`/`line_to`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    subpaths: Vec<Vec<(f32, f32)>>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.subpaths.push(vec![(x, y)]);
    }

    /// Starts a subpath at the point when none is open.
    pub fn line_to(&mut self, x: f32, y: f32) {
        match self.subpaths.last_mut() {
            Some(sp) => sp.push((x, y)),
            None => self.move_to(x, y),
        }
    }

    pub fn subpaths(&self) -> &[Vec<(f32, f32)>] {
        &self.subpaths
    }

    pub fn points(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.subpaths.iter().flatten().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.subpaths.iter().all(|sp| sp.is_empty())
    }
}

/// An RGBA8 pixel block copied verbatim by [`Surface::put_image`].
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl ImageData {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, data: vec![0; width.saturating_mul(height).saturating_mul(4)] }
    }

    /// Resizes in place, keeping the allocation when the size is unchanged.
    pub fn ensure_size(&mut self, width: usize, height: usize) {
        if self.width != width || self.height != height {
            *self = Self::new(width, height);
        }
    }
}

/// A 2D raster target. Coordinates are in user space (after the current
/// transform) except for `put_image`, which always lands at the origin.
pub trait Surface {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, dx: f32, dy: f32);
    fn rotate(&mut self, radians: f32);
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, paint: &Paint);
    fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, paint: &Paint);
    fn stroke_path(&mut self, path: &Path, color: Rgba, line_width: f32);
    fn put_image(&mut self, image: &ImageData);

    fn fill_all(&mut self, paint: &Paint) {
        let (w, h) = (self.width() as f32, self.height() as f32);
        self.fill_rect(0.0, 0.0, w, h, paint);
    }
}
