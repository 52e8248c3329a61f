mod classic;
mod kaleidoscope;
mod mandelbrot;
mod nebula;
mod orbits;
pub mod particles;

use crate::analyser::AnalysisFrame;
use crate::surface::Surface;
use std::fmt;
use std::str::FromStr;

pub use classic::{Bars, PixelGrid, Spiral, Waveform};
pub use kaleidoscope::Kaleidoscope;
pub use mandelbrot::{
    FractalView, INITIAL_ZOOM, Mandelbrot, escape_time, in_main_bulbs, max_iterations, pixel_color,
};
pub use nebula::Nebula;
pub use orbits::Orbits;
pub use particles::{NebulaStore, OrbitStore, SatelliteStore};

/// A render routine. `time_ms` is the session clock; nothing reads a global
/// clock, so a fixed time gives a fixed picture.
pub trait Visualizer {
    fn name(&self) -> &'static str;
    fn render(&mut self, frame: &AnalysisFrame, surface: &mut dyn Surface, time_ms: f64);
}

/// The selectable modes, in menu order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Bars,
    Waveform,
    Spiral,
    PixelGrid,
    Orbits,
    Nebula,
    Kaleidoscope,
    Hybrid,
    Mandelbrot,
}

/// The concrete routines a mode can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Routine {
    Bars,
    Waveform,
    Spiral,
    PixelGrid,
    Orbits,
    Nebula,
    Kaleidoscope,
    Mandelbrot,
}

impl Mode {
    pub const fn all() -> [Self; 9] {
        [
            Self::Bars,
            Self::Waveform,
            Self::Spiral,
            Self::PixelGrid,
            Self::Orbits,
            Self::Nebula,
            Self::Kaleidoscope,
            Self::Hybrid,
            Self::Mandelbrot,
        ]
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Bars => "bars",
            Self::Waveform => "waveform",
            Self::Spiral => "spiral",
            Self::PixelGrid => "pixelGrid",
            Self::Orbits => "orbits",
            Self::Nebula => "nebula",
            Self::Kaleidoscope => "kaleidoscope",
            Self::Hybrid => "hybrid",
            Self::Mandelbrot => "mandelbrot",
        }
    }

    /// Routines invoked for one tick, in order.
    pub fn routines(self) -> &'static [Routine] {
        match self {
            Self::Bars => &[Routine::Bars],
            Self::Waveform => &[Routine::Waveform],
            Self::Spiral => &[Routine::Spiral],
            Self::PixelGrid => &[Routine::PixelGrid],
            Self::Orbits => &[Routine::Orbits],
            Self::Nebula => &[Routine::Nebula],
            Self::Kaleidoscope => &[Routine::Kaleidoscope],
            Self::Hybrid => &[Routine::Nebula, Routine::Kaleidoscope],
            Self::Mandelbrot => &[Routine::Mandelbrot],
        }
    }

    pub fn next(self) -> Self {
        let all = Self::all();
        let idx = all.iter().position(|m| *m == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }

    pub fn prev(self) -> Self {
        let all = Self::all();
        let idx = all.iter().position(|m| *m == self).unwrap_or(0);
        all[(idx + all.len() - 1) % all.len()]
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownModeError(pub String);

impl fmt::Display for UnknownModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown visualizer mode: '{}'", self.0)
    }
}

impl std::error::Error for UnknownModeError {}

impl FromStr for Mode {
    type Err = UnknownModeError;

    /// Tags are exact (`pixelGrid` is camel-cased), matching the selector.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|m| m.tag() == s)
            .ok_or_else(|| UnknownModeError(s.to_string()))
    }
}

/// Owns one instance of every routine, each holding its injected store.
pub struct Stage {
    pub bars: Bars,
    pub waveform: Waveform,
    pub spiral: Spiral,
    pub pixel_grid: PixelGrid,
    pub orbits: Orbits,
    pub nebula: Nebula,
    pub kaleidoscope: Kaleidoscope,
    pub mandelbrot: Mandelbrot,
}

impl Stage {
    /// Seeds every store once for a canvas of `w`×`h` and `bins` frequency bins.
    pub fn seeded(rng: &mut fastrand::Rng, bins: usize, w: usize, h: usize, start_ms: f64) -> Self {
        let orbits = OrbitStore::seed(rng, bins);
        let nebula = NebulaStore::seed(rng, bins, w as f32, h as f32);
        let satellites = SatelliteStore::seed(rng);
        Self {
            bars: Bars,
            waveform: Waveform,
            spiral: Spiral,
            pixel_grid: PixelGrid,
            orbits: Orbits::new(orbits),
            nebula: Nebula::new(nebula),
            kaleidoscope: Kaleidoscope::new(satellites, fastrand::Rng::with_seed(rng.u64(..))),
            mandelbrot: Mandelbrot::new(FractalView::new(start_ms)),
        }
    }

    pub fn routine(&self, r: Routine) -> &dyn Visualizer {
        match r {
            Routine::Bars => &self.bars,
            Routine::Waveform => &self.waveform,
            Routine::Spiral => &self.spiral,
            Routine::PixelGrid => &self.pixel_grid,
            Routine::Orbits => &self.orbits,
            Routine::Nebula => &self.nebula,
            Routine::Kaleidoscope => &self.kaleidoscope,
            Routine::Mandelbrot => &self.mandelbrot,
        }
    }

    /// Names of the routines `mode` runs, in order.
    pub fn routine_names(&self, mode: Option<Mode>) -> Vec<&'static str> {
        mode.map(Mode::routines)
            .unwrap_or_default()
            .iter()
            .map(|r| self.routine(*r).name())
            .collect()
    }

    pub fn routine_mut(&mut self, r: Routine) -> &mut dyn Visualizer {
        match r {
            Routine::Bars => &mut self.bars,
            Routine::Waveform => &mut self.waveform,
            Routine::Spiral => &mut self.spiral,
            Routine::PixelGrid => &mut self.pixel_grid,
            Routine::Orbits => &mut self.orbits,
            Routine::Nebula => &mut self.nebula,
            Routine::Kaleidoscope => &mut self.kaleidoscope,
            Routine::Mandelbrot => &mut self.mandelbrot,
        }
    }

    /// Runs the routines for `mode`; `None` (an unrecognized tag) draws
    /// nothing. Returns what ran.
    pub fn dispatch(
        &mut self,
        mode: Option<Mode>,
        frame: &AnalysisFrame,
        surface: &mut dyn Surface,
        time_ms: f64,
    ) -> &'static [Routine] {
        let Some(mode) = mode else {
            return &[];
        };
        let routines = mode.routines();
        for r in routines {
            self.routine_mut(*r).render(frame, surface, time_ms);
        }
        routines
    }
}
