use crate::analyser::AnalysisFrame;
use crate::surface::{Paint, Path, RadialGradient, Rgba, Surface};
use crate::visual::Visualizer;
use crate::visual::particles::SatelliteStore;
use std::f32::consts::TAU;

pub const SYMMETRY: usize = 8;
const TRAIL_FADE: f32 = 0.08;
const DUST_TRIES: usize = 100;
const FLASH_BASS: f32 = 180.0;

/// Spectrum summary driving one kaleidoscope frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub bass: f32,
    pub treble: f32,
    pub energy: f32,
}

impl Bands {
    pub fn of(frame: &AnalysisFrame) -> Self {
        Self { bass: frame.bass(), treble: frame.treble(), energy: frame.energy() }
    }

    pub fn spike_count(&self) -> usize {
        5 + (self.treble / 32.0).floor().max(0.0) as usize
    }
}

pub struct Kaleidoscope {
    satellites: SatelliteStore,
    rng: fastrand::Rng,
}

impl Kaleidoscope {
    pub fn new(satellites: SatelliteStore, rng: fastrand::Rng) -> Self {
        Self { satellites, rng }
    }

    pub fn satellites(&self) -> &SatelliteStore {
        &self.satellites
    }

    /// Scatters faint pixels; each try lands with probability treble/255.
    fn dust(&mut self, surface: &mut dyn Surface, treble: f32) {
        let (w, h) = (surface.width() as f32, surface.height() as f32);
        let p = treble / 255.0;
        for _ in 0..DUST_TRIES {
            if self.rng.f32() < p {
                let x = self.rng.f32() * w;
                let y = self.rng.f32() * h;
                let a = self.rng.f32();
                surface.fill_rect(x, y, 1.5, 1.5, &Paint::Solid(Rgba::new(255, 255, 255, a)));
            }
        }
    }
}

impl Visualizer for Kaleidoscope {
    fn name(&self) -> &'static str {
        "kaleidoscope"
    }

    fn render(&mut self, frame: &AnalysisFrame, surface: &mut dyn Surface, time_ms: f64) {
        let (w, h) = (surface.width() as f32, surface.height() as f32);
        let t = (time_ms * 0.001) as f32;
        let angle_step = TAU / SYMMETRY as f32;
        let bands = Bands::of(frame);
        let Bands { bass, treble, energy } = bands;

        surface.fill_all(&Paint::Solid(Rgba::new(0, 0, 0, TRAIL_FADE)));

        surface.save();
        surface.translate(w / 2.0, h / 2.0);
        surface.rotate((t * 0.6).sin() * 2.0 + energy * 0.05);

        let spikes = bands.spike_count();
        let flash_hue = time_ms.rem_euclid(360.0) as f32;
        for s in 0..SYMMETRY {
            surface.save();
            surface.rotate(s as f32 * angle_step);

            self.dust(surface, treble);

            for i in 0..spikes {
                let angle = i as f32 * 0.3 + t * 0.2;
                let radius = 80.0 + (t + i as f32).sin() * 50.0 + bass * 1.5;
                let (x, y) = (angle.cos() * radius, angle.sin() * radius);
                let hue = (angle.to_degrees() + t * 60.0).rem_euclid(360.0);

                let mut spike = Path::new();
                spike.move_to(0.0, 0.0);
                spike.line_to(x, y);
                surface.stroke_path(&spike, Rgba::hsl(hue, 100.0, 60.0), 2.0 + treble * 0.01);

                let tip = Rgba::hsl((hue + 180.0) % 360.0, 100.0, 50.0);
                surface.fill_circle(x, y, 5.0 + energy * 0.5, &Paint::Solid(tip));

                if bass > FLASH_BASS {
                    let flash = Rgba::hsla(flash_hue, 100.0, 50.0, 0.07);
                    surface.fill_rect(0.0, 0.0, w, h, &Paint::Solid(flash));
                }

                for sat in self.satellites.cluster_mut(s * spikes + i) {
                    sat.angle += sat.speed;
                    let px = x + sat.angle.cos() * sat.radius;
                    let py = y + sat.angle.sin() * sat.radius;
                    let c = Rgba::hsla((hue + 60.0 + sat.offset) % 360.0, 100.0, 60.0, 0.8);
                    surface.fill_circle(px, py, 2.0 + energy * 0.2, &Paint::Solid(c));
                }
            }

            surface.restore();
        }

        let core_r = 50.0 + bass;
        let core = RadialGradient::new(0.0, 0.0, 0.0, core_r)
            .add_stop(0.0, Rgba::new(255, 255, 255, (0.2 + bass / 255.0).min(1.0)))
            .add_stop(1.0, Rgba::new(255, 255, 255, 0.0));
        surface.fill_circle(0.0, 0.0, core_r, &Paint::Radial(core));

        surface.restore();
    }
}
