use crate::analyser::AnalysisFrame;
use crate::surface::{Paint, RadialGradient, Rgba, Surface};
use crate::visual::Visualizer;
use crate::visual::particles::{NebulaParticle, NebulaStore};
use std::f32::consts::TAU;

const TRAIL_FADE: f32 = 0.06;
const FLASH_BASS: f32 = 180.0;

pub struct Nebula {
    store: NebulaStore,
}

impl Nebula {
    pub fn new(store: NebulaStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &NebulaStore {
        &self.store
    }

    /// Moves one particle a tick: a time-keyed swirl bends its heading, then
    /// it advances by speed scaled with its band energy and wraps at the edges.
    pub fn advance(p: &mut NebulaParticle, energy: f32, time_ms: f64, w: f32, h: f32) {
        let swirl = ((time_ms * 0.001 + p.band as f64).sin() * 0.5) as f32;
        let speed_factor = 1.0 + energy * 4.0;
        p.angle += swirl * 0.01;

        p.x += p.angle.cos() * p.speed * speed_factor * 0.5;
        p.y += p.angle.sin() * p.speed * speed_factor * 0.5;

        if p.x < 0.0 {
            p.x = w;
        } else if p.x > w {
            p.x = 0.0;
        }
        if p.y < 0.0 {
            p.y = h;
        } else if p.y > h {
            p.y = 0.0;
        }
    }
}

impl Visualizer for Nebula {
    fn name(&self) -> &'static str {
        "nebula"
    }

    fn render(&mut self, frame: &AnalysisFrame, surface: &mut dyn Surface, time_ms: f64) {
        let (w, h) = (surface.width() as f32, surface.height() as f32);
        surface.fill_all(&Paint::Solid(Rgba::new(0, 0, 0, TRAIL_FADE)));

        let bass = frame.bass();
        let hue_drift = (time_ms * 0.05).rem_euclid(360.0) as f32;
        for p in self.store.particles_mut() {
            let energy = frame.bin(p.band) as f32 / 255.0;
            Self::advance(p, energy, time_ms, w, h);

            let hue = (p.hue + hue_drift + energy * 100.0) % 360.0;
            let radius = p.radius * (0.5 + energy * 1.8);
            let glow = RadialGradient::new(p.x, p.y, 0.0, radius)
                .add_stop(0.0, Rgba::hsla(hue, 100.0, 75.0, 0.3 + energy * 0.7))
                .add_stop(1.0, Rgba::hsla(hue, 100.0, 70.0, 0.0));
            surface.fill_circle(p.x, p.y, radius, &Paint::Radial(glow));
        }

        if bass > FLASH_BASS {
            surface.fill_all(&Paint::Solid(Rgba::new(255, 255, 255, 0.02)));
        }
    }
}
