use crate::analyser::AnalysisFrame;
use crate::surface::{Paint, Rgba, Surface};
use crate::visual::Visualizer;
use crate::visual::particles::OrbitStore;

/// 0.3 fill alpha under a 0.3 global alpha.
const TRAIL_FADE: f32 = 0.3 * 0.3;

pub struct Orbits {
    store: OrbitStore,
}

impl Orbits {
    pub fn new(store: OrbitStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &OrbitStore {
        &self.store
    }

    /// Advances every particle one tick. Angles move by their own speed
    /// whatever the audio does.
    pub fn step(&mut self) {
        for p in self.store.particles_mut() {
            p.angle += p.speed;
        }
    }
}

impl Visualizer for Orbits {
    fn name(&self) -> &'static str {
        "orbits"
    }

    fn render(&mut self, frame: &AnalysisFrame, surface: &mut dyn Surface, _time_ms: f64) {
        let cx = surface.width() as f32 / 2.0;
        let cy = surface.height() as f32 / 2.0;
        surface.fill_all(&Paint::Solid(Rgba::new(0, 0, 0, TRAIL_FADE)));

        self.step();
        for p in self.store.particles() {
            let intensity = frame.bin(p.band) as f32 / 255.0;
            let r = p.radius + intensity * 100.0;
            let (x, y) = (cx + r * p.angle.cos(), cy + r * p.angle.sin());
            let color = Rgba::hsl(p.hue, 100.0, 40.0 + intensity * 60.0);
            surface.fill_circle(x, y, p.size + intensity * 2.0, &Paint::Solid(color));
        }
    }
}
