//! Pre-seeded particle stores. Each is sized once and never resized; the
//! owning visualizer mutates particles in place every tick.

use std::f32::consts::TAU;

pub const ORBIT_COUNT: usize = 100;
pub const NEBULA_COUNT: usize = 250;
pub const CLUSTER_COUNT: usize = 60;
pub const SATELLITES_PER_CLUSTER: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitParticle {
    pub angle: f32,
    pub radius: f32,
    pub speed: f32,
    pub size: f32,
    pub hue: f32,
    pub band: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NebulaParticle {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub speed: f32,
    pub angle: f32,
    pub hue: f32,
    pub band: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Satellite {
    pub angle: f32,
    pub radius: f32,
    pub speed: f32,
    /// Hue offset in degrees.
    pub offset: f32,
}

pub type SatelliteCluster = [Satellite; SATELLITES_PER_CLUSTER];

fn range(rng: &mut fastrand::Rng, lo: f32, span: f32) -> f32 {
    lo + rng.f32() * span
}

fn band(rng: &mut fastrand::Rng, bins: usize) -> usize {
    rng.usize(..bins.max(1))
}

pub struct OrbitStore {
    particles: Vec<OrbitParticle>,
}

impl OrbitStore {
    pub fn seed(rng: &mut fastrand::Rng, bins: usize) -> Self {
        let particles = (0..ORBIT_COUNT)
            .map(|_| OrbitParticle {
                angle: range(rng, 0.0, TAU),
                radius: range(rng, 50.0, 150.0),
                speed: range(rng, 0.002, 0.01),
                size: range(rng, 2.0, 3.0),
                hue: rng.u32(..360) as f32,
                band: band(rng, bins),
            })
            .collect();
        Self { particles }
    }

    pub fn particles(&self) -> &[OrbitParticle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [OrbitParticle] {
        &mut self.particles
    }
}

pub struct NebulaStore {
    particles: Vec<NebulaParticle>,
}

impl NebulaStore {
    /// Positions are spread over the canvas size known at startup.
    pub fn seed(rng: &mut fastrand::Rng, bins: usize, w: f32, h: f32) -> Self {
        let particles = (0..NEBULA_COUNT)
            .map(|_| NebulaParticle {
                x: rng.f32() * w.max(0.0),
                y: rng.f32() * h.max(0.0),
                radius: range(rng, 20.0, 40.0),
                speed: range(rng, 0.5, 1.5),
                angle: range(rng, 0.0, TAU),
                hue: range(rng, 200.0, 80.0),
                band: band(rng, bins),
            })
            .collect();
        Self { particles }
    }

    pub fn particles(&self) -> &[NebulaParticle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [NebulaParticle] {
        &mut self.particles
    }
}

pub struct SatelliteStore {
    clusters: Vec<SatelliteCluster>,
}

impl SatelliteStore {
    pub fn seed(rng: &mut fastrand::Rng) -> Self {
        let clusters = (0..CLUSTER_COUNT)
            .map(|_| {
                std::array::from_fn(|_| Satellite {
                    angle: range(rng, 0.0, TAU),
                    radius: range(rng, 6.0, 12.0),
                    speed: range(rng, 0.02, 0.05),
                    offset: range(rng, 0.0, 60.0),
                })
            })
            .collect();
        Self { clusters }
    }

    pub fn clusters(&self) -> &[SatelliteCluster] {
        &self.clusters
    }

    /// Cluster for a rotating lookup index (wraps).
    pub fn cluster_mut(&mut self, index: usize) -> &mut SatelliteCluster {
        let n = self.clusters.len();
        &mut self.clusters[index % n]
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}
