//! Toy event generator: straight tracks from a common primary vertex through
//! a stack of planar modules.
//!
//! The random source is an explicit field of the generator. Seed it
//! ([`SimpleGenerator::with_seed`]) for reproducible events.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Result, TrackError};
use crate::event_model::{Event, Hit, HitId, MCInfo, Module, ModuleId, Track, TrackId};

/// Module layout as parallel columns, one entry per module in detector order.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleDetectorGeometry {
    module_id: Vec<ModuleId>,
    lx: Vec<f64>,
    ly: Vec<f64>,
    z: Vec<f64>,
}

impl SimpleDetectorGeometry {
    pub fn new(module_id: Vec<usize>, lx: Vec<f64>, ly: Vec<f64>, z: Vec<f64>) -> Result<Self> {
        let lengths = [module_id.len(), lx.len(), ly.len(), z.len()];
        if lengths.iter().any(|&l| l != lengths[0]) {
            return Err(TrackError::GeometryMismatch { lengths });
        }
        Ok(Self {
            module_id: module_id.into_iter().map(ModuleId).collect(),
            lx,
            ly,
            z,
        })
    }

    /// `n` identical modules of size `lx × ly` at z = `z0`, `z0 + pitch`, ...
    pub fn uniform(n: usize, lx: f64, ly: f64, z0: f64, pitch: f64) -> Self {
        Self {
            module_id: (0..n).map(ModuleId).collect(),
            lx: vec![lx; n],
            ly: vec![ly; n],
            z: (0..n).map(|i| z0 + pitch * i as f64).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.module_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.module_id.is_empty()
    }

    /// `(module_id, lx, ly, z)` of module `index`.
    pub fn get(&self, index: usize) -> Option<(ModuleId, f64, f64, f64)> {
        Some((
            *self.module_id.get(index)?,
            self.lx[index],
            self.ly[index],
            self.z[index],
        ))
    }

    fn iter(&self) -> impl Iterator<Item = (ModuleId, f64, f64, f64)> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }
}

/// Generates events of straight particle tracks with uniform phi and
/// uniform cos(theta).
#[derive(Debug, Clone)]
pub struct SimpleGenerator<R: Rng = StdRng> {
    pub detector_geometry: SimpleDetectorGeometry,
    pub phi_min: f64,
    pub phi_max: f64,
    pub theta_min: f64,
    pub theta_max: f64,
    pub primary_vertex: (f64, f64, f64),
    rng: R,
}

impl SimpleGenerator<StdRng> {
    pub fn with_seed(detector_geometry: SimpleDetectorGeometry, seed: u64) -> Self {
        Self::new(detector_geometry, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> SimpleGenerator<R> {
    /// Generator with the default angular ranges: phi in [0, 2π),
    /// theta in [0, π/10], vertex at the origin.
    pub fn new(detector_geometry: SimpleDetectorGeometry, rng: R) -> Self {
        Self {
            detector_geometry,
            phi_min: 0.0,
            phi_max: 2.0 * PI,
            theta_min: 0.0,
            theta_max: PI / 10.0,
            primary_vertex: (0.0, 0.0, 0.0),
            rng,
        }
    }

    pub fn phi_range(mut self, phi_min: f64, phi_max: f64) -> Self {
        self.phi_min = phi_min;
        self.phi_max = phi_max;
        self
    }

    pub fn theta_range(mut self, theta_min: f64, theta_max: f64) -> Self {
        self.theta_min = theta_min;
        self.theta_max = theta_max;
        self
    }

    pub fn primary_vertex(mut self, vertex: (f64, f64, f64)) -> Self {
        self.primary_vertex = vertex;
        self
    }

    /// Uniform draw on [low, high). `gen_range` panics on an empty range, so
    /// a degenerate one (θ fixed, say) returns `low` without drawing.
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if low < high {
            self.rng.gen_range(low..high)
        } else {
            low
        }
    }

    pub fn generate_event(&mut self, n_particles: usize) -> Event {
        let geometry = self.detector_geometry.clone();
        let (pvx, pvy, pvz) = self.primary_vertex;

        let mut hits_per_module: Vec<Vec<Hit>> = vec![Vec::new(); geometry.len()];
        let mut tracks = Vec::with_capacity(n_particles);
        let mut next_hit_id = 0usize;

        for track_id in (0..n_particles).map(TrackId) {
            let phi = self.uniform(self.phi_min, self.phi_max);
            let cos_theta = self.uniform(self.theta_max.cos(), self.theta_min.cos());
            let theta = cos_theta.acos();
            let sin_theta = theta.sin();

            let vx = sin_theta * phi.cos();
            let vy = sin_theta * phi.sin();
            let vz = cos_theta;

            let mut track_hits = Vec::new();
            for (idx, (module_id, lx, ly, zm)) in geometry.iter().enumerate() {
                let t = (zm - pvz) / vz;
                let x_hit = pvx + vx * t;
                let y_hit = pvy + vy * t;

                if x_hit.abs() < lx / 2.0 && y_hit.abs() < ly / 2.0 {
                    let hit = Hit {
                        hit_id: HitId(next_hit_id),
                        x: x_hit,
                        y: y_hit,
                        z: zm,
                        module_id,
                        track_id,
                    };
                    next_hit_id += 1;
                    hits_per_module[idx].push(hit);
                    track_hits.push(hit);
                }
            }

            tracks.push(Track {
                track_id,
                mc_info: MCInfo {
                    primary_vertex: self.primary_vertex,
                    phi,
                    theta,
                },
                hits: track_hits,
            });
        }

        let hits: Vec<Hit> = hits_per_module.iter().flatten().copied().collect();
        let modules = geometry
            .iter()
            .zip(hits_per_module)
            .map(|((module_id, lx, ly, z), hits)| Module {
                module_id,
                z,
                lx,
                ly,
                hits,
            })
            .collect();

        log::debug!(
            "generated event: {} particles, {} hits on {} modules",
            n_particles,
            hits.len(),
            geometry.len()
        );

        Event {
            modules,
            tracks,
            hits,
        }
    }

    /// Several independent events drawn from the same random stream.
    pub fn generate_events(&mut self, n_events: usize, n_particles: usize) -> Vec<Event> {
        (0..n_events).map(|_| self.generate_event(n_particles)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_simple_detector(n_modules: usize) -> SimpleDetectorGeometry {
        SimpleDetectorGeometry::uniform(n_modules, 10.0, 10.0, 0.0, 10.0)
    }

    #[test]
    fn geometry_rejects_ragged_columns() {
        let err = SimpleDetectorGeometry::new(vec![0, 1], vec![1.0], vec![1.0, 1.0], vec![0.0, 1.0])
            .unwrap_err();
        assert_eq!(err, TrackError::GeometryMismatch { lengths: [2, 1, 2, 2] });
    }

    #[test]
    fn large_geometry_builds() {
        let detector = build_simple_detector(100);
        assert_eq!(detector.len(), 100);
        assert_eq!(detector.get(99), Some((ModuleId(99), 10.0, 10.0, 990.0)));
        assert_eq!(detector.get(100), None);
    }

    #[test]
    fn consecutive_events_differ() {
        let mut generator = SimpleGenerator::with_seed(build_simple_detector(10), 1);
        let ev1 = generator.generate_event(10);
        let ev2 = generator.generate_event(10);
        assert_ne!(ev1, ev2);
    }

    #[test]
    fn same_seed_same_event() {
        let ev1 = SimpleGenerator::with_seed(build_simple_detector(5), 42).generate_event(8);
        let ev2 = SimpleGenerator::with_seed(build_simple_detector(5), 42).generate_event(8);
        assert_eq!(ev1, ev2);
    }

    #[test]
    fn hits_lie_on_their_module_plane_and_inside_acceptance() {
        let mut generator = SimpleGenerator::with_seed(build_simple_detector(10), 3);
        let event = generator.generate_event(20);
        for module in &event.modules {
            for hit in &module.hits {
                assert_eq!(hit.z, module.z);
                assert_eq!(hit.module_id, module.module_id);
                assert!(hit.x.abs() < module.lx / 2.0);
                assert!(hit.y.abs() < module.ly / 2.0);
            }
        }
        let per_module: usize = event.modules.iter().map(|m| m.hits.len()).sum();
        let per_track: usize = event.tracks.iter().map(|t| t.hits.len()).sum();
        assert_eq!(per_module, event.hits.len());
        assert_eq!(per_track, event.hits.len());
    }

    #[test]
    fn wide_detector_catches_every_track_on_every_module() {
        let geometry = SimpleDetectorGeometry::uniform(4, 10_000.0, 10_000.0, 1.0, 1.0);
        let mut generator = SimpleGenerator::with_seed(geometry, 0).theta_range(0.0, PI / 3.0);
        let event = generator.generate_event(6);
        assert_eq!(event.hits.len(), 24);
        for track in &event.tracks {
            assert_eq!(track.hits.len(), 4);
            assert!(track.mc_info.theta <= PI / 3.0 + 1e-12);
        }
        let ids: Vec<usize> = event.hits.iter().map(|h| h.hit_id.0).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), ids.len(), "hit ids must be unique");
    }

    #[test]
    fn fixed_angles_give_identical_tracks() {
        let mut generator = SimpleGenerator::with_seed(build_simple_detector(4), 5)
            .theta_range(0.0, 0.0)
            .phi_range(1.0, 1.0);
        let event = generator.generate_event(3);
        for track in &event.tracks {
            assert_eq!(track.mc_info.phi, 1.0);
            assert_eq!(track.mc_info.theta, 0.0);
            assert_eq!(track.hits.len(), 4);
            assert!(track.hits.iter().all(|h| h.x == 0.0 && h.y == 0.0));
        }
    }

    #[test]
    fn drawn_angles_stay_in_range() {
        let mut generator = SimpleGenerator::with_seed(build_simple_detector(2), 17)
            .theta_range(0.1, 0.2)
            .phi_range(0.5, 1.5);
        for track in generator.generate_event(50).tracks {
            assert!((0.5..1.5).contains(&track.mc_info.phi));
            assert!(track.mc_info.theta >= 0.1 - 1e-12 && track.mc_info.theta <= 0.2 + 1e-12);
        }
    }

    #[test]
    fn generate_events_returns_requested_count() {
        let mut generator = SimpleGenerator::with_seed(build_simple_detector(3), 9);
        let events = generator.generate_events(4, 5);
        assert_eq!(events.len(), 4);
        assert!(events.iter().all(|e| e.tracks.len() == 5));
    }
}
