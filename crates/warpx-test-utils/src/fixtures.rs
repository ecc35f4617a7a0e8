//! Deterministic particle data for injection tests.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Columns for one injection, generated from a seed.
///
/// Positions lie in `[0, 1)`, momenta in `[-1, 1)` and weights in
/// `[0.5, 1.5)`. `weights` doubles as a one-column attribute table.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomParticles {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub ux: Vec<f64>,
    pub uy: Vec<f64>,
    pub uz: Vec<f64>,
    pub weights: Vec<f64>,
}

impl RandomParticles {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// `n` particles drawn from a ChaCha8 stream seeded with `seed`.
pub fn random_particles(seed: u64, n: usize) -> RandomParticles {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut column = |lo: f64, hi: f64| -> Vec<f64> {
        (0..n).map(|_| rng.random_range(lo..hi)).collect()
    };
    RandomParticles {
        x: column(0.0, 1.0),
        y: column(0.0, 1.0),
        z: column(0.0, 1.0),
        ux: column(-1.0, 1.0),
        uy: column(-1.0, 1.0),
        uz: column(-1.0, 1.0),
        weights: column(0.5, 1.5),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_particles() {
        assert_eq!(random_particles(3, 16), random_particles(3, 16));
        assert_ne!(random_particles(3, 16), random_particles(4, 16));
    }

    #[test]
    fn ranges_hold() {
        let p = random_particles(11, 64);
        assert_eq!(p.len(), 64);
        assert!(p.x.iter().all(|v| (0.0..1.0).contains(v)));
        assert!(p.uz.iter().all(|v| (-1.0..1.0).contains(v)));
        assert!(p.weights.iter().all(|v| (0.5..1.5).contains(v)));
    }
}
