//! Seeded sampling primitives shared by every generator. All randomness is
//! owned by an explicit `Sampler` passed down the call tree; there is no
//! ambient RNG state, which keeps parallel corpus builds reproducible.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::{Beta, LogNormal, Normal, Poisson};
use uuid::Uuid;

/// Splitmix-style spread so per-project streams derived from one corpus
/// seed are decorrelated regardless of worker scheduling.
const STREAM_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

pub struct Sampler {
    rng: StdRng,
}

impl Sampler {
    pub fn from_seed(seed: u64) -> Self {
        Sampler {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Independent stream for project `index` within a corpus run.
    pub fn for_project(corpus_seed: u64, index: u64) -> Self {
        let mut spread = corpus_seed ^ index.wrapping_add(1).wrapping_mul(STREAM_GAMMA);
        spread ^= spread >> 31;
        Sampler::from_seed(spread)
    }

    pub fn chance(&mut self, probability: f64) -> bool {
        self.rng.gen_bool(probability.clamp(0.0, 1.0))
    }

    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..high)
    }

    /// Integer draw over `low..high` (exclusive upper bound). Degenerate
    /// ranges collapse to `low`.
    pub fn int_between(&mut self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..high)
    }

    /// Index draw from explicit weights. Invalid weight vectors fall back
    /// to a uniform pick rather than failing the run.
    pub fn weighted(&mut self, weights: &[f64]) -> usize {
        if weights.is_empty() {
            return 0;
        }
        match WeightedIndex::new(weights) {
            Ok(dist) => dist.sample(&mut self.rng),
            Err(_) => self.rng.gen_range(0..weights.len()),
        }
    }

    pub fn poisson(&mut self, mean: f64) -> u64 {
        if mean <= 0.0 {
            return 0;
        }
        match Poisson::new(mean) {
            Ok(dist) => {
                let draw: f64 = dist.sample(&mut self.rng);
                draw as u64
            }
            Err(_) => 0,
        }
    }

    pub fn lognormal(&mut self, location: f64, scale: f64) -> f64 {
        if scale <= 0.0 {
            return location.exp();
        }
        match LogNormal::new(location, scale) {
            Ok(dist) => dist.sample(&mut self.rng),
            Err(_) => location.exp(),
        }
    }

    pub fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        if std_dev <= 0.0 {
            return mean;
        }
        match Normal::new(mean, std_dev) {
            Ok(dist) => dist.sample(&mut self.rng),
            Err(_) => mean,
        }
    }

    pub fn beta(&mut self, shape_a: f64, shape_b: f64) -> f64 {
        match Beta::new(shape_a, shape_b) {
            Ok(dist) => dist.sample(&mut self.rng),
            Err(_) => 0.5,
        }
    }

    /// Identifier drawn from the stream, so synthesized ids replay under a
    /// fixed seed.
    pub fn uuid(&mut self) -> Uuid {
        Uuid::from_u64_pair(self.rng.gen(), self.rng.gen())
    }

    /// Up to `count` distinct indices into a collection of `len` items.
    pub fn distinct_indices(&mut self, len: usize, count: usize) -> Vec<usize> {
        let amount = count.min(len);
        rand::seq::index::sample(&mut self.rng, len, amount).into_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_replays_the_same_stream() {
        let mut a = Sampler::from_seed(42);
        let mut b = Sampler::from_seed(42);
        for _ in 0..32 {
            assert_eq!(a.uniform(0.0, 1.0), b.uniform(0.0, 1.0));
            assert_eq!(a.poisson(4.0), b.poisson(4.0));
            assert_eq!(a.int_between(0, 100), b.int_between(0, 100));
        }
    }

    #[test]
    fn project_streams_are_decorrelated() {
        let mut a = Sampler::for_project(42, 0);
        let mut b = Sampler::for_project(42, 1);
        let draws_a: Vec<f64> = (0..8).map(|_| a.uniform(0.0, 1.0)).collect();
        let draws_b: Vec<f64> = (0..8).map(|_| b.uniform(0.0, 1.0)).collect();
        assert_ne!(draws_a, draws_b);
    }

    #[test]
    fn degenerate_parameters_fall_back() {
        let mut sampler = Sampler::from_seed(7);
        assert_eq!(sampler.poisson(0.0), 0);
        assert_eq!(sampler.poisson(-3.0), 0);
        assert_eq!(sampler.uniform(5.0, 5.0), 5.0);
        assert_eq!(sampler.int_between(10, 10), 10);
        assert_eq!(sampler.normal(2.5, 0.0), 2.5);
        assert_eq!(sampler.lognormal(1.0, 0.0), 1.0_f64.exp());
    }

    #[test]
    fn chance_is_exact_at_the_ends() {
        let mut sampler = Sampler::from_seed(7);
        for _ in 0..64 {
            assert!(!sampler.chance(0.0));
            assert!(sampler.chance(1.0));
        }
    }

    #[test]
    fn weighted_respects_degenerate_weights() {
        let mut sampler = Sampler::from_seed(7);
        for _ in 0..32 {
            assert_eq!(sampler.weighted(&[1.0]), 0);
            assert_eq!(sampler.weighted(&[0.0, 1.0]), 1);
        }
    }

    #[test]
    fn distinct_indices_never_repeat_or_overrun() {
        let mut sampler = Sampler::from_seed(7);
        let picks = sampler.distinct_indices(10, 25);
        assert_eq!(picks.len(), 10);
        let mut sorted = picks.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), picks.len());

        let picks = sampler.distinct_indices(10, 4);
        assert_eq!(picks.len(), 4);
        assert!(picks.iter().all(|&i| i < 10));
    }

    #[test]
    fn uuids_replay_under_a_seed() {
        let mut a = Sampler::from_seed(11);
        let mut b = Sampler::from_seed(11);
        assert_eq!(a.uuid(), b.uuid());
    }

    #[test]
    fn beta_stays_in_unit_interval() {
        let mut sampler = Sampler::from_seed(7);
        for _ in 0..256 {
            let draw = sampler.beta(2.0, 1.0);
            assert!((0.0..=1.0).contains(&draw));
        }
    }
}
