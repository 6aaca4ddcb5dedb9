//! Seeded per-id random values
//!
//! A particle re-derives its jitter from its id instead of storing it, so the
//! same id always yields the same value.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Uniform value in `[min, max)` derived from `seed`
///
/// `min == max` returns exactly `min`. A reversed range interpolates
/// backwards instead of failing.
pub fn random_seed(seed: u64, min: f32, max: f32) -> f32 {
    let t: f32 = Pcg32::seed_from_u64(seed).random();
    min + (max - min) * t
}

/// Uniform value in `[0, max)` derived from `seed`
#[inline]
pub fn random_seed_max(seed: u64, max: f32) -> f32 {
    random_seed(seed, 0.0, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_value() {
        assert_eq!(random_seed(77, 10.0, 20.0), random_seed(77, 10.0, 20.0));
        assert_ne!(random_seed(77, 10.0, 20.0), random_seed(78, 10.0, 20.0));
    }

    #[test]
    fn test_range() {
        for seed in 0..200 {
            let v = random_seed(seed, 120.0, 480.0);
            assert!((120.0..480.0).contains(&v));
        }
    }

    #[test]
    fn test_point_range_is_exact() {
        assert_eq!(random_seed(5, 64.0, 64.0), 64.0);
    }

    #[test]
    fn test_reversed_range_does_not_panic() {
        let v = random_seed(9, 10.0, 0.0);
        assert!(v > 0.0 && v <= 10.0);
    }
}
