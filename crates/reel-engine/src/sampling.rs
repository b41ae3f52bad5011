//! Random draws shared by the planners.
//!
//! Every draw of a run goes through one `StdRng`, so a seed fixes the plan.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Run RNG: seeded when a seed is configured, OS entropy otherwise.
pub fn run_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Uniform draw from `[lo, hi]`; collapses to `lo` when the range is empty.
pub fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    if hi > lo {
        rng.random_range(lo..=hi)
    } else {
        lo
    }
}

/// Remove and return `count` random elements of `pool`.
pub fn take_random<T, R: Rng + ?Sized>(pool: &mut Vec<T>, count: usize, rng: &mut R) -> Vec<T> {
    let count = count.min(pool.len());
    let mut taken = Vec::with_capacity(count);
    for _ in 0..count {
        let index = rng.random_range(0..pool.len());
        taken.push(pool.swap_remove(index));
    }
    taken
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_bounds() {
        let mut rng = run_rng(Some(1));
        for _ in 0..200 {
            let x = uniform(&mut rng, 8.0, 12.0);
            assert!((8.0..=12.0).contains(&x));
        }
        assert_eq!(uniform(&mut rng, 5.0, 5.0), 5.0);
        assert_eq!(uniform(&mut rng, 5.0, 4.0), 5.0);
    }

    #[test]
    fn test_take_random_removes_from_pool() {
        let mut rng = run_rng(Some(2));
        let mut pool: Vec<u32> = (0..10).collect();
        let taken = take_random(&mut pool, 4, &mut rng);
        assert_eq!(taken.len(), 4);
        assert_eq!(pool.len(), 6);
        assert!(taken.iter().all(|t| !pool.contains(t)));

        let rest = take_random(&mut pool, 100, &mut rng);
        assert_eq!(rest.len(), 6);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_seeded_rng_repeats() {
        let a: Vec<f64> = (0..5).map(|_| uniform(&mut run_rng(Some(9)), 0.0, 1.0)).collect();
        let mut rng = run_rng(Some(9));
        let b = uniform(&mut rng, 0.0, 1.0);
        assert_eq!(a[0], b);
    }
}
