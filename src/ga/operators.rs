//! Genetic operators for fixed-length vector chromosomes.
//!
//! # Crossover
//!
//! - [`single_point_crossover`]: swap a random contiguous suffix
//!
//! # Mutation
//!
//! - [`gaussian_mutation`]: per-gene Gaussian perturbation, clamped to bounds
//!
//! Discrete domains are handled by the caller, which projects mutated genes
//! back onto their domain (rounding, category index range).

use crate::random::gaussian;
use rand::Rng;

/// Single-point crossover.
///
/// Picks a cut point `c` in `1..n` and returns
/// `(p1[..c] ++ p2[c..], p2[..c] ++ p1[c..])`. Chromosomes shorter than two
/// genes have no interior cut point and are returned unchanged.
///
/// # Panics
/// Panics if the parents have different lengths.
pub fn single_point_crossover<T: Clone, R: Rng>(
    parent1: &[T],
    parent2: &[T],
    rng: &mut R,
) -> (Vec<T>, Vec<T>) {
    let n = parent1.len();
    assert_eq!(n, parent2.len(), "parents must have equal length");
    if n < 2 {
        return (parent1.to_vec(), parent2.to_vec());
    }
    let cut = rng.random_range(1..n);

    let mut child1 = Vec::with_capacity(n);
    child1.extend_from_slice(&parent1[..cut]);
    child1.extend_from_slice(&parent2[cut..]);

    let mut child2 = Vec::with_capacity(n);
    child2.extend_from_slice(&parent2[..cut]);
    child2.extend_from_slice(&parent1[cut..]);

    (child1, child2)
}

/// Gaussian mutation.
///
/// Each gene `i` is perturbed with probability `rate` by `N(0, sigma_i²)`
/// and clamped to `bounds[i]`. Genes with a zero-width or non-finite range,
/// or a non-positive sigma, are left alone.
///
/// Returns the number of mutated genes.
pub fn gaussian_mutation<R: Rng>(
    genes: &mut [f64],
    bounds: &[(f64, f64)],
    sigmas: &[f64],
    rate: f64,
    rng: &mut R,
) -> usize {
    let mut mutated = 0;
    for ((gene, &(lo, hi)), &sigma) in genes.iter_mut().zip(bounds).zip(sigmas) {
        if rng.random::<f64>() >= rate {
            continue;
        }
        let width = hi - lo;
        if !(width > 0.0 && width.is_finite() && sigma > 0.0) {
            continue;
        }
        *gene = gaussian(rng, *gene, sigma).clamp(lo, hi);
        mutated += 1;
    }
    mutated
}
