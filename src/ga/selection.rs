//! Parent selection.
//!
//! All strategies assume **minimization** (lower fitness = better). Penalised
//! fitness values can be very large or infinite; every strategy tolerates
//! non-finite fitness by treating it as the worst possible value.
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"
//! - Baker (1985), "Adaptive Selection Methods for Genetic Algorithms"

use super::types::{Fitness, Individual};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Selection strategy for choosing parents.
///
/// # Examples
///
/// ```
/// use u_optimize::ga::Selection;
///
/// let sel = Selection::Tournament(3);
/// assert_eq!(sel, Selection::default());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// Sample `k` individuals uniformly with replacement, keep the fittest.
    ///
    /// O(k) per selection.
    Tournament(usize),

    /// Fitness-proportionate selection on inverted fitness
    /// (`max - f + ε`). O(n) per selection.
    Roulette,

    /// Linear ranking: the i-th best of `n` has weight `n - i`.
    /// O(n log n) per selection.
    Rank,
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Tournament(3)
    }
}

impl Selection {
    /// Selects a parent index from a non-empty population.
    ///
    /// Returns `None` for an empty population.
    pub fn select<I: Individual, R: Rng>(&self, population: &[I], rng: &mut R) -> Option<usize> {
        if population.is_empty() {
            return None;
        }
        let idx = match *self {
            Selection::Tournament(k) => tournament_by(population.len(), k, rng, |a, b| {
                better(population[a].fitness().to_f64(), population[b].fitness().to_f64())
            }),
            Selection::Roulette => roulette(population, rng),
            Selection::Rank => rank(population, rng),
        };
        Some(idx)
    }
}

/// Tournament over `0..n` under an arbitrary "strictly better" relation.
///
/// NSGA-II uses this with the crowded-comparison operator. `n` must be
/// positive.
pub fn tournament_by<R, F>(n: usize, k: usize, rng: &mut R, is_better: F) -> usize
where
    R: Rng,
    F: Fn(usize, usize) -> bool,
{
    let mut best = rng.random_range(0..n);
    for _ in 1..k.max(1) {
        let idx = rng.random_range(0..n);
        if is_better(idx, best) {
            best = idx;
        }
    }
    best
}

fn better(a: f64, b: f64) -> bool {
    match (a.is_nan(), b.is_nan()) {
        (false, true) => true,
        (true, _) => false,
        (false, false) => a < b,
    }
}

fn roulette<I: Individual, R: Rng>(population: &[I], rng: &mut R) -> usize {
    let n = population.len();
    if n == 1 {
        return 0;
    }

    const EPSILON: f64 = 1e-10;
    let fitnesses: Vec<f64> = population.iter().map(|i| i.fitness().to_f64()).collect();
    let max_finite = fitnesses
        .iter()
        .copied()
        .filter(|f| f.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    if !max_finite.is_finite() {
        return rng.random_range(0..n);
    }

    let weights: Vec<f64> = fitnesses
        .iter()
        .map(|&f| {
            if f.is_finite() {
                (max_finite - f).max(0.0) + EPSILON
            } else {
                EPSILON
            }
        })
        .collect();

    let total: f64 = weights.iter().sum();
    if !(total > 0.0 && total.is_finite()) {
        return rng.random_range(0..n);
    }

    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        cumulative += w;
        if cumulative > threshold {
            return i;
        }
    }
    n - 1
}

fn rank<I: Individual, R: Rng>(population: &[I], rng: &mut R) -> usize {
    let n = population.len();
    if n == 1 {
        return 0;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        let (fa, fb) = (population[a].fitness().to_f64(), population[b].fitness().to_f64());
        fa.total_cmp(&fb)
    });

    let total = (n * (n + 1)) as f64 / 2.0;
    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (position, &idx) in order.iter().enumerate() {
        cumulative += (n - position) as f64;
        if cumulative > threshold {
            return idx;
        }
    }
    order[n - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;

    #[derive(Clone)]
    struct TestInd {
        fit: f64,
    }

    impl Individual for TestInd {
        type Fitness = f64;
        fn fitness(&self) -> f64 {
            self.fit
        }
        fn set_fitness(&mut self, f: f64) {
            self.fit = f;
        }
    }

    fn make_population(fitnesses: &[f64]) -> Vec<TestInd> {
        fitnesses.iter().map(|&f| TestInd { fit: f }).collect()
    }

    fn counts(sel: Selection, pop: &[TestInd], n: usize) -> Vec<u32> {
        let mut rng = create_rng(42);
        let mut counts = vec![0u32; pop.len()];
        for _ in 0..n {
            counts[sel.select(pop, &mut rng).unwrap()] += 1;
        }
        counts
    }

    #[test]
    fn test_tournament_favors_best() {
        let pop = make_population(&[10.0, 5.0, 1.0, 8.0]);
        let c = counts(Selection::Tournament(4), &pop, 10_000);
        assert!(c[2] > 6000, "best selected {} times", c[2]);
    }

    #[test]
    fn test_tournament_size_1_is_uniform() {
        let pop = make_population(&[10.0, 5.0, 1.0, 8.0]);
        let c = counts(Selection::Tournament(1), &pop, 10_000);
        assert!(c.iter().all(|&x| x > 1500), "{c:?}");
    }

    #[test]
    fn test_roulette_favors_best() {
        let pop = make_population(&[100.0, 50.0, 1.0, 80.0]);
        let c = counts(Selection::Roulette, &pop, 10_000);
        assert!(c[2] > c[0], "{c:?}");
    }

    #[test]
    fn test_rank_favors_best() {
        let pop = make_population(&[100.0, 50.0, 1.0, 80.0]);
        let c = counts(Selection::Rank, &pop, 10_000);
        assert!(c[2] > c[0], "{c:?}");
    }

    #[test]
    fn test_infinite_fitness_is_worst() {
        let pop = make_population(&[f64::INFINITY, 2.0, f64::NAN]);
        for sel in [Selection::Tournament(3), Selection::Roulette, Selection::Rank] {
            let c = counts(sel, &pop, 5_000);
            assert!(c[1] > c[0] && c[1] > c[2], "{sel:?}: {c:?}");
        }
    }

    #[test]
    fn test_single_and_empty() {
        let mut rng = create_rng(42);
        let pop = make_population(&[5.0]);
        for sel in [Selection::Tournament(3), Selection::Roulette, Selection::Rank] {
            assert_eq!(sel.select(&pop, &mut rng), Some(0));
            assert_eq!(sel.select::<TestInd, _>(&[], &mut rng), None);
        }
    }

    #[test]
    fn test_tournament_by_custom_order() {
        let mut rng = create_rng(3);
        // "Better" means larger index: with k = 50 over 5 items the max wins.
        let mut wins = 0;
        for _ in 0..200 {
            if tournament_by(5, 50, &mut rng, |a, b| a > b) == 4 {
                wins += 1;
            }
        }
        assert!(wins > 190);
    }
}
