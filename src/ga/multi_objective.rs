//! Multi-objective utilities for NSGA-II style search.
//!
//! All objective vectors are in **minimization form**: callers multiply
//! maximized objectives by `-1` before sorting.
//!
//! # Algorithms
//!
//! - [`dominates`]: constrained Pareto dominance
//! - [`non_dominated_sort`]: fast non-dominated sorting (Deb et al., 2002)
//! - [`crowding_distance`]: crowding distance within one front
//!
//! # Constrained dominance
//!
//! With violations `va`, `vb` (0 = feasible), `a` dominates `b` when
//!
//! 1. `a` is feasible and `b` is not, or
//! 2. both are infeasible and `va < vb`, or
//! 3. both are feasible and `a` is no worse in every objective and strictly
//!    better in at least one.
//!
//! # References
//!
//! - Deb et al. (2002), "A Fast and Elitist Multiobjective Genetic Algorithm:
//!   NSGA-II", IEEE Trans. Evolutionary Computation 6(2), 182-197

use std::cmp::Ordering;

/// Result of non-dominated sorting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NondominatedSortResult {
    /// Pareto rank of each solution (0 = first front).
    pub ranks: Vec<usize>,

    /// Indices grouped by front: `fronts[0]` holds the rank-0 indices.
    pub fronts: Vec<Vec<usize>>,

    /// Number of solutions in the whole set that dominate each solution.
    pub domination_counts: Vec<usize>,

    /// Number of solutions in the whole set each solution dominates.
    pub dominated_counts: Vec<usize>,
}

/// Plain Pareto dominance on minimization vectors.
pub fn pareto_dominates(a: &[f64], b: &[f64]) -> bool {
    let mut strictly_better = false;
    for (x, y) in a.iter().zip(b) {
        match x.partial_cmp(y) {
            Some(Ordering::Greater) | None => return false,
            Some(Ordering::Less) => strictly_better = true,
            Some(Ordering::Equal) => {}
        }
    }
    strictly_better
}

/// Constrained dominance (see the module docs).
pub fn dominates(a: &[f64], violation_a: f64, b: &[f64], violation_b: f64) -> bool {
    let feasible_a = violation_a <= 0.0;
    let feasible_b = violation_b <= 0.0;
    match (feasible_a, feasible_b) {
        (true, false) => true,
        (false, true) => false,
        (false, false) => violation_a < violation_b,
        (true, true) => pareto_dominates(a, b),
    }
}

/// Fast non-dominated sorting under constrained dominance.
///
/// `violations` may be empty, meaning every solution is feasible.
/// O(m·n²) for `n` solutions and `m` objectives.
///
/// # Example
///
/// ```
/// use u_optimize::ga::multi_objective::non_dominated_sort;
///
/// let objectives = vec![
///     vec![1.0, 5.0],
///     vec![3.0, 3.0],
///     vec![5.0, 1.0],
///     vec![4.0, 4.0], // dominated by [3, 3]
/// ];
/// let result = non_dominated_sort(&objectives, &[]);
/// assert_eq!(result.ranks, vec![0, 0, 0, 1]);
/// assert_eq!(result.domination_counts, vec![0, 0, 0, 1]);
/// assert_eq!(result.dominated_counts, vec![0, 1, 0, 0]);
/// ```
pub fn non_dominated_sort(objectives: &[Vec<f64>], violations: &[f64]) -> NondominatedSortResult {
    let n = objectives.len();
    if n == 0 {
        return NondominatedSortResult::default();
    }
    let violation = |i: usize| violations.get(i).copied().unwrap_or(0.0);

    let mut domination_counts = vec![0usize; n];
    let mut dominated: Vec<Vec<usize>> = vec![Vec::new(); n];

    for i in 0..n {
        for j in (i + 1)..n {
            if dominates(&objectives[i], violation(i), &objectives[j], violation(j)) {
                dominated[i].push(j);
                domination_counts[j] += 1;
            } else if dominates(&objectives[j], violation(j), &objectives[i], violation(i)) {
                dominated[j].push(i);
                domination_counts[i] += 1;
            }
        }
    }

    let mut ranks = vec![0usize; n];
    let mut remaining = domination_counts.clone();
    let mut fronts = Vec::new();
    let mut current: Vec<usize> = (0..n).filter(|&i| remaining[i] == 0).collect();
    let mut rank = 0;

    while !current.is_empty() {
        let mut next = Vec::new();
        for &i in &current {
            ranks[i] = rank;
            for &j in &dominated[i] {
                remaining[j] -= 1;
                if remaining[j] == 0 {
                    next.push(j);
                }
            }
        }
        next.sort_unstable();
        fronts.push(current);
        current = next;
        rank += 1;
    }

    NondominatedSortResult {
        ranks,
        fronts,
        domination_counts,
        dominated_counts: dominated.iter().map(Vec::len).collect(),
    }
}

/// Crowding distance of each member of one front.
///
/// `front` holds indices into `objectives`; the result is parallel to
/// `front`. Boundary members of every objective get `f64::INFINITY`;
/// interior members sum the normalized gap between their neighbours.
/// Fronts of one or two members are all boundary.
///
/// ```
/// use u_optimize::ga::multi_objective::crowding_distance;
///
/// let objectives = vec![vec![1.0, 5.0], vec![3.0, 3.0], vec![5.0, 1.0]];
/// let d = crowding_distance(&objectives, &[0, 1, 2]);
/// assert!(d[0].is_infinite() && d[2].is_infinite());
/// assert!((d[1] - 2.0).abs() < 1e-12);
/// ```
pub fn crowding_distance(objectives: &[Vec<f64>], front: &[usize]) -> Vec<f64> {
    let n = front.len();
    if n <= 2 {
        return vec![f64::INFINITY; n];
    }
    let m = objectives[front[0]].len();
    let mut distances = vec![0.0f64; n];

    for k in 0..m {
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| objectives[front[a]][k].total_cmp(&objectives[front[b]][k]));

        distances[order[0]] = f64::INFINITY;
        distances[order[n - 1]] = f64::INFINITY;

        let min = objectives[front[order[0]]][k];
        let max = objectives[front[order[n - 1]]][k];
        let range = max - min;
        if !(range > 0.0 && range.is_finite()) {
            continue;
        }
        for w in 1..(n - 1) {
            let prev = objectives[front[order[w - 1]]][k];
            let next = objectives[front[order[w + 1]]][k];
            distances[order[w]] += (next - prev) / range;
        }
    }
    distances
}

/// NSGA-II crowded comparison: lower rank wins, then larger crowding
/// distance.
pub fn crowded_better(rank_a: usize, crowd_a: f64, rank_b: usize, crowd_b: f64) -> bool {
    rank_a < rank_b || (rank_a == rank_b && crowd_a > crowd_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_and_single() {
        assert_eq!(non_dominated_sort(&[], &[]), NondominatedSortResult::default());
        let r = non_dominated_sort(&[vec![1.0, 2.0]], &[]);
        assert_eq!(r.ranks, vec![0]);
        assert_eq!(r.fronts, vec![vec![0]]);
    }

    #[test]
    fn test_chain_of_fronts() {
        let objs = vec![vec![3.0, 3.0], vec![1.0, 1.0], vec![2.0, 2.0]];
        let r = non_dominated_sort(&objs, &[]);
        assert_eq!(r.ranks, vec![2, 0, 1]);
        assert_eq!(r.fronts, vec![vec![1], vec![2], vec![0]]);
        assert_eq!(r.domination_counts, vec![2, 0, 1]);
        assert_eq!(r.dominated_counts, vec![0, 2, 1]);
    }

    #[test]
    fn test_duplicates_share_front() {
        let objs = vec![vec![1.0, 1.0], vec![1.0, 1.0]];
        let r = non_dominated_sort(&objs, &[]);
        assert_eq!(r.ranks, vec![0, 0]);
    }

    #[test]
    fn test_feasible_dominates_infeasible() {
        // The infeasible point is better on both objectives but still loses.
        let objs = vec![vec![5.0, 5.0], vec![0.0, 0.0], vec![1.0, 1.0]];
        let r = non_dominated_sort(&objs, &[0.0, 2.0, 0.5]);
        assert_eq!(r.ranks, vec![0, 2, 1]);
    }

    #[test]
    fn test_crowding_interior() {
        let objs = vec![
            vec![0.0, 4.0],
            vec![1.0, 3.0],
            vec![3.0, 1.0],
            vec![4.0, 0.0],
        ];
        let d = crowding_distance(&objs, &[0, 1, 2, 3]);
        assert!(d[0].is_infinite() && d[3].is_infinite());
        // gaps: (3-0)/4 per objective, twice
        assert!((d[1] - 1.5).abs() < 1e-12);
        assert!((d[2] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_crowding_flat_objective() {
        let objs = vec![vec![1.0, 0.0], vec![2.0, 0.0], vec![3.0, 0.0]];
        let d = crowding_distance(&objs, &[0, 1, 2]);
        assert!((d[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_crowded_better() {
        assert!(crowded_better(0, 0.1, 1, 9.0));
        assert!(crowded_better(1, 2.0, 1, 1.0));
        assert!(!crowded_better(1, 1.0, 1, 1.0));
    }

    proptest! {
        #[test]
        fn prop_first_front_mutually_non_dominated(
            points in proptest::collection::vec(
                proptest::collection::vec(-10.0f64..10.0, 2), 1..30)
        ) {
            let r = non_dominated_sort(&points, &[]);
            let front = &r.fronts[0];
            for &a in front {
                for &b in front {
                    prop_assert!(!pareto_dominates(&points[a], &points[b]));
                }
            }
            // every later-ranked point is dominated by someone
            for (i, &rank) in r.ranks.iter().enumerate() {
                if rank > 0 {
                    prop_assert!(r.domination_counts[i] > 0);
                }
            }
            let total: usize = r.fronts.iter().map(Vec::len).sum();
            prop_assert_eq!(total, points.len());
        }
    }
}
