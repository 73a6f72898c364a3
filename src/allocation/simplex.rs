//! Dense two-phase primal simplex.
//!
//! Solves
//!
//! ```text
//! minimize    c · x
//! subject to  a_i · x  (<= | >= | =)  b_i     for every row i
//!             0 <= x_j <= u_j                 (u_j optional)
//! ```
//!
//! Upper bounds become explicit `<=` rows. Phase 1 minimizes the sum of
//! artificial variables to find a feasible basis; phase 2 optimizes the
//! real costs with artificial columns barred from entering. Entering and
//! leaving variables follow Bland's rule, so degenerate problems cannot
//! cycle.
//!
//! Dual values are read from the reduced costs of each row's identity column
//! (its slack, or its artificial for `>=` and `=` rows) and are reported as
//! `∂ objective / ∂ b_i` in the row's original orientation.

use serde::{Deserialize, Serialize};

const EPS: f64 = 1e-9;

/// Row comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Le,
    Ge,
    Eq,
}

impl Relation {
    fn flipped(self) -> Self {
        match self {
            Relation::Le => Relation::Ge,
            Relation::Ge => Relation::Le,
            Relation::Eq => Relation::Eq,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LpRow {
    pub coefficients: Vec<f64>,
    pub relation: Relation,
    pub rhs: f64,
}

/// A linear program over non-negative variables, in minimization form.
///
/// # Examples
///
/// ```
/// use u_optimize::allocation::{LinearProgram, LpOutcome, Relation};
///
/// // maximize x + y  <=>  minimize -x - y
/// let mut lp = LinearProgram::new(vec![-1.0, -1.0]);
/// lp.add_row(vec![1.0, 2.0], Relation::Le, 4.0);
/// lp.add_row(vec![3.0, 1.0], Relation::Le, 6.0);
///
/// match lp.solve(100) {
///     LpOutcome::Optimal(s) => assert!((s.objective + 2.8).abs() < 1e-9),
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinearProgram {
    costs: Vec<f64>,
    rows: Vec<LpRow>,
    upper: Vec<Option<f64>>,
}

/// An optimal basic solution.
#[derive(Debug, Clone, PartialEq)]
pub struct LpSolution {
    pub x: Vec<f64>,
    pub objective: f64,
    /// Per row: `∂ objective / ∂ rhs`.
    pub duals: Vec<f64>,
    /// Per row: distance to the bound (`b - a·x` for `<=`, `a·x - b` for
    /// `>=`, `-|a·x - b|` for `=`).
    pub slacks: Vec<f64>,
    /// Per variable, with upper bounds treated as rows.
    pub reduced_costs: Vec<f64>,
    pub pivots: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LpOutcome {
    Optimal(LpSolution),
    Infeasible,
    Unbounded,
    PivotLimit,
    /// The stop callback asked to abort.
    Interrupted,
}

impl LinearProgram {
    pub fn new(costs: Vec<f64>) -> Self {
        let n = costs.len();
        Self {
            costs,
            rows: Vec::new(),
            upper: vec![None; n],
        }
    }

    pub fn num_vars(&self) -> usize {
        self.costs.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Adds a row and returns its index. Missing trailing coefficients are
    /// zero.
    pub fn add_row(&mut self, mut coefficients: Vec<f64>, relation: Relation, rhs: f64) -> usize {
        debug_assert!(coefficients.len() <= self.costs.len());
        coefficients.resize(self.costs.len(), 0.0);
        self.rows.push(LpRow {
            coefficients,
            relation,
            rhs,
        });
        self.rows.len() - 1
    }

    pub fn set_upper(&mut self, var: usize, upper: f64) {
        self.upper[var] = Some(upper);
    }

    pub fn rows(&self) -> &[LpRow] {
        &self.rows
    }

    pub fn solve(&self, pivot_limit: usize) -> LpOutcome {
        self.solve_with(pivot_limit, || false)
    }

    /// Solves, calling `should_stop` before every pivot.
    pub fn solve_with(&self, pivot_limit: usize, mut should_stop: impl FnMut() -> bool) -> LpOutcome {
        let n = self.costs.len();
        let mut rows: Vec<LpRow> = self.rows.clone();
        for (j, ub) in self.upper.iter().enumerate() {
            if let Some(ub) = *ub {
                let mut coefficients = vec![0.0; n];
                coefficients[j] = 1.0;
                rows.push(LpRow {
                    coefficients,
                    relation: Relation::Le,
                    rhs: ub,
                });
            }
        }

        let mut flipped = vec![false; rows.len()];
        for (row, flip) in rows.iter_mut().zip(flipped.iter_mut()) {
            if row.rhs < 0.0 {
                row.coefficients.iter_mut().for_each(|a| *a = -*a);
                row.rhs = -row.rhs;
                row.relation = row.relation.flipped();
                *flip = true;
            }
        }

        let (mut t, art_start) = Tableau::build(n, &rows);
        let cols = t.cols;
        let mut pivots = 0;

        if art_start < cols {
            let mut phase1 = vec![0.0; cols];
            phase1[art_start..].fill(1.0);
            t.price(&phase1);
            match t.optimize(|_| true, &mut pivots, pivot_limit, &mut should_stop) {
                Step::Optimal | Step::Unbounded => {}
                Step::PivotLimit => return LpOutcome::PivotLimit,
                Step::Interrupted => return LpOutcome::Interrupted,
            }
            let scale = rows.iter().map(|r| r.rhs).fold(1.0_f64, f64::max);
            if -t.obj[cols] > 1e-7 * scale {
                return LpOutcome::Infeasible;
            }
            for i in 0..t.rows.len() {
                if t.basis[i] >= art_start {
                    if let Some(c) = (0..art_start).find(|&j| t.rows[i][j].abs() > EPS) {
                        t.pivot(i, c);
                    }
                }
            }
        }

        let mut phase2 = vec![0.0; cols];
        phase2[..n].copy_from_slice(&self.costs);
        t.price(&phase2);
        match t.optimize(|j| j < art_start, &mut pivots, pivot_limit, &mut should_stop) {
            Step::Optimal => {}
            Step::Unbounded => return LpOutcome::Unbounded,
            Step::PivotLimit => return LpOutcome::PivotLimit,
            Step::Interrupted => return LpOutcome::Interrupted,
        }

        let mut x = vec![0.0; n];
        for (i, &b) in t.basis.iter().enumerate() {
            if b < n {
                x[b] = t.rows[i][cols].max(0.0);
            }
        }
        let objective = self.costs.iter().zip(&x).map(|(c, v)| c * v).sum();

        let duals = (0..self.rows.len())
            .map(|i| {
                let y = -t.obj[t.identity[i]];
                let y = if flipped[i] { -y } else { y };
                clean(y)
            })
            .collect();
        let slacks = self
            .rows
            .iter()
            .map(|row| {
                let ax: f64 = row.coefficients.iter().zip(&x).map(|(a, v)| a * v).sum();
                match row.relation {
                    Relation::Le => row.rhs - ax,
                    Relation::Ge => ax - row.rhs,
                    Relation::Eq => -(ax - row.rhs).abs(),
                }
            })
            .map(clean)
            .collect();
        let reduced_costs = t.obj[..n].iter().copied().map(clean).collect();

        LpOutcome::Optimal(LpSolution {
            x,
            objective,
            duals,
            slacks,
            reduced_costs,
            pivots,
        })
    }
}

fn clean(v: f64) -> f64 {
    if v.abs() < EPS {
        0.0
    } else {
        v
    }
}

enum Step {
    Optimal,
    Unbounded,
    PivotLimit,
    Interrupted,
}

struct Tableau {
    /// `m x (cols + 1)`, right-hand side last.
    rows: Vec<Vec<f64>>,
    /// Reduced costs; the last entry is `-objective`.
    obj: Vec<f64>,
    basis: Vec<usize>,
    /// Column holding each row's initial identity entry.
    identity: Vec<usize>,
    cols: usize,
}

impl Tableau {
    /// Standard form with slack, surplus and artificial columns. Returns the
    /// tableau and the first artificial column.
    fn build(n: usize, rows: &[LpRow]) -> (Self, usize) {
        let slack_count = rows.iter().filter(|r| r.relation != Relation::Eq).count();
        let art_start = n + slack_count;
        let art_count = rows.iter().filter(|r| r.relation != Relation::Le).count();
        let cols = art_start + art_count;

        let mut table = Vec::with_capacity(rows.len());
        let mut basis = Vec::with_capacity(rows.len());
        let mut identity = Vec::with_capacity(rows.len());
        let (mut next_slack, mut next_art) = (n, art_start);
        for row in rows {
            let mut r = vec![0.0; cols + 1];
            r[..n].copy_from_slice(&row.coefficients);
            r[cols] = row.rhs;
            match row.relation {
                Relation::Le => {
                    r[next_slack] = 1.0;
                    basis.push(next_slack);
                    identity.push(next_slack);
                    next_slack += 1;
                }
                Relation::Ge => {
                    r[next_slack] = -1.0;
                    next_slack += 1;
                    r[next_art] = 1.0;
                    basis.push(next_art);
                    identity.push(next_art);
                    next_art += 1;
                }
                Relation::Eq => {
                    r[next_art] = 1.0;
                    basis.push(next_art);
                    identity.push(next_art);
                    next_art += 1;
                }
            }
            table.push(r);
        }

        let tableau = Self {
            rows: table,
            obj: vec![0.0; cols + 1],
            basis,
            identity,
            cols,
        };
        (tableau, art_start)
    }

    /// Recomputes the reduced-cost row for `costs` under the current basis.
    fn price(&mut self, costs: &[f64]) {
        self.obj[..self.cols].copy_from_slice(costs);
        self.obj[self.cols] = 0.0;
        for (row, &b) in self.rows.iter().zip(&self.basis) {
            let cb = costs[b];
            if cb != 0.0 {
                for (o, a) in self.obj.iter_mut().zip(row) {
                    *o -= cb * a;
                }
            }
        }
    }

    fn pivot(&mut self, r: usize, c: usize) {
        let p = self.rows[r][c];
        self.rows[r].iter_mut().for_each(|v| *v /= p);
        let pivot_row = self.rows[r].clone();
        for (i, row) in self.rows.iter_mut().enumerate() {
            let f = row[c];
            if i != r && f != 0.0 {
                for (v, pv) in row.iter_mut().zip(&pivot_row) {
                    *v -= f * pv;
                }
            }
        }
        let f = self.obj[c];
        if f != 0.0 {
            for (v, pv) in self.obj.iter_mut().zip(&pivot_row) {
                *v -= f * pv;
            }
        }
        self.basis[r] = c;
    }

    fn optimize(
        &mut self,
        allowed: impl Fn(usize) -> bool,
        pivots: &mut usize,
        limit: usize,
        should_stop: &mut impl FnMut() -> bool,
    ) -> Step {
        loop {
            let Some(c) = (0..self.cols).find(|&j| allowed(j) && self.obj[j] < -EPS) else {
                return Step::Optimal;
            };
            let mut leaving: Option<(usize, f64)> = None;
            for (i, row) in self.rows.iter().enumerate() {
                let a = row[c];
                if a <= EPS {
                    continue;
                }
                let ratio = row[self.cols] / a;
                let better = match leaving {
                    None => true,
                    Some((best_i, best)) => {
                        ratio < best - EPS
                            || ((ratio - best).abs() <= EPS && self.basis[i] < self.basis[best_i])
                    }
                };
                if better {
                    leaving = Some((i, ratio));
                }
            }
            let Some((r, _)) = leaving else {
                return Step::Unbounded;
            };
            if *pivots >= limit {
                return Step::PivotLimit;
            }
            if should_stop() {
                return Step::Interrupted;
            }
            self.pivot(r, c);
            *pivots += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn optimal(outcome: LpOutcome) -> LpSolution {
        match outcome {
            LpOutcome::Optimal(s) => s,
            other => panic!("expected optimal, got {other:?}"),
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-7
    }

    #[test]
    fn test_textbook_maximization() {
        let mut lp = LinearProgram::new(vec![-1.0, -1.0]);
        lp.add_row(vec![1.0, 2.0], Relation::Le, 4.0);
        lp.add_row(vec![3.0, 1.0], Relation::Le, 6.0);
        let s = optimal(lp.solve(100));
        assert!(close(s.x[0], 1.6));
        assert!(close(s.x[1], 1.2));
        assert!(close(s.objective, -2.8));
        assert!(close(s.duals[0], -0.4));
        assert!(close(s.duals[1], -0.2));
        assert!(s.slacks.iter().all(|&v| close(v, 0.0)));
        assert!(s.reduced_costs.iter().all(|&v| close(v, 0.0)));
    }

    #[test]
    fn test_equality_with_upper_bounds() {
        // Two suppliers: cost 2 (cap 10) and cost 1 (cap 20); need exactly 25.
        let mut lp = LinearProgram::new(vec![2.0, 1.0]);
        lp.set_upper(0, 10.0);
        lp.set_upper(1, 20.0);
        lp.add_row(vec![1.0, 1.0], Relation::Eq, 25.0);
        let s = optimal(lp.solve(100));
        assert!(close(s.x[0], 5.0));
        assert!(close(s.x[1], 20.0));
        assert!(close(s.objective, 30.0));
        // One more unit of demand comes from the expensive supplier.
        assert!(close(s.duals[0], 2.0));
    }

    #[test]
    fn test_negative_rhs_is_normalised() {
        // -x <= -3  <=>  x >= 3
        let mut lp = LinearProgram::new(vec![1.0]);
        lp.add_row(vec![-1.0], Relation::Le, -3.0);
        let s = optimal(lp.solve(100));
        assert!(close(s.x[0], 3.0));
        assert!(close(s.duals[0], -1.0));
        assert!(close(s.slacks[0], 0.0));
    }

    #[test]
    fn test_infeasible() {
        let mut lp = LinearProgram::new(vec![1.0]);
        lp.add_row(vec![1.0], Relation::Le, 1.0);
        lp.add_row(vec![1.0], Relation::Ge, 2.0);
        assert_eq!(lp.solve(100), LpOutcome::Infeasible);
    }

    #[test]
    fn test_unbounded() {
        let mut lp = LinearProgram::new(vec![-1.0, 0.0]);
        lp.add_row(vec![1.0, -1.0], Relation::Le, 1.0);
        assert_eq!(lp.solve(100), LpOutcome::Unbounded);
    }

    #[test]
    fn test_degenerate_does_not_cycle() {
        // Beale's example, which cycles under the largest-coefficient rule.
        let mut lp = LinearProgram::new(vec![-0.75, 150.0, -0.02, 6.0]);
        lp.add_row(vec![0.25, -60.0, -0.04, 9.0], Relation::Le, 0.0);
        lp.add_row(vec![0.5, -90.0, -0.02, 3.0], Relation::Le, 0.0);
        lp.add_row(vec![0.0, 0.0, 1.0, 0.0], Relation::Le, 1.0);
        let s = optimal(lp.solve(1_000));
        assert!(close(s.objective, -0.05));
    }

    #[test]
    fn test_pivot_limit_and_interrupt() {
        let mut lp = LinearProgram::new(vec![-1.0, -1.0]);
        lp.add_row(vec![1.0, 2.0], Relation::Le, 4.0);
        lp.add_row(vec![3.0, 1.0], Relation::Le, 6.0);
        assert_eq!(lp.solve(0), LpOutcome::PivotLimit);
        assert_eq!(lp.solve_with(100, || true), LpOutcome::Interrupted);
    }

    #[test]
    fn test_redundant_equalities() {
        let mut lp = LinearProgram::new(vec![1.0, 1.0]);
        lp.add_row(vec![1.0, 1.0], Relation::Eq, 2.0);
        lp.add_row(vec![2.0, 2.0], Relation::Eq, 4.0);
        let s = optimal(lp.solve(100));
        assert!(close(s.objective, 2.0));
        assert!(close(s.x[0] + s.x[1], 2.0));
    }
}
