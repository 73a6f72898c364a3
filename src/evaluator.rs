//! Constraint and objective evaluation.
//!
//! [`ConstraintEvaluator`] measures how far a full assignment is from
//! satisfying each constraint. It is pure: the same assignment and
//! constraint always give the same result. Every strategy uses it.
//!
//! # Violation semantics
//!
//! With `tol` the constraint's tolerance (or the evaluator default) and
//! `v` the evaluated expression:
//!
//! | operator | violation |
//! |---|---|
//! | `==` | `max(0, |v - target| - tol)` |
//! | `<=`, `<` | `max(0, v - target - tol)` |
//! | `>=`, `>` | `max(0, target - v - tol)` |
//! | `!=` | `1` when `|v - target| <= tol`, else `0` |
//!
//! Strict and non-strict orderings share a formula; on continuous values
//! the difference is below any tolerance. Logical constraints score `1`
//! when their comparison is false. An expression that evaluates to `NaN`
//! is infinitely violated.

use crate::model::{
    Constraint, ConstraintKind, Operator, Problem, Severity, Violation,
};

/// Evaluates constraints against full assignments.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintEvaluator {
    /// Tolerance used for constraints that do not carry their own.
    pub tolerance: f64,
}

impl Default for ConstraintEvaluator {
    fn default() -> Self {
        Self { tolerance: 1e-6 }
    }
}

impl ConstraintEvaluator {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Tolerance that applies to `constraint`.
    pub fn tolerance_for(&self, constraint: &Constraint) -> f64 {
        constraint.tolerance.unwrap_or(self.tolerance)
    }

    /// Violation magnitude of `constraint` under `values` (0 = satisfied).
    pub fn evaluate(&self, values: &[f64], constraint: &Constraint) -> f64 {
        let v = constraint.expression.evaluate(values);
        if v.is_nan() {
            return f64::INFINITY;
        }
        let t = constraint.target;
        let tol = self.tolerance_for(constraint);

        if constraint.kind == ConstraintKind::Logical {
            let holds = match constraint.operator {
                Operator::Eq => (v - t).abs() <= tol,
                Operator::Ne => (v - t).abs() > tol,
                op => op.holds(v, t),
            };
            return if holds { 0.0 } else { 1.0 };
        }

        match constraint.operator {
            Operator::Eq => ((v - t).abs() - tol).max(0.0),
            Operator::Le | Operator::Lt => (v - t - tol).max(0.0),
            Operator::Ge | Operator::Gt => (t - v - tol).max(0.0),
            Operator::Ne => {
                if (v - t).abs() <= tol {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Signed distance to the constraint's bound; negative when violated.
    ///
    /// Equality constraints have slack `-|v - target|` (0 when met exactly).
    pub fn slack(&self, values: &[f64], constraint: &Constraint) -> f64 {
        let v = constraint.expression.evaluate(values);
        if v.is_nan() {
            return f64::NEG_INFINITY;
        }
        let t = constraint.target;
        if constraint.kind == ConstraintKind::Logical {
            return if self.evaluate(values, constraint) == 0.0 {
                0.0
            } else {
                -1.0
            };
        }
        match constraint.operator {
            Operator::Eq => -(v - t).abs(),
            Operator::Le | Operator::Lt => t - v,
            Operator::Ge | Operator::Gt => v - t,
            Operator::Ne => (v - t).abs(),
        }
    }

    /// Whether every constraint is satisfied.
    pub fn is_feasible(&self, values: &[f64], constraints: &[Constraint]) -> bool {
        constraints.iter().all(|c| self.evaluate(values, c) == 0.0)
    }

    /// Sum of all violation magnitudes.
    pub fn total_violation(&self, values: &[f64], constraints: &[Constraint]) -> f64 {
        constraints.iter().map(|c| self.evaluate(values, c)).sum()
    }

    /// One [`Violation`] per violated constraint, in constraint order.
    pub fn violations(&self, values: &[f64], constraints: &[Constraint]) -> Vec<Violation> {
        constraints
            .iter()
            .filter_map(|c| {
                let magnitude = self.evaluate(values, c);
                (magnitude > 0.0).then(|| {
                    Violation::new(c.name.clone(), magnitude, Severity::grade(magnitude, c.target))
                })
            })
            .collect()
    }
}

/// Raw objective values of `values`, in objective order.
pub fn objective_values(problem: &Problem, values: &[f64]) -> Vec<f64> {
    problem
        .objectives
        .iter()
        .map(|o| o.evaluate(values))
        .collect()
}

/// Weighted-sum scalarisation in minimization form:
/// `Σ weight_i · sign_i · f_i`, where `sign` is `-1` for maximized objectives.
pub fn weighted_sum(problem: &Problem, objective_values: &[f64]) -> f64 {
    problem
        .objectives
        .iter()
        .zip(objective_values)
        .map(|(o, &f)| o.weight * o.direction.sign() * f)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Expr, Objective, Variable};
    use proptest::prelude::*;

    fn x() -> Expr {
        Expr::var(0)
    }

    #[test]
    fn test_equality_with_tolerance() {
        let ev = ConstraintEvaluator::new(0.0);
        let c = Constraint::equality("c", x(), 5.0).with_tolerance(0.5);
        assert_eq!(ev.evaluate(&[5.3], &c), 0.0);
        assert!((ev.evaluate(&[6.0], &c) - 0.5).abs() < 1e-12);
        assert!((ev.evaluate(&[3.0], &c) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_inequalities() {
        let ev = ConstraintEvaluator::new(0.0);
        let le = Constraint::inequality("le", x(), Operator::Le, 4.0);
        let ge = Constraint::inequality("ge", x(), Operator::Ge, 4.0);
        assert_eq!(ev.evaluate(&[3.0], &le), 0.0);
        assert_eq!(ev.evaluate(&[6.0], &le), 2.0);
        assert_eq!(ev.evaluate(&[6.0], &ge), 0.0);
        assert_eq!(ev.evaluate(&[1.0], &ge), 3.0);
    }

    #[test]
    fn test_not_equal() {
        let ev = ConstraintEvaluator::new(1e-9);
        let ne = Constraint::inequality("ne", x(), Operator::Ne, 2.0);
        assert_eq!(ev.evaluate(&[2.0], &ne), 1.0);
        assert_eq!(ev.evaluate(&[2.5], &ne), 0.0);
    }

    #[test]
    fn test_logical() {
        let ev = ConstraintEvaluator::default();
        let c = Constraint::logical("either", x().lt(1.0.into()).or(x().equals(3.0.into())));
        assert_eq!(ev.evaluate(&[0.0], &c), 0.0);
        assert_eq!(ev.evaluate(&[3.0], &c), 0.0);
        assert_eq!(ev.evaluate(&[2.0], &c), 1.0);
    }

    #[test]
    fn test_nan_is_infinite_violation() {
        let ev = ConstraintEvaluator::default();
        let c = Constraint::inequality("c", Expr::var(9), Operator::Le, 1.0);
        assert!(ev.evaluate(&[0.0], &c).is_infinite());
    }

    #[test]
    fn test_slack() {
        let ev = ConstraintEvaluator::default();
        let le = Constraint::inequality("le", x(), Operator::Le, 4.0);
        let ge = Constraint::inequality("ge", x(), Operator::Ge, 4.0);
        assert_eq!(ev.slack(&[3.0], &le), 1.0);
        assert_eq!(ev.slack(&[3.0], &ge), -1.0);
        let eq = Constraint::equality("eq", x(), 4.0);
        assert_eq!(ev.slack(&[4.0], &eq), 0.0);
    }

    #[test]
    fn test_violations_list() {
        let ev = ConstraintEvaluator::new(0.0);
        let cs = vec![
            Constraint::inequality("a", x(), Operator::Le, 1.0),
            Constraint::inequality("b", x(), Operator::Ge, 0.0),
        ];
        let v = ev.violations(&[3.0], &cs);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].constraint, "a");
        assert_eq!(v[0].magnitude, 2.0);
        assert_eq!(v[0].severity, Severity::Critical);
        assert_eq!(ev.total_violation(&[3.0], &cs), 2.0);
    }

    #[test]
    fn test_weighted_sum_directions() {
        let mut p = Problem::new("p");
        let a = p.add_variable(Variable::continuous("a", 0.0, 1.0));
        let b = p.add_variable(Variable::continuous("b", 0.0, 1.0));
        p.add_objective(Objective::minimize("a", a).with_weight(2.0));
        p.add_objective(Objective::maximize("b", b));
        let vals = objective_values(&p, &[3.0, 5.0]);
        assert_eq!(vals, vec![3.0, 5.0]);
        assert_eq!(weighted_sum(&p, &vals), 2.0 * 3.0 - 5.0);
    }

    fn arb_constraint() -> impl Strategy<Value = Constraint> {
        let ops = prop_oneof![
            Just(Operator::Le),
            Just(Operator::Lt),
            Just(Operator::Ge),
            Just(Operator::Gt),
            Just(Operator::Ne),
        ];
        (
            0usize..3,
            -10.0f64..10.0,
            -5.0f64..5.0,
            ops,
            proptest::bool::ANY,
            0.0f64..0.5,
        )
            .prop_map(|(var, coeff, target, op, eq, tol)| {
                let expr = Expr::constant(coeff) * Expr::var(var);
                if eq {
                    Constraint::equality("c", expr, target).with_tolerance(tol)
                } else {
                    Constraint::inequality("c", expr, op, target).with_tolerance(tol)
                }
            })
    }

    proptest! {
        #[test]
        fn prop_feasible_iff_all_zero(
            constraints in proptest::collection::vec(arb_constraint(), 0..6),
            values in proptest::collection::vec(-5.0f64..5.0, 3),
        ) {
            let ev = ConstraintEvaluator::default();
            let all_zero = constraints.iter().all(|c| ev.evaluate(&values, c) == 0.0);
            prop_assert_eq!(all_zero, ev.is_feasible(&values, &constraints));
            prop_assert_eq!(all_zero, ev.violations(&values, &constraints).is_empty());
            for c in &constraints {
                prop_assert!(ev.evaluate(&values, c) >= 0.0);
            }
        }
    }
}
