//! Domain reduction and enumeration.

use super::config::BacktrackingParams;
use crate::evaluator::ConstraintEvaluator;
use crate::model::{ConstraintKind, Operator, Problem, Variable};

/// A domain emptied by bound propagation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EmptyDomain {
    pub variable: usize,
    /// Bound constraints on the variable, by index.
    pub constraints: Vec<usize>,
    /// `lower - upper` after narrowing.
    pub gap: f64,
}

/// Narrows each variable's bounds with its `Bound` constraints.
///
/// Discrete bounds are then snapped inwards to whole numbers, whether or
/// not a constraint touched them. Returns the first
/// variable whose domain became empty.
pub(crate) fn propagate_bounds(
    problem: &Problem,
    evaluator: &ConstraintEvaluator,
) -> Result<Vec<(f64, f64)>, EmptyDomain> {
    let mut bounds: Vec<(f64, f64)> = problem.variables.iter().map(Variable::bounds).collect();

    for c in &problem.constraints {
        if c.kind != ConstraintKind::Bound {
            continue;
        }
        let Some(i) = c.expression.as_var() else {
            continue;
        };
        let tol = evaluator.tolerance_for(c);
        let discrete = problem.variables[i].is_discrete();
        let (lo, hi) = &mut bounds[i];
        match c.operator {
            Operator::Eq => {
                let t = if discrete && (c.target.round() - c.target).abs() <= tol {
                    c.target.round()
                } else {
                    c.target
                };
                *lo = lo.max(t);
                *hi = hi.min(t);
            }
            Operator::Le | Operator::Lt => {
                let t = if discrete { (c.target + tol).floor() } else { c.target };
                *hi = hi.min(t);
            }
            Operator::Ge | Operator::Gt => {
                let t = if discrete { (c.target - tol).ceil() } else { c.target };
                *lo = lo.max(t);
            }
            Operator::Ne => {}
        }
    }

    for (v, (lo, hi)) in problem.variables.iter().zip(&mut bounds) {
        if v.is_discrete() {
            *lo = lo.ceil();
            *hi = hi.floor();
        }
    }

    for (i, &(lo, hi)) in bounds.iter().enumerate() {
        if lo > hi {
            let constraints = problem
                .constraints
                .iter()
                .enumerate()
                .filter(|(_, c)| c.kind == ConstraintKind::Bound && c.expression.as_var() == Some(i))
                .map(|(ci, _)| ci)
                .collect();
            return Err(EmptyDomain {
                variable: i,
                constraints,
                gap: lo - hi,
            });
        }
    }
    Ok(bounds)
}

/// Candidate values of a variable within `[lo, hi]`, ascending.
///
/// A fixed variable (`lo == hi`) has the single value `lo`.
pub(crate) fn enumerate(variable: &Variable, lo: f64, hi: f64, params: &BacktrackingParams) -> Vec<f64> {
    if lo == hi {
        return vec![lo];
    }
    let steps = params.continuous_steps;
    if variable.is_discrete() {
        let count = (hi - lo) as usize + 1;
        if count <= params.max_domain_size {
            return (0..count).map(|k| lo + k as f64).collect();
        }
        let mut values: Vec<f64> = (0..=steps)
            .map(|k| (lo + (hi - lo) * k as f64 / steps as f64).round())
            .collect();
        values.dedup();
        return values;
    }
    (0..=steps)
        .map(|k| {
            if k == steps {
                hi
            } else {
                lo + (hi - lo) * k as f64 / steps as f64
            }
        })
        .collect()
}
