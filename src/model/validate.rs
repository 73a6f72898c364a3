//! Structural validation, run before any solver.

use super::problem::{ConstraintKind, Operator, Problem, VariableKind};
use crate::error::ValidationError;
use std::collections::HashSet;

/// Validates a generic problem.
///
/// When `require_expressions` is set (backtracking, genetic and Pareto
/// strategies) every objective must carry an expression.
pub fn validate_problem(problem: &Problem, require_expressions: bool) -> Result<(), ValidationError> {
    if problem.objectives.is_empty() {
        return Err(ValidationError::NoObjectives);
    }
    problem.parameters.validate()?;

    let mut names = HashSet::new();
    for v in &problem.variables {
        if !names.insert(v.name.as_str()) {
            return Err(ValidationError::DuplicateVariable(v.name.clone()));
        }
        match v.kind {
            VariableKind::Continuous | VariableKind::Integer => {
                if let (Some(lo), Some(hi)) = (v.lower, v.upper) {
                    // Integer bounds must also enclose a whole number.
                    let (snapped_lo, snapped_hi) = v.bounds();
                    if lo > hi || lo.is_nan() || hi.is_nan() || snapped_lo > snapped_hi {
                        return Err(ValidationError::InvertedBounds {
                            variable: v.name.clone(),
                            lower: lo,
                            upper: hi,
                        });
                    }
                }
            }
            VariableKind::Categorical => {
                if v.categories.is_empty() {
                    return Err(ValidationError::EmptyCategories(v.name.clone()));
                }
            }
            VariableKind::Binary => {}
        }
        if let Some(init) = v.initial {
            if !v.contains(init) {
                return Err(ValidationError::InitialValueOutOfDomain(v.name.clone()));
            }
        }
    }

    let count = problem.variables.len();
    for o in &problem.objectives {
        if !(o.weight >= 0.0) {
            return Err(ValidationError::NegativeWeight {
                objective: o.name.clone(),
                weight: o.weight,
            });
        }
        match &o.expression {
            Some(e) => check_refs(&o.name, e.max_var(), count)?,
            None if require_expressions => {
                return Err(ValidationError::MissingExpression(o.name.clone()))
            }
            None => {}
        }
    }

    for c in &problem.constraints {
        check_refs(&c.name, c.expression.max_var(), count)?;
        if let Some(tol) = c.tolerance {
            if !(tol >= 0.0) {
                return Err(ValidationError::NegativeTolerance {
                    constraint: c.name.clone(),
                    tolerance: tol,
                });
            }
        }
        if !c.target.is_finite() {
            return Err(ValidationError::NonFiniteTarget {
                constraint: c.name.clone(),
                target: c.target,
            });
        }
        let allowed = match c.kind {
            ConstraintKind::Equality => matches!(c.operator, Operator::Eq),
            ConstraintKind::Inequality => !matches!(c.operator, Operator::Eq),
            ConstraintKind::Bound => {
                if c.expression.as_var().is_none() {
                    return Err(ValidationError::BoundNotOnVariable(c.name.clone()));
                }
                matches!(c.operator, Operator::Eq | Operator::Le | Operator::Ge)
            }
            ConstraintKind::Logical => true,
        };
        if !allowed {
            return Err(ValidationError::OperatorMismatch {
                constraint: c.name.clone(),
                kind: c.kind.to_string(),
                operator: c.operator.to_string(),
            });
        }
    }
    Ok(())
}

/// Additionally requires a non-empty set of finitely bounded variables, as
/// needed by strategies that sample or enumerate domains.
pub fn validate_searchable(problem: &Problem) -> Result<(), ValidationError> {
    validate_problem(problem, true)?;
    if problem.variables.is_empty() {
        return Err(ValidationError::NoVariables);
    }
    for v in &problem.variables {
        let (lo, hi) = v.bounds();
        if !lo.is_finite() || !hi.is_finite() {
            return Err(ValidationError::UnboundedVariable(v.name.clone()));
        }
    }
    Ok(())
}

fn check_refs(owner: &str, max_var: Option<usize>, count: usize) -> Result<(), ValidationError> {
    match max_var {
        Some(index) if index >= count => Err(ValidationError::DanglingReference {
            owner: owner.to_string(),
            index,
            count,
        }),
        _ => Ok(()),
    }
}
