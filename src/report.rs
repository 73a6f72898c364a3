//! Helpers that turn a raw assignment into solution records.

use crate::evaluator::{objective_values, weighted_sum, ConstraintEvaluator};
use crate::model::{
    Algorithm, Alternative, NamedValue, Problem, Solution, SolutionStatus, SolveMetadata,
};
use crate::sensitivity;

/// Variable values with category labels.
pub(crate) fn named_variables(problem: &Problem, values: &[f64]) -> Vec<NamedValue> {
    problem
        .variables
        .iter()
        .zip(values)
        .map(|(v, &x)| NamedValue::labelled(v.name.clone(), x, v.category(x).map(str::to_string)))
        .collect()
}

/// Objective values of an assignment, in objective order.
pub(crate) fn named_objectives(problem: &Problem, values: &[f64]) -> Vec<NamedValue> {
    problem
        .objectives
        .iter()
        .zip(objective_values(problem, values))
        .map(|(o, f)| NamedValue::new(o.name.clone(), f))
        .collect()
}

/// Weighted objective reported in the problem's own direction: ascending
/// when every objective maximizes, minimization form otherwise.
pub(crate) fn directed(problem: &Problem, minimization_value: f64) -> f64 {
    if problem.all_maximize() {
        -minimization_value
    } else {
        minimization_value
    }
}

/// Weighted-sum objective of an assignment in minimization form.
pub(crate) fn scalar_objective(problem: &Problem, values: &[f64]) -> f64 {
    weighted_sum(problem, &objective_values(problem, values))
}

pub(crate) fn alternative(
    problem: &Problem,
    values: &[f64],
    rank: usize,
    fitness: f64,
    evaluator: &ConstraintEvaluator,
) -> Alternative {
    Alternative {
        rank,
        objective_values: named_objectives(problem, values),
        variable_values: named_variables(problem, values),
        fitness,
        constraint_violation: evaluator.total_violation(values, &problem.constraints),
        domination_count: 0,
        dominates: 0,
        crowding_distance: None,
    }
}

/// A solution carrying `values`, with violations and sensitivity attached.
pub(crate) fn assignment_solution(
    problem: &Problem,
    status: SolutionStatus,
    values: &[f64],
    evaluator: &ConstraintEvaluator,
    metadata: SolveMetadata,
) -> Solution {
    let mut solution = Solution::empty(problem.id.clone(), status);
    solution.objective_values = named_objectives(problem, values);
    solution.variable_values = named_variables(problem, values);
    solution.violations = evaluator.violations(values, &problem.constraints);
    solution.sensitivity = sensitivity::analyze(problem, values, evaluator);
    solution.metadata = metadata;
    solution
}

/// Metadata skeleton for a strategy run.
pub(crate) fn metadata(algorithm: Algorithm, seed: Option<u64>) -> SolveMetadata {
    SolveMetadata {
        algorithm: algorithm.to_string(),
        seed,
        ..SolveMetadata::default()
    }
}
