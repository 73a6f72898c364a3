//! Problem and solution data model.
//!
//! - [`Problem`]: objectives, constraints, variables and [`SolverParameters`]
//! - [`Solution`]: values, violations, convergence trace, alternatives and
//!   [`Sensitivity`]
//! - [`Expr`]: the closed expression language used by objectives and
//!   constraints
//!
//! Structural validation lives in [`validate`].

mod expr;
mod params;
mod problem;
mod solution;
pub mod validate;

pub use expr::Expr;
pub use params::{
    Algorithm, AlgorithmParams, ConvergenceCriterion, ConvergenceKind, SolverParameters,
};
pub use problem::{
    Constraint, ConstraintKind, Direction, Objective, Operator, Problem, ProblemId,
    ProblemStatus, Variable, VariableKind,
};
pub use solution::{
    Alternative, ConstraintSensitivity, ConvergencePoint, NamedValue, ObjectiveSensitivity,
    Sensitivity, Severity, Solution, SolutionId, SolutionStatus, SolveMetadata,
    VariableSensitivity, Violation, ViolationSubject,
};
