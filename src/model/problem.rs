//! Problem definition: objectives, constraints, variables.

use super::expr::Expr;
use super::params::SolverParameters;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Optimization direction of an objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Minimize,
    Maximize,
}

impl Direction {
    /// Multiplier that turns a value in this direction into a minimization value.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Minimize => 1.0,
            Direction::Maximize => -1.0,
        }
    }

    /// Whether `a` is strictly better than `b` in this direction.
    pub fn is_better(self, a: f64, b: f64) -> bool {
        match self {
            Direction::Minimize => a < b,
            Direction::Maximize => a > b,
        }
    }
}

/// One objective of a problem.
///
/// Generic strategies (backtracking, genetic, Pareto) require an
/// `expression`. Specialized solvers (routing, scheduling, allocation)
/// compute their objectives natively and match them by name; for those the
/// expression is absent (see [`Objective::metric`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub name: String,
    pub direction: Direction,
    pub expression: Option<Expr>,
    /// Weight in weighted-sum scalarisation. Must be non-negative.
    pub weight: f64,
    /// Tie-break ordering; lower value = considered first.
    pub priority: i32,
}

impl Objective {
    pub fn minimize(name: impl Into<String>, expression: Expr) -> Self {
        Self::new(name, Direction::Minimize, Some(expression))
    }

    pub fn maximize(name: impl Into<String>, expression: Expr) -> Self {
        Self::new(name, Direction::Maximize, Some(expression))
    }

    /// An objective computed by a specialized solver (e.g. `"total_distance"`).
    pub fn metric(name: impl Into<String>, direction: Direction) -> Self {
        Self::new(name, direction, None)
    }

    fn new(name: impl Into<String>, direction: Direction, expression: Option<Expr>) -> Self {
        Self {
            name: name.into(),
            direction,
            expression,
            weight: 1.0,
            priority: 0,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Evaluates the objective; metric objectives evaluate to `NaN`.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.expression
            .as_ref()
            .map_or(f64::NAN, |e| e.evaluate(values))
    }
}

/// Category of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Equality,
    Inequality,
    /// Bound on a single variable; used for domain reduction before search.
    Bound,
    Logical,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConstraintKind::Equality => "equality",
            ConstraintKind::Inequality => "inequality",
            ConstraintKind::Bound => "bound",
            ConstraintKind::Logical => "logical",
        };
        f.write_str(s)
    }
}

/// Comparison between a constraint's expression and its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Operator {
    /// Whether `lhs op rhs` holds exactly.
    pub fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Operator::Eq => lhs == rhs,
            Operator::Ne => lhs != rhs,
            Operator::Lt => lhs < rhs,
            Operator::Le => lhs <= rhs,
            Operator::Gt => lhs > rhs,
            Operator::Ge => lhs >= rhs,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
        };
        f.write_str(s)
    }
}

/// A constraint `expression operator target`, satisfied within `tolerance`.
///
/// The constraint's `name` is its identity in violation and sensitivity
/// reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    pub kind: ConstraintKind,
    pub expression: Expr,
    pub operator: Operator,
    pub target: f64,
    /// Falls back to the solver tolerance when absent.
    pub tolerance: Option<f64>,
}

impl Constraint {
    /// `expression == target`.
    pub fn equality(name: impl Into<String>, expression: Expr, target: f64) -> Self {
        Self::new(name, ConstraintKind::Equality, expression, Operator::Eq, target)
    }

    /// `expression op target` for an ordering operator.
    pub fn inequality(
        name: impl Into<String>,
        expression: Expr,
        operator: Operator,
        target: f64,
    ) -> Self {
        Self::new(name, ConstraintKind::Inequality, expression, operator, target)
    }

    /// `x[variable] op target`.
    pub fn bound(name: impl Into<String>, variable: usize, operator: Operator, target: f64) -> Self {
        Self::new(
            name,
            ConstraintKind::Bound,
            Expr::var(variable),
            operator,
            target,
        )
    }

    /// Holds when `expression` evaluates to true (non-zero).
    pub fn logical(name: impl Into<String>, expression: Expr) -> Self {
        Self::new(name, ConstraintKind::Logical, expression, Operator::Ne, 0.0)
    }

    fn new(
        name: impl Into<String>,
        kind: ConstraintKind,
        expression: Expr,
        operator: Operator,
        target: f64,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            expression,
            operator,
            target,
            tolerance: None,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }
}

/// Domain kind of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    Continuous,
    Integer,
    Binary,
    Categorical,
}

/// A decision variable.
///
/// Categorical variables are represented numerically by the index of the
/// chosen category in `categories`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub kind: VariableKind,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub categories: Vec<String>,
    pub initial: Option<f64>,
}

impl Variable {
    pub fn continuous(name: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self::numeric(name, VariableKind::Continuous, lower, upper)
    }

    pub fn integer(name: impl Into<String>, lower: i64, upper: i64) -> Self {
        Self::numeric(name, VariableKind::Integer, lower as f64, upper as f64)
    }

    pub fn binary(name: impl Into<String>) -> Self {
        Self::numeric(name, VariableKind::Binary, 0.0, 1.0)
    }

    pub fn categorical<S: Into<String>>(
        name: impl Into<String>,
        categories: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: VariableKind::Categorical,
            lower: None,
            upper: None,
            categories: categories.into_iter().map(Into::into).collect(),
            initial: None,
        }
    }

    fn numeric(name: impl Into<String>, kind: VariableKind, lower: f64, upper: f64) -> Self {
        Self {
            name: name.into(),
            kind,
            lower: Some(lower),
            upper: Some(upper),
            categories: Vec::new(),
            initial: None,
        }
    }

    pub fn with_initial(mut self, value: f64) -> Self {
        self.initial = Some(value);
        self
    }

    /// Effective numeric bounds `(lower, upper)`.
    ///
    /// Binary variables are `[0, 1]`; categorical variables span the
    /// category indices. Integer bounds are snapped inwards to whole
    /// numbers. Missing bounds are infinite.
    pub fn bounds(&self) -> (f64, f64) {
        let raw = (
            self.lower.unwrap_or(f64::NEG_INFINITY),
            self.upper.unwrap_or(f64::INFINITY),
        );
        match self.kind {
            VariableKind::Binary => (0.0, 1.0),
            VariableKind::Categorical => (0.0, self.categories.len().saturating_sub(1) as f64),
            VariableKind::Continuous => raw,
            VariableKind::Integer => (raw.0.ceil(), raw.1.floor()),
        }
    }

    /// Whether only whole numbers are admissible.
    pub fn is_discrete(&self) -> bool {
        !matches!(self.kind, VariableKind::Continuous)
    }

    /// Projects a raw value onto the variable's domain.
    pub fn repair(&self, value: f64) -> f64 {
        let (lo, hi) = self.bounds();
        let v = if self.is_discrete() { value.round() } else { value };
        v.clamp(lo, hi)
    }

    /// Whether `value` lies in the domain.
    pub fn contains(&self, value: f64) -> bool {
        let (lo, hi) = self.bounds();
        value >= lo && value <= hi && (!self.is_discrete() || value.fract() == 0.0)
    }

    /// Category label for a categorical value.
    pub fn category(&self, value: f64) -> Option<&str> {
        if self.kind != VariableKind::Categorical || value < 0.0 {
            return None;
        }
        self.categories.get(value as usize).map(String::as_str)
    }
}

/// Problem identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProblemId(pub String);

impl ProblemId {
    pub fn new() -> Self {
        ProblemId(Uuid::new_v4().to_string())
    }
}

impl Default for ProblemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProblemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProblemId {
    fn from(s: &str) -> Self {
        ProblemId(s.to_string())
    }
}

/// Lifecycle of a problem, recorded by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ProblemStatus {
    /// `pending → running → completed | failed`.
    pub fn can_transition_to(self, next: ProblemStatus) -> bool {
        matches!(
            (self, next),
            (ProblemStatus::Pending, ProblemStatus::Running)
                | (ProblemStatus::Running, ProblemStatus::Completed)
                | (ProblemStatus::Running, ProblemStatus::Failed)
        )
    }
}

/// An optimization problem.
///
/// # Examples
///
/// ```
/// use u_optimize::model::{Constraint, Objective, Operator, Problem, Variable};
///
/// let mut problem = Problem::new("min-x");
/// let x = problem.add_variable(Variable::continuous("x", 0.0, 10.0));
/// problem.add_objective(Objective::minimize("x", x));
/// problem.add_constraint(Constraint::inequality("x>=5", u_optimize::model::Expr::var(0), Operator::Ge, 5.0));
/// assert_eq!(problem.variable_index("x"), Some(0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub id: ProblemId,
    pub name: String,
    pub objectives: Vec<Objective>,
    pub constraints: Vec<Constraint>,
    pub variables: Vec<Variable>,
    pub parameters: SolverParameters,
    pub status: ProblemStatus,
}

impl Problem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ProblemId::new(),
            name: name.into(),
            objectives: Vec::new(),
            constraints: Vec::new(),
            variables: Vec::new(),
            parameters: SolverParameters::default(),
            status: ProblemStatus::Pending,
        }
    }

    pub fn with_id(mut self, id: impl Into<ProblemId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_parameters(mut self, parameters: SolverParameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Adds a variable and returns an expression referring to it.
    pub fn add_variable(&mut self, variable: Variable) -> Expr {
        self.variables.push(variable);
        Expr::var(self.variables.len() - 1)
    }

    pub fn add_objective(&mut self, objective: Objective) {
        self.objectives.push(objective);
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v.name == name)
    }

    /// Records a lifecycle transition; returns `false` if it is not allowed.
    pub fn transition(&mut self, next: ProblemStatus) -> bool {
        if self.status.can_transition_to(next) {
            self.status = next;
            true
        } else {
            false
        }
    }

    /// Whether every objective is maximized (used to report fitness in the
    /// caller's direction).
    pub fn all_maximize(&self) -> bool {
        !self.objectives.is_empty()
            && self
                .objectives
                .iter()
                .all(|o| o.direction == Direction::Maximize)
    }
}

impl From<String> for ProblemId {
    fn from(s: String) -> Self {
        ProblemId(s)
    }
}
