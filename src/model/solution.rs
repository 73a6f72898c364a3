//! Solution data: values, violations, metadata, alternatives, sensitivity.

use super::problem::ProblemId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Terminal status of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolutionStatus {
    /// Proven optimal (for the search space the strategy explores).
    Optimal,
    /// Satisfies every constraint; optimality not proven.
    Feasible,
    /// No assignment satisfying all constraints was found.
    Infeasible,
    /// The objective can be improved without limit.
    Unbounded,
    /// Wall-clock budget reached; best-so-far attached.
    TimeLimit,
    /// Iteration budget reached; best-so-far attached.
    IterationLimit,
    /// Cancelled before the first full iteration completed; no values attached.
    Cancelled,
}

impl SolutionStatus {
    /// Whether the attached values satisfy every hard constraint.
    pub fn is_success(self) -> bool {
        matches!(self, SolutionStatus::Optimal | SolutionStatus::Feasible)
    }
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolutionStatus::Optimal => "optimal",
            SolutionStatus::Feasible => "feasible",
            SolutionStatus::Infeasible => "infeasible",
            SolutionStatus::Unbounded => "unbounded",
            SolutionStatus::TimeLimit => "time_limit",
            SolutionStatus::IterationLimit => "iteration_limit",
            SolutionStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Severity of a constraint violation, graded by magnitude relative to the
/// constraint's scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Grades `magnitude` against `scale` (`|target|`, at least 1).
    ///
    /// | ratio | severity |
    /// |---|---|
    /// | < 1% | Low |
    /// | < 10% | Medium |
    /// | < 50% | High |
    /// | otherwise | Critical |
    pub fn grade(magnitude: f64, scale: f64) -> Self {
        let ratio = magnitude / scale.abs().max(1.0);
        if ratio < 0.01 {
            Severity::Low
        } else if ratio < 0.1 {
            Severity::Medium
        } else if ratio < 0.5 {
            Severity::High
        } else {
            Severity::Critical
        }
    }
}

/// What a violation is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum ViolationSubject {
    /// The constraint as a whole.
    Constraint,
    Task(String),
    Location(String),
    Vehicle(String),
    Resource(String),
}

/// A violated constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Name of the violated constraint.
    pub constraint: String,
    pub subject: ViolationSubject,
    pub magnitude: f64,
    pub severity: Severity,
}

impl Violation {
    pub fn new(constraint: impl Into<String>, magnitude: f64, severity: Severity) -> Self {
        Self {
            constraint: constraint.into(),
            subject: ViolationSubject::Constraint,
            magnitude,
            severity,
        }
    }

    pub fn with_subject(mut self, subject: ViolationSubject) -> Self {
        self.subject = subject;
        self
    }
}

/// One convergence sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergencePoint {
    pub iteration: usize,
    /// Best scalar fitness so far, in the problem's direction (ascending when
    /// every objective maximizes, descending otherwise).
    pub best_fitness: f64,
    /// Weighted objective of the best individual, without penalties.
    pub best_objective: f64,
    /// Total constraint violation of the best individual.
    pub constraint_violation: f64,
}

/// Bookkeeping about the run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SolveMetadata {
    pub algorithm: String,
    pub iterations: usize,
    pub runtime_ms: f64,
    pub converged: bool,
    pub cancelled: bool,
    pub seed: Option<u64>,
    pub trace: Vec<ConvergencePoint>,
}

/// A named numeric value (objective or variable).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedValue {
    pub name: String,
    pub value: f64,
    /// Category label for categorical variables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl NamedValue {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            label: None,
        }
    }

    pub fn labelled(name: impl Into<String>, value: f64, label: Option<String>) -> Self {
        Self {
            name: name.into(),
            value,
            label,
        }
    }
}

/// A ranked alternative to the primary solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    /// 0 = best.
    pub rank: usize,
    pub objective_values: Vec<NamedValue>,
    pub variable_values: Vec<NamedValue>,
    /// Score the alternatives are ranked by (lower is better): the penalised
    /// weighted sum for the genetic solver, the weighted distance to the
    /// ideal point for the Pareto solver.
    pub fitness: f64,
    pub constraint_violation: f64,
    /// Number of other candidates in the compared set that dominate this
    /// one. Always 0 for members of a Pareto front.
    pub domination_count: usize,
    /// Number of candidates in the compared set this one dominates.
    #[serde(default)]
    pub dominates: usize,
    /// Isolation within its front; `None` when not computed.
    pub crowding_distance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveSensitivity {
    pub name: String,
    /// Change of the weighted scalar objective per unit change of this
    /// objective's weight.
    pub shadow_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSensitivity {
    pub name: String,
    /// Distance to the bound; negative when violated.
    pub slack: f64,
    /// Objective change per unit increase of the constraint's target.
    pub shadow_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSensitivity {
    pub name: String,
    pub reduced_cost: f64,
}

/// Sensitivity data accompanying a solution.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sensitivity {
    pub objectives: Vec<ObjectiveSensitivity>,
    pub constraints: Vec<ConstraintSensitivity>,
    pub variables: Vec<VariableSensitivity>,
}

impl Sensitivity {
    pub fn constraint(&self, name: &str) -> Option<&ConstraintSensitivity> {
        self.constraints.iter().find(|c| c.name == name)
    }

    pub fn variable(&self, name: &str) -> Option<&VariableSensitivity> {
        self.variables.iter().find(|v| v.name == name)
    }
}

/// Solution identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SolutionId(pub String);

impl SolutionId {
    pub fn new() -> Self {
        SolutionId(Uuid::new_v4().to_string())
    }
}

impl Default for SolutionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one solve. Created once; not mutated after it is returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub id: SolutionId,
    pub problem_id: ProblemId,
    pub status: SolutionStatus,
    pub objective_values: Vec<NamedValue>,
    pub variable_values: Vec<NamedValue>,
    pub violations: Vec<Violation>,
    pub metadata: SolveMetadata,
    pub alternatives: Vec<Alternative>,
    pub sensitivity: Sensitivity,
}

impl Solution {
    /// An empty solution with the given status.
    pub fn empty(problem_id: ProblemId, status: SolutionStatus) -> Self {
        Self {
            id: SolutionId::new(),
            problem_id,
            status,
            objective_values: Vec::new(),
            variable_values: Vec::new(),
            violations: Vec::new(),
            metadata: SolveMetadata::default(),
            alternatives: Vec::new(),
            sensitivity: Sensitivity::default(),
        }
    }

    pub fn objective(&self, name: &str) -> Option<f64> {
        self.objective_values
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.value)
    }

    pub fn variable(&self, name: &str) -> Option<f64> {
        self.variable_values
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.value)
    }

    pub fn is_feasible(&self) -> bool {
        self.violations.is_empty() && !self.variable_values.is_empty()
    }

    /// Compares everything a seeded run determines (values, status, trace,
    /// alternatives, sensitivity), ignoring identity and wall-clock time.
    pub fn same_outcome(&self, other: &Solution) -> bool {
        self.status == other.status
            && self.objective_values == other.objective_values
            && self.variable_values == other.variable_values
            && self.violations == other.violations
            && self.metadata.iterations == other.metadata.iterations
            && self.metadata.trace == other.metadata.trace
            && self.alternatives == other.alternatives
            && self.sensitivity == other.sensitivity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_grade() {
        assert_eq!(Severity::grade(0.001, 1.0), Severity::Low);
        assert_eq!(Severity::grade(0.5, 10.0), Severity::Medium);
        assert_eq!(Severity::grade(3.0, 10.0), Severity::High);
        assert_eq!(Severity::grade(20.0, 10.0), Severity::Critical);
        // Scale below 1 is treated as 1.
        assert_eq!(Severity::grade(0.05, 0.0), Severity::Medium);
    }

    #[test]
    fn test_status_success() {
        assert!(SolutionStatus::Optimal.is_success());
        assert!(SolutionStatus::Feasible.is_success());
        assert!(!SolutionStatus::IterationLimit.is_success());
        assert!(!SolutionStatus::Cancelled.is_success());
    }

    #[test]
    fn test_lookup() {
        let mut s = Solution::empty(ProblemId::from("p"), SolutionStatus::Feasible);
        s.objective_values.push(NamedValue::new("cost", 3.0));
        s.variable_values.push(NamedValue::new("x", 1.5));
        assert_eq!(s.objective("cost"), Some(3.0));
        assert_eq!(s.variable("x"), Some(1.5));
        assert_eq!(s.variable("y"), None);
        assert!(s.is_feasible());
    }

    #[test]
    fn test_same_outcome_ignores_identity() {
        let a = Solution::empty(ProblemId::from("p"), SolutionStatus::Feasible);
        let mut b = a.clone();
        b.id = SolutionId::new();
        b.metadata.runtime_ms = 99.0;
        assert!(a.same_outcome(&b));
        b.status = SolutionStatus::Infeasible;
        assert!(!a.same_outcome(&b));
    }

    #[test]
    fn test_json_roundtrip_keeps_every_field() {
        let mut s = Solution::empty(ProblemId::from("p"), SolutionStatus::TimeLimit);
        s.objective_values.push(NamedValue::new("f", 1.0));
        s.variable_values
            .push(NamedValue::labelled("color", 1.0, Some("green".into())));
        s.violations.push(
            Violation::new("cap", 2.0, Severity::High)
                .with_subject(ViolationSubject::Task("t1".into())),
        );
        s.metadata.trace.push(ConvergencePoint {
            iteration: 1,
            best_fitness: 1.0,
            best_objective: 1.0,
            constraint_violation: 0.0,
        });
        s.alternatives.push(Alternative {
            rank: 0,
            objective_values: vec![NamedValue::new("f", 1.0)],
            variable_values: vec![],
            fitness: 1.0,
            constraint_violation: 0.0,
            domination_count: 0,
            dominates: 2,
            crowding_distance: Some(0.5),
        });
        s.sensitivity.constraints.push(ConstraintSensitivity {
            name: "cap".into(),
            slack: 0.0,
            shadow_price: -1.0,
        });

        let json = serde_json::to_string(&s).expect("serialize");
        let back: Solution = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(s, back);
    }
}
