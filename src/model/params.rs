//! Solver parameters.
//!
//! Parameters common to every strategy live in [`SolverParameters`];
//! strategy-specific settings are carried by the [`AlgorithmParams`] tagged
//! union, whose variant also selects the strategy.

use crate::allocation::AllocationParams;
use crate::backtracking::BacktrackingParams;
use crate::error::ValidationError;
use crate::genetic::GeneticParams;
use crate::pareto::ParetoParams;
use crate::routing::RoutingParams;
use crate::scheduling::SchedulingParams;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    Backtracking,
    Genetic,
    Pareto,
    LinearProgramming,
    Routing,
    Scheduling,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Algorithm::Backtracking => "backtracking",
            Algorithm::Genetic => "genetic",
            Algorithm::Pareto => "pareto",
            Algorithm::LinearProgramming => "linear_programming",
            Algorithm::Routing => "routing",
            Algorithm::Scheduling => "scheduling",
        };
        f.write_str(s)
    }
}

/// Strategy-specific parameters, one variant per strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlgorithmParams {
    Backtracking(BacktrackingParams),
    Genetic(GeneticParams),
    Pareto(ParetoParams),
    LinearProgramming(AllocationParams),
    Routing(RoutingParams),
    Scheduling(SchedulingParams),
}

impl AlgorithmParams {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            AlgorithmParams::Backtracking(_) => Algorithm::Backtracking,
            AlgorithmParams::Genetic(_) => Algorithm::Genetic,
            AlgorithmParams::Pareto(_) => Algorithm::Pareto,
            AlgorithmParams::LinearProgramming(_) => Algorithm::LinearProgramming,
            AlgorithmParams::Routing(_) => Algorithm::Routing,
            AlgorithmParams::Scheduling(_) => Algorithm::Scheduling,
        }
    }

    /// Default parameters for a strategy.
    pub fn default_for(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Backtracking => AlgorithmParams::Backtracking(Default::default()),
            Algorithm::Genetic => AlgorithmParams::Genetic(Default::default()),
            Algorithm::Pareto => AlgorithmParams::Pareto(Default::default()),
            Algorithm::LinearProgramming => AlgorithmParams::LinearProgramming(Default::default()),
            Algorithm::Routing => AlgorithmParams::Routing(Default::default()),
            Algorithm::Scheduling => AlgorithmParams::Scheduling(Default::default()),
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            AlgorithmParams::Backtracking(p) => p.validate(),
            AlgorithmParams::Genetic(p) => p.validate(),
            AlgorithmParams::Pareto(p) => p.validate(),
            AlgorithmParams::LinearProgramming(p) => p.validate(),
            AlgorithmParams::Routing(p) => p.validate(),
            AlgorithmParams::Scheduling(p) => p.validate(),
        }
    }
}

impl Default for AlgorithmParams {
    fn default() -> Self {
        AlgorithmParams::Genetic(GeneticParams::default())
    }
}

/// How the change in best fitness is measured for convergence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceKind {
    /// `|best[t] - best[t-N]| < threshold`.
    #[default]
    Absolute,
    /// `|best[t] - best[t-N]| / max(|best[t-N]|, 1e-12) < threshold`.
    Relative,
}

/// Early-stopping rule: stop once the best fitness changed by less than
/// `threshold` over the last `window` consecutive iterations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergenceCriterion {
    pub kind: ConvergenceKind,
    pub threshold: f64,
    /// Number of consecutive stable iterations required. `0` disables the rule.
    pub window: usize,
}

impl Default for ConvergenceCriterion {
    fn default() -> Self {
        Self {
            kind: ConvergenceKind::Absolute,
            threshold: 1e-9,
            window: 50,
        }
    }
}

impl ConvergenceCriterion {
    pub fn new(kind: ConvergenceKind, threshold: f64, window: usize) -> Self {
        Self {
            kind,
            threshold,
            window,
        }
    }

    pub fn disabled() -> Self {
        Self {
            window: 0,
            ..Self::default()
        }
    }

    /// Whether the history of best values (one per iteration, oldest first)
    /// has converged under this rule.
    pub fn is_converged(&self, history: &[f64]) -> bool {
        if self.window == 0 || history.len() <= self.window {
            return false;
        }
        let now = history[history.len() - 1];
        let then = history[history.len() - 1 - self.window];
        let change = (now - then).abs();
        let change = match self.kind {
            ConvergenceKind::Absolute => change,
            ConvergenceKind::Relative => change / then.abs().max(1e-12),
        };
        change < self.threshold
    }
}

/// Parameters shared by all strategies plus the strategy selector.
///
/// # Examples
///
/// ```
/// use u_optimize::model::{Algorithm, AlgorithmParams, SolverParameters};
/// use u_optimize::genetic::GeneticParams;
///
/// let params = SolverParameters::default()
///     .with_algorithm(AlgorithmParams::Genetic(GeneticParams::default().with_population_size(40)))
///     .with_max_iterations(200)
///     .with_seed(7);
/// assert_eq!(params.algorithm.algorithm(), Algorithm::Genetic);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverParameters {
    pub algorithm: AlgorithmParams,
    /// Iteration budget (generations, search nodes, pivots or local-search
    /// passes, depending on the strategy).
    pub max_iterations: usize,
    /// Numeric tolerance for constraint satisfaction.
    pub tolerance: f64,
    /// Cooperative wall-clock limit, checked at iteration boundaries.
    pub time_limit_ms: Option<u64>,
    pub convergence: ConvergenceCriterion,
    /// Advisory: evaluate fitness on the rayon pool.
    pub parallel: bool,
    /// Seed for every stochastic step. `None` draws a random seed.
    pub seed: Option<u64>,
}

impl Default for SolverParameters {
    fn default() -> Self {
        Self {
            algorithm: AlgorithmParams::default(),
            max_iterations: 500,
            tolerance: 1e-6,
            time_limit_ms: None,
            convergence: ConvergenceCriterion::default(),
            parallel: false,
            seed: None,
        }
    }
}

impl SolverParameters {
    /// Default shared parameters with the given strategy's defaults.
    pub fn for_algorithm(algorithm: Algorithm) -> Self {
        Self {
            algorithm: AlgorithmParams::default_for(algorithm),
            ..Self::default()
        }
    }

    pub fn with_algorithm(mut self, algorithm: AlgorithmParams) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    pub fn with_convergence(mut self, convergence: ConvergenceCriterion) -> Self {
        self.convergence = convergence;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |msg: &str| Err(ValidationError::InvalidParameters(msg.into()));
        if self.max_iterations == 0 {
            return invalid("max_iterations must be at least 1");
        }
        if !(self.tolerance >= 0.0 && self.tolerance.is_finite()) {
            return invalid("tolerance must be finite and non-negative");
        }
        if self.time_limit_ms == Some(0) {
            return invalid("time_limit_ms must be positive or None");
        }
        if !(self.convergence.threshold >= 0.0) {
            return invalid("convergence threshold must be non-negative");
        }
        self.algorithm.validate()
    }
}
