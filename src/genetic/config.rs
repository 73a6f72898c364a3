//! Genetic algorithm parameters.

use crate::error::ValidationError;
use crate::ga::{GaConfig, Selection};
use crate::model::SolverParameters;
use serde::{Deserialize, Serialize};

/// Strategy-specific parameters of the genetic solver.
///
/// The iteration budget, convergence rule, seed, tolerance and parallel hint
/// come from [`SolverParameters`].
///
/// ```
/// use u_optimize::genetic::GeneticParams;
///
/// let params = GeneticParams::default()
///     .with_population_size(60)
///     .with_tournament_size(4)
///     .with_penalty_weight(1e4);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticParams {
    pub population_size: usize,
    /// Probability of single-point crossover per parent pair.
    pub crossover_rate: f64,
    /// Per-variable mutation probability.
    pub mutation_rate: f64,
    /// Fraction of the population carried over unchanged (at least one).
    pub elitism_rate: f64,
    pub selection: Selection,
    /// Fitness penalty per unit of total constraint violation.
    pub penalty_weight: f64,
    /// Gaussian mutation standard deviation as a fraction of each variable's
    /// range. Discrete variables use at least 1.
    pub mutation_scale: f64,
    /// Maximum number of distinct alternatives reported.
    pub alternatives: usize,
}

impl Default for GeneticParams {
    fn default() -> Self {
        Self {
            population_size: 100,
            crossover_rate: 0.8,
            mutation_rate: 0.1,
            elitism_rate: 0.1,
            selection: Selection::Tournament(3),
            penalty_weight: 1e6,
            mutation_scale: 0.1,
            alternatives: 5,
        }
    }
}

impl GeneticParams {
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate;
        self
    }

    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    pub fn with_elitism_rate(mut self, rate: f64) -> Self {
        self.elitism_rate = rate;
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_tournament_size(self, k: usize) -> Self {
        self.with_selection(Selection::Tournament(k))
    }

    pub fn with_penalty_weight(mut self, weight: f64) -> Self {
        self.penalty_weight = weight;
        self
    }

    pub fn with_mutation_scale(mut self, scale: f64) -> Self {
        self.mutation_scale = scale;
        self
    }

    pub fn with_alternatives(mut self, k: usize) -> Self {
        self.alternatives = k;
        self
    }

    /// Population size from the [`GaConfig::auto_select`] preset for the
    /// given number of variables.
    pub fn auto_select(variable_count: usize) -> Self {
        Self {
            population_size: GaConfig::auto_select(variable_count).population_size,
            ..Self::default()
        }
    }

    /// Loop configuration for a run under `solver`.
    pub fn ga_config(&self, solver: &SolverParameters) -> GaConfig {
        GaConfig {
            population_size: self.population_size,
            max_generations: solver.max_iterations,
            selection: self.selection,
            elite_ratio: self.elitism_rate,
            crossover_rate: self.crossover_rate,
            mutation_rate: self.mutation_rate,
            convergence: solver.convergence,
            parallel: solver.parallel,
            seed: solver.seed,
            time_limit_ms: solver.time_limit_ms,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |msg: &str| Err(ValidationError::InvalidParameters(msg.into()));
        if !(self.penalty_weight > 0.0 && self.penalty_weight.is_finite()) {
            return invalid("penalty_weight must be positive and finite");
        }
        if !(self.mutation_scale > 0.0 && self.mutation_scale.is_finite()) {
            return invalid("mutation_scale must be positive and finite");
        }
        self.ga_config(&SolverParameters::default()).validate()
    }
}
