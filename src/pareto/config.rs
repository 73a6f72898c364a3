//! NSGA-II parameters.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Strategy-specific parameters of the Pareto solver.
///
/// Generations, convergence, seed and the parallel hint come from
/// [`SolverParameters`](crate::model::SolverParameters).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParetoParams {
    pub population_size: usize,
    pub crossover_rate: f64,
    /// Per-variable mutation probability.
    pub mutation_rate: f64,
    /// Crowded-comparison tournament size.
    pub tournament_size: usize,
    /// Gaussian standard deviation as a fraction of each variable's range.
    pub mutation_scale: f64,
}

impl Default for ParetoParams {
    fn default() -> Self {
        Self {
            population_size: 100,
            crossover_rate: 0.9,
            mutation_rate: 0.1,
            tournament_size: 2,
            mutation_scale: 0.1,
        }
    }
}

impl ParetoParams {
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

    pub fn with_tournament_size(mut self, k: usize) -> Self {
        self.tournament_size = k;
        self
    }

    pub fn with_mutation_scale(mut self, scale: f64) -> Self {
        self.mutation_scale = scale;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |msg: &str| Err(ValidationError::InvalidParameters(msg.into()));
        if self.population_size < 4 {
            return invalid("pareto population_size must be at least 4");
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) || !(0.0..=1.0).contains(&self.mutation_rate) {
            return invalid("crossover and mutation rates must lie in [0, 1]");
        }
        if self.tournament_size == 0 {
            return invalid("tournament_size must be at least 1");
        }
        if !(self.mutation_scale > 0.0 && self.mutation_scale.is_finite()) {
            return invalid("mutation_scale must be positive and finite");
        }
        Ok(())
    }
}
