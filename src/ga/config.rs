//! GA configuration.
//!
//! [`GaConfig`] holds all parameters that control the evolutionary loop.

use super::selection::Selection;
use crate::error::ValidationError;
use crate::model::ConvergenceCriterion;

/// Configuration for the genetic algorithm loop.
///
/// # Defaults
///
/// ```
/// use u_optimize::ga::GaConfig;
///
/// let config = GaConfig::default();
/// assert_eq!(config.population_size, 100);
/// assert_eq!(config.max_generations, 500);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_optimize::ga::{GaConfig, Selection};
///
/// let config = GaConfig::default()
///     .with_population_size(200)
///     .with_selection(Selection::Tournament(5))
///     .with_elite_ratio(0.1)
///     .with_mutation_rate(0.1);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GaConfig {
    /// Number of individuals in the population. Typical range: 50–500.
    pub population_size: usize,

    pub max_generations: usize,

    pub selection: Selection,

    /// Fraction of the population copied unchanged into the next generation.
    ///
    /// At least one elite is always kept, so the best-so-far individual is
    /// never lost.
    pub elite_ratio: f64,

    /// Probability of recombining a selected parent pair. Pairs that are not
    /// recombined are copied.
    pub crossover_rate: f64,

    /// Per-gene mutation probability, passed to [`GaProblem::mutate`](super::GaProblem::mutate).
    pub mutation_rate: f64,

    /// Early stop on a flat best-fitness history.
    pub convergence: ConvergenceCriterion,

    /// Evaluate fitness on the rayon pool.
    pub parallel: bool,

    /// `None` draws a random seed.
    pub seed: Option<u64>,

    /// Wall-clock limit, checked at the start of each generation. The run may
    /// overrun by one generation.
    pub time_limit_ms: Option<u64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 500,
            selection: Selection::default(),
            elite_ratio: 0.1,
            crossover_rate: 0.9,
            mutation_rate: 0.1,
            convergence: ConvergenceCriterion::default(),
            parallel: false,
            seed: None,
            time_limit_ms: None,
        }
    }
}

impl GaConfig {
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    pub fn with_selection(mut self, sel: Selection) -> Self {
        self.selection = sel;
        self
    }

    /// Equivalent to `.with_selection(Selection::Tournament(k))`.
    pub fn with_tournament_size(self, k: usize) -> Self {
        self.with_selection(Selection::Tournament(k))
    }

    /// Sets the elite ratio, clamped to `[0, 1]`.
    pub fn with_elite_ratio(mut self, ratio: f64) -> Self {
        self.elite_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Sets the crossover rate, clamped to `[0, 1]`.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the mutation rate, clamped to `[0, 1]`.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
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

    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Number of elites carried over each generation (at least 1).
    pub fn elite_count(&self) -> usize {
        ((self.population_size as f64 * self.elite_ratio) as usize).max(1)
    }

    /// Small population, few generations, 10 s limit.
    pub fn fast() -> Self {
        Self {
            population_size: 50,
            max_generations: 100,
            convergence: ConvergenceCriterion::new(Default::default(), 1e-6, 20),
            time_limit_ms: Some(10_000),
            ..Self::default()
        }
    }

    /// Moderate population and generations, 30 s limit.
    pub fn balanced() -> Self {
        Self {
            population_size: 100,
            max_generations: 300,
            convergence: ConvergenceCriterion::new(Default::default(), 1e-6, 50),
            time_limit_ms: Some(30_000),
            ..Self::default()
        }
    }

    /// Large population, many generations, 60 s limit.
    pub fn quality() -> Self {
        Self {
            population_size: 150,
            max_generations: 500,
            convergence: ConvergenceCriterion::new(Default::default(), 1e-9, 80),
            time_limit_ms: Some(60_000),
            ..Self::default()
        }
    }

    /// Picks a preset from the number of decision variables.
    ///
    /// - `< 50` → [`fast`](Self::fast)
    /// - `50..200` → [`balanced`](Self::balanced)
    /// - `≥ 200` → [`quality`](Self::quality)
    pub fn auto_select(variable_count: usize) -> Self {
        if variable_count < 50 {
            Self::fast()
        } else if variable_count < 200 {
            Self::balanced()
        } else {
            Self::quality()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |msg: &str| Err(ValidationError::InvalidParameters(msg.into()));
        if self.population_size < 2 {
            return invalid("population_size must be at least 2");
        }
        if self.max_generations == 0 {
            return invalid("max_generations must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.elite_ratio)
            || !(0.0..=1.0).contains(&self.crossover_rate)
            || !(0.0..=1.0).contains(&self.mutation_rate)
        {
            return invalid("elite, crossover and mutation rates must lie in [0, 1]");
        }
        if self.elite_count() >= self.population_size {
            return invalid("elite_ratio too high: elites fill entire population");
        }
        if let Selection::Tournament(0) = self.selection {
            return invalid("tournament size must be at least 1");
        }
        if !(self.convergence.threshold >= 0.0) {
            return invalid("convergence threshold must be non-negative");
        }
        if self.time_limit_ms == Some(0) {
            return invalid("time_limit_ms must be positive or None");
        }
        Ok(())
    }
}
