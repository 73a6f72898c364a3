//! Backtracking search parameters.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Order in which the values of a variable's domain are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueOrder {
    #[default]
    Ascending,
    Descending,
    /// Shuffled at every node with the solver's seeded RNG.
    Random,
}

/// Strategy-specific parameters of the backtracking solver.
///
/// The node budget is `SolverParameters::max_iterations`.
///
/// # Examples
///
/// ```
/// use u_optimize::backtracking::{BacktrackingParams, ValueOrder};
///
/// let params = BacktrackingParams::default()
///     .with_value_order(ValueOrder::Descending)
///     .with_exhaustive(true);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktrackingParams {
    pub value_order: ValueOrder,
    /// Number of intervals a continuous domain is split into
    /// (`continuous_steps + 1` candidate values, both bounds included).
    pub continuous_steps: usize,
    /// Discrete domains larger than this are sampled like continuous ones.
    pub max_domain_size: usize,
    /// Keep searching after the first feasible assignment and return the
    /// best objective over the discretised space.
    pub exhaustive: bool,
}

impl Default for BacktrackingParams {
    fn default() -> Self {
        Self {
            value_order: ValueOrder::Ascending,
            continuous_steps: 100,
            max_domain_size: 10_000,
            exhaustive: false,
        }
    }
}

impl BacktrackingParams {
    pub fn with_value_order(mut self, order: ValueOrder) -> Self {
        self.value_order = order;
        self
    }

    pub fn with_continuous_steps(mut self, steps: usize) -> Self {
        self.continuous_steps = steps;
        self
    }

    pub fn with_max_domain_size(mut self, size: usize) -> Self {
        self.max_domain_size = size;
        self
    }

    pub fn with_exhaustive(mut self, exhaustive: bool) -> Self {
        self.exhaustive = exhaustive;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.continuous_steps == 0 {
            return Err(ValidationError::InvalidParameters(
                "continuous_steps must be at least 1".into(),
            ));
        }
        if self.max_domain_size < 2 {
            return Err(ValidationError::InvalidParameters(
                "max_domain_size must be at least 2".into(),
            ));
        }
        Ok(())
    }
}
