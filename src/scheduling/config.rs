//! Scheduling search parameters.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Strategy-specific parameters of the scheduling solver.
///
/// The node budget is `SolverParameters::max_iterations`.
///
/// # Examples
///
/// ```
/// use u_optimize::scheduling::SchedulingParams;
///
/// let params = SchedulingParams::first_feasible();
/// assert!(!params.exhaustive);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingParams {
    /// Keep branching after the first complete schedule, pruning partial
    /// schedules that cannot beat the incumbent.
    pub exhaustive: bool,
    /// Score added per time unit a task runs outside its preferred windows.
    pub preferred_window_penalty: f64,
    /// Score added per time unit of difference between the busiest and the
    /// idlest resource.
    pub balance_weight: f64,
}

impl Default for SchedulingParams {
    fn default() -> Self {
        Self {
            exhaustive: true,
            preferred_window_penalty: 1.0,
            balance_weight: 0.0,
        }
    }
}

impl SchedulingParams {
    /// Stops at the first complete schedule (priority-guided greedy dive).
    pub fn first_feasible() -> Self {
        Self {
            exhaustive: false,
            ..Self::default()
        }
    }

    pub fn with_exhaustive(mut self, exhaustive: bool) -> Self {
        self.exhaustive = exhaustive;
        self
    }

    pub fn with_preferred_window_penalty(mut self, penalty: f64) -> Self {
        self.preferred_window_penalty = penalty;
        self
    }

    pub fn with_balance_weight(mut self, weight: f64) -> Self {
        self.balance_weight = weight;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (name, v) in [
            ("preferred_window_penalty", self.preferred_window_penalty),
            ("balance_weight", self.balance_weight),
        ] {
            if !(v >= 0.0) || !v.is_finite() {
                return Err(ValidationError::InvalidParameters(format!(
                    "{name} must be finite and non-negative, got {v}"
                )));
            }
        }
        Ok(())
    }
}
