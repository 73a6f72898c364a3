//! Routing solver parameters.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Strategy-specific parameters of the routing solver.
///
/// Construction always runs Clarke-Wright savings; the flags below switch
/// the improvement moves applied afterwards. The pass budget is
/// `SolverParameters::max_iterations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingParams {
    /// Run local search after construction.
    pub local_search: bool,
    /// Move one customer to another position or vehicle.
    pub relocate: bool,
    /// Reverse a segment within a route.
    pub two_opt: bool,
    /// Exchange route tails between two vehicles.
    pub two_opt_star: bool,
    /// Score added per time unit a visit starts outside its preferred
    /// windows.
    pub preferred_window_penalty: f64,
}

impl Default for RoutingParams {
    fn default() -> Self {
        Self {
            local_search: true,
            relocate: true,
            two_opt: true,
            two_opt_star: true,
            preferred_window_penalty: 1.0,
        }
    }
}

impl RoutingParams {
    pub fn with_local_search(mut self, enabled: bool) -> Self {
        self.local_search = enabled;
        self
    }

    /// Enables or disables the individual moves.
    pub fn with_moves(mut self, relocate: bool, two_opt: bool, two_opt_star: bool) -> Self {
        self.relocate = relocate;
        self.two_opt = two_opt;
        self.two_opt_star = two_opt_star;
        self
    }

    pub fn with_preferred_window_penalty(mut self, penalty: f64) -> Self {
        self.preferred_window_penalty = penalty;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.preferred_window_penalty >= 0.0) || !self.preferred_window_penalty.is_finite() {
            return Err(ValidationError::InvalidParameters(format!(
                "preferred_window_penalty must be finite and non-negative, got {}",
                self.preferred_window_penalty
            )));
        }
        Ok(())
    }
}
