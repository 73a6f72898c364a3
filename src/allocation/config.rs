//! Allocation parameters.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Strategy-specific parameters of the allocation solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationParams {
    /// Allow demands to be partly unmet at `shortage_penalty` per unit
    /// instead of reporting the problem infeasible.
    pub allow_partial: bool,
    pub shortage_penalty: f64,
    /// Pivot budget. `None` uses the larger of `max_iterations` and
    /// `10 · (rows + columns)`.
    pub pivot_limit: Option<usize>,
}

impl Default for AllocationParams {
    fn default() -> Self {
        Self {
            allow_partial: false,
            shortage_penalty: 1e4,
            pivot_limit: None,
        }
    }
}

impl AllocationParams {
    pub fn with_partial(mut self, shortage_penalty: f64) -> Self {
        self.allow_partial = true;
        self.shortage_penalty = shortage_penalty;
        self
    }

    pub fn with_pivot_limit(mut self, limit: usize) -> Self {
        self.pivot_limit = Some(limit);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.shortage_penalty >= 0.0 && self.shortage_penalty.is_finite()) {
            return Err(ValidationError::InvalidParameters(
                "shortage_penalty must be finite and non-negative".into(),
            ));
        }
        if self.pivot_limit == Some(0) {
            return Err(ValidationError::InvalidParameters(
                "pivot_limit must be positive or None".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = AllocationParams::default();
        assert!(!p.allow_partial);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_rejects() {
        assert!(AllocationParams::default().with_partial(-1.0).validate().is_err());
        assert!(AllocationParams::default().with_pivot_limit(0).validate().is_err());
    }
}
