//! TOML configuration for the engine.
//!
//! # Examples
//!
//! ```
//! use u_optimize::config::EngineConfig;
//! use u_optimize::model::Algorithm;
//!
//! let config = EngineConfig::from_toml_str(r#"
//!     max_time_limit_ms = 30000
//!
//!     [defaults]
//!     max_iterations = 200
//!     seed = 42
//!
//!     [defaults.algorithm]
//!     type = "genetic"
//!     population_size = 80
//! "#).unwrap();
//!
//! let params = config.parameters_for(Algorithm::Genetic);
//! assert_eq!(params.max_iterations, 200);
//! assert_eq!(params.seed, Some(42));
//! ```
//!
//! A missing file falls back to defaults:
//!
//! ```
//! use u_optimize::config::EngineConfig;
//!
//! let config = EngineConfig::load("does-not-exist.toml").unwrap_or_default();
//! assert!(config.results_dir.is_none());
//! ```

use crate::error::ConfigError;
use crate::model::{Algorithm, AlgorithmParams, SolverParameters};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Engine-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Template for new problems' solver parameters.
    pub defaults: SolverParameters,
    /// Upper bound on any problem's wall-clock limit. Problems without a
    /// limit get this one.
    pub max_time_limit_ms: Option<u64>,
    /// Persist results as JSON files in this directory.
    pub results_dir: Option<PathBuf>,
}

impl EngineConfig {
    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_defaults(mut self, defaults: SolverParameters) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_max_time_limit_ms(mut self, ms: u64) -> Self {
        self.max_time_limit_ms = Some(ms);
        self
    }

    pub fn with_results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.results_dir = Some(dir.into());
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.defaults
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.max_time_limit_ms == Some(0) {
            return Err(ConfigError::Invalid("max_time_limit_ms must be positive".into()));
        }
        Ok(())
    }

    /// The configured defaults with `algorithm` selected. Strategy
    /// parameters configured for that algorithm are kept; otherwise the
    /// strategy's own defaults apply.
    pub fn parameters_for(&self, algorithm: Algorithm) -> SolverParameters {
        let mut params = self.defaults.clone();
        if params.algorithm.algorithm() != algorithm {
            params.algorithm = AlgorithmParams::default_for(algorithm);
        }
        params
    }

    /// `params` with its time limit capped by `max_time_limit_ms`.
    pub fn clamp(&self, params: &SolverParameters) -> SolverParameters {
        let mut params = params.clone();
        if let Some(cap) = self.max_time_limit_ms {
            params.time_limit_ms = Some(params.time_limit_ms.map_or(cap, |ms| ms.min(cap)));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_strategy_params_from_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
            [defaults.algorithm]
            type = "backtracking"
            value_order = "descending"
            "#,
        )
        .unwrap();
        match config.parameters_for(Algorithm::Backtracking).algorithm {
            AlgorithmParams::Backtracking(p) => {
                assert_eq!(p.value_order, crate::backtracking::ValueOrder::Descending)
            }
            other => panic!("unexpected {other:?}"),
        }
        // Other strategies fall back to their defaults.
        assert_eq!(
            config.parameters_for(Algorithm::Routing).algorithm,
            AlgorithmParams::default_for(Algorithm::Routing)
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = EngineConfig::from_toml_str("[defaults]\nmax_iterations = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = EngineConfig::from_toml_str("max_time_limit_ms = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = EngineConfig::from_toml_str("defaults = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_clamp_time_limit() {
        let config = EngineConfig::default().with_max_time_limit_ms(1_000);
        let unlimited = SolverParameters::default();
        assert_eq!(config.clamp(&unlimited).time_limit_ms, Some(1_000));
        let short = SolverParameters::default().with_time_limit_ms(10);
        assert_eq!(config.clamp(&short).time_limit_ms, Some(10));
        assert_eq!(EngineConfig::default().clamp(&unlimited).time_limit_ms, None);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "results_dir = \"out\"\n[defaults]\nseed = 9").unwrap();
        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.results_dir, Some(PathBuf::from("out")));
        assert_eq!(config.defaults.seed, Some(9));
        assert!(matches!(
            EngineConfig::load(dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
