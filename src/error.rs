//! Error types.
//!
//! Only structural problems are errors. Infeasibility, budget exhaustion and
//! cancellation are reported through [`SolutionStatus`](crate::SolutionStatus).

use thiserror::Error;

/// A malformed problem or parameter set, detected before any solver runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("problem has no objectives")]
    NoObjectives,

    #[error("objective '{0}' has no expression")]
    MissingExpression(String),

    #[error("objective '{objective}' has negative weight {weight}")]
    NegativeWeight { objective: String, weight: f64 },

    #[error("problem has no variables")]
    NoVariables,

    #[error("duplicate variable name: {0}")]
    DuplicateVariable(String),

    #[error("variable '{variable}' has inverted bounds [{lower}, {upper}]")]
    InvertedBounds {
        variable: String,
        lower: f64,
        upper: f64,
    },

    #[error("variable '{0}' needs finite bounds for this strategy")]
    UnboundedVariable(String),

    #[error("categorical variable '{0}' has an empty category set")]
    EmptyCategories(String),

    #[error("initial value of variable '{0}' is outside its domain")]
    InitialValueOutOfDomain(String),

    #[error("'{owner}' references variable index {index}, problem has {count}")]
    DanglingReference {
        owner: String,
        index: usize,
        count: usize,
    },

    #[error("constraint '{constraint}': operator {operator} is not valid for kind {kind}")]
    OperatorMismatch {
        constraint: String,
        kind: String,
        operator: String,
    },

    #[error("bound constraint '{0}' must be over a single variable")]
    BoundNotOnVariable(String),

    #[error("constraint '{constraint}' has negative tolerance {tolerance}")]
    NegativeTolerance { constraint: String, tolerance: f64 },

    #[error("constraint '{constraint}' has non-finite target {target}")]
    NonFiniteTarget { constraint: String, target: f64 },

    #[error("invalid solver parameters: {0}")]
    InvalidParameters(String),

    #[error("strategy {strategy} cannot solve this problem: {reason}")]
    AlgorithmMismatch { strategy: String, reason: String },

    #[error("task '{task}' has non-positive duration {duration}")]
    InvalidTaskDuration { task: String, duration: i64 },

    #[error("duplicate id '{0}'")]
    DuplicateId(String),

    #[error("task '{task}' depends on unknown task '{dependency}'")]
    UnknownDependency { task: String, dependency: String },

    #[error("'{owner}' has negative capacity {capacity}")]
    NegativeCapacity { owner: String, capacity: f64 },

    #[error("demand '{demand}' references unknown location '{location}'")]
    UnknownLocation { demand: String, location: String },

    #[error("{matrix} matrix must be {expected}x{expected}, got {rows} rows (or a ragged row)")]
    MatrixShape {
        matrix: String,
        expected: usize,
        rows: usize,
    },

    #[error("'{0}' is empty")]
    Empty(String),
}

/// Failure of a [`ResultStore`](crate::store::ResultStore) operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Configuration loading error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
