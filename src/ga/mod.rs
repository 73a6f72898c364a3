//! Genetic algorithm framework.
//!
//! A generic, domain-agnostic GA built on trait-based abstractions. A
//! problem encoding implements [`GaProblem`], which specifies how to create,
//! evaluate, recombine and mutate individuals; [`GaRunner`] drives the
//! evolutionary loop. The solver for generic [`Problem`](crate::model::Problem)s
//! is built on top of it in [`crate::genetic`].
//!
//! # Core Traits
//!
//! - [`Individual`]: a candidate solution with associated fitness type
//! - [`GaProblem`]: initialization, evaluation, operators
//!
//! # Key Types
//!
//! - [`GaConfig`]: population size, selection, rates, termination, presets
//! - [`GaRunner`]: executes the evolutionary loop
//! - [`GaResult`]: best individual, history and final population
//!
//! # Submodules
//!
//! - [`operators`]: single-point crossover and Gaussian mutation
//! - [`multi_objective`]: constrained non-dominated sorting and crowding
//!   distance (NSGA-II utilities)
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*
//! - Deb et al. (2002), *A Fast and Elitist Multiobjective GA: NSGA-II*

mod config;
pub mod multi_objective;
pub mod operators;
mod runner;
mod selection;
mod types;

pub use config::GaConfig;
pub use runner::{GaResult, GaRunner, GenerationStats, Termination};
pub use selection::{tournament_by, Selection};
pub use types::{Fitness, GaProblem, Individual};
