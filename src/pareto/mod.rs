//! Multi-objective search (NSGA-II).
//!
//! Objectives are not collapsed into a scalar. Individuals are ranked by
//! constrained non-domination and, within a rank, by crowding distance;
//! the final first front is returned as ranked
//! [`Alternative`](crate::model::Alternative)s with their domination count
//! and crowding distance.
//!
//! # References
//!
//! - Deb et al. (2002), "A Fast and Elitist Multiobjective Genetic
//!   Algorithm: NSGA-II"

mod config;
mod solver;

pub use config::ParetoParams;
pub use solver::ParetoSolver;
