//! In-memory optimization engine.
//!
//! A caller describes a [`Problem`](model::Problem) (objectives,
//! constraints, decision variables and [`SolverParameters`](model::SolverParameters))
//! and the [`Engine`](engine::Engine) dispatches it to one of the solving
//! strategies:
//!
//! - **Backtracking** ([`backtracking`]): depth-first constraint search with
//!   bound propagation and forward checking.
//! - **Genetic Algorithm** ([`genetic`]): penalised weighted-sum fitness on
//!   the generic GA framework in [`ga`].
//! - **Pareto** ([`pareto`]): NSGA-II non-dominated sorting with crowding
//!   distance; the whole front is returned as ranked alternatives.
//! - **Linear allocation** ([`allocation`]): two-phase simplex over a
//!   resource/demand transportation model, with duals as sensitivity.
//! - **Routing** ([`routing`]): Clarke-Wright savings and local search for a
//!   heterogeneous fleet with time windows.
//! - **Scheduling** ([`scheduling`]): priority-ordered depth-first search
//!   with branch and bound over tasks and capacitated resources.
//!
//! Infeasibility, budget exhaustion and cancellation are reported through
//! [`SolutionStatus`]; only malformed input is an error. Finished solutions
//! can be persisted through a [`ResultStore`](store::ResultStore).
//!
//! # Architecture
//!
//! The crate is single-process and synchronous. Every solve owns its search
//! state; stopping conditions are checked cooperatively at iteration
//! boundaries through a [`SolveContext`](context::SolveContext). Seeded
//! runs are reproducible.

pub mod allocation;
pub mod backtracking;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod ga;
pub mod genetic;
pub mod model;
pub mod pareto;
pub mod random;
pub mod routing;
pub mod scheduling;
pub mod sensitivity;
pub mod store;

mod report;

pub use engine::Engine;
pub use error::{EngineError, Result, ValidationError};
pub use model::{Problem, Solution, SolutionStatus};
