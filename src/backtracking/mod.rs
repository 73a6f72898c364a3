//! Backtracking constraint search.
//!
//! Assigns variables one at a time over finite (or discretised) domains,
//! backing up as soon as a constraint whose variables are all assigned is
//! violated. Intended for feasibility problems and small discrete
//! optimization problems; see [`BacktrackingSolver`] for the status table.
//!
//! # Examples
//!
//! ```
//! use u_optimize::backtracking::BacktrackingSolver;
//! use u_optimize::context::SolveContext;
//! use u_optimize::model::{Constraint, Expr, Objective, Operator, Problem, SolutionStatus, Variable};
//!
//! let mut problem = Problem::new("min-x");
//! let x = problem.add_variable(Variable::continuous("x", 0.0, 10.0));
//! problem.add_objective(Objective::minimize("x", x));
//! problem.add_constraint(Constraint::inequality("x>=5", Expr::var(0), Operator::Ge, 5.0));
//!
//! let solution = BacktrackingSolver::default()
//!     .solve(&problem, &SolveContext::unbounded())
//!     .unwrap();
//! assert_eq!(solution.status, SolutionStatus::Feasible);
//! assert_eq!(solution.variable("x"), Some(5.0));
//! ```

mod config;
mod domain;
mod solver;

pub use config::{BacktrackingParams, ValueOrder};
pub use solver::BacktrackingSolver;
