//! Task scheduling on capacitated resources.
//!
//! A [`SchedulingProblem`] wraps a generic [`Problem`](crate::model::Problem)
//! whose objectives name scheduling metrics (`makespan`, `total_cost`,
//! `overtime`, `workload_imbalance`). [`SchedulingSolver`] assigns every
//! task a resource and an integer start time.
//!
//! # Examples
//!
//! ```
//! use u_optimize::context::SolveContext;
//! use u_optimize::scheduling::{Resource, SchedulingProblem, SchedulingSolver, Task};
//!
//! let problem = SchedulingProblem::new(
//!     "line",
//!     vec![Task::new("cut", 2), Task::new("weld", 3).after(["cut"])],
//!     vec![Resource::new("bench")],
//!     100,
//! );
//! let schedule = SchedulingSolver::default()
//!     .solve(&problem, &SolveContext::unbounded())
//!     .unwrap();
//! assert_eq!(schedule.makespan, 5);
//! ```

mod config;
mod model;
mod solver;

pub use config::SchedulingParams;
pub use model::{
    Resource, ScheduleSolution, ScheduledTask, SchedulingProblem, Task, TaskWindow, METRICS,
};
pub use solver::SchedulingSolver;
