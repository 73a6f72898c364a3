//! Linear resource allocation.
//!
//! - [`LinearProgram`]: a dense two-phase simplex usable on its own
//! - [`AllocationSolver`]: builds the resource/demand LP, solves it and
//!   reports duals and reduced costs as sensitivity data
//!
//! # Examples
//!
//! ```
//! use u_optimize::allocation::{allocation_problem, AllocationSolver, Demand, Resource};
//! use u_optimize::context::SolveContext;
//!
//! let resources = vec![Resource::new("r1", 10.0, 2.0), Resource::new("r2", 20.0, 1.0)];
//! let demands = vec![Demand::new("d", 25.0)];
//! let solution = AllocationSolver::default()
//!     .solve(&allocation_problem("alloc"), &resources, &demands, &SolveContext::unbounded())
//!     .unwrap();
//! assert!((solution.objective("total_cost").unwrap() - 30.0).abs() < 1e-9);
//! ```

mod config;
mod model;
mod simplex;
mod solver;

pub use config::AllocationParams;
pub use model::{
    allocation_problem, validate_allocation, Allocation, AllocationPlan, Demand, Resource,
    Shortfall,
};
pub use simplex::{LinearProgram, LpOutcome, LpRow, LpSolution, Relation};
pub use solver::AllocationSolver;
