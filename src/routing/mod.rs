//! Vehicle routing with a heterogeneous fleet.
//!
//! # Modules
//!
//! - **`model`**: locations, time windows, vehicles, demands, and the
//!   [`RoutingProblem`] that wraps a generic [`Problem`](crate::model::Problem)
//! - **`evaluation`**: route feasibility (capacity, windows, range, shift)
//!   and cost
//! - **`construction`**: Clarke-Wright savings and vehicle assignment
//! - **`local_search`**: relocate, 2-opt, 2-opt* and reinsertion
//! - **`solver`**: [`RoutingSolver`]
//!
//! # Examples
//!
//! ```
//! use u_optimize::context::SolveContext;
//! use u_optimize::routing::{Location, RouteDemand, RoutingProblem, RoutingSolver, Vehicle};
//!
//! let distances = vec![
//!     vec![0.0, 4.0, 5.0],
//!     vec![4.0, 0.0, 3.0],
//!     vec![5.0, 3.0, 0.0],
//! ];
//! let problem = RoutingProblem::new(
//!     "deliveries",
//!     "depot",
//!     vec![Location::new("depot"), Location::new("a"), Location::new("b")],
//!     vec![Vehicle::new("van", 10.0)],
//!     distances,
//! )
//! .with_demand(RouteDemand::new("order-1", "a", 4.0))
//! .with_demand(RouteDemand::new("order-2", "b", 5.0));
//!
//! let result = RoutingSolver::default()
//!     .solve(&problem, &SolveContext::unbounded())
//!     .unwrap();
//! assert_eq!(result.routes.len(), 1);
//! assert_eq!(result.solution.objective("total_distance"), Some(12.0));
//! ```

mod config;
mod construction;
mod evaluation;
mod local_search;
mod model;
mod solver;

pub use config::RoutingParams;
pub use model::{
    Location, RouteDemand, RoutePlan, RoutingProblem, RoutingSolution, Stop, TimeWindow, Vehicle,
    WindowKind, METRICS,
};
pub use solver::RoutingSolver;
