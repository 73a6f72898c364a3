//! Genetic algorithm solver for generic [`Problem`](crate::model::Problem)s.
//!
//! Each variable is one real-valued gene. Fitness is the weighted sum of the
//! objectives in minimization form plus a violation penalty; parents are
//! chosen by tournament (rank and roulette are available), recombined by
//! single-point crossover and mutated gene by gene with Gaussian noise.
//! Elites survive unchanged, so the best fitness never regresses.
//!
//! # Example
//!
//! ```
//! use u_optimize::context::SolveContext;
//! use u_optimize::genetic::{GeneticParams, GeneticSolver};
//! use u_optimize::model::*;
//!
//! let mut problem = Problem::new("min-x").with_parameters(
//!     SolverParameters::default()
//!         .with_algorithm(AlgorithmParams::Genetic(GeneticParams::default().with_population_size(30)))
//!         .with_max_iterations(100)
//!         .with_seed(42),
//! );
//! let x = problem.add_variable(Variable::continuous("x", 0.0, 10.0));
//! problem.add_objective(Objective::minimize("x", x));
//!
//! let solution = GeneticSolver::from_problem(&problem)
//!     .solve(&problem, &SolveContext::unbounded())
//!     .unwrap();
//! assert!(solution.variable("x").unwrap() < 1.0);
//! ```

mod config;
mod encoding;
mod solver;

pub use config::GeneticParams;
pub use encoding::{Candidate, Encoding};
pub use solver::GeneticSolver;
