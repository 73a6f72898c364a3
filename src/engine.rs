//! Strategy dispatch, persistence and completion notification.

use crate::allocation::{AllocationPlan, AllocationSolver, Demand, Resource};
use crate::backtracking::BacktrackingSolver;
use crate::config::EngineConfig;
use crate::context::SolveContext;
use crate::error::{Result, ValidationError};
use crate::genetic::GeneticSolver;
use crate::model::{Algorithm, AlgorithmParams, Problem, Solution, SolverParameters};
use crate::pareto::ParetoSolver;
use crate::routing::{RoutingProblem, RoutingSolution, RoutingSolver};
use crate::scheduling::{ScheduleSolution, SchedulingProblem, SchedulingSolver};
use crate::store::{JsonFileStore, ResultStore};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

/// Called with every finished solution, before it is persisted.
pub type CompletionCallback = Arc<dyn Fn(&Solution) + Send + Sync>;

/// A strategy result carrying a generic [`Solution`].
trait Outcome {
    fn solution(&self) -> &Solution;
}

impl Outcome for Solution {
    fn solution(&self) -> &Solution {
        self
    }
}

impl Outcome for AllocationPlan {
    fn solution(&self) -> &Solution {
        &self.solution
    }
}

impl Outcome for RoutingSolution {
    fn solution(&self) -> &Solution {
        &self.solution
    }
}

impl Outcome for ScheduleSolution {
    fn solution(&self) -> &Solution {
        &self.solution
    }
}

/// Entry point that validates a problem, runs the strategy its parameters
/// select, hands the result to the completion callback and the result
/// store, and returns it.
///
/// Each solve owns its search state, so one engine can serve concurrent
/// solves from several threads.
///
/// # Examples
///
/// ```
/// use u_optimize::engine::Engine;
/// use u_optimize::model::{Algorithm, Constraint, Expr, Objective, Operator, Problem, Variable};
/// use u_optimize::SolutionStatus;
///
/// let engine = Engine::new();
/// let mut problem = Problem::new("min-x")
///     .with_parameters(engine.parameters(Algorithm::Backtracking));
/// let x = problem.add_variable(Variable::continuous("x", 0.0, 10.0));
/// problem.add_objective(Objective::minimize("x", x));
/// problem.add_constraint(Constraint::inequality("x>=5", Expr::var(0), Operator::Ge, 5.0));
///
/// let solution = engine.solve(&problem, None).unwrap();
/// assert_eq!(solution.status, SolutionStatus::Feasible);
/// assert_eq!(solution.variable("x"), Some(5.0));
/// ```
#[derive(Clone, Default)]
pub struct Engine {
    config: EngineConfig,
    store: Option<Arc<dyn ResultStore>>,
    on_complete: Option<CompletionCallback>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine using `config`; opens a [`JsonFileStore`] when `results_dir`
    /// is set.
    pub fn from_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let store = match &config.results_dir {
            Some(dir) => Some(Arc::new(JsonFileStore::open(dir)?) as Arc<dyn ResultStore>),
            None => None,
        };
        Ok(Self {
            config,
            store,
            on_complete: None,
        })
    }

    pub fn with_store(mut self, store: Arc<dyn ResultStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn on_complete(mut self, callback: impl Fn(&Solution) + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Arc::new(callback));
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> Option<&Arc<dyn ResultStore>> {
        self.store.as_ref()
    }

    /// Configured default parameters with `algorithm` selected.
    pub fn parameters(&self, algorithm: Algorithm) -> SolverParameters {
        self.config.parameters_for(algorithm)
    }

    /// Solves a generic problem with the backtracking, genetic or Pareto
    /// strategy. Allocation, routing and scheduling need their domain data
    /// and have dedicated methods.
    pub fn solve(&self, problem: &Problem, cancel: Option<Arc<AtomicBool>>) -> Result<Solution> {
        let algorithm = problem.parameters.algorithm.algorithm();
        let ctx = self.context(&problem.parameters, cancel);
        self.run(problem, algorithm, || {
            match &problem.parameters.algorithm {
                AlgorithmParams::Backtracking(_) => {
                    BacktrackingSolver::from_problem(problem).solve(problem, &ctx)
                }
                AlgorithmParams::Genetic(_) => GeneticSolver::from_problem(problem).solve(problem, &ctx),
                AlgorithmParams::Pareto(_) => ParetoSolver::from_problem(problem).solve(problem, &ctx),
                AlgorithmParams::LinearProgramming(_)
                | AlgorithmParams::Routing(_)
                | AlgorithmParams::Scheduling(_) => Err(ValidationError::AlgorithmMismatch {
                    strategy: algorithm.to_string(),
                    reason: "this strategy needs domain data; use the dedicated engine method".into(),
                }),
            }
        })
    }

    /// Allocates `resources` to `demands` with the linear-programming
    /// strategy.
    pub fn solve_allocation(
        &self,
        problem: &Problem,
        resources: &[Resource],
        demands: &[Demand],
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<AllocationPlan> {
        let ctx = self.context(&problem.parameters, cancel);
        self.run(problem, Algorithm::LinearProgramming, || {
            AllocationSolver::from_problem(problem).plan(problem, resources, demands, &ctx)
        })
    }

    pub fn solve_routing(
        &self,
        problem: &RoutingProblem,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<RoutingSolution> {
        let generic = &problem.problem;
        let ctx = self.context(&generic.parameters, cancel);
        self.run(generic, Algorithm::Routing, || {
            RoutingSolver::from_problem(generic).solve(problem, &ctx)
        })
    }

    pub fn solve_scheduling(
        &self,
        problem: &SchedulingProblem,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<ScheduleSolution> {
        let generic = &problem.problem;
        let ctx = self.context(&generic.parameters, cancel);
        self.run(generic, Algorithm::Scheduling, || {
            SchedulingSolver::from_problem(generic).solve(problem, &ctx)
        })
    }

    fn context(&self, params: &SolverParameters, cancel: Option<Arc<AtomicBool>>) -> SolveContext {
        SolveContext::for_params(&self.config.clamp(params), cancel)
    }

    /// Logs, runs `solve`, then notifies and persists its solution.
    fn run<T: Outcome>(
        &self,
        problem: &Problem,
        algorithm: Algorithm,
        solve: impl FnOnce() -> std::result::Result<T, ValidationError>,
    ) -> Result<T> {
        info!(
            event = "solve_start",
            problem = %problem.id,
            strategy = %algorithm,
            variables = problem.variables.len(),
            constraints = problem.constraints.len(),
        );
        let result = match solve() {
            Ok(result) => result,
            Err(e) => {
                warn!(event = "solve_rejected", problem = %problem.id, error = %e);
                return Err(e.into());
            }
        };
        let solution = result.solution();
        info!(
            event = "solve_end",
            problem = %problem.id,
            strategy = %algorithm,
            status = %solution.status,
            iterations = solution.metadata.iterations,
            runtime_ms = solution.metadata.runtime_ms,
        );
        self.finish(solution);
        Ok(result)
    }

    fn finish(&self, solution: &Solution) {
        if let Some(callback) = &self.on_complete {
            callback(solution);
        }
        if let Some(store) = &self.store {
            if let Err(e) = store.save(solution) {
                warn!(problem = %solution.problem_id, error = %e, "result store save failed");
            }
        }
    }
}
