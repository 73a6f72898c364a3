//! Savings construction followed by local search.

use super::config::RoutingParams;
use super::construction::{assign, clarke_wright, Plan};
use super::evaluation::Instance;
use super::local_search::{insert_unassigned, plan_score, relocate, two_opt, two_opt_star};
use super::model::{RoutePlan, RoutingProblem, RoutingSolution};
use crate::context::{Interrupt, SolveContext};
use crate::error::ValidationError;
use crate::model::{
    Algorithm, AlgorithmParams, ConvergencePoint, NamedValue, Problem, Severity, Solution,
    SolutionStatus, Violation, ViolationSubject,
};
use crate::report;
use tracing::debug;

/// Heterogeneous-fleet vehicle routing.
///
/// Clarke-Wright savings build routes that some vehicle can drive; routes
/// are then handed to the cheapest free vehicle, heaviest first, and
/// leftovers inserted where feasible. Local search (relocate, 2-opt,
/// 2-opt*) improves the plan pass by pass until no move helps or the pass
/// budget (`max_iterations`) runs out.
///
/// Capacity, time windows, `max_distance` and `max_duration` are hard:
/// service starts inside one of a location's required or preferred windows
/// and outside its forbidden ones. Starting outside every preferred window
/// (possible only through a required one) adds `preferred_window_penalty`
/// per time unit of deviation to the score.
/// Customers no vehicle can take are reported in `unassigned` and make
/// the status `Infeasible`.
#[derive(Debug, Clone, Default)]
pub struct RoutingSolver {
    params: RoutingParams,
}

impl RoutingSolver {
    pub fn new(params: RoutingParams) -> Self {
        Self { params }
    }

    /// Solver configured from the problem's own parameters, falling back to
    /// defaults when another strategy is selected.
    pub fn from_problem(problem: &Problem) -> Self {
        match &problem.parameters.algorithm {
            AlgorithmParams::Routing(p) => Self::new(p.clone()),
            _ => Self::default(),
        }
    }

    pub fn params(&self) -> &RoutingParams {
        &self.params
    }

    pub fn solve(
        &self,
        problem: &RoutingProblem,
        ctx: &SolveContext,
    ) -> Result<RoutingSolution, ValidationError> {
        problem.validate()?;
        self.params.validate()?;

        let generic = &problem.problem;
        let mut metadata = report::metadata(Algorithm::Routing, generic.parameters.seed);
        if ctx.interrupt() == Some(Interrupt::Cancelled) {
            let mut solution = Solution::empty(generic.id.clone(), SolutionStatus::Cancelled);
            metadata.cancelled = true;
            metadata.runtime_ms = ctx.elapsed_ms();
            solution.metadata = metadata;
            return Ok(RoutingSolution {
                solution,
                routes: Vec::new(),
                unassigned: Vec::new(),
            });
        }

        let inst = Instance::new(problem, self.params.preferred_window_penalty);
        let (routes, unservable) = clarke_wright(&inst);
        let mut plan = assign(&inst, routes, unservable);
        debug!(
            routes = plan.routes.iter().filter(|r| !r.is_empty()).count(),
            unassigned = plan.unassigned.len(),
            "routing: construction done"
        );

        let mut trace = vec![trace_point(&inst, &plan, 0)];
        let mut stop = None;
        let mut passes = 0;
        let mut converged = true;
        if self.params.local_search {
            converged = false;
            while passes < generic.parameters.max_iterations {
                if let Some(interrupt) = ctx.interrupt() {
                    stop = Some(interrupt);
                    break;
                }
                passes += 1;
                let improved = self.pass(&inst, &mut plan);
                trace.push(trace_point(&inst, &plan, passes));
                if !improved {
                    converged = true;
                    break;
                }
            }
        }
        debug!(passes, score = plan_score(&inst, &plan), "routing: local search done");

        metadata.iterations = passes;
        metadata.converged = converged;
        metadata.cancelled = stop == Some(Interrupt::Cancelled);
        metadata.trace = trace;
        metadata.runtime_ms = ctx.elapsed_ms();

        let status = if !plan.unassigned.is_empty() {
            SolutionStatus::Infeasible
        } else {
            match stop {
                Some(Interrupt::TimeLimit) => SolutionStatus::TimeLimit,
                Some(Interrupt::Cancelled) => SolutionStatus::IterationLimit,
                None => SolutionStatus::Feasible,
            }
        };
        let mut result = build_solution(&inst, &plan, status);
        result.solution.metadata = metadata;
        Ok(result)
    }

    /// One improvement pass; every enabled move gets a chance.
    fn pass(&self, inst: &Instance<'_>, plan: &mut Plan) -> bool {
        let p = &self.params;
        let mut improved = insert_unassigned(inst, plan);
        if p.relocate {
            improved |= relocate(inst, plan);
        }
        if p.two_opt {
            improved |= two_opt(inst, plan);
        }
        if p.two_opt_star {
            improved |= two_opt_star(inst, plan);
        }
        improved
    }
}

fn trace_point(inst: &Instance<'_>, plan: &Plan, iteration: usize) -> ConvergencePoint {
    let score = report::directed(&inst.problem.problem, plan_score(inst, plan));
    ConvergencePoint {
        iteration,
        best_fitness: score,
        best_objective: score,
        constraint_violation: plan.unassigned.len() as f64,
    }
}

fn build_solution(inst: &Instance<'_>, plan: &Plan, status: SolutionStatus) -> RoutingSolution {
    let problem = inst.problem;
    let mut routes = Vec::new();
    let (mut distance, mut cost, mut duration, mut deviation) = (0.0, 0.0, 0.0, 0.0);
    let mut vehicle_of = vec![None; problem.locations.len()];
    for (k, (route, vehicle)) in plan.routes.iter().zip(&problem.vehicles).enumerate() {
        if route.is_empty() {
            continue;
        }
        let Some(eval) = inst.evaluate(route, vehicle) else {
            continue;
        };
        for &c in route {
            vehicle_of[c] = Some(k);
        }
        distance += eval.distance;
        cost += eval.cost;
        duration += eval.duration;
        deviation += eval.deviation;
        routes.push(RoutePlan {
            vehicle: vehicle.id.clone(),
            stops: inst.stops(route, &eval),
            load: eval.load,
            distance: eval.distance,
            duration: eval.duration,
            overtime: eval.overtime,
            cost: eval.cost,
        });
    }

    let mut solution = Solution::empty(problem.problem.id.clone(), status);
    solution.variable_values = inst
        .customers
        .iter()
        .map(|&c| {
            let id = problem.locations[c].id.clone();
            match vehicle_of[c] {
                Some(k) => NamedValue::labelled(id, k as f64, Some(problem.vehicles[k].id.clone())),
                None => NamedValue::new(id, -1.0),
            }
        })
        .collect();
    solution.objective_values = vec![
        NamedValue::new("total_distance", distance),
        NamedValue::new("total_cost", cost),
        NamedValue::new("total_duration", duration),
        NamedValue::new("vehicles_used", routes.len() as f64),
        NamedValue::new("unassigned", plan.unassigned.len() as f64),
        NamedValue::new("preferred_window_deviation", deviation),
    ];
    let unassigned: Vec<String> = plan
        .unassigned
        .iter()
        .map(|&c| problem.locations[c].id.clone())
        .collect();
    solution.violations = plan
        .unassigned
        .iter()
        .zip(&unassigned)
        .map(|(&c, id)| {
            Violation::new("unassigned", inst.demand[c], Severity::Critical)
                .with_subject(ViolationSubject::Location(id.clone()))
        })
        .collect();

    RoutingSolution {
        solution,
        routes,
        unassigned,
    }
}
