//! Depth-first search with bound propagation and forward checking.

use super::config::{BacktrackingParams, ValueOrder};
use super::domain::{enumerate, propagate_bounds, EmptyDomain};
use crate::context::{Interrupt, SolveContext};
use crate::error::ValidationError;
use crate::evaluator::ConstraintEvaluator;
use crate::model::validate::validate_searchable;
use crate::model::{
    Algorithm, AlgorithmParams, ConvergencePoint, Problem, Severity, Solution, SolutionStatus,
    SolveMetadata, Violation,
};
use crate::random::{self, SolverRng};
use crate::report;
use rand::seq::SliceRandom;
use tracing::debug;

/// Why the search stopped before exhausting its space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Interrupted(Interrupt),
    NodeBudget,
}

/// How often a constraint pruned a partial assignment, and by how little.
#[derive(Debug, Clone, Copy)]
struct Conflict {
    count: usize,
    least: f64,
}

impl Default for Conflict {
    fn default() -> Self {
        Self {
            count: 0,
            least: f64::INFINITY,
        }
    }
}

struct Search<'a> {
    problem: &'a Problem,
    params: &'a BacktrackingParams,
    ctx: &'a SolveContext,
    evaluator: ConstraintEvaluator,
    /// Variable indices in assignment order.
    order: Vec<usize>,
    domains: Vec<Vec<f64>>,
    /// `checks[d]`: constraints whose variables are all assigned once the
    /// variable at depth `d` is.
    checks: Vec<Vec<usize>>,
    values: Vec<f64>,
    rng: SolverRng,
    max_nodes: usize,
    nodes: usize,
    conflicts: Vec<Conflict>,
    best: Option<(Vec<f64>, f64)>,
    trace: Vec<ConvergencePoint>,
    stop: Option<Stop>,
}

impl<'a> Search<'a> {
    fn new(
        problem: &'a Problem,
        params: &'a BacktrackingParams,
        ctx: &'a SolveContext,
        evaluator: ConstraintEvaluator,
        domains: Vec<Vec<f64>>,
        rng: SolverRng,
    ) -> Self {
        // Smallest domain first; fixed variables lead.
        let mut order: Vec<usize> = (0..domains.len()).collect();
        order.sort_by_key(|&i| (domains[i].len(), i));

        let mut depth_of = vec![0; domains.len()];
        for (depth, &var) in order.iter().enumerate() {
            depth_of[var] = depth;
        }
        let mut checks = vec![Vec::new(); order.len()];
        for (ci, c) in problem.constraints.iter().enumerate() {
            let depth = c
                .expression
                .variables()
                .into_iter()
                .map(|v| depth_of[v])
                .max()
                .unwrap_or(0);
            checks[depth].push(ci);
        }

        Self {
            problem,
            params,
            ctx,
            evaluator,
            values: vec![f64::NAN; domains.len()],
            order,
            domains,
            checks,
            rng,
            max_nodes: problem.parameters.max_iterations,
            nodes: 0,
            conflicts: vec![Conflict::default(); problem.constraints.len()],
            best: None,
            trace: Vec::new(),
            stop: None,
        }
    }

    /// Returns `true` when the search must unwind.
    fn dfs(&mut self, depth: usize) -> bool {
        if depth == self.order.len() {
            return self.record_leaf();
        }
        let var = self.order[depth];
        for value in self.ordered_values(var) {
            if let Some(interrupt) = self.ctx.interrupt() {
                self.stop = Some(Stop::Interrupted(interrupt));
                return true;
            }
            if self.nodes >= self.max_nodes {
                self.stop = Some(Stop::NodeBudget);
                return true;
            }
            self.nodes += 1;
            self.values[var] = value;
            if self.consistent(depth) && self.dfs(depth + 1) {
                return true;
            }
        }
        self.values[var] = f64::NAN;
        false
    }

    fn ordered_values(&mut self, var: usize) -> Vec<f64> {
        let mut values = self.domains[var].clone();
        match self.params.value_order {
            ValueOrder::Ascending => {}
            ValueOrder::Descending => values.reverse(),
            ValueOrder::Random => values.shuffle(&mut self.rng),
        }
        if let Some(init) = self.problem.variables[var].initial {
            if let Some(pos) = values.iter().position(|&v| v == init) {
                let v = values.remove(pos);
                values.insert(0, v);
            }
        }
        values
    }

    fn consistent(&mut self, depth: usize) -> bool {
        for &ci in &self.checks[depth] {
            let magnitude = self
                .evaluator
                .evaluate(&self.values, &self.problem.constraints[ci]);
            if magnitude > 0.0 {
                let conflict = &mut self.conflicts[ci];
                conflict.count += 1;
                conflict.least = conflict.least.min(magnitude);
                return false;
            }
        }
        true
    }

    fn record_leaf(&mut self) -> bool {
        let objective = report::scalar_objective(self.problem, &self.values);
        let objective = if objective.is_nan() { f64::INFINITY } else { objective };
        let improved = self.best.as_ref().map_or(true, |(_, best)| objective < *best);
        if improved {
            debug!(nodes = self.nodes, objective, "backtracking: new incumbent");
            self.best = Some((self.values.clone(), objective));
            let directed = report::directed(self.problem, objective);
            self.trace.push(ConvergencePoint {
                iteration: self.nodes,
                best_fitness: directed,
                best_objective: directed,
                constraint_violation: 0.0,
            });
        }
        !self.params.exhaustive
    }

    /// Constraints that pruned the search, most frequent first.
    fn blocking_violations(&self) -> Vec<Violation> {
        let mut blocking: Vec<(usize, Conflict)> = self
            .conflicts
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, c)| c.count > 0)
            .collect();
        blocking.sort_by(|a, b| b.1.count.cmp(&a.1.count).then(a.0.cmp(&b.0)));
        blocking
            .into_iter()
            .map(|(ci, c)| {
                let constraint = &self.problem.constraints[ci];
                Violation::new(
                    constraint.name.clone(),
                    c.least,
                    Severity::grade(c.least, constraint.target),
                )
            })
            .collect()
    }
}

/// Depth-first constraint search.
///
/// Before searching, `Bound` constraints narrow each variable's domain;
/// a variable narrowed to a single value is fixed. Continuous domains are
/// discretised into `continuous_steps + 1` evenly spaced values. Variables
/// are assigned smallest-domain-first and every constraint is checked as
/// soon as its last variable is assigned (forward checking).
///
/// | outcome | status |
/// |---|---|
/// | first feasible assignment (default) | `Feasible` |
/// | exhaustive mode, space exhausted | `Optimal` over the discretised space |
/// | exhaustive mode, budget hit with an incumbent | `IterationLimit` / `TimeLimit` |
/// | no feasible assignment found | `Infeasible`, blocking constraints listed |
/// | cancelled before any assignment | `Cancelled` |
#[derive(Debug, Clone, Default)]
pub struct BacktrackingSolver {
    params: BacktrackingParams,
}

impl BacktrackingSolver {
    pub fn new(params: BacktrackingParams) -> Self {
        Self { params }
    }

    /// Solver configured from the problem's own parameters, falling back to
    /// defaults when another strategy is selected.
    pub fn from_problem(problem: &Problem) -> Self {
        match &problem.parameters.algorithm {
            AlgorithmParams::Backtracking(p) => Self::new(p.clone()),
            _ => Self::default(),
        }
    }

    pub fn params(&self) -> &BacktrackingParams {
        &self.params
    }

    pub fn solve(&self, problem: &Problem, ctx: &SolveContext) -> Result<Solution, ValidationError> {
        validate_searchable(problem)?;
        self.params.validate()?;

        let solver = &problem.parameters;
        let evaluator = ConstraintEvaluator::new(solver.tolerance);
        let seed = match self.params.value_order {
            ValueOrder::Random => Some(solver.seed.unwrap_or_else(rand::random)),
            _ => solver.seed,
        };
        let mut metadata = report::metadata(Algorithm::Backtracking, seed);

        let bounds = match propagate_bounds(problem, &evaluator) {
            Ok(bounds) => bounds,
            Err(empty) => {
                metadata.runtime_ms = ctx.elapsed_ms();
                return Ok(empty_domain_solution(problem, &empty, metadata));
            }
        };
        let domains = problem
            .variables
            .iter()
            .zip(&bounds)
            .map(|(v, &(lo, hi))| enumerate(v, lo, hi, &self.params))
            .collect();

        let mut search = Search::new(
            problem,
            &self.params,
            ctx,
            evaluator,
            domains,
            random::rng_from(seed),
        );
        search.dfs(0);

        metadata.iterations = search.nodes;
        metadata.runtime_ms = ctx.elapsed_ms();
        metadata.cancelled = search.stop == Some(Stop::Interrupted(Interrupt::Cancelled));
        metadata.converged = search.stop.is_none();

        let Some((values, _)) = search.best.take() else {
            if metadata.cancelled {
                let mut solution = Solution::empty(problem.id.clone(), SolutionStatus::Cancelled);
                solution.metadata = metadata;
                return Ok(solution);
            }
            let mut solution = Solution::empty(problem.id.clone(), SolutionStatus::Infeasible);
            solution.violations = search.blocking_violations();
            solution.metadata = metadata;
            return Ok(solution);
        };

        let status = match search.stop {
            None if self.params.exhaustive => SolutionStatus::Optimal,
            None => SolutionStatus::Feasible,
            Some(Stop::Interrupted(Interrupt::TimeLimit)) => SolutionStatus::TimeLimit,
            Some(Stop::Interrupted(Interrupt::Cancelled)) | Some(Stop::NodeBudget) => {
                SolutionStatus::IterationLimit
            }
        };
        metadata.trace = std::mem::take(&mut search.trace);
        Ok(report::assignment_solution(problem, status, &values, &evaluator, metadata))
    }
}

fn empty_domain_solution(problem: &Problem, empty: &EmptyDomain, metadata: SolveMetadata) -> Solution {
    let mut solution = Solution::empty(problem.id.clone(), SolutionStatus::Infeasible);
    solution.violations = empty
        .constraints
        .iter()
        .map(|&ci| {
            let c = &problem.constraints[ci];
            Violation::new(c.name.clone(), empty.gap, Severity::grade(empty.gap, c.target))
        })
        .collect();
    solution.metadata = metadata;
    solution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Constraint, Expr, Objective, Operator, SolverParameters, Variable};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn with_params(mut p: Problem, params: BacktrackingParams, max_iterations: usize) -> Problem {
        p.parameters = SolverParameters::default()
            .with_algorithm(AlgorithmParams::Backtracking(params))
            .with_max_iterations(max_iterations);
        p
    }

    fn min_x_at_least_5() -> Problem {
        let mut p = Problem::new("min-x");
        let x = p.add_variable(Variable::continuous("x", 0.0, 10.0));
        p.add_objective(Objective::minimize("x", x));
        p.add_constraint(Constraint::inequality("x>=5", Expr::var(0), Operator::Ge, 5.0));
        with_params(p, BacktrackingParams::default(), 10_000)
    }

    fn solve(p: &Problem) -> Solution {
        BacktrackingSolver::from_problem(p)
            .solve(p, &SolveContext::unbounded())
            .unwrap()
    }

    #[test]
    fn test_first_feasible_ascending() {
        let s = solve(&min_x_at_least_5());
        assert_eq!(s.status, SolutionStatus::Feasible);
        assert_eq!(s.variable("x"), Some(5.0));
        assert_eq!(s.objective("x"), Some(5.0));
        assert!(s.violations.is_empty());
        assert_eq!(s.metadata.algorithm, "backtracking");
        assert_eq!(s.metadata.iterations, 51);
    }

    #[test]
    fn test_descending_order() {
        let p = with_params(
            min_x_at_least_5(),
            BacktrackingParams::default().with_value_order(ValueOrder::Descending),
            10_000,
        );
        assert_eq!(solve(&p).variable("x"), Some(10.0));
    }

    #[test]
    fn test_exhaustive_is_optimal() {
        let mut p = Problem::new("max-sum");
        let x = p.add_variable(Variable::integer("x", 0, 3));
        let y = p.add_variable(Variable::integer("y", 0, 3));
        p.add_objective(Objective::maximize("sum", x.clone() + Expr::constant(2.0) * y.clone()));
        p.add_constraint(Constraint::inequality("cap", x + y, Operator::Le, 4.0));
        let p = with_params(p, BacktrackingParams::default().with_exhaustive(true), 10_000);

        let s = solve(&p);
        assert_eq!(s.status, SolutionStatus::Optimal);
        assert_eq!(s.variable("x"), Some(1.0));
        assert_eq!(s.variable("y"), Some(3.0));
        assert_eq!(s.objective("sum"), Some(7.0));
        assert!(s.metadata.converged);
        // Improvements only, ascending for a maximization problem.
        let trace: Vec<f64> = s.metadata.trace.iter().map(|t| t.best_fitness).collect();
        assert!(trace.windows(2).all(|w| w[1] > w[0]));
        assert_eq!(trace.last(), Some(&7.0));
    }

    #[test]
    fn test_contradictory_equalities_infeasible() {
        let mut p = Problem::new("x=1,x=2");
        let x = p.add_variable(Variable::integer("x", 0, 10));
        p.add_objective(Objective::minimize("x", x));
        p.add_constraint(Constraint::equality("x=1", Expr::var(0), 1.0));
        p.add_constraint(Constraint::equality("x=2", Expr::var(0), 2.0));
        let p = with_params(p, BacktrackingParams::default(), 10_000);

        let s = solve(&p);
        assert_eq!(s.status, SolutionStatus::Infeasible);
        assert!(s.variable_values.is_empty());
        let names: Vec<&str> = s.violations.iter().map(|v| v.constraint.as_str()).collect();
        // x=1 rejects ten of the eleven values, x=2 only the remaining one.
        assert_eq!(names, vec!["x=1", "x=2"]);
        assert!(s.violations.iter().all(|v| (v.magnitude - 1.0).abs() < 1e-5));
    }

    #[test]
    fn test_bound_propagation_detects_empty_domain() {
        let mut p = Problem::new("bounds");
        let x = p.add_variable(Variable::continuous("x", 0.0, 10.0));
        p.add_objective(Objective::minimize("x", x));
        p.add_constraint(Constraint::bound("x==3", 0, Operator::Eq, 3.0));
        p.add_constraint(Constraint::bound("x>=5", 0, Operator::Ge, 5.0));
        let p = with_params(p, BacktrackingParams::default(), 10_000);

        let s = solve(&p);
        assert_eq!(s.status, SolutionStatus::Infeasible);
        assert_eq!(s.metadata.iterations, 0);
        assert_eq!(s.violations.len(), 2);
    }

    #[test]
    fn test_fixed_variable_is_preassigned() {
        let mut p = Problem::new("fixed");
        let x = p.add_variable(Variable::integer("x", 0, 100));
        let y = p.add_variable(Variable::integer("y", 0, 100));
        p.add_objective(Objective::minimize("y", y.clone()));
        p.add_constraint(Constraint::bound("x==40", 0, Operator::Eq, 40.0));
        p.add_constraint(Constraint::inequality("y>=x", y - x, Operator::Ge, 0.0));
        let p = with_params(p, BacktrackingParams::default(), 10_000);

        let s = solve(&p);
        assert_eq!(s.variable("x"), Some(40.0));
        assert_eq!(s.variable("y"), Some(40.0));
        assert_eq!(s.metadata.iterations, 42);
    }

    #[test]
    fn test_node_budget_without_solution() {
        let mut p = Problem::new("tight");
        let x = p.add_variable(Variable::integer("x", 0, 100));
        let y = p.add_variable(Variable::integer("y", 0, 100));
        p.add_objective(Objective::minimize("x", x.clone()));
        p.add_constraint(Constraint::equality("x+y=200.5", x + y, 200.5));
        let p = with_params(p, BacktrackingParams::default(), 50);

        let s = solve(&p);
        assert_eq!(s.status, SolutionStatus::Infeasible);
        assert_eq!(s.metadata.iterations, 50);
        assert!(!s.metadata.converged);
    }

    #[test]
    fn test_random_order_is_seeded() {
        let mut p = Problem::new("any");
        let x = p.add_variable(Variable::integer("x", 0, 50));
        p.add_objective(Objective::minimize("x", x));
        p.add_constraint(Constraint::inequality("x>=10", Expr::var(0), Operator::Ge, 10.0));
        let mut p = with_params(
            p,
            BacktrackingParams::default().with_value_order(ValueOrder::Random),
            10_000,
        );
        p.parameters.seed = Some(3);

        let a = solve(&p);
        let b = solve(&p);
        assert!(a.same_outcome(&b));
        assert_eq!(a.metadata.seed, Some(3));
        assert!(a.variable("x").unwrap() >= 10.0);
    }

    #[test]
    fn test_initial_value_tried_first() {
        let mut p = Problem::new("init");
        let x = p.add_variable(Variable::integer("x", 0, 10).with_initial(7.0));
        p.add_objective(Objective::minimize("x", x));
        let p = with_params(p, BacktrackingParams::default(), 10_000);
        let s = solve(&p);
        assert_eq!(s.variable("x"), Some(7.0));
        assert_eq!(s.metadata.iterations, 1);
    }

    #[test]
    fn test_integer_with_fractional_bounds_takes_whole_values() {
        let mut p = Problem::new("snap");
        let mut v = Variable::integer("x", 0, 3);
        v.lower = Some(0.5);
        v.upper = Some(3.5);
        let x = p.add_variable(v);
        p.add_objective(Objective::minimize("x", x));
        let p = with_params(p, BacktrackingParams::default(), 100);
        let s = solve(&p);
        assert_eq!(s.status, SolutionStatus::Feasible);
        assert_eq!(s.variable("x"), Some(1.0));
    }

    #[test]
    fn test_categorical_label() {
        let mut p = Problem::new("cat");
        let c = p.add_variable(Variable::categorical("color", ["red", "green", "blue"]));
        p.add_objective(Objective::minimize("c", c.clone()));
        p.add_constraint(Constraint::logical("not red", c.equals(Expr::constant(0.0)).not()));
        let p = with_params(p, BacktrackingParams::default(), 100);
        let s = solve(&p);
        assert_eq!(s.variable_values[0].label.as_deref(), Some("green"));
    }

    #[test]
    fn test_cancelled_before_start() {
        let p = min_x_at_least_5();
        let flag = Arc::new(AtomicBool::new(true));
        let ctx = SolveContext::new(None, Some(flag));
        let s = BacktrackingSolver::default().solve(&p, &ctx).unwrap();
        assert_eq!(s.status, SolutionStatus::Cancelled);
        assert!(s.variable_values.is_empty());
        assert!(s.metadata.cancelled);
    }

    #[test]
    fn test_rejects_unbounded_variable() {
        let mut p = Problem::new("unbounded");
        let mut v = Variable::continuous("x", 0.0, 1.0);
        v.upper = None;
        let x = p.add_variable(v);
        p.add_objective(Objective::minimize("x", x));
        assert!(BacktrackingSolver::default()
            .solve(&p, &SolveContext::unbounded())
            .is_err());
    }
}
