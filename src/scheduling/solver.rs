//! Priority-ordered depth-first scheduling with branch and bound.

use super::config::SchedulingParams;
use super::model::{ScheduleSolution, ScheduledTask, SchedulingProblem, Task};
use crate::context::{Interrupt, SolveContext};
use crate::error::ValidationError;
use crate::model::{
    Algorithm, AlgorithmParams, ConvergencePoint, Direction, NamedValue, Problem, Severity,
    Solution, SolutionStatus, SolveMetadata, Violation, ViolationSubject,
};
use crate::report;
use crate::routing::WindowKind;
use tracing::debug;

const EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placement {
    resource: usize,
    start: i64,
    end: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Interrupted(Interrupt),
    NodeBudget,
}

/// Figures of a (partial) schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Metrics {
    makespan: f64,
    total_cost: f64,
    overtime: f64,
    workload_imbalance: f64,
    deviation: f64,
}

/// Weights of the scalar score, minimization form.
#[derive(Debug, Clone, Copy, Default)]
struct Weights {
    makespan: f64,
    total_cost: f64,
    overtime: f64,
    workload_imbalance: f64,
    deviation: f64,
}

impl Weights {
    fn new(problem: &Problem, params: &SchedulingParams) -> Self {
        let mut w = Weights {
            workload_imbalance: params.balance_weight,
            deviation: params.preferred_window_penalty,
            ..Weights::default()
        };
        for o in &problem.objectives {
            let weight = o.weight * if o.direction == Direction::Maximize { -1.0 } else { 1.0 };
            match o.name.as_str() {
                "makespan" => w.makespan += weight,
                "total_cost" => w.total_cost += weight,
                "overtime" => w.overtime += weight,
                "workload_imbalance" => w.workload_imbalance += weight,
                _ => {}
            }
        }
        w
    }

    /// Whether adding a task can never lower the score, so partial scores
    /// bound complete ones.
    fn monotone(&self) -> bool {
        self.makespan >= 0.0
            && self.total_cost >= 0.0
            && self.overtime >= 0.0
            && self.workload_imbalance == 0.0
    }

    fn score(&self, m: &Metrics) -> f64 {
        self.makespan * m.makespan
            + self.total_cost * m.total_cost
            + self.overtime * m.overtime
            + self.workload_imbalance * m.workload_imbalance
            + self.deviation * m.deviation
    }
}

/// Time units `task` runs past `regular_end`.
fn overtime_of(regular_end: Option<i64>, start: i64, end: i64) -> i64 {
    regular_end.map_or(0, |r| (end - start.max(r)).max(0))
}

/// Time units outside the nearest preferred window (0 without any).
fn preferred_deviation(task: &Task, start: i64, end: i64) -> i64 {
    task.windows
        .iter()
        .filter(|w| w.kind == WindowKind::Preferred)
        .map(|w| (w.start - start).max(0) + (end - w.end).max(0))
        .min()
        .unwrap_or(0)
}

fn metrics(problem: &SchedulingProblem, placed: &[Option<Placement>]) -> Metrics {
    let mut m = Metrics::default();
    let mut busy = vec![0i64; problem.resources.len()];
    for (task, p) in problem.tasks.iter().zip(placed) {
        let Some(p) = p else { continue };
        let resource = &problem.resources[p.resource];
        let units = f64::from(task.units);
        let ot = overtime_of(resource.regular_end, p.start, p.end) as f64;
        m.makespan = m.makespan.max(p.end as f64);
        m.total_cost += units
            * (resource.cost_per_time * (p.end - p.start) as f64 + resource.overtime_cost * ot);
        m.overtime += ot;
        m.deviation += preferred_deviation(task, p.start, p.end) as f64;
        busy[p.resource] += task.duration * i64::from(task.units);
    }
    let most = busy.iter().copied().max().unwrap_or(0);
    let least = busy.iter().copied().min().unwrap_or(0);
    m.workload_imbalance = (most - least) as f64;
    m
}

/// Kahn's algorithm, always taking the ready task with the highest
/// priority (lowest index on ties). `Err` holds the tasks that never became
/// ready: those on a cycle or downstream of one.
fn priority_order(problem: &SchedulingProblem, preds: &[Vec<usize>]) -> Result<Vec<usize>, Vec<usize>> {
    let n = problem.tasks.len();
    let mut indegree: Vec<usize> = preds.iter().map(Vec::len).collect();
    let mut succs = vec![Vec::new(); n];
    for (t, ps) in preds.iter().enumerate() {
        for &p in ps {
            succs[p].push(t);
        }
    }
    let mut done = vec![false; n];
    let mut order = Vec::with_capacity(n);
    while order.len() < n {
        let next = (0..n)
            .filter(|&t| !done[t] && indegree[t] == 0)
            .max_by(|&a, &b| {
                problem.tasks[a]
                    .priority
                    .cmp(&problem.tasks[b].priority)
                    .then(b.cmp(&a))
            });
        let Some(t) = next else {
            return Err((0..n).filter(|&t| !done[t]).collect());
        };
        done[t] = true;
        order.push(t);
        for &s in &succs[t] {
            indegree[s] -= 1;
        }
    }
    Ok(order)
}

struct Search<'a> {
    problem: &'a SchedulingProblem,
    params: &'a SchedulingParams,
    ctx: &'a SolveContext,
    weights: Weights,
    prunable: bool,
    order: Vec<usize>,
    preds: Vec<Vec<usize>>,
    eligible: Vec<Vec<usize>>,
    placed: Vec<Option<Placement>>,
    max_nodes: usize,
    nodes: usize,
    /// Times each task had no feasible placement.
    dead_ends: Vec<usize>,
    best: Option<(Vec<Option<Placement>>, f64)>,
    trace: Vec<ConvergencePoint>,
    stop: Option<Stop>,
}

impl<'a> Search<'a> {
    /// Returns `true` when the search must unwind.
    fn dfs(&mut self, depth: usize) -> bool {
        if depth == self.order.len() {
            return self.record_leaf();
        }
        let t = self.order[depth];
        let children = self.children(t);
        if children.is_empty() {
            self.dead_ends[t] += 1;
            return false;
        }
        let duration = self.problem.tasks[t].duration;
        for (resource, start) in children {
            if let Some(interrupt) = self.ctx.interrupt() {
                self.stop = Some(Stop::Interrupted(interrupt));
                return true;
            }
            if self.nodes >= self.max_nodes {
                self.stop = Some(Stop::NodeBudget);
                return true;
            }
            self.nodes += 1;
            self.placed[t] = Some(Placement {
                resource,
                start,
                end: start + duration,
            });
            if self.bounded_out() {
                continue;
            }
            if self.dfs(depth + 1) {
                return true;
            }
        }
        self.placed[t] = None;
        false
    }

    fn bounded_out(&self) -> bool {
        let Some((_, best)) = &self.best else {
            return false;
        };
        self.prunable && self.weights.score(&metrics(self.problem, &self.placed)) >= best - EPS
    }

    /// Candidate `(resource, start)` pairs for `t`, earliest finish first.
    /// Besides the earliest feasible start per resource, the earliest start
    /// inside each later preferred window is offered.
    fn children(&self, t: usize) -> Vec<(usize, i64)> {
        let task = &self.problem.tasks[t];
        let ready = self.preds[t]
            .iter()
            .filter_map(|&p| self.placed[p].map(|pl| pl.end))
            .max()
            .unwrap_or(0);
        let mut out = Vec::new();
        for &r in &self.eligible[t] {
            let Some(s) = self.earliest_start(task, r, ready) else {
                continue;
            };
            out.push((r, s));
            for w in task.windows.iter().filter(|w| w.kind == WindowKind::Preferred && w.start > s) {
                if let Some(later) = self.earliest_start(task, r, w.start) {
                    if !out.contains(&(r, later)) {
                        out.push((r, later));
                    }
                }
            }
        }
        out.sort_by_key(|&(r, s)| (s + task.duration, r, s));
        out
    }

    /// Earliest start at or after `lo` on resource `r` satisfying horizon,
    /// windows and capacity. Feasibility can only change at `lo`, at ends
    /// of tasks on `r`, at required window starts and at forbidden window
    /// ends, so only those instants are tried.
    fn earliest_start(&self, task: &Task, r: usize, lo: i64) -> Option<i64> {
        let mut candidates = vec![lo];
        candidates.extend(
            self.placed
                .iter()
                .flatten()
                .filter(|p| p.resource == r && p.end > lo)
                .map(|p| p.end),
        );
        candidates.extend(task.windows.iter().filter_map(|w| match w.kind {
            WindowKind::Required if w.start > lo => Some(w.start),
            WindowKind::Forbidden if w.end > lo => Some(w.end),
            _ => None,
        }));
        candidates.sort_unstable();
        candidates.dedup();
        candidates.into_iter().find(|&s| self.fits(task, r, s))
    }

    fn fits(&self, task: &Task, r: usize, start: i64) -> bool {
        let end = start + task.duration;
        if end > self.problem.horizon {
            return false;
        }
        let mut required = task
            .windows
            .iter()
            .filter(|w| w.kind == WindowKind::Required)
            .peekable();
        if required.peek().is_some() && !required.any(|w| w.covers(start, end)) {
            return false;
        }
        if task
            .windows
            .iter()
            .any(|w| w.kind == WindowKind::Forbidden && w.overlaps(start, end))
        {
            return false;
        }

        // Usage only rises at task starts, so checking `start` and every
        // start inside the interval covers the peak.
        let on_r: Vec<(Placement, u32)> = self
            .placed
            .iter()
            .zip(&self.problem.tasks)
            .filter_map(|(p, t)| p.filter(|p| p.resource == r).map(|p| (p, t.units)))
            .collect();
        let capacity = self.problem.resources[r].capacity;
        std::iter::once(start)
            .chain(on_r.iter().map(|(p, _)| p.start).filter(|&s| s > start && s < end))
            .all(|tau| {
                let used: u32 = on_r
                    .iter()
                    .filter(|(p, _)| p.start <= tau && tau < p.end)
                    .map(|(_, u)| u)
                    .sum();
                used + task.units <= capacity
            })
    }

    fn record_leaf(&mut self) -> bool {
        let score = self.weights.score(&metrics(self.problem, &self.placed));
        if self.best.as_ref().map_or(true, |(_, best)| score < best - EPS) {
            debug!(nodes = self.nodes, score, "scheduling: new incumbent");
            self.best = Some((self.placed.clone(), score));
            let directed = report::directed(&self.problem.problem, score);
            self.trace.push(ConvergencePoint {
                iteration: self.nodes,
                best_fitness: directed,
                best_objective: directed,
                constraint_violation: 0.0,
            });
        }
        !self.params.exhaustive
    }
}

/// Constraint-programming style scheduler.
///
/// Tasks are ordered by a priority-guided topological sort. A depth-first
/// search then places each task in that order, branching over the eligible
/// resources (skills and units) at the earliest start that respects
/// dependencies, resource capacity, required and forbidden windows and the
/// horizon. Preferred windows are soft. When every weighted metric only
/// grows as tasks are added, partial schedules that cannot beat the
/// incumbent are pruned.
///
/// | outcome | status |
/// |---|---|
/// | exhaustive search completed | `Optimal` over earliest-start schedules |
/// | first schedule found (`exhaustive = false`) | `Feasible` |
/// | budget hit with an incumbent | `IterationLimit` / `TimeLimit` |
/// | dependency cycle, no eligible resource, or no schedule | `Infeasible` with per-task violations |
/// | cancelled before any schedule | `Cancelled` |
#[derive(Debug, Clone, Default)]
pub struct SchedulingSolver {
    params: SchedulingParams,
}

impl SchedulingSolver {
    pub fn new(params: SchedulingParams) -> Self {
        Self { params }
    }

    /// Solver configured from the problem's own parameters, falling back to
    /// defaults when another strategy is selected.
    pub fn from_problem(problem: &Problem) -> Self {
        match &problem.parameters.algorithm {
            AlgorithmParams::Scheduling(p) => Self::new(p.clone()),
            _ => Self::default(),
        }
    }

    pub fn params(&self) -> &SchedulingParams {
        &self.params
    }

    pub fn solve(
        &self,
        problem: &SchedulingProblem,
        ctx: &SolveContext,
    ) -> Result<ScheduleSolution, ValidationError> {
        problem.validate()?;
        self.params.validate()?;

        let generic = &problem.problem;
        let mut metadata = report::metadata(Algorithm::Scheduling, generic.parameters.seed);

        let preds: Vec<Vec<usize>> = problem
            .tasks
            .iter()
            .map(|t| {
                t.dependencies
                    .iter()
                    .filter_map(|d| problem.task_index(d))
                    .collect()
            })
            .collect();
        let order = match priority_order(problem, &preds) {
            Ok(order) => order,
            Err(blocked) => {
                let violations = task_violations(problem, &blocked, "dependency_cycle", |_| 1.0);
                return Ok(infeasible(problem, violations, metadata, ctx));
            }
        };

        let eligible: Vec<Vec<usize>> = problem
            .tasks
            .iter()
            .map(|t| {
                (0..problem.resources.len())
                    .filter(|&r| problem.resources[r].can_run(t))
                    .collect()
            })
            .collect();
        let stranded: Vec<usize> = (0..problem.tasks.len())
            .filter(|&t| eligible[t].is_empty())
            .collect();
        if !stranded.is_empty() {
            let violations = task_violations(problem, &stranded, "no_eligible_resource", |t| {
                problem.tasks[t].duration as f64
            });
            return Ok(infeasible(problem, violations, metadata, ctx));
        }

        let weights = Weights::new(generic, &self.params);
        let mut search = Search {
            problem,
            params: &self.params,
            ctx,
            weights,
            prunable: weights.monotone(),
            order,
            preds,
            eligible,
            placed: vec![None; problem.tasks.len()],
            max_nodes: generic.parameters.max_iterations,
            nodes: 0,
            dead_ends: vec![0; problem.tasks.len()],
            best: None,
            trace: Vec::new(),
            stop: None,
        };
        search.dfs(0);
        debug!(nodes = search.nodes, stop = ?search.stop, "scheduling: search done");

        metadata.iterations = search.nodes;
        metadata.cancelled = search.stop == Some(Stop::Interrupted(Interrupt::Cancelled));
        metadata.converged = search.stop.is_none();
        metadata.trace = std::mem::take(&mut search.trace);

        let Some((placed, _)) = search.best.take() else {
            if metadata.cancelled {
                metadata.runtime_ms = ctx.elapsed_ms();
                let mut solution = Solution::empty(generic.id.clone(), SolutionStatus::Cancelled);
                solution.metadata = metadata;
                return Ok(ScheduleSolution {
                    solution,
                    assignments: Vec::new(),
                    makespan: 0,
                });
            }
            let mut blocked: Vec<usize> = (0..problem.tasks.len())
                .filter(|&t| search.dead_ends[t] > 0)
                .collect();
            blocked.sort_by(|&a, &b| search.dead_ends[b].cmp(&search.dead_ends[a]).then(a.cmp(&b)));
            let violations = task_violations(problem, &blocked, "unschedulable", |t| {
                problem.tasks[t].duration as f64
            });
            return Ok(infeasible(problem, violations, metadata, ctx));
        };

        let status = match search.stop {
            None if self.params.exhaustive => SolutionStatus::Optimal,
            None => SolutionStatus::Feasible,
            Some(Stop::Interrupted(Interrupt::TimeLimit)) => SolutionStatus::TimeLimit,
            Some(Stop::Interrupted(Interrupt::Cancelled)) | Some(Stop::NodeBudget) => {
                SolutionStatus::IterationLimit
            }
        };
        metadata.runtime_ms = ctx.elapsed_ms();
        Ok(build_solution(problem, &placed, status, metadata))
    }
}

fn task_violations(
    problem: &SchedulingProblem,
    tasks: &[usize],
    reason: &str,
    magnitude: impl Fn(usize) -> f64,
) -> Vec<Violation> {
    tasks
        .iter()
        .map(|&t| {
            Violation::new(reason, magnitude(t), Severity::Critical)
                .with_subject(ViolationSubject::Task(problem.tasks[t].id.clone()))
        })
        .collect()
}

fn infeasible(
    problem: &SchedulingProblem,
    violations: Vec<Violation>,
    mut metadata: SolveMetadata,
    ctx: &SolveContext,
) -> ScheduleSolution {
    metadata.runtime_ms = ctx.elapsed_ms();
    let mut solution = Solution::empty(problem.problem.id.clone(), SolutionStatus::Infeasible);
    solution.violations = violations;
    solution.metadata = metadata;
    ScheduleSolution {
        solution,
        assignments: Vec::new(),
        makespan: 0,
    }
}

fn build_solution(
    problem: &SchedulingProblem,
    placed: &[Option<Placement>],
    status: SolutionStatus,
    metadata: SolveMetadata,
) -> ScheduleSolution {
    let m = metrics(problem, placed);
    let mut solution = Solution::empty(problem.problem.id.clone(), status);
    let mut assignments = Vec::new();
    for (task, p) in problem.tasks.iter().zip(placed) {
        let Some(p) = p else { continue };
        let resource = &problem.resources[p.resource];
        solution.variable_values.push(NamedValue::labelled(
            task.id.clone(),
            p.start as f64,
            Some(resource.id.clone()),
        ));
        assignments.push(ScheduledTask {
            task: task.id.clone(),
            resource: resource.id.clone(),
            start: p.start,
            end: p.end,
            overtime: overtime_of(resource.regular_end, p.start, p.end),
        });
    }
    assignments.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.task.cmp(&b.task)));
    solution.objective_values = vec![
        NamedValue::new("makespan", m.makespan),
        NamedValue::new("total_cost", m.total_cost),
        NamedValue::new("overtime", m.overtime),
        NamedValue::new("workload_imbalance", m.workload_imbalance),
        NamedValue::new("preferred_window_deviation", m.deviation),
    ];
    solution.metadata = metadata;
    ScheduleSolution {
        solution,
        makespan: m.makespan as i64,
        assignments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Objective;
    use crate::scheduling::model::{Resource, TaskWindow};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn solve(p: &SchedulingProblem) -> ScheduleSolution {
        SchedulingSolver::from_problem(&p.problem)
            .solve(p, &SolveContext::unbounded())
            .unwrap()
    }

    fn problem(tasks: Vec<Task>, resources: Vec<Resource>) -> SchedulingProblem {
        SchedulingProblem::new("plan", tasks, resources, 1_000)
    }

    fn with_params(mut p: SchedulingProblem, params: SchedulingParams) -> SchedulingProblem {
        p.problem.parameters.algorithm = AlgorithmParams::Scheduling(params);
        p
    }

    #[test]
    fn test_dependency_chain() {
        let p = problem(
            vec![Task::new("a", 2), Task::new("b", 3).after(["a"])],
            vec![Resource::new("r")],
        );
        let s = solve(&p);
        assert_eq!(s.solution.status, SolutionStatus::Optimal);
        assert_eq!(s.makespan, 5);
        assert_eq!(s.assignment("b").unwrap().start, 2);
        assert_eq!(s.solution.variable("b"), Some(2.0));
        assert_eq!(s.solution.objective("makespan"), Some(5.0));
        assert_eq!(s.solution.metadata.algorithm, "scheduling");
    }

    #[test]
    fn test_capacity_units() {
        let tasks = vec![Task::new("x", 4), Task::new("y", 4)];
        let shared = solve(&problem(tasks.clone(), vec![Resource::new("r").with_capacity(2)]));
        assert_eq!(shared.makespan, 4);
        let single = solve(&problem(tasks, vec![Resource::new("r")]));
        assert_eq!(single.makespan, 8);
        let (x, y) = (single.assignment("x").unwrap(), single.assignment("y").unwrap());
        assert!(x.end <= y.start || y.end <= x.start);
    }

    #[test]
    fn test_cycle_reports_tasks() {
        let p = problem(
            vec![
                Task::new("a", 1).after(["b"]),
                Task::new("b", 1).after(["a"]),
                Task::new("c", 1),
            ],
            vec![Resource::new("r")],
        );
        let s = solve(&p);
        assert_eq!(s.solution.status, SolutionStatus::Infeasible);
        let subjects: Vec<_> = s.solution.violations.iter().map(|v| v.subject.clone()).collect();
        assert_eq!(
            subjects,
            vec![
                ViolationSubject::Task("a".into()),
                ViolationSubject::Task("b".into())
            ]
        );
        assert!(s.solution.violations.iter().all(|v| v.constraint == "dependency_cycle"));
    }

    #[test]
    fn test_skill_matching() {
        let p = problem(
            vec![Task::new("weld", 2).with_skills(["welding"])],
            vec![Resource::new("r1"), Resource::new("r2").with_skills(["welding"])],
        );
        let s = solve(&p);
        assert_eq!(s.assignment("weld").unwrap().resource, "r2");
        assert_eq!(s.solution.variable_values[0].label.as_deref(), Some("r2"));
    }

    #[test]
    fn test_no_eligible_resource() {
        let p = problem(
            vec![Task::new("paint", 2).with_skills(["painting"]), Task::new("easy", 1)],
            vec![Resource::new("r1")],
        );
        let s = solve(&p);
        assert_eq!(s.solution.status, SolutionStatus::Infeasible);
        assert_eq!(s.solution.violations.len(), 1);
        assert_eq!(s.solution.violations[0].subject, ViolationSubject::Task("paint".into()));
        assert_eq!(s.solution.violations[0].constraint, "no_eligible_resource");
    }

    #[test]
    fn test_required_and_forbidden_windows() {
        let p = problem(
            vec![
                Task::new("late", 5).with_window(TaskWindow::required(10, 20)),
                Task::new("blocked", 3).with_window(TaskWindow::forbidden(0, 10)),
            ],
            vec![Resource::new("r").with_capacity(2)],
        );
        let s = solve(&p);
        assert_eq!(s.assignment("late").unwrap().start, 10);
        assert_eq!(s.assignment("blocked").unwrap().start, 10);
    }

    #[test]
    fn test_window_outside_horizon_is_unschedulable() {
        let mut p = problem(
            vec![Task::new("t", 5).with_window(TaskWindow::required(0, 3))],
            vec![Resource::new("r")],
        );
        p.horizon = 100;
        let s = solve(&p);
        assert_eq!(s.solution.status, SolutionStatus::Infeasible);
        assert_eq!(s.solution.violations[0].constraint, "unschedulable");
        assert_eq!(s.solution.violations[0].subject, ViolationSubject::Task("t".into()));
    }

    #[test]
    fn test_overtime_cost() {
        let mut p = problem(
            vec![Task::new("a", 3), Task::new("b", 3).after(["a"])],
            vec![Resource::new("r").with_cost(1.0).with_overtime(4, 2.0)],
        );
        p.problem.objectives = vec![Objective::metric("total_cost", Direction::Minimize)];
        let s = solve(&p);
        assert_eq!(s.solution.objective("overtime"), Some(2.0));
        assert_eq!(s.solution.objective("total_cost"), Some(6.0 + 4.0));
        assert_eq!(s.assignment("b").unwrap().overtime, 2);
        assert_eq!(s.assignment("a").unwrap().overtime, 0);
    }

    #[test]
    fn test_priority_guides_first_schedule() {
        let p = with_params(
            problem(
                vec![Task::new("low", 2), Task::new("high", 2).with_priority(5)],
                vec![Resource::new("r")],
            ),
            SchedulingParams::first_feasible(),
        );
        let s = solve(&p);
        assert_eq!(s.solution.status, SolutionStatus::Feasible);
        assert_eq!(s.assignment("high").unwrap().start, 0);
        assert_eq!(s.assignment("low").unwrap().start, 2);
    }

    #[test]
    fn test_branch_and_bound_beats_greedy() {
        let tasks = vec![
            Task::new("a", 3).with_priority(3),
            Task::new("b", 3).with_priority(2),
            Task::new("c", 6).with_priority(1),
        ];
        let resources = vec![Resource::new("r1"), Resource::new("r2")];
        let greedy = solve(&with_params(
            problem(tasks.clone(), resources.clone()),
            SchedulingParams::first_feasible(),
        ));
        assert_eq!(greedy.makespan, 9);

        let exact = solve(&problem(tasks, resources));
        assert_eq!(exact.solution.status, SolutionStatus::Optimal);
        assert_eq!(exact.makespan, 6);
        let trace: Vec<f64> = exact.solution.metadata.trace.iter().map(|t| t.best_fitness).collect();
        assert_eq!(trace, vec![9.0, 6.0]);
    }

    #[test]
    fn test_preferred_window_delays_start() {
        let p = with_params(
            problem(
                vec![Task::new("t", 2).with_window(TaskWindow::preferred(5, 10))],
                vec![Resource::new("r")],
            ),
            SchedulingParams::default().with_preferred_window_penalty(10.0),
        );
        let s = solve(&p);
        assert_eq!(s.assignment("t").unwrap().start, 5);
        assert_eq!(s.solution.objective("preferred_window_deviation"), Some(0.0));
    }

    #[test]
    fn test_node_budget() {
        let tasks = (0..6).map(|i| Task::new(format!("t{i}"), 1 + i)).collect();
        let resources = vec![Resource::new("r1"), Resource::new("r2"), Resource::new("r3")];
        let mut p = problem(tasks, resources);
        p.problem.parameters.max_iterations = 10;
        let s = solve(&p);
        assert_eq!(s.solution.status, SolutionStatus::IterationLimit);
        assert_eq!(s.solution.metadata.iterations, 10);
        assert_eq!(s.assignments.len(), 6);
    }

    #[test]
    fn test_cancelled_before_start() {
        let p = problem(vec![Task::new("a", 1)], vec![Resource::new("r")]);
        let flag = Arc::new(AtomicBool::new(true));
        let s = SchedulingSolver::default()
            .solve(&p, &SolveContext::new(None, Some(flag)))
            .unwrap();
        assert_eq!(s.solution.status, SolutionStatus::Cancelled);
        assert!(s.assignments.is_empty());
    }
}
