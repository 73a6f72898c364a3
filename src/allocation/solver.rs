//! Resource-to-demand allocation as a linear program.

use super::config::AllocationParams;
use super::model::{
    validate_allocation, Allocation, AllocationPlan, Demand, Resource, Shortfall,
};
use super::simplex::{LinearProgram, LpOutcome, LpSolution, Relation};
use crate::context::{Interrupt, SolveContext};
use crate::error::ValidationError;
use crate::model::validate::validate_problem;
use crate::model::{
    Algorithm, AlgorithmParams, ConstraintSensitivity, ConvergencePoint, NamedValue,
    ObjectiveSensitivity, Problem, Sensitivity, Severity, Solution, SolutionStatus,
    SolveMetadata, VariableSensitivity, Violation,
};
use crate::report;
use tracing::debug;

const QUANTITY_EPS: f64 = 1e-9;

/// Column layout of the allocation LP.
struct Layout {
    /// `(resource, demand)` per allocation column.
    pairs: Vec<(usize, usize)>,
    /// Whether one shortage column per demand follows the pair columns.
    shortage: bool,
}

impl Layout {
    fn shortage_col(&self, demand: usize) -> usize {
        self.pairs.len() + demand
    }
}

/// Builds the LP. Pair columns cost the resource's unit cost and are bounded
/// by `min(capacity, quantity)`. Rows: one capacity (`<=`) per resource,
/// then one quantity (`=`) per demand.
fn build(
    resources: &[Resource],
    demands: &[Demand],
    shortage_cost: Option<f64>,
    pair_costs: bool,
) -> (LinearProgram, Layout) {
    let pairs: Vec<(usize, usize)> = resources
        .iter()
        .enumerate()
        .flat_map(|(r, res)| {
            demands
                .iter()
                .enumerate()
                .filter(move |(_, d)| res.can_serve(d))
                .map(move |(d, _)| (r, d))
        })
        .collect();
    let layout = Layout {
        pairs,
        shortage: shortage_cost.is_some(),
    };

    let mut costs: Vec<f64> = layout
        .pairs
        .iter()
        .map(|&(r, _)| if pair_costs { resources[r].unit_cost } else { 0.0 })
        .collect();
    if let Some(penalty) = shortage_cost {
        costs.extend(std::iter::repeat(penalty).take(demands.len()));
    }
    let n = costs.len();
    let mut lp = LinearProgram::new(costs);

    for (j, &(r, d)) in layout.pairs.iter().enumerate() {
        lp.set_upper(j, resources[r].capacity.min(demands[d].quantity));
    }
    if layout.shortage {
        for (d, demand) in demands.iter().enumerate() {
            lp.set_upper(layout.shortage_col(d), demand.quantity);
        }
    }

    for (r, res) in resources.iter().enumerate() {
        let mut row = vec![0.0; n];
        for (j, _) in layout.pairs.iter().enumerate().filter(|(_, p)| p.0 == r) {
            row[j] = 1.0;
        }
        lp.add_row(row, Relation::Le, res.capacity);
    }
    for (d, demand) in demands.iter().enumerate() {
        let mut row = vec![0.0; n];
        for (j, _) in layout.pairs.iter().enumerate().filter(|(_, p)| p.1 == d) {
            row[j] = 1.0;
        }
        if layout.shortage {
            row[layout.shortage_col(d)] = 1.0;
        }
        lp.add_row(row, Relation::Eq, demand.quantity);
    }
    (lp, layout)
}

/// Allocates resource capacity to demands at minimum total cost.
///
/// One continuous variable per eligible `(resource, demand)` pair (the
/// resource offers every skill the demand requires), bounded by
/// `[0, min(capacity, quantity)]`. Capacity rows are `<=`; quantity rows are
/// `=`, so every demand is met exactly unless partial fulfilment is
/// enabled, in which case a shortage variable per demand absorbs the
/// remainder at `shortage_penalty` per unit.
///
/// Variables are named `"{resource}->{demand}"` (and `"unmet:{demand}"`),
/// constraints `"capacity:{resource}"` and `"demand:{demand}"`. The
/// sensitivity section carries the LP duals as shadow prices and the
/// reduced costs of every column.
///
/// A problem that cannot meet every demand without partial fulfilment is
/// `Infeasible`; its violation list names each demand and the minimum
/// shortfall it would have.
#[derive(Debug, Clone, Default)]
pub struct AllocationSolver {
    params: AllocationParams,
}

impl AllocationSolver {
    pub fn new(params: AllocationParams) -> Self {
        Self { params }
    }

    /// Solver configured from the problem's own parameters, falling back to
    /// defaults when another strategy is selected.
    pub fn from_problem(problem: &Problem) -> Self {
        match &problem.parameters.algorithm {
            AlgorithmParams::LinearProgramming(p) => Self::new(p.clone()),
            _ => Self::default(),
        }
    }

    pub fn params(&self) -> &AllocationParams {
        &self.params
    }

    pub fn solve(
        &self,
        problem: &Problem,
        resources: &[Resource],
        demands: &[Demand],
        ctx: &SolveContext,
    ) -> Result<Solution, ValidationError> {
        self.plan(problem, resources, demands, ctx).map(|plan| plan.solution)
    }

    /// Like [`solve`](Self::solve), also returning the allocations.
    pub fn plan(
        &self,
        problem: &Problem,
        resources: &[Resource],
        demands: &[Demand],
        ctx: &SolveContext,
    ) -> Result<AllocationPlan, ValidationError> {
        validate_problem(problem, false)?;
        if !problem.variables.is_empty() || !problem.constraints.is_empty() {
            return Err(ValidationError::AlgorithmMismatch {
                strategy: Algorithm::LinearProgramming.to_string(),
                reason: "allocation variables and constraints are derived from resources and demands"
                    .into(),
            });
        }
        self.params.validate()?;
        validate_allocation(resources, demands)?;

        let shortage = self.params.allow_partial.then_some(self.params.shortage_penalty);
        let (lp, layout) = build(resources, demands, shortage, true);
        let limit = self.params.pivot_limit.unwrap_or_else(|| {
            let size = lp.num_rows() + 2 * lp.num_vars();
            problem.parameters.max_iterations.max(10 * size)
        });

        let mut interrupt = None;
        let outcome = lp.solve_with(limit, || {
            interrupt = ctx.interrupt();
            interrupt.is_some()
        });

        let mut metadata = report::metadata(Algorithm::LinearProgramming, None);
        metadata.runtime_ms = ctx.elapsed_ms();
        let empty = |status: SolutionStatus, metadata: SolveMetadata| {
            let mut solution = Solution::empty(problem.id.clone(), status);
            solution.metadata = metadata;
            AllocationPlan {
                solution,
                allocations: Vec::new(),
                shortfalls: Vec::new(),
            }
        };

        let lp_solution = match outcome {
            LpOutcome::Optimal(s) => s,
            LpOutcome::Infeasible => {
                let mut plan = empty(SolutionStatus::Infeasible, metadata);
                plan.solution.violations = shortfall_violations(resources, demands, limit);
                return Ok(plan);
            }
            LpOutcome::Unbounded => return Ok(empty(SolutionStatus::Unbounded, metadata)),
            LpOutcome::PivotLimit => {
                metadata.iterations = limit;
                return Ok(empty(SolutionStatus::IterationLimit, metadata));
            }
            LpOutcome::Interrupted => {
                let status = if interrupt == Some(Interrupt::TimeLimit) {
                    SolutionStatus::TimeLimit
                } else {
                    metadata.cancelled = true;
                    SolutionStatus::Cancelled
                };
                return Ok(empty(status, metadata));
            }
        };
        debug!(pivots = lp_solution.pivots, cost = lp_solution.objective, "allocation: optimal");

        metadata.iterations = lp_solution.pivots;
        metadata.converged = true;
        Ok(assemble(problem, resources, demands, &layout, &lp_solution, metadata))
    }
}

fn assemble(
    problem: &Problem,
    resources: &[Resource],
    demands: &[Demand],
    layout: &Layout,
    lp: &LpSolution,
    mut metadata: SolveMetadata,
) -> AllocationPlan {
    let mut allocations = Vec::new();
    let mut variable_values = Vec::new();
    let mut variables = Vec::new();
    let mut total_cost = 0.0;

    for (j, &(r, d)) in layout.pairs.iter().enumerate() {
        let name = format!("{}->{}", resources[r].id, demands[d].id);
        let quantity = lp.x[j];
        let cost = quantity * resources[r].unit_cost;
        total_cost += cost;
        if quantity > QUANTITY_EPS {
            allocations.push(Allocation {
                resource: resources[r].id.clone(),
                demand: demands[d].id.clone(),
                quantity,
                cost,
            });
        }
        variable_values.push(NamedValue::new(name.clone(), quantity));
        variables.push(VariableSensitivity {
            name,
            reduced_cost: lp.reduced_costs[j],
        });
    }

    let mut shortfalls = Vec::new();
    if layout.shortage {
        for (d, demand) in demands.iter().enumerate() {
            let j = layout.shortage_col(d);
            let name = format!("unmet:{}", demand.id);
            if lp.x[j] > QUANTITY_EPS {
                shortfalls.push(Shortfall {
                    demand: demand.id.clone(),
                    quantity: lp.x[j],
                });
            }
            variable_values.push(NamedValue::new(name.clone(), lp.x[j]));
            variables.push(VariableSensitivity {
                name,
                reduced_cost: lp.reduced_costs[j],
            });
        }
    }

    let constraint_names = resources
        .iter()
        .map(|r| format!("capacity:{}", r.id))
        .chain(demands.iter().map(|d| format!("demand:{}", d.id)));
    let constraints = constraint_names
        .zip(lp.slacks.iter().zip(&lp.duals))
        .map(|(name, (&slack, &shadow_price))| ConstraintSensitivity {
            name,
            slack,
            shadow_price,
        })
        .collect();

    let mut objective_values = vec![NamedValue::new("total_cost", total_cost)];
    let mut objectives = vec![ObjectiveSensitivity {
        name: "total_cost".into(),
        shadow_price: total_cost,
    }];
    if layout.shortage {
        let unmet: f64 = shortfalls.iter().map(|s| s.quantity).sum();
        objective_values.push(NamedValue::new("unmet_demand", unmet));
        objectives.push(ObjectiveSensitivity {
            name: "unmet_demand".into(),
            shadow_price: unmet,
        });
    }

    metadata.trace = vec![ConvergencePoint {
        iteration: lp.pivots,
        best_fitness: lp.objective,
        best_objective: total_cost,
        constraint_violation: 0.0,
    }];

    let mut solution = Solution::empty(problem.id.clone(), SolutionStatus::Optimal);
    solution.objective_values = objective_values;
    solution.variable_values = variable_values;
    solution.metadata = metadata;
    solution.sensitivity = Sensitivity {
        objectives,
        constraints,
        variables,
    };
    AllocationPlan {
        solution,
        allocations,
        shortfalls,
    }
}

/// Minimum shortfall per demand, from the LP that only minimizes unmet
/// quantity.
fn shortfall_violations(resources: &[Resource], demands: &[Demand], limit: usize) -> Vec<Violation> {
    let (lp, layout) = build(resources, demands, Some(1.0), false);
    let LpOutcome::Optimal(s) = lp.solve(limit) else {
        return Vec::new();
    };
    demands
        .iter()
        .enumerate()
        .filter_map(|(d, demand)| {
            let short = s.x[layout.shortage_col(d)];
            (short > QUANTITY_EPS).then(|| {
                Violation::new(
                    format!("demand:{}", demand.id),
                    short,
                    Severity::grade(short, demand.quantity),
                )
            })
        })
        .collect()
}
