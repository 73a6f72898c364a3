//! Genetic algorithm solver for generic problems.
//!
//! # Fitness
//!
//! ```text
//! fitness(x) = Σ_i w_i · sign_i · f_i(x)  +  penalty_weight · Σ_c violation_c(x)
//! ```
//!
//! where `sign_i` is `-1` for maximized objectives. Lower is better. With the
//! default `penalty_weight = 1e6` any measurable violation outweighs
//! objective differences, so a feasible individual beats an infeasible one
//! of otherwise equal fitness. A `NaN` fitness is treated as `+∞`.
//!
//! # Status
//!
//! | outcome | status |
//! |---|---|
//! | best individual violates a constraint | `Infeasible` (values attached) |
//! | converged | `Feasible` |
//! | generation budget exhausted | `IterationLimit` |
//! | time limit | `TimeLimit` |
//! | cancelled after ≥ 1 generation | `IterationLimit`, `metadata.cancelled` |
//! | cancelled before the first generation | `Cancelled`, no values |

use super::config::GeneticParams;
use super::encoding::{Candidate, Encoding};
use crate::context::SolveContext;
use crate::error::ValidationError;
use crate::evaluator::ConstraintEvaluator;
use crate::ga::multi_objective::non_dominated_sort;
use crate::ga::{GaProblem, GaRunner, Termination};
use crate::model::validate::validate_searchable;
use crate::model::{
    Algorithm, AlgorithmParams, ConvergencePoint, Problem, Solution, SolutionStatus,
};
use crate::report;
use rand::Rng;

/// Penalised weighted-sum encoding of a [`Problem`] for [`GaRunner`].
struct PenalizedProblem<'a> {
    encoding: Encoding<'a>,
    evaluator: ConstraintEvaluator,
    penalty_weight: f64,
}

impl PenalizedProblem<'_> {
    fn fitness(&self, genes: &[f64]) -> f64 {
        let problem = self.encoding.problem();
        let objective = report::scalar_objective(problem, genes);
        let violation = self.evaluator.total_violation(genes, &problem.constraints);
        let fitness = objective + self.penalty_weight * violation;
        if fitness.is_nan() {
            f64::INFINITY
        } else {
            fitness
        }
    }
}

impl GaProblem for PenalizedProblem<'_> {
    type Individual = Candidate;

    fn create_individual<R: Rng>(&self, rng: &mut R) -> Candidate {
        Candidate::new(self.encoding.sample(rng))
    }

    fn evaluate(&self, individual: &Candidate) -> f64 {
        self.fitness(&individual.genes)
    }

    fn crossover<R: Rng>(&self, p1: &Candidate, p2: &Candidate, rng: &mut R) -> (Candidate, Candidate) {
        let (a, b) = self.encoding.crossover(&p1.genes, &p2.genes, rng);
        (Candidate::new(a), Candidate::new(b))
    }

    fn mutate<R: Rng>(&self, individual: &mut Candidate, rate: f64, rng: &mut R) {
        self.encoding.mutate(&mut individual.genes, rate, rng);
    }
}

/// Single- and weighted multi-objective genetic algorithm.
#[derive(Debug, Clone, Default)]
pub struct GeneticSolver {
    params: GeneticParams,
}

impl GeneticSolver {
    pub fn new(params: GeneticParams) -> Self {
        Self { params }
    }

    /// Solver configured from the problem's own parameters. When another
    /// strategy is selected the population is sized from the variable count.
    pub fn from_problem(problem: &Problem) -> Self {
        match &problem.parameters.algorithm {
            AlgorithmParams::Genetic(p) => Self::new(p.clone()),
            _ => Self::new(GeneticParams::auto_select(problem.variables.len())),
        }
    }

    pub fn params(&self) -> &GeneticParams {
        &self.params
    }

    pub fn solve(&self, problem: &Problem, ctx: &SolveContext) -> Result<Solution, ValidationError> {
        validate_searchable(problem)?;
        self.params.validate()?;

        let solver = &problem.parameters;
        let seed = solver.seed.unwrap_or_else(rand::random);
        let mut config = self.params.ga_config(solver);
        config.seed = Some(seed);
        config.time_limit_ms = ctx.remaining_ms();

        let evaluator = ConstraintEvaluator::new(solver.tolerance);
        let ga = PenalizedProblem {
            encoding: Encoding::new(problem, self.params.mutation_scale),
            evaluator,
            penalty_weight: self.params.penalty_weight,
        };

        let mut trace = Vec::new();
        let result = GaRunner::run_with_observer(&ga, &config, ctx.cancel_token(), |stats, best| {
            trace.push(ConvergencePoint {
                iteration: stats.generation,
                best_fitness: report::directed(problem, stats.best_fitness),
                best_objective: report::directed(problem, report::scalar_objective(problem, &best.genes)),
                constraint_violation: evaluator.total_violation(&best.genes, &problem.constraints),
            });
        })?;

        let mut metadata = report::metadata(Algorithm::Genetic, Some(seed));
        metadata.iterations = result.generations;
        metadata.converged = result.termination == Termination::Converged;
        metadata.cancelled = result.cancelled();
        metadata.trace = trace;
        metadata.runtime_ms = ctx.elapsed_ms();

        if result.cancelled() && result.generations == 0 {
            let mut solution = Solution::empty(problem.id.clone(), SolutionStatus::Cancelled);
            solution.metadata = metadata;
            return Ok(solution);
        }

        let best = &result.best.genes;
        let status = if !evaluator.is_feasible(best, &problem.constraints) {
            SolutionStatus::Infeasible
        } else {
            match result.termination {
                Termination::Converged => SolutionStatus::Feasible,
                Termination::TimeLimit => SolutionStatus::TimeLimit,
                Termination::MaxGenerations | Termination::Cancelled => {
                    SolutionStatus::IterationLimit
                }
            }
        };

        let mut solution = report::assignment_solution(problem, status, best, &evaluator, metadata);
        solution.alternatives = self.alternatives(problem, &result.population, &evaluator);
        Ok(solution)
    }

    /// Top-K distinct individuals of the final population, best first, with
    /// domination counts measured against the whole population.
    fn alternatives(
        &self,
        problem: &Problem,
        population: &[Candidate],
        evaluator: &ConstraintEvaluator,
    ) -> Vec<crate::model::Alternative> {
        let objectives: Vec<Vec<f64>> = population
            .iter()
            .map(|c| {
                problem
                    .objectives
                    .iter()
                    .map(|o| o.direction.sign() * o.evaluate(&c.genes))
                    .collect()
            })
            .collect();
        let violations: Vec<f64> = population
            .iter()
            .map(|c| evaluator.total_violation(&c.genes, &problem.constraints))
            .collect();
        let sorted = non_dominated_sort(&objectives, &violations);

        let mut chosen: Vec<usize> = Vec::new();
        for (i, c) in population.iter().enumerate() {
            if chosen.len() >= self.params.alternatives {
                break;
            }
            if chosen.iter().all(|&j| population[j].genes != c.genes) {
                chosen.push(i);
            }
        }

        chosen
            .into_iter()
            .enumerate()
            .map(|(rank, i)| {
                let mut alt =
                    report::alternative(problem, &population[i].genes, rank, population[i].fitness, evaluator);
                alt.domination_count = sorted.domination_counts[i];
                alt.dominates = sorted.dominated_counts[i];
                alt
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Constraint, ConvergenceCriterion, ConvergenceKind, Expr, Objective, Operator,
        SolverParameters, Variable,
    };
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn params(seed: u64) -> SolverParameters {
        SolverParameters::default()
            .with_algorithm(AlgorithmParams::Genetic(
                GeneticParams::default()
                    .with_population_size(40)
                    .with_mutation_rate(0.5),
            ))
            .with_max_iterations(300)
            .with_convergence(ConvergenceCriterion::new(ConvergenceKind::Absolute, 1e-4, 30))
            .with_seed(seed)
    }

    fn min_x_at_least_5() -> Problem {
        let mut p = Problem::new("min-x").with_parameters(params(42));
        let x = p.add_variable(Variable::continuous("x", 0.0, 10.0));
        p.add_objective(Objective::minimize("x", x));
        p.add_constraint(Constraint::inequality("x>=5", Expr::var(0), Operator::Ge, 5.0));
        p
    }

    #[test]
    fn test_min_x_with_lower_bound() {
        let p = min_x_at_least_5();
        let s = GeneticSolver::from_problem(&p).solve(&p, &SolveContext::unbounded()).unwrap();
        let x = s.variable("x").unwrap();
        assert!((x - 5.0).abs() < 0.05, "x = {x}");
        assert!(s.violations.is_empty());
        assert!(matches!(s.status, SolutionStatus::Feasible | SolutionStatus::IterationLimit));
        assert_eq!(s.metadata.algorithm, "genetic");
        assert_eq!(s.metadata.seed, Some(42));
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let p = min_x_at_least_5();
        let solver = GeneticSolver::from_problem(&p);
        let a = solver.solve(&p, &SolveContext::unbounded()).unwrap();
        let b = solver.solve(&p, &SolveContext::unbounded()).unwrap();
        assert!(a.same_outcome(&b));
    }

    #[test]
    fn test_trace_non_increasing_for_minimize() {
        let p = min_x_at_least_5();
        let s = GeneticSolver::from_problem(&p).solve(&p, &SolveContext::unbounded()).unwrap();
        assert_eq!(s.metadata.trace.len(), s.metadata.iterations);
        for w in s.metadata.trace.windows(2) {
            assert!(w[1].best_fitness <= w[0].best_fitness);
        }
    }

    #[test]
    fn test_trace_non_decreasing_for_maximize() {
        let mut p = Problem::new("max").with_parameters(params(3));
        let x = p.add_variable(Variable::continuous("x", 0.0, 4.0));
        let y = p.add_variable(Variable::integer("y", 0, 6));
        p.add_objective(Objective::maximize("xy", x.clone() * y.clone() - x.clone() * x));
        p.add_constraint(Constraint::inequality("y<=5", y, Operator::Le, 5.0));
        let s = GeneticSolver::from_problem(&p).solve(&p, &SolveContext::unbounded()).unwrap();
        for w in s.metadata.trace.windows(2) {
            assert!(w[1].best_fitness >= w[0].best_fitness);
        }
        assert!(s.violations.is_empty());
    }

    #[test]
    fn test_alternatives_are_distinct_and_ranked() {
        let p = min_x_at_least_5();
        let s = GeneticSolver::from_problem(&p).solve(&p, &SolveContext::unbounded()).unwrap();
        assert!(!s.alternatives.is_empty() && s.alternatives.len() <= 5);
        for (i, a) in s.alternatives.iter().enumerate() {
            assert_eq!(a.rank, i);
        }
        for w in s.alternatives.windows(2) {
            assert!(w[0].fitness <= w[1].fitness);
            assert_ne!(w[0].variable_values, w[1].variable_values);
        }
    }

    #[test]
    fn test_infeasible_problem_reported() {
        let mut p = Problem::new("contradiction").with_parameters(params(1));
        let x = p.add_variable(Variable::integer("x", 0, 5));
        p.add_objective(Objective::minimize("x", x));
        p.add_constraint(Constraint::equality("x=1", Expr::var(0), 1.0));
        p.add_constraint(Constraint::equality("x=2", Expr::var(0), 2.0));
        let s = GeneticSolver::from_problem(&p).solve(&p, &SolveContext::unbounded()).unwrap();
        assert_eq!(s.status, SolutionStatus::Infeasible);
        assert!(!s.violations.is_empty());
    }

    #[test]
    fn test_cancelled_before_first_generation() {
        let p = min_x_at_least_5();
        let ctx = SolveContext::new(None, Some(Arc::new(AtomicBool::new(true))));
        let s = GeneticSolver::from_problem(&p).solve(&p, &ctx).unwrap();
        assert_eq!(s.status, SolutionStatus::Cancelled);
        assert!(s.variable_values.is_empty());
        assert!(s.metadata.cancelled);
    }

    #[test]
    fn test_iteration_limit_without_convergence() {
        let mut p = min_x_at_least_5();
        p.parameters = params(9)
            .with_max_iterations(3)
            .with_convergence(ConvergenceCriterion::disabled());
        let s = GeneticSolver::from_problem(&p).solve(&p, &SolveContext::unbounded()).unwrap();
        assert_eq!(s.metadata.iterations, 3);
        assert!(matches!(
            s.status,
            SolutionStatus::IterationLimit | SolutionStatus::Infeasible
        ));
    }

    #[test]
    fn test_population_sized_from_variables_without_genetic_params() {
        let mut p = Problem::new("wide");
        for i in 0..60 {
            p.add_variable(Variable::binary(format!("b{i}")));
        }
        assert_eq!(GeneticSolver::from_problem(&p).params().population_size, 100);
        assert_eq!(
            GeneticSolver::from_problem(&min_x_at_least_5()).params().population_size,
            40
        );
    }

    #[test]
    fn test_rejects_unbounded_variable() {
        let mut p = min_x_at_least_5();
        p.variables[0].upper = None;
        assert!(matches!(
            GeneticSolver::default().solve(&p, &SolveContext::unbounded()),
            Err(ValidationError::UnboundedVariable(_))
        ));
    }
}
