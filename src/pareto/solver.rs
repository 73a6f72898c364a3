//! NSGA-II loop.
//!
//! Per generation: crowded-tournament selection, single-point crossover and
//! Gaussian mutation produce `N` offspring; parents and offspring are merged
//! and the next population is filled front by front under constrained
//! dominance, the last admitted front truncated by descending crowding
//! distance.
//!
//! The reported front is ordered by normalized, weighted distance to the
//! front's ideal point; the closest member becomes the primary solution.

use super::config::ParetoParams;
use crate::context::{Interrupt, SolveContext};
use crate::error::ValidationError;
use crate::evaluator::ConstraintEvaluator;
use crate::ga::multi_objective::{
    crowded_better, crowding_distance, dominates, non_dominated_sort, NondominatedSortResult,
};
use crate::ga::tournament_by;
use crate::genetic::Encoding;
use crate::model::validate::validate_searchable;
use crate::model::{
    Algorithm, AlgorithmParams, Alternative, ConvergencePoint, Problem, Solution, SolutionStatus,
};
use crate::random::create_rng;
use crate::report;
use rand::Rng;
use rayon::prelude::*;
use tracing::debug;

/// Scalar used only for the convergence trace.
const TRACE_PENALTY: f64 = 1e6;

#[derive(Debug, Clone)]
struct Member {
    genes: Vec<f64>,
    /// Minimization form.
    objectives: Vec<f64>,
    violation: f64,
    rank: usize,
    crowding: f64,
}

/// Multi-objective solver returning a Pareto front.
#[derive(Debug, Clone, Default)]
pub struct ParetoSolver {
    params: ParetoParams,
}

impl ParetoSolver {
    pub fn new(params: ParetoParams) -> Self {
        Self { params }
    }

    pub fn from_problem(problem: &Problem) -> Self {
        match &problem.parameters.algorithm {
            AlgorithmParams::Pareto(p) => Self::new(p.clone()),
            _ => Self::default(),
        }
    }

    pub fn solve(&self, problem: &Problem, ctx: &SolveContext) -> Result<Solution, ValidationError> {
        validate_searchable(problem)?;
        self.params.validate()?;

        let solver = &problem.parameters;
        let seed = solver.seed.unwrap_or_else(rand::random);
        let mut rng = create_rng(seed);
        let evaluator = ConstraintEvaluator::new(solver.tolerance);
        let encoding = Encoding::new(problem, self.params.mutation_scale);
        let n = self.params.population_size;

        let genes: Vec<Vec<f64>> = (0..n).map(|_| encoding.sample(&mut rng)).collect();
        let mut population = evaluate(problem, &evaluator, genes, solver.parallel);
        assign_ranks(&mut population);

        let mut best = TraceBest::of(problem, &population);
        let mut history = vec![best.scalar];
        let mut trace = Vec::new();
        let mut generations = 0;
        let mut stop: Option<Interrupt> = None;
        let mut converged = false;
        // Offspring of the last generation, kept to measure the front against.
        let mut last_offspring: Vec<Member> = Vec::new();

        while generations < solver.max_iterations {
            if let Some(interrupt) = ctx.interrupt() {
                stop = Some(interrupt);
                break;
            }

            let mut offspring = Vec::with_capacity(n + 1);
            while offspring.len() < n {
                let p1 = self.select(&population, &mut rng);
                let p2 = self.select(&population, &mut rng);
                let (mut a, mut b) = if rng.random::<f64>() < self.params.crossover_rate {
                    encoding.crossover(&population[p1].genes, &population[p2].genes, &mut rng)
                } else {
                    (population[p1].genes.clone(), population[p2].genes.clone())
                };
                encoding.mutate(&mut a, self.params.mutation_rate, &mut rng);
                encoding.mutate(&mut b, self.params.mutation_rate, &mut rng);
                offspring.push(a);
                offspring.push(b);
            }
            offspring.truncate(n);

            let mut combined = population;
            last_offspring = evaluate(problem, &evaluator, offspring, solver.parallel);
            combined.extend(last_offspring.iter().cloned());
            population = environmental_selection(combined, n);
            generations += 1;

            let candidate = TraceBest::of(problem, &population);
            if candidate.scalar < best.scalar {
                best = candidate;
                debug!(generation = generations, best = best.scalar, "pareto improvement");
            }
            history.push(best.scalar);
            trace.push(ConvergencePoint {
                iteration: generations,
                best_fitness: report::directed(problem, best.scalar),
                best_objective: report::directed(problem, best.objective),
                constraint_violation: best.violation,
            });

            if solver.convergence.is_converged(&history) {
                converged = true;
                break;
            }
        }

        let mut metadata = report::metadata(Algorithm::Pareto, Some(seed));
        metadata.iterations = generations;
        metadata.converged = converged;
        metadata.cancelled = stop == Some(Interrupt::Cancelled);
        metadata.trace = trace;
        metadata.runtime_ms = ctx.elapsed_ms();

        if stop == Some(Interrupt::Cancelled) && generations == 0 {
            let mut solution = Solution::empty(problem.id.clone(), SolutionStatus::Cancelled);
            solution.metadata = metadata;
            return Ok(solution);
        }

        let alternatives = front(problem, &population, &last_offspring, &evaluator);
        // a population is never empty, so the front is not either
        let primary = alternatives
            .first()
            .map(|a| a.variable_values.iter().map(|v| v.value).collect::<Vec<f64>>())
            .unwrap_or_default();

        let status = if !evaluator.is_feasible(&primary, &problem.constraints) {
            SolutionStatus::Infeasible
        } else if converged {
            SolutionStatus::Feasible
        } else if stop == Some(Interrupt::TimeLimit) {
            SolutionStatus::TimeLimit
        } else {
            SolutionStatus::IterationLimit
        };

        let mut solution = report::assignment_solution(problem, status, &primary, &evaluator, metadata);
        solution.alternatives = alternatives;
        Ok(solution)
    }

    fn select<R: Rng>(&self, population: &[Member], rng: &mut R) -> usize {
        tournament_by(population.len(), self.params.tournament_size, rng, |a, b| {
            let (a, b) = (&population[a], &population[b]);
            crowded_better(a.rank, a.crowding, b.rank, b.crowding)
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct TraceBest {
    scalar: f64,
    objective: f64,
    violation: f64,
}

impl TraceBest {
    /// Best penalised weighted sum among the population.
    fn of(problem: &Problem, population: &[Member]) -> Self {
        population
            .iter()
            .map(|m| {
                let objective = weighted(problem, &m.objectives);
                TraceBest {
                    scalar: objective + TRACE_PENALTY * m.violation,
                    objective,
                    violation: m.violation,
                }
            })
            .min_by(|a, b| a.scalar.total_cmp(&b.scalar))
            .unwrap_or(TraceBest {
                scalar: f64::INFINITY,
                objective: f64::INFINITY,
                violation: f64::INFINITY,
            })
    }
}

fn weighted(problem: &Problem, minimization: &[f64]) -> f64 {
    problem
        .objectives
        .iter()
        .zip(minimization)
        .map(|(o, f)| o.weight * f)
        .sum()
}

fn evaluate(
    problem: &Problem,
    evaluator: &ConstraintEvaluator,
    genes: Vec<Vec<f64>>,
    parallel: bool,
) -> Vec<Member> {
    let build = |genes: Vec<f64>| {
        let objectives = problem
            .objectives
            .iter()
            .map(|o| {
                let f = o.direction.sign() * o.evaluate(&genes);
                if f.is_nan() {
                    f64::INFINITY
                } else {
                    f
                }
            })
            .collect();
        let violation = evaluator.total_violation(&genes, &problem.constraints);
        Member {
            genes,
            objectives,
            violation,
            rank: usize::MAX,
            crowding: 0.0,
        }
    };
    if parallel {
        genes.into_par_iter().map(build).collect()
    } else {
        genes.into_iter().map(build).collect()
    }
}

fn assign_ranks(population: &mut [Member]) -> NondominatedSortResult {
    let objectives: Vec<Vec<f64>> = population.iter().map(|m| m.objectives.clone()).collect();
    let violations: Vec<f64> = population.iter().map(|m| m.violation).collect();
    let sorted = non_dominated_sort(&objectives, &violations);
    for front in &sorted.fronts {
        for (&i, d) in front.iter().zip(crowding_distance(&objectives, front)) {
            population[i].rank = sorted.ranks[i];
            population[i].crowding = d;
        }
    }
    sorted
}

/// Fills `n` slots front by front; the overflowing front keeps its most
/// isolated members.
fn environmental_selection(mut combined: Vec<Member>, n: usize) -> Vec<Member> {
    let sorted = assign_ranks(&mut combined);

    let mut chosen: Vec<usize> = Vec::with_capacity(n);
    for front in &sorted.fronts {
        if chosen.len() + front.len() <= n {
            chosen.extend_from_slice(front);
            continue;
        }
        let mut rest = front.clone();
        rest.sort_by(|&a, &b| combined[b].crowding.total_cmp(&combined[a].crowding).then(a.cmp(&b)));
        rest.truncate(n - chosen.len());
        chosen.extend(rest);
        break;
    }
    chosen.into_iter().map(|i| combined[i].clone()).collect()
}

/// Distinct rank-0 members as ranked alternatives. Each alternative's
/// `dominates` counts the members of `population` and `offspring` it
/// dominates.
fn front(
    problem: &Problem,
    population: &[Member],
    offspring: &[Member],
    evaluator: &ConstraintEvaluator,
) -> Vec<Alternative> {
    let objectives: Vec<Vec<f64>> = population.iter().map(|m| m.objectives.clone()).collect();
    let violations: Vec<f64> = population.iter().map(|m| m.violation).collect();
    let sorted = non_dominated_sort(&objectives, &violations);

    let mut members: Vec<usize> = Vec::new();
    for &i in sorted.fronts.first().map(Vec::as_slice).unwrap_or(&[]) {
        if members.iter().all(|&j| population[j].genes != population[i].genes) {
            members.push(i);
        }
    }
    let crowding = crowding_distance(&objectives, &members);

    let m = problem.objectives.len();
    let ideal: Vec<f64> = (0..m)
        .map(|k| members.iter().map(|&i| objectives[i][k]).fold(f64::INFINITY, f64::min))
        .collect();
    let nadir: Vec<f64> = (0..m)
        .map(|k| members.iter().map(|&i| objectives[i][k]).fold(f64::NEG_INFINITY, f64::max))
        .collect();
    let distance = |i: usize| -> f64 {
        (0..m)
            .map(|k| {
                let range = nadir[k] - ideal[k];
                if range > 0.0 && range.is_finite() {
                    let z = (objectives[i][k] - ideal[k]) / range;
                    problem.objectives[k].weight * z * z
                } else {
                    0.0
                }
            })
            .sum::<f64>()
            .sqrt()
    };

    let mut order: Vec<(usize, f64, f64)> = members
        .iter()
        .zip(&crowding)
        .map(|(&i, &c)| (i, distance(i), c))
        .collect();
    order.sort_by(|a, b| {
        a.1.total_cmp(&b.1)
            .then_with(|| weighted(problem, &objectives[a.0]).total_cmp(&weighted(problem, &objectives[b.0])))
            .then(a.0.cmp(&b.0))
    });

    order
        .into_iter()
        .enumerate()
        .map(|(rank, (i, dist, crowd))| {
            let mut alt = report::alternative(problem, &population[i].genes, rank, dist, evaluator);
            alt.domination_count = sorted.domination_counts[i];
            let member = &population[i];
            alt.dominates = population
                .iter()
                .chain(offspring)
                .filter(|o| dominates(&member.objectives, member.violation, &o.objectives, o.violation))
                .count();
            // JSON has no infinity
            alt.crowding_distance = Some(if crowd.is_finite() { crowd } else { f64::MAX });
            alt
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Constraint, ConvergenceCriterion, Expr, Objective, Operator, SolverParameters, Variable,
    };

    fn schaffer(seed: u64) -> Problem {
        // f1 = x², f2 = (x - 2)²: the Pareto set is x ∈ [0, 2].
        let mut p = Problem::new("schaffer").with_parameters(
            SolverParameters::default()
                .with_algorithm(AlgorithmParams::Pareto(ParetoParams::default().with_population_size(40)))
                .with_max_iterations(60)
                .with_convergence(ConvergenceCriterion::disabled())
                .with_seed(seed),
        );
        let x = p.add_variable(Variable::continuous("x", -5.0, 5.0));
        p.add_objective(Objective::minimize("f1", x.clone() * x.clone()));
        let d = x - Expr::constant(2.0);
        p.add_objective(Objective::minimize("f2", d.clone() * d));
        p
    }

    fn dominates(p: &Problem, a: &Alternative, b: &Alternative) -> bool {
        let mut strictly = false;
        for (k, o) in p.objectives.iter().enumerate() {
            let (fa, fb) = (a.objective_values[k].value, b.objective_values[k].value);
            if o.direction.is_better(fb, fa) {
                return false;
            }
            if o.direction.is_better(fa, fb) {
                strictly = true;
            }
        }
        strictly
    }

    #[test]
    fn test_front_is_mutually_non_dominated() {
        let p = schaffer(7);
        let s = ParetoSolver::from_problem(&p).solve(&p, &SolveContext::unbounded()).unwrap();
        assert!(s.alternatives.len() >= 5, "front size {}", s.alternatives.len());
        for a in &s.alternatives {
            for b in &s.alternatives {
                assert!(!dominates(&p, a, b));
            }
            assert_eq!(a.domination_count, 0);
            assert!(a.crowding_distance.is_some());
        }
    }

    #[test]
    fn test_front_lies_in_pareto_set() {
        let p = schaffer(11);
        let s = ParetoSolver::from_problem(&p).solve(&p, &SolveContext::unbounded()).unwrap();
        for a in &s.alternatives {
            let x = a.variable_values[0].value;
            assert!((-0.1..=2.1).contains(&x), "x = {x}");
        }
    }

    #[test]
    fn test_primary_is_closest_to_ideal() {
        let p = schaffer(3);
        let s = ParetoSolver::from_problem(&p).solve(&p, &SolveContext::unbounded()).unwrap();
        // With equal weights the compromise point sits near x = 1.
        let x = s.variable("x").unwrap();
        assert!((x - 1.0).abs() < 0.3, "x = {x}");
        assert_eq!(s.alternatives[0].rank, 0);
        assert_eq!(s.alternatives[0].variable_values[0].value, x);
        for w in s.alternatives.windows(2) {
            assert!(w[0].fitness <= w[1].fitness);
        }
    }

    #[test]
    fn test_front_counts_dominated_candidates() {
        let p = schaffer(1);
        let evaluator = ConstraintEvaluator::default();
        let mut population = evaluate(&p, &evaluator, vec![vec![0.0], vec![1.0], vec![2.0]], false);
        assign_ranks(&mut population);
        // (1, 9) and (9, 1): both beaten by x = 1, one each by the ends.
        let offspring = evaluate(&p, &evaluator, vec![vec![-1.0], vec![3.0]], false);

        let alts = front(&p, &population, &offspring, &evaluator);
        assert_eq!(alts.len(), 3);
        let count = |x: f64| {
            alts.iter()
                .find(|a| a.variable_values[0].value == x)
                .map(|a| (a.domination_count, a.dominates))
        };
        assert_eq!(count(0.0), Some((0, 1)));
        assert_eq!(count(1.0), Some((0, 2)));
        assert_eq!(count(2.0), Some((0, 1)));
    }

    #[test]
    fn test_seeded_runs_identical() {
        let p = schaffer(5);
        let solver = ParetoSolver::from_problem(&p);
        let a = solver.solve(&p, &SolveContext::unbounded()).unwrap();
        let b = solver.solve(&p, &SolveContext::unbounded()).unwrap();
        assert!(a.same_outcome(&b));
    }

    #[test]
    fn test_constraints_respected_on_front() {
        let mut p = schaffer(13);
        p.add_constraint(Constraint::inequality("x>=1", Expr::var(0), Operator::Ge, 1.0));
        let s = ParetoSolver::from_problem(&p).solve(&p, &SolveContext::unbounded()).unwrap();
        assert!(s.violations.is_empty());
        for a in &s.alternatives {
            assert_eq!(a.constraint_violation, 0.0);
            assert!(a.variable_values[0].value >= 1.0 - 1e-6);
        }
    }

    #[test]
    fn test_mixed_directions() {
        let mut p = Problem::new("mixed").with_parameters(
            SolverParameters::default()
                .with_algorithm(AlgorithmParams::Pareto(ParetoParams::default().with_population_size(30)))
                .with_max_iterations(40)
                .with_seed(1),
        );
        let x = p.add_variable(Variable::continuous("x", 0.0, 1.0));
        // maximizing x and minimizing x conflict everywhere: the front spans [0, 1]
        p.add_objective(Objective::maximize("up", x.clone()));
        p.add_objective(Objective::minimize("down", x));
        let s = ParetoSolver::from_problem(&p).solve(&p, &SolveContext::unbounded()).unwrap();
        for a in &s.alternatives {
            for b in &s.alternatives {
                assert!(!dominates(&p, a, b));
            }
        }
        assert!(s.alternatives.len() > 3);
    }
}
