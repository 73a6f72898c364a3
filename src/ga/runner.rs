//! GA evolutionary loop execution.
//!
//! [`GaRunner`] orchestrates the complete evolutionary process:
//! initialization → evaluation → elitism → selection → crossover →
//! mutation → evaluation → repeat.
//!
//! Only fitness evaluation may run in parallel. Every random draw happens on
//! the calling thread in a fixed order, so a seeded run is reproducible with
//! or without `parallel`.

use super::config::GaConfig;
use super::types::{Fitness, GaProblem, Individual};
use crate::error::ValidationError;
use crate::random::rng_from;
use rand::Rng;
use rayon::prelude::*;
use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The convergence criterion was met.
    Converged,
    MaxGenerations,
    TimeLimit,
    /// The cancellation flag was observed at a generation boundary.
    Cancelled,
}

/// Per-generation statistics passed to the observer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationStats {
    /// 1-based index of the generation just completed.
    pub generation: usize,
    /// Best fitness found so far (lower is better).
    pub best_fitness: f64,
    /// Mean finite fitness of the current population.
    pub mean_fitness: f64,
    pub elapsed_ms: f64,
}

/// Result of a GA run.
#[derive(Debug, Clone)]
pub struct GaResult<I: Individual> {
    /// Best individual found during the entire run.
    pub best: I,

    /// Same as `best.fitness()`.
    pub best_fitness: I::Fitness,

    /// Number of completed generations (0 when cancelled before the first).
    pub generations: usize,

    pub termination: Termination,

    /// Best fitness after initialization and after each generation, so
    /// `fitness_history.len() == generations + 1`.
    pub fitness_history: Vec<f64>,

    /// Final population, best first.
    pub population: Vec<I>,
}

impl<I: Individual> GaResult<I> {
    pub fn cancelled(&self) -> bool {
        self.termination == Termination::Cancelled
    }
}

/// Executes the GA evolutionary loop.
///
/// ```ignore
/// let result = GaRunner::run(&problem, &GaConfig::default().with_seed(42))?;
/// println!("best fitness: {:?}", result.best_fitness);
/// ```
pub struct GaRunner;

impl GaRunner {
    /// Runs the GA to termination.
    pub fn run<P: GaProblem>(
        problem: &P,
        config: &GaConfig,
    ) -> Result<GaResult<P::Individual>, ValidationError> {
        Self::run_with_observer(problem, config, None, |_, _| {})
    }

    /// Runs the GA with an optional cancellation token.
    ///
    /// The flag is checked at the start of each generation; a set flag stops
    /// the run and returns the best individual of the last completed
    /// generation.
    pub fn run_with_cancel<P: GaProblem>(
        problem: &P,
        config: &GaConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<GaResult<P::Individual>, ValidationError> {
        Self::run_with_observer(problem, config, cancel, |_, _| {})
    }

    /// Runs the GA, calling `observer` after every completed generation with
    /// the generation statistics and the best-so-far individual.
    pub fn run_with_observer<P, F>(
        problem: &P,
        config: &GaConfig,
        cancel: Option<Arc<AtomicBool>>,
        mut observer: F,
    ) -> Result<GaResult<P::Individual>, ValidationError>
    where
        P: GaProblem,
        F: FnMut(&GenerationStats, &P::Individual),
    {
        config.validate()?;

        let start = Instant::now();
        let mut rng = rng_from(config.seed);
        let elite_count = config.elite_count();

        let mut population: Vec<P::Individual> = (0..config.population_size)
            .map(|_| problem.create_individual(&mut rng))
            .collect();
        evaluate_all(problem, &mut population, config.parallel);
        sort_by_fitness(&mut population);

        let mut best = population[0].clone();
        let mut fitness_history = Vec::with_capacity(config.max_generations + 1);
        fitness_history.push(best.fitness().to_f64());

        let mut generations = 0;
        let mut termination = Termination::MaxGenerations;

        while generations < config.max_generations {
            if cancel.as_ref().is_some_and(|f| f.load(Ordering::Relaxed)) {
                termination = Termination::Cancelled;
                break;
            }
            if config
                .time_limit_ms
                .is_some_and(|ms| start.elapsed().as_millis() >= ms as u128)
            {
                termination = Termination::TimeLimit;
                break;
            }

            let mut next_gen: Vec<P::Individual> = population[..elite_count].to_vec();

            while next_gen.len() < config.population_size {
                let p1 = select(config, &population, &mut rng);
                let p2 = select(config, &population, &mut rng);

                let (c1, c2) = if rng.random::<f64>() < config.crossover_rate {
                    problem.crossover(&population[p1], &population[p2], &mut rng)
                } else {
                    (population[p1].clone(), population[p2].clone())
                };

                for mut child in [c1, c2] {
                    if next_gen.len() >= config.population_size {
                        break;
                    }
                    problem.mutate(&mut child, config.mutation_rate, &mut rng);
                    next_gen.push(child);
                }
            }

            // elites keep their fitness
            evaluate_all(problem, &mut next_gen[elite_count..], config.parallel);
            sort_by_fitness(&mut next_gen);
            population = next_gen;
            generations += 1;

            if population[0].fitness() < best.fitness() {
                best = population[0].clone();
                debug!(
                    generation = generations,
                    best_fitness = best.fitness().to_f64(),
                    "ga improvement"
                );
            }
            fitness_history.push(best.fitness().to_f64());

            let stats = GenerationStats {
                generation: generations,
                best_fitness: best.fitness().to_f64(),
                mean_fitness: mean_finite(&population),
                elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
            };
            observer(&stats, &best);

            if config.convergence.is_converged(&fitness_history) {
                termination = Termination::Converged;
                break;
            }
        }

        Ok(GaResult {
            best_fitness: best.fitness(),
            best,
            generations,
            termination,
            fitness_history,
            population,
        })
    }
}

fn select<I: Individual, R: Rng>(config: &GaConfig, population: &[I], rng: &mut R) -> usize {
    // population is never empty here: validate() guarantees size >= 2
    config.selection.select(population, rng).unwrap_or(0)
}

fn evaluate_all<P: GaProblem>(problem: &P, individuals: &mut [P::Individual], parallel: bool) {
    if parallel {
        individuals.par_iter_mut().for_each(|ind| {
            let f = problem.evaluate(ind);
            ind.set_fitness(f);
        });
    } else {
        for ind in individuals.iter_mut() {
            let f = problem.evaluate(ind);
            ind.set_fitness(f);
        }
    }
}

/// Stable ascending sort; incomparable fitness (NaN) sorts last.
fn sort_by_fitness<I: Individual>(population: &mut [I]) {
    population.sort_by(|a, b| {
        let (fa, fb) = (a.fitness(), b.fitness());
        fa.partial_cmp(&fb).unwrap_or_else(|| {
            match (fa.partial_cmp(&fa).is_none(), fb.partial_cmp(&fb).is_none()) {
                (true, false) => CmpOrdering::Greater,
                (false, true) => CmpOrdering::Less,
                _ => CmpOrdering::Equal,
            }
        })
    });
}

fn mean_finite<I: Individual>(population: &[I]) -> f64 {
    let (sum, n) = population
        .iter()
        .map(|i| i.fitness().to_f64())
        .filter(|f| f.is_finite())
        .fold((0.0, 0usize), |(s, n), f| (s + f, n + 1));
    if n == 0 {
        f64::INFINITY
    } else {
        sum / n as f64
    }
}
