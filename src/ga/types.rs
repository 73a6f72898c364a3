//! Core trait definitions for the GA framework.
//!
//! [`Individual`] and [`GaProblem`] are the contract between the generic
//! evolutionary loop in [`GaRunner`](super::GaRunner) and a concrete
//! encoding. The crate's own encoding of a [`Problem`](crate::model::Problem)
//! lives in [`crate::genetic`].

use rand::Rng;

/// Marker trait for fitness values.
///
/// Lower fitness is better (minimization). Maximization problems negate
/// their objective before it reaches the runner.
pub trait Fitness: PartialOrd + Copy + Send + Sync + std::fmt::Debug + 'static {
    /// Worst possible fitness, used for not-yet-evaluated individuals.
    fn worst() -> Self;

    /// Converts the fitness to `f64` for history and statistics.
    fn to_f64(self) -> f64;
}

impl Fitness for f64 {
    fn worst() -> Self {
        f64::INFINITY
    }

    fn to_f64(self) -> f64 {
        self
    }
}

/// A candidate solution carrying its own fitness.
pub trait Individual: Clone + Send + Sync {
    type Fitness: Fitness;

    fn fitness(&self) -> Self::Fitness;

    /// Called by the runner after [`GaProblem::evaluate`].
    fn set_fitness(&mut self, fitness: Self::Fitness);
}

/// Problem-specific GA operations.
///
/// Must be `Send + Sync`: with parallel evaluation enabled the runner calls
/// [`evaluate`](GaProblem::evaluate) from rayon workers. All other methods
/// run on the calling thread in a fixed order, so seeded runs are
/// reproducible whether or not evaluation is parallel.
pub trait GaProblem: Send + Sync {
    type Individual: Individual;

    /// Creates a random individual for the initial population.
    fn create_individual<R: Rng>(&self, rng: &mut R) -> Self::Individual;

    /// Computes the fitness of an individual. Must be side-effect free.
    fn evaluate(&self, individual: &Self::Individual) -> <Self::Individual as Individual>::Fitness;

    /// Recombines two parents into two children.
    ///
    /// The default returns clones of both parents (no recombination).
    fn crossover<R: Rng>(
        &self,
        parent1: &Self::Individual,
        parent2: &Self::Individual,
        _rng: &mut R,
    ) -> (Self::Individual, Self::Individual) {
        (parent1.clone(), parent2.clone())
    }

    /// Mutates an individual in place; `rate` is the per-gene probability.
    ///
    /// The default is a no-op.
    fn mutate<R: Rng>(&self, _individual: &mut Self::Individual, _rate: f64, _rng: &mut R) {}
}
