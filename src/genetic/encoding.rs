//! Real-vector encoding of a [`Problem`]'s variables.
//!
//! One gene per variable, holding the variable's numeric value (category
//! index for categorical variables). Shared by the genetic and Pareto
//! solvers.

use crate::ga::operators::{gaussian_mutation, single_point_crossover};
use crate::ga::Individual;
use crate::model::{Problem, Variable, VariableKind};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};

/// A candidate assignment with its scalar fitness.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub genes: Vec<f64>,
    pub fitness: f64,
}

impl Candidate {
    pub fn new(genes: Vec<f64>) -> Self {
        Self {
            genes,
            fitness: f64::INFINITY,
        }
    }
}

impl Individual for Candidate {
    type Fitness = f64;

    fn fitness(&self) -> f64 {
        self.fitness
    }

    fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }
}

/// Sampling and variation operators over a problem's variable domains.
#[derive(Debug)]
pub struct Encoding<'a> {
    problem: &'a Problem,
    bounds: Vec<(f64, f64)>,
    sigmas: Vec<f64>,
    /// The first sampled candidate takes the variables' initial values.
    seeded: AtomicBool,
}

impl<'a> Encoding<'a> {
    /// `mutation_scale` is the Gaussian standard deviation as a fraction of
    /// each variable's range.
    pub fn new(problem: &'a Problem, mutation_scale: f64) -> Self {
        let bounds: Vec<(f64, f64)> = problem.variables.iter().map(Variable::bounds).collect();
        let sigmas = problem
            .variables
            .iter()
            .zip(&bounds)
            .map(|(v, &(lo, hi))| {
                let sigma = mutation_scale * (hi - lo);
                if v.is_discrete() {
                    sigma.max(1.0)
                } else {
                    sigma
                }
            })
            .collect();
        Self {
            problem,
            bounds,
            sigmas,
            seeded: AtomicBool::new(false),
        }
    }

    pub fn problem(&self) -> &'a Problem {
        self.problem
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> Vec<f64> {
        let use_initial = !self.seeded.swap(true, Ordering::Relaxed);
        self.problem
            .variables
            .iter()
            .zip(&self.bounds)
            .map(|(v, &(lo, hi))| match v.initial {
                Some(init) if use_initial => init,
                _ => sample_value(v.kind, lo, hi, rng),
            })
            .collect()
    }

    pub fn crossover<R: Rng>(&self, a: &[f64], b: &[f64], rng: &mut R) -> (Vec<f64>, Vec<f64>) {
        single_point_crossover(a, b, rng)
    }

    /// Gaussian mutation followed by projection onto each domain.
    pub fn mutate<R: Rng>(&self, genes: &mut [f64], rate: f64, rng: &mut R) {
        if gaussian_mutation(genes, &self.bounds, &self.sigmas, rate, rng) == 0 {
            return;
        }
        for (gene, var) in genes.iter_mut().zip(&self.problem.variables) {
            *gene = var.repair(*gene);
        }
    }
}

fn sample_value<R: Rng>(kind: VariableKind, lo: f64, hi: f64, rng: &mut R) -> f64 {
    match kind {
        VariableKind::Continuous => {
            if hi > lo {
                rng.random_range(lo..=hi)
            } else {
                lo
            }
        }
        VariableKind::Integer | VariableKind::Binary | VariableKind::Categorical => {
            let (a, b) = (lo.ceil() as i64, hi.floor() as i64);
            if b > a {
                rng.random_range(a..=b) as f64
            } else {
                a as f64
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;

    fn mixed_problem() -> Problem {
        let mut p = Problem::new("mixed");
        p.add_variable(Variable::continuous("c", -1.0, 1.0).with_initial(0.25));
        p.add_variable(Variable::integer("i", 0, 5));
        p.add_variable(Variable::binary("b"));
        p.add_variable(Variable::categorical("k", ["a", "b", "c"]));
        p
    }

    #[test]
    fn test_samples_stay_in_domain() {
        let p = mixed_problem();
        let enc = Encoding::new(&p, 0.1);
        let mut rng = create_rng(1);
        for _ in 0..200 {
            let genes = enc.sample(&mut rng);
            for (g, v) in genes.iter().zip(&p.variables) {
                assert!(v.contains(*g), "{} = {g}", v.name);
            }
        }
    }

    #[test]
    fn test_first_sample_uses_initial_values() {
        let p = mixed_problem();
        let enc = Encoding::new(&p, 0.1);
        let mut rng = create_rng(1);
        assert_eq!(enc.sample(&mut rng)[0], 0.25);
        let later: Vec<f64> = (0..20).map(|_| enc.sample(&mut rng)[0]).collect();
        assert!(later.iter().any(|&x| x != 0.25));
    }

    #[test]
    fn test_mutation_repairs_discrete_genes() {
        let p = mixed_problem();
        let enc = Encoding::new(&p, 0.1);
        let mut rng = create_rng(2);
        let mut flipped = 0;
        for _ in 0..500 {
            let mut genes = vec![0.0, 2.0, 0.0, 1.0];
            enc.mutate(&mut genes, 1.0, &mut rng);
            for (g, v) in genes.iter().zip(&p.variables) {
                assert!(v.contains(*g), "{} = {g}", v.name);
            }
            if genes[2] == 1.0 {
                flipped += 1;
            }
        }
        assert!(flipped > 100, "binary gene flipped {flipped} times");
    }
}
