//! Resources, demands and allocation plans.

use crate::error::ValidationError;
use crate::model::{
    Algorithm, Direction, Objective, Problem, Solution, SolverParameters,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Something that can serve demand, up to `capacity` units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub capacity: f64,
    pub unit_cost: f64,
    /// Capabilities offered.
    #[serde(default)]
    pub skills: Vec<String>,
}

impl Resource {
    pub fn new(id: impl Into<String>, capacity: f64, unit_cost: f64) -> Self {
        Self {
            id: id.into(),
            capacity,
            unit_cost,
            skills: Vec::new(),
        }
    }

    pub fn with_skills<S: Into<String>>(mut self, skills: impl IntoIterator<Item = S>) -> Self {
        self.skills = skills.into_iter().map(Into::into).collect();
        self
    }

    /// Whether this resource offers every skill `demand` requires.
    pub fn can_serve(&self, demand: &Demand) -> bool {
        demand.skills.iter().all(|s| self.skills.contains(s))
    }
}

/// A required quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demand {
    pub id: String,
    pub quantity: f64,
    /// Capabilities a serving resource must offer.
    #[serde(default)]
    pub skills: Vec<String>,
}

impl Demand {
    pub fn new(id: impl Into<String>, quantity: f64) -> Self {
        Self {
            id: id.into(),
            quantity,
            skills: Vec::new(),
        }
    }

    pub fn with_skills<S: Into<String>>(mut self, skills: impl IntoIterator<Item = S>) -> Self {
        self.skills = skills.into_iter().map(Into::into).collect();
        self
    }
}

/// Units of one demand served by one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub resource: String,
    pub demand: String,
    pub quantity: f64,
    pub cost: f64,
}

/// Quantity of a demand left unserved under partial fulfilment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shortfall {
    pub demand: String,
    pub quantity: f64,
}

/// The generic solution plus the allocation it encodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub solution: Solution,
    /// Non-zero allocations, in resource then demand order.
    pub allocations: Vec<Allocation>,
    pub shortfalls: Vec<Shortfall>,
}

impl AllocationPlan {
    /// Total units assigned to `resource`.
    pub fn resource_load(&self, resource: &str) -> f64 {
        self.allocations
            .iter()
            .filter(|a| a.resource == resource)
            .map(|a| a.quantity)
            .sum()
    }

    /// Total units delivered to `demand`.
    pub fn delivered(&self, demand: &str) -> f64 {
        self.allocations
            .iter()
            .filter(|a| a.demand == demand)
            .map(|a| a.quantity)
            .sum()
    }
}

/// A problem shell for allocation: a `total_cost` objective and the
/// linear-programming strategy selected.
pub fn allocation_problem(name: impl Into<String>) -> Problem {
    let mut problem = Problem::new(name)
        .with_parameters(SolverParameters::for_algorithm(Algorithm::LinearProgramming));
    problem.add_objective(Objective::metric("total_cost", Direction::Minimize));
    problem
}

/// Structural checks on resources and demands.
pub fn validate_allocation(resources: &[Resource], demands: &[Demand]) -> Result<(), ValidationError> {
    if resources.is_empty() {
        return Err(ValidationError::Empty("resources".into()));
    }
    if demands.is_empty() {
        return Err(ValidationError::Empty("demands".into()));
    }
    let mut ids = HashSet::new();
    for r in resources {
        if !ids.insert(r.id.as_str()) {
            return Err(ValidationError::DuplicateId(r.id.clone()));
        }
        if !(r.capacity >= 0.0) || !r.capacity.is_finite() {
            return Err(ValidationError::NegativeCapacity {
                owner: r.id.clone(),
                capacity: r.capacity,
            });
        }
        if !r.unit_cost.is_finite() {
            return Err(ValidationError::InvalidParameters(format!(
                "resource '{}' has a non-finite unit cost",
                r.id
            )));
        }
    }
    let mut ids = HashSet::new();
    for d in demands {
        if !ids.insert(d.id.as_str()) {
            return Err(ValidationError::DuplicateId(d.id.clone()));
        }
        if !(d.quantity >= 0.0) || !d.quantity.is_finite() {
            return Err(ValidationError::InvalidParameters(format!(
                "demand '{}' has invalid quantity {}",
                d.id, d.quantity
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_matching() {
        let welder = Resource::new("w", 5.0, 1.0).with_skills(["weld", "cut"]);
        let plain = Resource::new("p", 5.0, 1.0);
        let job = Demand::new("j", 2.0).with_skills(["weld"]);
        assert!(welder.can_serve(&job));
        assert!(!plain.can_serve(&job));
        assert!(plain.can_serve(&Demand::new("any", 1.0)));
    }

    #[test]
    fn test_validation() {
        let r = vec![Resource::new("a", 1.0, 1.0)];
        let d = vec![Demand::new("x", 1.0)];
        assert!(validate_allocation(&r, &d).is_ok());
        assert_eq!(
            validate_allocation(&[], &d),
            Err(ValidationError::Empty("resources".into()))
        );
        let dup = vec![Resource::new("a", 1.0, 1.0), Resource::new("a", 2.0, 1.0)];
        assert_eq!(validate_allocation(&dup, &d), Err(ValidationError::DuplicateId("a".into())));
        let neg = vec![Resource::new("a", -1.0, 1.0)];
        assert!(matches!(
            validate_allocation(&neg, &d),
            Err(ValidationError::NegativeCapacity { .. })
        ));
    }

    #[test]
    fn test_problem_shell() {
        let p = allocation_problem("alloc");
        assert_eq!(p.objectives[0].name, "total_cost");
        assert_eq!(p.parameters.algorithm.algorithm(), Algorithm::LinearProgramming);
    }
}
