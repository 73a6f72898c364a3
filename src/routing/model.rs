//! Vehicle routing problem model.

use crate::error::ValidationError;
use crate::model::validate::validate_problem;
use crate::model::{Algorithm, Direction, Objective, Problem, Solution, SolverParameters};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// How a time window constrains service start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    /// Service must start inside one of the location's required or
    /// preferred windows (hard).
    #[default]
    Required,
    /// Admits service like a required window. When a location also has
    /// required windows, starting outside every preferred one is penalised.
    Preferred,
    /// Service must not start inside this window (hard).
    Forbidden,
}

/// A closed time interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub kind: WindowKind,
}

impl TimeWindow {
    pub fn required(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            kind: WindowKind::Required,
        }
    }

    pub fn preferred(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            kind: WindowKind::Preferred,
        }
    }

    pub fn forbidden(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            kind: WindowKind::Forbidden,
        }
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }
}

/// A place vehicles travel between. Its position in
/// [`RoutingProblem::locations`] indexes the distance and time matrices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    #[serde(default)]
    pub service_time: f64,
    #[serde(default)]
    pub windows: Vec<TimeWindow>,
}

impl Location {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            service_time: 0.0,
            windows: Vec::new(),
        }
    }

    pub fn with_service_time(mut self, t: f64) -> Self {
        self.service_time = t;
        self
    }

    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.windows.push(window);
        self
    }
}

/// A vehicle of a possibly heterogeneous fleet. Every route starts and ends
/// at the depot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vehicle {
    pub id: String,
    pub capacity: f64,
    pub max_distance: Option<f64>,
    /// Longest allowed time from departure to return.
    pub max_duration: Option<f64>,
    /// Departure time from the depot.
    pub start_time: f64,
    /// Charged once when the vehicle is used.
    pub fixed_cost: f64,
    pub cost_per_distance: f64,
    pub cost_per_time: f64,
    /// Return time after which overtime is charged.
    pub shift_end: Option<f64>,
    pub overtime_cost: f64,
}

impl Default for Vehicle {
    fn default() -> Self {
        Self {
            id: String::new(),
            capacity: 0.0,
            max_distance: None,
            max_duration: None,
            start_time: 0.0,
            fixed_cost: 0.0,
            cost_per_distance: 1.0,
            cost_per_time: 0.0,
            shift_end: None,
            overtime_cost: 0.0,
        }
    }
}

impl Vehicle {
    pub fn new(id: impl Into<String>, capacity: f64) -> Self {
        Self {
            id: id.into(),
            capacity,
            ..Self::default()
        }
    }

    pub fn with_max_distance(mut self, d: f64) -> Self {
        self.max_distance = Some(d);
        self
    }

    pub fn with_max_duration(mut self, t: f64) -> Self {
        self.max_duration = Some(t);
        self
    }

    pub fn with_start_time(mut self, t: f64) -> Self {
        self.start_time = t;
        self
    }

    /// Fixed, per-distance and per-time cost.
    pub fn with_costs(mut self, fixed: f64, per_distance: f64, per_time: f64) -> Self {
        self.fixed_cost = fixed;
        self.cost_per_distance = per_distance;
        self.cost_per_time = per_time;
        self
    }

    pub fn with_overtime(mut self, shift_end: f64, cost_per_time: f64) -> Self {
        self.shift_end = Some(shift_end);
        self.overtime_cost = cost_per_time;
        self
    }
}

/// Quantity to deliver at a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDemand {
    pub id: String,
    /// Id of the location served.
    pub location: String,
    pub quantity: f64,
}

impl RouteDemand {
    pub fn new(id: impl Into<String>, location: impl Into<String>, quantity: f64) -> Self {
        Self {
            id: id.into(),
            location: location.into(),
            quantity,
        }
    }
}

/// Routing metrics that objectives may name.
pub const METRICS: [&str; 4] = ["total_distance", "total_cost", "total_duration", "vehicles_used"];

/// The generic problem extended with a fleet, locations, demands and
/// travel matrices.
///
/// When `travel_times` is absent, travel time equals distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingProblem {
    pub problem: Problem,
    /// Id of the depot location.
    pub depot: String,
    pub locations: Vec<Location>,
    pub vehicles: Vec<Vehicle>,
    pub demands: Vec<RouteDemand>,
    pub distances: Vec<Vec<f64>>,
    #[serde(default)]
    pub travel_times: Option<Vec<Vec<f64>>>,
}

impl RoutingProblem {
    /// A problem minimizing `total_distance` with the routing strategy
    /// selected.
    pub fn new(
        name: impl Into<String>,
        depot: impl Into<String>,
        locations: Vec<Location>,
        vehicles: Vec<Vehicle>,
        distances: Vec<Vec<f64>>,
    ) -> Self {
        let mut problem =
            Problem::new(name).with_parameters(SolverParameters::for_algorithm(Algorithm::Routing));
        problem.add_objective(Objective::metric("total_distance", Direction::Minimize));
        Self {
            problem,
            depot: depot.into(),
            locations,
            vehicles,
            demands: Vec::new(),
            distances,
            travel_times: None,
        }
    }

    pub fn with_demand(mut self, demand: RouteDemand) -> Self {
        self.demands.push(demand);
        self
    }

    pub fn with_travel_times(mut self, times: Vec<Vec<f64>>) -> Self {
        self.travel_times = Some(times);
        self
    }

    pub fn location_index(&self, id: &str) -> Option<usize> {
        self.locations.iter().position(|l| l.id == id)
    }

    /// Checks the generic invariants plus the routing ones.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_problem(&self.problem, false)?;
        if !self.problem.variables.is_empty() || !self.problem.constraints.is_empty() {
            return Err(ValidationError::AlgorithmMismatch {
                strategy: Algorithm::Routing.to_string(),
                reason: "routing decisions are derived from locations and vehicles".into(),
            });
        }
        for o in &self.problem.objectives {
            if !METRICS.contains(&o.name.as_str()) {
                return Err(ValidationError::AlgorithmMismatch {
                    strategy: Algorithm::Routing.to_string(),
                    reason: format!("unknown routing metric '{}'", o.name),
                });
            }
        }
        if self.locations.is_empty() {
            return Err(ValidationError::Empty("locations".into()));
        }
        if self.vehicles.is_empty() {
            return Err(ValidationError::Empty("vehicles".into()));
        }

        let mut ids = HashSet::new();
        for l in &self.locations {
            if !ids.insert(l.id.as_str()) {
                return Err(ValidationError::DuplicateId(l.id.clone()));
            }
            if !(l.service_time >= 0.0) {
                return Err(ValidationError::InvalidParameters(format!(
                    "location '{}' has negative service time",
                    l.id
                )));
            }
            if l.windows.iter().any(|w| !(w.start <= w.end)) {
                return Err(ValidationError::InvalidParameters(format!(
                    "location '{}' has an inverted time window",
                    l.id
                )));
            }
        }
        if !ids.contains(self.depot.as_str()) {
            return Err(ValidationError::UnknownLocation {
                demand: "depot".into(),
                location: self.depot.clone(),
            });
        }

        let mut vehicle_ids = HashSet::new();
        for v in &self.vehicles {
            if !vehicle_ids.insert(v.id.as_str()) {
                return Err(ValidationError::DuplicateId(v.id.clone()));
            }
            if !(v.capacity >= 0.0) {
                return Err(ValidationError::NegativeCapacity {
                    owner: v.id.clone(),
                    capacity: v.capacity,
                });
            }
        }

        let mut demand_ids = HashSet::new();
        for d in &self.demands {
            if !demand_ids.insert(d.id.as_str()) {
                return Err(ValidationError::DuplicateId(d.id.clone()));
            }
            if !ids.contains(d.location.as_str()) {
                return Err(ValidationError::UnknownLocation {
                    demand: d.id.clone(),
                    location: d.location.clone(),
                });
            }
            if d.location == self.depot {
                return Err(ValidationError::InvalidParameters(format!(
                    "demand '{}' is placed at the depot",
                    d.id
                )));
            }
            if !(d.quantity >= 0.0) {
                return Err(ValidationError::InvalidParameters(format!(
                    "demand '{}' has negative quantity",
                    d.id
                )));
            }
        }

        check_matrix("distance", &self.distances, self.locations.len())?;
        if let Some(times) = &self.travel_times {
            check_matrix("travel_time", times, self.locations.len())?;
        }
        Ok(())
    }

    /// Total quantity per location index.
    pub(crate) fn location_loads(&self) -> HashMap<usize, f64> {
        let mut loads = HashMap::new();
        for d in &self.demands {
            if let Some(i) = self.location_index(&d.location) {
                *loads.entry(i).or_insert(0.0) += d.quantity;
            }
        }
        loads
    }
}

fn check_matrix(name: &str, m: &[Vec<f64>], n: usize) -> Result<(), ValidationError> {
    let shape_ok = m.len() == n && m.iter().all(|row| row.len() == n);
    if !shape_ok {
        return Err(ValidationError::MatrixShape {
            matrix: name.to_string(),
            expected: n,
            rows: m.len(),
        });
    }
    if m.iter().flatten().any(|v| !(v.is_finite() && *v >= 0.0)) {
        return Err(ValidationError::InvalidParameters(format!(
            "{name} matrix entries must be finite and non-negative"
        )));
    }
    Ok(())
}

/// One stop of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub location: String,
    pub arrival: f64,
    pub service_start: f64,
    pub departure: f64,
    /// Load on board after this stop's delivery.
    pub load_after: f64,
}

/// The route driven by one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    pub vehicle: String,
    pub stops: Vec<Stop>,
    pub load: f64,
    pub distance: f64,
    pub duration: f64,
    pub overtime: f64,
    pub cost: f64,
}

/// The generic solution plus the route plans it encodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingSolution {
    pub solution: Solution,
    pub routes: Vec<RoutePlan>,
    /// Locations no vehicle could serve.
    pub unassigned: Vec<String>,
}
