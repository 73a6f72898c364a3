//! Route feasibility and cost.

use super::model::{RoutingProblem, Stop, TimeWindow, Vehicle, WindowKind};
use crate::model::Direction;

const EPS: f64 = 1e-9;

/// Timing of one visit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Visit {
    pub arrival: f64,
    pub start: f64,
    pub departure: f64,
}

/// A feasible route's figures.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RouteEval {
    pub load: f64,
    pub distance: f64,
    pub duration: f64,
    pub overtime: f64,
    pub cost: f64,
    /// Time outside preferred windows, summed over visits.
    pub deviation: f64,
    pub visits: Vec<Visit>,
}

impl RouteEval {
    fn unused() -> Self {
        Self {
            load: 0.0,
            distance: 0.0,
            duration: 0.0,
            overtime: 0.0,
            cost: 0.0,
            deviation: 0.0,
            visits: Vec::new(),
        }
    }
}

/// Weights of the additive per-route score.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ScoreWeights {
    pub distance: f64,
    pub cost: f64,
    pub duration: f64,
    pub vehicle: f64,
    pub deviation: f64,
}

/// Index-based view of a validated [`RoutingProblem`].
pub(crate) struct Instance<'a> {
    pub problem: &'a RoutingProblem,
    pub depot: usize,
    /// Quantity per location (0 for locations without demand).
    pub demand: Vec<f64>,
    /// Locations with at least one demand, ascending.
    pub customers: Vec<usize>,
    pub weights: ScoreWeights,
}

impl<'a> Instance<'a> {
    pub fn new(problem: &'a RoutingProblem, preferred_penalty: f64) -> Self {
        let n = problem.locations.len();
        let depot = problem.location_index(&problem.depot).unwrap_or(0);
        let loads = problem.location_loads();
        let mut demand = vec![0.0; n];
        for (&i, &q) in &loads {
            demand[i] = q;
        }
        let mut customers: Vec<usize> = loads.keys().copied().collect();
        customers.sort_unstable();

        let mut weights = ScoreWeights {
            deviation: preferred_penalty,
            ..ScoreWeights::default()
        };
        for o in &problem.problem.objectives {
            let w = o.weight * if o.direction == Direction::Maximize { -1.0 } else { 1.0 };
            match o.name.as_str() {
                "total_distance" => weights.distance += w,
                "total_cost" => weights.cost += w,
                "total_duration" => weights.duration += w,
                "vehicles_used" => weights.vehicle += w,
                _ => {}
            }
        }

        Self {
            problem,
            depot,
            demand,
            customers,
            weights,
        }
    }

    pub fn distance(&self, a: usize, b: usize) -> f64 {
        self.problem.distances[a][b]
    }

    pub fn travel_time(&self, a: usize, b: usize) -> f64 {
        match &self.problem.travel_times {
            Some(t) => t[a][b],
            None => self.problem.distances[a][b],
        }
    }

    /// Evaluates `route` (customer location indices, depot excluded) for
    /// `vehicle`; `None` when a hard constraint fails.
    pub fn evaluate(&self, route: &[usize], vehicle: &Vehicle) -> Option<RouteEval> {
        if route.is_empty() {
            return Some(RouteEval::unused());
        }
        let load: f64 = route.iter().map(|&c| self.demand[c]).sum();
        if load > vehicle.capacity + EPS {
            return None;
        }

        let mut t = vehicle.start_time;
        let mut prev = self.depot;
        let mut distance = 0.0;
        let mut deviation = 0.0;
        let mut visits = Vec::with_capacity(route.len());
        for &c in route {
            distance += self.distance(prev, c);
            let arrival = t + self.travel_time(prev, c);
            let location = &self.problem.locations[c];
            let start = service_start(&location.windows, arrival)?;
            deviation += preferred_deviation(&location.windows, start);
            let departure = start + location.service_time;
            visits.push(Visit {
                arrival,
                start,
                departure,
            });
            t = departure;
            prev = c;
        }
        distance += self.distance(prev, self.depot);
        let end = t + self.travel_time(prev, self.depot);
        let duration = end - vehicle.start_time;

        if vehicle.max_distance.is_some_and(|m| distance > m + EPS) {
            return None;
        }
        if vehicle.max_duration.is_some_and(|m| duration > m + EPS) {
            return None;
        }
        let overtime = vehicle.shift_end.map_or(0.0, |s| (end - s).max(0.0));
        let cost = vehicle.fixed_cost
            + vehicle.cost_per_distance * distance
            + vehicle.cost_per_time * duration
            + vehicle.overtime_cost * overtime;

        Some(RouteEval {
            load,
            distance,
            duration,
            overtime,
            cost,
            deviation,
            visits,
        })
    }

    /// Additive contribution of one route to the plan score.
    pub fn score(&self, eval: &RouteEval) -> f64 {
        let w = &self.weights;
        let used = if eval.visits.is_empty() { 0.0 } else { 1.0 };
        w.distance * eval.distance
            + w.cost * eval.cost
            + w.duration * eval.duration
            + w.vehicle * used
            + w.deviation * eval.deviation
    }

    /// Score of `route` on `vehicle`, if feasible.
    pub fn route_score(&self, route: &[usize], vehicle: &Vehicle) -> Option<f64> {
        self.evaluate(route, vehicle).map(|e| self.score(&e))
    }

    /// Whether some vehicle of the fleet can drive `route`.
    pub fn feasible_for_any(&self, route: &[usize]) -> bool {
        self.problem
            .vehicles
            .iter()
            .any(|v| self.evaluate(route, v).is_some())
    }

    pub fn stops(&self, route: &[usize], eval: &RouteEval) -> Vec<Stop> {
        let mut on_board = eval.load;
        route
            .iter()
            .zip(&eval.visits)
            .map(|(&c, v)| {
                on_board -= self.demand[c];
                Stop {
                    location: self.problem.locations[c].id.clone(),
                    arrival: v.arrival,
                    service_start: v.start,
                    departure: v.departure,
                    load_after: on_board.max(0.0),
                }
            })
            .collect()
    }
}

/// Earliest service start at or after `arrival`: inside one of the
/// required or preferred windows (when any exist) and outside every
/// forbidden window.
pub(crate) fn service_start(windows: &[TimeWindow], arrival: f64) -> Option<f64> {
    let allowing = |w: &&TimeWindow| w.kind != WindowKind::Forbidden;
    let has_allowing = windows.iter().any(|w| allowing(&w));
    let mut t = arrival;
    // Every round either returns or moves t past a window end.
    for _ in 0..=2 * windows.len() {
        if has_allowing {
            let next = windows
                .iter()
                .filter(|w| allowing(w) && w.end >= t)
                .min_by(|a, b| a.start.max(t).total_cmp(&b.start.max(t)))?;
            t = t.max(next.start);
        }
        match windows
            .iter()
            .find(|w| w.kind == WindowKind::Forbidden && w.contains(t))
        {
            Some(f) => t = f.end + EPS,
            None => return Some(t),
        }
    }
    None
}

/// Distance from `t` to the nearest preferred window (0 when inside one or
/// when there are none). Only non-zero when a required window let service
/// start outside every preferred one.
pub(crate) fn preferred_deviation(windows: &[TimeWindow], t: f64) -> f64 {
    windows
        .iter()
        .filter(|w| w.kind == WindowKind::Preferred)
        .map(|w| {
            if t < w.start {
                w.start - t
            } else if t > w.end {
                t - w.end
            } else {
                0.0
            }
        })
        .min_by(f64::total_cmp)
        .unwrap_or(0.0)
}
