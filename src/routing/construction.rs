//! Clarke-Wright savings construction and fleet assignment.

use super::evaluation::Instance;

/// Routes assigned to vehicles, plus customers nobody could take.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Plan {
    /// `routes[k]` is driven by vehicle `k`; empty when unused.
    pub routes: Vec<Vec<usize>>,
    pub unassigned: Vec<usize>,
}

/// Savings `s(i, j) = d(i, depot) + d(depot, j) - d(i, j)` for every
/// ordered customer pair, descending; ties by `(i, j)`.
pub(crate) fn savings(inst: &Instance<'_>) -> Vec<(f64, usize, usize)> {
    let depot = inst.depot;
    let mut list = Vec::new();
    for &i in &inst.customers {
        for &j in &inst.customers {
            if i != j {
                let s = inst.distance(i, depot) + inst.distance(depot, j) - inst.distance(i, j);
                list.push((s, i, j));
            }
        }
    }
    list.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));
    list
}

/// Merges single-customer routes by descending savings. Route `A` ending at
/// `i` and route `B` starting at `j` become `A ++ B` when some vehicle can
/// drive the result. Customers no vehicle can serve alone are returned
/// separately.
pub(crate) fn clarke_wright(inst: &Instance<'_>) -> (Vec<Vec<usize>>, Vec<usize>) {
    let n = inst.problem.locations.len();
    let mut routes: Vec<Option<Vec<usize>>> = Vec::new();
    let mut route_of: Vec<Option<usize>> = vec![None; n];
    let mut unservable = Vec::new();

    for &c in &inst.customers {
        if inst.feasible_for_any(&[c]) {
            route_of[c] = Some(routes.len());
            routes.push(Some(vec![c]));
        } else {
            unservable.push(c);
        }
    }

    for (s, i, j) in savings(inst) {
        if s <= 0.0 {
            break;
        }
        let (Some(ri), Some(rj)) = (route_of[i], route_of[j]) else {
            continue;
        };
        if ri == rj {
            continue;
        }
        let (Some(a), Some(b)) = (&routes[ri], &routes[rj]) else {
            continue;
        };
        if a.last() != Some(&i) || b.first() != Some(&j) {
            continue;
        }
        let merged: Vec<usize> = a.iter().chain(b.iter()).copied().collect();
        if !inst.feasible_for_any(&merged) {
            continue;
        }
        for &c in &merged {
            route_of[c] = Some(ri);
        }
        routes[ri] = Some(merged);
        routes[rj] = None;
    }

    (routes.into_iter().flatten().collect(), unservable)
}

/// Gives each constructed route the cheapest free vehicle that can drive
/// it, heaviest route first. Customers of routes left without a vehicle
/// are inserted at their cheapest feasible position elsewhere, or left
/// unassigned.
pub(crate) fn assign(inst: &Instance<'_>, mut routes: Vec<Vec<usize>>, unservable: Vec<usize>) -> Plan {
    let vehicles = &inst.problem.vehicles;
    let load = |r: &[usize]| r.iter().map(|&c| inst.demand[c]).sum::<f64>();
    routes.sort_by(|a, b| load(b).total_cmp(&load(a)).then(a.cmp(b)));

    let mut plan = Plan {
        routes: vec![Vec::new(); vehicles.len()],
        unassigned: unservable,
    };
    let mut pending = Vec::new();
    for route in routes {
        let best = vehicles
            .iter()
            .enumerate()
            .filter(|(k, _)| plan.routes[*k].is_empty())
            .filter_map(|(k, v)| inst.route_score(&route, v).map(|s| (s, k)))
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        match best {
            Some((_, k)) => plan.routes[k] = route,
            None => pending.extend(route),
        }
    }

    for c in pending {
        match best_insertion(inst, &plan.routes, c) {
            Some((_, k, pos)) => plan.routes[k].insert(pos, c),
            None => plan.unassigned.push(c),
        }
    }
    plan.unassigned.sort_unstable();
    plan
}

/// Cheapest feasible `(delta, vehicle, position)` for inserting `c`.
pub(crate) fn best_insertion(inst: &Instance<'_>, routes: &[Vec<usize>], c: usize) -> Option<(f64, usize, usize)> {
    let mut best: Option<(f64, usize, usize)> = None;
    for (k, route) in routes.iter().enumerate() {
        let vehicle = &inst.problem.vehicles[k];
        let Some(before) = inst.route_score(route, vehicle) else {
            continue;
        };
        for pos in 0..=route.len() {
            let mut candidate = route.clone();
            candidate.insert(pos, c);
            if let Some(after) = inst.route_score(&candidate, vehicle) {
                let delta = after - before;
                if best.map_or(true, |(d, _, _)| delta < d) {
                    best = Some((delta, k, pos));
                }
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::model::{Location, RouteDemand, RoutingProblem, Vehicle};

    /// Depot at the origin, customers on two opposite arms.
    fn arms() -> RoutingProblem {
        // 0 depot, 1 (1,0), 2 (2,0), 3 (-1,0), 4 (-2,0)
        let xs = [0.0, 1.0, 2.0, -1.0, -2.0];
        let d: Vec<Vec<f64>> = xs
            .iter()
            .map(|a: &f64| xs.iter().map(|b| (a - b).abs()).collect())
            .collect();
        let locations = ["depot", "a1", "a2", "b1", "b2"]
            .into_iter()
            .map(Location::new)
            .collect();
        let mut p = RoutingProblem::new(
            "arms",
            "depot",
            locations,
            vec![Vehicle::new("big", 10.0), Vehicle::new("small", 5.0)],
            d,
        );
        for id in ["a1", "a2", "b1", "b2"] {
            p = p.with_demand(RouteDemand::new(format!("d-{id}"), id, 2.0));
        }
        p
    }

    #[test]
    fn test_savings_order() {
        let p = arms();
        let inst = Instance::new(&p, 1.0);
        let s = savings(&inst);
        // Same-arm pairs save, opposite-arm pairs do not.
        assert_eq!(s[0].0, 2.0);
        assert!(s.iter().filter(|x| x.0 > 0.0).all(|x| (x.1 <= 2) == (x.2 <= 2)));
    }

    #[test]
    fn test_merges_each_arm() {
        let p = arms();
        let inst = Instance::new(&p, 1.0);
        let (routes, unservable) = clarke_wright(&inst);
        assert!(unservable.is_empty());
        assert_eq!(routes.len(), 2);
        for r in &routes {
            assert_eq!(r.len(), 2);
            assert!(r.iter().all(|&c| c <= 2) || r.iter().all(|&c| c >= 3));
        }
    }

    #[test]
    fn test_assign_and_fallback_insertion() {
        let mut p = arms();
        p.vehicles = vec![Vehicle::new("only", 10.0)];
        let inst = Instance::new(&p, 1.0);
        let (routes, unservable) = clarke_wright(&inst);
        let plan = assign(&inst, routes, unservable);
        // One vehicle takes one arm, then absorbs the other by insertion.
        assert!(plan.unassigned.is_empty());
        assert_eq!(plan.routes[0].len(), 4);
    }

    #[test]
    fn test_unservable_customer() {
        let mut p = arms();
        p.demands[0].quantity = 50.0;
        let inst = Instance::new(&p, 1.0);
        let (routes, unservable) = clarke_wright(&inst);
        assert_eq!(unservable, vec![1]);
        let plan = assign(&inst, routes, unservable);
        assert_eq!(plan.unassigned, vec![1]);
    }
}
