//! First-improvement local search over a fleet plan.
//!
//! Every move keeps each route feasible for its vehicle, so the plan score
//! never increases and unassigned customers only ever get placed.

use super::construction::{best_insertion, Plan};
use super::evaluation::Instance;

const EPS: f64 = 1e-9;

/// Sum of route scores. Infeasible routes never occur in a plan.
pub(crate) fn plan_score(inst: &Instance<'_>, plan: &Plan) -> f64 {
    plan.routes
        .iter()
        .zip(&inst.problem.vehicles)
        .filter_map(|(r, v)| inst.route_score(r, v))
        .sum()
}

/// Places unassigned customers at their cheapest feasible position.
pub(crate) fn insert_unassigned(inst: &Instance<'_>, plan: &mut Plan) -> bool {
    let mut improved = false;
    let mut still = Vec::new();
    for c in std::mem::take(&mut plan.unassigned) {
        match best_insertion(inst, &plan.routes, c) {
            Some((_, k, pos)) => {
                plan.routes[k].insert(pos, c);
                improved = true;
            }
            None => still.push(c),
        }
    }
    plan.unassigned = still;
    improved
}

/// Moves a single customer to the best position on any vehicle.
pub(crate) fn relocate(inst: &Instance<'_>, plan: &mut Plan) -> bool {
    let vehicles = &inst.problem.vehicles;
    let scores: Vec<f64> = plan
        .routes
        .iter()
        .zip(vehicles)
        .map(|(r, v)| inst.route_score(r, v).unwrap_or(f64::INFINITY))
        .collect();

    for from in 0..plan.routes.len() {
        for i in 0..plan.routes[from].len() {
            let mut source = plan.routes[from].clone();
            let c = source.remove(i);
            let Some(source_score) = inst.route_score(&source, &vehicles[from]) else {
                continue;
            };
            for to in 0..plan.routes.len() {
                let base = if to == from { &source } else { &plan.routes[to] };
                for pos in 0..=base.len() {
                    if to == from && pos == i {
                        continue;
                    }
                    let mut target = base.clone();
                    target.insert(pos, c);
                    let Some(target_score) = inst.route_score(&target, &vehicles[to]) else {
                        continue;
                    };
                    let (before, after) = if to == from {
                        (scores[from], target_score)
                    } else {
                        (scores[from] + scores[to], source_score + target_score)
                    };
                    if after < before - EPS {
                        if to == from {
                            plan.routes[from] = target;
                        } else {
                            plan.routes[from] = source;
                            plan.routes[to] = target;
                        }
                        return true;
                    }
                }
            }
        }
    }
    false
}

/// Reverses a segment of one route.
pub(crate) fn two_opt(inst: &Instance<'_>, plan: &mut Plan) -> bool {
    for (route, vehicle) in plan.routes.iter_mut().zip(&inst.problem.vehicles) {
        if route.len() < 2 {
            continue;
        }
        let Some(before) = inst.route_score(route, vehicle) else {
            continue;
        };
        for i in 0..route.len() - 1 {
            for j in i + 1..route.len() {
                let mut candidate = route.clone();
                candidate[i..=j].reverse();
                if inst
                    .route_score(&candidate, vehicle)
                    .is_some_and(|after| after < before - EPS)
                {
                    *route = candidate;
                    return true;
                }
            }
        }
    }
    false
}

/// Swaps the tails of two routes.
pub(crate) fn two_opt_star(inst: &Instance<'_>, plan: &mut Plan) -> bool {
    let vehicles = &inst.problem.vehicles;
    let n = plan.routes.len();
    for a in 0..n {
        for b in a + 1..n {
            let (ra, rb) = (&plan.routes[a], &plan.routes[b]);
            if ra.is_empty() && rb.is_empty() {
                continue;
            }
            let (Some(sa), Some(sb)) = (
                inst.route_score(ra, &vehicles[a]),
                inst.route_score(rb, &vehicles[b]),
            ) else {
                continue;
            };
            for i in 0..=ra.len() {
                for j in 0..=rb.len() {
                    // Swapping both complete routes or nothing is not a move.
                    if (i == 0 && j == 0) || (i == ra.len() && j == rb.len()) {
                        continue;
                    }
                    let na: Vec<usize> = ra[..i].iter().chain(&rb[j..]).copied().collect();
                    let nb: Vec<usize> = rb[..j].iter().chain(&ra[i..]).copied().collect();
                    let Some(ta) = inst.route_score(&na, &vehicles[a]) else {
                        continue;
                    };
                    let Some(tb) = inst.route_score(&nb, &vehicles[b]) else {
                        continue;
                    };
                    if ta + tb < sa + sb - EPS {
                        plan.routes[a] = na;
                        plan.routes[b] = nb;
                        return true;
                    }
                }
            }
        }
    }
    false
}
