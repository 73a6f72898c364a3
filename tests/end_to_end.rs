//! End-to-end scenarios driven through the public engine surface.

use proptest::prelude::*;
use std::sync::{Arc, Mutex};
use u_optimize::allocation::{allocation_problem, Demand, Resource};
use u_optimize::config::EngineConfig;
use u_optimize::genetic::GeneticParams;
use u_optimize::model::{
    Algorithm, AlgorithmParams, Constraint, ConvergenceCriterion, ConvergenceKind, Expr, Objective,
    Operator, Problem, SolverParameters, Variable,
};
use u_optimize::routing::{Location, RouteDemand, RoutingProblem, TimeWindow, Vehicle, WindowKind};
use u_optimize::scheduling::{SchedulingProblem, Task};
use u_optimize::store::{InMemoryStore, ResultStore};
use u_optimize::{Engine, SolutionStatus};

fn min_x_at_least_5(params: SolverParameters) -> Problem {
    let mut p = Problem::new("min-x").with_parameters(params);
    let x = p.add_variable(Variable::continuous("x", 0.0, 10.0));
    p.add_objective(Objective::minimize("x", x));
    p.add_constraint(Constraint::inequality("x>=5", Expr::var(0), Operator::Ge, 5.0));
    p
}

fn genetic_params(seed: u64) -> SolverParameters {
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

#[test]
fn test_min_x_backtracking() {
    let engine = Engine::new();
    let p = min_x_at_least_5(engine.parameters(Algorithm::Backtracking));
    let s = engine.solve(&p, None).unwrap();
    assert!(s.status.is_success());
    assert_eq!(s.variable("x"), Some(5.0));
    assert_eq!(s.objective("x"), Some(5.0));
    assert!(s.violations.is_empty());
}

#[test]
fn test_min_x_genetic() {
    let p = min_x_at_least_5(genetic_params(42));
    let s = Engine::new().solve(&p, None).unwrap();
    let x = s.variable("x").unwrap();
    assert!((x - 5.0).abs() < 0.05, "x = {x}");
    assert!(s.violations.is_empty());
    assert!(matches!(s.status, SolutionStatus::Feasible | SolutionStatus::IterationLimit));
}

#[test]
fn test_genetic_seed_reproducible() {
    let engine = Engine::new();
    let p = min_x_at_least_5(genetic_params(7));
    let a = engine.solve(&p, None).unwrap();
    let b = engine.solve(&p, None).unwrap();
    assert!(a.same_outcome(&b));
    assert_ne!(a.id, b.id);
}

#[test]
fn test_genetic_trace_never_regresses() {
    let p = min_x_at_least_5(genetic_params(3));
    let s = Engine::new().solve(&p, None).unwrap();
    assert!(!s.metadata.trace.is_empty());
    for w in s.metadata.trace.windows(2) {
        assert!(w[1].best_fitness <= w[0].best_fitness);
    }
}

#[test]
fn test_contradictory_constraints_infeasible() {
    let engine = Engine::new();
    let mut p = Problem::new("x=1,x=2").with_parameters(engine.parameters(Algorithm::Backtracking));
    let x = p.add_variable(Variable::integer("x", 0, 10));
    p.add_objective(Objective::minimize("x", x));
    p.add_constraint(Constraint::equality("x=1", Expr::var(0), 1.0));
    p.add_constraint(Constraint::equality("x=2", Expr::var(0), 2.0));
    let s = engine.solve(&p, None).unwrap();
    assert_eq!(s.status, SolutionStatus::Infeasible);
    assert!(!s.violations.is_empty());
}

#[test]
fn test_two_resource_allocation() {
    let engine = Engine::new();
    let resources = vec![Resource::new("r1", 10.0, 2.0), Resource::new("r2", 20.0, 1.0)];
    let demands = vec![Demand::new("d", 25.0)];
    let plan = engine
        .solve_allocation(&allocation_problem("two"), &resources, &demands, None)
        .unwrap();
    assert_eq!(plan.solution.status, SolutionStatus::Optimal);
    let cost = plan.solution.objective("total_cost").unwrap();
    assert!((cost - 30.0).abs() < 1e-6, "cost = {cost}");
    assert!((plan.resource_load("r2") - 20.0).abs() < 1e-6);
    assert!((plan.resource_load("r1") - 5.0).abs() < 1e-6);
    assert!((plan.delivered("d") - 25.0).abs() < 1e-6);
}

fn depot_and_customers(windows: &[Option<TimeWindow>], demand: f64, capacity: f64) -> RoutingProblem {
    // Customers on a line at x = 1..=n, depot at 0.
    let n = windows.len();
    let distances = (0..=n)
        .map(|i| (0..=n).map(|j| (i as f64 - j as f64).abs()).collect())
        .collect();
    let mut locations = vec![Location::new("depot")];
    for (i, w) in windows.iter().enumerate() {
        let mut loc = Location::new(format!("c{}", i + 1));
        if let Some(w) = w {
            loc = loc.with_window(*w);
        }
        locations.push(loc);
    }
    let vehicles = vec![Vehicle::new("v1", capacity), Vehicle::new("v2", capacity)];
    let mut p = RoutingProblem::new("line", "depot", locations, vehicles, distances);
    for i in 1..=n {
        p = p.with_demand(RouteDemand::new(format!("d{i}"), format!("c{i}"), demand));
    }
    p
}

#[test]
fn test_routing_respects_capacity_and_windows() {
    let windows = vec![
        None,
        Some(TimeWindow::required(5.0, 20.0)),
        None,
        Some(TimeWindow::required(0.0, 50.0)),
        Some(TimeWindow::preferred(30.0, 40.0)),
    ];
    let p = depot_and_customers(&windows, 3.0, 9.0);
    let s = Engine::new().solve_routing(&p, None).unwrap();
    assert!(s.unassigned.is_empty());
    assert!(s.solution.status.is_success());

    let mut visited = 0;
    for route in &s.routes {
        assert!(route.load <= 9.0 + 1e-9);
        for stop in &route.stops {
            let loc = p.locations.iter().find(|l| l.id == stop.location).unwrap();
            let t = stop.service_start;
            let (forbidden, allowing): (Vec<&TimeWindow>, Vec<&TimeWindow>) =
                loc.windows.iter().partition(|w| w.kind == WindowKind::Forbidden);
            assert!(
                allowing.is_empty() || allowing.iter().any(|w| w.contains(t)),
                "{} at {t}",
                loc.id
            );
            assert!(forbidden.iter().all(|w| !w.contains(t)), "{} at {t}", loc.id);
        }
        visited += route.stops.len();
    }
    assert_eq!(visited, 5);
}

#[test]
fn test_routing_waits_for_preferred_only_window() {
    let p = depot_and_customers(&[Some(TimeWindow::preferred(50.0, 60.0))], 1.0, 5.0);
    let s = Engine::new().solve_routing(&p, None).unwrap();
    assert_eq!(s.solution.status, SolutionStatus::Feasible);
    let stop = &s.routes.iter().find(|r| !r.stops.is_empty()).unwrap().stops[0];
    assert_eq!(stop.arrival, 1.0);
    assert!((50.0..=60.0).contains(&stop.service_start));
}

#[test]
fn test_scheduling_through_engine() {
    let p = SchedulingProblem::new(
        "line",
        vec![
            Task::new("a", 2),
            Task::new("b", 3).after(["a"]),
            Task::new("c", 1),
        ],
        vec![
            u_optimize::scheduling::Resource::new("m1"),
            u_optimize::scheduling::Resource::new("m2"),
        ],
        100,
    );
    let s = Engine::new().solve_scheduling(&p, None).unwrap();
    assert_eq!(s.makespan, 5);
    let a = s.assignment("a").unwrap();
    let b = s.assignment("b").unwrap();
    assert!(b.start >= a.end);
}

#[test]
fn test_config_file_to_stored_result() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.toml");
    std::fs::write(
        &path,
        format!(
            "results_dir = {:?}\n[defaults]\nmax_iterations = 500\nseed = 5\n",
            dir.path().join("results")
        ),
    )
    .unwrap();

    let config = EngineConfig::load(&path).unwrap();
    let engine = Engine::from_config(config).unwrap();
    let p = min_x_at_least_5(engine.parameters(Algorithm::Backtracking));
    let s = engine.solve(&p, None).unwrap();

    let stored = engine.store().unwrap().load(&p.id).unwrap().unwrap();
    assert_eq!(stored, s);
    assert_eq!(dir.path().join("results").read_dir().unwrap().count(), 1);
}

#[test]
fn test_callback_and_store_see_same_solution() {
    let store = Arc::new(InMemoryStore::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let engine = Engine::new()
        .with_store(store.clone())
        .on_complete(move |s| sink.lock().unwrap().push(s.id.clone()));

    let p = min_x_at_least_5(engine.parameters(Algorithm::Backtracking));
    let s = engine.solve(&p, None).unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![s.id.clone()]);
    assert_eq!(store.load(&p.id).unwrap(), Some(s));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_allocation_within_bounds(
        caps in prop::collection::vec(1.0f64..50.0, 1..4),
        costs in prop::collection::vec(0.5f64..5.0, 4),
        qty in prop::collection::vec(1.0f64..40.0, 1..4),
    ) {
        let resources: Vec<Resource> = caps
            .iter()
            .enumerate()
            .map(|(i, &c)| Resource::new(format!("r{i}"), c, costs[i]))
            .collect();
        let demands: Vec<Demand> = qty
            .iter()
            .enumerate()
            .map(|(j, &q)| Demand::new(format!("d{j}"), q))
            .collect();
        let plan = Engine::new()
            .solve_allocation(&allocation_problem("prop"), &resources, &demands, None)
            .unwrap();
        for r in &resources {
            prop_assert!(plan.resource_load(&r.id) <= r.capacity + 1e-6);
        }
        for d in &demands {
            prop_assert!(plan.delivered(&d.id) <= d.quantity + 1e-6);
        }
        let supply: f64 = caps.iter().sum();
        let need: f64 = qty.iter().sum();
        if supply >= need {
            prop_assert_eq!(plan.solution.status, SolutionStatus::Optimal);
        } else {
            prop_assert_eq!(plan.solution.status, SolutionStatus::Infeasible);
        }
    }

    #[test]
    fn prop_routing_loads_within_capacity(demands in prop::collection::vec(1.0f64..5.0, 1..8)) {
        let windows = vec![None; demands.len()];
        let mut p = depot_and_customers(&windows, 1.0, 10.0);
        for (d, q) in p.demands.iter_mut().zip(&demands) {
            d.quantity = *q;
        }
        let s = Engine::new().solve_routing(&p, None).unwrap();
        for route in &s.routes {
            prop_assert!(route.load <= 10.0 + 1e-9);
            let carried: f64 = route
                .stops
                .iter()
                .filter_map(|stop| p.demands.iter().find(|d| d.location == stop.location))
                .map(|d| d.quantity)
                .sum();
            prop_assert!((carried - route.load).abs() < 1e-9);
        }
    }
}
