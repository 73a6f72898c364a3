//! Local sensitivity analysis for non-LP strategies.
//!
//! Gradients are estimated by finite differences of the weighted-sum
//! objective `F` (minimization form, see [`weighted_sum`]):
//!
//! - variable reduced cost: `∂F/∂x_j`
//! - constraint shadow price (active constraints only):
//!   `dF/d target ≈ (∇F · ∇g) / |∇g|²`, the first-order KKT multiplier of a
//!   single binding constraint `g op target`
//! - objective shadow price: `∂F/∂w_i = sign_i · f_i`
//!
//! Inactive constraints have a zero shadow price. Categorical variables have
//! no meaningful derivative and report zero.

use crate::evaluator::{objective_values, weighted_sum, ConstraintEvaluator};
use crate::model::{
    ConstraintKind, ConstraintSensitivity, Expr, ObjectiveSensitivity, Problem, Sensitivity,
    VariableKind, VariableSensitivity,
};

/// Computes sensitivity data at `values`.
pub fn analyze(problem: &Problem, values: &[f64], evaluator: &ConstraintEvaluator) -> Sensitivity {
    let objective = |x: &[f64]| weighted_sum(problem, &objective_values(problem, x));
    let grad_f = gradient(problem, values, &objective);

    let objectives = problem
        .objectives
        .iter()
        .map(|o| ObjectiveSensitivity {
            name: o.name.clone(),
            shadow_price: o.direction.sign() * o.evaluate(values),
        })
        .collect();

    let variables = problem
        .variables
        .iter()
        .zip(&grad_f)
        .map(|(v, &g)| VariableSensitivity {
            name: v.name.clone(),
            reduced_cost: g,
        })
        .collect();

    let constraints = problem
        .constraints
        .iter()
        .map(|c| {
            let slack = evaluator.slack(values, c);
            let tol = evaluator.tolerance_for(c).max(1e-9);
            let active = slack.abs() <= tol * 10.0;
            let shadow_price = if active && c.kind != ConstraintKind::Logical {
                multiplier(problem, values, &grad_f, &c.expression)
            } else {
                0.0
            };
            ConstraintSensitivity {
                name: c.name.clone(),
                slack,
                shadow_price,
            }
        })
        .collect();

    Sensitivity {
        objectives,
        constraints,
        variables,
    }
}

fn multiplier(problem: &Problem, values: &[f64], grad_f: &[f64], expr: &Expr) -> f64 {
    let grad_g = gradient(problem, values, &|x: &[f64]| expr.evaluate(x));
    let norm2: f64 = grad_g.iter().map(|g| g * g).sum();
    if norm2 < 1e-18 {
        return 0.0;
    }
    let dot: f64 = grad_f.iter().zip(&grad_g).map(|(a, b)| a * b).sum();
    dot / norm2
}

/// Finite-difference gradient of `f` respecting variable bounds.
fn gradient(problem: &Problem, values: &[f64], f: &dyn Fn(&[f64]) -> f64) -> Vec<f64> {
    let mut x = values.to_vec();
    problem
        .variables
        .iter()
        .enumerate()
        .map(|(j, var)| {
            if var.kind == VariableKind::Categorical {
                return 0.0;
            }
            let (lo, hi) = var.bounds();
            let h = if var.is_discrete() {
                1.0
            } else {
                1e-6 * values[j].abs().max(1.0)
            };
            let up = (values[j] + h).min(hi);
            let down = (values[j] - h).max(lo);
            if up - down <= 0.0 {
                return 0.0;
            }
            x[j] = up;
            let f_up = f(&x);
            x[j] = down;
            let f_down = f(&x);
            x[j] = values[j];
            let d = (f_up - f_down) / (up - down);
            if d.is_finite() {
                d
            } else {
                0.0
            }
        })
        .collect()
}
