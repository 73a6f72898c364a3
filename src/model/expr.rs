//! Algebraic expression tree.
//!
//! Objectives and constraints are expressed as a closed [`Expr`] over
//! variable positions. Expressions are data: they can be inspected,
//! validated against a problem, and serialized, but never parsed from
//! untrusted text.
//!
//! # Examples
//!
//! ```
//! use u_optimize::model::Expr;
//!
//! // 2x + y
//! let e = Expr::constant(2.0) * Expr::var(0) + Expr::var(1);
//! assert_eq!(e.evaluate(&[3.0, 4.0]), 10.0);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// An expression over the variables of a problem.
///
/// Comparison and logical nodes evaluate to `1.0` (true) or `0.0` (false);
/// any non-zero value counts as true when used as a logical operand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Const(f64),
    /// Value of the variable at this position in the problem.
    Var(usize),
    Neg(Box<Expr>),
    Abs(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Min(Box<Expr>, Box<Expr>),
    Max(Box<Expr>, Box<Expr>),
    Sum(Vec<Expr>),
    Lt(Box<Expr>, Box<Expr>),
    Le(Box<Expr>, Box<Expr>),
    Eq(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

fn truth(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

impl Expr {
    pub fn constant(value: f64) -> Self {
        Expr::Const(value)
    }

    pub fn var(index: usize) -> Self {
        Expr::Var(index)
    }

    /// Linear combination `Σ coeff·x_index`.
    pub fn linear(terms: &[(usize, f64)]) -> Self {
        Expr::Sum(
            terms
                .iter()
                .map(|&(i, c)| Expr::Mul(Box::new(Expr::Const(c)), Box::new(Expr::Var(i))))
                .collect(),
        )
    }

    pub fn sum(terms: Vec<Expr>) -> Self {
        Expr::Sum(terms)
    }

    pub fn abs(self) -> Self {
        Expr::Abs(Box::new(self))
    }

    pub fn pow(self, exponent: Expr) -> Self {
        Expr::Pow(Box::new(self), Box::new(exponent))
    }

    pub fn min(self, other: Expr) -> Self {
        Expr::Min(Box::new(self), Box::new(other))
    }

    pub fn max(self, other: Expr) -> Self {
        Expr::Max(Box::new(self), Box::new(other))
    }

    pub fn lt(self, other: Expr) -> Self {
        Expr::Lt(Box::new(self), Box::new(other))
    }

    pub fn le(self, other: Expr) -> Self {
        Expr::Le(Box::new(self), Box::new(other))
    }

    pub fn equals(self, other: Expr) -> Self {
        Expr::Eq(Box::new(self), Box::new(other))
    }

    pub fn and(self, other: Expr) -> Self {
        Expr::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Expr) -> Self {
        Expr::Or(Box::new(self), Box::new(other))
    }

    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    /// Evaluates the expression for a full assignment.
    ///
    /// `values[i]` is the value of the variable at position `i`. A reference
    /// past the end evaluates to `NaN`; validation rejects such expressions
    /// before a solve.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        match self {
            Expr::Const(c) => *c,
            Expr::Var(i) => values.get(*i).copied().unwrap_or(f64::NAN),
            Expr::Neg(e) => -e.evaluate(values),
            Expr::Abs(e) => e.evaluate(values).abs(),
            Expr::Add(a, b) => a.evaluate(values) + b.evaluate(values),
            Expr::Sub(a, b) => a.evaluate(values) - b.evaluate(values),
            Expr::Mul(a, b) => a.evaluate(values) * b.evaluate(values),
            Expr::Div(a, b) => a.evaluate(values) / b.evaluate(values),
            Expr::Pow(a, b) => a.evaluate(values).powf(b.evaluate(values)),
            Expr::Min(a, b) => a.evaluate(values).min(b.evaluate(values)),
            Expr::Max(a, b) => a.evaluate(values).max(b.evaluate(values)),
            Expr::Sum(terms) => terms.iter().map(|t| t.evaluate(values)).sum(),
            Expr::Lt(a, b) => truth(a.evaluate(values) < b.evaluate(values)),
            Expr::Le(a, b) => truth(a.evaluate(values) <= b.evaluate(values)),
            Expr::Eq(a, b) => truth(a.evaluate(values) == b.evaluate(values)),
            Expr::And(a, b) => truth(a.evaluate(values) != 0.0 && b.evaluate(values) != 0.0),
            Expr::Or(a, b) => truth(a.evaluate(values) != 0.0 || b.evaluate(values) != 0.0),
            Expr::Not(e) => truth(e.evaluate(values) == 0.0),
        }
    }

    /// Highest variable position referenced, if any.
    pub fn max_var(&self) -> Option<usize> {
        let mut max = None;
        self.visit_vars(&mut |i| max = Some(max.map_or(i, |m: usize| m.max(i))));
        max
    }

    /// Sorted, deduplicated variable positions referenced by this expression.
    pub fn variables(&self) -> Vec<usize> {
        let mut vars = Vec::new();
        self.visit_vars(&mut |i| vars.push(i));
        vars.sort_unstable();
        vars.dedup();
        vars
    }

    /// Returns the variable position if this expression is a bare variable.
    pub fn as_var(&self) -> Option<usize> {
        match self {
            Expr::Var(i) => Some(*i),
            _ => None,
        }
    }

    fn visit_vars(&self, f: &mut impl FnMut(usize)) {
        match self {
            Expr::Const(_) => {}
            Expr::Var(i) => f(*i),
            Expr::Neg(e) | Expr::Abs(e) | Expr::Not(e) => e.visit_vars(f),
            Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Mul(a, b)
            | Expr::Div(a, b)
            | Expr::Pow(a, b)
            | Expr::Min(a, b)
            | Expr::Max(a, b)
            | Expr::Lt(a, b)
            | Expr::Le(a, b)
            | Expr::Eq(a, b)
            | Expr::And(a, b)
            | Expr::Or(a, b) => {
                a.visit_vars(f);
                b.visit_vars(f);
            }
            Expr::Sum(terms) => terms.iter().for_each(|t| t.visit_vars(f)),
        }
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Const(value)
    }
}

impl Add for Expr {
    type Output = Expr;
    fn add(self, rhs: Expr) -> Expr {
        Expr::Add(Box::new(self), Box::new(rhs))
    }
}

impl Sub for Expr {
    type Output = Expr;
    fn sub(self, rhs: Expr) -> Expr {
        Expr::Sub(Box::new(self), Box::new(rhs))
    }
}

impl Mul for Expr {
    type Output = Expr;
    fn mul(self, rhs: Expr) -> Expr {
        Expr::Mul(Box::new(self), Box::new(rhs))
    }
}

impl Div for Expr {
    type Output = Expr;
    fn div(self, rhs: Expr) -> Expr {
        Expr::Div(Box::new(self), Box::new(rhs))
    }
}

impl Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::Neg(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        let e = (Expr::var(0) - Expr::constant(1.0)) * Expr::var(1) / Expr::constant(2.0);
        assert_eq!(e.evaluate(&[3.0, 5.0]), 5.0);
        assert_eq!((-Expr::var(0)).abs().evaluate(&[-2.5]), 2.5);
        assert_eq!(Expr::var(0).pow(2.0.into()).evaluate(&[3.0]), 9.0);
    }

    #[test]
    fn test_linear() {
        let e = Expr::linear(&[(0, 2.0), (2, -1.0)]);
        assert_eq!(e.evaluate(&[1.0, 100.0, 4.0]), -2.0);
        assert_eq!(e.variables(), vec![0, 2]);
    }

    #[test]
    fn test_logic() {
        let x = Expr::var(0);
        let in_range = Expr::constant(1.0).le(x.clone()).and(x.clone().le(3.0.into()));
        assert_eq!(in_range.evaluate(&[2.0]), 1.0);
        assert_eq!(in_range.evaluate(&[4.0]), 0.0);
        assert_eq!(in_range.clone().not().evaluate(&[4.0]), 1.0);
        assert_eq!(x.clone().lt(1.0.into()).or(x.equals(5.0.into())).evaluate(&[5.0]), 1.0);
    }

    #[test]
    fn test_max_var() {
        assert_eq!(Expr::constant(1.0).max_var(), None);
        let e = Expr::sum(vec![Expr::var(3), Expr::var(1).min(Expr::var(7))]);
        assert_eq!(e.max_var(), Some(7));
    }

    #[test]
    fn test_dangling_is_nan() {
        assert!(Expr::var(5).evaluate(&[1.0]).is_nan());
    }

    #[test]
    fn test_as_var() {
        assert_eq!(Expr::var(2).as_var(), Some(2));
        assert_eq!((Expr::var(2) + Expr::var(1)).as_var(), None);
    }
}
