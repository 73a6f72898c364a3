//! Per-solve stopping conditions.
//!
//! A [`SolveContext`] bundles the cooperative stopping conditions of one
//! solve: the wall-clock budget and an optional cancellation flag. Solvers
//! poll it at iteration boundaries only.

use crate::model::SolverParameters;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Why a solver should stop early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    Cancelled,
    TimeLimit,
}

#[derive(Debug, Clone)]
pub struct SolveContext {
    started: Instant,
    time_limit: Option<Duration>,
    cancel: Option<Arc<AtomicBool>>,
}

impl SolveContext {
    pub fn new(time_limit: Option<Duration>, cancel: Option<Arc<AtomicBool>>) -> Self {
        Self {
            started: Instant::now(),
            time_limit,
            cancel,
        }
    }

    /// Context using the time limit of `params`.
    pub fn for_params(params: &SolverParameters, cancel: Option<Arc<AtomicBool>>) -> Self {
        Self::new(params.time_limit(), cancel)
    }

    pub fn unbounded() -> Self {
        Self::new(None, None)
    }

    pub fn cancel_token(&self) -> Option<Arc<AtomicBool>> {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    pub fn time_exceeded(&self) -> bool {
        self.time_limit
            .is_some_and(|limit| self.started.elapsed() >= limit)
    }

    /// Cancellation takes precedence over the time limit.
    pub fn interrupt(&self) -> Option<Interrupt> {
        if self.is_cancelled() {
            Some(Interrupt::Cancelled)
        } else if self.time_exceeded() {
            Some(Interrupt::TimeLimit)
        } else {
            None
        }
    }

    /// Remaining wall-clock budget in milliseconds, if limited.
    pub fn remaining_ms(&self) -> Option<u64> {
        self.time_limit.map(|limit| {
            let left = limit.saturating_sub(self.started.elapsed());
            (left.as_millis() as u64).max(1)
        })
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for SolveContext {
    fn default() -> Self {
        Self::unbounded()
    }
}
