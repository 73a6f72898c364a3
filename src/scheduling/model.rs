//! Tasks, resources and schedules.

use crate::error::ValidationError;
use crate::model::validate::validate_problem;
use crate::model::{Algorithm, Direction, Objective, Problem, Solution, SolverParameters};
use crate::routing::WindowKind;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A time window on a task, in integer time units.
///
/// A required window must contain the whole task; a forbidden window
/// must not overlap it; a preferred window is soft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskWindow {
    pub start: i64,
    pub end: i64,
    #[serde(default)]
    pub kind: WindowKind,
}

impl TaskWindow {
    pub fn required(start: i64, end: i64) -> Self {
        Self { start, end, kind: WindowKind::Required }
    }

    pub fn preferred(start: i64, end: i64) -> Self {
        Self { start, end, kind: WindowKind::Preferred }
    }

    pub fn forbidden(start: i64, end: i64) -> Self {
        Self { start, end, kind: WindowKind::Forbidden }
    }

    /// Whether `[start, finish)` lies within the window.
    pub fn covers(&self, start: i64, finish: i64) -> bool {
        start >= self.start && finish <= self.end
    }

    /// Whether `[start, finish)` intersects the window.
    pub fn overlaps(&self, start: i64, finish: i64) -> bool {
        start < self.end && finish > self.start
    }
}

/// A unit of work placed on exactly one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub duration: i64,
    /// Tasks that must finish before this one starts.
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    /// Higher runs earlier among ready tasks.
    #[serde(default)]
    pub priority: i32,
    /// Capacity units held while running.
    #[serde(default = "one")]
    pub units: u32,
    #[serde(default)]
    pub windows: Vec<TaskWindow>,
}

fn one() -> u32 {
    1
}

impl Task {
    pub fn new(id: impl Into<String>, duration: i64) -> Self {
        Self {
            id: id.into(),
            duration,
            dependencies: Vec::new(),
            skills: Vec::new(),
            priority: 0,
            units: 1,
            windows: Vec::new(),
        }
    }

    pub fn after<S: Into<String>>(mut self, dependencies: impl IntoIterator<Item = S>) -> Self {
        self.dependencies.extend(dependencies.into_iter().map(Into::into));
        self
    }

    pub fn with_skills<S: Into<String>>(mut self, skills: impl IntoIterator<Item = S>) -> Self {
        self.skills = skills.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_units(mut self, units: u32) -> Self {
        self.units = units;
        self
    }

    pub fn with_window(mut self, window: TaskWindow) -> Self {
        self.windows.push(window);
        self
    }
}

/// A machine, person or crew that runs tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    /// Concurrent capacity units.
    #[serde(default = "one")]
    pub capacity: u32,
    #[serde(default)]
    pub skills: Vec<String>,
    /// Cost per time unit of task execution.
    #[serde(default)]
    pub cost_per_time: f64,
    /// End of regular hours; work past it is overtime.
    #[serde(default)]
    pub regular_end: Option<i64>,
    /// Extra cost per time unit of overtime.
    #[serde(default)]
    pub overtime_cost: f64,
}

impl Resource {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            capacity: 1,
            skills: Vec::new(),
            cost_per_time: 0.0,
            regular_end: None,
            overtime_cost: 0.0,
        }
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_skills<S: Into<String>>(mut self, skills: impl IntoIterator<Item = S>) -> Self {
        self.skills = skills.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cost(mut self, cost_per_time: f64) -> Self {
        self.cost_per_time = cost_per_time;
        self
    }

    pub fn with_overtime(mut self, regular_end: i64, overtime_cost: f64) -> Self {
        self.regular_end = Some(regular_end);
        self.overtime_cost = overtime_cost;
        self
    }

    /// Whether this resource has the skills and capacity `task` needs.
    pub fn can_run(&self, task: &Task) -> bool {
        task.units <= self.capacity && task.skills.iter().all(|s| self.skills.contains(s))
    }
}

/// Scheduling metrics that objectives may name.
pub const METRICS: [&str; 4] = ["makespan", "total_cost", "overtime", "workload_imbalance"];

/// The generic problem extended with tasks, resources and a horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingProblem {
    pub problem: Problem,
    pub tasks: Vec<Task>,
    pub resources: Vec<Resource>,
    /// Every task must finish by this time.
    pub horizon: i64,
}

impl SchedulingProblem {
    /// A problem minimizing `makespan` with the scheduling strategy
    /// selected.
    pub fn new(name: impl Into<String>, tasks: Vec<Task>, resources: Vec<Resource>, horizon: i64) -> Self {
        let mut problem = Problem::new(name)
            .with_parameters(SolverParameters::for_algorithm(Algorithm::Scheduling));
        problem.add_objective(Objective::metric("makespan", Direction::Minimize));
        Self {
            problem,
            tasks,
            resources,
            horizon,
        }
    }

    pub fn task_index(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_problem(&self.problem, false)?;
        if !self.problem.variables.is_empty() || !self.problem.constraints.is_empty() {
            return Err(ValidationError::AlgorithmMismatch {
                strategy: Algorithm::Scheduling.to_string(),
                reason: "schedules are derived from tasks and resources".into(),
            });
        }
        if let Some(o) = self
            .problem
            .objectives
            .iter()
            .find(|o| !METRICS.contains(&o.name.as_str()))
        {
            return Err(ValidationError::AlgorithmMismatch {
                strategy: Algorithm::Scheduling.to_string(),
                reason: format!("unknown scheduling metric '{}'", o.name),
            });
        }
        if self.tasks.is_empty() {
            return Err(ValidationError::Empty("tasks".into()));
        }
        if self.resources.is_empty() {
            return Err(ValidationError::Empty("resources".into()));
        }
        if self.horizon <= 0 {
            return Err(ValidationError::InvalidParameters(format!(
                "horizon must be positive, got {}",
                self.horizon
            )));
        }

        let mut ids = HashSet::new();
        for t in &self.tasks {
            if !ids.insert(t.id.as_str()) {
                return Err(ValidationError::DuplicateId(t.id.clone()));
            }
            if t.duration <= 0 {
                return Err(ValidationError::InvalidTaskDuration {
                    task: t.id.clone(),
                    duration: t.duration,
                });
            }
            if t.units == 0 {
                return Err(ValidationError::InvalidParameters(format!(
                    "task '{}' must hold at least one unit",
                    t.id
                )));
            }
            if t.windows.iter().any(|w| w.start > w.end) {
                return Err(ValidationError::InvalidParameters(format!(
                    "task '{}' has an inverted time window",
                    t.id
                )));
            }
        }
        for t in &self.tasks {
            if let Some(dep) = t.dependencies.iter().find(|d| !ids.contains(d.as_str())) {
                return Err(ValidationError::UnknownDependency {
                    task: t.id.clone(),
                    dependency: dep.clone(),
                });
            }
        }

        let mut resource_ids = HashSet::new();
        for r in &self.resources {
            if !resource_ids.insert(r.id.as_str()) {
                return Err(ValidationError::DuplicateId(r.id.clone()));
            }
            if r.capacity == 0 {
                return Err(ValidationError::NegativeCapacity {
                    owner: r.id.clone(),
                    capacity: 0.0,
                });
            }
            if !(r.cost_per_time >= 0.0 && r.overtime_cost >= 0.0) {
                return Err(ValidationError::InvalidParameters(format!(
                    "resource '{}' has a negative cost",
                    r.id
                )));
            }
        }
        Ok(())
    }
}

/// One task's placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub task: String,
    pub resource: String,
    pub start: i64,
    pub end: i64,
    /// Time units past the resource's regular hours.
    pub overtime: i64,
}

/// The generic solution plus the schedule it encodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSolution {
    pub solution: Solution,
    /// Placements ordered by start time, then task id.
    pub assignments: Vec<ScheduledTask>,
    pub makespan: i64,
}

impl ScheduleSolution {
    pub fn assignment(&self, task: &str) -> Option<&ScheduledTask> {
        self.assignments.iter().find(|a| a.task == task)
    }
}
