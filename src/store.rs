//! Result persistence.
//!
//! The engine hands every finished [`Solution`] to a [`ResultStore`] once,
//! fire-and-forget: a failed save is logged and never fails the solve.
//! Stores keep the latest solution per problem and must round-trip every
//! field.

use crate::error::StoreError;
use crate::model::{ProblemId, Solution};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Persists solutions keyed by their problem id.
pub trait ResultStore: Send + Sync {
    /// Stores `solution`, replacing any earlier one for the same problem.
    fn save(&self, solution: &Solution) -> Result<(), StoreError>;

    /// The latest solution saved for `problem`, if any.
    fn load(&self, problem: &ProblemId) -> Result<Option<Solution>, StoreError>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    solutions: RwLock<HashMap<ProblemId, Solution>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.solutions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.read().is_empty()
    }
}

impl ResultStore for InMemoryStore {
    fn save(&self, solution: &Solution) -> Result<(), StoreError> {
        self.solutions
            .write()
            .insert(solution.problem_id.clone(), solution.clone());
        Ok(())
    }

    fn load(&self, problem: &ProblemId) -> Result<Option<Solution>, StoreError> {
        Ok(self.solutions.read().get(problem).cloned())
    }
}

/// One pretty-printed JSON file per problem id inside a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Uses `dir`, creating it when missing.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File for `problem`. Characters outside `[A-Za-z0-9_-]` become `_`.
    pub fn path_for(&self, problem: &ProblemId) -> PathBuf {
        let name: String = problem
            .0
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl ResultStore for JsonFileStore {
    fn save(&self, solution: &Solution) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(solution)?;
        fs::write(self.path_for(&solution.problem_id), json)?;
        Ok(())
    }

    fn load(&self, problem: &ProblemId) -> Result<Option<Solution>, StoreError> {
        let path = self.path_for(problem);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }
}
