//! Task registry
//!
//! Maps user-facing task identifiers to the task classes a simulator
//! exports. Only grasp/lift tasks from [`CANDIDATE_TASKS`] are registered,
//! each under its exact class name and a snake_case alias.

use crate::{
    error::{Result, SnapError},
    sim::{Simulator, TaskClass},
};
use std::collections::BTreeMap;
use tracing::debug;

/// Grasp/lift tasks this utility knows how to snapshot
pub const CANDIDATE_TASKS: [&str; 3] = ["PickAndLift", "PickUpCup", "LiftNumberedBlock"];

/// Derive the snake_case alias of a class name
///
/// Every uppercase letter becomes `_` followed by its lowercase form and a
/// leading underscore is stripped: `PickAndLift` becomes `pick_and_lift`.
#[must_use]
pub fn snake_case(name: &str) -> String {
    let mut alias = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_uppercase() {
            alias.push('_');
            alias.extend(c.to_lowercase());
        } else {
            alias.push(c);
        }
    }
    match alias.strip_prefix('_') {
        Some(stripped) => stripped.to_string(),
        None => alias,
    }
}

/// Registry of task classes keyed by exact name and alias
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    entries: BTreeMap<String, TaskClass>,
}

impl TaskRegistry {
    /// Build a registry from exported classes, keeping those in `allow_list`
    #[must_use]
    pub fn from_exported<I>(exported: I, allow_list: &[&str]) -> Self
    where
        I: IntoIterator<Item = TaskClass>,
    {
        let mut entries = BTreeMap::new();
        for class in exported {
            if !allow_list.contains(&class.name) {
                continue;
            }
            let alias = snake_case(class.name);
            debug!(task = class.name, alias = %alias, "Registering task");
            entries.insert(class.name.to_string(), class);
            entries.insert(alias, class);
        }
        Self { entries }
    }

    /// Registry of the candidate tasks a simulator exports
    ///
    /// # Errors
    /// - `SnapError::NoCandidateTasks` when the simulator exports none of them
    pub fn discover(simulator: &dyn Simulator) -> Result<Self> {
        let registry = Self::from_exported(simulator.exported_tasks(), &CANDIDATE_TASKS);
        if registry.is_empty() {
            return Err(SnapError::NoCandidateTasks);
        }
        debug!(
            simulator = simulator.name(),
            tasks = registry.canonical_names().len(),
            "Task registry built"
        );
        Ok(registry)
    }

    /// Resolve an exact name or alias
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&TaskClass> {
        self.entries.get(name)
    }

    /// Resolve a name, failing with `SnapError::UnknownTask`
    pub fn resolve(&self, name: &str) -> Result<TaskClass> {
        self.lookup(name)
            .copied()
            .ok_or_else(|| SnapError::UnknownTask(name.to_string()))
    }

    /// Every registered identifier (exact names and aliases), sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Registered class names without aliases, sorted
    #[must_use]
    pub fn canonical_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.entries.values().map(|class| class.name).collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Number of registered identifiers
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
