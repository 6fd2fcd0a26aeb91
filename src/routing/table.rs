//! Task lookup.
//!
//! # Responsibilities
//! - Map a task id to its routing spec and prompt
//! - Carry the target set swept by the health monitor
//!
//! # Design Decisions
//! - Immutable after construction; reloads build a new table and swap it in
//! - Unknown task ids are an explicit `None`, never a default route

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::{RouterConfig, TaskConfig};

/// Primary target plus ordered fallbacks for one task.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RoutingSpec {
    pub primary: String,
    #[serde(default)]
    pub fallbacks: Vec<String>,
}

impl RoutingSpec {
    pub fn new(primary: impl Into<String>, fallbacks: Vec<String>) -> Self {
        Self {
            primary: primary.into(),
            fallbacks,
        }
    }

    /// Primary followed by the fallbacks, in priority order.
    pub fn candidates(&self) -> Vec<String> {
        std::iter::once(self.primary.clone())
            .chain(self.fallbacks.iter().cloned())
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct RoutingTable {
    targets: Vec<String>,
    tasks: HashMap<String, TaskConfig>,
}

impl RoutingTable {
    pub fn new(targets: Vec<String>, tasks: Vec<TaskConfig>) -> Self {
        let tasks = tasks
            .into_iter()
            .map(|task| (task.id.clone(), task))
            .collect();
        Self { targets, tasks }
    }

    pub fn from_config(config: &RouterConfig) -> Self {
        Self::new(config.targets.clone(), config.tasks.clone())
    }

    pub fn lookup(&self, task_id: &str) -> Option<&TaskConfig> {
        self.tasks.get(task_id)
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}
