//! Whole-graph checks that collect every problem instead of stopping at the
//! first.

use crate::{Error, Result, TaskGraph, TaskNodeData};

/// Problems found by [`TaskGraph::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    /// `(task, dependency)` pairs naming tasks that are not vertices.
    pub missing: Vec<(String, String)>,
    /// Sorted ids of the tasks on a cycle, if the edges form one.
    pub cycle: Option<Vec<String>>,
}

impl ValidationResult {
    /// No missing dependencies and no cycle.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty() && self.cycle.is_none()
    }

    /// The found problems as errors, missing dependencies first.
    #[must_use]
    pub fn errors(&self) -> Vec<Error> {
        let mut errors = Vec::new();
        if !self.missing.is_empty() {
            errors.push(Error::MissingDependencies {
                missing: self.missing.clone(),
            });
        }
        if let Some(tasks) = &self.cycle {
            errors.push(Error::CycleDetected {
                tasks: tasks.clone(),
            });
        }
        errors
    }

    /// `Ok` for a valid graph, otherwise the first error.
    pub fn into_result(self) -> Result<()> {
        self.errors().into_iter().next().map_or(Ok(()), Err)
    }
}

impl<T: TaskNodeData> TaskGraph<T> {
    /// Check declared dependency names and edges.
    ///
    /// Unlike [`TaskGraph::add_dependency_edges`], this never modifies the
    /// graph, so it can run before edges are added to report every unknown
    /// name at once.
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        let mut missing = Vec::new();
        for name in self.task_names() {
            let Some(node) = self.get_node_by_name(name) else {
                continue;
            };
            missing.extend(
                node.task
                    .dependency_names()
                    .filter(|dep| !self.contains_task(dep))
                    .map(|dep| (name.to_string(), dep.to_string())),
            );
        }

        ValidationResult {
            missing,
            cycle: self.find_cycle(),
        }
    }
}
