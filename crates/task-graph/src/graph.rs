//! The task DAG.
//!
//! Edges run from a dependency to its dependent, so every topological order
//! and every parallel level lists dependencies first.

use crate::{Error, Result, TaskNodeData};
use petgraph::Direction;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::IntoNodeReferences;
use std::collections::HashMap;
use tracing::debug;

/// A vertex: task id plus caller data.
#[derive(Debug, Clone)]
pub struct GraphNode<T> {
    /// Task identifier.
    pub name: String,
    /// The task data.
    pub task: T,
}

/// Task dependency graph over any [`TaskNodeData`].
pub struct TaskGraph<T: TaskNodeData> {
    graph: DiGraph<GraphNode<T>, ()>,
    index: HashMap<String, NodeIndex>,
}

impl<T: TaskNodeData> TaskGraph<T> {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        }
    }

    /// Add a vertex for `name`.
    ///
    /// Adding a name twice keeps the first vertex and its data and returns
    /// its index.
    ///
    /// # Errors
    ///
    /// Infallible today; kept fallible so callers building graphs from
    /// configuration can use `?` uniformly.
    pub fn add_task(&mut self, name: &str, task: T) -> Result<NodeIndex> {
        if let Some(&idx) = self.index.get(name) {
            return Ok(idx);
        }
        let idx = self.graph.add_node(GraphNode {
            name: name.to_string(),
            task,
        });
        self.index.insert(name.to_string(), idx);
        debug!(task = name, "Added task node");
        Ok(idx)
    }

    /// The vertex named `name`.
    #[must_use]
    pub fn get_node_by_name(&self, name: &str) -> Option<&GraphNode<T>> {
        self.index.get(name).map(|&idx| &self.graph[idx])
    }

    /// Index of the vertex named `name`.
    #[must_use]
    pub fn get_node_index(&self, name: &str) -> Option<NodeIndex> {
        self.index.get(name).copied()
    }

    /// Turn every vertex's declared dependency names into edges.
    ///
    /// # Errors
    ///
    /// [`Error::MissingDependencies`] with every name that is not a vertex.
    /// The graph is left unchanged in that case.
    pub fn add_dependency_edges(&mut self) -> Result<()> {
        let mut missing = Vec::new();
        let mut edges = Vec::new();

        for (idx, node) in self.graph.node_references() {
            for dep in node.task.dependency_names() {
                match self.index.get(dep) {
                    Some(&dep_idx) => edges.push((dep_idx, idx)),
                    None => missing.push((node.name.clone(), dep.to_string())),
                }
            }
        }
        if !missing.is_empty() {
            return Err(Error::MissingDependencies { missing });
        }

        for (from, to) in edges {
            self.graph.update_edge(from, to, ());
        }
        debug!(edges = self.graph.edge_count(), "Linked task dependencies");
        Ok(())
    }

    /// Record that `to` depends on `from`. Repeated edges are kept once.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex) {
        self.graph.update_edge(from, to, ());
    }

    /// Whether any tasks depend on each other in a loop.
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        self.find_cycle().is_some()
    }

    /// Sorted ids of the tasks on some cycle, if there is one.
    ///
    /// A task depending on itself is a cycle of one.
    pub(crate) fn find_cycle(&self) -> Option<Vec<String>> {
        tarjan_scc(&self.graph).into_iter().find_map(|component| {
            let looped = component.len() > 1
                || self
                    .graph
                    .contains_edge(component[0], component[0]);
            looped.then(|| {
                let mut tasks: Vec<String> = component
                    .iter()
                    .map(|&idx| self.graph[idx].name.clone())
                    .collect();
                tasks.sort();
                tasks
            })
        })
    }

    fn sorted_indices(&self) -> Result<Vec<NodeIndex>> {
        toposort(&self.graph, None).map_err(|_| Error::CycleDetected {
            tasks: self.find_cycle().unwrap_or_default(),
        })
    }

    /// Every vertex, dependencies before dependents.
    ///
    /// # Errors
    ///
    /// [`Error::CycleDetected`] naming the tasks on a cycle.
    pub fn topological_sort(&self) -> Result<Vec<GraphNode<T>>> {
        Ok(self
            .sorted_indices()?
            .into_iter()
            .map(|idx| self.graph[idx].clone())
            .collect())
    }

    /// Vertices grouped into dependency levels.
    ///
    /// A vertex without dependencies is on level 0; any other vertex sits one
    /// level above its deepest dependency. Vertices of one level never depend
    /// on each other, so a level can be processed in parallel once all
    /// earlier levels are done. Each level is sorted by name.
    ///
    /// # Errors
    ///
    /// [`Error::CycleDetected`] naming the tasks on a cycle.
    pub fn get_parallel_groups(&self) -> Result<Vec<Vec<GraphNode<T>>>> {
        let mut depth: HashMap<NodeIndex, usize> = HashMap::with_capacity(self.task_count());
        let mut groups: Vec<Vec<GraphNode<T>>> = Vec::new();

        for idx in self.sorted_indices()? {
            let level = self
                .graph
                .neighbors_directed(idx, Direction::Incoming)
                .map(|dep| depth[&dep] + 1)
                .max()
                .unwrap_or(0);
            depth.insert(idx, level);
            if groups.len() <= level {
                groups.resize_with(level + 1, Vec::new);
            }
            groups[level].push(self.graph[idx].clone());
        }

        for group in &mut groups {
            group.sort_by(|a, b| a.name.cmp(&b.name));
        }
        Ok(groups)
    }

    /// Ids of the tasks `name` directly depends on, sorted.
    ///
    /// Empty for an unknown task.
    #[must_use]
    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        let Some(&idx) = self.index.get(name) else {
            return Vec::new();
        };
        let mut deps: Vec<&str> = self
            .graph
            .neighbors_directed(idx, Direction::Incoming)
            .map(|dep| self.graph[dep].name.as_str())
            .collect();
        deps.sort_unstable();
        deps.dedup();
        deps
    }

    /// Every task id, sorted.
    #[must_use]
    pub fn task_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.index.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of vertices.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether `name` is a vertex.
    #[must_use]
    pub fn contains_task(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }
}

impl<T: TaskNodeData> Default for TaskGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}
