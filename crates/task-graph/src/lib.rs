//! Task identifiers and the task dependency DAG for taskhash.
//!
//! Vertices are package-task identifiers (`pkg#task`) plus the synthetic
//! root vertex. An edge runs from a dependency to the task that depends on it,
//! so a topological order lists dependencies first.
//!
//! # Key Types
//!
//! - [`TaskGraph`]: The graph structure for building and querying task dependencies
//! - [`TaskNodeData`]: Trait that task types must implement to be stored in the graph
//! - [`TaskNode`]: A ready-made node type holding a list of dependency ids
//!
//! # Example
//!
//! ```
//! use taskhash_task_graph::{TaskGraph, TaskNode};
//!
//! let mut graph = TaskGraph::new();
//! graph.add_task("pkg-a#build", TaskNode::default())?;
//! graph.add_task("pkg-b#build", TaskNode::new(["pkg-a#build"]))?;
//! graph.add_dependency_edges()?;
//!
//! let levels = graph.get_parallel_groups()?;
//! assert_eq!(levels.len(), 2);
//! # Ok::<(), taskhash_task_graph::Error>(())
//! ```

mod error;
mod graph;
pub mod task_id;
mod validation;

pub use error::{Error, Result};
pub use graph::{GraphNode, TaskGraph};
pub use task_id::{ROOT_NODE_NAME, TASK_DELIMITER, package_task_from_id, task_id};
pub use validation::ValidationResult;

/// Trait for task data that can be stored in the task graph.
///
/// [`TaskGraph::add_dependency_edges`] turns the names returned here into
/// edges.
pub trait TaskNodeData: Clone {
    /// Returns the identifiers of tasks this task depends on.
    fn dependency_names(&self) -> impl Iterator<Item = &str>;
}

/// Graph node data listing the ids of the tasks it depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskNode {
    /// Task ids this task depends on.
    pub dependencies: Vec<String>,
}

impl TaskNode {
    /// Create a node depending on `dependencies`.
    pub fn new<I, S>(dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dependencies: dependencies.into_iter().map(Into::into).collect(),
        }
    }
}

impl TaskNodeData for TaskNode {
    fn dependency_names(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().map(String::as_str)
    }
}
