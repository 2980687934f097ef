//! Drive both hashing stages over a whole task graph.

use crate::{Error, HashingConfig, Result, Tracker};
use rayon::prelude::*;
use std::collections::BTreeMap;
use taskhash_task_graph::{TaskGraph, TaskNodeData};

/// Hash every task in `graph`.
///
/// Runs the file-hash stage over all vertices, then hashes the graph level by
/// level: a level starts only once every task of the earlier levels has been
/// hashed, and tasks within a level are hashed in parallel. The root vertex
/// and root package tasks are skipped. Returns every recorded task hash by
/// task id.
pub fn hash_task_graph<T>(
    tracker: &Tracker,
    graph: &TaskGraph<T>,
    config: &HashingConfig,
    args: &[String],
) -> Result<BTreeMap<String, String>>
where
    T: TaskNodeData + Send + Sync,
{
    let _span = tracing::info_span!("hash_task_graph", tasks = graph.task_count()).entered();

    let vertices = graph.task_names();
    tracker.calculate_file_hashes(&vertices, config.worker_count, &config.repo_root)?;

    let levels = graph.get_parallel_groups()?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_count.max(1))
        .thread_name(|i| format!("taskhash-tasks-{i}"))
        .build()
        .map_err(|e| Error::WorkerPool {
            message: e.to_string(),
        })?;

    for (depth, level) in levels.iter().enumerate() {
        tracing::trace!(depth, tasks = level.len(), "Hashing level");
        pool.install(|| {
            level
                .par_iter()
                .filter(|node| !tracker.is_root_task(&node.name))
                .try_for_each(|node| -> Result<()> {
                    let task = tracker.package_task(&node.name)?;
                    let dependencies = graph.dependencies_of(&node.name);
                    tracker.calculate_task_hash(&task, &dependencies, args)?;
                    Ok(())
                })
        })?;
    }

    Ok(tracker.task_hashes())
}
