//! Package-input hashes and package-task hashes for one run.
//!
//! File hashes for every package/input combination in the graph are computed
//! first, in one pass. Task hashes follow, one per task, in dependency order.
//! Task hashing is safe to call from several threads as long as that order
//! is respected.

use crate::file_spec::PackageFileSpec;
use crate::package::PackageRegistry;
use crate::package_task::PackageTask;
use crate::pipeline::Pipeline;
use crate::{Error, HashingConfig, Result};
use parking_lot::RwLock;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use taskhash_task_graph::{package_task_from_id, task_id::is_root_task};
use taskhash_vcs::{PackageFileHasher, hash_object};

#[derive(Debug, Default)]
struct HashState {
    /// Normalized file spec key -> digest.
    package_inputs_hashes: HashMap<String, String>,
    /// Task id -> digest.
    package_task_hashes: HashMap<String, String>,
}

/// The record folded into a task's digest.
#[derive(Serialize)]
struct TaskHashInputs<'a> {
    hash_of_files: &'a str,
    external_deps_hash: &'a str,
    task: &'a str,
    outputs: Vec<String>,
    pass_thru_args: &'a [String],
    hashable_env_pairs: Vec<String>,
    global_hash: &'a str,
    task_dependency_hashes: Vec<String>,
}

/// `NAME=value` for a declared variable; an unset variable hashes as empty.
///
/// A value that is not valid UTF-8 is written as `NAME\0<hex bytes>`.
/// Environment values cannot contain NUL, so this never equals the pair of
/// any UTF-8 value.
fn hashable_env_pair(name: &str) -> String {
    match std::env::var_os(name) {
        None => format!("{name}="),
        Some(value) => match value.to_str() {
            Some(value) => format!("{name}={value}"),
            None => format!("{name}\0{}", hex::encode(value.as_encoded_bytes())),
        },
    }
}

/// Owner of all hashing state for a run.
pub struct Tracker {
    root_node: String,
    global_hash: String,
    pipeline: Pipeline,
    packages: PackageRegistry,
    file_hasher: PackageFileHasher,
    state: RwLock<HashState>,
}

impl Tracker {
    /// Create a tracker that hashes package files git-first.
    pub fn new(
        root_node: impl Into<String>,
        global_hash: impl Into<String>,
        pipeline: Pipeline,
        packages: PackageRegistry,
    ) -> Self {
        Self {
            root_node: root_node.into(),
            global_hash: global_hash.into(),
            pipeline,
            packages,
            file_hasher: PackageFileHasher::new(),
            state: RwLock::new(HashState::default()),
        }
    }

    /// Create a tracker using the root node and file hasher chosen by `config`.
    pub fn from_config(
        config: &HashingConfig,
        global_hash: impl Into<String>,
        pipeline: Pipeline,
        packages: PackageRegistry,
    ) -> Self {
        Self::new(config.root_node.clone(), global_hash, pipeline, packages)
            .with_file_hasher(config.file_hasher())
    }

    /// Replace the package file hasher.
    #[must_use]
    pub fn with_file_hasher(mut self, file_hasher: PackageFileHasher) -> Self {
        self.file_hasher = file_hasher;
        self
    }

    /// Name of the synthetic root vertex.
    #[must_use]
    pub fn root_node(&self) -> &str {
        &self.root_node
    }

    /// Repository-wide digest folded into every task hash.
    #[must_use]
    pub fn global_hash(&self) -> &str {
        &self.global_hash
    }

    /// Whether `task_id` is the root vertex or one of the root package's tasks.
    #[must_use]
    pub fn is_root_task(&self, task_id: &str) -> bool {
        is_root_task(task_id, &self.root_node)
    }

    /// Resolve `task_id` against the pipeline and the package registry.
    pub fn package_task(&self, task_id: &str) -> Result<PackageTask> {
        let (package, task) =
            package_task_from_id(task_id).ok_or_else(|| Error::invalid_task_id(task_id))?;
        let definition = self
            .pipeline
            .get_task_definition(task_id)
            .ok_or_else(|| Error::missing_task_definition(task_id))?;
        let info = self
            .packages
            .get(package)
            .ok_or_else(|| Error::missing_package(package))?;

        Ok(PackageTask {
            task_id: task_id.to_string(),
            task: task.to_string(),
            definition: definition.clone(),
            package: info.clone(),
        })
    }

    /// Hash every distinct package/input combination referenced by `vertices`.
    ///
    /// Must complete before any call to [`Tracker::calculate_task_hash`]. On
    /// success the previous file hashes are replaced as a whole; on failure
    /// they are left untouched and the first error is returned.
    pub fn calculate_file_hashes<S: AsRef<str>>(
        &self,
        vertices: &[S],
        worker_count: usize,
        repo_root: &Path,
    ) -> Result<()> {
        let _span = tracing::info_span!(
            "file_hash_stage",
            vertices = vertices.len(),
            workers = worker_count
        )
        .entered();

        let mut specs = BTreeSet::new();
        for vertex in vertices {
            let task_id = vertex.as_ref();
            if self.is_root_task(task_id) {
                continue;
            }
            let (package, _) =
                package_task_from_id(task_id).ok_or_else(|| Error::invalid_task_id(task_id))?;
            let definition = self
                .pipeline
                .get_task_definition(task_id)
                .ok_or_else(|| Error::missing_task_definition(task_id))?;
            specs.insert(PackageFileSpec::new(package, &definition.inputs));
        }
        let specs: Vec<PackageFileSpec> = specs.into_iter().collect();
        tracing::debug!(distinct_specs = specs.len(), "Collected package file specs");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_count.max(1))
            .thread_name(|i| format!("taskhash-files-{i}"))
            .build()
            .map_err(|e| Error::WorkerPool {
                message: e.to_string(),
            })?;

        let hashes: HashMap<String, String> = pool.install(|| {
            specs
                .par_iter()
                .map(|spec| -> Result<(String, String)> {
                    let package = self
                        .packages
                        .get(spec.package())
                        .ok_or_else(|| Error::missing_package(spec.package()))?;
                    let digest =
                        self.file_hasher
                            .hash_package(repo_root, &package.dir, spec.inputs())?;
                    Ok((spec.to_key(), digest))
                })
                .collect::<Result<_>>()
        })?;

        tracing::debug!(hashes = hashes.len(), "File hash stage complete");
        self.state.write().package_inputs_hashes = hashes;
        Ok(())
    }

    /// Sorted, deduplicated digests of the tasks in `dependency_set`.
    fn dependency_hashes<S: AsRef<str>>(
        &self,
        task_id: &str,
        dependency_set: &[S],
    ) -> Result<Vec<String>> {
        let state = self.state.read();
        let mut hashes = BTreeSet::new();
        for dependency in dependency_set {
            let dependency = dependency.as_ref();
            if self.is_root_task(dependency) {
                continue;
            }
            let hash = state.package_task_hashes.get(dependency).ok_or_else(|| {
                Error::MissingDependencyHash {
                    task_id: task_id.to_string(),
                    dependency: dependency.to_string(),
                }
            })?;
            hashes.insert(hash.clone());
        }
        Ok(hashes.into_iter().collect())
    }

    /// Compute and record the hash of `task`.
    ///
    /// Every task in `dependency_set` other than root tasks must already have
    /// been hashed. `args` are folded in as given.
    pub fn calculate_task_hash<S: AsRef<str>>(
        &self,
        task: &PackageTask,
        dependency_set: &[S],
        args: &[String],
    ) -> Result<String> {
        let _span = tracing::debug_span!("task_hash", task = %task.task_id).entered();

        let key = task.file_hash_key();
        let hash_of_files = self
            .state
            .read()
            .package_inputs_hashes
            .get(&key)
            .cloned()
            .ok_or(Error::MissingFileHash { key })?;

        let mut hashable_env_pairs: Vec<String> = task
            .definition
            .env_var_dependencies
            .iter()
            .map(|name| hashable_env_pair(name))
            .collect();
        hashable_env_pairs.sort();

        let task_dependency_hashes = self.dependency_hashes(&task.task_id, dependency_set)?;

        let hash = hash_object(&TaskHashInputs {
            hash_of_files: &hash_of_files,
            external_deps_hash: &task.package.external_deps_hash,
            task: &task.task,
            outputs: task.hashable_outputs(),
            pass_thru_args: args,
            hashable_env_pairs,
            global_hash: &self.global_hash,
            task_dependency_hashes,
        })?;

        match self
            .state
            .write()
            .package_task_hashes
            .entry(task.task_id.clone())
        {
            Entry::Occupied(_) => {
                return Err(Error::TaskHashAlreadyComputed {
                    task_id: task.task_id.clone(),
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(hash.clone());
            }
        }

        tracing::debug!(hash = %hash, "Computed task hash");
        Ok(hash)
    }

    /// File hash recorded under a normalized file spec key.
    #[must_use]
    pub fn file_hash(&self, key: &str) -> Option<String> {
        self.state.read().package_inputs_hashes.get(key).cloned()
    }

    /// Number of recorded file hashes.
    #[must_use]
    pub fn file_hash_count(&self) -> usize {
        self.state.read().package_inputs_hashes.len()
    }

    /// Hash recorded for `task_id`.
    #[must_use]
    pub fn task_hash(&self, task_id: &str) -> Option<String> {
        self.state.read().package_task_hashes.get(task_id).cloned()
    }

    /// All recorded task hashes, by task id.
    #[must_use]
    pub fn task_hashes(&self) -> BTreeMap<String, String> {
        self.state
            .read()
            .package_task_hashes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("Tracker")
            .field("root_node", &self.root_node)
            .field("global_hash", &self.global_hash)
            .field("packages", &self.packages.len())
            .field("file_hasher", &self.file_hasher)
            .field("file_hashes", &state.package_inputs_hashes.len())
            .field("task_hashes", &state.package_task_hashes.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::PackageInfo;
    use crate::pipeline::TaskDefinition;
    use taskhash_task_graph::ROOT_NODE_NAME;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, Tracker) {
        let tmp = TempDir::new().unwrap();
        for pkg in ["a", "b"] {
            let dir = tmp.path().join("packages").join(pkg);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("index.js"), format!("// {pkg}")).unwrap();
        }

        let pipeline = Pipeline::new().with_task(
            "build",
            TaskDefinition {
                outputs: vec!["dist/**".into()],
                ..TaskDefinition::default()
            },
        );
        let packages: PackageRegistry = [
            PackageInfo::new("a", "packages/a", "deps-a"),
            PackageInfo::new("b", "packages/b", "deps-b"),
        ]
        .into_iter()
        .collect();

        let tracker = Tracker::new(ROOT_NODE_NAME, "g1", pipeline, packages)
            .with_file_hasher(PackageFileHasher::manual());
        (tmp, tracker)
    }

    #[test]
    fn root_tasks_are_skipped_by_file_stage() {
        let (tmp, tracker) = fixture();
        tracker
            .calculate_file_hashes(
                &[ROOT_NODE_NAME, "___ROOT___#build", "a#build"],
                2,
                tmp.path(),
            )
            .unwrap();

        assert_eq!(tracker.file_hash_count(), 1);
        assert!(tracker.file_hash("a#").is_some());
    }

    #[test]
    fn missing_definition_fails_the_stage() {
        let (tmp, tracker) = fixture();
        let err = tracker
            .calculate_file_hashes(&["a#build", "a#deploy"], 2, tmp.path())
            .unwrap_err();
        assert!(matches!(err, Error::MissingTaskDefinition { ref task_id } if task_id == "a#deploy"));
    }

    #[test]
    fn missing_package_fails_the_stage() {
        let (tmp, tracker) = fixture();
        tracker
            .calculate_file_hashes(&["a#build"], 1, tmp.path())
            .unwrap();

        let err = tracker
            .calculate_file_hashes(&["a#build", "ghost#build"], 1, tmp.path())
            .unwrap_err();
        assert!(matches!(err, Error::MissingPackage { ref package } if package == "ghost"));
        // The previous successful stage is still in place.
        assert!(tracker.file_hash("a#").is_some());
    }

    #[test]
    fn zero_workers_still_runs() {
        let (tmp, tracker) = fixture();
        tracker
            .calculate_file_hashes(&["a#build", "b#build"], 0, tmp.path())
            .unwrap();
        assert_eq!(tracker.file_hash_count(), 2);
    }

    #[test]
    fn task_hash_requires_file_hash() {
        let (_tmp, tracker) = fixture();
        let task = tracker.package_task("a#build").unwrap();
        let err = tracker
            .calculate_task_hash::<&str>(&task, &[], &[])
            .unwrap_err();
        assert!(matches!(err, Error::MissingFileHash { ref key } if key == "a#"));
    }

    #[test]
    fn task_hash_is_write_once() {
        let (tmp, tracker) = fixture();
        tracker
            .calculate_file_hashes(&["a#build"], 1, tmp.path())
            .unwrap();
        let task = tracker.package_task("a#build").unwrap();

        let hash = tracker
            .calculate_task_hash(&task, &[ROOT_NODE_NAME], &[])
            .unwrap();
        assert_eq!(tracker.task_hash("a#build"), Some(hash.clone()));

        let err = tracker
            .calculate_task_hash(&task, &[ROOT_NODE_NAME], &[])
            .unwrap_err();
        assert!(matches!(err, Error::TaskHashAlreadyComputed { .. }));
        assert_eq!(tracker.task_hash("a#build"), Some(hash));
    }

    #[test]
    fn dependency_must_be_hashed_first() {
        let (tmp, tracker) = fixture();
        tracker
            .calculate_file_hashes(&["a#build", "b#build"], 2, tmp.path())
            .unwrap();
        let b = tracker.package_task("b#build").unwrap();

        let err = tracker
            .calculate_task_hash(&b, &["a#build"], &[])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingDependencyHash { ref dependency, .. } if dependency == "a#build"
        ));
        assert!(tracker.task_hash("b#build").is_none());
    }

    #[test]
    fn package_task_resolution_errors() {
        let (_tmp, tracker) = fixture();
        assert!(matches!(
            tracker.package_task("build"),
            Err(Error::InvalidTaskId { .. })
        ));
        assert!(matches!(
            tracker.package_task("a#deploy"),
            Err(Error::MissingTaskDefinition { .. })
        ));
        assert!(matches!(
            tracker.package_task("ghost#build"),
            Err(Error::MissingPackage { .. })
        ));

        let task = tracker.package_task("b#build").unwrap();
        assert_eq!(task.task, "build");
        assert_eq!(task.package.external_deps_hash, "deps-b");
    }

    #[test]
    fn env_pairs_render_utf8_and_unset_values() {
        temp_env::with_var("TASKHASH_PAIR_TEST", Some("dev"), || {
            assert_eq!(hashable_env_pair("TASKHASH_PAIR_TEST"), "TASKHASH_PAIR_TEST=dev");
        });
        temp_env::with_var_unset("TASKHASH_PAIR_TEST", || {
            assert_eq!(hashable_env_pair("TASKHASH_PAIR_TEST"), "TASKHASH_PAIR_TEST=");
        });
    }

    #[cfg(unix)]
    #[test]
    fn env_pairs_keep_non_utf8_bytes() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let value = OsStr::from_bytes(b"\xff\x01");
        temp_env::with_var("TASKHASH_PAIR_TEST", Some(value), || {
            assert_eq!(hashable_env_pair("TASKHASH_PAIR_TEST"), "TASKHASH_PAIR_TEST\0ff01");
        });
    }
}
