//! A task resolved against the pipeline and the package registry.

use crate::file_spec::PackageFileSpec;
use crate::package::PackageInfo;
use crate::pipeline::TaskDefinition;

/// Directory, relative to the package, that task logs are written to.
pub const LOG_DIR: &str = ".turbo";

/// Everything the task hasher needs to know about one graph vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageTask {
    /// Full identifier, `pkg#task`.
    pub task_id: String,
    /// Task name without the package.
    pub task: String,
    /// The task's pipeline definition.
    pub definition: TaskDefinition,
    /// The owning package.
    pub package: PackageInfo,
}

impl PackageTask {
    /// The package/input combination whose file hash this task uses.
    #[must_use]
    pub fn file_spec(&self) -> PackageFileSpec {
        PackageFileSpec::new(self.package.name.clone(), &self.definition.inputs)
    }

    /// Key of this task's entry in the package file hashes.
    #[must_use]
    pub fn file_hash_key(&self) -> String {
        self.file_spec().to_key()
    }

    /// Path of the task's log file, relative to the package.
    #[must_use]
    pub fn log_file(&self) -> String {
        format!("{LOG_DIR}/turbo-{}.log", self.task)
    }

    /// Declared outputs plus the log file, sorted.
    #[must_use]
    pub fn hashable_outputs(&self) -> Vec<String> {
        let mut outputs = self.definition.outputs.clone();
        outputs.push(self.log_file());
        outputs.sort();
        outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_task(outputs: &[&str], inputs: &[&str]) -> PackageTask {
        PackageTask {
            task_id: "web#build".into(),
            task: "build".into(),
            definition: TaskDefinition {
                outputs: outputs.iter().map(|s| (*s).to_string()).collect(),
                inputs: inputs.iter().map(|s| (*s).to_string()).collect(),
                ..TaskDefinition::default()
            },
            package: PackageInfo::new("web", "apps/web", "deps"),
        }
    }

    #[test]
    fn outputs_include_sorted_log_file() {
        let task = build_task(&["lib/**", "dist/**"], &[]);
        assert_eq!(
            task.hashable_outputs(),
            vec![".turbo/turbo-build.log", "dist/**", "lib/**"]
        );
    }

    #[test]
    fn file_hash_key_uses_package_and_sorted_inputs() {
        let task = build_task(&[], &["src/**", "package.json"]);
        assert_eq!(task.file_hash_key(), "web#package.json!src/**");
    }
}
