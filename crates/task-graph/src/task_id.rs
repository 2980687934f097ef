//! Package-task identifiers.
//!
//! A task is identified as `<package>#<task>`. The synthetic root vertex
//! [`ROOT_NODE_NAME`] carries no delimiter.

/// Separator between the package name and the task name.
pub const TASK_DELIMITER: &str = "#";

/// Name of the synthetic vertex every task graph is rooted at.
pub const ROOT_NODE_NAME: &str = "___ROOT___";

/// Build the identifier of `task` in `package`.
#[must_use]
pub fn task_id(package: &str, task: &str) -> String {
    format!("{package}{TASK_DELIMITER}{task}")
}

/// Split a task identifier into `(package, task)` at the first delimiter.
///
/// Returns `None` when the identifier has no delimiter.
#[must_use]
pub fn package_task_from_id(id: &str) -> Option<(&str, &str)> {
    id.split_once(TASK_DELIMITER)
}

/// Whether `id` is the root vertex or a task of the root package.
#[must_use]
pub fn is_root_task(id: &str, root: &str) -> bool {
    id == root
        || id
            .strip_prefix(root)
            .is_some_and(|rest| rest.starts_with(TASK_DELIMITER))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_and_splits_ids() {
        let id = task_id("pkg-a", "build");
        assert_eq!(id, "pkg-a#build");
        assert_eq!(package_task_from_id(&id), Some(("pkg-a", "build")));
    }

    #[test]
    fn splits_on_first_delimiter() {
        assert_eq!(
            package_task_from_id("@scope/pkg#lint#fix"),
            Some(("@scope/pkg", "lint#fix"))
        );
    }

    #[test]
    fn bare_names_do_not_split() {
        assert_eq!(package_task_from_id("build"), None);
        assert_eq!(package_task_from_id(ROOT_NODE_NAME), None);
    }

    #[test]
    fn root_tasks() {
        assert!(is_root_task(ROOT_NODE_NAME, ROOT_NODE_NAME));
        assert!(is_root_task("___ROOT___#build", ROOT_NODE_NAME));
        assert!(!is_root_task("___ROOT___x#build", ROOT_NODE_NAME));
        assert!(!is_root_task("pkg-a#build", ROOT_NODE_NAME));
    }
}
