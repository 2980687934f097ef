//! Package metadata consumed by the hashing stages.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// One workspace package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    /// Package name as used in task identifiers.
    pub name: String,
    /// Package directory relative to the repository root.
    pub dir: PathBuf,
    /// Digest of the package's resolved third-party dependencies.
    pub external_deps_hash: String,
}

impl PackageInfo {
    /// Create package metadata.
    pub fn new(
        name: impl Into<String>,
        dir: impl Into<PathBuf>,
        external_deps_hash: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            external_deps_hash: external_deps_hash.into(),
        }
    }
}

/// Packages by name.
#[derive(Debug, Clone, Default)]
pub struct PackageRegistry {
    packages: BTreeMap<String, PackageInfo>,
}

impl PackageRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `package`, replacing any package with the same name.
    pub fn insert(&mut self, package: PackageInfo) {
        self.packages.insert(package.name.clone(), package);
    }

    /// Look up a package by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PackageInfo> {
        self.packages.get(name)
    }

    /// Number of registered packages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether no packages are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Packages in name order.
    pub fn iter(&self) -> impl Iterator<Item = &PackageInfo> {
        self.packages.values()
    }
}

impl FromIterator<PackageInfo> for PackageRegistry {
    fn from_iter<I: IntoIterator<Item = PackageInfo>>(iter: I) -> Self {
        let mut registry = Self::new();
        for package in iter {
            registry.insert(package);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_registration_replaces_earlier() {
        let registry: PackageRegistry = [
            PackageInfo::new("web", "apps/web", "d1"),
            PackageInfo::new("api", "apps/api", "d2"),
            PackageInfo::new("web", "apps/web2", "d3"),
        ]
        .into_iter()
        .collect();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("web").unwrap().external_deps_hash, "d3");
        let names: Vec<_> = registry.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["api", "web"]);
    }
}
