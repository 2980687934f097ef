//! Property-based tests for cache key stability.
//!
//! - File spec keys ignore the order input patterns were declared in
//! - Task hashes ignore the order and multiplicity of dependency ids
//! - Pass-through arguments are hashed in order

use proptest::prelude::*;
use std::path::Path;
use taskhash_core::{PackageFileSpec, PackageInfo, Pipeline, TaskDefinition, Tracker};
use taskhash_task_graph::ROOT_NODE_NAME;
use taskhash_vcs::PackageFileHasher;
use tempfile::TempDir;

fn pattern_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("src/**/*.rs".to_string()),
        Just("package.json".to_string()),
        "[a-z]{1,6}(/\\*\\*)?/\\*\\.[a-z]{1,3}".prop_map(String::from),
    ]
}

/// A tracker over packages `p0`..`p{count}`, each with one source file.
/// `p{count}#build` depends on all others.
fn fan_in_tracker(repo: &Path, count: usize) -> Tracker {
    let mut packages = Vec::with_capacity(count + 1);
    for i in 0..=count {
        let dir = repo.join(format!("p{i}"));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.js"), format!("module.exports = {i};")).unwrap();
        packages.push(PackageInfo::new(format!("p{i}"), format!("p{i}"), ""));
    }
    let tracker = Tracker::new(
        ROOT_NODE_NAME,
        "global",
        Pipeline::new().with_task("build", TaskDefinition::default()),
        packages.into_iter().collect(),
    )
    .with_file_hasher(PackageFileHasher::manual());

    let ids: Vec<String> = (0..=count).map(|i| format!("p{i}#build")).collect();
    tracker.calculate_file_hashes(&ids, 2, repo).unwrap();
    for id in &ids[..count] {
        let task = tracker.package_task(id).unwrap();
        tracker.calculate_task_hash(&task, &[ROOT_NODE_NAME], &[]).unwrap();
    }
    tracker
}

fn hash_sink(tracker: &Tracker, count: usize, deps: &[String], args: &[String]) -> String {
    let task = tracker.package_task(&format!("p{count}#build")).unwrap();
    tracker.calculate_task_hash(&task, deps, args).unwrap()
}

proptest! {
    #[test]
    fn spec_key_ignores_pattern_order(
        patterns in proptest::collection::vec(pattern_strategy(), 0..6),
    ) {
        let mut reversed = patterns.clone();
        reversed.reverse();

        let a = PackageFileSpec::new("pkg", &patterns);
        let b = PackageFileSpec::new("pkg", &reversed);
        prop_assert_eq!(a.to_key(), b.to_key());
        prop_assert!(a.to_key().starts_with("pkg#"));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn dependency_order_and_duplicates_are_ignored(
        count in 1usize..5,
        picks in proptest::collection::vec(any::<prop::sample::Index>(), 1..10),
        shuffle_seed in any::<u64>(),
    ) {
        let repo = TempDir::new().unwrap();
        let all: Vec<String> = (0..count).map(|i| format!("p{i}#build")).collect();

        let mut noisy: Vec<String> = picks.iter().map(|ix| ix.get(&all).clone()).collect();
        noisy.extend(all.iter().cloned());
        noisy.push(ROOT_NODE_NAME.to_string());
        let rotation = usize::try_from(shuffle_seed % noisy.len() as u64).unwrap();
        noisy.rotate_left(rotation);

        let clean = hash_sink(&fan_in_tracker(repo.path(), count), count, &all, &[]);
        let shuffled = hash_sink(&fan_in_tracker(repo.path(), count), count, &noisy, &[]);
        prop_assert_eq!(clean, shuffled);
    }

    #[test]
    fn argument_order_is_significant(
        a in "[a-z-]{1,8}",
        b in "[a-z-]{1,8}",
    ) {
        prop_assume!(a != b);
        let repo = TempDir::new().unwrap();
        let forward = [a.clone(), b.clone()];
        let backward = [b, a];

        let first = hash_sink(&fan_in_tracker(repo.path(), 1), 1, &[], &forward);
        let second = hash_sink(&fan_in_tracker(repo.path(), 1), 1, &[], &backward);
        prop_assert_ne!(first, second);
    }
}
