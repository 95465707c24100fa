use super::*;
use crate::checksum::DigestAlgorithm;

fn live(key: &str, last_modified: f64) -> InventoryEntry {
    InventoryEntry {
        key: key.to_string(),
        size: 10,
        last_modified,
    }
}

fn prior(entries: &[(&str, f64)]) -> HashMap<String, ObjectRecord> {
    index_records(
        entries
            .iter()
            .map(|(k, t)| ObjectRecord {
                key: k.to_string(),
                size: 10,
                last_modified: *t,
                checksum: Some("abc".to_string()),
                algorithm: Some(DigestAlgorithm::Md5),
                verified_at: None,
            })
            .collect(),
    )
}

fn keys(plan: &Plan) -> Vec<&str> {
    plan.tasks.iter().map(|t| t.key.as_str()).collect()
}

#[test]
fn unchanged_key_skipped_new_key_selected() {
    let prior = prior(&[("a/1.txt", 100.0)]);
    let policy = WatchPolicy::all().with_prefixes(["a/"]);
    let p = plan(
        vec![live("a/1.txt", 100.0), live("a/2.txt", 200.0)],
        &prior,
        &policy,
    );
    assert_eq!(keys(&p), vec!["a/2.txt"]);
    assert_eq!(p.summary.new, 1);
    assert_eq!(p.summary.unchanged, 1);
    assert_eq!(p.summary.selected(), 1);
}

#[test]
fn new_keys_selected_regardless_of_policy() {
    let nothing_tracked = |_: &str| false;
    let p = plan(
        vec![live("x/untracked.bin", 1.0), live("dir/", 1.0)],
        &HashMap::new(),
        &nothing_tracked,
    );
    assert_eq!(keys(&p), vec!["x/untracked.bin", "dir/"]);
}

#[test]
fn staleness_gate_is_strict() {
    let prior = prior(&[("a", 100.0), ("b", 100.0), ("c", 100.0)]);
    let p = plan(
        vec![live("a", 99.0), live("b", 100.0), live("c", 100.001)],
        &prior,
        &WatchPolicy::all(),
    );
    assert_eq!(keys(&p), vec!["c"]);
    assert_eq!(p.summary.stale, 1);
    assert_eq!(p.summary.unchanged, 2);
}

#[test]
fn excluded_keys_never_selected_even_when_newer() {
    let prior = prior(&[("other/x", 1.0), ("a/", 1.0)]);
    let policy = WatchPolicy::all().with_prefixes(["a/"]);
    let p = plan(
        vec![live("other/x", 500.0), live("a/", 500.0)],
        &prior,
        &policy,
    );
    assert!(p.tasks.is_empty());
    assert_eq!(p.summary.excluded, 2);
}

#[test]
fn deleted_keys_are_not_flagged() {
    let prior = prior(&[("gone", 1.0)]);
    let p = plan(Vec::new(), &prior, &WatchPolicy::all());
    assert!(p.tasks.is_empty());
    assert_eq!(p.summary, PlanSummary::default());
}

#[test]
fn record_without_checksum_is_reverified() {
    let mut prior = prior(&[("a", 100.0)]);
    prior.get_mut("a").unwrap().checksum = None;
    let p = plan(vec![live("a", 100.0)], &prior, &WatchPolicy::all());
    assert_eq!(keys(&p), vec!["a"]);
}

#[test]
fn duplicate_listing_entries_yield_one_task() {
    let p = plan(
        vec![live("dup", 1.0), live("dup", 2.0)],
        &HashMap::new(),
        &WatchPolicy::all(),
    );
    assert_eq!(p.tasks.len(), 1);
    assert_eq!(p.tasks[0].last_modified, 1.0);
    assert_eq!(p.summary.duplicates, 1);
}

#[test]
fn replanning_after_commit_selects_nothing() {
    let inventory = vec![live("a/1", 10.0), live("a/2", 20.0)];
    let first = plan(inventory.clone(), &HashMap::new(), &WatchPolicy::all());
    assert_eq!(first.tasks.len(), 2);

    // Simulate the commits a successful run would make.
    let committed: Vec<ObjectRecord> = first
        .tasks
        .iter()
        .map(|t| ObjectRecord {
            key: t.key.clone(),
            size: t.size,
            last_modified: t.last_modified,
            checksum: Some("00".to_string()),
            algorithm: Some(DigestAlgorithm::Md5),
            verified_at: None,
        })
        .collect();
    let second = plan(inventory, &index_records(committed), &WatchPolicy::all());
    assert!(second.tasks.is_empty());
}
