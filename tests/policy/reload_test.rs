/*!
 * Policy Hot Reload Tests
 *
 * Readers evaluate continuously while a writer swaps tables and attempts
 * rejected reloads.
 */

use approval_policy::{
    load_policy, AccessRequest, Evaluator, EvaluatorConfig, PolicyLoader, PolicyStore,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

const QUORUM_ONE: &str = "label: legal_approval\nusers: [legal1, legal2]\n";
const QUORUM_TWO: &str =
    "label: legal_approval\nusers: [legal1, legal2]\nnum_approvers_required: 2\n";

// First record is valid; the second is not, so nothing may be published
const HALF_VALID: &str = "label: secret\nusers: [sec1]\n---\nlabel: ops_approval\nusers: []\n";

const READERS: usize = 4;
const SWAPS: u64 = 200;

#[test]
fn test_concurrent_readers_see_whole_tables() {
    let store = PolicyStore::with_table(PolicyLoader::default(), load_policy(QUORUM_ONE).unwrap());
    let done = AtomicBool::new(false);
    let observed = AtomicUsize::new(0);
    let request = AccessRequest::new("alice", ["legal_approval"], ["legal1"]).unwrap();

    thread::scope(|s| {
        for _ in 0..READERS {
            s.spawn(|| {
                while !done.load(Ordering::Acquire) {
                    let snapshot = store.snapshot();
                    let table = snapshot.table();

                    // Even versions carry quorum 1, odd versions quorum 2
                    let expected = if snapshot.version() % 2 == 0 { 1 } else { 2 };
                    let rule = table.get("legal_approval").expect("rule present");
                    assert_eq!(rule.num_approvers_required(), expected);
                    assert!(table.get("secret").is_none());

                    let decision = Evaluator::new(Arc::clone(table)).evaluate(&request);
                    assert_eq!(decision.is_granted(), expected == 1);
                    observed.fetch_add(1, Ordering::Relaxed);
                }
            });
        }

        for i in 0..SWAPS {
            let next = if i % 2 == 0 { QUORUM_TWO } else { QUORUM_ONE };
            assert!(store.reload(next).is_ok());
            assert!(store.reload(HALF_VALID).is_err());
        }
        done.store(true, Ordering::Release);
    });

    assert_eq!(store.version(), SWAPS);
    assert!(observed.load(Ordering::Relaxed) > 0);
}

#[test]
fn test_in_flight_evaluator_keeps_old_table() {
    let store = PolicyStore::with_table(PolicyLoader::default(), load_policy(QUORUM_ONE).unwrap());
    let request = AccessRequest::new("alice", ["legal_approval"], ["legal1"]).unwrap();

    let pinned = store.evaluator(EvaluatorConfig::default());
    store.reload(QUORUM_TWO).unwrap();

    assert!(pinned.evaluate(&request).is_granted());
    assert!(store
        .evaluator(EvaluatorConfig::default())
        .evaluate(&request)
        .is_denied());
}

#[test]
fn test_rejected_reload_is_all_or_nothing() {
    let store = PolicyStore::with_table(PolicyLoader::default(), load_policy(QUORUM_ONE).unwrap());
    let before = store.snapshot();

    let err = store.reload(HALF_VALID).unwrap_err();
    assert!(err.contains_kind("empty_group"));

    let after = store.snapshot();
    assert_eq!(after.version(), before.version());
    assert!(Arc::ptr_eq(before.table(), after.table()));
    assert!(after.table().get("secret").is_none());
}

#[test]
fn test_reload_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("policy.yaml");
    std::fs::write(&path, QUORUM_TWO).unwrap();

    let store = PolicyStore::new(PolicyLoader::default());
    let snapshot = store.reload_file(&path).unwrap();
    assert_eq!(snapshot.version(), 1);
    assert_eq!(
        snapshot
            .table()
            .get("legal_approval")
            .map(|r| r.num_approvers_required()),
        Some(2)
    );

    assert!(store.reload_file(dir.path().join("missing.yaml")).is_err());
    assert_eq!(store.version(), 1);
}
