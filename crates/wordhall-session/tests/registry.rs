//! Concurrency tests for the session registry.
//!
//! Runs on a multi-thread runtime so joins, teardowns, and roster reads
//! really interleave.

use std::collections::HashSet;

use wordhall_protocol::SessionId;
use wordhall_session::{SessionHandle, SessionRegistry, SharedRegistry};

const CHURN: u64 = 200;
const READS: usize = 500;

async fn join(registry: &SharedRegistry, id: u64, name: &str) -> SessionHandle {
    let (handle, _rx) = SessionHandle::new(SessionId(id));
    let mut registry = registry.lock().await;
    registry.insert(handle.clone()).expect("fresh id");
    registry.rename(SessionId(id), name).expect("registered");
    handle
}

/// Takes one snapshot and checks it against the registry under the same
/// lock.
async fn check_snapshot(registry: &SharedRegistry) {
    let registry = registry.lock().await;
    let roster = registry.roster_snapshot();

    let mut seen = HashSet::new();
    for name in &roster {
        assert!(seen.insert(name.clone()), "{name} listed twice in {roster:?}");
    }
    assert_eq!(roster.iter().filter(|n| *n == "Alice").count(), 1);

    for handle in registry.handles() {
        if handle.is_closed() {
            let name = registry.name_of(handle.id()).expect("still registered");
            assert!(
                !roster.iter().any(|n| n == name),
                "{name} is tearing down but listed in {roster:?}"
            );
        }
    }
}

// =========================================================================
// roster_snapshot() under concurrent join / leave
// =========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_roster_snapshot_concurrent_join_leave_consistent() {
    let registry = SessionRegistry::shared("N00B");
    let _alice = join(&registry, 1, "Alice").await;

    let churn = {
        let registry = registry.clone();
        tokio::spawn(async move {
            for n in 0..CHURN {
                let id = n + 2;
                let handle = join(&registry, id, &format!("P{n:04}")).await;
                tokio::task::yield_now().await;
                // Teardown starts before the registry entry goes away.
                assert!(handle.begin_close());
                tokio::task::yield_now().await;
                registry.lock().await.remove(SessionId(id));
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = registry.clone();
            tokio::spawn(async move {
                for _ in 0..READS {
                    check_snapshot(&registry).await;
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    churn.await.expect("churn task should not panic");
    for reader in readers {
        reader.await.expect("reader should not panic");
    }

    assert_eq!(registry.lock().await.roster_snapshot(), vec!["Alice"]);
}
