//! Concurrent execution E2E tests.
//!
//! With more than one thread, scenario leaves of a feature run at the same
//! time on a shared event bus. Each leaf must only see its own pickle's
//! events and get its own scenario scope.

use std::time::Duration;

use crate::helpers::engine::{FakeEngine, feature};
use crate::helpers::log::{EventLog, recording_observer};
use crate::helpers::orchestrator;

use scenic_core::config::{SystemProperties, THREADS_PROPERTY};
use scenic_core::event::LifecyclePhase;
use scenic_runner::LeafStatus;

fn parallel_suite(log: &EventLog) -> FakeEngine {
    FakeEngine::new(log)
        .step_delay(Duration::from_millis(5))
        .feature(feature(
            "features/inventory.feature",
            "Inventory",
            &[
                ("restock", 3, &[], &["given stock", "when restocking", "then stock rises"]),
                ("sell", 8, &[], &["given stock", "fail when selling", "then stock drops"]),
                ("audit", 13, &[], &["given stock", "when auditing", "then counts match"]),
                ("transfer", 18, &[], &["given stock", "when transferring", "then both match"]),
            ],
        ))
}

fn threads(n: usize) -> SystemProperties {
    let mut system = SystemProperties::new();
    system.set(THREADS_PROPERTY, n.to_string());
    system
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_e2e_concurrent_leaves_only_see_their_own_events() {
    // Given: Four scenarios, one failing, run with four threads
    let log = EventLog::new();
    let orchestrator = orchestrator(parallel_suite(&log), &log)
        .system_properties(threads(4))
        .observer(LifecyclePhase::Before, recording_observer(&log))
        .observer(LifecyclePhase::After, recording_observer(&log))
        .build()
        .unwrap();

    // When: Running the whole tree
    let report = orchestrator.run().await.unwrap();

    // Then: Only "sell" failed, and it reports its own step line
    assert_eq!(report.failed(), 1, "{report}");
    let LeafStatus::Failed { message } = &report.leaf("sell").unwrap().status else {
        panic!("sell should fail: {report}");
    };
    assert!(
        message.contains("features/inventory.feature at line 10"),
        "{message}"
    );

    // And: Every scenario was notified exactly once per phase
    for scenario in ["restock", "sell", "audit", "transfer"] {
        assert_eq!(log.with_prefix(&format!("before:{scenario}")).len(), 1);
        assert_eq!(log.with_prefix(&format!("after:{scenario}:")).len(), 1);
    }
    assert!(log.contains("after:sell:failed"));
    assert!(log.contains("after:audit:passed"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_e2e_concurrent_leaves_get_separate_scopes() {
    let log = EventLog::new();
    let orchestrator = orchestrator(parallel_suite(&log), &log)
        .system_properties(threads(4))
        .build()
        .unwrap();

    let report = orchestrator.run().await.unwrap();

    assert_eq!(report.leaves.len(), 9, "{report}");
    let mut torn_down = log.with_prefix("teardown:");
    torn_down.sort();
    assert_eq!(
        torn_down,
        vec![
            "teardown:audit",
            "teardown:restock",
            "teardown:sell",
            "teardown:transfer",
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_e2e_start_feature_runs_before_any_scenario() {
    let log = EventLog::new();
    let orchestrator = orchestrator(parallel_suite(&log), &log)
        .system_properties(threads(4))
        .build()
        .unwrap();

    orchestrator.run().await.unwrap();

    let feature_started = log.position("engine:feature:Inventory");
    for scenario in ["restock", "sell", "audit", "transfer"] {
        assert!(feature_started < log.position(&format!("engine:run:{scenario}")));
    }
    assert!(log.position("engine:done:transfer") < log.position("engine:after-all"));
}
