//! Per-scenario lifecycle E2E tests.
//!
//! Validates the BEFORE notification, engine execution, AFTER
//! notification, and scope teardown ordering, and what is skipped when
//! an observer fails.

use crate::helpers::engine::{FakeEngine, feature};
use crate::helpers::log::{EventLog, failing_observer, recording_observer};
use crate::helpers::orchestrator;
use crate::helpers::tree::take_leaf;

use scenic_core::event::LifecyclePhase;
use scenic_runner::{LeafStatus, run_tree};

fn checkout(log: &EventLog) -> FakeEngine {
    FakeEngine::new(log).feature(feature(
        "features/checkout.feature",
        "Checkout",
        &[
            ("pay", 3, &[], &["given a cart", "when I pay"]),
            ("cancel", 8, &[], &["given a cart", "when I cancel"]),
        ],
    ))
}

#[tokio::test]
async fn test_e2e_before_run_after_teardown_order() {
    // Given: Observers on both phases
    let log = EventLog::new();
    let orchestrator = orchestrator(checkout(&log), &log)
        .observer(LifecyclePhase::Before, recording_observer(&log))
        .observer(LifecyclePhase::After, recording_observer(&log))
        .build()
        .unwrap();

    // When: Running one scenario leaf
    let nodes = orchestrator.discover().await.unwrap();
    let pay = take_leaf(nodes, "pay").unwrap();
    pay.run().await.unwrap();

    // Then: before -> engine -> after -> teardown
    let before = log.position("before:pay");
    let run = log.position("engine:run:pay");
    let after = log.position("after:pay:passed");
    let teardown = log.position("teardown:pay");
    assert!(before < run, "{:?}", log.entries());
    assert!(run < after, "{:?}", log.entries());
    assert!(after < teardown, "{:?}", log.entries());
}

#[tokio::test]
async fn test_e2e_each_scenario_gets_its_own_scope() {
    let log = EventLog::new();
    let orchestrator = orchestrator(checkout(&log), &log).build().unwrap();

    let report = run_tree(orchestrator.discover().await.unwrap()).await;

    assert!(report.is_success(), "{report}");
    assert_eq!(log.with_prefix("teardown:"), vec!["teardown:pay", "teardown:cancel"]);
}

#[tokio::test]
async fn test_e2e_before_observer_failure_skips_after_and_teardown() {
    // Given: A BEFORE observer that fails
    let log = EventLog::new();
    let orchestrator = orchestrator(checkout(&log), &log)
        .observer(LifecyclePhase::Before, failing_observer("seed data missing"))
        .observer(LifecyclePhase::After, recording_observer(&log))
        .build()
        .unwrap();

    // When: Running the scenario
    let nodes = orchestrator.discover().await.unwrap();
    let failure = take_leaf(nodes, "pay").unwrap().run().await.unwrap_err();

    // Then: The leaf fails with the observer error
    assert!(failure.to_string().contains("seed data missing"), "{failure}");
    assert!(failure.cause().is_some());
    // And: No AFTER notification, no teardown
    assert!(log.with_prefix("after:").is_empty(), "{:?}", log.entries());
    assert!(log.with_prefix("teardown:").is_empty(), "{:?}", log.entries());
}

#[tokio::test]
async fn test_e2e_after_observer_failure_still_tears_down() {
    // Given: An AFTER observer that fails
    let log = EventLog::new();
    let orchestrator = orchestrator(checkout(&log), &log)
        .observer(LifecyclePhase::After, failing_observer("report upload failed"))
        .build()
        .unwrap();

    // When: Running the scenario
    let nodes = orchestrator.discover().await.unwrap();
    let failure = take_leaf(nodes, "cancel").unwrap().run().await.unwrap_err();

    // Then: The leaf fails, but the scope was still destroyed
    assert!(failure.to_string().contains("report upload failed"), "{failure}");
    assert!(log.contains("teardown:cancel"), "{:?}", log.entries());
}

#[tokio::test]
async fn test_e2e_observer_failure_is_isolated_to_its_leaf() {
    // Given: A BEFORE observer that fails only for "pay"
    let log = EventLog::new();
    let orchestrator = orchestrator(checkout(&log), &log)
        .observer(
            LifecyclePhase::Before,
            |event: &scenic_core::event::LifecycleEvent| -> Result<(), scenic_core::BoxError> {
                if event.name() == "pay" {
                    return Err("pay blocked".into());
                }
                Ok(())
            },
        )
        .build()
        .unwrap();

    // When: Running the whole tree
    let report = run_tree(orchestrator.discover().await.unwrap()).await;

    // Then: Only "pay" failed
    assert_eq!(report.failed(), 1, "{report}");
    assert!(matches!(
        &report.leaf("pay").unwrap().status,
        LeafStatus::Failed { message } if message.contains("pay blocked")
    ));
    assert!(report.leaf("cancel").unwrap().status.is_passed());
    assert!(report.leaf("Finish Run").unwrap().status.is_passed());
}

#[tokio::test]
async fn test_e2e_after_notification_carries_failed_outcome() {
    let log = EventLog::new();
    let engine = FakeEngine::new(&log).feature(feature(
        "features/checkout.feature",
        "Checkout",
        &[("decline", 12, &[], &["given a cart", "fail when the card is declined"])],
    ));
    let orchestrator = orchestrator(engine, &log)
        .observer(LifecyclePhase::After, recording_observer(&log))
        .build()
        .unwrap();

    let nodes = orchestrator.discover().await.unwrap();
    let result = take_leaf(nodes, "decline").unwrap().run().await;

    assert!(result.is_err());
    assert!(log.contains("after:decline:failed"), "{:?}", log.entries());
    assert!(log.contains("teardown:decline"));
}

#[tokio::test]
async fn test_e2e_engine_error_before_finish_still_tears_down() {
    // Given: An engine that resolves the world, starts the scenario, then errors
    let log = EventLog::new();
    let engine = FakeEngine::new(&log).feature(feature(
        "features/checkout.feature",
        "Checkout",
        &[
            ("pay", 3, &["@engine-abandons"], &["given a cart"]),
            ("cancel", 8, &[], &["given a cart"]),
        ],
    ));
    let orchestrator = orchestrator(engine, &log)
        .observer(LifecyclePhase::Before, recording_observer(&log))
        .observer(LifecyclePhase::After, recording_observer(&log))
        .build()
        .unwrap();

    // When: Running the scenario
    let nodes = orchestrator.discover().await.unwrap();
    let failure = take_leaf(nodes, "pay").unwrap().run().await.unwrap_err();

    // Then: The leaf fails with the engine error
    assert!(failure.to_string().contains("mid-run"), "{failure}");
    // And: No AFTER notification was sent, but the scope was still released
    assert!(log.contains("before:pay"), "{:?}", log.entries());
    assert!(log.with_prefix("after:").is_empty(), "{:?}", log.entries());
    assert_eq!(log.with_prefix("teardown:"), vec!["teardown:pay"]);
}
