//! Failure reporting E2E tests.
//!
//! Validates that a failing leaf names the first failing step's line,
//! that hook failures point at code, and that engine errors stay on the
//! leaf that raised them.

use crate::helpers::engine::{FakeEngine, feature};
use crate::helpers::log::EventLog;
use crate::helpers::orchestrator;
use crate::helpers::tree::take_leaf;

use scenic_core::event::ScenarioOutcome;
use scenic_core::tree::FailureLocation;
use scenic_runner::{LeafStatus, run_tree};

fn cart(log: &EventLog) -> FakeEngine {
    FakeEngine::new(log).feature(feature(
        "features/cart.feature",
        "Cart",
        &[
            (
                "checkout total",
                3,
                &[],
                &[
                    "given a cart with 2 items",
                    "fail then the total is 30",
                    "fail then the receipt is printed",
                ],
            ),
            ("reset db", 9, &["@hook-fails"], &["given a cart"]),
            ("missing step", 13, &[], &["given a cart", "undefined when I fly"]),
            ("crash", 17, &["@engine-crash"], &["given a cart"]),
            ("happy path", 21, &[], &["given a cart"]),
        ],
    ))
}

#[tokio::test]
async fn test_e2e_first_failing_step_line_is_reported() {
    // Given: Steps on lines 4, 5, 6 where 5 and 6 would fail
    let log = EventLog::new();
    let orchestrator = orchestrator(cart(&log), &log).build().unwrap();
    let nodes = orchestrator.discover().await.unwrap();

    // When: Running the scenario
    let failure = take_leaf(nodes, "checkout total")
        .unwrap()
        .run()
        .await
        .unwrap_err();

    // Then: Only the first failure (line 5) is reported
    assert_eq!(
        failure.location(),
        Some(&FailureLocation::FeatureLine {
            uri: "features/cart.feature".to_owned(),
            line: 5,
        })
    );
    assert_eq!(failure.status(), Some(ScenarioOutcome::Failed));
    assert!(
        failure.to_string().contains("features/cart.feature at line 5"),
        "{failure}"
    );
    assert!(failure.to_string().contains("assertion failed"));
}

#[tokio::test]
async fn test_e2e_hook_failure_points_at_code_location() {
    let log = EventLog::new();
    let orchestrator = orchestrator(cart(&log), &log).build().unwrap();
    let nodes = orchestrator.discover().await.unwrap();

    let failure = take_leaf(nodes, "reset db")
        .unwrap()
        .run()
        .await
        .unwrap_err();

    assert_eq!(
        failure.location(),
        Some(&FailureLocation::Code {
            location: "hooks::reset_db".to_owned(),
        })
    );
    assert!(failure.to_string().contains("database unavailable"));
}

#[tokio::test]
async fn test_e2e_undefined_step_fails_the_leaf() {
    let log = EventLog::new();
    let orchestrator = orchestrator(cart(&log), &log).build().unwrap();
    let nodes = orchestrator.discover().await.unwrap();

    let failure = take_leaf(nodes, "missing step")
        .unwrap()
        .run()
        .await
        .unwrap_err();

    assert_eq!(failure.status(), Some(ScenarioOutcome::Undefined));
    assert!(failure.to_string().starts_with("undefined in features/cart.feature at line 15"));
}

#[tokio::test]
async fn test_e2e_engine_error_is_isolated_per_leaf() {
    // Given: One scenario whose engine run errors out
    let log = EventLog::new();
    let orchestrator = orchestrator(cart(&log), &log).build().unwrap();

    // When: Running the whole tree
    let report = run_tree(orchestrator.discover().await.unwrap()).await;

    // Then: The crash is reported on its own leaf with the engine message
    let LeafStatus::Failed { message } = &report.leaf("crash").unwrap().status else {
        panic!("crash leaf should fail: {report}");
    };
    assert!(message.contains("engine crashed running 'crash'"), "{message}");

    // And: The tree kept going
    assert!(report.leaf("happy path").unwrap().status.is_passed());
    assert!(report.leaf("After All").unwrap().status.is_passed());
    assert_eq!(report.failed(), 4, "{report}");
}

#[tokio::test]
async fn test_e2e_report_path_names_feature() {
    let log = EventLog::new();
    let orchestrator = orchestrator(cart(&log), &log).build().unwrap();

    let report = run_tree(orchestrator.discover().await.unwrap()).await;

    let leaf = report.leaf("happy path").unwrap();
    assert_eq!(leaf.display_name(), "Cart / happy path");
    assert_eq!(leaf.source.as_deref(), Some("features/cart.feature?line=21"));
}
