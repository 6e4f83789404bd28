//! Option layering E2E tests.
//!
//! Validates that the options file, environment, system properties, and
//! suite options combine field by field, and that the effective options
//! drive scenario selection.

use std::io::Write as _;

use crate::helpers::engine::{FakeEngine, feature};
use crate::helpers::log::EventLog;
use crate::helpers::orchestrator;
use crate::helpers::tree::{container, names};

use scenic_core::config::{
    GLUE_PROPERTY, LIMIT_PROPERTY, SuiteOptions, SystemProperties, THREADS_PROPERTY,
    WIP_PROPERTY,
};
use scenic_runner::run_tree;

fn options_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn search(log: &EventLog) -> FakeEngine {
    FakeEngine::new(log).feature(feature(
        "features/search.feature",
        "Search",
        &[
            ("search by name", 3, &["@smoke"], &["given an index"]),
            ("search by tag", 6, &["@smoke"], &["given an index"]),
            ("search by date", 9, &["@smoke", "@slow"], &["given an index"]),
            ("empty search", 12, &["@edge"], &["given an index"]),
        ],
    ))
}

#[tokio::test]
async fn test_e2e_four_layers_combine_field_by_field() {
    // Given: Every layer defines some fields
    let file = options_file(
        r#"
features = ["features/file"]
glue = ["file::glue"]
tags = ["@file"]
threads = 2
"#,
    );
    let mut system = SystemProperties::new();
    system
        .set(GLUE_PROPERTY, "system::glue")
        .set(LIMIT_PROPERTY, "7");

    let log = EventLog::new();
    let orchestrator = orchestrator(FakeEngine::new(&log), &log)
        .options_file(file.path())
        .environment([
            ("CUCUMBER_FILTER_TAGS", "@env"),
            ("CUCUMBER_EXECUTION_LIMIT", "5"),
            ("HOME", "/root"),
        ])
        .system_properties(system)
        .suite_options(SuiteOptions::new().features(["features/suite"]))
        .build()
        .unwrap();

    // When: Resolving the options
    let options = orchestrator.resolve_options().await.unwrap();

    // Then: Each field comes from the highest layer that defines it
    assert_eq!(options.feature_paths, vec!["features/suite"]);
    assert_eq!(options.glue, vec!["system::glue"]);
    assert_eq!(options.tag_expressions, vec!["@env"]);
    assert_eq!(options.limit, Some(7));
    assert_eq!(options.threads, 2);
}

#[tokio::test]
async fn test_e2e_defaults_when_no_layer_is_set() {
    let log = EventLog::new();
    let orchestrator = orchestrator(FakeEngine::new(&log), &log)
        .options_file("does/not/exist.toml")
        .build()
        .unwrap();

    let options = orchestrator.resolve_options().await.unwrap();

    assert_eq!(options.feature_paths, vec!["tests/features"]);
    assert_eq!(options.glue, vec!["e2e::suite"]);
    assert_eq!(options.threads, 1);
    assert!(options.limit.is_none());
}

#[tokio::test]
async fn test_e2e_malformed_options_file_is_fatal() {
    let file = options_file("features = [unterminated");
    let log = EventLog::new();
    let orchestrator = orchestrator(search(&log), &log)
        .options_file(file.path())
        .build()
        .unwrap();

    let err = orchestrator.discover().await.err().expect("parse failure");
    assert!(err.to_string().contains("parse"), "{err}");
}

#[tokio::test]
async fn test_e2e_invalid_thread_count_is_fatal() {
    let mut system = SystemProperties::new();
    system.set(THREADS_PROPERTY, "0");
    let log = EventLog::new();
    let orchestrator = orchestrator(search(&log), &log)
        .system_properties(system)
        .build()
        .unwrap();

    assert!(orchestrator.discover().await.is_err());
}

#[tokio::test]
async fn test_e2e_effective_options_reach_the_engine() {
    let log = EventLog::new();
    let orchestrator = orchestrator(search(&log), &log)
        .suite_options(SuiteOptions::new().features(["features/a", "features/b"]))
        .build()
        .unwrap();

    orchestrator.discover().await.unwrap();

    assert!(log.contains("discover:features/a,features/b"), "{:?}", log.entries());
}

#[tokio::test]
async fn test_e2e_tag_and_name_filters_select_scenarios() {
    // Given: Only fast smoke scenarios whose name mentions "tag" or "name"
    let log = EventLog::new();
    let orchestrator = orchestrator(search(&log), &log)
        .suite_options(
            SuiteOptions::new()
                .tags("@smoke and not @slow")
                .name(["by (tag|name)"]),
        )
        .build()
        .unwrap();

    // When: Discovering
    let nodes = orchestrator.discover().await.unwrap();

    // Then: Two scenarios survive, in discovery order
    assert_eq!(
        names(container(&nodes, "Search")),
        vec!["Start Feature", "search by name", "search by tag"]
    );
}

#[tokio::test]
async fn test_e2e_limit_caps_selected_scenarios() {
    let mut system = SystemProperties::new();
    system.set(LIMIT_PROPERTY, "3");
    let log = EventLog::new();
    let orchestrator = orchestrator(search(&log), &log)
        .system_properties(system)
        .build()
        .unwrap();

    let nodes = orchestrator.discover().await.unwrap();

    assert_eq!(container(&nodes, "Search").len(), 4, "start feature + 3 scenarios");
}

#[tokio::test]
async fn test_e2e_zero_limit_means_unlimited() {
    let mut system = SystemProperties::new();
    system.set(LIMIT_PROPERTY, "0");
    let log = EventLog::new();
    let orchestrator = orchestrator(search(&log), &log)
        .system_properties(system)
        .build()
        .unwrap();

    let nodes = orchestrator.discover().await.unwrap();

    assert_eq!(container(&nodes, "Search").len(), 5);
}

#[tokio::test]
async fn test_e2e_wip_flag_is_passed_through_to_the_engine() {
    let mut system = SystemProperties::new();
    system.set(WIP_PROPERTY, "true").set(LIMIT_PROPERTY, "1");
    let log = EventLog::new();
    let orchestrator = orchestrator(search(&log), &log)
        .system_properties(system)
        .build()
        .unwrap();

    let report = run_tree(orchestrator.discover().await.unwrap()).await;

    assert!(report.is_success(), "{report}");
    assert_eq!(log.with_prefix("engine:wip:"), vec!["engine:wip:search by name"]);
}
