//! E2E integration tests for scenic-runner.
//!
//! These tests drive the orchestrator against a scripted engine and check
//! the tree shape, per-scenario lifecycle ordering, failure reporting,
//! option layering, and isolation between concurrently running scenarios.
//!
//! # Test Structure
//!
//! - `helpers/` -- Shared test utilities (scripted engine, event log, tree helpers)
//! - `scenarios/` -- Test files organized by scenario
//!
//! # Running
//!
//! ```bash
//! cargo test -p scenic-runner --test e2e
//! ```

mod scenarios;
