//! Scenic runner library.
//!
//! Bridges a push-based scenario engine to a pull-based test tree:
//! the [`Orchestrator`](orchestrator::Orchestrator) resolves options and
//! discovers scenarios, each scenario leaf is driven by a
//! [`ScenarioExecution`](execution::ScenarioExecution), and
//! [`run_tree`](runner::run_tree) is a default consumer of the tree.

pub mod execution;
pub mod logging;
pub mod orchestrator;
pub mod runner;

pub use execution::ScenarioExecution;
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use runner::{LeafReport, LeafStatus, RunReport, run_tree, run_tree_with};
