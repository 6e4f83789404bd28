//! E2E test scenarios.

mod concurrency;
mod failure_reporting;
mod lifecycle;
mod options;
