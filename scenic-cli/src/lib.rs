//! Scenic CLI library.
//!
//! Argument parsing, output rendering, and command handlers behind the
//! `scenic` binary. Exposed as a library so handlers can be tested directly.

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
