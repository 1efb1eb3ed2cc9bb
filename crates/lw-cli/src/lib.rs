//! Device log correlator CLI library.
//!
//! This crate provides the CLI interface for the log correlator.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::{Config, CustomMetric};
