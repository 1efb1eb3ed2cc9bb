//! CLI subcommand implementations.

pub mod discover;
pub mod extract;
pub mod merge;
pub mod metrics;
