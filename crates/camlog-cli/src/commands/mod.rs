//! CLI subcommand implementations.

pub mod merge;
pub mod scan;
