//! CLI command implementations for procinfo-exporter.
//!
//! This module provides implementations for all CLI subcommands:
//! - `report`: One-shot report to stdout
//! - `check`: System validation
//! - `config`: Configuration file generation
//! - `generate`: Test data generation

pub mod check;
pub mod config;
pub mod generate;
pub mod report;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use generate::command_generate_testdata;
pub use report::command_report;
