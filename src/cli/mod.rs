//! CLI subcommand implementations for the nando binary.

pub mod discover_cmd;
pub mod doctor;
pub mod export_cmd;
pub mod import_cmd;
pub mod output;
pub mod serve;
pub mod stats;
pub mod sweep_cmd;
