//! CLI argument structs for all commands.
//!
//! Each command has its own argument struct with clap derive attributes
//! for parsing and validation.

use clap::Parser;
use std::path::PathBuf;

/// Arguments shared by every command that reads a project snapshot
#[derive(Parser, Debug, Clone)]
pub struct SnapshotArgs {
    /// Path to the project snapshot (JSON)
    ///
    /// Either the bare project object or `{"project": {...}}`. Use `-` to
    /// read from stdin.
    pub snapshot: PathBuf,
}

impl SnapshotArgs {
    /// Whether the snapshot comes from stdin.
    pub fn is_stdin(&self) -> bool {
        self.snapshot.as_os_str() == "-"
    }
}

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Overwrite an existing configuration file
    #[arg(short, long)]
    pub force: bool,

    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}
