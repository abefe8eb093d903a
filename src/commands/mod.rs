//! Command implementations for swarmjob.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations.

mod run;

use crate::cli::{Cli, Command};
use crate::error::Result;

/// Dispatch a command to its implementation.
///
/// Returns the process exit code the command settled on.
pub fn dispatch(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Run(args) => run::cmd_run(args, cli.config.as_deref()),
    }
}
