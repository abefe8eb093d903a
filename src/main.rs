//! swarmjob: run a one-shot container on a Docker Swarm and relay its exit code.
//!
//! This is the main entry point for the `swarmjob` CLI. It parses arguments,
//! dispatches to the appropriate command handler, and turns the result into
//! the process exit status.

mod cli;
mod commands;
pub mod config;
pub mod envfile;
pub mod error;
pub mod exit_codes;
pub mod lifecycle;
pub mod logging;
pub mod logs;
pub mod swarm;
pub mod task;

#[cfg(test)]
mod test_support;

use cli::Cli;

fn main() {
    let cli = Cli::parse_args();
    logging::init_logging(cli.log_level, cli.verbose());

    let code = match commands::dispatch(cli) {
        Ok(code) => code,
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);
            err.exit_code()
        }
    };

    // Negative sentinels are truncated to 8 bits by the OS.
    std::process::exit(code);
}
