//! Configuration model for swarmjob.
//!
//! This module defines the Config struct that represents the optional
//! `--config` YAML file. It supports forward-compatible YAML parsing (unknown
//! fields are ignored), sensible defaults for optional fields, and validation
//! of config values.

mod model;
mod operations;
mod types;


pub use model::Config;
pub use operations::parse_api_version;
pub use types::{CONFIG_ENV_VAR, CommandTokenizer};
