//! CLI module
//!
//! Operator commands against one catalog server. Results are printed as
//! JSON on stdout, logs go to stderr.
//!
//! # Commands
//!
//! - `token create|validate|revoke` - Manage API access tokens
//! - `get PATH [-q k=v]...` - Fetch every page of a list endpoint
//! - `job --id N | --name S` - Wait for an async job

mod commands;
mod runner;

pub use commands::{Cli, Commands, JobArgs, OutputFormat, TokenAction};
pub use runner::Runner;
