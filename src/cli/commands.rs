//! CLI commands and argument parsing

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Operator tool for a data catalog server
#[derive(Parser, Debug)]
#[command(name = "catalog-client")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Client configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Server root, overrides the config file and environment
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage API access tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Fetch every page of a list endpoint
    Get {
        /// Path relative to the server root
        path: String,

        /// Query parameter as key=value (repeatable)
        #[arg(short, long = "query", value_parser = parse_key_value)]
        query: Vec<(String, String)>,
    },

    /// Wait for an async job and print its result
    Job(JobArgs),
}

/// Token subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenAction {
    /// Mint a new access token from the refresh token
    Create,
    /// Validate the configured access token
    Validate,
    /// Revoke every access token minted from the refresh token
    Revoke,
}

/// Job selector
#[derive(Args, Debug)]
pub struct JobArgs {
    /// Numeric job id
    #[arg(long, required_unless_present = "name", conflicts_with = "name")]
    pub id: Option<i64>,

    /// Job name
    #[arg(long)]
    pub name: Option<String>,

    /// Endpoint discriminator used to type the result (e.g. `document-post`)
    #[arg(long, default_value = "generic")]
    pub endpoint: String,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON
    Json,
    /// Indented JSON
    Pretty,
}

fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
