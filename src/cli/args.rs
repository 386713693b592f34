//! Defines the command-line arguments and subcommands for the cqn CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "cqn",
    version,
    about = "Translates parsed filter expressions into typed query trees."
)]
pub struct CqnArgs {
    /// Log more (-v for debug, -vv for trace). Logs go to stderr.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Translate a parse tree and print the resulting query and options.
    Translate {
        /// Schema file (YAML or JSON) naming the object type and attributes.
        #[arg(short, long)]
        schema: PathBuf,
        /// The parse tree file (YAML or JSON) to translate.
        #[arg(required = true)]
        tree: PathBuf,
        /// How to print the result.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Translate a parse tree and only report whether it succeeded.
    Check {
        /// Schema file (YAML or JSON) naming the object type and attributes.
        #[arg(short, long)]
        schema: PathBuf,
        /// The parse tree file (YAML or JSON) to check.
        #[arg(required = true)]
        tree: PathBuf,
    },
    /// List the attributes a schema registers.
    Attributes {
        /// Schema file (YAML or JSON).
        #[arg(short, long)]
        schema: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Filter-expression notation
    Text,
    /// Pretty-printed JSON
    Json,
}
