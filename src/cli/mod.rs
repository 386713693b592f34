//! The cqn Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions.

use std::{path::Path, process};

use clap::Parser;
use tracing::Level;

use crate::{
    cli::args::{Command, CqnArgs, OutputFormat},
    config::SchemaConfig,
    syntax::ParseTree,
    CqnError,
};

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    let args = CqnArgs::parse();
    init_tracing(args.verbose);

    // Dispatch to the appropriate subcommand handler.
    let result = match args.command {
        Command::Translate {
            schema,
            tree,
            format,
        } => handle_translate(&schema, &tree, format),
        Command::Check { schema, tree } => handle_check(&schema, &tree),
        Command::Attributes { schema } => handle_attributes(&schema),
    };

    if let Err(e) = result {
        output::print_error(e);
        process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

// ============================================================================
// COMMAND HANDLERS
// ============================================================================

/// Handles the `translate` subcommand.
fn handle_translate(schema: &Path, tree: &Path, format: OutputFormat) -> Result<(), CqnError> {
    let translator = SchemaConfig::from_path(schema)?.translator();
    let tree = ParseTree::from_path(tree)?;
    let result = translator.translate(&tree)?;
    match format {
        OutputFormat::Text => output::print_result(&result),
        OutputFormat::Json => output::print_json(&result)?,
    }
    Ok(())
}

/// Handles the `check` subcommand.
fn handle_check(schema: &Path, tree: &Path) -> Result<(), CqnError> {
    let translator = SchemaConfig::from_path(schema)?.translator();
    let tree = ParseTree::from_path(tree)?;
    let translation = translator.translation(&tree)?;
    translation.root_query()?;
    output::print_check(&translation);
    Ok(())
}

/// Handles the `attributes` subcommand.
fn handle_attributes(schema: &Path) -> Result<(), CqnError> {
    let schema = SchemaConfig::from_path(schema)?;
    output::print_attributes(&schema.object_type, &schema.registry());
    Ok(())
}
