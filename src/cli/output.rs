//! Handles all user-facing output for the CLI.
//!
//! This module is responsible for pretty-printing, colorizing output,
//! formatting errors, and generating JSON. By centralizing output logic here,
//! we ensure a consistent user experience across all commands.

use std::io::Write;

use miette::Report;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::{
    attribute::AttributeRegistry, err_msg, CqnError, ParseResult, Translation,
};

// ============================================================================
// CORE OUTPUT FUNCTIONS: User-facing CLI output utilities
// ============================================================================

/// Prints a translated query, followed by its options when there are any.
pub fn print_result(result: &ParseResult) {
    let mut stdout = stdout();
    print_heading(&mut stdout, "Query", Color::Green);
    println!("{}", result.query);
    if !result.options.is_empty() {
        print_heading(&mut stdout, "Options", Color::Cyan);
        println!("{}", result.options);
    }
}

/// Prints a translated query as pretty JSON.
pub fn print_json(result: &ParseResult) -> Result<(), CqnError> {
    let json = serde_json::to_string_pretty(result)
        .map_err(|e| err_msg!(Config, "Failed to encode result as JSON: {}", e))?;
    println!("{json}");
    Ok(())
}

/// Prints the outcome of `check`.
pub fn print_check(translation: &Translation) {
    let mut stdout = stdout();
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true));
    print!("ok");
    let _ = stdout.reset();
    let _ = stdout.flush();
    println!(
        ": {} queries encountered, {} converted",
        translation.encountered(),
        translation.converted()
    );
}

/// Prints one `name: Type` line per registered attribute.
pub fn print_attributes(object_type: &str, registry: &AttributeRegistry) {
    let mut stdout = stdout();
    print_heading(&mut stdout, object_type, Color::Yellow);
    for name in registry.list() {
        if let Some(attribute) = registry.get(&name) {
            println!("  {name}: {}", attribute.value_type());
        }
    }
}

/// Renders an error as a miette report on stderr.
pub fn print_error(error: CqnError) {
    let report = Report::new(error);
    eprintln!("{report:?}");
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn stdout() -> StandardStream {
    let choice = if atty::is(atty::Stream::Stdout) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

fn print_heading(stdout: &mut StandardStream, text: &str, color: Color) {
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
    let _ = writeln!(stdout, "--- {text} ---");
    let _ = stdout.reset();
}
