//! CLI module for the unpyc decompiler
//!
//! ## Usage
//!
//! ```text
//! unpyc <FILE...> [--dialect py27|py36] [--max-depth N] [--tokens] [--grammar] [--tree]
//! ```
//!
//! Every `FILE` is a JSON code-object fixture (see [`crate::fixture`]). Files are processed independently: a failing
//! file is reported and the run moves on to the next one.
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use unpyc_core::DialectId;

use crate::decompile::{DEFAULT_MAX_DEPTH, DecompileOptions};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Grammar-driven decompiler frontend for CPython bytecode
#[derive(Parser, Debug)]
#[command(name = "unpyc")]
#[command(version = VERSION)]
#[command(about = "Parse CPython code objects into syntax trees", long_about = None)]
pub struct Cli {
    /// JSON code-object fixtures to decompile
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Dialect for fixtures that carry neither `magic` nor `dialect`
    #[arg(long, value_name = "DIALECT", value_parser = parse_dialect)]
    pub dialect: Option<DialectId>,

    /// Deepest nesting level of code objects to decompile
    #[arg(long = "max-depth", value_name = "N", default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Print the scanner's token stream (debug)
    #[arg(long)]
    pub tokens: bool,

    /// Print the productions synthesized for each code object (debug)
    #[arg(long)]
    pub grammar: bool,

    /// Print the syntax tree of each code object
    #[arg(long)]
    pub tree: bool,
}

impl Cli {
    /// Decompile options selected by the flags.
    pub fn options(&self) -> DecompileOptions {
        DecompileOptions::new()
            .with_max_depth(self.max_depth)
            .with_tokens(self.tokens)
            .with_grammar(self.grammar)
    }
}

fn parse_dialect(name: &str) -> Result<DialectId, String> {
    DialectId::from_name(name).ok_or_else(|| format!("unknown dialect `{name}` (expected py27 or py36)"))
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let options = cli.options();
    commands::decompile_files(&cli.files, cli.dialect, options, cli.tree)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_files() {
        let cli = Cli::try_parse_from(["unpyc", "a.json", "b.json"]).unwrap();
        assert_eq!(cli.files.len(), 2);
        assert_eq!(cli.dialect, None);
        assert_eq!(cli.max_depth, DEFAULT_MAX_DEPTH);
        assert!(!cli.tree);
    }

    #[test]
    fn test_cli_requires_a_file() {
        assert!(Cli::try_parse_from(["unpyc"]).is_err());
    }

    #[test]
    fn test_cli_parse_dialect() {
        let cli = Cli::try_parse_from(["unpyc", "--dialect", "py36", "a.json"]).unwrap();
        assert_eq!(cli.dialect, Some(DialectId::Py36));
        let cli = Cli::try_parse_from(["unpyc", "--dialect", "2.7", "a.json"]).unwrap();
        assert_eq!(cli.dialect, Some(DialectId::Py27));
        assert!(Cli::try_parse_from(["unpyc", "--dialect", "py99", "a.json"]).is_err());
    }

    #[test]
    fn test_cli_debug_flags_map_to_options() {
        let cli = Cli::try_parse_from(["unpyc", "--tokens", "--grammar", "--max-depth", "3", "a.json"]).unwrap();
        let options = cli.options();
        assert!(options.show_tokens);
        assert!(options.show_grammar);
        assert_eq!(options.max_depth, 3);
    }
}
