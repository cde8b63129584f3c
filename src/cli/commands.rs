//! Command implementations for the CLI.

use std::path::{Path, PathBuf};

use miette::Report;
use unpyc_core::DialectId;

use super::{CliError, CliResult, ExitCode};
use crate::decompile::{DecompileOptions, Decompiled, Decompiler};
use crate::fixture;

/// Decompile every fixture in `files`, printing results to stdout and failures to stderr.
///
/// ## Returns
/// - [`ExitCode::SUCCESS`] if every file decompiled, [`ExitCode::FAILURE`] otherwise.
///
/// ## Errors
/// - [`CliError`] only if the built-in grammars fail to load; per-file failures are reported and counted.
pub fn decompile_files(
    files: &[PathBuf],
    dialect: Option<DialectId>,
    options: DecompileOptions,
    show_tree: bool,
) -> CliResult<ExitCode> {
    let decompiler =
        Decompiler::new(options).map_err(|e| CliError::failure(format!("{:?}", Report::new(e))))?;

    let mut failed = 0usize;
    for path in files {
        if !decompile_file(&decompiler, path, dialect, show_tree) {
            failed += 1;
        }
    }
    if failed > 0 {
        eprintln!("{failed} of {} file(s) failed", files.len());
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Decompile one fixture; returns whether it succeeded.
fn decompile_file(decompiler: &Decompiler, path: &Path, dialect: Option<DialectId>, show_tree: bool) -> bool {
    let code = match fixture::load(path, dialect) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:?}", path.display(), Report::new(e));
            return false;
        }
    };
    match decompiler.decompile(&code) {
        Ok(results) => {
            for result in &results {
                print_result(path, result, show_tree);
            }
            true
        }
        Err(e) => {
            eprintln!("{}: {:?}", path.display(), Report::new(e));
            false
        }
    }
}

fn print_result(path: &Path, result: &Decompiled, show_tree: bool) {
    let indent = "  ".repeat(result.depth);
    let statements = result.statement_count();
    println!("{}: {indent}{} ok ({statements} statements)", path.display(), result.name);
    if let Some(tokens) = &result.tokens {
        println!("-- tokens: {}", result.name);
        print!("{tokens}");
    }
    if let Some(grammar) = &result.grammar {
        println!("-- synthesized rules: {}", result.name);
        print!("{grammar}");
    }
    if show_tree {
        println!("-- tree: {}", result.name);
        print!("{}", result.tree.dump());
    }
}
