//! Errors produced while decompiling one top-level code object.

use miette::Diagnostic;
use thiserror::Error;
use unpyc_syntax::diagnostics::{DecodeError, GrammarError, ParseError};

/// Failure of one code object (or of one of its nested code objects).
///
/// ## Notes
/// - Every variant is scoped to the object that produced it; a batch run records it and moves on.
/// - `Decode` and `Parse` carry the name of the (possibly nested) code object that failed.
#[derive(Debug, Error, Diagnostic)]
pub enum DecompileError {
    #[error("in code object `{name}`: {source}")]
    #[diagnostic(forward(source))]
    Decode {
        name: String,
        #[source]
        source: DecodeError,
    },

    #[error("in code object `{name}`: {source}")]
    #[diagnostic(forward(source))]
    Parse {
        name: String,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Grammar(#[from] GrammarError),

    #[error("code object `{name}` is nested {depth} levels deep, over the limit of {limit}")]
    #[diagnostic(
        code(unpyc::recursion_limit),
        help("raise the limit with --max-depth if the input is trusted")
    )]
    RecursionLimitExceeded { name: String, depth: usize, limit: usize },
}

impl DecompileError {
    /// Name of the code object the error was raised for, if it names one.
    pub fn object_name(&self) -> Option<&str> {
        match self {
            DecompileError::Decode { name, .. }
            | DecompileError::Parse { name, .. }
            | DecompileError::RecursionLimitExceeded { name, .. } => Some(name),
            DecompileError::Grammar(_) => None,
        }
    }
}
