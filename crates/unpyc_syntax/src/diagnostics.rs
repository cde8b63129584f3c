//! Error types for decoding and parsing one code object.
//!
//! Every error here is scoped to a single code object: a batch driver can record it against that object and move on
//! to the next one. Nothing is retried internally.

use miette::Diagnostic;
use thiserror::Error;
use unpyc_core::DialectId;

/// A malformed instruction stream or an operand that does not resolve against the code object's pools.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum DecodeError {
    #[error("unknown opcode byte {byte} at offset {offset} for dialect {dialect}")]
    #[diagnostic(
        code(unpyc::decode::unknown_opcode),
        help("the code object was probably produced by a different bytecode version")
    )]
    UnknownOpcode { byte: u8, offset: u32, dialect: DialectId },

    #[error("instruction at offset {offset} is truncated")]
    #[diagnostic(code(unpyc::decode::truncated))]
    TruncatedInstruction { offset: u32 },

    #[error("operand {operand} of {opcode} at offset {offset} is out of range for the {pool} pool (size {len})")]
    #[diagnostic(code(unpyc::decode::operand_out_of_range))]
    OperandOutOfRange {
        opcode: &'static str,
        offset: u32,
        operand: u32,
        pool: &'static str,
        len: usize,
    },

    #[error("jump at offset {offset} targets {target}, which is not an instruction boundary")]
    #[diagnostic(code(unpyc::decode::illegal_jump_target))]
    IllegalJumpTarget { offset: u32, target: u32 },

    #[error("unknown magic number {0}")]
    #[diagnostic(code(unpyc::decode::unknown_magic), help("supported dialects: py27 (62211), py36 (3360..=3379)"))]
    UnknownMagic(u16),
}

/// A malformed line in declarative grammar text.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("grammar line {line}: {message}")]
#[diagnostic(code(unpyc::grammar))]
pub struct GrammarError {
    pub line: usize,
    pub message: String,
}

/// No sequence of reductions spans the whole token stream under the goal symbol.
///
/// ## Notes
/// - `index` always lies within `[0, token count)` when the stream is non-empty; a failure at end of input is
///   reported against the last token.
/// - `window` renders up to three tokens on each side of the failure as `offset KIND pattr`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("parse error at token #{index} `{token}` (offset {offset}); near: {}", .window.join(" | "))]
#[diagnostic(code(unpyc::parse))]
pub struct ParseError {
    pub token: String,
    pub offset: String,
    pub index: usize,
    pub window: Vec<String>,
    pub expected: Vec<String>,
    #[help]
    pub help: Option<String>,
}

impl ParseError {
    pub fn new(token: impl Into<String>, offset: impl Into<String>, index: usize) -> Self {
        Self {
            token: token.into(),
            offset: offset.into(),
            index,
            window: Vec::new(),
            expected: Vec::new(),
            help: None,
        }
    }

    pub fn with_window(mut self, window: Vec<String>) -> Self {
        self.window = window;
        self
    }

    /// Record the symbols the parser could have accepted, and derive the help text from them.
    pub fn with_expected(mut self, expected: Vec<String>) -> Self {
        if !expected.is_empty() {
            self.help = Some(format!("expected one of: {}", expected.join(", ")));
        }
        self.expected = expected;
        self
    }
}
