//! Bytecode-to-syntax-tree frontend for the unpyc decompiler: decoder, structure detector, scanner, grammar, parser.
//!
//! The pipeline for one code object is:
//!
//! ```text
//! CodeObject ──decode──► [Instruction] ──structure──► blocks + fixups + incoming jumps
//!                                   └────scanner────► [Token] + ArityUsageMap
//!                                                          │
//! Grammar (dialect base) ──synth──► extended Grammar ──parser + checks──► SyntaxTree
//! ```
//!
//! ## Notes
//! - This crate is “syntax-only”: it does not render source text and does not read files.
//! - Dialect vocabulary (opcode bytes, jump classification, variable-arity opcodes) comes from `unpyc_core`.
//! - Every stage is a pure function of its inputs plus an explicit per-session state where deduplication is needed;
//!   there are no global caches, so independent code objects can be parsed on different threads.
//!
//! ## Examples
//! ```rust,no_run
//! use unpyc_core::DialectId;
//! use unpyc_syntax::code::{CodeObject, Constant};
//! use unpyc_syntax::{grammar::GrammarRepository, parser, scanner};
//!
//! // LOAD_CONST None; RETURN_VALUE
//! let code = CodeObject::new(DialectId::Py27, "<module>", vec![100, 0, 0, 83]).with_consts(vec![Constant::None]);
//! let scanned = scanner::scan(&code).unwrap();
//! let repo = GrammarRepository::new().unwrap();
//! let tree = parser::parse_tokens(&scanned, &repo).unwrap();
//! assert_eq!(tree.label(tree.root()), "code");
//! ```

pub mod checks;
pub mod code;
pub mod diagnostics;
pub mod grammar;
pub mod instruction;
pub mod parser;
pub mod scanner;
pub mod structure;
pub mod token;
pub mod tree;
