//! Grammar-driven parser: tokens → [`SyntaxTree`].
//!
//! An Earley recognizer runs over the token stream with the (extended) dialect grammar. Completed items are vetted by
//! the [`ReduceChecks`] as they enter the chart, so a rejected reading never feeds a larger one. Once the goal spans
//! the whole stream, one derivation is extracted and built into an arena tree, applying the grammar's structural tags
//! (`collect` lists are flattened, `singleton`/`optional` wrappers with one child are elided).
//!
//! ## Notes
//! - Recognition and extraction both use explicit work lists; nesting depth and statement count do not grow the
//!   native stack.
//! - When more than one reading survives the checks, the production declared first wins, and among the splits of a
//!   production the completion recorded first in the chart wins.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use unpyc_syntax::grammar::Grammar;
//! use unpyc_syntax::parser;
//!
//! let grammar = Grammar::from_text("code ::= stmt\nstmt ::= LOAD_CONST RETURN_VALUE").unwrap();
//! # let tokens = Vec::new();
//! let tree = parser::parse(&tokens, &grammar);
//! assert!(tree.is_err());
//! ```

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::checks::{ReduceChecks, ReduceContext};
use crate::diagnostics::ParseError;
use crate::grammar::{Grammar, GrammarRepository, Tag};
use crate::scanner::Scanned;
use crate::token::Token;
use crate::tree::{NodeId, Span, SyntaxTree, TreeBuilder};

// NOTE: This module is split across multiple files using `include!` to keep the recognizer, the extractor and their
// shared item types in one Rust module (private fields stay private) while avoiding a single large source file.

include!("parser/core.rs");
include!("parser/chart.rs");
include!("parser/extract.rs");
include!("parser/api.rs");
include!("parser/tests.rs");
