#![forbid(unsafe_code)]
//! unpyc: grammar-driven decompiler frontend for CPython bytecode
//!
//! This crate drives the engine in `unpyc_syntax` over whole code objects: it reads code-object fixtures, recurses
//! into nested code objects (functions, classes, comprehensions) with a bounded work stack, and exposes the `unpyc`
//! command-line tool.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use unpyc::{DecompileOptions, Decompiler, fixture};
//!
//! let code = fixture::from_json(r#"{"magic": 62211, "code": "6400005300", "consts": [null]}"#, None).unwrap();
//! let decompiler = Decompiler::new(DecompileOptions::default()).unwrap();
//! let results = decompiler.decompile(&code).unwrap();
//! println!("{}", results[0].tree.dump());
//! ```

pub mod cli;
pub mod decompile;
pub mod error;
pub mod fixture;

pub use decompile::{DecompileOptions, Decompiled, Decompiler};
pub use error::DecompileError;
pub use unpyc_core::DialectId;
pub use unpyc_syntax::code::{CodeObject, Constant};
pub use unpyc_syntax::tree::SyntaxTree;
