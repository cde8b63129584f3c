//! Per-object decompile sessions.
//!
//! A [`Decompiler`] owns the read-only [`GrammarRepository`] and runs the scan → synthesize → parse pipeline for a
//! code object and every code object nested in its constant pool.
//!
//! ## Notes
//! - Nested objects are visited depth-first through an explicit work stack, so deep nesting never grows the native
//!   call stack. The depth ceiling is [`DecompileOptions::max_depth`].
//! - Each object gets its own synthesis session; nothing is shared between objects except the repository.

use std::fmt::Write as _;
use std::sync::Arc;

use unpyc_syntax::code::CodeObject;
use unpyc_syntax::grammar::GrammarRepository;
use unpyc_syntax::parser;
use unpyc_syntax::scanner;
use unpyc_syntax::tree::SyntaxTree;

use crate::error::DecompileError;

/// Default nesting ceiling for code objects.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Knobs for one decompile run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecompileOptions {
    /// Deepest nesting level (the top-level object is level 0) that is still decompiled.
    pub max_depth: usize,
    /// Keep a rendering of the scanner output.
    pub show_tokens: bool,
    /// Keep a rendering of the productions synthesized for the object.
    pub show_grammar: bool,
}

impl Default for DecompileOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            show_tokens: false,
            show_grammar: false,
        }
    }
}

impl DecompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_tokens(mut self, show: bool) -> Self {
        self.show_tokens = show;
        self
    }

    pub fn with_grammar(mut self, show: bool) -> Self {
        self.show_grammar = show;
        self
    }
}

/// The parse result for one code object.
#[derive(Debug, Clone)]
pub struct Decompiled {
    pub name: String,
    /// Nesting level; the top-level object is 0.
    pub depth: usize,
    pub tree: SyntaxTree,
    /// One token per line, present when [`DecompileOptions::show_tokens`] is set.
    pub tokens: Option<String>,
    /// Synthesized productions, present when [`DecompileOptions::show_grammar`] is set.
    pub grammar: Option<String>,
}

impl Decompiled {
    /// Number of top-level statements in the tree.
    pub fn statement_count(&self) -> usize {
        let root = self.tree.root();
        self.tree.child(root, 0).map_or(0, |stmts| self.tree.children(stmts).len())
    }
}

/// Runs decompile sessions against a shared grammar repository.
#[derive(Debug, Clone)]
pub struct Decompiler {
    repo: GrammarRepository,
    options: DecompileOptions,
}

impl Decompiler {
    /// Build the dialect grammars and a decompiler using them.
    ///
    /// ## Errors
    /// - [`DecompileError::Grammar`] if a built-in rule table fails to load.
    pub fn new(options: DecompileOptions) -> Result<Self, DecompileError> {
        Ok(Self::with_repository(GrammarRepository::new()?, options))
    }

    pub fn with_repository(repo: GrammarRepository, options: DecompileOptions) -> Self {
        Self { repo, options }
    }

    pub fn options(&self) -> &DecompileOptions {
        &self.options
    }

    pub fn repository(&self) -> &GrammarRepository {
        &self.repo
    }

    /// Decompile `code` and every code object nested in it.
    ///
    /// ## Returns
    /// - One [`Decompiled`] per code object in depth-first pre-order: the top-level object first, then each nested
    ///   object followed by its own nested objects, in constant-pool order.
    ///
    /// ## Errors
    /// - [`DecompileError::Decode`] or [`DecompileError::Parse`] naming the first object that failed.
    /// - [`DecompileError::RecursionLimitExceeded`] if an object sits deeper than `max_depth`.
    #[tracing::instrument(skip_all, fields(name = %code.name, dialect = %code.dialect))]
    pub fn decompile(&self, code: &Arc<CodeObject>) -> Result<Vec<Decompiled>, DecompileError> {
        let mut out = Vec::new();
        let mut work: Vec<(Arc<CodeObject>, usize)> = vec![(Arc::clone(code), 0)];
        while let Some((object, depth)) = work.pop() {
            if depth > self.options.max_depth {
                return Err(DecompileError::RecursionLimitExceeded {
                    name: object.name.clone(),
                    depth,
                    limit: self.options.max_depth,
                });
            }
            let mut result = self.decompile_object(&object)?;
            result.depth = depth;
            out.push(result);
            let nested: Vec<_> = object.nested().cloned().collect();
            work.extend(nested.into_iter().rev().map(|child| (child, depth + 1)));
        }
        Ok(out)
    }

    /// Decompile a single code object without descending into nested ones.
    ///
    /// ## Errors
    /// - [`DecompileError::Decode`] if the instruction stream does not decode.
    /// - [`DecompileError::Parse`] if the token stream does not reduce to the goal symbol.
    pub fn decompile_object(&self, code: &CodeObject) -> Result<Decompiled, DecompileError> {
        let scanned = scanner::scan(code).map_err(|source| DecompileError::Decode {
            name: code.name.clone(),
            source,
        })?;
        let mut session = self.repo.session(scanned.dialect);
        let grammar = session.extend(&scanned.customize);
        let tree = parser::parse(&scanned.tokens, grammar).map_err(|source| DecompileError::Parse {
            name: code.name.clone(),
            source,
        })?;
        tracing::debug!(name = %code.name, tokens = scanned.tokens.len(), "decompiled");

        let tokens = self.options.show_tokens.then(|| {
            let mut text = String::new();
            for token in &scanned.tokens {
                let _ = writeln!(text, "{token}");
            }
            text
        });
        let grammar = self.options.show_grammar.then(|| {
            let mut text = String::new();
            for production in session.synthesized() {
                let _ = writeln!(text, "{production}");
            }
            text
        });
        Ok(Decompiled {
            name: code.name.clone(),
            depth: 0,
            tree,
            tokens,
            grammar,
        })
    }

    /// Decompile several independent top-level objects, recording each outcome instead of stopping at a failure.
    pub fn decompile_batch<'a>(
        &self,
        objects: impl IntoIterator<Item = &'a Arc<CodeObject>>,
    ) -> Vec<Result<Vec<Decompiled>, DecompileError>> {
        objects
            .into_iter()
            .map(|code| {
                let result = self.decompile(code);
                if let Err(err) = &result {
                    tracing::warn!(name = %code.name, error = %err, "code object failed");
                }
                result
            })
            .collect()
    }
}
