//! Grammar model: productions, structural tags and the declarative text format.
//!
//! Base grammars are plain text, one production per line:
//!
//! ```text
//! # comment
//! %goal code
//! %collect stmts
//! %optional stmts_opt
//! %singleton stmt
//! code ::= stmts
//! stmts_opt ::=
//! ```
//!
//! A symbol is a nonterminal iff it appears as the left-hand side of some production; everything else is a terminal
//! and is matched against token kinds.
//!
//! ## Notes
//! - Productions are keyed by their rendered text (`lhs ::= a b c`). Adding a production whose key already exists is a
//!   no-op, which is what makes rule synthesis idempotent.
//! - Declaration order is preserved and is the parser's tie-break between competing productions.

pub mod repository;
pub mod rules;
pub mod synth;

pub use repository::GrammarRepository;
pub use synth::RuleSynthesizer;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::diagnostics::GrammarError;

/// One production `lhs ::= rhs...`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Production {
    pub lhs: String,
    pub rhs: Vec<String>,
}

impl Production {
    pub fn new<S: Into<String>>(lhs: impl Into<String>, rhs: impl IntoIterator<Item = S>) -> Self {
        Self {
            lhs: lhs.into(),
            rhs: rhs.into_iter().map(Into::into).collect(),
        }
    }

    /// Canonical text form, also used as the deduplication key.
    pub fn text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ::=", self.lhs)?;
        for sym in &self.rhs {
            write!(f, " {sym}")?;
        }
        Ok(())
    }
}

/// Structural tag attached to a nonterminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Left-recursive repetition: `xs ::= xs x` appends onto the existing `xs` node.
    Collect,
    /// A single child replaces the wrapper; an empty production stays as a zero-child node.
    Optional,
    /// A single child replaces the wrapper.
    Singleton,
}

impl Tag {
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Collect => "collect",
            Tag::Optional => "optional",
            Tag::Singleton => "singleton",
        }
    }

    pub fn from_str(name: &str) -> Option<Tag> {
        match name {
            "collect" => Some(Tag::Collect),
            "optional" => Some(Tag::Optional),
            "singleton" => Some(Tag::Singleton),
            _ => None,
        }
    }
}

/// A production set with tags and a goal symbol.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Grammar {
    goal: String,
    productions: Vec<Production>,
    keys: BTreeSet<String>,
    by_lhs: BTreeMap<String, Vec<usize>>,
    tags: BTreeMap<String, BTreeSet<TagKey>>,
}

/// `Tag` has no `Ord`; tags are stored by name.
type TagKey = &'static str;

impl Grammar {
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            ..Self::default()
        }
    }

    /// Parse declarative grammar text.
    ///
    /// ## Errors
    /// - [`GrammarError`] for a line that is neither a comment, a tag line nor a production, or a tag line naming an
    ///   unknown tag.
    pub fn from_text(text: &str) -> Result<Self, GrammarError> {
        let mut grammar = Grammar::default();
        grammar.extend_from_text(text)?;
        Ok(grammar)
    }

    /// Add the productions and tags of another text chunk.
    pub fn extend_from_text(&mut self, text: &str) -> Result<(), GrammarError> {
        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let err = |message: String| GrammarError { line: line_no, message };
            if let Some(directive) = line.strip_prefix('%') {
                let mut words = directive.split_whitespace();
                let name = words.next().unwrap_or("");
                let symbols: Vec<&str> = words.collect();
                if symbols.is_empty() {
                    return Err(err(format!("`%{name}` needs at least one symbol")));
                }
                if name == "goal" {
                    self.goal = symbols[0].to_string();
                    continue;
                }
                let tag = Tag::from_str(name).ok_or_else(|| err(format!("unknown tag `%{name}`")))?;
                for sym in symbols {
                    self.add_tag(sym, tag);
                }
                continue;
            }
            let Some((lhs, rhs)) = line.split_once("::=") else {
                return Err(err(format!("expected `lhs ::= symbols`, found `{line}`")));
            };
            let lhs = lhs.trim();
            if lhs.is_empty() || lhs.contains(char::is_whitespace) {
                return Err(err(format!("left-hand side must be one symbol, found `{lhs}`")));
            }
            if self.goal.is_empty() {
                self.goal = lhs.to_string();
            }
            self.add_rule(Production::new(lhs, rhs.split_whitespace()));
        }
        Ok(())
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    /// Add a production; returns `false` if an identical production was already present.
    pub fn add_rule(&mut self, production: Production) -> bool {
        if !self.keys.insert(production.text()) {
            return false;
        }
        self.by_lhs
            .entry(production.lhs.clone())
            .or_default()
            .push(self.productions.len());
        self.productions.push(production);
        true
    }

    pub fn add_tag(&mut self, symbol: impl Into<String>, tag: Tag) {
        self.tags.entry(symbol.into()).or_default().insert(tag.as_str());
    }

    pub fn has_tag(&self, symbol: &str, tag: Tag) -> bool {
        self.tags.get(symbol).is_some_and(|t| t.contains(tag.as_str()))
    }

    /// All productions in declaration order.
    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn len(&self) -> usize {
        self.productions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.productions.is_empty()
    }

    pub fn contains(&self, production: &Production) -> bool {
        self.keys.contains(&production.text())
    }

    /// Indices (into [`Grammar::productions`]) of the productions for `lhs`, in declaration order.
    pub fn rules_for(&self, lhs: &str) -> &[usize] {
        self.by_lhs.get(lhs).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_nonterminal(&self, symbol: &str) -> bool {
        self.by_lhs.contains_key(symbol)
    }

    /// Every production of `self` is also in `other`.
    pub fn is_subset_of(&self, other: &Grammar) -> bool {
        self.keys.is_subset(&other.keys)
    }

    /// Render back to the text format: directives first, then productions sorted by text.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        if !self.goal.is_empty() {
            out.push_str(&format!("%goal {}\n", self.goal));
        }
        for tag in [Tag::Collect, Tag::Optional, Tag::Singleton] {
            let symbols: Vec<&str> = self
                .tags
                .iter()
                .filter(|(_, tags)| tags.contains(tag.as_str()))
                .map(|(sym, _)| sym.as_str())
                .collect();
            if !symbols.is_empty() {
                out.push_str(&format!("%{} {}\n", tag.as_str(), symbols.join(" ")));
            }
        }
        for key in &self.keys {
            out.push_str(key);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "
        # statements
        %collect stmts
        %optional stmts_opt
        code ::= stmts
        stmts ::= stmts stmt
        stmts ::= stmt
        stmts_opt ::= stmts
        stmts_opt ::=
        stmt ::= expr POP_TOP
    ";

    #[test]
    fn test_first_lhs_is_default_goal() {
        let g = Grammar::from_text(SAMPLE).unwrap();
        assert_eq!(g.goal(), "code");
        assert_eq!(g.len(), 6);
        assert!(g.has_tag("stmts", Tag::Collect));
        assert!(g.is_nonterminal("stmt"));
        assert!(!g.is_nonterminal("POP_TOP"));
    }

    #[test]
    fn test_empty_production() {
        let g = Grammar::from_text(SAMPLE).unwrap();
        let empty = g.rules_for("stmts_opt").iter().find(|&&i| g.productions()[i].rhs.is_empty());
        assert!(empty.is_some());
        assert!(g.to_text().contains("stmts_opt ::=\n"));
    }

    #[test]
    fn test_add_rule_is_idempotent() {
        let mut g = Grammar::from_text(SAMPLE).unwrap();
        assert!(g.add_rule(Production::new("stmt", ["BREAK_LOOP"])));
        assert!(!g.add_rule(Production::new("stmt", ["BREAK_LOOP"])));
        assert_eq!(g.len(), 7);
    }

    #[test]
    fn test_to_text_round_trips() {
        let g = Grammar::from_text(SAMPLE).unwrap();
        let again = Grammar::from_text(&g.to_text()).unwrap();
        assert_eq!(again.to_text(), g.to_text());
    }

    #[test]
    fn test_malformed_lines_are_reported() {
        let err = Grammar::from_text("code ::= stmts\nnot a rule").unwrap_err();
        assert_eq!(err.line, 2);
        let err = Grammar::from_text("%frobnicate x").unwrap_err();
        assert!(err.message.contains("unknown tag"), "{}", err.message);
    }

    #[test]
    fn test_goal_directive_overrides_first_lhs() {
        let g = Grammar::from_text("%goal start\nexpr ::= LOAD_CONST\nstart ::= expr").unwrap();
        assert_eq!(g.goal(), "start");
    }
}
