//! Per-dialect base grammars.

use std::collections::BTreeMap;

use unpyc_core::DialectId;

use super::{rules, Grammar, RuleSynthesizer};
use crate::diagnostics::GrammarError;

/// Read-only store of the base grammar for every dialect.
///
/// ## Notes
/// - Built once; afterwards it is only read, so one repository can back any number of concurrent sessions.
#[derive(Debug, Clone)]
pub struct GrammarRepository {
    grammars: BTreeMap<DialectId, Grammar>,
}

impl GrammarRepository {
    /// Build the base grammars of all supported dialects from their rule tables.
    ///
    /// ## Errors
    /// - [`GrammarError`] if a rule table is malformed.
    pub fn new() -> Result<Self, GrammarError> {
        let mut grammars = BTreeMap::new();
        for &dialect in DialectId::ALL {
            let mut grammar = Grammar::from_text(rules::COMMON)?;
            grammar.extend_from_text(rules::dialect_rules(dialect))?;
            tracing::debug!(%dialect, productions = grammar.len(), "base grammar");
            grammars.insert(dialect, grammar);
        }
        Ok(Self { grammars })
    }

    /// Build a repository from explicit grammars, e.g. for tests with a reduced rule set.
    pub fn from_grammars(grammars: impl IntoIterator<Item = (DialectId, Grammar)>) -> Self {
        Self {
            grammars: grammars.into_iter().collect(),
        }
    }

    /// Base grammar for `dialect`; an empty grammar if the repository has none.
    pub fn base(&self, dialect: DialectId) -> &Grammar {
        static EMPTY: Grammar = Grammar {
            goal: String::new(),
            productions: Vec::new(),
            keys: std::collections::BTreeSet::new(),
            by_lhs: BTreeMap::new(),
            tags: BTreeMap::new(),
        };
        self.grammars.get(&dialect).unwrap_or(&EMPTY)
    }

    /// Start a synthesis session for one code object.
    pub fn session(&self, dialect: DialectId) -> RuleSynthesizer {
        RuleSynthesizer::new(dialect, self.base(dialect))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Tag;

    #[test]
    fn test_base_grammars_parse() {
        let repo = GrammarRepository::new().unwrap();
        for &dialect in DialectId::ALL {
            let g = repo.base(dialect);
            assert_eq!(g.goal(), "code");
            assert!(g.has_tag("stmts", Tag::Collect));
            assert!(g.has_tag("stmts_opt", Tag::Optional));
            assert!(g.has_tag("stmt", Tag::Singleton));
        }
    }

    #[test]
    fn test_dialect_specific_rules() {
        let repo = GrammarRepository::new().unwrap();
        let py27 = repo.base(DialectId::Py27).to_text();
        let py36 = repo.base(DialectId::Py36).to_text();
        assert!(py27.contains("WITH_CLEANUP END_FINALLY"));
        assert!(py36.contains("WITH_CLEANUP_START WITH_CLEANUP_FINISH END_FINALLY"));
        assert!(py27.contains("PRINT_ITEM"));
        assert!(!py36.contains("PRINT_ITEM"));
    }

    #[test]
    fn test_missing_dialect_yields_empty_grammar() {
        let repo = GrammarRepository::from_grammars([]);
        assert!(repo.base(DialectId::Py36).is_empty());
    }
}
