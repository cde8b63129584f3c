//! Rule synthesis for variable-arity opcodes.
//!
//! The base grammar cannot list `call ::= expr expr*n CALL_FUNCTION_n` for every `n`. Instead the scanner records
//! which operands actually occurred ([`ArityUsageMap`]) and a [`RuleSynthesizer`] adds exactly those productions.
//!
//! ## Notes
//! - A synthesizer is a per-session object: it owns its extended grammar and its seen-set. Two sessions never share
//!   state, so code objects can be parsed concurrently against the same [`GrammarRepository`](super::GrammarRepository).
//! - An `(opcode, operand)` pair whose suffixed terminal already appears in a base production for the same
//!   left-hand side is considered covered and produces nothing.
//! - Unknown opcode names produce nothing; the resulting parse failure is the error.
//! - So do operands asking for more than [`MAX_SYNTHESIZED_OPERANDS`] stack items. A hostile `EXTENDED_ARG` can
//!   encode billions; no production is built and the token stays unmatched.

use std::collections::BTreeSet;

use unpyc_core::arity::ArityRule;
use unpyc_core::dialects::{self, DialectInfo};
use unpyc_core::DialectId;

use super::{Grammar, Production};
use crate::scanner::ArityUsageMap;

/// Most stack items a synthesized production may consume.
pub const MAX_SYNTHESIZED_OPERANDS: usize = 1 << 16;

/// Per-session grammar extender.
#[derive(Debug, Clone)]
pub struct RuleSynthesizer {
    info: &'static DialectInfo,
    base: Grammar,
    grammar: Grammar,
    seen: BTreeSet<String>,
    synthesized: Vec<Production>,
}

impl RuleSynthesizer {
    /// Start a session over a copy of `base`.
    pub fn new(dialect: DialectId, base: &Grammar) -> Self {
        Self {
            info: dialects::info_for(dialect),
            base: base.clone(),
            grammar: base.clone(),
            seen: BTreeSet::new(),
            synthesized: Vec::new(),
        }
    }

    /// Add productions for every `(opcode, operand)` pair in `usage` and return the extended grammar.
    ///
    /// ## Notes
    /// - Idempotent: calling it again with the same (or a smaller) map adds nothing.
    /// - Monotone: the result for a larger map contains the result for a smaller one.
    pub fn extend(&mut self, usage: &ArityUsageMap) -> &Grammar {
        for (base, operand) in usage.iter() {
            let Some(rule) = self.info.arity_rule_by_name(base) else {
                tracing::trace!(base, operand, "no arity rule; skipping");
                continue;
            };
            let Some(production) = synthesize(rule, base, operand) else {
                tracing::trace!(base, operand, "operand count over the synthesis limit; skipping");
                continue;
            };
            let key = production.text();
            if self.seen.contains(&key) {
                continue;
            }
            self.seen.insert(key);
            if self.is_covered(&production) {
                continue;
            }
            if self.grammar.add_rule(production.clone()) {
                tracing::trace!(rule = %production, "synthesized");
                self.synthesized.push(production);
            }
        }
        &self.grammar
    }

    /// The current extended grammar.
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Productions added by this session, in insertion order.
    pub fn synthesized(&self) -> &[Production] {
        &self.synthesized
    }

    fn is_covered(&self, production: &Production) -> bool {
        let Some(terminal) = production.rhs.iter().find(|sym| self.info.arity_rule_by_name(base_name(sym)).is_some())
        else {
            return false;
        };
        self.base
            .rules_for(&production.lhs)
            .iter()
            .any(|&i| self.base.productions()[i].rhs.contains(terminal))
    }
}

/// Strip a trailing `_<digits>` suffix: `CALL_FUNCTION_3` → `CALL_FUNCTION`.
fn base_name(symbol: &str) -> &str {
    match symbol.rsplit_once('_') {
        Some((base, digits)) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => base,
        _ => symbol,
    }
}

/// Build the production for one observed operand.
///
/// ## Examples
/// - 2.7 `CALL_FUNCTION` with operand `0x0102` → `call ::= expr expr expr kwarg CALL_FUNCTION_258`
/// - `UNPACK_SEQUENCE 2` → `unpack ::= UNPACK_SEQUENCE_2 store store`
///
/// ## Returns
/// - `None` if the operand asks for more than [`MAX_SYNTHESIZED_OPERANDS`] items.
pub fn synthesize(rule: &ArityRule, base: &str, operand: u32) -> Option<Production> {
    let (positional, keyword) = rule.encoding.operand_counts(operand);
    if positional.saturating_add(keyword) > MAX_SYNTHESIZED_OPERANDS {
        return None;
    }
    let terminal = format!("{base}_{operand}");
    let mut rhs: Vec<String> = rule.prefix.iter().map(|s| s.to_string()).collect();
    if rule.args_after {
        rhs.push(terminal);
        rhs.extend(std::iter::repeat_n(rule.arg.to_string(), positional));
    } else {
        rhs.extend(std::iter::repeat_n(rule.arg.to_string(), positional));
        if let Some(kw) = rule.kw_arg {
            rhs.extend(std::iter::repeat_n(kw.to_string(), keyword));
        }
        rhs.extend(rule.suffix.iter().map(|s| s.to_string()));
        rhs.push(terminal);
    }
    Some(Production::new(rule.lhs, rhs))
}
