//! Reduce checks: predicates that veto a completed production over a given token range.
//!
//! The grammar alone cannot tell an `if` whose body ends in an inner `if` from one that owns both trailing merge
//! tokens, or a `try/except` from a `try/except/else`. A [`ReduceCheck`] looks at the token range a completed
//! production covers and rejects readings whose merge tokens do not pair up with the jumps inside that range.
//!
//! ## Notes
//! - Checks are plain functions of [`ReduceContext`]: no state, same answer for the same range every time.
//! - They only read token kinds, offsets and jump/merge attributes inside `[first, last)`. Because the answer
//!   depends on the range and not on how the children were split, the parser can run them once per completed item.
//! - The central notion is the *exits* of a range: forward jumps inside it whose merge token is not inside it.

use std::collections::HashMap;

use crate::grammar::Production;
use crate::token::Token;

/// Signature of a reduce check. `false` discards the candidate reduction.
pub type ReduceCheck = fn(&ReduceContext<'_>) -> bool;

/// Everything a check may look at.
#[derive(Debug, Clone, Copy)]
pub struct ReduceContext<'a> {
    pub production: &'a Production,
    pub tokens: &'a [Token],
    /// Index of the first token covered by the reduction.
    pub first: usize,
    /// One past the last covered token.
    pub last: usize,
}

impl<'a> ReduceContext<'a> {
    pub fn new(production: &'a Production, tokens: &'a [Token], first: usize, last: usize) -> Self {
        Self {
            production,
            tokens,
            first,
            last,
        }
    }

    fn kind(&self, idx: usize) -> &str {
        &self.tokens[idx].kind
    }

    /// Index of the real token at byte `offset`, if it lies in `[from, to)`.
    fn index_of(&self, offset: u32, from: usize, to: usize) -> Option<usize> {
        (from..to).find(|&i| {
            let t = &self.tokens[i];
            !t.is_synthetic() && t.offset.offset == offset
        })
    }

    /// Sorted sources of the merge tokens in `[from, to)`.
    fn merge_sources(&self, from: usize, to: usize) -> Vec<u32> {
        let mut sources: Vec<u32> = self.tokens[from..to].iter().filter_map(Token::come_from).collect();
        sources.sort_unstable();
        sources
    }

    /// Start of the run of merge tokens that ends the range.
    fn trailing_merges_start(&self) -> usize {
        let mut i = self.last;
        while i > self.first && self.tokens[i - 1].is_merge() {
            i -= 1;
        }
        i
    }
}

/// Forward jumps in `tokens[from..to]` whose merge token is not in the same range, sorted by offset.
pub fn exits(tokens: &[Token], from: usize, to: usize) -> Vec<u32> {
    let range = &tokens[from..to];
    let mut out: Vec<u32> = range
        .iter()
        .filter(|t| !t.is_synthetic())
        .filter(|t| t.jump_target().is_some_and(|target| target > t.offset.offset))
        .map(|t| t.offset.offset)
        .filter(|&src| !range.iter().any(|m| m.come_from() == Some(src)))
        .collect();
    out.sort_unstable();
    out
}

/// Registry of reduce checks keyed by left-hand side.
#[derive(Debug, Clone, Default)]
pub struct ReduceChecks {
    checks: HashMap<String, ReduceCheck>,
}

impl ReduceChecks {
    /// A registry with no checks: every grammatical reduction is accepted.
    pub fn new() -> Self {
        Self::default()
    }

    /// The checks the shipped grammars are written against.
    pub fn standard() -> Self {
        let mut checks = Self::new();
        checks.insert("ifstmt", trailing_merges_close_exits);
        checks.insert("and", trailing_merges_close_exits);
        checks.insert("or", trailing_merges_close_exits);
        checks.insert("ifelsestmt", else_arm_closes_test);
        checks.insert("ifexp", else_arm_closes_test);
        checks.insert("testexpr_or", or_merge_from_true_jump);
        checks.insert("compare_chained", chained_compare_merges);
        checks.insert("whilestmt", while_exit_closes_test);
        checks.insert("whileelsestmt", while_exit_closes_test);
        checks.insert("while1stmt", loop_exit_from_setup);
        checks.insert("forstmt", loop_exit_from_setup);
        checks.insert("forelsestmt", loop_exit_from_setup);
        checks.insert("trystmt", try_jump_merges_at_end);
        checks.insert("tryelsestmt", try_jump_merges_before_else);
        checks.insert("except_clause", except_merge_from_type_test);
        checks
    }

    pub fn insert(&mut self, lhs: impl Into<String>, check: ReduceCheck) {
        self.checks.insert(lhs.into(), check);
    }

    pub fn get(&self, lhs: &str) -> Option<ReduceCheck> {
        self.checks.get(lhs).copied()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Run the check registered for the production's left-hand side; `true` if there is none.
    pub fn accepts(&self, ctx: &ReduceContext<'_>) -> bool {
        self.checks.get(&ctx.production.lhs).is_none_or(|check| check(ctx))
    }
}

// ============================================================================
// Checks
// ============================================================================

/// The trailing `COME_FROM`s of the production are exactly the exits of everything before them.
fn trailing_merges_close_exits(ctx: &ReduceContext<'_>) -> bool {
    let n = ctx.production.rhs.iter().rev().take_while(|s| *s == "COME_FROM").count();
    if n == 0 || ctx.last < ctx.first + n {
        return false;
    }
    let split = ctx.last - n;
    ctx.merge_sources(split, ctx.last) == exits(ctx.tokens, ctx.first, split)
}

/// `if ... else` shape: the final merge comes from the unconditional jump closing the first arm, and the merges
/// right after that jump close the test.
fn else_arm_closes_test(ctx: &ReduceContext<'_>) -> bool {
    if ctx.last < ctx.first + 3 {
        return false;
    }
    let Some(src) = ctx.tokens[ctx.last - 1].come_from() else {
        return false;
    };
    let Some(k) = ctx.index_of(src, ctx.first, ctx.last - 1) else {
        return false;
    };
    if !matches!(ctx.kind(k), "JUMP_FORWARD" | "JUMP_ABSOLUTE") {
        return false;
    }
    let mut arm = k + 1;
    while arm < ctx.last - 1 && ctx.tokens[arm].is_merge() {
        arm += 1;
    }
    let opening = ctx.merge_sources(k + 1, arm);
    !opening.is_empty()
        && opening == exits(ctx.tokens, ctx.first, k)
        && exits(ctx.tokens, arm, ctx.last - 1).is_empty()
}

/// `a or b` as a test: the merge after the final jump comes from the jump-if-true of the left operand.
fn or_merge_from_true_jump(ctx: &ReduceContext<'_>) -> bool {
    if ctx.last < ctx.first + 3 {
        return false;
    }
    let Some(src) = ctx.tokens[ctx.last - 1].come_from() else {
        return false;
    };
    let split = ctx.last - 2;
    ctx.index_of(src, ctx.first, split)
        .is_some_and(|k| ctx.kind(k) == "POP_JUMP_IF_TRUE")
        && exits(ctx.tokens, ctx.first, split) == [src]
}

/// `a < b < c`: the first merge closes the short-circuit jump, the last one closes the jump over the cleanup.
fn chained_compare_merges(ctx: &ReduceContext<'_>) -> bool {
    if ctx.last < ctx.first + 6 {
        return false;
    }
    let over = &ctx.tokens[ctx.last - 5];
    let (Some(short), Some(end)) = (ctx.tokens[ctx.last - 4].come_from(), ctx.tokens[ctx.last - 1].come_from())
    else {
        return false;
    };
    end == over.offset.offset && exits(ctx.tokens, ctx.first, ctx.last - 5) == [short]
}

/// The loop's final merge is the one its own setup instruction produced.
fn loop_exit_from_setup(ctx: &ReduceContext<'_>) -> bool {
    let setup = &ctx.tokens[ctx.first];
    ctx.last > ctx.first + 1
        && ctx.kind(ctx.last - 1) == "COME_FROM_LOOP"
        && ctx.tokens[ctx.last - 1].come_from() == Some(setup.offset.offset)
}

/// `while test:`: the merges after the back-edge close exactly the exits of the test and the body.
fn while_exit_closes_test(ctx: &ReduceContext<'_>) -> bool {
    if !loop_exit_from_setup(ctx) || ctx.first + 2 >= ctx.last {
        return false;
    }
    let head = ctx.tokens[ctx.first + 1].offset.offset;
    let Some(back) = (ctx.first + 1..ctx.last)
        .rev()
        .find(|&i| ctx.kind(i) == "JUMP_BACK" && ctx.tokens[i].jump_target() == Some(head))
    else {
        return false;
    };
    let mut end = back + 1;
    while end < ctx.last && ctx.tokens[end].is_merge() {
        end += 1;
    }
    let closing = ctx.merge_sources(back + 1, end);
    !closing.is_empty() && closing == exits(ctx.tokens, ctx.first + 1, back)
}

/// Index of the `COME_FROM_EXCEPT` opened by the setup at `first`, and the jump that leaves the protected body.
fn protected_body_exit(ctx: &ReduceContext<'_>) -> Option<(usize, u32)> {
    let setup = ctx.tokens[ctx.first].offset.offset;
    let handler = (ctx.first + 1..ctx.last)
        .find(|&i| ctx.kind(i) == "COME_FROM_EXCEPT" && ctx.tokens[i].come_from() == Some(setup))?;
    let jump = &ctx.tokens[handler.checked_sub(1)?];
    jump.jump_target()?;
    Some((handler, jump.offset.offset))
}

/// `try/except` without `else`: the protected body's jump merges with the handlers' jumps after the handlers.
fn try_jump_merges_at_end(ctx: &ReduceContext<'_>) -> bool {
    let Some((_, jump)) = protected_body_exit(ctx) else {
        return false;
    };
    ctx.merge_sources(ctx.trailing_merges_start(), ctx.last).contains(&jump)
}

/// `try/except/else`: the protected body's jump lands right after the handler chain's `END_FINALLY`.
fn try_jump_merges_before_else(ctx: &ReduceContext<'_>) -> bool {
    let Some((handler, jump)) = protected_body_exit(ctx) else {
        return false;
    };
    let tail = ctx.trailing_merges_start();
    (handler + 1..tail).any(|i| ctx.tokens[i].come_from() == Some(jump) && ctx.kind(i - 1) == "END_FINALLY")
}

/// A typed `except` clause that ends in a merge: the merge belongs to this clause's exception-match jump.
fn except_merge_from_type_test(ctx: &ReduceContext<'_>) -> bool {
    if ctx.production.rhs.last().map(String::as_str) != Some("COME_FROM") {
        return true;
    }
    let Some(src) = ctx.tokens[ctx.last - 1].come_from() else {
        return false;
    };
    (ctx.first + 1..ctx.last)
        .find(|&i| ctx.kind(i) == "POP_JUMP_IF_FALSE" && ctx.kind(i - 1) == "COMPARE_OP_EXC")
        .is_some_and(|k| ctx.tokens[k].offset.offset == src)
}
