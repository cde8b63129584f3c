//! Control-flow structure detection.
//!
//! Compiled bytecode has no block markers; loops, conditionals and exception handlers are just jumps. This module
//! makes a single left-to-right pass over the instructions and recovers:
//!
//! - a forest of [`BlockDescriptor`]s (loops, if/else arms, try/except regions, short-circuit tests),
//! - a jump fixup table mapping a jump's offset to its *effective* target when the literal operand is misleading
//!   (jump-to-jump collapsing by the peephole optimizer), and
//! - for every jump target, the distinct offsets of the instructions jumping to it.
//!
//! ## Notes
//! - Every descriptor is clamped into its parent when it is created, so `parent.start <= block.start` and
//!   `block.end <= parent.end` always hold. Later "which block owns this jump" queries rely on that.
//! - Short-circuit descriptors (`and-or`) are leaves: they never become the parent of another descriptor, because an
//!   `or` test legitimately overlaps the statement it guards.
//! - A loop whose back-edge cannot be found is discarded and its region left unstructured. The parser then fails to
//!   reduce that region, which surfaces as a parse error instead of a silent misclassification.
//!
//! ## Dialect fixups
//! The CPython 2.7 and 3.6 peephole optimizers retarget a jump whose destination is itself an unconditional jump.
//! Two consequences are undone here:
//! - a conditional jump (or an `if` arm's closing jump) that was retargeted to the head of the enclosing loop is given
//!   the loop's back-edge as its effective target;
//! - a forward jump that was retargeted past the end of the block it closes is clamped to that block's end.
//!
//! CPython 2.7 also ends every `if` body with a forward jump to the merge point, `else` or not. When an inner `if`
//! ends where its enclosing `if` does, the optimizer sends the inner closing jump past the outer one; it is clamped
//! back to the inner merge point like any other forward jump that overshoots its block.
//!
//! These rules are specific to the optimizer behavior of these dialects and are validated against their compiled
//! output only.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use unpyc_core::{DialectInfo, OpcodeId};

use crate::instruction::{Argument, Instruction};
use crate::token::MergeFlavor;

/// Kind of a recovered block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Root,
    IfThen,
    Else,
    ForLoop,
    ForElse,
    WhileLoop,
    WhileElse,
    While1Loop,
    Try,
    Except,
    TryFinally,
    Finally,
    With,
    AndOr,
}

impl BlockKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Root => "root",
            BlockKind::IfThen => "if-then",
            BlockKind::Else => "else",
            BlockKind::ForLoop => "for-loop",
            BlockKind::ForElse => "for-else",
            BlockKind::WhileLoop => "while-loop",
            BlockKind::WhileElse => "while-else",
            BlockKind::While1Loop => "while1-loop",
            BlockKind::Try => "try",
            BlockKind::Except => "except",
            BlockKind::TryFinally => "try-finally",
            BlockKind::Finally => "finally",
            BlockKind::With => "with",
            BlockKind::AndOr => "and-or",
        }
    }

    pub fn is_loop(self) -> bool {
        matches!(self, BlockKind::ForLoop | BlockKind::WhileLoop | BlockKind::While1Loop)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recovered block: a half-open byte range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDescriptor {
    pub kind: BlockKind,
    pub start: u32,
    pub end: u32,
    /// Index of the enclosing block; `None` only for the root.
    pub parent: Option<usize>,
}

impl BlockDescriptor {
    pub fn contains(&self, offset: u32) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// Result of structure detection for one code object.
#[derive(Debug, Clone, Default)]
pub struct Structure {
    /// All descriptors; index 0 is the root.
    pub blocks: Vec<BlockDescriptor>,
    /// Jump offset → effective target, only where it differs from the literal operand.
    pub fixups: BTreeMap<u32, u32>,
    /// Jump target → ascending distinct offsets of the jumps that reach it (by effective target).
    pub incoming: BTreeMap<u32, Vec<u32>>,
    /// Setup instruction offset → the descriptor it opened.
    owners: BTreeMap<u32, usize>,
}

impl Structure {
    /// Effective target of a jump instruction (the fixup if any, otherwise the literal operand).
    pub fn effective_target(&self, inst: &Instruction) -> Option<u32> {
        inst.jump_target()
            .map(|target| self.fixups.get(&inst.offset()).copied().unwrap_or(target))
    }

    /// Offsets of the jumps whose effective target is `target`.
    pub fn incoming(&self, target: u32) -> &[u32] {
        self.incoming.get(&target).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Flavor of the merge point created by the jump at `source`, decided by the block that jump opened.
    pub fn merge_flavor(&self, source: u32) -> MergeFlavor {
        match self.owners.get(&source).map(|&idx| self.blocks[idx].kind) {
            Some(kind) if kind.is_loop() => MergeFlavor::LoopExit,
            Some(BlockKind::Try) => MergeFlavor::Except,
            Some(BlockKind::TryFinally) => MergeFlavor::Finally,
            Some(BlockKind::With) => MergeFlavor::With,
            _ => MergeFlavor::Plain,
        }
    }

    pub fn blocks_of_kind(&self, kind: BlockKind) -> impl Iterator<Item = &BlockDescriptor> {
        self.blocks.iter().filter(move |b| b.kind == kind)
    }
}

/// Bookkeeping for a recognized loop.
#[derive(Debug, Clone, Copy)]
struct LoopInfo {
    block: usize,
    head: u32,
    back_edge: u32,
}

struct Detector<'a> {
    info: &'static DialectInfo,
    insts: &'a [Instruction],
    index: HashMap<u32, usize>,
    blocks: Vec<BlockDescriptor>,
    loops: Vec<LoopInfo>,
    effective: BTreeMap<u32, u32>,
    loop_tests: BTreeSet<u32>,
    owners: BTreeMap<u32, usize>,
}

/// Run structure detection over a decoded instruction sequence.
///
/// ## Notes
/// - Literal jump targets are expected to be legal instruction offsets (the scanner validates this first).
#[tracing::instrument(skip_all, fields(dialect = %info.id, instructions = insts.len()))]
pub fn detect(info: &'static DialectInfo, insts: &[Instruction]) -> Structure {
    let code_len = insts.last().map(Instruction::next_offset).unwrap_or(0);
    let mut detector = Detector {
        info,
        insts,
        index: insts.iter().enumerate().map(|(i, inst)| (inst.offset(), i)).collect(),
        blocks: vec![BlockDescriptor {
            kind: BlockKind::Root,
            start: 0,
            end: code_len,
            parent: None,
        }],
        loops: Vec::new(),
        effective: BTreeMap::new(),
        loop_tests: BTreeSet::new(),
        owners: BTreeMap::new(),
    };
    detector.run();
    detector.finish()
}

impl<'a> Detector<'a> {
    fn run(&mut self) {
        let insts = self.insts;
        for i in 0..insts.len() {
            let inst = &insts[i];
            let op = inst.opcode();
            if self.info.is_loop_setup(op) {
                self.detect_loop(i);
            } else if self.info.is_except_setup(op) {
                self.detect_try_except(i);
            } else if self.info.is_finally_setup(op) {
                self.detect_try_finally(i);
            } else if self.info.is_with_setup(op) {
                self.detect_with(i);
            } else if self.info.is_pop_jump(op) {
                self.detect_condition(i);
            } else if self.info.is_keep_jump(op) {
                self.detect_short_circuit(i);
            }
            if let Some(target) = inst.jump_target() {
                self.effective.entry(inst.offset()).or_insert(target);
            }
        }
    }

    fn finish(self) -> Structure {
        let mut fixups = BTreeMap::new();
        let mut incoming: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
        for inst in self.insts {
            let Some(literal) = inst.jump_target() else {
                continue;
            };
            let effective = self.effective.get(&inst.offset()).copied().unwrap_or(literal);
            if effective != literal {
                tracing::debug!(offset = inst.offset(), literal, effective, "jump fixup");
                fixups.insert(inst.offset(), effective);
            }
            incoming.entry(effective).or_default().push(inst.offset());
        }
        Structure {
            blocks: self.blocks,
            fixups,
            incoming,
            owners: self.owners,
        }
    }

    // ========================================================================
    // Block bookkeeping
    // ========================================================================

    /// Innermost non-`and-or` block containing `offset`.
    fn parent_of(&self, offset: u32) -> usize {
        let mut best = 0;
        for (i, block) in self.blocks.iter().enumerate().skip(1) {
            if block.kind == BlockKind::AndOr || !block.contains(offset) {
                continue;
            }
            let current = &self.blocks[best];
            if block.start > current.start || (block.start == current.start && block.end <= current.end) {
                best = i;
            }
        }
        best
    }

    /// Clamp `[start, end)` into `parent` and record it. Empty blocks are not recorded.
    fn push_block(&mut self, kind: BlockKind, start: u32, end: u32, parent: usize) -> Option<usize> {
        let bounds = self.blocks[parent];
        let start = start.max(bounds.start);
        let end = end.min(bounds.end);
        if start >= end {
            return None;
        }
        self.blocks.push(BlockDescriptor {
            kind,
            start,
            end,
            parent: Some(parent),
        });
        tracing::trace!(%kind, start, end, parent, "block");
        Some(self.blocks.len() - 1)
    }

    /// Restrict a forward target to the parent block's end.
    fn restrict_to_parent(&self, target: u32, parent: usize) -> u32 {
        let end = self.blocks[parent].end;
        if target > end && self.index.contains_key(&end) { end } else { target }
    }

    fn innermost_loop(&self, offset: u32) -> Option<LoopInfo> {
        self.loops
            .iter()
            .filter(|l| self.blocks[l.block].contains(offset))
            .max_by_key(|l| self.blocks[l.block].start)
            .copied()
    }

    /// Effective target of a statement-level jump (a test or an `if` arm's closing jump).
    fn statement_jump_target(&self, inst: &Instruction, parent: usize) -> u32 {
        let Some(literal) = inst.jump_target() else {
            return inst.next_offset();
        };
        if literal <= inst.offset() {
            return match self.innermost_loop(inst.offset()) {
                Some(lp) if lp.head == literal && lp.back_edge != inst.offset() => lp.back_edge,
                _ => literal,
            };
        }
        self.restrict_to_parent(literal, parent)
    }

    fn prev_is_exception_match(&self, i: usize) -> bool {
        i > 0
            && self.insts[i - 1].opcode() == OpcodeId::CompareOp
            && self.insts[i - 1].argument() == &Argument::Compare("exception-match")
    }

    // ========================================================================
    // Loops
    // ========================================================================

    fn detect_loop(&mut self, i: usize) {
        let insts = self.insts;
        let setup = &insts[i];
        let Some(literal) = setup.jump_target() else {
            return;
        };
        let parent = self.parent_of(setup.offset());
        let end = self.restrict_to_parent(literal, parent);
        self.effective.insert(setup.offset(), end);
        let body_start = setup.next_offset();

        // The back-edge is the backward jump landing closest to the loop start; the last one wins.
        let mut back: Option<(u32, usize)> = None;
        for (k, inst) in insts.iter().enumerate().skip(i + 1) {
            if inst.offset() >= end {
                break;
            }
            if !self.info.is_unconditional_jump(inst.opcode()) {
                continue;
            }
            let Some(target) = inst.jump_target() else {
                continue;
            };
            if target < body_start || target > inst.offset() {
                continue;
            }
            match back {
                Some((best, _)) if target > best => {}
                _ => back = Some((target, k)),
            }
        }
        let Some((head, k)) = back else {
            tracing::debug!(offset = setup.offset(), end, "loop without back-edge; leaving region unstructured");
            return;
        };
        let Some(&landing_idx) = self.index.get(&head) else {
            return;
        };
        let back_edge = &insts[k];
        let landing = &insts[landing_idx];

        let (kind, else_kind, exit) = if self.info.is_iterator_advance(landing.opcode()) {
            (BlockKind::ForLoop, BlockKind::ForElse, landing.jump_target())
        } else if let Some(test) = self.loop_test(landing_idx, back_edge) {
            self.loop_tests.insert(insts[test].offset());
            (BlockKind::WhileLoop, BlockKind::WhileElse, insts[test].jump_target())
        } else {
            (BlockKind::While1Loop, BlockKind::WhileElse, None)
        };
        tracing::debug!(%kind, setup = setup.offset(), head, back_edge = back_edge.offset(), end, "loop");

        let Some(block) = self.push_block(kind, setup.offset(), back_edge.next_offset(), parent) else {
            return;
        };
        self.owners.insert(setup.offset(), block);
        self.loops.push(LoopInfo {
            block,
            head,
            back_edge: back_edge.offset(),
        });

        // A loop exit landing on POP_BLOCK with code after it before the loop end has an else suffix.
        if let Some(&x) = exit.and_then(|e| self.index.get(&e)) {
            let exit_inst = &insts[x];
            if exit_inst.opcode() == OpcodeId::PopBlock && exit_inst.next_offset() < end {
                self.push_block(else_kind, exit_inst.next_offset(), end, parent);
            }
        }
    }

    /// Index of the loop-exit test jump of a `while` loop, if its head is a re-evaluated test.
    fn loop_test(&self, landing_idx: usize, back_edge: &Instruction) -> Option<usize> {
        for (k, inst) in self.insts.iter().enumerate().skip(landing_idx) {
            if inst.offset() >= back_edge.offset() {
                return None;
            }
            if self.info.is_pop_jump(inst.opcode()) {
                return match inst.jump_target() {
                    Some(target) if target >= back_edge.next_offset() => Some(k),
                    _ => None,
                };
            }
            if self.info.is_statement_terminator(inst.opcode()) || self.info.is_jump(inst.opcode()) {
                return None;
            }
        }
        None
    }

    // ========================================================================
    // Conditionals
    // ========================================================================

    fn detect_condition(&mut self, i: usize) {
        let insts = self.insts;
        let jump = &insts[i];
        if self.loop_tests.contains(&jump.offset()) || self.prev_is_exception_match(i) {
            return;
        }
        let parent = self.parent_of(jump.offset());
        let target = self.statement_jump_target(jump, parent);
        self.effective.insert(jump.offset(), target);
        if target <= jump.offset() {
            return;
        }

        if self.is_short_circuit(i, target, parent) {
            tracing::trace!(offset = jump.offset(), target, "short-circuit test");
            self.push_block(BlockKind::AndOr, jump.next_offset(), target, parent);
            return;
        }

        if let Some(&ti) = self.index.get(&target) {
            if ti > i + 1 {
                let pre = &insts[ti - 1];
                if self.info.is_unconditional_jump(pre.opcode()) {
                    let else_end = self.statement_jump_target(pre, parent);
                    if else_end > target {
                        self.effective.insert(pre.offset(), else_end);
                        self.push_block(BlockKind::IfThen, jump.offset(), pre.offset(), parent);
                        self.push_block(BlockKind::Else, target, else_end, parent);
                        return;
                    }
                    if else_end == target && self.info.closes_if_bodies {
                        // The arm closes with its own jump to the merge point even without an `else`.
                        self.effective.insert(pre.offset(), target);
                        self.push_block(BlockKind::IfThen, jump.offset(), pre.offset(), parent);
                        return;
                    }
                }
            }
        }
        self.push_block(BlockKind::IfThen, jump.offset(), target, parent);
    }

    /// Whether the conditional jump at `i` is one operand of a short-circuit test.
    ///
    /// The decision is by jump-target equality: the jump shares its target with the next conditional jump of the
    /// same test (`and`), or lands immediately after it (`or`). In dialects that close every `if` body with a jump,
    /// two closing jumps in front of the shared target mean the next test opens an `if` nested in this one instead.
    fn is_short_circuit(&self, i: usize, target: u32, parent: usize) -> bool {
        for inst in &self.insts[i + 1..] {
            if inst.offset() >= target {
                return false;
            }
            let op = inst.opcode();
            if self.info.is_pop_jump(op) {
                if inst.next_offset() == target {
                    return true;
                }
                let sibling = self.statement_jump_target(inst, parent);
                return sibling == target && !(self.info.closes_if_bodies && self.closing_jumps(target, parent) > 1);
            }
            if self.info.is_statement_terminator(op) || self.info.is_keep_jump(op) || self.info.is_setup(op) {
                return false;
            }
        }
        false
    }

    /// Unconditional forward jumps directly in front of `target` that land on it, one per `if` body closing there.
    fn closing_jumps(&self, target: u32, parent: usize) -> usize {
        let Some(&ti) = self.index.get(&target) else {
            return 0;
        };
        self.insts[..ti]
            .iter()
            .rev()
            .take_while(|inst| {
                self.info.is_unconditional_jump(inst.opcode())
                    && inst.jump_target().is_some_and(|t| t > inst.offset())
                    && self.statement_jump_target(inst, parent) == target
            })
            .count()
    }

    fn detect_short_circuit(&mut self, i: usize) {
        let insts = self.insts;
        let jump = &insts[i];
        let Some(literal) = jump.jump_target() else {
            return;
        };
        let parent = self.parent_of(jump.offset());
        let target = self.restrict_to_parent(literal, parent);
        self.effective.insert(jump.offset(), target);
        self.push_block(BlockKind::AndOr, jump.next_offset(), target, parent);
    }

    // ========================================================================
    // Exception handling
    // ========================================================================

    fn detect_try_except(&mut self, i: usize) {
        let insts = self.insts;
        let setup = &insts[i];
        let Some(literal) = setup.jump_target() else {
            return;
        };
        let parent = self.parent_of(setup.offset());
        let handler = self.restrict_to_parent(literal, parent);
        self.effective.insert(setup.offset(), handler);
        if let Some(block) = self.push_block(BlockKind::Try, setup.offset(), handler, parent) {
            self.owners.insert(setup.offset(), block);
        }
        let Some(&hi) = self.index.get(&handler) else {
            return;
        };
        if hi == 0 {
            return;
        }
        // The protected body leaves through an unconditional jump right before the handler.
        let exit = &insts[hi - 1];
        if self.info.is_unconditional_jump(exit.opcode()) {
            let target = self.statement_jump_target(exit, parent);
            self.effective.insert(exit.offset(), target);
        }

        // Each clause runs up to its closing jump; the next clause starts where the type test jumps to.
        let Some(end_finally) = self.matching_end_finally(handler) else {
            return;
        };
        let mut clause_start = hi;
        let mut depth = 0usize;
        for k in hi..end_finally {
            let op = insts[k].opcode();
            if self.info.is_except_setup(op) || self.info.is_finally_setup(op) || self.info.is_with_setup(op) {
                depth += 1;
            } else if op == OpcodeId::EndFinally {
                depth = depth.saturating_sub(1);
            } else if depth == 0 && self.info.is_pop_jump(op) && self.prev_is_exception_match(k) {
                let next = insts[k].jump_target().and_then(|t| self.index.get(&t)).copied();
                if let Some(next) = next.filter(|&n| n > clause_start && n <= end_finally) {
                    self.close_clause(clause_start, next, parent);
                    clause_start = next;
                }
            }
        }
        self.close_clause(clause_start, end_finally, parent);
    }

    /// Record the handler clause `insts[start..next]` and fix up the jump that closes it.
    fn close_clause(&mut self, start: usize, next: usize, parent: usize) {
        let insts = self.insts;
        let mut end = insts[next].offset();
        if next > start + 1 {
            let last = &insts[next - 1];
            if self.info.is_unconditional_jump(last.opcode()) {
                let target = self.statement_jump_target(last, parent);
                self.effective.insert(last.offset(), target);
                end = last.offset();
            }
        }
        self.push_block(BlockKind::Except, insts[start].offset(), end, parent);
    }

    fn detect_try_finally(&mut self, i: usize) {
        let insts = self.insts;
        let setup = &insts[i];
        let Some(literal) = setup.jump_target() else {
            return;
        };
        let parent = self.parent_of(setup.offset());
        let handler = self.restrict_to_parent(literal, parent);
        self.effective.insert(setup.offset(), handler);
        if let Some(block) = self.push_block(BlockKind::TryFinally, setup.offset(), handler, parent) {
            self.owners.insert(setup.offset(), block);
        }
        if let Some(end_finally) = self.matching_end_finally(handler) {
            self.push_block(BlockKind::Finally, handler, insts[end_finally].next_offset(), parent);
        }
    }

    fn detect_with(&mut self, i: usize) {
        let insts = self.insts;
        let setup = &insts[i];
        let Some(literal) = setup.jump_target() else {
            return;
        };
        let parent = self.parent_of(setup.offset());
        let cleanup = self.restrict_to_parent(literal, parent);
        self.effective.insert(setup.offset(), cleanup);
        if let Some(block) = self.push_block(BlockKind::With, setup.offset(), cleanup, parent) {
            self.owners.insert(setup.offset(), block);
        }
    }

    /// Index of the `END_FINALLY` closing the handler that starts at `handler`.
    fn matching_end_finally(&self, handler: u32) -> Option<usize> {
        let start = *self.index.get(&handler)?;
        let mut depth = 0usize;
        for (k, inst) in self.insts.iter().enumerate().skip(start) {
            let op = inst.opcode();
            if self.info.is_except_setup(op) || self.info.is_finally_setup(op) || self.info.is_with_setup(op) {
                depth += 1;
            } else if op == OpcodeId::EndFinally {
                if depth == 0 {
                    return Some(k);
                }
                depth -= 1;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{CodeObject, Constant};
    use crate::instruction::decode;
    use unpyc_core::DialectId;
    use unpyc_core::dialects::info_for;

    // Byte strings below are CPython 2.7.18 `compile(...)` output for the source in the comment above each one.

    fn detect27(code: Vec<u8>) -> (Vec<Instruction>, Structure) {
        let code = CodeObject::new(DialectId::Py27, "<test>", code)
            .with_consts(vec![Constant::Int(1), Constant::Int(2), Constant::None])
            .with_names(["a", "b", "x", "y", "z"]);
        let insts = decode(&code).unwrap();
        let structure = detect(info_for(DialectId::Py27), &insts);
        (insts, structure)
    }

    fn kinds(s: &Structure) -> Vec<(BlockKind, u32, u32)> {
        s.blocks.iter().skip(1).map(|b| (b.kind, b.start, b.end)).collect()
    }

    fn assert_contained(s: &Structure) {
        for block in &s.blocks {
            if let Some(p) = block.parent {
                let parent = &s.blocks[p];
                assert!(parent.start <= block.start && block.end <= parent.end, "{block:?} escapes {parent:?}");
            }
        }
    }

    #[test]
    fn test_if_else_blocks() {
        // if a: x = 1
        // else: x = None
        let (_, s) = detect27(vec![
            101, 0, 0, 114, 15, 0, 100, 0, 0, 90, 2, 0, 110, 6, 0, 100, 2, 0, 90, 2, 0, 100, 2, 0, 83,
        ]);
        assert_eq!(kinds(&s), vec![(BlockKind::IfThen, 3, 12), (BlockKind::Else, 15, 21)]);
        assert_eq!(s.incoming(15), &[3]);
        assert_eq!(s.incoming(21), &[12]);
        assert!(s.fixups.is_empty());
        assert_contained(&s);
    }

    #[test]
    fn test_if_body_closing_jump_ends_the_arm() {
        // if a: x = 1
        let (_, s) = detect27(vec![101, 0, 0, 114, 15, 0, 100, 0, 0, 90, 2, 0, 110, 0, 0, 100, 2, 0, 83]);
        assert_eq!(kinds(&s), vec![(BlockKind::IfThen, 3, 12)]);
        assert_eq!(s.incoming(15), &[3, 12]);
        assert!(s.fixups.is_empty());
    }

    #[test]
    fn test_if_without_closing_jump_in_36() {
        // if a: x = 1
        let code = CodeObject::new(DialectId::Py36, "<test>", vec![101, 0, 114, 8, 100, 0, 90, 1, 100, 1, 83, 0])
            .with_consts(vec![Constant::Int(1), Constant::None])
            .with_names(["a", "x"]);
        let insts = decode(&code).unwrap();
        let s = detect(info_for(DialectId::Py36), &insts);
        assert_eq!(kinds(&s), vec![(BlockKind::IfThen, 2, 8)]);
        assert_eq!(s.incoming(8), &[2]);
    }

    #[test]
    fn test_while_loop_with_test() {
        // while a: x = 1
        let (_, s) = detect27(vec![
            120, 16, 0, 101, 0, 0, 114, 18, 0, 100, 0, 0, 90, 2, 0, 113, 3, 0, 87, 100, 2, 0, 83,
        ]);
        assert_eq!(kinds(&s), vec![(BlockKind::WhileLoop, 0, 18)]);
        assert_eq!(s.merge_flavor(0), MergeFlavor::LoopExit);
        assert_eq!(s.incoming(3), &[15]);
        assert_eq!(s.incoming(19), &[0]);
        assert_contained(&s);
    }

    #[test]
    fn test_while_else_suffix() {
        // while a: z = 1
        // else: y = 2
        let (_, s) = detect27(vec![
            120, 22, 0, 101, 0, 0, 114, 18, 0, 100, 0, 0, 90, 4, 0, 113, 3, 0, 87, 100, 1, 0, 90, 3, 0, 100, 2, 0,
            83,
        ]);
        assert_eq!(kinds(&s), vec![(BlockKind::WhileLoop, 0, 18), (BlockKind::WhileElse, 19, 25)]);
        assert_eq!(s.incoming(18), &[6]);
        assert_eq!(s.incoming(25), &[0]);
        assert_contained(&s);
    }

    #[test]
    fn test_while1_has_no_exit_test() {
        // while 1: x = 1
        let (_, s) = detect27(vec![120, 10, 0, 100, 0, 0, 90, 2, 0, 113, 3, 0, 87, 100, 2, 0, 83]);
        assert_eq!(kinds(&s), vec![(BlockKind::While1Loop, 0, 12)]);
        assert_eq!(s.merge_flavor(0), MergeFlavor::LoopExit);
        assert_eq!(s.incoming(3), &[9]);
        assert_eq!(s.incoming(13), &[0]);
    }

    #[test]
    fn test_while1_with_break_test_in_body() {
        // while 1:
        //     if a: break
        //     x = 1
        let (_, s) = detect27(vec![
            120, 20, 0, 101, 0, 0, 114, 13, 0, 80, 110, 0, 0, 100, 0, 0, 90, 2, 0, 113, 3, 0, 87, 100, 2, 0, 83,
        ]);
        assert_eq!(kinds(&s), vec![(BlockKind::While1Loop, 0, 22), (BlockKind::IfThen, 6, 10)]);
        assert_eq!(s.incoming(13), &[6, 10]);
        assert_contained(&s);
    }

    #[test]
    fn test_for_loop_lands_on_iterator_advance() {
        // for x in y: z = 1
        let (_, s) = detect27(vec![
            120, 20, 0, 101, 3, 0, 68, 93, 12, 0, 90, 2, 0, 100, 0, 0, 90, 4, 0, 113, 7, 0, 87, 100, 2, 0, 83,
        ]);
        assert_eq!(kinds(&s), vec![(BlockKind::ForLoop, 0, 22)]);
        assert_eq!(s.incoming(7), &[19]);
        assert_eq!(s.incoming(22), &[7]);
        assert_contained(&s);
    }

    #[test]
    fn test_for_else_suffix() {
        // for x in y: z = 1
        // else: a = 2
        let (_, s) = detect27(vec![
            120, 26, 0, 101, 3, 0, 68, 93, 12, 0, 90, 2, 0, 100, 0, 0, 90, 4, 0, 113, 7, 0, 87, 100, 1, 0, 90, 0, 0,
            100, 2, 0, 83,
        ]);
        assert_eq!(kinds(&s), vec![(BlockKind::ForLoop, 0, 22), (BlockKind::ForElse, 23, 29)]);
        assert_eq!(s.merge_flavor(0), MergeFlavor::LoopExit);
        assert_eq!(s.incoming(29), &[0]);
        assert_contained(&s);
    }

    #[test]
    fn test_loop_without_back_edge_is_discarded() {
        // SETUP_LOOP +3 with no backward jump in its range.
        let (_, s) = detect27(vec![120, 3, 0, 101, 0, 0, 100, 2, 0, 83]);
        assert!(kinds(&s).is_empty());
        assert_eq!(s.merge_flavor(0), MergeFlavor::Plain);
        assert_eq!(s.incoming(6), &[0]);
    }

    #[test]
    fn test_and_is_classified_by_shared_target() {
        // if a and b: x = 1
        let (_, s) = detect27(vec![
            101, 0, 0, 114, 21, 0, 101, 1, 0, 114, 21, 0, 100, 0, 0, 90, 2, 0, 110, 0, 0, 100, 2, 0, 83,
        ]);
        assert_eq!(kinds(&s), vec![(BlockKind::AndOr, 6, 21), (BlockKind::IfThen, 9, 18)]);
        assert_eq!(s.incoming(21), &[3, 9, 18]);
        assert!(s.fixups.is_empty());
    }

    #[test]
    fn test_or_is_classified_by_landing_after_sibling() {
        // if a or b: x = 1
        let (_, s) = detect27(vec![
            101, 0, 0, 115, 12, 0, 101, 1, 0, 114, 21, 0, 100, 0, 0, 90, 2, 0, 110, 0, 0, 100, 2, 0, 83,
        ]);
        assert_eq!(kinds(&s), vec![(BlockKind::AndOr, 6, 12), (BlockKind::IfThen, 9, 18)]);
        assert_eq!(s.incoming(12), &[3]);
    }

    #[test]
    fn test_nested_if_is_not_an_and() {
        // if a:
        //     if b: x = 1
        let (_, s) = detect27(vec![
            101, 0, 0, 114, 24, 0, 101, 1, 0, 114, 24, 0, 100, 0, 0, 90, 2, 0, 113, 24, 0, 110, 0, 0, 100, 2, 0, 83,
        ]);
        assert_eq!(kinds(&s), vec![(BlockKind::IfThen, 3, 21), (BlockKind::IfThen, 9, 18)]);
        assert_eq!(s.fixups.get(&9), Some(&21));
        assert_eq!(s.fixups.get(&18), Some(&21));
        assert_eq!(s.incoming(21), &[9, 18]);
        assert_eq!(s.incoming(24), &[3, 21]);
        assert_contained(&s);
    }

    #[test]
    fn test_nested_if_in_then_arm_is_clamped_to_the_arm() {
        // if a:
        //     if b: x = 1
        // else: y = 2
        let (_, s) = detect27(vec![
            101, 0, 0, 114, 24, 0, 101, 1, 0, 114, 30, 0, 100, 0, 0, 90, 2, 0, 113, 30, 0, 110, 6, 0, 100, 1, 0, 90,
            3, 0, 100, 2, 0, 83,
        ]);
        assert_eq!(
            kinds(&s),
            vec![(BlockKind::IfThen, 3, 21), (BlockKind::Else, 24, 30), (BlockKind::IfThen, 9, 18)]
        );
        assert_eq!(s.blocks[3].parent, Some(1));
        // Both inner jumps were sent to 30 by the optimizer; they belong to the merge point in front of the outer jump.
        assert_eq!(s.fixups.get(&9), Some(&21));
        assert_eq!(s.fixups.get(&18), Some(&21));
        assert_eq!(s.incoming(21), &[9, 18]);
        assert_eq!(s.incoming(30), &[21]);
        assert_contained(&s);
    }

    #[test]
    fn test_if_in_else_arm_stays_inside_it() {
        // if a: x = 1
        // elif b: y = 2
        let (_, s) = detect27(vec![
            101, 0, 0, 114, 15, 0, 100, 0, 0, 90, 2, 0, 110, 15, 0, 101, 1, 0, 114, 30, 0, 100, 1, 0, 90, 3, 0, 110,
            0, 0, 100, 2, 0, 83,
        ]);
        assert_eq!(
            kinds(&s),
            vec![(BlockKind::IfThen, 3, 12), (BlockKind::Else, 15, 30), (BlockKind::IfThen, 18, 27)]
        );
        assert_eq!(s.blocks[3].parent, Some(2));
        assert_eq!(s.incoming(30), &[12, 18, 27]);
        assert_contained(&s);
    }

    #[test]
    fn test_collapsed_jump_to_loop_head_is_fixed_up() {
        // while a:
        //     if b: x = 1
        let (_, s) = detect27(vec![
            120, 25, 0, 101, 0, 0, 114, 27, 0, 101, 1, 0, 114, 3, 0, 100, 0, 0, 90, 2, 0, 113, 3, 0, 113, 3, 0, 87,
            100, 2, 0, 83,
        ]);
        assert_eq!(s.fixups.get(&12), Some(&24));
        assert_eq!(s.fixups.get(&21), Some(&24));
        assert_eq!(s.incoming(24), &[12, 21]);
        assert_eq!(s.incoming(3), &[24]);
        assert_eq!(kinds(&s), vec![(BlockKind::WhileLoop, 0, 27), (BlockKind::IfThen, 12, 21)]);
        assert_contained(&s);
    }

    #[test]
    fn test_try_except_descriptors() {
        // try: x = 1
        // except a: y = 2
        let (_, s) = detect27(vec![
            121, 10, 0, 100, 0, 0, 90, 2, 0, 87, 110, 23, 0, 4, 101, 0, 0, 107, 10, 0, 114, 35, 0, 1, 1, 1, 100, 1,
            0, 90, 3, 0, 110, 1, 0, 88, 100, 2, 0, 83,
        ]);
        assert_eq!(kinds(&s), vec![(BlockKind::Try, 0, 13), (BlockKind::Except, 13, 32)]);
        assert_eq!(s.merge_flavor(0), MergeFlavor::Except);
        assert_eq!(s.incoming(13), &[0]);
        assert_eq!(s.incoming(35), &[20]);
        assert_eq!(s.incoming(36), &[10, 32]);
        assert_contained(&s);
    }

    #[test]
    fn test_try_finally_descriptors() {
        // try: x = 1
        // finally: y = 2
        let (_, s) = detect27(vec![
            122, 10, 0, 100, 0, 0, 90, 2, 0, 87, 100, 2, 0, 100, 1, 0, 90, 3, 0, 88, 100, 2, 0, 83,
        ]);
        assert_eq!(kinds(&s), vec![(BlockKind::TryFinally, 0, 13), (BlockKind::Finally, 13, 20)]);
        assert_eq!(s.merge_flavor(0), MergeFlavor::Finally);
        assert_eq!(s.incoming(13), &[0]);
    }

    #[test]
    fn test_with_descriptor() {
        // with a as b: x = 1
        let (_, s) = detect27(vec![
            101, 0, 0, 143, 13, 0, 90, 1, 0, 100, 0, 0, 90, 2, 0, 87, 100, 2, 0, 81, 88, 100, 2, 0, 83,
        ]);
        assert_eq!(kinds(&s), vec![(BlockKind::With, 3, 19)]);
        assert_eq!(s.merge_flavor(3), MergeFlavor::With);
        assert_eq!(s.incoming(19), &[3]);
    }
}
