//! Scanner: instructions → parser tokens.
//!
//! The scanner is the only stage that looks at raw jump operands. It
//!
//! 1. decodes the code object,
//! 2. rejects jumps that land between instruction boundaries,
//! 3. runs [`structure::detect`] to get effective jump targets,
//! 4. emits one token per instruction, preceded by one merge token (`COME_FROM*`) per distinct incoming jump, and
//! 5. records which variable-arity opcodes occurred with which operands, so the grammar can be extended on demand.
//!
//! ## Token normalization
//! - Variable-arity opcodes get their operand appended: `CALL_FUNCTION` with operand 2 becomes `CALL_FUNCTION_2`.
//! - `JUMP_ABSOLUTE` whose effective target is not after it becomes `JUMP_BACK`.
//! - `COMPARE_OP` on `exception-match` becomes `COMPARE_OP_EXC`.
//! - `NOP` and folded `EXTENDED_ARG` prefixes produce no token.
//!
//! Merge tokens at one target are ordered by descending source offset and numbered `target_0`, `target_1`, ...

use std::collections::{BTreeMap, BTreeSet};

use unpyc_core::dialects::{self, DialectInfo};
use unpyc_core::{DialectId, OpcodeId};

use crate::code::CodeObject;
use crate::diagnostics::DecodeError;
use crate::instruction::{self, Argument, Instruction};
use crate::structure::{self, Structure};
use crate::token::{Token, TokenOffset};

/// Which variable-arity opcodes occurred, and with which operand values.
///
/// Keys are base opcode names (`CALL_FUNCTION`); values are the distinct operands seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArityUsageMap {
    entries: BTreeMap<String, BTreeSet<u32>>,
}

impl ArityUsageMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, base: impl Into<String>, operand: u32) {
        self.entries.entry(base.into()).or_default().insert(operand);
    }

    /// Merge another map into this one.
    pub fn union(&mut self, other: &ArityUsageMap) {
        for (base, operands) in &other.entries {
            self.entries.entry(base.clone()).or_default().extend(operands);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeSet::len).sum()
    }

    /// `(base, operand)` pairs in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries
            .iter()
            .flat_map(|(base, ops)| ops.iter().map(move |&op| (base.as_str(), op)))
    }

    pub fn contains(&self, base: &str, operand: u32) -> bool {
        self.entries.get(base).is_some_and(|ops| ops.contains(&operand))
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for ArityUsageMap {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        let mut map = ArityUsageMap::new();
        for (base, operand) in iter {
            map.record(base, operand);
        }
        map
    }
}

/// Scanner output for one code object.
#[derive(Debug, Clone)]
pub struct Scanned {
    pub dialect: DialectId,
    pub tokens: Vec<Token>,
    pub customize: ArityUsageMap,
    pub structure: Structure,
}

/// Scan a code object into tokens.
///
/// ## Errors
/// - Any [`DecodeError`] from decoding.
/// - [`DecodeError::IllegalJumpTarget`] if a jump lands on an offset that is not an instruction boundary.
#[tracing::instrument(skip_all, fields(name = %code.name, dialect = %code.dialect))]
pub fn scan(code: &CodeObject) -> Result<Scanned, DecodeError> {
    let info = dialects::info_for(code.dialect);
    let insts = instruction::decode(code)?;
    validate_jump_targets(&insts)?;
    let structure = structure::detect(info, &insts);

    let mut tokens = Vec::with_capacity(insts.len());
    let mut customize = ArityUsageMap::new();
    for inst in &insts {
        let mut sources = structure.incoming(inst.offset()).to_vec();
        sources.sort_unstable_by(|a, b| b.cmp(a));
        for (slot, source) in (0u32..).zip(sources) {
            let offset = TokenOffset::synthetic(inst.offset(), slot);
            tokens.push(Token::merge(structure.merge_flavor(source), offset, source));
        }
        if inst.opcode() == OpcodeId::Nop {
            continue;
        }
        tokens.push(normalize(info, &structure, inst, &mut customize));
    }
    tracing::debug!(tokens = tokens.len(), customized = customize.len(), "scanned");
    Ok(Scanned {
        dialect: code.dialect,
        tokens,
        customize,
        structure,
    })
}

fn validate_jump_targets(insts: &[Instruction]) -> Result<(), DecodeError> {
    let offsets: BTreeSet<u32> = insts.iter().map(Instruction::offset).collect();
    for inst in insts {
        if let Some(target) = inst.jump_target() {
            if !offsets.contains(&target) {
                return Err(DecodeError::IllegalJumpTarget {
                    offset: inst.offset(),
                    target,
                });
            }
        }
    }
    Ok(())
}

fn normalize(
    info: &'static DialectInfo,
    structure: &Structure,
    inst: &Instruction,
    customize: &mut ArityUsageMap,
) -> Token {
    let name = inst.name();
    let mut attr = inst.argument().clone();
    let kind = if let Some(target) = structure.effective_target(inst) {
        attr = Argument::Jump(target);
        if inst.opcode() == OpcodeId::JumpAbsolute && target <= inst.offset() {
            "JUMP_BACK".to_string()
        } else {
            name.to_string()
        }
    } else if info.arity_rule(inst.opcode()).is_some() {
        let operand = inst.operand().unwrap_or(0);
        customize.record(name, operand);
        format!("{name}_{operand}")
    } else if inst.opcode() == OpcodeId::CompareOp && attr == Argument::Compare("exception-match") {
        "COMPARE_OP_EXC".to_string()
    } else {
        name.to_string()
    };
    Token {
        kind,
        offset: TokenOffset::real(inst.offset()),
        pattr: attr.pattr(),
        attr,
        opcode: Some(inst.opcode()),
        source_line: inst.source_line(),
    }
}
