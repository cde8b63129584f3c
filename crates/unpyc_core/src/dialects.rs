//! Dialect descriptors.
//!
//! A dialect is one bytecode format version. Instead of one scanner/parser type per version, every stage of the
//! pipeline takes a `&'static DialectInfo` and asks it questions: "what opcode is byte 113?", "is this opcode a
//! relative jump?", "which opcodes open a loop?".
//!
//! ## Notes
//! - Descriptors are `const` tables and therefore trivially shareable across threads.
//! - Magic numbers are the little-endian `u16` at the start of a persisted code file.

use crate::arity::ArityRule;
use crate::opcodes::OpcodeId;
use crate::tables;

/// Stable identifier for every supported dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DialectId {
    /// CPython 2.7.
    Py27,
    /// CPython 3.6.
    Py36,
}

impl DialectId {
    /// All supported dialects.
    pub const ALL: &'static [DialectId] = &[DialectId::Py27, DialectId::Py36];

    /// Resolve a magic number to its dialect.
    pub fn from_magic(magic: u16) -> Option<DialectId> {
        Self::ALL
            .iter()
            .copied()
            .find(|&id| info_for(id).magics.contains(&magic))
    }

    /// Resolve a short name (`py27`, `2.7`, ...) to its dialect.
    pub fn from_name(name: &str) -> Option<DialectId> {
        Self::ALL
            .iter()
            .copied()
            .find(|&id| info_for(id).names.contains(&name))
    }

    pub fn as_str(self) -> &'static str {
        info_for(self).names[0]
    }
}

impl std::fmt::Display for DialectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Instruction width model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// One byte when the opcode is below `have_argument`, otherwise opcode + 16-bit little-endian operand.
    VariableWidth { have_argument: u8 },
    /// Every instruction is opcode + 8-bit operand; the operand is meaningless below `have_argument`.
    Wordcode { have_argument: u8 },
}

/// Everything the decoder, structure detector and scanner need to know about one dialect.
#[derive(Debug)]
pub struct DialectInfo {
    pub id: DialectId,
    pub names: &'static [&'static str],
    pub magics: &'static [u16],
    pub encoding: Encoding,
    /// Byte → opcode lookup.
    pub opcodes: &'static [Option<OpcodeId>; 256],
    /// Jumps whose operand is relative to the next instruction.
    pub jump_relative: &'static [OpcodeId],
    /// Jumps whose operand is an absolute offset.
    pub jump_absolute: &'static [OpcodeId],
    /// Conditional jumps that pop their test (statement-level tests).
    pub pop_jumps: &'static [OpcodeId],
    /// Conditional jumps that leave their value on the stack when taken (`and`/`or`).
    pub keep_jumps: &'static [OpcodeId],
    /// Unconditional transfers (`JUMP_FORWARD`, `JUMP_ABSOLUTE`, `CONTINUE_LOOP`).
    pub unconditional_jumps: &'static [OpcodeId],
    pub loop_setup: &'static [OpcodeId],
    pub except_setup: &'static [OpcodeId],
    pub finally_setup: &'static [OpcodeId],
    pub with_setup: &'static [OpcodeId],
    /// Opcodes whose fall-through is the iterator step of a `for` loop.
    pub iterator_advance: &'static [OpcodeId],
    /// Opcodes after which the value stack is back at statement level.
    pub statement_terminators: &'static [OpcodeId],
    /// Whether an `if` body without `else` still ends in its own forward jump to the merge point.
    pub closes_if_bodies: bool,
    pub variable_arity: &'static [ArityRule],
}

impl DialectInfo {
    /// Look up the opcode for a byte.
    pub fn opcode(&self, byte: u8) -> Option<OpcodeId> {
        self.opcodes[byte as usize]
    }

    /// Reverse lookup, mostly for assembling test inputs.
    pub fn byte_of(&self, id: OpcodeId) -> Option<u8> {
        (0..=255u8).find(|&b| self.opcodes[b as usize] == Some(id))
    }

    /// Whether the opcode takes an operand in this dialect.
    pub fn has_argument(&self, byte: u8) -> bool {
        match self.encoding {
            Encoding::VariableWidth { have_argument } | Encoding::Wordcode { have_argument } => byte >= have_argument,
        }
    }

    /// Encoded width in bytes of an instruction starting with `byte`.
    pub fn instruction_width(&self, byte: u8) -> u32 {
        match self.encoding {
            Encoding::VariableWidth { .. } if self.has_argument(byte) => 3,
            Encoding::VariableWidth { .. } => 1,
            Encoding::Wordcode { .. } => 2,
        }
    }

    pub fn extended_arg(&self) -> Option<u8> {
        self.byte_of(OpcodeId::ExtendedArg)
    }

    pub fn is_jump_relative(&self, op: OpcodeId) -> bool {
        self.jump_relative.contains(&op)
    }

    pub fn is_jump_absolute(&self, op: OpcodeId) -> bool {
        self.jump_absolute.contains(&op)
    }

    /// Whether the operand of `op` is a jump target (either flavor).
    pub fn is_jump(&self, op: OpcodeId) -> bool {
        self.is_jump_relative(op) || self.is_jump_absolute(op)
    }

    pub fn is_pop_jump(&self, op: OpcodeId) -> bool {
        self.pop_jumps.contains(&op)
    }

    pub fn is_keep_jump(&self, op: OpcodeId) -> bool {
        self.keep_jumps.contains(&op)
    }

    pub fn is_conditional_jump(&self, op: OpcodeId) -> bool {
        self.is_pop_jump(op) || self.is_keep_jump(op)
    }

    pub fn is_unconditional_jump(&self, op: OpcodeId) -> bool {
        self.unconditional_jumps.contains(&op)
    }

    pub fn is_loop_setup(&self, op: OpcodeId) -> bool {
        self.loop_setup.contains(&op)
    }

    pub fn is_except_setup(&self, op: OpcodeId) -> bool {
        self.except_setup.contains(&op)
    }

    pub fn is_finally_setup(&self, op: OpcodeId) -> bool {
        self.finally_setup.contains(&op)
    }

    pub fn is_with_setup(&self, op: OpcodeId) -> bool {
        self.with_setup.contains(&op)
    }

    /// Any opcode that pushes a block (loop, except, finally, with).
    pub fn is_setup(&self, op: OpcodeId) -> bool {
        self.is_loop_setup(op) || self.is_except_setup(op) || self.is_finally_setup(op) || self.is_with_setup(op)
    }

    pub fn is_iterator_advance(&self, op: OpcodeId) -> bool {
        self.iterator_advance.contains(&op)
    }

    pub fn is_statement_terminator(&self, op: OpcodeId) -> bool {
        self.statement_terminators.contains(&op)
    }

    /// Return the arity rule for a variable-arity opcode.
    pub fn arity_rule(&self, op: OpcodeId) -> Option<&'static ArityRule> {
        self.variable_arity.iter().find(|rule| rule.opcode == op)
    }

    /// Return the arity rule whose opcode spells `base`.
    pub fn arity_rule_by_name(&self, base: &str) -> Option<&'static ArityRule> {
        self.variable_arity
            .iter()
            .find(|rule| crate::opcodes::as_str(rule.opcode) == base)
    }
}

/// Return the descriptor for a dialect.
pub fn info_for(id: DialectId) -> &'static DialectInfo {
    match id {
        DialectId::Py27 => &tables::py27::PY27,
        DialectId::Py36 => &tables::py36::PY36,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_lookup() {
        assert_eq!(DialectId::from_magic(62211), Some(DialectId::Py27));
        assert_eq!(DialectId::from_magic(3379), Some(DialectId::Py36));
        assert_eq!(DialectId::from_magic(1), None);
    }

    #[test]
    fn test_name_lookup() {
        assert_eq!(DialectId::from_name("py36"), Some(DialectId::Py36));
        assert_eq!(DialectId::from_name("2.7"), Some(DialectId::Py27));
        assert_eq!(DialectId::Py27.to_string(), "py27");
    }

    #[test]
    fn test_jump_sets_are_disjoint() {
        for &id in DialectId::ALL {
            let info = info_for(id);
            for op in info.jump_relative {
                assert!(!info.is_jump_absolute(*op), "{op:?} is both relative and absolute in {id}");
            }
        }
    }

    #[test]
    fn test_every_classified_opcode_has_a_byte() {
        for &id in DialectId::ALL {
            let info = info_for(id);
            let sets = [
                info.jump_relative,
                info.jump_absolute,
                info.pop_jumps,
                info.keep_jumps,
                info.unconditional_jumps,
                info.loop_setup,
                info.except_setup,
                info.finally_setup,
                info.with_setup,
                info.iterator_advance,
                info.statement_terminators,
            ];
            for op in sets.iter().flat_map(|s| s.iter()) {
                assert!(info.byte_of(*op).is_some(), "{op:?} has no byte in {id}");
            }
            for rule in info.variable_arity {
                assert!(info.byte_of(rule.opcode).is_some(), "{:?} has no byte in {id}", rule.opcode);
            }
        }
    }

    #[test]
    fn test_only_27_closes_if_bodies() {
        assert!(info_for(DialectId::Py27).closes_if_bodies);
        assert!(!info_for(DialectId::Py36).closes_if_bodies);
    }

    #[test]
    fn test_conditional_jumps_are_jumps() {
        for &id in DialectId::ALL {
            let info = info_for(id);
            for op in info.pop_jumps.iter().chain(info.keep_jumps) {
                assert!(info.is_jump(*op));
            }
        }
    }
}
