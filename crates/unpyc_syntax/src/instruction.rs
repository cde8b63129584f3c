//! Instruction decoding.
//!
//! Turns a [`CodeObject`]'s raw bytes into an ordered, immutable sequence of [`Instruction`]s with uniform logical
//! offsets, resolved operands and resolved jump targets. This is the only place instructions are constructed.
//!
//! ## Notes
//! - `EXTENDED_ARG` prefixes are folded into the instruction they extend. The folded instruction keeps the prefix's
//!   offset, so jumps that target the prefix land on it.
//! - Jump targets are resolved here but validated by the scanner, which owns the "legal offset" contract.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use unpyc_core::dialects::{self, DialectInfo, Encoding};
use unpyc_core::opcodes::{self, OpcodeId};

use crate::code::{CodeObject, Constant};
use crate::diagnostics::DecodeError;

/// A decoded operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    None,
    Const(Constant),
    Name(String),
    Local(String),
    Deref(String),
    Compare(&'static str),
    /// Absolute jump target (already resolved for relative jumps).
    Jump(u32),
    Count(u32),
    /// Source offset of the jump a synthetic merge token stands for.
    ComeFrom(u32),
}

impl Argument {
    /// Display form of the operand (the token's `pattr`).
    pub fn pattr(&self) -> String {
        match self {
            Argument::None => String::new(),
            Argument::Const(c) => c.to_string(),
            Argument::Name(n) | Argument::Local(n) | Argument::Deref(n) => n.clone(),
            Argument::Compare(op) => (*op).to_string(),
            Argument::Jump(t) => t.to_string(),
            Argument::Count(n) => n.to_string(),
            Argument::ComeFrom(src) => src.to_string(),
        }
    }
}

/// One decoded instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    offset: u32,
    size: u32,
    opcode: OpcodeId,
    operand: Option<u32>,
    argument: Argument,
    is_jump_target: bool,
    source_line: Option<u32>,
}

impl Instruction {
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Encoded size in bytes, including folded `EXTENDED_ARG` prefixes.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn next_offset(&self) -> u32 {
        self.offset + self.size
    }

    pub fn opcode(&self) -> OpcodeId {
        self.opcode
    }

    pub fn name(&self) -> &'static str {
        opcodes::as_str(self.opcode)
    }

    pub fn operand(&self) -> Option<u32> {
        self.operand
    }

    /// The operand resolved against the code object's pools.
    pub fn argument(&self) -> &Argument {
        &self.argument
    }

    pub fn is_jump_target(&self) -> bool {
        self.is_jump_target
    }

    pub fn source_line(&self) -> Option<u32> {
        self.source_line
    }

    /// Literal jump target, if this instruction jumps.
    pub fn jump_target(&self) -> Option<u32> {
        match self.argument {
            Argument::Jump(target) => Some(target),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>4} {}", self.offset, self.name())?;
        let pattr = self.argument.pattr();
        if !pattr.is_empty() {
            write!(f, " {pattr}")?;
        }
        Ok(())
    }
}

/// Decode a code object into instructions.
///
/// ## Errors
/// - [`DecodeError::UnknownOpcode`] if a byte is not an opcode of the code object's dialect.
/// - [`DecodeError::TruncatedInstruction`] if the stream ends inside an instruction or after a dangling prefix.
/// - [`DecodeError::OperandOutOfRange`] if an operand does not index into its pool.
#[tracing::instrument(skip_all, fields(name = %code.name, dialect = %code.dialect, len = code.code.len()))]
pub fn decode(code: &CodeObject) -> Result<Vec<Instruction>, DecodeError> {
    let info = dialects::info_for(code.dialect);
    let bytes = &code.code;
    let extended_arg = info.extended_arg();
    let mut out: Vec<Instruction> = Vec::new();

    let mut pos = 0usize;
    let mut prefix: Option<(u32, u32)> = None;
    while pos < bytes.len() {
        let offset = pos as u32;
        let byte = bytes[pos];
        let opcode = info.opcode(byte).ok_or(DecodeError::UnknownOpcode {
            byte,
            offset,
            dialect: code.dialect,
        })?;
        let width = info.instruction_width(byte) as usize;
        if pos + width > bytes.len() {
            return Err(DecodeError::TruncatedInstruction { offset });
        }
        let raw = match info.encoding {
            Encoding::VariableWidth { .. } if width == 3 => Some(u32::from(bytes[pos + 1]) | u32::from(bytes[pos + 2]) << 8),
            Encoding::VariableWidth { .. } => None,
            Encoding::Wordcode { .. } => info.has_argument(byte).then(|| u32::from(bytes[pos + 1])),
        };
        pos += width;

        let (start, high) = prefix.take().unwrap_or((offset, 0));
        if Some(byte) == extended_arg {
            let shift = match info.encoding {
                Encoding::VariableWidth { .. } => 16,
                Encoding::Wordcode { .. } => 8,
            };
            prefix = Some((start, (high | raw.unwrap_or(0)) << shift));
            continue;
        }

        let operand = raw.map(|r| high | r);
        let size = pos as u32 - start;
        let argument = resolve(info, code, opcode, start, start + size, operand)?;
        out.push(Instruction {
            offset: start,
            size,
            opcode,
            operand,
            argument,
            is_jump_target: false,
            source_line: None,
        });
    }
    if let Some((start, _)) = prefix {
        return Err(DecodeError::TruncatedInstruction { offset: start });
    }

    let targets: BTreeSet<u32> = out.iter().filter_map(Instruction::jump_target).collect();
    let lines = line_starts(code);
    for inst in &mut out {
        inst.is_jump_target = targets.contains(&inst.offset);
        inst.source_line = lines.get(&inst.offset).copied();
    }
    tracing::debug!(instructions = out.len(), jump_targets = targets.len(), "decoded");
    Ok(out)
}

fn resolve(
    info: &DialectInfo,
    code: &CodeObject,
    opcode: OpcodeId,
    offset: u32,
    next: u32,
    operand: Option<u32>,
) -> Result<Argument, DecodeError> {
    use OpcodeId::*;

    let Some(arg) = operand else {
        return Ok(Argument::None);
    };
    let out_of_range = |pool: &'static str, len: usize| DecodeError::OperandOutOfRange {
        opcode: opcodes::as_str(opcode),
        offset,
        operand: arg,
        pool,
        len,
    };
    let idx = arg as usize;

    if info.is_jump_relative(opcode) {
        return next
            .checked_add(arg)
            .map(Argument::Jump)
            .ok_or_else(|| out_of_range("jump", code.code.len()));
    }
    if info.is_jump_absolute(opcode) {
        return Ok(Argument::Jump(arg));
    }
    let resolved = match opcode {
        LoadConst => Argument::Const(
            code.consts
                .get(idx)
                .cloned()
                .ok_or_else(|| out_of_range("constant", code.consts.len()))?,
        ),
        LoadName | StoreName | DeleteName | LoadAttr | StoreAttr | DeleteAttr | LoadGlobal | StoreGlobal
        | DeleteGlobal | ImportName | ImportFrom => Argument::Name(
            code.names
                .get(idx)
                .cloned()
                .ok_or_else(|| out_of_range("name", code.names.len()))?,
        ),
        LoadFast | StoreFast | DeleteFast => Argument::Local(
            code.varnames
                .get(idx)
                .cloned()
                .ok_or_else(|| out_of_range("varname", code.varnames.len()))?,
        ),
        LoadClosure | LoadDeref | StoreDeref | DeleteDeref | LoadClassderef => Argument::Deref(
            code.deref_name(idx)
                .map(str::to_string)
                .ok_or_else(|| out_of_range("cell/free", code.cellvars.len() + code.freevars.len()))?,
        ),
        CompareOp => Argument::Compare(
            opcodes::compare_op_str(arg).ok_or_else(|| out_of_range("compare_op", opcodes::COMPARE_OPS.len()))?,
        ),
        _ => Argument::Count(arg),
    };
    Ok(resolved)
}

/// Decode the line table into `offset → line` for the first instruction of each line.
///
/// ## Notes
/// - 3.x line increments are signed bytes; 2.x increments are unsigned.
pub fn line_starts(code: &CodeObject) -> BTreeMap<u32, u32> {
    let signed = matches!(
        dialects::info_for(code.dialect).encoding,
        Encoding::Wordcode { .. }
    );
    let mut starts = BTreeMap::new();
    let mut addr: u32 = 0;
    let mut line: i64 = i64::from(code.first_line);
    let mut last: Option<i64> = None;
    for pair in code.lnotab.chunks_exact(2) {
        let (byte_incr, line_incr) = (pair[0], pair[1]);
        if byte_incr != 0 {
            if last != Some(line) {
                starts.insert(addr, line.max(0) as u32);
                last = Some(line);
            }
            addr += u32::from(byte_incr);
        }
        line += if signed { i64::from(line_incr as i8) } else { i64::from(line_incr) };
    }
    if last != Some(line) {
        starts.insert(addr, line.max(0) as u32);
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;
    use unpyc_core::DialectId;

    fn py27(code: Vec<u8>) -> CodeObject {
        CodeObject::new(DialectId::Py27, "<test>", code)
            .with_consts(vec![Constant::None, Constant::Int(1)])
            .with_names(["x"])
    }

    #[test]
    fn test_decode_variable_width() {
        // LOAD_CONST 1; STORE_NAME x; LOAD_CONST None; RETURN_VALUE
        let insts = decode(&py27(vec![100, 1, 0, 90, 0, 0, 100, 0, 0, 83])).unwrap();
        let offsets: Vec<u32> = insts.iter().map(Instruction::offset).collect();
        assert_eq!(offsets, vec![0, 3, 6, 9]);
        assert_eq!(insts[0].argument(), &Argument::Const(Constant::Int(1)));
        assert_eq!(insts[1].argument(), &Argument::Name("x".into()));
        assert_eq!(insts[3].operand(), None);
    }

    #[test]
    fn test_relative_jump_resolves_from_next_instruction() {
        // JUMP_FORWARD +0 lands on the RETURN_VALUE at 3.
        let insts = decode(&py27(vec![110, 0, 0, 83])).unwrap();
        assert_eq!(insts[0].jump_target(), Some(3));
        assert!(insts[1].is_jump_target());
    }

    #[test]
    fn test_extended_arg_is_folded_into_next_instruction() {
        // EXTENDED_ARG 1; JUMP_ABSOLUTE 2 → target 0x10002
        let insts = decode(&py27(vec![145, 1, 0, 113, 2, 0])).unwrap();
        assert_eq!(insts.len(), 1);
        assert_eq!(insts[0].offset(), 0);
        assert_eq!(insts[0].size(), 6);
        assert_eq!(insts[0].jump_target(), Some(0x1_0002));
    }

    #[test]
    fn test_wordcode_extended_arg() {
        let code = CodeObject::new(DialectId::Py36, "<test>", vec![144, 1, 113, 4]);
        let insts = decode(&code).unwrap();
        assert_eq!(insts[0].operand(), Some(0x104));
    }

    #[test]
    fn test_unknown_opcode_is_rejected() {
        let err = decode(&py27(vec![6])).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownOpcode { byte: 6, offset: 0, .. }));
    }

    #[test]
    fn test_truncated_instruction() {
        let err = decode(&py27(vec![100, 0])).unwrap_err();
        assert_eq!(err, DecodeError::TruncatedInstruction { offset: 0 });
    }

    #[test]
    fn test_operand_out_of_range() {
        let err = decode(&py27(vec![100, 9, 0])).unwrap_err();
        assert!(matches!(err, DecodeError::OperandOutOfRange { pool: "constant", operand: 9, .. }));
    }

    #[test]
    fn test_relative_jump_past_u32_is_out_of_range() {
        // EXTENDED_ARG 0xffff; JUMP_FORWARD 0xffff
        let err = decode(&py27(vec![145, 0xff, 0xff, 110, 0xff, 0xff])).unwrap_err();
        assert_eq!(
            err,
            DecodeError::OperandOutOfRange {
                opcode: "JUMP_FORWARD",
                offset: 0,
                operand: u32::MAX,
                pool: "jump",
                len: 6,
            }
        );
    }

    #[test]
    fn test_line_starts_from_lnotab() {
        let code = py27(vec![]).with_lines(10, vec![0, 1, 6, 1, 3, 2]);
        let lines = line_starts(&code);
        assert_eq!(lines.get(&0), Some(&11));
        assert_eq!(lines.get(&6), Some(&12));
        assert_eq!(lines.get(&9), Some(&14));
    }

    proptest::proptest! {
        /// Property: decoding arbitrary bytes returns instructions or an error, never a panic
        #[test]
        fn decode_never_panics(bytes in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..64)) {
            for &dialect in DialectId::ALL {
                let code = CodeObject::new(dialect, "<arbitrary>", bytes.clone())
                    .with_consts(vec![Constant::None])
                    .with_names(["x"]);
                let _ = decode(&code);
            }
        }

        /// Property: an extended relative jump either resolves or is rejected as out of range
        #[test]
        fn extended_relative_jumps_are_checked(high in proptest::prelude::any::<u16>(), low in proptest::prelude::any::<u16>()) {
            let [h0, h1] = high.to_le_bytes();
            let [l0, l1] = low.to_le_bytes();
            let operand = u32::from(high) << 16 | u32::from(low);
            match decode(&py27(vec![145, h0, h1, 110, l0, l1])) {
                Ok(insts) => proptest::prop_assert_eq!(insts[0].jump_target(), Some(6 + operand)),
                Err(err) => {
                    let out_of_range = matches!(err, DecodeError::OperandOutOfRange { pool: "jump", .. });
                    proptest::prop_assert!(out_of_range);
                }
            }
        }
    }
}
