//! Variable-arity opcode descriptions.
//!
//! Some opcodes encode how many stack operands they consume in their operand (`CALL_FUNCTION 3`,
//! `BUILD_TUPLE 2`, ...). The scanner suffixes such tokens with the raw operand (`CALL_FUNCTION_3`) and the
//! grammar synthesizer uses an [`ArityRule`] to turn each observed operand into a production.
//!
//! ## Examples
//! ```rust
//! use unpyc_core::arity::ArityEncoding;
//!
//! // 2.7 calls: low byte positional, high byte keyword pairs.
//! assert_eq!(ArityEncoding::PositionalKeyword.operand_counts(0x0102), (2, 1));
//! // 3.6 MAKE_FUNCTION: one extra operand per flag bit.
//! assert_eq!(ArityEncoding::FlagBits(0x0f).operand_counts(0b0101), (2, 0));
//! ```

use crate::opcodes::OpcodeId;

/// How an operand value translates into stack operand counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArityEncoding {
    /// The operand is the number of arguments.
    Count,
    /// Low byte counts positional arguments, high byte counts keyword pairs.
    PositionalKeyword,
    /// The operand counts key/value pairs (two arguments each).
    Pairs,
    /// Each bit of `operand & mask` adds one argument.
    FlagBits(u32),
}

impl ArityEncoding {
    /// Split an operand into `(positional, keyword)` argument counts.
    ///
    /// ## Returns
    /// - `(usize, usize)`: the number of `arg` and `kw_arg` repetitions to synthesize.
    pub fn operand_counts(self, operand: u32) -> (usize, usize) {
        match self {
            ArityEncoding::Count => (operand as usize, 0),
            ArityEncoding::PositionalKeyword => ((operand & 0xff) as usize, ((operand >> 8) & 0xff) as usize),
            ArityEncoding::Pairs => ((operand as usize).saturating_mul(2), 0),
            ArityEncoding::FlagBits(mask) => ((operand & mask).count_ones() as usize, 0),
        }
    }
}

/// Describe the production shape synthesized for one variable-arity opcode.
///
/// The synthesized right-hand side is:
/// `prefix.. arg*positional kw_arg*keyword suffix.. OPCODE_n` or, when `args_after` is set,
/// `prefix.. OPCODE_n arg*positional` (sequence unpacking consumes its targets *after* the opcode).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArityRule {
    pub opcode: OpcodeId,
    pub lhs: &'static str,
    pub prefix: &'static [&'static str],
    pub arg: &'static str,
    pub kw_arg: Option<&'static str>,
    pub suffix: &'static [&'static str],
    pub encoding: ArityEncoding,
    pub args_after: bool,
}

impl ArityRule {
    /// Build a plain count rule: `lhs ::= arg*n OPCODE_n`.
    pub const fn count(opcode: OpcodeId, lhs: &'static str, arg: &'static str) -> Self {
        Self {
            opcode,
            lhs,
            prefix: &[],
            arg,
            kw_arg: None,
            suffix: &[],
            encoding: ArityEncoding::Count,
            args_after: false,
        }
    }

    pub const fn with_prefix(mut self, prefix: &'static [&'static str]) -> Self {
        self.prefix = prefix;
        self
    }

    pub const fn with_suffix(mut self, suffix: &'static [&'static str]) -> Self {
        self.suffix = suffix;
        self
    }

    pub const fn with_keywords(mut self, kw_arg: &'static str) -> Self {
        self.kw_arg = Some(kw_arg);
        self.encoding = ArityEncoding::PositionalKeyword;
        self
    }

    pub const fn with_encoding(mut self, encoding: ArityEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub const fn after(mut self) -> Self {
        self.args_after = true;
        self
    }
}
