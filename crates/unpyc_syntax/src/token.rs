//! Parse-time tokens.
//!
//! Tokens are the parser's terminal alphabet. Most wrap one [`Instruction`](crate::instruction::Instruction); the
//! rest are synthetic merge-point markers (`COME_FROM*`) inserted by the scanner in front of jump targets.
//!
//! ## Notes
//! - `kind` is a plain string so that arity-suffixed kinds (`CALL_FUNCTION_3`) and synthetic kinds share one
//!   alphabet with grammar terminals.
//! - [`TokenOffset`] orders synthetic tokens *before* the real instruction at the same offset.

use std::cmp::Ordering;
use std::fmt;

use unpyc_core::OpcodeId;

use crate::instruction::Argument;

/// Position of a token in the stream: a real instruction offset, or a synthetic slot in front of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenOffset {
    pub offset: u32,
    pub synthetic: Option<u32>,
}

impl TokenOffset {
    pub fn real(offset: u32) -> Self {
        Self { offset, synthetic: None }
    }

    pub fn synthetic(offset: u32, slot: u32) -> Self {
        Self {
            offset,
            synthetic: Some(slot),
        }
    }
}

impl Ord for TokenOffset {
    fn cmp(&self, other: &Self) -> Ordering {
        let key = |t: &TokenOffset| (t.offset, t.synthetic.is_none(), t.synthetic.unwrap_or(0));
        key(self).cmp(&key(other))
    }
}

impl PartialOrd for TokenOffset {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TokenOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.synthetic {
            Some(slot) => write!(f, "{}_{}", self.offset, slot),
            None => write!(f, "{}", self.offset),
        }
    }
}

/// Which kind of block a merge point closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergeFlavor {
    Plain,
    LoopExit,
    Except,
    Finally,
    With,
}

impl MergeFlavor {
    /// Terminal spelling of a merge token with this flavor.
    pub fn kind(self) -> &'static str {
        match self {
            MergeFlavor::Plain => "COME_FROM",
            MergeFlavor::LoopExit => "COME_FROM_LOOP",
            MergeFlavor::Except => "COME_FROM_EXCEPT",
            MergeFlavor::Finally => "COME_FROM_FINALLY",
            MergeFlavor::With => "COME_FROM_WITH",
        }
    }

    pub fn from_kind(kind: &str) -> Option<MergeFlavor> {
        [
            MergeFlavor::Plain,
            MergeFlavor::LoopExit,
            MergeFlavor::Except,
            MergeFlavor::Finally,
            MergeFlavor::With,
        ]
        .into_iter()
        .find(|f| f.kind() == kind)
    }
}

/// One parser terminal.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: String,
    pub offset: TokenOffset,
    pub attr: Argument,
    pub pattr: String,
    /// The originating opcode; `None` for synthetic tokens.
    pub opcode: Option<OpcodeId>,
    pub source_line: Option<u32>,
}

impl Token {
    /// Build a synthetic merge token standing for the jump at `source`.
    pub fn merge(flavor: MergeFlavor, offset: TokenOffset, source: u32) -> Self {
        Self {
            kind: flavor.kind().to_string(),
            offset,
            attr: Argument::ComeFrom(source),
            pattr: source.to_string(),
            opcode: None,
            source_line: None,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.opcode.is_none()
    }

    pub fn is_merge(&self) -> bool {
        MergeFlavor::from_kind(&self.kind).is_some()
    }

    /// For merge tokens: offset of the jump they stand for.
    pub fn come_from(&self) -> Option<u32> {
        match self.attr {
            Argument::ComeFrom(src) => Some(src),
            _ => None,
        }
    }

    /// For jump tokens: the effective jump target.
    pub fn jump_target(&self) -> Option<u32> {
        match self.attr {
            Argument::Jump(target) => Some(target),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.offset, self.kind)?;
        if !self.pattr.is_empty() {
            write!(f, " {}", self.pattr)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_sorts_before_real_at_same_offset() {
        let mut offsets = vec![
            TokenOffset::real(12),
            TokenOffset::synthetic(12, 1),
            TokenOffset::real(9),
            TokenOffset::synthetic(12, 0),
        ];
        offsets.sort();
        let rendered: Vec<String> = offsets.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["9", "12_0", "12_1", "12"]);
    }

    #[test]
    fn test_slots_past_u16_keep_their_order() {
        let mut offsets = vec![TokenOffset::synthetic(12, 70_000), TokenOffset::synthetic(12, 65_535)];
        offsets.sort();
        let rendered: Vec<String> = offsets.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["12_65535", "12_70000"]);
    }

    #[test]
    fn test_merge_token_carries_source() {
        let tok = Token::merge(MergeFlavor::LoopExit, TokenOffset::synthetic(30, 0), 3);
        assert_eq!(tok.kind, "COME_FROM_LOOP");
        assert_eq!(tok.come_from(), Some(3));
        assert!(tok.is_synthetic());
        assert!(tok.is_merge());
        assert_eq!(tok.to_string(), "30_0 COME_FROM_LOOP 3");
    }
}
