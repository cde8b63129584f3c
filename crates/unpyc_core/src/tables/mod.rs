//! Per-dialect opcode tables.
//!
//! Each submodule declares `(byte, opcode)` pairs and classification sets for one dialect. The byte table is
//! expanded into a 256-entry lookup at compile time.

pub(crate) mod py27;
pub(crate) mod py36;

use crate::opcodes::OpcodeId;

/// Expand `(byte, opcode)` pairs into a direct lookup table.
pub(crate) const fn build(pairs: &[(u8, OpcodeId)]) -> [Option<OpcodeId>; 256] {
    let mut table = [None; 256];
    let mut i = 0;
    while i < pairs.len() {
        table[pairs[i].0 as usize] = Some(pairs[i].1);
        i += 1;
    }
    table
}
