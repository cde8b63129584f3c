//! Provide the canonical bytecode vocabulary shared by the unpyc decoder, scanner and grammar engine.
//!
//! This crate is intentionally small and dependency-free. It answers three questions per dialect:
//! - which byte maps to which opcode,
//! - how each opcode behaves with respect to control flow (relative/absolute jump, conditional, setup), and
//! - which opcodes carry an operand that encodes an argument count (variable arity).
//!
//! ## Notes
//!
//! - This is a “vocabulary” crate: **no IO**, no global mutable state, no parser types.
//! - The classification sets are bit-exact contracts with the real compiler of each dialect; the structure detector
//!   is only as correct as these tables.
//!
//! ## Examples
//! ```rust
//! use unpyc_core::dialects::{self, DialectId};
//! use unpyc_core::opcodes::OpcodeId;
//!
//! let py27 = dialects::info_for(DialectId::Py27);
//! assert_eq!(py27.opcode(113), Some(OpcodeId::JumpAbsolute));
//! assert!(py27.is_jump_absolute(OpcodeId::JumpAbsolute));
//! assert_eq!(DialectId::from_magic(62211), Some(DialectId::Py27));
//! ```

pub mod arity;
pub mod dialects;
pub mod opcodes;
mod tables;

pub use dialects::{DialectId, DialectInfo, Encoding};
pub use opcodes::OpcodeId;
