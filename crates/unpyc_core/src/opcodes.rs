//! Opcode vocabulary.
//!
//! [`OpcodeId`] is the union of every opcode known to any supported dialect. Byte values are **not** part of the
//! identity: the same opcode can live at different bytes in different dialects, and each dialect table
//! (`crate::tables`) maps its bytes onto these ids.
//!
//! ## Notes
//! - Canonical spellings follow the CPython `dis` names, except `SLICE+n` style names which are spelled `SLICE_n`
//!   so that they are valid grammar symbols.
//! - Lookup via [`from_str`] is **case-sensitive**.
//!
//! ## Examples
//! ```rust
//! use unpyc_core::opcodes::{self, OpcodeId};
//!
//! assert_eq!(opcodes::from_str("FOR_ITER"), Some(OpcodeId::ForIter));
//! assert_eq!(opcodes::as_str(OpcodeId::PopJumpIfFalse), "POP_JUMP_IF_FALSE");
//! ```

macro_rules! define_opcodes {
    ($($id:ident => $name:literal),* $(,)?) => {
        /// Stable identifier for every opcode of every supported dialect.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum OpcodeId {
            $($id),*
        }

        /// Registry of all opcode ids, in declaration order.
        pub const OPCODES: &[OpcodeId] = &[$(OpcodeId::$id),*];

        /// Return the canonical spelling for an opcode.
        pub fn as_str(id: OpcodeId) -> &'static str {
            match id {
                $(OpcodeId::$id => $name),*
            }
        }

        /// Resolve a canonical spelling to its opcode id.
        pub fn from_str(name: &str) -> Option<OpcodeId> {
            match name {
                $($name => Some(OpcodeId::$id),)*
                _ => None,
            }
        }
    };
}

define_opcodes! {
    // Stack manipulation
    StopCode => "STOP_CODE",
    PopTop => "POP_TOP",
    RotTwo => "ROT_TWO",
    RotThree => "ROT_THREE",
    RotFour => "ROT_FOUR",
    DupTop => "DUP_TOP",
    DupTopTwo => "DUP_TOP_TWO",
    DupTopx => "DUP_TOPX",
    Nop => "NOP",

    // Unary
    UnaryPositive => "UNARY_POSITIVE",
    UnaryNegative => "UNARY_NEGATIVE",
    UnaryNot => "UNARY_NOT",
    UnaryConvert => "UNARY_CONVERT",
    UnaryInvert => "UNARY_INVERT",

    // Binary
    BinaryMatrixMultiply => "BINARY_MATRIX_MULTIPLY",
    BinaryPower => "BINARY_POWER",
    BinaryMultiply => "BINARY_MULTIPLY",
    BinaryDivide => "BINARY_DIVIDE",
    BinaryModulo => "BINARY_MODULO",
    BinaryAdd => "BINARY_ADD",
    BinarySubtract => "BINARY_SUBTRACT",
    BinarySubscr => "BINARY_SUBSCR",
    BinaryFloorDivide => "BINARY_FLOOR_DIVIDE",
    BinaryTrueDivide => "BINARY_TRUE_DIVIDE",
    BinaryLshift => "BINARY_LSHIFT",
    BinaryRshift => "BINARY_RSHIFT",
    BinaryAnd => "BINARY_AND",
    BinaryXor => "BINARY_XOR",
    BinaryOr => "BINARY_OR",

    // In-place
    InplaceMatrixMultiply => "INPLACE_MATRIX_MULTIPLY",
    InplaceFloorDivide => "INPLACE_FLOOR_DIVIDE",
    InplaceTrueDivide => "INPLACE_TRUE_DIVIDE",
    InplaceAdd => "INPLACE_ADD",
    InplaceSubtract => "INPLACE_SUBTRACT",
    InplaceMultiply => "INPLACE_MULTIPLY",
    InplaceDivide => "INPLACE_DIVIDE",
    InplaceModulo => "INPLACE_MODULO",
    InplacePower => "INPLACE_POWER",
    InplaceLshift => "INPLACE_LSHIFT",
    InplaceRshift => "INPLACE_RSHIFT",
    InplaceAnd => "INPLACE_AND",
    InplaceXor => "INPLACE_XOR",
    InplaceOr => "INPLACE_OR",

    // Slices (2.x only)
    Slice0 => "SLICE_0",
    Slice1 => "SLICE_1",
    Slice2 => "SLICE_2",
    Slice3 => "SLICE_3",
    StoreSlice0 => "STORE_SLICE_0",
    StoreSlice1 => "STORE_SLICE_1",
    StoreSlice2 => "STORE_SLICE_2",
    StoreSlice3 => "STORE_SLICE_3",
    DeleteSlice0 => "DELETE_SLICE_0",
    DeleteSlice1 => "DELETE_SLICE_1",
    DeleteSlice2 => "DELETE_SLICE_2",
    DeleteSlice3 => "DELETE_SLICE_3",

    // Subscript / containers
    StoreMap => "STORE_MAP",
    StoreSubscr => "STORE_SUBSCR",
    DeleteSubscr => "DELETE_SUBSCR",
    GetIter => "GET_ITER",
    GetYieldFromIter => "GET_YIELD_FROM_ITER",
    GetAiter => "GET_AITER",
    GetAnext => "GET_ANEXT",
    GetAwaitable => "GET_AWAITABLE",
    BeforeAsyncWith => "BEFORE_ASYNC_WITH",

    // Printing (2.x only)
    PrintExpr => "PRINT_EXPR",
    PrintItem => "PRINT_ITEM",
    PrintNewline => "PRINT_NEWLINE",
    PrintItemTo => "PRINT_ITEM_TO",
    PrintNewlineTo => "PRINT_NEWLINE_TO",

    // Blocks
    BreakLoop => "BREAK_LOOP",
    WithCleanup => "WITH_CLEANUP",
    WithCleanupStart => "WITH_CLEANUP_START",
    WithCleanupFinish => "WITH_CLEANUP_FINISH",
    LoadLocals => "LOAD_LOCALS",
    LoadBuildClass => "LOAD_BUILD_CLASS",
    ReturnValue => "RETURN_VALUE",
    ImportStar => "IMPORT_STAR",
    ExecStmt => "EXEC_STMT",
    SetupAnnotations => "SETUP_ANNOTATIONS",
    YieldValue => "YIELD_VALUE",
    YieldFrom => "YIELD_FROM",
    PopBlock => "POP_BLOCK",
    EndFinally => "END_FINALLY",
    PopExcept => "POP_EXCEPT",
    BuildClass => "BUILD_CLASS",

    // Names
    StoreName => "STORE_NAME",
    DeleteName => "DELETE_NAME",
    UnpackSequence => "UNPACK_SEQUENCE",
    UnpackEx => "UNPACK_EX",
    ForIter => "FOR_ITER",
    ListAppend => "LIST_APPEND",
    SetAdd => "SET_ADD",
    MapAdd => "MAP_ADD",
    StoreAttr => "STORE_ATTR",
    DeleteAttr => "DELETE_ATTR",
    StoreGlobal => "STORE_GLOBAL",
    DeleteGlobal => "DELETE_GLOBAL",
    LoadConst => "LOAD_CONST",
    LoadName => "LOAD_NAME",
    BuildTuple => "BUILD_TUPLE",
    BuildList => "BUILD_LIST",
    BuildSet => "BUILD_SET",
    BuildMap => "BUILD_MAP",
    BuildConstKeyMap => "BUILD_CONST_KEY_MAP",
    BuildString => "BUILD_STRING",
    FormatValue => "FORMAT_VALUE",
    LoadAttr => "LOAD_ATTR",
    CompareOp => "COMPARE_OP",
    ImportName => "IMPORT_NAME",
    ImportFrom => "IMPORT_FROM",
    LoadGlobal => "LOAD_GLOBAL",
    LoadFast => "LOAD_FAST",
    StoreFast => "STORE_FAST",
    DeleteFast => "DELETE_FAST",
    StoreAnnotation => "STORE_ANNOTATION",
    LoadClosure => "LOAD_CLOSURE",
    LoadDeref => "LOAD_DEREF",
    StoreDeref => "STORE_DEREF",
    DeleteDeref => "DELETE_DEREF",
    LoadClassderef => "LOAD_CLASSDEREF",

    // Jumps
    JumpForward => "JUMP_FORWARD",
    JumpIfFalseOrPop => "JUMP_IF_FALSE_OR_POP",
    JumpIfTrueOrPop => "JUMP_IF_TRUE_OR_POP",
    JumpAbsolute => "JUMP_ABSOLUTE",
    PopJumpIfFalse => "POP_JUMP_IF_FALSE",
    PopJumpIfTrue => "POP_JUMP_IF_TRUE",
    ContinueLoop => "CONTINUE_LOOP",

    // Setup
    SetupLoop => "SETUP_LOOP",
    SetupExcept => "SETUP_EXCEPT",
    SetupFinally => "SETUP_FINALLY",
    SetupWith => "SETUP_WITH",
    SetupAsyncWith => "SETUP_ASYNC_WITH",

    // Calls and functions
    RaiseVarargs => "RAISE_VARARGS",
    CallFunction => "CALL_FUNCTION",
    CallFunctionVar => "CALL_FUNCTION_VAR",
    CallFunctionKw => "CALL_FUNCTION_KW",
    CallFunctionVarKw => "CALL_FUNCTION_VAR_KW",
    CallFunctionEx => "CALL_FUNCTION_EX",
    MakeFunction => "MAKE_FUNCTION",
    MakeClosure => "MAKE_CLOSURE",
    BuildSlice => "BUILD_SLICE",

    // Unpacking builds (3.x only)
    BuildListUnpack => "BUILD_LIST_UNPACK",
    BuildMapUnpack => "BUILD_MAP_UNPACK",
    BuildMapUnpackWithCall => "BUILD_MAP_UNPACK_WITH_CALL",
    BuildTupleUnpack => "BUILD_TUPLE_UNPACK",
    BuildSetUnpack => "BUILD_SET_UNPACK",
    BuildTupleUnpackWithCall => "BUILD_TUPLE_UNPACK_WITH_CALL",

    ExtendedArg => "EXTENDED_ARG",
}

/// Comparison operator spellings indexed by the `COMPARE_OP` operand.
///
/// ## Notes
/// - Shared by 2.7 and 3.6 (the `<>` spelling of 2.x is rendered as `!=`).
pub const COMPARE_OPS: &[&str] = &[
    "<",
    "<=",
    "==",
    "!=",
    ">",
    ">=",
    "in",
    "not-in",
    "is",
    "is-not",
    "exception-match",
    "BAD",
];

/// Resolve a `COMPARE_OP` operand to its spelling.
pub fn compare_op_str(operand: u32) -> Option<&'static str> {
    COMPARE_OPS.get(operand as usize).copied()
}
