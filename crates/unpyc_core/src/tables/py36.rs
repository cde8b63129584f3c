//! CPython 3.6 opcode table (magics 3360..=3379, wordcode).

use super::build;
use crate::arity::{ArityEncoding, ArityRule};
use crate::dialects::{DialectId, DialectInfo, Encoding};
use crate::opcodes::OpcodeId::{self, *};

const PAIRS: &[(u8, OpcodeId)] = &[
    (1, PopTop),
    (2, RotTwo),
    (3, RotThree),
    (4, DupTop),
    (5, DupTopTwo),
    (9, Nop),
    (10, UnaryPositive),
    (11, UnaryNegative),
    (12, UnaryNot),
    (15, UnaryInvert),
    (16, BinaryMatrixMultiply),
    (17, InplaceMatrixMultiply),
    (19, BinaryPower),
    (20, BinaryMultiply),
    (22, BinaryModulo),
    (23, BinaryAdd),
    (24, BinarySubtract),
    (25, BinarySubscr),
    (26, BinaryFloorDivide),
    (27, BinaryTrueDivide),
    (28, InplaceFloorDivide),
    (29, InplaceTrueDivide),
    (50, GetAiter),
    (51, GetAnext),
    (52, BeforeAsyncWith),
    (55, InplaceAdd),
    (56, InplaceSubtract),
    (57, InplaceMultiply),
    (59, InplaceModulo),
    (60, StoreSubscr),
    (61, DeleteSubscr),
    (62, BinaryLshift),
    (63, BinaryRshift),
    (64, BinaryAnd),
    (65, BinaryXor),
    (66, BinaryOr),
    (67, InplacePower),
    (68, GetIter),
    (69, GetYieldFromIter),
    (70, PrintExpr),
    (71, LoadBuildClass),
    (72, YieldFrom),
    (73, GetAwaitable),
    (75, InplaceLshift),
    (76, InplaceRshift),
    (77, InplaceAnd),
    (78, InplaceXor),
    (79, InplaceOr),
    (80, BreakLoop),
    (81, WithCleanupStart),
    (82, WithCleanupFinish),
    (83, ReturnValue),
    (84, ImportStar),
    (85, SetupAnnotations),
    (86, YieldValue),
    (87, PopBlock),
    (88, EndFinally),
    (89, PopExcept),
    (90, StoreName),
    (91, DeleteName),
    (92, UnpackSequence),
    (93, ForIter),
    (94, UnpackEx),
    (95, StoreAttr),
    (96, DeleteAttr),
    (97, StoreGlobal),
    (98, DeleteGlobal),
    (100, LoadConst),
    (101, LoadName),
    (102, BuildTuple),
    (103, BuildList),
    (104, BuildSet),
    (105, BuildMap),
    (106, LoadAttr),
    (107, CompareOp),
    (108, ImportName),
    (109, ImportFrom),
    (110, JumpForward),
    (111, JumpIfFalseOrPop),
    (112, JumpIfTrueOrPop),
    (113, JumpAbsolute),
    (114, PopJumpIfFalse),
    (115, PopJumpIfTrue),
    (116, LoadGlobal),
    (119, ContinueLoop),
    (120, SetupLoop),
    (121, SetupExcept),
    (122, SetupFinally),
    (124, LoadFast),
    (125, StoreFast),
    (126, DeleteFast),
    (127, StoreAnnotation),
    (130, RaiseVarargs),
    (131, CallFunction),
    (132, MakeFunction),
    (133, BuildSlice),
    (135, LoadClosure),
    (136, LoadDeref),
    (137, StoreDeref),
    (138, DeleteDeref),
    (141, CallFunctionKw),
    (142, CallFunctionEx),
    (143, SetupWith),
    (144, ExtendedArg),
    (145, ListAppend),
    (146, SetAdd),
    (147, MapAdd),
    (148, LoadClassderef),
    (149, BuildListUnpack),
    (150, BuildMapUnpack),
    (151, BuildMapUnpackWithCall),
    (152, BuildTupleUnpack),
    (153, BuildSetUnpack),
    (154, SetupAsyncWith),
    (155, FormatValue),
    (156, BuildConstKeyMap),
    (157, BuildString),
    (158, BuildTupleUnpackWithCall),
];

static OPCODES: [Option<OpcodeId>; 256] = build(PAIRS);

pub(crate) static PY36: DialectInfo = DialectInfo {
    id: DialectId::Py36,
    names: &["py36", "3.6"],
    magics: &[
        3360, 3361, 3362, 3363, 3364, 3365, 3366, 3367, 3368, 3369, 3370, 3371, 3372, 3373, 3374, 3375, 3376, 3377,
        3378, 3379,
    ],
    encoding: Encoding::Wordcode { have_argument: 90 },
    opcodes: &OPCODES,
    jump_relative: &[ForIter, JumpForward, SetupLoop, SetupExcept, SetupFinally, SetupWith, SetupAsyncWith],
    jump_absolute: &[
        JumpIfFalseOrPop,
        JumpIfTrueOrPop,
        JumpAbsolute,
        PopJumpIfFalse,
        PopJumpIfTrue,
        ContinueLoop,
    ],
    pop_jumps: &[PopJumpIfFalse, PopJumpIfTrue],
    keep_jumps: &[JumpIfFalseOrPop, JumpIfTrueOrPop],
    unconditional_jumps: &[JumpForward, JumpAbsolute, ContinueLoop],
    loop_setup: &[SetupLoop],
    except_setup: &[SetupExcept],
    finally_setup: &[SetupFinally],
    with_setup: &[SetupWith, SetupAsyncWith],
    iterator_advance: &[ForIter],
    statement_terminators: &[
        PopTop,
        StoreName,
        StoreFast,
        StoreGlobal,
        StoreDeref,
        StoreAttr,
        StoreSubscr,
        StoreAnnotation,
        DeleteName,
        DeleteFast,
        DeleteGlobal,
        DeleteDeref,
        DeleteAttr,
        DeleteSubscr,
        ReturnValue,
        RaiseVarargs,
        BreakLoop,
        ContinueLoop,
        JumpForward,
        JumpAbsolute,
        PopBlock,
        PopExcept,
        EndFinally,
        ImportStar,
        SetupLoop,
        SetupExcept,
        SetupFinally,
        SetupWith,
        SetupAsyncWith,
    ],
    closes_if_bodies: false,
    variable_arity: &[
        ArityRule::count(CallFunction, "call", "expr").with_prefix(&["expr"]),
        ArityRule::count(CallFunctionKw, "call", "expr")
            .with_prefix(&["expr"])
            .with_suffix(&["LOAD_CONST"]),
        ArityRule::count(CallFunctionEx, "call", "expr")
            .with_prefix(&["expr", "expr"])
            .with_encoding(ArityEncoding::FlagBits(0x01)),
        ArityRule::count(BuildTuple, "build_tuple", "expr"),
        ArityRule::count(BuildList, "build_list", "expr"),
        ArityRule::count(BuildSet, "build_set", "expr"),
        ArityRule::count(BuildMap, "build_map", "expr").with_encoding(ArityEncoding::Pairs),
        ArityRule::count(BuildConstKeyMap, "build_map", "expr").with_suffix(&["LOAD_CONST"]),
        ArityRule::count(BuildString, "joined_str", "expr"),
        ArityRule::count(BuildSlice, "build_slice", "expr"),
        ArityRule::count(BuildTupleUnpack, "build_tuple", "expr"),
        ArityRule::count(BuildListUnpack, "build_list", "expr"),
        ArityRule::count(UnpackSequence, "unpack", "store").after(),
        ArityRule::count(RaiseVarargs, "raise_stmt", "expr"),
        ArityRule::count(MakeFunction, "mkfunc", "expr")
            .with_suffix(&["LOAD_CONST", "LOAD_CONST"])
            .with_encoding(ArityEncoding::FlagBits(0x0f)),
    ],
};
