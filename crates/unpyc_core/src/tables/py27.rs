//! CPython 2.7 opcode table (magic 62211).

use super::build;
use crate::arity::ArityRule;
use crate::dialects::{DialectId, DialectInfo, Encoding};
use crate::opcodes::OpcodeId::{self, *};

const PAIRS: &[(u8, OpcodeId)] = &[
    (0, StopCode),
    (1, PopTop),
    (2, RotTwo),
    (3, RotThree),
    (4, DupTop),
    (5, RotFour),
    (9, Nop),
    (10, UnaryPositive),
    (11, UnaryNegative),
    (12, UnaryNot),
    (13, UnaryConvert),
    (15, UnaryInvert),
    (19, BinaryPower),
    (20, BinaryMultiply),
    (21, BinaryDivide),
    (22, BinaryModulo),
    (23, BinaryAdd),
    (24, BinarySubtract),
    (25, BinarySubscr),
    (26, BinaryFloorDivide),
    (27, BinaryTrueDivide),
    (28, InplaceFloorDivide),
    (29, InplaceTrueDivide),
    (30, Slice0),
    (31, Slice1),
    (32, Slice2),
    (33, Slice3),
    (40, StoreSlice0),
    (41, StoreSlice1),
    (42, StoreSlice2),
    (43, StoreSlice3),
    (50, DeleteSlice0),
    (51, DeleteSlice1),
    (52, DeleteSlice2),
    (53, DeleteSlice3),
    (54, StoreMap),
    (55, InplaceAdd),
    (56, InplaceSubtract),
    (57, InplaceMultiply),
    (58, InplaceDivide),
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
    (70, PrintExpr),
    (71, PrintItem),
    (72, PrintNewline),
    (73, PrintItemTo),
    (74, PrintNewlineTo),
    (75, InplaceLshift),
    (76, InplaceRshift),
    (77, InplaceAnd),
    (78, InplaceXor),
    (79, InplaceOr),
    (80, BreakLoop),
    (81, WithCleanup),
    (82, LoadLocals),
    (83, ReturnValue),
    (84, ImportStar),
    (85, ExecStmt),
    (86, YieldValue),
    (87, PopBlock),
    (88, EndFinally),
    (89, BuildClass),
    // HAVE_ARGUMENT
    (90, StoreName),
    (91, DeleteName),
    (92, UnpackSequence),
    (93, ForIter),
    (94, ListAppend),
    (95, StoreAttr),
    (96, DeleteAttr),
    (97, StoreGlobal),
    (98, DeleteGlobal),
    (99, DupTopx),
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
    (130, RaiseVarargs),
    (131, CallFunction),
    (132, MakeFunction),
    (133, BuildSlice),
    (134, MakeClosure),
    (135, LoadClosure),
    (136, LoadDeref),
    (137, StoreDeref),
    (140, CallFunctionVar),
    (141, CallFunctionKw),
    (142, CallFunctionVarKw),
    (143, SetupWith),
    (145, ExtendedArg),
    (146, SetAdd),
    (147, MapAdd),
];

static OPCODES: [Option<OpcodeId>; 256] = build(PAIRS);

const CALL: ArityRule = ArityRule::count(CallFunction, "call", "expr")
    .with_prefix(&["expr"])
    .with_keywords("kwarg");

pub(crate) static PY27: DialectInfo = DialectInfo {
    id: DialectId::Py27,
    names: &["py27", "2.7"],
    magics: &[62211],
    encoding: Encoding::VariableWidth { have_argument: 90 },
    opcodes: &OPCODES,
    jump_relative: &[ForIter, JumpForward, SetupLoop, SetupExcept, SetupFinally, SetupWith],
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
    with_setup: &[SetupWith],
    iterator_advance: &[ForIter],
    statement_terminators: &[
        PopTop,
        StoreName,
        StoreFast,
        StoreGlobal,
        StoreDeref,
        StoreAttr,
        StoreSubscr,
        StoreSlice0,
        StoreSlice1,
        StoreSlice2,
        StoreSlice3,
        DeleteName,
        DeleteFast,
        DeleteGlobal,
        DeleteAttr,
        DeleteSubscr,
        DeleteSlice0,
        DeleteSlice1,
        DeleteSlice2,
        DeleteSlice3,
        PrintItem,
        PrintNewline,
        PrintItemTo,
        PrintNewlineTo,
        ReturnValue,
        RaiseVarargs,
        BreakLoop,
        ContinueLoop,
        JumpForward,
        JumpAbsolute,
        PopBlock,
        EndFinally,
        ImportStar,
        ExecStmt,
        SetupLoop,
        SetupExcept,
        SetupFinally,
        SetupWith,
    ],
    closes_if_bodies: true,
    variable_arity: &[
        CALL,
        ArityRule { opcode: CallFunctionVar, suffix: &["expr"], ..CALL },
        ArityRule { opcode: CallFunctionKw, suffix: &["expr"], ..CALL },
        ArityRule { opcode: CallFunctionVarKw, suffix: &["expr", "expr"], ..CALL },
        ArityRule::count(BuildTuple, "build_tuple", "expr"),
        ArityRule::count(BuildList, "build_list", "expr"),
        ArityRule::count(BuildSet, "build_set", "expr"),
        ArityRule::count(BuildSlice, "build_slice", "expr"),
        ArityRule::count(UnpackSequence, "unpack", "store").after(),
        ArityRule::count(RaiseVarargs, "raise_stmt", "expr"),
        ArityRule::count(MakeFunction, "mkfunc", "expr").with_suffix(&["LOAD_CONST"]),
        ArityRule::count(MakeClosure, "mkfunc", "expr").with_suffix(&["expr", "LOAD_CONST"]),
    ],
};
