//! CPython 3.6 rules: `__build_class__` classes, f-strings, `yield from`, matrix multiplication, comprehensions in
//! their own code objects, and the 3.6 shapes of `with` and `except` (including the implicit `del` of a bound
//! exception name).

pub const RULES: &str = r#"
classdef ::= LOAD_BUILD_CLASS mkfunc expr CALL_FUNCTION_2 store
classdef ::= LOAD_BUILD_CLASS mkfunc expr expr CALL_FUNCTION_3 store
assert2 ::= expr POP_JUMP_IF_TRUE LOAD_GLOBAL expr CALL_FUNCTION_1 RAISE_VARARGS_1 COME_FROM

augassign ::= expr expr DUP_TOP_TWO BINARY_SUBSCR expr inplace_op ROT_THREE STORE_SUBSCR
delete_name ::= DELETE_DEREF

expr ::= LOAD_CLASSDEREF
expr ::= build_map
expr ::= joined_str
expr ::= formatted_value
expr ::= yield_from
formatted_value ::= expr FORMAT_VALUE
formatted_value ::= expr expr FORMAT_VALUE
yield_from ::= expr GET_YIELD_FROM_ITER LOAD_CONST YIELD_FROM

binary_op ::= BINARY_MATRIX_MULTIPLY
inplace_op ::= INPLACE_MATRIX_MULTIPLY

list_comp ::= BUILD_LIST_0 expr come_froms FOR_ITER store list_iter JUMP_BACK COME_FROM
dict_comp ::= BUILD_MAP_0 expr come_froms FOR_ITER store list_iter JUMP_BACK COME_FROM

withstmt ::= expr SETUP_WITH POP_TOP stmts_opt POP_BLOCK LOAD_CONST COME_FROM_WITH WITH_CLEANUP_START WITH_CLEANUP_FINISH END_FINALLY
withasstmt ::= expr SETUP_WITH store stmts_opt POP_BLOCK LOAD_CONST COME_FROM_WITH WITH_CLEANUP_START WITH_CLEANUP_FINISH END_FINALLY

except_clause ::= DUP_TOP expr COMPARE_OP_EXC POP_JUMP_IF_FALSE POP_TOP POP_TOP POP_TOP stmts_opt POP_EXCEPT jump_out COME_FROM
except_clause ::= DUP_TOP expr COMPARE_OP_EXC POP_JUMP_IF_FALSE POP_TOP POP_TOP POP_TOP stmts COME_FROM
except_clause ::= DUP_TOP expr COMPARE_OP_EXC POP_JUMP_IF_FALSE POP_TOP store POP_TOP SETUP_FINALLY stmts_opt POP_BLOCK POP_EXCEPT LOAD_CONST COME_FROM_FINALLY LOAD_CONST store delete_name END_FINALLY jump_out COME_FROM
except_clause ::= POP_TOP POP_TOP POP_TOP stmts_opt POP_EXCEPT jump_out
except_clause ::= POP_TOP POP_TOP POP_TOP stmts
"#;
