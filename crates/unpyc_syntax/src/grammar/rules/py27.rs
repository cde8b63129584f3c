//! CPython 2.7 rules: print statements, `exec`, classic classes, `STORE_MAP` dict displays, `SLICE+n`, and the
//! 2.7 shapes of `with` and `except`.

pub const RULES: &str = r#"
%collect kvlist print_to_items

stmt ::= print_item
stmt ::= print_nl
stmt ::= print_to
stmt ::= exec_stmt

print_item ::= expr PRINT_ITEM
print_nl ::= PRINT_NEWLINE
print_to ::= expr print_to_items PRINT_NEWLINE_TO
print_to ::= expr print_to_items POP_TOP
print_to_items ::= print_to_items print_to_item
print_to_items ::= print_to_item
print_to_item ::= DUP_TOP expr ROT_TWO PRINT_ITEM_TO

exec_stmt ::= expr expr DUP_TOP EXEC_STMT
exec_stmt ::= expr expr expr EXEC_STMT

classdef ::= LOAD_CONST expr mkfunc CALL_FUNCTION_0 BUILD_CLASS store
assert2 ::= expr POP_JUMP_IF_TRUE LOAD_GLOBAL expr RAISE_VARARGS_2 COME_FROM

augassign ::= expr expr DUP_TOPX BINARY_SUBSCR expr inplace_op ROT_THREE STORE_SUBSCR

expr ::= LOAD_LOCALS
expr ::= dict
expr ::= slice_expr
kwarg ::= LOAD_CONST expr

dict ::= BUILD_MAP
dict ::= BUILD_MAP kvlist
kvlist ::= kvlist kv
kvlist ::= kv
kv ::= expr expr STORE_MAP

slice_expr ::= expr SLICE_0
slice_expr ::= expr expr SLICE_1
slice_expr ::= expr expr SLICE_2
slice_expr ::= expr expr expr SLICE_3
store ::= expr STORE_SLICE_0
store ::= expr expr STORE_SLICE_1
store ::= expr expr STORE_SLICE_2
store ::= expr expr expr STORE_SLICE_3
del_stmt ::= expr DELETE_SLICE_0
del_stmt ::= expr expr DELETE_SLICE_1
del_stmt ::= expr expr DELETE_SLICE_2
del_stmt ::= expr expr expr DELETE_SLICE_3

binary_op ::= BINARY_DIVIDE
inplace_op ::= INPLACE_DIVIDE
unary_op ::= UNARY_CONVERT

list_comp ::= BUILD_LIST_0 expr GET_ITER come_froms FOR_ITER store list_iter JUMP_BACK COME_FROM
dict_comp ::= BUILD_MAP expr come_froms FOR_ITER store list_iter JUMP_BACK COME_FROM

withstmt ::= expr SETUP_WITH POP_TOP stmts_opt POP_BLOCK LOAD_CONST COME_FROM_WITH WITH_CLEANUP END_FINALLY
withasstmt ::= expr SETUP_WITH store stmts_opt POP_BLOCK LOAD_CONST COME_FROM_WITH WITH_CLEANUP END_FINALLY

except_clause ::= DUP_TOP expr COMPARE_OP_EXC POP_JUMP_IF_FALSE POP_TOP except_target POP_TOP stmts_opt jump_out COME_FROM
except_clause ::= DUP_TOP expr COMPARE_OP_EXC POP_JUMP_IF_FALSE POP_TOP except_target POP_TOP stmts COME_FROM
except_clause ::= POP_TOP POP_TOP POP_TOP stmts_opt jump_out
except_clause ::= POP_TOP POP_TOP POP_TOP stmts
except_target ::= store
except_target ::= POP_TOP
"#;
