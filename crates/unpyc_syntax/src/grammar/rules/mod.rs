//! Base rule tables.
//!
//! Every dialect grammar is [`COMMON`] followed by that dialect's own table. Rules for variable-arity opcodes
//! (`call`, `build_tuple`, `mkfunc`, `unpack`, ...) are not listed here; the synthesizer adds them per code object.
//!
//! ## Notes
//! - Declaration order matters: when two productions for the same nonterminal both survive the reduce checks over
//!   the same span, the one declared first wins. `funcdef`/`classdef` come before `assign`, `assert` before `ifstmt`,
//!   the jump-closed forms of `ifstmt` before the bare ones, and each `and`-test form before the plain one. A 2.7
//!   `if a and b:` can also be read as two nested `if`s; the ordering picks the `and`.
//! - The grammar has no unit cycles (`A ::= B`, `B ::= A`); tree extraction relies on that.

mod py27;
mod py36;

use unpyc_core::DialectId;

/// Rules shared by every dialect.
pub const COMMON: &str = r#"
%goal code
%collect stmts come_froms dup_stores importlist load_attrs except_handlers
%optional stmts_opt
%singleton stmt expr store binary_op inplace_op unary_op jump_out except_target delete_name

code ::= stmts

stmts ::= stmts stmt
stmts ::= stmt
stmts_opt ::= stmts
stmts_opt ::=
come_froms ::= come_froms COME_FROM
come_froms ::= COME_FROM

# ---------------------------------------------------------------- statements
stmt ::= funcdef
stmt ::= classdef
stmt ::= assign
stmt ::= assign2
stmt ::= assign3
stmt ::= augassign
stmt ::= expr_stmt
stmt ::= return
stmt ::= del_stmt
stmt ::= import
stmt ::= import_as
stmt ::= import_from
stmt ::= import_star
stmt ::= break
stmt ::= continue
stmt ::= raise_stmt
stmt ::= assert
stmt ::= assert2
stmt ::= ifstmt
stmt ::= ifelsestmt
stmt ::= whilestmt
stmt ::= whileelsestmt
stmt ::= while1stmt
stmt ::= forstmt
stmt ::= forelsestmt
stmt ::= trystmt
stmt ::= tryelsestmt
stmt ::= tryfinallystmt
stmt ::= withstmt
stmt ::= withasstmt
stmt ::= generator_body

funcdef ::= mkfunc store

assign ::= expr store
assign ::= expr dup_stores store
dup_stores ::= dup_stores DUP_TOP store
dup_stores ::= DUP_TOP store
assign2 ::= expr expr ROT_TWO store store
assign3 ::= expr expr expr ROT_THREE ROT_TWO store store store

augassign ::= expr expr inplace_op store
augassign ::= expr DUP_TOP LOAD_ATTR expr inplace_op ROT_TWO STORE_ATTR

expr_stmt ::= expr POP_TOP
return ::= expr RETURN_VALUE

del_stmt ::= delete_name
del_stmt ::= expr DELETE_ATTR
del_stmt ::= expr expr DELETE_SUBSCR
delete_name ::= DELETE_NAME
delete_name ::= DELETE_FAST
delete_name ::= DELETE_GLOBAL

import ::= LOAD_CONST LOAD_CONST IMPORT_NAME store
import_as ::= LOAD_CONST LOAD_CONST IMPORT_NAME load_attrs store
load_attrs ::= load_attrs LOAD_ATTR
load_attrs ::= LOAD_ATTR
import_from ::= LOAD_CONST LOAD_CONST IMPORT_NAME importlist POP_TOP
importlist ::= importlist import_item
importlist ::= import_item
import_item ::= IMPORT_FROM store
import_star ::= LOAD_CONST LOAD_CONST IMPORT_NAME IMPORT_STAR

break ::= BREAK_LOOP
continue ::= JUMP_BACK
continue ::= CONTINUE_LOOP

assert ::= expr POP_JUMP_IF_TRUE LOAD_GLOBAL RAISE_VARARGS_1 COME_FROM

# ---------------------------------------------------------------- expressions
expr ::= LOAD_CONST
expr ::= LOAD_NAME
expr ::= LOAD_FAST
expr ::= LOAD_GLOBAL
expr ::= LOAD_DEREF
expr ::= LOAD_CLOSURE
expr ::= attribute
expr ::= subscript
expr ::= binary_expr
expr ::= unary_expr
expr ::= compare
expr ::= compare_chained
expr ::= and
expr ::= or
expr ::= ifexp
expr ::= call
expr ::= get_iter
expr ::= build_tuple
expr ::= build_list
expr ::= build_set
expr ::= build_slice
expr ::= mkfunc
expr ::= yield
expr ::= list_comp
expr ::= set_comp
expr ::= dict_comp

attribute ::= expr LOAD_ATTR
subscript ::= expr expr BINARY_SUBSCR
binary_expr ::= expr expr binary_op
unary_expr ::= expr unary_op
compare ::= expr expr COMPARE_OP
compare_chained ::= expr expr DUP_TOP ROT_THREE COMPARE_OP JUMP_IF_FALSE_OR_POP expr COMPARE_OP JUMP_FORWARD COME_FROM ROT_TWO POP_TOP COME_FROM
and ::= expr JUMP_IF_FALSE_OR_POP expr COME_FROM
or ::= expr JUMP_IF_TRUE_OR_POP expr COME_FROM
ifexp ::= expr POP_JUMP_IF_FALSE expr JUMP_FORWARD COME_FROM expr COME_FROM
get_iter ::= expr GET_ITER
yield ::= expr YIELD_VALUE

binary_op ::= BINARY_ADD
binary_op ::= BINARY_SUBTRACT
binary_op ::= BINARY_MULTIPLY
binary_op ::= BINARY_MODULO
binary_op ::= BINARY_POWER
binary_op ::= BINARY_FLOOR_DIVIDE
binary_op ::= BINARY_TRUE_DIVIDE
binary_op ::= BINARY_LSHIFT
binary_op ::= BINARY_RSHIFT
binary_op ::= BINARY_AND
binary_op ::= BINARY_XOR
binary_op ::= BINARY_OR

inplace_op ::= INPLACE_ADD
inplace_op ::= INPLACE_SUBTRACT
inplace_op ::= INPLACE_MULTIPLY
inplace_op ::= INPLACE_MODULO
inplace_op ::= INPLACE_POWER
inplace_op ::= INPLACE_FLOOR_DIVIDE
inplace_op ::= INPLACE_TRUE_DIVIDE
inplace_op ::= INPLACE_LSHIFT
inplace_op ::= INPLACE_RSHIFT
inplace_op ::= INPLACE_AND
inplace_op ::= INPLACE_XOR
inplace_op ::= INPLACE_OR

unary_op ::= UNARY_POSITIVE
unary_op ::= UNARY_NEGATIVE
unary_op ::= UNARY_NOT
unary_op ::= UNARY_INVERT

# Comprehension bodies. The list form differs per dialect (2.7 inlines it).
set_comp ::= BUILD_SET_0 expr come_froms FOR_ITER store list_iter JUMP_BACK COME_FROM
list_iter ::= expr LIST_APPEND
list_iter ::= expr SET_ADD
list_iter ::= expr expr MAP_ADD
list_iter ::= expr POP_JUMP_IF_FALSE list_iter
list_iter ::= expr POP_JUMP_IF_TRUE list_iter

generator_body ::= expr come_froms FOR_ITER store gen_iter JUMP_BACK COME_FROM
gen_iter ::= expr YIELD_VALUE POP_TOP
gen_iter ::= expr POP_JUMP_IF_FALSE gen_iter
gen_iter ::= expr POP_JUMP_IF_TRUE gen_iter

# ---------------------------------------------------------------- targets
store ::= STORE_NAME
store ::= STORE_FAST
store ::= STORE_GLOBAL
store ::= STORE_DEREF
store ::= expr STORE_ATTR
store ::= expr expr STORE_SUBSCR
store ::= unpack

# ---------------------------------------------------------------- conditionals
testexpr ::= expr POP_JUMP_IF_FALSE
testexpr ::= expr POP_JUMP_IF_TRUE
testexpr ::= testexpr_or
testexpr_or ::= expr POP_JUMP_IF_TRUE expr POP_JUMP_IF_FALSE COME_FROM
testexpr_and ::= expr POP_JUMP_IF_FALSE expr POP_JUMP_IF_FALSE

# 2.7 ends every `if` body with a jump to the merge point, `else` or not.
ifstmt ::= testexpr_and stmts_opt jump_out COME_FROM COME_FROM COME_FROM
ifstmt ::= testexpr stmts_opt jump_out COME_FROM COME_FROM
ifstmt ::= testexpr_and stmts_opt COME_FROM COME_FROM
ifstmt ::= testexpr stmts_opt COME_FROM
ifelsestmt ::= if_clause else_clause
if_clause ::= testexpr_and stmts_opt jump_out
if_clause ::= testexpr stmts_opt jump_out
else_clause ::= come_froms stmts COME_FROM
jump_out ::= JUMP_FORWARD
jump_out ::= JUMP_ABSOLUTE

# ---------------------------------------------------------------- loops
whilestmt ::= SETUP_LOOP come_froms testexpr_and stmts_opt JUMP_BACK come_froms POP_BLOCK COME_FROM_LOOP
whilestmt ::= SETUP_LOOP come_froms testexpr stmts_opt JUMP_BACK come_froms POP_BLOCK COME_FROM_LOOP
whileelsestmt ::= SETUP_LOOP come_froms testexpr stmts_opt JUMP_BACK come_froms POP_BLOCK stmts COME_FROM_LOOP
while1stmt ::= SETUP_LOOP come_froms stmts JUMP_BACK POP_BLOCK COME_FROM_LOOP
forstmt ::= SETUP_LOOP expr GET_ITER come_froms FOR_ITER store stmts_opt JUMP_BACK COME_FROM POP_BLOCK COME_FROM_LOOP
forelsestmt ::= SETUP_LOOP expr GET_ITER come_froms FOR_ITER store stmts_opt JUMP_BACK COME_FROM POP_BLOCK stmts COME_FROM_LOOP

# ---------------------------------------------------------------- exceptions
trystmt ::= SETUP_EXCEPT stmts_opt POP_BLOCK jump_out COME_FROM_EXCEPT except_handlers END_FINALLY come_froms
tryelsestmt ::= SETUP_EXCEPT stmts_opt POP_BLOCK jump_out COME_FROM_EXCEPT except_handlers END_FINALLY COME_FROM stmts come_froms
except_handlers ::= except_handlers except_clause
except_handlers ::= except_clause
tryfinallystmt ::= SETUP_FINALLY stmts_opt POP_BLOCK LOAD_CONST COME_FROM_FINALLY stmts_opt END_FINALLY
"#;

/// Dialect-specific rules appended to [`COMMON`].
pub fn dialect_rules(dialect: DialectId) -> &'static str {
    match dialect {
        DialectId::Py27 => py27::RULES,
        DialectId::Py36 => py36::RULES,
    }
}
