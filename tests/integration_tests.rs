//! End-to-end tests: JSON fixture → scanner → synthesized grammar → syntax tree.

use unpyc::fixture;
use unpyc::{DecompileError, DecompileOptions, Decompiled, Decompiler, SyntaxTree};

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Helper to run the full pipeline on a fixture built from raw code bytes.
fn decompile(header: &str, code: &[u8], consts: &str, names: &str) -> Result<Vec<Decompiled>, DecompileError> {
    let json = format!(r#"{{{header}, "code": "{}", "consts": {consts}, "names": {names}}}"#, hex(code));
    let code = fixture::from_json(&json, None).unwrap();
    Decompiler::new(DecompileOptions::default()).unwrap().decompile(&code)
}

fn tree_of(header: &str, code: &[u8], consts: &str, names: &str) -> SyntaxTree {
    let mut results = decompile(header, code, consts, names).unwrap();
    results.remove(0).tree
}

fn labels(tree: &SyntaxTree, id: unpyc_syntax::tree::NodeId) -> Vec<&str> {
    tree.children(id).iter().map(|&c| tree.label(c)).collect()
}

const PY27: &str = r#""magic": 62211"#;
const PY36: &str = r#""dialect": "py36""#;

// =============================================================================
// 2.7
// =============================================================================

#[test]
fn test_py27_if_else_has_two_flattened_arms() {
    // if a: x = 1
    // else: x = None
    let tree = tree_of(
        PY27,
        &[101, 0, 0, 114, 15, 0, 100, 1, 0, 90, 1, 0, 110, 6, 0, 100, 0, 0, 90, 1, 0, 100, 0, 0, 83],
        "[null, 1]",
        r#"["a", "x"]"#,
    );
    let ifs = tree.find_all("ifelsestmt");
    assert_eq!(ifs.len(), 1);
    assert_eq!(labels(&tree, ifs[0]), ["if_clause", "else_clause"]);
    for arm in tree.children(ifs[0]) {
        let stmts = tree.children(*arm).iter().find(|&&c| tree.label(c) == "stmts").copied().unwrap();
        assert_eq!(labels(&tree, stmts), ["assign"]);
    }
    assert_eq!(tree.find_all("COME_FROM").len(), 2);
}

#[test]
fn test_py27_for_loop() {
    // for x in it: 1
    let tree = tree_of(
        PY27,
        &[120, 18, 0, 101, 0, 0, 68, 93, 10, 0, 90, 1, 0, 100, 1, 0, 1, 113, 7, 0, 87, 100, 0, 0, 83],
        "[null, 1]",
        r#"["it", "x"]"#,
    );
    let loops = tree.find_all("forstmt");
    assert_eq!(loops.len(), 1);
    let children = labels(&tree, loops[0]);
    assert_eq!(children.first(), Some(&"SETUP_LOOP"));
    assert_eq!(children.last(), Some(&"COME_FROM_LOOP"));
    assert!(children.contains(&"FOR_ITER"));
    assert_eq!(tree.find_all("expr_stmt").len(), 1);
}

#[test]
fn test_py27_while_loop() {
    // while a: x = 1
    let tree = tree_of(
        PY27,
        &[120, 16, 0, 101, 0, 0, 114, 18, 0, 100, 1, 0, 90, 1, 0, 113, 3, 0, 87, 100, 0, 0, 83],
        "[null, 1]",
        r#"["a", "x"]"#,
    );
    assert_eq!(tree.find_all("whilestmt").len(), 1);
    assert!(tree.find_all("while1stmt").is_empty());
}

/// The `stmts` child of a statement node.
fn body(tree: &SyntaxTree, id: unpyc_syntax::tree::NodeId) -> unpyc_syntax::tree::NodeId {
    tree.children(id).iter().copied().find(|&c| tree.label(c) == "stmts").unwrap()
}

// The fixtures below are byte-for-byte CPython 2.7.18 output.

#[test]
fn test_py27_if_without_else_closes_with_jump() {
    // if a: x = 1
    let tree = tree_of(
        PY27,
        &[101, 0, 0, 114, 15, 0, 100, 0, 0, 90, 1, 0, 110, 0, 0, 100, 1, 0, 83],
        "[1, null]",
        r#"["a", "x"]"#,
    );
    insta::assert_snapshot!(tree.dump(), @r"
    code
      stmts
        ifstmt
          testexpr
            0 LOAD_NAME a
            3 POP_JUMP_IF_FALSE 15
          stmts
            assign
              6 LOAD_CONST 1
              9 STORE_NAME x
          12 JUMP_FORWARD 15
          15_0 COME_FROM 12
          15_1 COME_FROM 3
        return
          15 LOAD_CONST None
          18 RETURN_VALUE
    ");
}

#[test]
fn test_py27_if_not() {
    // if not a: x = 1
    let tree = tree_of(
        PY27,
        &[101, 0, 0, 115, 15, 0, 100, 0, 0, 90, 1, 0, 110, 0, 0, 100, 1, 0, 83],
        "[1, null]",
        r#"["a", "x"]"#,
    );
    let ifs = tree.find_all("ifstmt");
    assert_eq!(ifs.len(), 1);
    let test = tree.child(ifs[0], 0).unwrap();
    assert_eq!(labels(&tree, test), ["LOAD_NAME", "POP_JUMP_IF_TRUE"]);
}

#[test]
fn test_py27_if_and() {
    // if a and b: x = 1
    let tree = tree_of(
        PY27,
        &[101, 0, 0, 114, 21, 0, 101, 1, 0, 114, 21, 0, 100, 0, 0, 90, 2, 0, 110, 0, 0, 100, 1, 0, 83],
        "[1, null]",
        r#"["a", "b", "x"]"#,
    );
    let ifs = tree.find_all("ifstmt");
    assert_eq!(ifs.len(), 1);
    assert_eq!(
        labels(&tree, ifs[0]),
        ["testexpr_and", "stmts", "JUMP_FORWARD", "COME_FROM", "COME_FROM", "COME_FROM"]
    );
}

#[test]
fn test_py27_if_or() {
    // if a or b: x = 1
    let tree = tree_of(
        PY27,
        &[101, 0, 0, 115, 12, 0, 101, 1, 0, 114, 21, 0, 100, 0, 0, 90, 2, 0, 110, 0, 0, 100, 1, 0, 83],
        "[1, null]",
        r#"["a", "b", "x"]"#,
    );
    assert_eq!(tree.find_all("ifstmt").len(), 1);
    assert_eq!(tree.find_all("testexpr_or").len(), 1);
    assert!(tree.find_all("testexpr_and").is_empty());
}

#[test]
fn test_py27_two_ifs_in_a_row() {
    // if a: x = 1
    // if b: y = 2
    let tree = tree_of(
        PY27,
        &[
            101, 0, 0, 114, 15, 0, 100, 0, 0, 90, 1, 0, 110, 0, 0, 101, 2, 0, 114, 30, 0, 100, 1, 0, 90, 3, 0, 110,
            0, 0, 100, 2, 0, 83,
        ],
        "[1, 2, null]",
        r#"["a", "x", "b", "y"]"#,
    );
    let ifs = tree.find_all("ifstmt");
    assert_eq!(ifs.len(), 2);
    let top = tree.child(tree.root(), 0).unwrap();
    assert_eq!(labels(&tree, top), ["ifstmt", "ifstmt", "return"]);
}

#[test]
fn test_py27_nested_if_without_else() {
    // if a:
    //     if b: x = 1
    let tree = tree_of(
        PY27,
        &[
            101, 0, 0, 114, 24, 0, 101, 1, 0, 114, 24, 0, 100, 0, 0, 90, 2, 0, 113, 24, 0, 110, 0, 0, 100, 1, 0, 83,
        ],
        "[1, null]",
        r#"["a", "b", "x"]"#,
    );
    let ifs = tree.find_all("ifstmt");
    assert_eq!(ifs.len(), 2);
    assert!(tree.find_all("testexpr_and").is_empty());
    let outer = tree.child(tree.child(tree.root(), 0).unwrap(), 0).unwrap();
    assert_eq!(tree.label(outer), "ifstmt");
    assert_eq!(labels(&tree, body(&tree, outer)), ["ifstmt"]);
}

#[test]
fn test_py27_nested_if_inside_if_else() {
    // if a:
    //     if b: x = 1
    // else: y = 2
    let tree = tree_of(
        PY27,
        &[
            101, 0, 0, 114, 24, 0, 101, 1, 0, 114, 30, 0, 100, 0, 0, 90, 2, 0, 113, 30, 0, 110, 6, 0, 100, 1, 0, 90,
            3, 0, 100, 2, 0, 83,
        ],
        "[1, 2, null]",
        r#"["a", "b", "x", "y"]"#,
    );
    let if_elses = tree.find_all("ifelsestmt");
    assert_eq!(if_elses.len(), 1);
    let if_clause = tree.child(if_elses[0], 0).unwrap();
    assert_eq!(labels(&tree, body(&tree, if_clause)), ["ifstmt"]);
    let else_clause = tree.child(if_elses[0], 1).unwrap();
    assert_eq!(labels(&tree, body(&tree, else_clause)), ["assign"]);
}

#[test]
fn test_py27_elif() {
    // if a: x = 1
    // elif b: y = 2
    let tree = tree_of(
        PY27,
        &[
            101, 0, 0, 114, 15, 0, 100, 0, 0, 90, 1, 0, 110, 15, 0, 101, 2, 0, 114, 30, 0, 100, 1, 0, 90, 3, 0, 110,
            0, 0, 100, 2, 0, 83,
        ],
        "[1, 2, null]",
        r#"["a", "x", "b", "y"]"#,
    );
    let if_elses = tree.find_all("ifelsestmt");
    assert_eq!(if_elses.len(), 1);
    let else_clause = tree.child(if_elses[0], 1).unwrap();
    assert_eq!(labels(&tree, body(&tree, else_clause)), ["ifstmt"]);
}

#[test]
fn test_py27_while_with_break() {
    // while a:
    //     if b: break
    let tree = tree_of(
        PY27,
        &[120, 20, 0, 101, 0, 0, 114, 22, 0, 101, 1, 0, 114, 3, 0, 80, 113, 3, 0, 113, 3, 0, 87, 100, 0, 0, 83],
        "[null]",
        r#"["a", "b"]"#,
    );
    assert_eq!(tree.find_all("whilestmt").len(), 1);
    let ifs = tree.find_all("ifstmt");
    assert_eq!(ifs.len(), 1);
    assert_eq!(labels(&tree, body(&tree, ifs[0])), ["break"]);
}

#[test]
fn test_py27_for_with_continue() {
    // for x in y:
    //     if x: continue
    let tree = tree_of(
        PY27,
        &[
            120, 26, 0, 101, 0, 0, 68, 93, 18, 0, 90, 1, 0, 101, 1, 0, 114, 7, 0, 113, 7, 0, 113, 7, 0, 113, 7, 0,
            87, 100, 0, 0, 83,
        ],
        "[null]",
        r#"["y", "x"]"#,
    );
    assert_eq!(tree.find_all("forstmt").len(), 1);
    let ifs = tree.find_all("ifstmt");
    assert_eq!(ifs.len(), 1);
    assert_eq!(labels(&tree, body(&tree, ifs[0])), ["continue"]);
}

#[test]
fn test_py27_while_true() {
    // while 1: x = 1
    let tree = tree_of(
        PY27,
        &[120, 10, 0, 100, 0, 0, 90, 0, 0, 113, 3, 0, 87, 100, 1, 0, 83],
        "[1, null]",
        r#"["x"]"#,
    );
    let loops = tree.find_all("while1stmt");
    assert_eq!(loops.len(), 1);
    assert_eq!(
        labels(&tree, loops[0]),
        ["SETUP_LOOP", "come_froms", "stmts", "JUMP_BACK", "POP_BLOCK", "COME_FROM_LOOP"]
    );
    assert!(tree.find_all("whilestmt").is_empty());
}

#[test]
fn test_py27_while_true_with_break() {
    // while 1:
    //     if a: break
    //     x = 1
    let tree = tree_of(
        PY27,
        &[120, 20, 0, 101, 0, 0, 114, 13, 0, 80, 110, 0, 0, 100, 0, 0, 90, 1, 0, 113, 3, 0, 87, 100, 1, 0, 83],
        "[1, null]",
        r#"["a", "x"]"#,
    );
    let loops = tree.find_all("while1stmt");
    assert_eq!(loops.len(), 1);
    assert_eq!(labels(&tree, body(&tree, loops[0])), ["ifstmt", "assign"]);
    assert_eq!(tree.find_all("break").len(), 1);
}

#[test]
fn test_py27_bare_try_except() {
    // try: x = 1
    // except: x = None
    let code = [
        121, 10, 0, // 0 SETUP_EXCEPT → 13
        100, 1, 0, // 3 LOAD_CONST 1
        90, 0, 0, // 6 STORE_NAME x
        87, // 9 POP_BLOCK
        110, 13, 0, // 10 JUMP_FORWARD → 26
        1, 1, 1, // 13 POP_TOP x3
        100, 0, 0, // 16 LOAD_CONST None
        90, 0, 0, // 19 STORE_NAME x
        110, 1, 0, // 22 JUMP_FORWARD → 26
        88,  // 25 END_FINALLY
        100, 0, 0, // 26 LOAD_CONST None
        83,  // 29 RETURN_VALUE
    ];
    let tree = tree_of(PY27, &code, "[null, 1]", r#"["x"]"#);
    let tries = tree.find_all("trystmt");
    assert_eq!(tries.len(), 1);
    assert_eq!(tree.find_all("except_clause").len(), 1);
    assert_eq!(tree.find_all("assign").len(), 2);
    assert_eq!(tree.find_all("COME_FROM_EXCEPT").len(), 1);
}

#[test]
fn test_py27_call_is_synthesized() {
    // f(1)
    let tree = tree_of(PY27, &[101, 0, 0, 100, 1, 0, 131, 1, 0, 1, 100, 0, 0, 83], "[null, 1]", r#"["f"]"#);
    let calls = tree.find_all("call");
    assert_eq!(calls.len(), 1);
    assert_eq!(labels(&tree, calls[0]), ["LOAD_NAME", "LOAD_CONST", "CALL_FUNCTION_1"]);
}

#[test]
fn test_py27_nested_function_is_decompiled() {
    // def f(): return None
    let inner = r#"{"code": {"name": "f", "code": "6400005300", "consts": [null]}}"#;
    let results = decompile(
        PY27,
        &[100, 0, 0, 132, 0, 0, 90, 0, 0, 100, 1, 0, 83],
        &format!("[{inner}, null]"),
        r#"["f"]"#,
    )
    .unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].tree.find_all("funcdef").len(), 1);
    assert_eq!((results[1].name.as_str(), results[1].depth), ("f", 1));
    assert_eq!(results[1].tree.find_all("return").len(), 1);
}

#[test]
fn test_unparseable_stream_names_the_object() {
    // POP_TOP; RETURN_VALUE: nothing to pop
    let err = decompile(PY27, &[1, 83], "[]", "[]").unwrap_err();
    match err {
        DecompileError::Parse { name, source } => {
            assert_eq!(name, "<module>");
            assert_eq!(source.index, 0);
            assert_eq!(source.token, "POP_TOP");
        }
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn test_truncated_code_is_a_decode_error() {
    let err = decompile(PY27, &[100, 0], "[null]", "[]").unwrap_err();
    assert!(matches!(err, DecompileError::Decode { .. }));
}

#[test]
fn test_depth_ceiling_from_fixture() {
    let inner = r#"{"code": {"name": "f", "code": "6400005300", "consts": [null]}}"#;
    let json = format!(
        r#"{{{PY27}, "code": "{}", "consts": [{inner}, null], "names": ["f"]}}"#,
        hex(&[100, 0, 0, 132, 0, 0, 90, 0, 0, 100, 1, 0, 83])
    );
    let code = fixture::from_json(&json, None).unwrap();
    let decompiler = Decompiler::new(DecompileOptions::new().with_max_depth(0)).unwrap();
    let err = decompiler.decompile(&code).unwrap_err();
    assert!(matches!(err, DecompileError::RecursionLimitExceeded { depth: 1, limit: 0, .. }));
    assert_eq!(err.object_name(), Some("f"));
}

// =============================================================================
// 3.6
// =============================================================================

#[test]
fn test_py36_if_else() {
    // if a: x = 1
    // else: x = None
    let tree = tree_of(
        PY36,
        &[101, 0, 114, 10, 100, 1, 90, 1, 110, 4, 100, 0, 90, 1, 100, 0, 83, 0],
        "[null, 1]",
        r#"["a", "x"]"#,
    );
    let ifs = tree.find_all("ifelsestmt");
    assert_eq!(ifs.len(), 1);
    assert_eq!(labels(&tree, ifs[0]), ["if_clause", "else_clause"]);
}

#[test]
fn test_py36_if_without_else() {
    // if a: x = 1
    let tree = tree_of(PY36, &[101, 0, 114, 8, 100, 0, 90, 1, 100, 1, 83, 0], "[1, null]", r#"["a", "x"]"#);
    let ifs = tree.find_all("ifstmt");
    assert_eq!(ifs.len(), 1);
    assert_eq!(labels(&tree, ifs[0]), ["testexpr", "stmts", "COME_FROM"]);
}

#[test]
fn test_py36_while_true() {
    // while 1: x = 1
    let tree = tree_of(
        PY36,
        &[120, 8, 100, 0, 90, 0, 113, 2, 87, 0, 100, 1, 83, 0],
        "[1, null]",
        r#"["x"]"#,
    );
    let loops = tree.find_all("while1stmt");
    assert_eq!(loops.len(), 1);
    assert_eq!(labels(&tree, body(&tree, loops[0])), ["assign"]);
}

#[test]
fn test_py36_unpack_assignment() {
    // x, y = t
    let tree = tree_of(PY36, &[101, 0, 92, 2, 90, 1, 90, 2, 100, 0, 83, 0], "[null]", r#"["t", "x", "y"]"#);
    let assigns = tree.find_all("assign");
    assert_eq!(assigns.len(), 1);
    assert_eq!(labels(&tree, assigns[0]), ["LOAD_NAME", "unpack"]);
    let unpack = tree.find_all("unpack")[0];
    assert_eq!(labels(&tree, unpack), ["UNPACK_SEQUENCE_2", "STORE_NAME", "STORE_NAME"]);
}

#[test]
fn test_py36_function_definition() {
    // def f(): return None
    let inner = r#"{"code": {"name": "f", "code": "64005300", "consts": [null]}}"#;
    let results = decompile(
        PY36,
        &[100, 0, 100, 1, 132, 0, 90, 0, 100, 2, 83, 0],
        &format!(r#"[{inner}, "f", null]"#),
        r#"["f"]"#,
    )
    .unwrap();
    let tree = &results[0].tree;
    let defs = tree.find_all("funcdef");
    assert_eq!(defs.len(), 1);
    assert_eq!(labels(tree, tree.child(defs[0], 0).unwrap()), ["LOAD_CONST", "LOAD_CONST", "MAKE_FUNCTION_0"]);
    assert_eq!(results[1].name, "f");
}

#[test]
fn test_batch_keeps_going() {
    let good = fixture::from_json(r#"{"dialect": "py36", "code": "64005300", "consts": [null]}"#, None).unwrap();
    let bad = fixture::from_json(r#"{"dialect": "py36", "code": "0100", "consts": []}"#, None).unwrap();
    let decompiler = Decompiler::new(DecompileOptions::default()).unwrap();
    let results = decompiler.decompile_batch([&bad, &good, &bad]);
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results[1].is_ok());
}
