//! Arena syntax tree produced by the parser.
//!
//! Nodes live in one `Vec` and refer to each other by [`NodeId`]. Children are owned by position in their parent's
//! child list; the parent link is a separate index map kept by the tree itself, used for navigation only.
//!
//! ## Notes
//! - Leaves carry the index of the [`Token`] they were built from; interior nodes carry a nonterminal label.
//! - Spans are half-open token-index ranges filled bottom-up while the tree is built. An empty production (for
//!   example an empty `stmts_opt`) has `start == end`.

use std::fmt::Write as _;

use crate::token::Token;

/// Index of a node in its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Half-open range of token indices covered by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub label: String,
    /// Token index for leaves.
    pub token: Option<usize>,
    pub children: Vec<NodeId>,
    pub span: Span,
}

/// Traversal control returned by a [`SyntaxTree::walk`] visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Continue,
    /// Skip this node's children but keep walking its siblings.
    StopDescent,
}

/// Incrementally builds a [`SyntaxTree`] bottom-up.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<Node>,
    parents: Vec<Option<NodeId>>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        for &child in &node.children {
            self.parents[child.index()] = Some(id);
        }
        self.nodes.push(node);
        self.parents.push(None);
        id
    }

    /// Add a leaf for token `index`, labeled with the token's kind.
    pub fn leaf(&mut self, label: impl Into<String>, index: usize) -> NodeId {
        self.push(Node {
            label: label.into(),
            token: Some(index),
            children: Vec::new(),
            span: Span::new(index, index + 1),
        })
    }

    /// Add an interior node. `span` is used when there are no children; otherwise it is derived from them.
    pub fn node(&mut self, label: impl Into<String>, children: Vec<NodeId>, span: Span) -> NodeId {
        let span = match (children.first(), children.last()) {
            (Some(first), Some(last)) => Span::new(self.nodes[first.index()].span.start, self.nodes[last.index()].span.end),
            _ => span,
        };
        self.push(Node {
            label: label.into(),
            token: None,
            children,
            span,
        })
    }

    /// Append `children` to an existing node (left-flattening of repetition lists).
    pub fn append(&mut self, acc: NodeId, children: impl IntoIterator<Item = NodeId>) {
        for child in children {
            self.parents[child.index()] = Some(acc);
            let end = self.nodes[child.index()].span.end;
            let node = &mut self.nodes[acc.index()];
            node.children.push(child);
            node.span.end = node.span.end.max(end);
        }
    }

    pub fn label(&self, id: NodeId) -> &str {
        &self.nodes[id.index()].label
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes[id.index()].token.is_some()
    }

    pub fn finish(self, root: NodeId, tokens: Vec<Token>) -> SyntaxTree {
        SyntaxTree {
            nodes: self.nodes,
            parents: self.parents,
            root,
            tokens,
        }
    }
}

/// Result of parsing one code object.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    parents: Vec<Option<NodeId>>,
    root: NodeId,
    tokens: Vec<Token>,
}

impl SyntaxTree {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn label(&self, id: NodeId) -> &str {
        &self.nodes[id.index()].label
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn child(&self, id: NodeId, n: usize) -> Option<NodeId> {
        self.children(id).get(n).copied()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents[id.index()]
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.index()].span
    }

    /// The token a leaf was built from.
    pub fn token(&self, id: NodeId) -> Option<&Token> {
        self.nodes[id.index()].token.map(|i| &self.tokens[i])
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes[id.index()].token.is_some()
    }

    /// Pre-order traversal from the root. The visitor receives each node and its depth.
    pub fn walk<F>(&self, mut visit: F)
    where
        F: FnMut(NodeId, usize) -> Walk,
    {
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            if visit(id, depth) == Walk::StopDescent {
                continue;
            }
            for &child in self.children(id).iter().rev() {
                stack.push((child, depth + 1));
            }
        }
    }

    /// All nodes labeled `label`, in pre-order.
    pub fn find_all(&self, label: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.walk(|id, _| {
            if self.label(id) == label {
                found.push(id);
            }
            Walk::Continue
        });
        found
    }

    /// Indented outline of the tree; leaves render as `offset KIND pattr`.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.walk(|id, depth| {
            let indent = "  ".repeat(depth);
            match self.token(id) {
                Some(token) => {
                    let _ = writeln!(out, "{indent}{token}");
                }
                None => {
                    let _ = writeln!(out, "{indent}{}", self.label(id));
                }
            }
            Walk::Continue
        });
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Argument;
    use crate::token::TokenOffset;

    fn token(kind: &str, offset: u32) -> Token {
        Token {
            kind: kind.to_string(),
            offset: TokenOffset::real(offset),
            attr: Argument::None,
            pattr: String::new(),
            opcode: None,
            source_line: None,
        }
    }

    fn sample() -> SyntaxTree {
        let mut b = TreeBuilder::new();
        let load = b.leaf("LOAD_CONST", 0);
        let ret = b.leaf("RETURN_VALUE", 1);
        let expr = b.node("expr", vec![load], Span::default());
        let stmt = b.node("return", vec![expr, ret], Span::default());
        let stmts = b.node("stmts", vec![stmt], Span::default());
        let root = b.node("code", vec![stmts], Span::default());
        b.finish(root, vec![token("LOAD_CONST", 0), token("RETURN_VALUE", 3)])
    }

    #[test]
    fn test_spans_are_derived_from_children() {
        let tree = sample();
        assert_eq!(tree.span(tree.root()), Span::new(0, 2));
        let ret = tree.find_all("return")[0];
        assert_eq!(tree.span(ret), Span::new(0, 2));
    }

    #[test]
    fn test_parent_links() {
        let tree = sample();
        let expr = tree.find_all("expr")[0];
        let parent = tree.parent(expr).unwrap();
        assert_eq!(tree.label(parent), "return");
        assert_eq!(tree.parent(tree.root()), None);
    }

    #[test]
    fn test_stop_descent_skips_children() {
        let tree = sample();
        let mut seen = Vec::new();
        tree.walk(|id, _| {
            seen.push(tree.label(id).to_string());
            if tree.label(id) == "return" { Walk::StopDescent } else { Walk::Continue }
        });
        assert_eq!(seen, vec!["code", "stmts", "return"]);
    }

    #[test]
    fn test_append_extends_span() {
        let mut b = TreeBuilder::new();
        let a = b.leaf("A", 0);
        let c = b.leaf("C", 1);
        let list = b.node("stmts", vec![a], Span::default());
        b.append(list, [c]);
        let tree = b.finish(list, vec![token("A", 0), token("C", 1)]);
        assert_eq!(tree.children(list).len(), 2);
        assert_eq!(tree.span(list), Span::new(0, 2));
        assert_eq!(tree.parent(c), Some(list));
    }

    #[test]
    fn test_dump_renders_leaves_with_offsets() {
        let tree = sample();
        let dump = tree.dump();
        assert!(dump.starts_with("code\n  stmts\n    return\n"), "{dump}");
        assert!(dump.contains("        0 LOAD_CONST\n"), "{dump}");
        assert!(dump.contains("      3 RETURN_VALUE\n"), "{dump}");
    }
}
