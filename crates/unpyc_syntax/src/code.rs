//! Decoded code objects.
//!
//! A [`CodeObject`] is what the (external) loader hands us: the raw instruction bytes plus the pools that operands
//! index into. Nested functions and classes appear as [`Constant::Code`] entries of their enclosing object.

use std::fmt;
use std::sync::Arc;

use unpyc_core::DialectId;

/// A value from a code object's constant pool.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    None,
    Ellipsis,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Tuple(Vec<Constant>),
    Code(Arc<CodeObject>),
}

impl fmt::Display for Constant {
    /// Render the constant the way the source language would spell it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::None => f.write_str("None"),
            Constant::Ellipsis => f.write_str("Ellipsis"),
            Constant::Bool(true) => f.write_str("True"),
            Constant::Bool(false) => f.write_str("False"),
            Constant::Int(v) => write!(f, "{v}"),
            Constant::Float(v) => write!(f, "{v:?}"),
            Constant::Str(s) => write_quoted(f, s.chars()),
            Constant::Bytes(b) => {
                f.write_str("b")?;
                write_quoted(f, b.iter().map(|&c| c as char))
            }
            Constant::Tuple(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Constant::Code(code) => write!(f, "<code object {}>", code.name),
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, chars: impl Iterator<Item = char>) -> fmt::Result {
    f.write_str("'")?;
    for c in chars {
        match c {
            '\'' => f.write_str("\\'")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            c if c.is_control() => write!(f, "\\x{:02x}", c as u32)?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("'")
}

/// One compiled unit: instruction bytes plus constant, name and variable tables.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeObject {
    pub dialect: DialectId,
    pub name: String,
    pub code: Vec<u8>,
    pub consts: Vec<Constant>,
    pub names: Vec<String>,
    pub varnames: Vec<String>,
    pub cellvars: Vec<String>,
    pub freevars: Vec<String>,
    pub first_line: u32,
    /// Compressed `(byte increment, line increment)` pairs.
    pub lnotab: Vec<u8>,
}

impl CodeObject {
    /// Create a code object with empty pools.
    pub fn new(dialect: DialectId, name: impl Into<String>, code: Vec<u8>) -> Self {
        Self {
            dialect,
            name: name.into(),
            code,
            consts: Vec::new(),
            names: Vec::new(),
            varnames: Vec::new(),
            cellvars: Vec::new(),
            freevars: Vec::new(),
            first_line: 1,
            lnotab: Vec::new(),
        }
    }

    pub fn with_consts(mut self, consts: Vec<Constant>) -> Self {
        self.consts = consts;
        self
    }

    pub fn with_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_varnames<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.varnames = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cellvars<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.cellvars = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_freevars<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.freevars = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_lines(mut self, first_line: u32, lnotab: Vec<u8>) -> Self {
        self.first_line = first_line;
        self.lnotab = lnotab;
        self
    }

    /// Code objects nested directly in this one's constant pool (functions, classes, lambdas).
    pub fn nested(&self) -> impl Iterator<Item = &Arc<CodeObject>> {
        self.consts.iter().filter_map(|c| match c {
            Constant::Code(code) => Some(code),
            _ => None,
        })
    }

    /// Resolve a cell/free variable index: cells first, then free variables.
    pub fn deref_name(&self, index: usize) -> Option<&str> {
        if index < self.cellvars.len() {
            self.cellvars.get(index).map(String::as_str)
        } else {
            self.freevars.get(index - self.cellvars.len()).map(String::as_str)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_display() {
        assert_eq!(Constant::Str("it's".into()).to_string(), "'it\\'s'");
        assert_eq!(Constant::Tuple(vec![Constant::Int(1)]).to_string(), "(1,)");
        assert_eq!(Constant::Float(1.0).to_string(), "1.0");
        assert_eq!(Constant::Bytes(b"a\n".to_vec()).to_string(), "b'a\\n'");
    }

    #[test]
    fn test_deref_name_spans_cells_then_frees() {
        let code = CodeObject::new(DialectId::Py27, "f", vec![])
            .with_cellvars(["a"])
            .with_freevars(["b", "c"]);
        assert_eq!(code.deref_name(0), Some("a"));
        assert_eq!(code.deref_name(2), Some("c"));
        assert_eq!(code.deref_name(3), None);
    }

    #[test]
    fn test_nested_lists_code_constants() {
        let inner = Arc::new(CodeObject::new(DialectId::Py27, "inner", vec![]));
        let outer = CodeObject::new(DialectId::Py27, "<module>", vec![])
            .with_consts(vec![Constant::None, Constant::Code(inner.clone())]);
        let nested: Vec<_> = outer.nested().collect();
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].name, "inner");
    }
}
