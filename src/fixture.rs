//! JSON code-object fixtures.
//!
//! The CLI and the integration tests read code objects from JSON instead of marshalled `.pyc` files:
//!
//! ```json
//! {
//!   "magic": 62211,
//!   "name": "<module>",
//!   "code": "6400005300",
//!   "consts": [null, 1, "text", {"tuple": [1, 2]}, {"code": {"name": "f", "code": "6400005300", "consts": [null]}}],
//!   "names": ["a"],
//!   "first_line": 1,
//!   "lnotab": "0601"
//! }
//! ```
//!
//! ## Notes
//! - `magic` or `dialect` selects the dialect; nested code objects inherit their parent's dialect.
//! - `code`, `lnotab` and `{"bytes": ...}` constants are hex strings.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;
use unpyc_core::DialectId;
use unpyc_syntax::code::{CodeObject, Constant};

/// A fixture that could not be turned into a code object.
#[derive(Debug, Error, Diagnostic)]
pub enum FixtureError {
    #[error("cannot read {path}: {source}")]
    #[diagnostic(code(unpyc::fixture::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed fixture: {0}")]
    #[diagnostic(code(unpyc::fixture::json))]
    Json(#[from] serde_json::Error),

    #[error("field `{field}` of `{name}` is not valid hex")]
    #[diagnostic(code(unpyc::fixture::hex), help("use an even number of hex digits, without a 0x prefix"))]
    Hex { name: String, field: &'static str },

    #[error("unknown magic number {0}")]
    #[diagnostic(code(unpyc::decode::unknown_magic), help("supported dialects: py27 (62211), py36 (3360..=3379)"))]
    UnknownMagic(u16),

    #[error("unknown dialect `{0}`")]
    #[diagnostic(code(unpyc::fixture::dialect), help("use py27 or py36"))]
    UnknownDialect(String),

    #[error("code object `{0}` names no dialect")]
    #[diagnostic(code(unpyc::fixture::dialect), help("add a `magic` or `dialect` field, or pass --dialect"))]
    MissingDialect(String),
}

#[derive(Debug, Deserialize)]
struct CodeFixture {
    #[serde(default)]
    magic: Option<u16>,
    #[serde(default)]
    dialect: Option<String>,
    #[serde(default = "default_name")]
    name: String,
    code: String,
    #[serde(default)]
    consts: Vec<ConstantFixture>,
    #[serde(default)]
    names: Vec<String>,
    #[serde(default)]
    varnames: Vec<String>,
    #[serde(default)]
    cellvars: Vec<String>,
    #[serde(default)]
    freevars: Vec<String>,
    #[serde(default = "default_first_line")]
    first_line: u32,
    #[serde(default)]
    lnotab: String,
}

fn default_name() -> String {
    "<module>".to_string()
}

fn default_first_line() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ConstantFixture {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Tagged(TaggedConstant),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TaggedConstant {
    Code(Box<CodeFixture>),
    Tuple(Vec<ConstantFixture>),
    Bytes(String),
    Ellipsis {},
}

/// Read a fixture file.
///
/// ## Parameters
/// - `path`: JSON file in the format described in the module docs.
/// - `fallback`: dialect used when the top-level object names none.
///
/// ## Errors
/// - [`FixtureError`] if the file cannot be read or does not describe a code object.
pub fn load(path: &Path, fallback: Option<DialectId>) -> Result<Arc<CodeObject>, FixtureError> {
    let text = fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.display().to_string(),
        source,
    })?;
    from_json(&text, fallback)
}

/// Parse a fixture from JSON text.
///
/// ## Errors
/// - [`FixtureError`] if the text does not describe a code object.
pub fn from_json(text: &str, fallback: Option<DialectId>) -> Result<Arc<CodeObject>, FixtureError> {
    let fixture: CodeFixture = serde_json::from_str(text)?;
    Ok(Arc::new(fixture.into_code(fallback)?))
}

impl CodeFixture {
    fn into_code(self, inherited: Option<DialectId>) -> Result<CodeObject, FixtureError> {
        let dialect = match (self.magic, &self.dialect) {
            (Some(magic), _) => DialectId::from_magic(magic).ok_or(FixtureError::UnknownMagic(magic))?,
            (None, Some(name)) => DialectId::from_name(name).ok_or_else(|| FixtureError::UnknownDialect(name.clone()))?,
            (None, None) => inherited.ok_or_else(|| FixtureError::MissingDialect(self.name.clone()))?,
        };
        let code = decode_hex(&self.code).ok_or_else(|| FixtureError::Hex {
            name: self.name.clone(),
            field: "code",
        })?;
        let lnotab = decode_hex(&self.lnotab).ok_or_else(|| FixtureError::Hex {
            name: self.name.clone(),
            field: "lnotab",
        })?;
        let consts = self
            .consts
            .into_iter()
            .map(|c| c.into_constant(dialect, &self.name))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CodeObject::new(dialect, self.name, code)
            .with_consts(consts)
            .with_names(self.names)
            .with_varnames(self.varnames)
            .with_cellvars(self.cellvars)
            .with_freevars(self.freevars)
            .with_lines(self.first_line, lnotab))
    }
}

impl ConstantFixture {
    fn into_constant(self, dialect: DialectId, owner: &str) -> Result<Constant, FixtureError> {
        Ok(match self {
            ConstantFixture::None => Constant::None,
            ConstantFixture::Bool(b) => Constant::Bool(b),
            ConstantFixture::Int(v) => Constant::Int(v),
            ConstantFixture::Float(v) => Constant::Float(v),
            ConstantFixture::Str(s) => Constant::Str(s),
            ConstantFixture::Tagged(TaggedConstant::Code(code)) => Constant::Code(Arc::new(code.into_code(Some(dialect))?)),
            ConstantFixture::Tagged(TaggedConstant::Tuple(items)) => Constant::Tuple(
                items
                    .into_iter()
                    .map(|c| c.into_constant(dialect, owner))
                    .collect::<Result<_, _>>()?,
            ),
            ConstantFixture::Tagged(TaggedConstant::Bytes(hex)) => {
                Constant::Bytes(decode_hex(&hex).ok_or_else(|| FixtureError::Hex {
                    name: owner.to_string(),
                    field: "consts",
                })?)
            }
            ConstantFixture::Tagged(TaggedConstant::Ellipsis {}) => Constant::Ellipsis,
        })
    }
}

/// Decode a hex string, ignoring ASCII whitespace between digit pairs.
fn decode_hex(text: &str) -> Option<Vec<u8>> {
    let digits: Vec<u8> = text.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return None;
    }
    digits
        .chunks(2)
        .map(|pair| {
            let hi = (pair[0] as char).to_digit(16)?;
            let lo = (pair[1] as char).to_digit(16)?;
            Some((hi * 16 + lo) as u8)
        })
        .collect()
}
