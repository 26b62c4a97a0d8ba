//! Action templates: `${var}` substitution, `${var?}...${else}...${end}`
//! conditionals and `$$` escapes.
//!
//! A template is parsed once into a [`Document`] and then rendered against a
//! set of [`Variables`]. Parsing is the only step that can fail; a parsed
//! document always renders.

use std::fmt;

use thiserror::Error;

use crate::position::{Location, Span};

mod parser;
mod render;
mod usage;

pub use parser::parse;
pub use render::{Variables, render};
pub use usage::usage;

/// Positional arguments are bound to `${0}` through `${9}`.
pub const MAX_POSITIONAL: usize = 10;

/// Characters allowed in variable, action and config key names.
#[must_use]
pub fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// The name inside a `${...}` block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VarName {
    /// `${0}`..`${9}`, bound to a positional argument.
    Positional(usize),
    /// Any other identifier, bound by `--name value` or a config default.
    Named(String),
}

impl From<&str> for VarName {
    fn from(name: &str) -> Self {
        let mut chars = name.chars();
        match (chars.next().and_then(|c| c.to_digit(10)), chars.next()) {
            (Some(index), None) => VarName::Positional(index as usize),
            _ => VarName::Named(name.to_string()),
        }
    }
}

impl fmt::Display for VarName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarName::Positional(index) => write!(f, "{index}"),
            VarName::Named(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Literal(String),
    Var(VarName),
    Conditional {
        name: VarName,
        then: Vec<Node>,
        otherwise: Option<Vec<Node>>,
    },
}

/// A fully parsed template. Every conditional in it is closed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("Unexpected character (use $$ to output a literal $)")]
    BareDollar,
    #[error("Only a single variable allowed per block")]
    MultipleVariables,
    #[error("Missing variable")]
    MissingVariable,
    #[error("Unexpected character")]
    UnexpectedCharacter,
    #[error("Too many ${{else}} blocks")]
    TooManyElse,
    #[error("Missing ${{end}}")]
    MissingEnd,
    #[error("Unexpected ${{end}} block")]
    UnexpectedEnd,
    #[error("Unexpected ${{else}} block")]
    UnexpectedElse,
    #[error("Unfinished variable block")]
    UnfinishedBlock,
    #[error("Conditionals nested too deeply (at most {} levels)", parser::MAX_NESTING)]
    TooDeep,
}

/// A template that failed to parse, pointing at the offending text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Error: {kind}.\n{location}")]
pub struct TemplateError {
    pub kind: ErrorKind,
    pub span: Span,
    pub location: Location,
}

impl TemplateError {
    pub(crate) fn new(kind: ErrorKind, source: &str, span: Span) -> Self {
        TemplateError {
            kind,
            span,
            location: Location::locate(source, span),
        }
    }
}
