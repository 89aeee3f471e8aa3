//! The error taxonomy of spec.md §7, grounded on the teacher's `GraphQLError`
//! (`lib.rs`) built with `derive_more`.

use derive_more::{Display, Error, From};
use serde::Serialize;

use crate::ast::Span;
use crate::parser::ParseError;

/// One `{message, locations, path}` entry of a response's `errors` array.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GraphError {
    /// Human-readable message.
    pub message: String,
    /// Source positions the error applies to, if any.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
    /// Response-tree path the error attaches to (spec.md §4.D phase 2).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,
    /// Implementation-specific diagnostics; stripped outside dev mode (spec.md §6).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Value>,
}

impl GraphError {
    /// Builds a bare message-only error.
    pub fn new(message: impl Into<String>) -> Self {
        GraphError {
            message: message.into(),
            locations: Vec::new(),
            path: Vec::new(),
            extensions: None,
        }
    }

    /// Attaches a source location.
    pub fn at(mut self, span: Span) -> Self {
        self.locations.push(Location::from(span));
        self
    }

    /// Attaches a response path.
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    /// Attaches sensitive extensions (only emitted in development mode).
    pub fn with_extensions(mut self, ext: serde_json::Value) -> Self {
        self.extensions = Some(ext);
        self
    }
}

/// One segment of a response path: either an object field name or a list index.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// A field name.
    Field(String),
    /// A list index.
    Index(usize),
}

/// A `{line, column}` location, 1-based for wire compatibility with GraphQL clients.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Location {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number.
    pub column: usize,
}

impl From<Span> for Location {
    fn from(s: Span) -> Self {
        Location {
            line: s.line + 1,
            column: s.column + 1,
        }
    }
}

/// A resolver-level error, attached to the selection path that produced it
/// (spec.md §7 item 5).
#[derive(Clone, Debug, Display, Error, PartialEq)]
#[display("{message}")]
pub struct FieldError {
    /// Human-readable message.
    pub message: String,
    /// Extra diagnostics surfaced only in development mode.
    pub extensions: Option<serde_json::Value>,
}

impl FieldError {
    /// Builds a plain message-only field error.
    pub fn new(message: impl Into<String>) -> Self {
        FieldError {
            message: message.into(),
            extensions: None,
        }
    }

    /// Attaches extensions (e.g. a captured panic's stack, spec.md §4.D step 2).
    pub fn with_extensions(mut self, ext: serde_json::Value) -> Self {
        self.extensions = Some(ext);
        self
    }
}

impl From<String> for FieldError {
    fn from(s: String) -> Self {
        FieldError::new(s)
    }
}

impl From<&str> for FieldError {
    fn from(s: &str) -> Self {
        FieldError::new(s)
    }
}

/// Registration-time error (spec.md §7 item 1). Fatal: the caller cannot serve a
/// coherent schema and should abort startup.
#[derive(Clone, Debug, Display, Error, PartialEq)]
pub enum RegistrationError {
    /// A scalar/type/enum name collides with an already-registered one.
    #[display("type name {_0:?} is already registered")]
    DuplicateTypeName(String),
    /// A scalar's host type is already bound to a different GraphQL name.
    #[display("host type for scalar {_0:?} is already registered under a different name")]
    DuplicateHostType(String),
    /// A name is not a valid GraphQL identifier (`/[_A-Za-z][_0-9A-Za-z]*/`).
    #[display("{_0:?} is not a valid GraphQL identifier")]
    InvalidName(String),
    /// A scalar definition is missing a required serialize/parse callback.
    #[display("scalar {_0:?} is missing a required callback")]
    MissingScalarCallback(String),
    /// A field/argument/return type references a type name not in the graph.
    #[display("unknown type {_0:?} referenced by {_1}")]
    UnknownType(String, String),
}

/// Compile-time error raised while binding a document against the type graph
/// (spec.md §7 item 3). Cacheable, alongside successful stubs.
#[derive(Clone, Debug, Display, Error, From, PartialEq)]
pub enum CompileError {
    /// Document failed to parse.
    #[display("{error}")]
    #[from(skip)]
    Parse {
        /// The underlying lexer/parser failure.
        error: ParseError,
        /// Where in the source text it occurred.
        span: Span,
    },
    /// Every root selection name was unrecognized; carries the offending names so
    /// callers can implement the strangler pattern (spec.md §4.C, §7 item 3).
    #[display("unknown command(s): {}", _1.join(", "))]
    #[from(skip)]
    UnknownCommand(Span, Vec<String>),
    /// A field/argument/type/enum-value/fragment name referenced by the document
    /// does not exist in the type graph.
    #[display("{message}")]
    #[from(skip)]
    Validation {
        /// Description of the failure.
        message: String,
        /// Where in the document it occurred.
        span: Span,
        /// Path of the failing selection, if inside one.
        path: Vec<PathSegment>,
    },
    /// A DoS-protection limit (depth/fields/aliases) was exceeded.
    #[from(skip)]
    #[display("{message}")]
    LimitExceeded {
        /// Description of which limit was exceeded.
        message: String,
        /// Location of the offending construct.
        span: Span,
    },
}

impl From<crate::ast::Spanning<ParseError>> for CompileError {
    fn from(e: crate::ast::Spanning<ParseError>) -> Self {
        CompileError::Parse { error: e.item, span: e.start }
    }
}

impl CompileError {
    /// The list of unregistered command names, if this is an
    /// [`CompileError::UnknownCommand`].
    pub fn unknown_commands(&self) -> Option<&[String]> {
        match self {
            CompileError::UnknownCommand(_, names) => Some(names),
            _ => None,
        }
    }

    /// Converts this compile error into a response-ready [`GraphError`].
    pub fn to_graph_error(&self) -> GraphError {
        match self {
            CompileError::Parse { error, span } => GraphError::new(error.to_string()).at(*span),
            CompileError::UnknownCommand(span, names) => {
                GraphError::new(format!("unknown command(s): {}", names.join(", "))).at(*span)
            }
            CompileError::Validation { message, span, path } => {
                GraphError::new(message.clone()).at(*span).with_path(path.clone())
            }
            CompileError::LimitExceeded { message, span } => {
                GraphError::new(message.clone()).at(*span)
            }
        }
    }
}

/// A variable-binding error (spec.md §7 item 4): JSON decode failure or a type
/// mismatch discovered while parsing the variables document against the stub's
/// declared variable types.
#[derive(Clone, Debug, Display, Error, PartialEq)]
#[display("{message}")]
pub struct VariableError {
    /// Description of the mismatch.
    pub message: String,
    /// Location of the variable's declaration in the document.
    pub span: Span,
}
