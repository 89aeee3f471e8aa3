//! The GraphQL document abstract syntax tree, grounded on the teacher's `ast.rs` /
//! `parser/document.rs`, simplified to drop the generic `ScalarValue` parameter
//! (this crate's leaf scalar is always [`serde_json::Value`], see [`crate::value`]).

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value as Json;

/// A position in the original document source.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub struct Span {
    /// Zero-based line number.
    pub line: usize,
    /// Zero-based column number.
    pub column: usize,
}

impl Span {
    /// Constructs a new [`Span`].
    pub fn new(line: usize, column: usize) -> Self {
        Span { line, column }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// Wraps a syntax node together with the source span it was parsed from.
#[derive(Clone, Debug, PartialEq)]
pub struct Spanning<T> {
    /// The wrapped item.
    pub item: T,
    /// Start position of the item.
    pub start: Span,
    /// End position of the item.
    pub end: Span,
}

impl<T> Spanning<T> {
    /// Wraps `item` with a zero-width span starting and ending at `pos`.
    pub fn zero_width(pos: Span, item: T) -> Self {
        Spanning {
            item,
            start: pos,
            end: pos,
        }
    }

    /// Wraps `item` with an explicit start/end span.
    pub fn start_end(start: Span, end: Span, item: T) -> Self {
        Spanning { item, start, end }
    }

    /// Maps the wrapped item, keeping the span.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanning<U> {
        Spanning {
            item: f(self.item),
            start: self.start,
            end: self.end,
        }
    }

    /// Borrows the wrapped item.
    pub fn as_ref(&self) -> Spanning<&T> {
        Spanning {
            item: &self.item,
            start: self.start,
            end: self.end,
        }
    }
}

/// A type reference as written in a document (e.g. `[String!]!`).
///
/// Carries no semantic information; the compiler resolves the name against the
/// [`crate::registry::TypeGraph`] separately.
#[derive(Clone, Debug, PartialEq)]
pub enum Type {
    /// A bare named type, e.g. `String`.
    Named(String),
    /// A list of some inner type, e.g. `[T]`.
    List(Box<Type>),
    /// A non-null wrapper around some inner type, e.g. `T!`.
    NonNull(Box<Type>),
}

impl Type {
    /// The innermost named type, after stripping all `List`/`NonNull` wrappers.
    pub fn innermost_name(&self) -> &str {
        match self {
            Type::Named(n) => n,
            Type::List(inner) | Type::NonNull(inner) => inner.innermost_name(),
        }
    }

    /// `true` if the outermost modifier is `NonNull`.
    pub fn is_non_null(&self) -> bool {
        matches!(self, Type::NonNull(_))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Named(n) => write!(f, "{n}"),
            Type::List(inner) => write!(f, "[{inner}]"),
            Type::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

/// A literal value as written in a document, or a reference to a `$variable`.
///
/// This is the AST-level counterpart of [`crate::value::Value`]; it is resolved
/// against variable bindings during execution (spec.md §4.D phase 1).
#[derive(Clone, Debug, PartialEq)]
pub enum InputValue {
    /// `null`.
    Null,
    /// A reference to a declared variable, e.g. `$ep`.
    Variable(String),
    /// An integer literal.
    Int(i64),
    /// A float literal.
    Float(f64),
    /// A string literal.
    String(String),
    /// A boolean literal.
    Boolean(bool),
    /// A bare name used as an enum literal, e.g. `JEDI`.
    Enum(String),
    /// A list literal.
    List(Vec<Spanning<InputValue>>),
    /// An object literal, e.g. `{ stars: 5 }`.
    Object(Vec<(Spanning<String>, Spanning<InputValue>)>),
}

impl InputValue {
    /// Every variable name referenced anywhere inside this literal, recursively.
    pub fn referenced_variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            InputValue::Variable(name) => out.push(name),
            InputValue::List(items) => {
                for it in items {
                    it.item.referenced_variables(out);
                }
            }
            InputValue::Object(fields) => {
                for (_, v) in fields {
                    v.item.referenced_variables(out);
                }
            }
            _ => {}
        }
    }
}

/// Root of a parsed request document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    /// Every operation definition in the document, in source order.
    pub operations: Vec<Spanning<OperationDefinition>>,
    /// Every named fragment definition, keyed by name.
    pub fragments: IndexMap<String, Spanning<FragmentDefinition>>,
}

/// `query` / `mutation` / `subscription`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OperationType {
    /// A read-only operation.
    Query,
    /// A side-effecting operation.
    Mutation,
    /// A streaming operation.
    Subscription,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperationType::Query => "query",
            OperationType::Mutation => "mutation",
            OperationType::Subscription => "subscription",
        })
    }
}

/// A single `query Name($var: T) { ... }` definition.
#[derive(Clone, Debug, PartialEq)]
pub struct OperationDefinition {
    /// `query`, `mutation`, or `subscription`.
    pub operation_type: OperationType,
    /// Optional operation name.
    pub name: Option<String>,
    /// Declared `$variable: Type = default` list.
    pub variable_definitions: Vec<Spanning<VariableDefinition>>,
    /// Directives applied to the operation itself.
    pub directives: Vec<Spanning<Directive>>,
    /// The root selection set.
    pub selection_set: Vec<Spanning<Selection>>,
}

/// A `$var: Type = default` declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableDefinition {
    /// Variable name, without the leading `$`.
    pub name: String,
    /// Declared type.
    pub var_type: Spanning<Type>,
    /// Literal default value, if any.
    pub default_value: Option<Spanning<InputValue>>,
}

/// A named fragment: `fragment Name on Type { ... }`.
#[derive(Clone, Debug, PartialEq)]
pub struct FragmentDefinition {
    /// Fragment name.
    pub name: String,
    /// The `on Type` type condition.
    pub type_condition: String,
    /// Directives applied to the fragment spread site are attached to
    /// [`Selection::FragmentSpread`]; this is the definition's own directives.
    pub directives: Vec<Spanning<Directive>>,
    /// The fragment's selection set.
    pub selection_set: Vec<Spanning<Selection>>,
}

/// One entry of a selection set.
#[derive(Clone, Debug, PartialEq)]
pub enum Selection {
    /// A field selection, e.g. `hero(episode: JEDI) { name }`.
    Field(Field),
    /// A `...Name` fragment spread.
    FragmentSpread(FragmentSpread),
    /// An `... on Type { }` inline fragment.
    InlineFragment(InlineFragment),
}

/// A field selection.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    /// Output key: the alias if present, else the field name.
    pub alias: Option<String>,
    /// The field name as written in the document.
    pub name: String,
    /// Arguments, as written (literal or variable reference).
    pub arguments: Vec<(Spanning<String>, Spanning<InputValue>)>,
    /// Directives applied to this field.
    pub directives: Vec<Spanning<Directive>>,
    /// Nested selection set, empty for leaf (scalar/enum) fields.
    pub selection_set: Vec<Spanning<Selection>>,
}

impl Field {
    /// The key this field's result will be stored under in the output object.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// A `...Name` fragment spread.
#[derive(Clone, Debug, PartialEq)]
pub struct FragmentSpread {
    /// Name of the referenced fragment.
    pub name: String,
    /// Directives applied at the spread site.
    pub directives: Vec<Spanning<Directive>>,
}

/// An `... on Type { }` inline fragment.
#[derive(Clone, Debug, PartialEq)]
pub struct InlineFragment {
    /// The `on Type` condition, if present (absent applies unconditionally).
    pub type_condition: Option<String>,
    /// Directives applied to the inline fragment.
    pub directives: Vec<Spanning<Directive>>,
    /// The nested selection set.
    pub selection_set: Vec<Spanning<Selection>>,
}

/// A `@directive(arg: val)` application.
#[derive(Clone, Debug, PartialEq)]
pub struct Directive {
    /// Directive name, without the leading `@`.
    pub name: String,
    /// Arguments passed to the directive.
    pub arguments: Vec<(Spanning<String>, Spanning<InputValue>)>,
}

impl Directive {
    /// Looks up a named argument's literal value.
    pub fn argument(&self, name: &str) -> Option<&Spanning<InputValue>> {
        self.arguments
            .iter()
            .find(|(n, _)| n.item == name)
            .map(|(_, v)| v)
    }
}

/// Converts a fully variable-free [`InputValue`] into a JSON scalar tree.
///
/// Used when a literal default or directive argument needs to be evaluated without
/// going through variable binding (spec.md §4.C "Default values").
pub fn literal_to_json(value: &InputValue) -> Json {
    match value {
        InputValue::Null => Json::Null,
        InputValue::Variable(_) => Json::Null,
        InputValue::Int(i) => Json::from(*i),
        InputValue::Float(f) => Json::from(*f),
        InputValue::String(s) => Json::from(s.clone()),
        InputValue::Boolean(b) => Json::from(*b),
        InputValue::Enum(e) => Json::from(e.clone()),
        InputValue::List(items) => {
            Json::Array(items.iter().map(|s| literal_to_json(&s.item)).collect())
        }
        InputValue::Object(fields) => {
            let mut map = serde_json::Map::with_capacity(fields.len());
            for (k, v) in fields {
                map.insert(k.item.clone(), literal_to_json(&v.item));
            }
            Json::Object(map)
        }
    }
}
