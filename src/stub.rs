//! Component C: the Request Stub Compiler (spec.md §3.2, §4.C).
//!
//! Binds a parsed [`Document`] against a [`TypeGraph`], fully inlining fragments
//! and resolving every name the document mentions, producing a [`RequestStub`]
//! that is reusable across many executions with different variable values.
//!
//! Grounded on the teacher's `validation/*` rule-based resolution of
//! fragments/fields/arguments and the `Registry`/`Executor` construction path in
//! `executor/mod.rs`.

use std::collections::HashSet;
use std::fmt;

use arcstr::ArcStr;
use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::ast::{
    literal_to_json, Directive, Document, Field, InputValue, OperationDefinition, OperationType,
    Selection, Span, Spanning,
};
use crate::error::{CompileError, PathSegment};
use crate::registry::{AnyValue, FieldKind, FunctionMode, GraphFunction, Resolved, TypeGraph, TypeKind, TypeLookup};
use crate::validation::QueryLimits;

use std::sync::Arc;

/// A fully variable-bound or variable-deferred argument value, shaped like
/// [`InputValue`] but pre-validated against the type graph (spec.md §4.C
/// "Arguments ... type-checked eagerly").
#[derive(Clone, Debug, PartialEq)]
pub enum BoundValue {
    /// A literal already converted to JSON.
    Literal(Json),
    /// A reference to a request variable, resolved at execution time.
    Variable(ArcStr),
    /// A list of further bound values.
    List(Vec<BoundValue>),
    /// An input-object literal, field name to bound value.
    Object(IndexMap<ArcStr, BoundValue>),
}

impl BoundValue {
    /// Resolves this value against a request's bound variables (spec.md §4.D
    /// phase 2 "Build the argument tuple").
    pub fn resolve(&self, vars: &IndexMap<String, Json>) -> Json {
        match self {
            BoundValue::Literal(j) => j.clone(),
            BoundValue::Variable(name) => vars.get(name.as_str()).cloned().unwrap_or(Json::Null),
            BoundValue::List(items) => Json::Array(items.iter().map(|v| v.resolve(vars)).collect()),
            BoundValue::Object(fields) => {
                let mut map = serde_json::Map::with_capacity(fields.len());
                for (k, v) in fields {
                    map.insert(k.to_string(), v.resolve(vars));
                }
                Json::Object(map)
            }
        }
    }
}

/// A declared `$variable`'s resolved type and default, after compile-time binding.
#[derive(Clone, Debug)]
pub struct VariableType {
    /// The variable's declared type.
    pub type_lookup: TypeLookup,
    /// `true` if the variable has no default and must be supplied.
    pub required: bool,
    /// The literal default value, if declared.
    pub default_value: Option<Json>,
}

/// A boolean guard attached to `@skip`/`@include` (spec.md §4.C "Directives").
#[derive(Clone, Debug, PartialEq)]
pub enum ArgGuard {
    /// A literal `true`/`false`.
    Literal(bool),
    /// A boolean variable reference.
    Variable(ArcStr),
}

impl ArgGuard {
    /// Resolves this guard to a concrete boolean.
    pub fn resolve(&self, vars: &IndexMap<String, Json>) -> bool {
        match self {
            ArgGuard::Literal(b) => *b,
            ArgGuard::Variable(name) => vars.get(name.as_str()).and_then(Json::as_bool).unwrap_or(false),
        }
    }
}

/// How a [`BoundField`]'s value is produced.
#[derive(Clone)]
pub enum BoundFieldKind {
    /// The meta-field `__typename`, resolved dynamically to the concrete type name.
    TypeName,
    /// A direct accessor into the receiver.
    Plain {
        /// Downcast-and-read accessor, shared with the registry entry.
        accessor: Arc<dyn Fn(&AnyValue) -> Resolved + Send + Sync>,
        /// The field's declared result type.
        result_type: TypeLookup,
        /// Compiled selection plan for this field's own selections, if any.
        children: SelectionPlan,
    },
    /// A registered callable invoked with the receiver and bound arguments.
    Resolver {
        /// The callable this field invokes.
        function: Arc<GraphFunction>,
        /// Bound argument values, keyed by GraphQL argument name.
        args: IndexMap<ArcStr, BoundValue>,
        /// Compiled selection plan for this field's own selections, if any.
        children: SelectionPlan,
    },
}

/// One field of a compiled selection set.
#[derive(Clone)]
pub struct BoundField {
    /// The output key (alias if present, else the field name).
    pub response_key: ArcStr,
    /// Source position, for error reporting.
    pub span: Span,
    /// If present, this field only applies when the runtime value's concrete type
    /// satisfies this condition (spec.md §4.C "ImplementsInterface").
    pub type_condition: Option<ArcStr>,
    /// Any true guard excludes this field (`@skip`).
    pub skip_guards: Vec<ArgGuard>,
    /// Any false guard excludes this field (`@include`).
    pub include_guards: Vec<ArgGuard>,
    /// How the value is produced.
    pub kind: BoundFieldKind,
}

impl BoundField {
    /// `true` if this field should be evaluated given the current variable bindings.
    pub fn is_active(&self, vars: &IndexMap<String, Json>) -> bool {
        self.skip_guards.iter().all(|g| !g.resolve(vars)) && self.include_guards.iter().all(|g| g.resolve(vars))
    }
}

/// A compiled, ordered list of fields to select against a value of some type.
#[derive(Clone, Default)]
pub struct SelectionPlan {
    /// Fields in document (post-alias) order.
    pub fields: Vec<BoundField>,
}

/// The compiled, variable-independent plan for a document (spec.md §3.2).
pub struct RequestStub {
    /// The chosen operation's name, if it had one.
    pub operation_name: Option<String>,
    /// `query` / `mutation` / `subscription`.
    pub operation_kind: OperationType,
    /// Declared variable types, keyed by name without the leading `$`.
    pub variable_types: IndexMap<String, VariableType>,
    /// Root field selections, in document order.
    pub root_selections: Vec<BoundField>,
}

struct Ctx<'a> {
    graph: &'a TypeGraph,
    document: &'a Document,
    variable_types: &'a IndexMap<String, VariableType>,
    limits: &'a QueryLimits,
}

/// A flattened field occurrence: fragments have been inlined, but the field
/// itself has not yet been bound against the type graph.
struct FlatField<'a> {
    field: &'a Field,
    span: Span,
    type_condition: Option<String>,
    skip_guards: Vec<ArgGuard>,
    include_guards: Vec<ArgGuard>,
}

/// Compiles `document` against `graph` into a [`RequestStub`] (spec.md §4.C).
pub fn compile(
    graph: &TypeGraph,
    document: &Document,
    operation_name: Option<&str>,
    limits: &QueryLimits,
) -> Result<RequestStub, CompileError> {
    let op = select_operation(document, operation_name)?;

    let variable_types = bind_variable_types(graph, &op.item)?;
    let ctx = Ctx {
        graph,
        document,
        variable_types: &variable_types,
        limits,
    };

    let mode = match op.item.operation_type {
        OperationType::Query => FunctionMode::Query,
        OperationType::Mutation => FunctionMode::Mutation,
        OperationType::Subscription => FunctionMode::Subscription,
    };

    let mut alias_seen = HashSet::new();
    let root_selections = compile_root_selections(&ctx, mode, &op.item.selection_set, 1, &mut alias_seen)?;

    Ok(RequestStub {
        operation_name: op.item.name.clone(),
        operation_kind: op.item.operation_type,
        variable_types,
        root_selections,
    })
}

fn select_operation<'a>(
    document: &'a Document,
    operation_name: Option<&str>,
) -> Result<&'a Spanning<OperationDefinition>, CompileError> {
    if document.operations.is_empty() {
        return Err(validation_err("document contains no operations", zero_span()));
    }
    if let Some(name) = operation_name {
        return document
            .operations
            .iter()
            .find(|o| o.item.name.as_deref() == Some(name))
            .ok_or_else(|| validation_err(format!("unknown operation {name:?}"), zero_span()));
    }
    if document.operations.len() == 1 {
        return Ok(&document.operations[0]);
    }
    Err(validation_err(
        "multiple operations in document; an operation name must be specified",
        zero_span(),
    ))
}

fn zero_span() -> Span {
    Span::new(0, 0)
}

fn validation_err(message: impl Into<String>, span: Span) -> CompileError {
    CompileError::Validation {
        message: message.into(),
        span,
        path: Vec::new(),
    }
}

/// Like [`validation_err`], but attaches the response-key path of the field the
/// failing argument/value belongs to (spec.md §8's invalid-enum-literal example:
/// `{"path": ["hero"]}`).
fn validation_err_at(message: impl Into<String>, span: Span, path: &[ArcStr]) -> CompileError {
    CompileError::Validation {
        message: message.into(),
        span,
        path: path.iter().map(|s| PathSegment::Field(s.to_string())).collect(),
    }
}

fn limit_err(message: impl Into<String>, span: Span) -> CompileError {
    CompileError::LimitExceeded {
        message: message.into(),
        span,
    }
}

fn bind_variable_types(
    graph: &TypeGraph,
    op: &OperationDefinition,
) -> Result<IndexMap<String, VariableType>, CompileError> {
    let mut out = IndexMap::new();
    for def in &op.variable_definitions {
        let type_lookup = resolve_ast_type(graph, &def.item.var_type.item)
            .map_err(|msg| validation_err(msg, def.item.var_type.start))?;

        let default_value = match &def.item.default_value {
            Some(lit) => Some(literal_only_json(graph, &type_lookup, lit)?),
            None => None,
        };
        let required = matches!(def.item.var_type.item, crate::ast::Type::NonNull(_)) && default_value.is_none();

        out.insert(
            def.item.name.clone(),
            VariableType {
                type_lookup,
                required,
                default_value,
            },
        );
    }
    Ok(out)
}

/// Resolves an AST [`crate::ast::Type`] to a [`TypeLookup`], erroring if the named
/// root type is not in the graph.
fn resolve_ast_type(graph: &TypeGraph, ty: &crate::ast::Type) -> Result<TypeLookup, String> {
    use crate::ast::Type as AstType;

    fn go(graph: &TypeGraph, ty: &AstType, is_pointer: bool) -> Result<TypeLookup, String> {
        match ty {
            AstType::NonNull(inner) => go(graph, inner, false),
            AstType::List(inner) => {
                let inner_lookup = go(graph, inner, true)?;
                Ok(TypeLookup {
                    root: inner_lookup.root,
                    is_pointer,
                    is_slice: true,
                    inner_is_pointer: inner_lookup.is_pointer,
                })
            }
            AstType::Named(name) => {
                if !graph.has_type(name) {
                    return Err(format!("unknown type {name:?}"));
                }
                Ok(TypeLookup {
                    root: ArcStr::from(name.as_str()),
                    is_pointer,
                    is_slice: false,
                    inner_is_pointer: false,
                })
            }
        }
    }
    go(graph, ty, true)
}

/// Converts a default-value literal to JSON, requiring it to be variable-free
/// (spec.md §3.2 "default literal AST").
fn literal_only_json(graph: &TypeGraph, expected: &TypeLookup, lit: &Spanning<InputValue>) -> Result<Json, CompileError> {
    let mut refs = Vec::new();
    lit.item.referenced_variables(&mut refs);
    if !refs.is_empty() {
        return Err(validation_err("default values may not reference variables", lit.start));
    }
    match bind_value(graph, None, expected, lit, true, &[])? {
        BoundValue::Literal(j) => Ok(j),
        _ => Ok(literal_to_json(&lit.item)),
    }
}

fn compile_root_selections(
    ctx: &Ctx<'_>,
    mode: FunctionMode,
    selections: &[Spanning<Selection>],
    depth: usize,
    alias_seen: &mut HashSet<String>,
) -> Result<Vec<BoundField>, CompileError> {
    if QueryLimits::exceeds(ctx.limits.max_depth, depth) {
        return Err(limit_err("maximum selection depth exceeded", zero_span()));
    }

    let mut fragment_stack = Vec::new();
    let flat = flatten_selections(ctx, selections, &mut fragment_stack)?;

    if QueryLimits::exceeds(ctx.limits.max_fields, flat.len()) {
        return Err(limit_err("maximum field count exceeded", zero_span()));
    }

    let mut unknown_names = Vec::new();
    let mut any_known = false;
    for ff in &flat {
        if ctx.graph.root_function(mode, &ff.field.name).is_some() {
            any_known = true;
        } else {
            unknown_names.push(ff.field.name.clone());
        }
    }

    if !unknown_names.is_empty() {
        if !any_known {
            return Err(CompileError::UnknownCommand(flat[0].span, unknown_names));
        }
        return Err(validation_err(
            format!("unknown command(s): {}", unknown_names.join(", ")),
            flat[0].span,
        ));
    }

    let mut out = Vec::with_capacity(flat.len());
    for ff in &flat {
        let func = ctx
            .graph
            .root_function(mode, &ff.field.name)
            .expect("presence already checked above");

        let response_key = ArcStr::from(ff.field.response_key());
        alias_seen.insert(response_key.to_string());
        if QueryLimits::exceeds(ctx.limits.max_aliases, alias_seen.len()) {
            return Err(limit_err("maximum alias count exceeded", ff.span));
        }

        let field_path = [response_key.clone()];
        let args = bind_args(ctx, &func, &ff.field.arguments, ff.span, &field_path)?;
        let children = compile_field_children(ctx, &func.base_return_type, ff.field, ff.span, depth, &field_path)?;

        out.push(BoundField {
            response_key,
            span: ff.span,
            type_condition: None,
            skip_guards: ff.skip_guards.clone(),
            include_guards: ff.include_guards.clone(),
            kind: BoundFieldKind::Resolver {
                function: func,
                args,
                children,
            },
        });
    }

    Ok(out)
}

/// Flattens fragment spreads and inline fragments into a flat list of field
/// occurrences, carrying forward their type condition and directive guards
/// (spec.md §4.C "Fragments").
fn flatten_selections<'a>(
    ctx: &Ctx<'a>,
    selections: &'a [Spanning<Selection>],
    fragment_stack: &mut Vec<String>,
) -> Result<Vec<FlatField<'a>>, CompileError> {
    let mut out = Vec::new();
    for sel in selections {
        match &sel.item {
            Selection::Field(field) => {
                let (skip_guards, include_guards) = directive_guards(ctx, &field.directives)?;
                out.push(FlatField {
                    field,
                    span: sel.start,
                    type_condition: None,
                    skip_guards,
                    include_guards,
                });
            }
            Selection::InlineFragment(frag) => {
                if let Some(tc) = &frag.type_condition {
                    if !ctx.graph.has_type(tc) {
                        return Err(validation_err(format!("unknown type condition {tc:?}"), sel.start));
                    }
                }
                let (skip_guards, include_guards) = directive_guards(ctx, &frag.directives)?;
                let inner = flatten_selections(ctx, &frag.selection_set, fragment_stack)?;
                for mut ff in inner {
                    if frag.type_condition.is_some() {
                        ff.type_condition = frag.type_condition.clone();
                    }
                    ff.skip_guards.extend(skip_guards.clone());
                    ff.include_guards.extend(include_guards.clone());
                    out.push(ff);
                }
            }
            Selection::FragmentSpread(spread) => {
                if fragment_stack.iter().any(|n| n == &spread.name) {
                    return Err(validation_err(format!("fragment cycle detected at {:?}", spread.name), sel.start));
                }
                let def = ctx
                    .document
                    .fragments
                    .get(&spread.name)
                    .ok_or_else(|| validation_err(format!("unknown fragment {:?}", spread.name), sel.start))?;
                if !ctx.graph.has_type(&def.item.type_condition) {
                    return Err(validation_err(
                        format!("unknown type condition {:?}", def.item.type_condition),
                        def.start,
                    ));
                }
                let (skip_guards, include_guards) = directive_guards(ctx, &spread.directives)?;
                fragment_stack.push(spread.name.clone());
                let inner = flatten_selections(ctx, &def.item.selection_set, fragment_stack)?;
                fragment_stack.pop();
                for mut ff in inner {
                    ff.type_condition = Some(def.item.type_condition.clone());
                    ff.skip_guards.extend(skip_guards.clone());
                    ff.include_guards.extend(include_guards.clone());
                    out.push(ff);
                }
            }
        }
    }
    Ok(out)
}

fn directive_guards(ctx: &Ctx<'_>, directives: &[Spanning<Directive>]) -> Result<(Vec<ArgGuard>, Vec<ArgGuard>), CompileError> {
    let mut skip_guards = Vec::new();
    let mut include_guards = Vec::new();
    for d in directives {
        let target = match d.item.name.as_str() {
            "skip" => Some(&mut skip_guards),
            "include" => Some(&mut include_guards),
            _ => None,
        };
        let Some(target) = target else { continue };
        let arg = d
            .item
            .argument("if")
            .ok_or_else(|| validation_err(format!("@{} requires an `if` argument", d.item.name), d.start))?;
        let guard = match &arg.item {
            InputValue::Boolean(b) => ArgGuard::Literal(*b),
            InputValue::Variable(name) => {
                if !ctx.variable_types.contains_key(name) {
                    return Err(validation_err(format!("undefined variable ${name}"), arg.start));
                }
                ArgGuard::Variable(ArcStr::from(name.as_str()))
            }
            _ => return Err(validation_err("`if` argument must be a boolean or variable", arg.start)),
        };
        target.push(guard);
    }
    Ok((skip_guards, include_guards))
}

fn bind_args(
    ctx: &Ctx<'_>,
    func: &GraphFunction,
    provided: &[(Spanning<String>, Spanning<InputValue>)],
    span: Span,
    path: &[ArcStr],
) -> Result<IndexMap<ArcStr, BoundValue>, CompileError> {
    let mut out = IndexMap::new();
    let mut provided_names = HashSet::new();

    for (name, value) in provided {
        provided_names.insert(name.item.clone());
        let Some(param) = func.params_by_name.get(name.item.as_str()) else {
            return Err(validation_err_at(
                format!("unknown argument {:?} for field {:?}", name.item, func.name),
                name.start,
                path,
            ));
        };
        let bound = bind_value(ctx.graph, Some(ctx.variable_types), &param.arg_type, value, false, path)?;
        out.insert(param.name.clone(), bound);
    }

    for (name, param) in func.params_by_name.iter() {
        if provided_names.contains(name.as_str()) {
            continue;
        }
        if let Some(default) = &param.default_value {
            out.insert(name.clone(), BoundValue::Literal(default.clone()));
        } else if !param.arg_type.is_pointer {
            return Err(validation_err_at(
                format!("missing required argument {:?} for field {:?}", name, func.name),
                span,
                path,
            ));
        }
    }

    Ok(out)
}

/// Validates and binds one argument/default-value literal against its expected
/// type (spec.md §4.C "Literal values are type-checked eagerly").
fn bind_value(
    graph: &TypeGraph,
    variable_types: Option<&IndexMap<String, VariableType>>,
    expected: &TypeLookup,
    lit: &Spanning<InputValue>,
    deny_variables: bool,
    path: &[ArcStr],
) -> Result<BoundValue, CompileError> {
    match &lit.item {
        InputValue::Variable(name) => {
            if deny_variables {
                return Err(validation_err_at("variables are not permitted here", lit.start, path));
            }
            let vars = variable_types.ok_or_else(|| validation_err_at("variables are not permitted here", lit.start, path))?;
            let decl = vars
                .get(name)
                .ok_or_else(|| validation_err_at(format!("undefined variable ${name}"), lit.start, path))?;
            if decl.type_lookup.root != expected.root {
                return Err(validation_err_at(
                    format!(
                        "variable ${name} of type {} used where {} was expected",
                        decl.type_lookup.root, expected.root
                    ),
                    lit.start,
                    path,
                ));
            }
            if !expected.is_pointer && decl.type_lookup.is_pointer && decl.default_value.is_none() {
                return Err(validation_err_at(
                    format!("variable ${name} may be null but is used in a non-null position"),
                    lit.start,
                    path,
                ));
            }
            Ok(BoundValue::Variable(ArcStr::from(name.as_str())))
        }
        InputValue::Null => {
            if !expected.is_pointer {
                return Err(validation_err_at(format!("null is not permitted for non-null type {}", expected.root), lit.start, path));
            }
            Ok(BoundValue::Literal(Json::Null))
        }
        InputValue::List(items) => {
            if !expected.is_slice {
                return Err(validation_err_at("unexpected list value", lit.start, path));
            }
            let item_expected = TypeLookup {
                root: expected.root.clone(),
                is_pointer: expected.inner_is_pointer,
                is_slice: false,
                inner_is_pointer: false,
            };
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(bind_value(graph, variable_types, &item_expected, item, deny_variables, path)?);
            }
            Ok(BoundValue::List(out))
        }
        InputValue::Object(fields) => {
            if expected.is_slice {
                return Err(validation_err_at("expected a list, found an object", lit.start, path));
            }
            let node_fields: Vec<(ArcStr, TypeLookup)> = graph
                .with_type(&expected.root, |node| {
                    if node.kind != TypeKind::InputObject {
                        return Err(format!("{} is not an input type", expected.root));
                    }
                    Ok(node.fields().map(|f| (f.name.clone(), f.result_type.clone())).collect())
                })
                .ok_or_else(|| format!("unknown type {}", expected.root))
                .and_then(|r| r)
                .map_err(|msg| validation_err_at(msg, lit.start, path))?;

            let mut out = IndexMap::new();
            let mut given = HashSet::new();
            for (name, value) in fields {
                given.insert(name.item.clone());
                let Some((_, ty)) = node_fields.iter().find(|(n, _)| n.as_str() == name.item) else {
                    return Err(validation_err_at(format!("unknown input field {:?}", name.item), name.start, path));
                };
                out.insert(
                    ArcStr::from(name.item.as_str()),
                    bind_value(graph, variable_types, ty, value, deny_variables, path)?,
                );
            }
            for (name, ty) in &node_fields {
                if given.contains(name.as_str()) {
                    continue;
                }
                if !ty.is_pointer {
                    return Err(validation_err_at(format!("missing required input field {name:?}"), lit.start, path));
                }
            }
            Ok(BoundValue::Object(out))
        }
        InputValue::Enum(name) => {
            let valid = graph
                .with_type(&expected.root, |node| {
                    node.kind == TypeKind::Enum && node.enum_values.iter().any(|v| v.name.as_str() == name)
                })
                .unwrap_or(false);
            if !valid {
                return Err(validation_err_at(format!("invalid enum value {name:?} for type {}", expected.root), lit.start, path));
            }
            Ok(BoundValue::Literal(Json::String(name.clone())))
        }
        InputValue::Int(i) => scalar_literal(graph, expected, Json::from(*i), lit.start, path),
        InputValue::Float(f) => scalar_literal(graph, expected, Json::from(*f), lit.start, path),
        InputValue::String(s) => scalar_literal(graph, expected, Json::from(s.clone()), lit.start, path),
        InputValue::Boolean(b) => scalar_literal(graph, expected, Json::from(*b), lit.start, path),
    }
}

fn scalar_literal(graph: &TypeGraph, expected: &TypeLookup, json: Json, span: Span, path: &[ArcStr]) -> Result<BoundValue, CompileError> {
    let scalar = graph.with_type(&expected.root, |node| node.scalar.clone()).flatten();
    match scalar {
        Some(scalar) => {
            // Custom scalars get a chance to validate the literal eagerly; default
            // parseLiteral is parseValue applied to the literal's JSON equivalent
            // (spec.md §9).
            (scalar.parse_value)(&json)
                .map(BoundValue::Literal)
                .map_err(|msg| validation_err_at(msg, span, path))
        }
        None => Ok(BoundValue::Literal(json)),
    }
}

/// Compiles a field's own selection set (if any) against its declared result type.
fn compile_field_children(
    ctx: &Ctx<'_>,
    result_type: &TypeLookup,
    field: &Field,
    span: Span,
    depth: usize,
    path: &[ArcStr],
) -> Result<SelectionPlan, CompileError> {
    let is_leaf = ctx
        .graph
        .with_type(&result_type.root, |node| matches!(node.kind, TypeKind::Scalar | TypeKind::Enum))
        .unwrap_or(true);

    if is_leaf {
        if !field.selection_set.is_empty() {
            return Err(validation_err_at(
                format!("field {:?} is a scalar/enum and may not have a selection set", field.name),
                span,
                path,
            ));
        }
        return Ok(SelectionPlan::default());
    }

    if field.selection_set.is_empty() {
        return Err(validation_err_at(format!("field {:?} requires a selection set", field.name), span, path));
    }

    compile_selection_plan(ctx, &result_type.root, &field.selection_set, depth + 1, path)
}

enum ResolvedFieldKind {
    Plain(Arc<dyn Fn(&AnyValue) -> Resolved + Send + Sync>, TypeLookup),
    Resolver(Arc<GraphFunction>),
}

/// Compiles a nested selection set against an object/interface/union type
/// (spec.md §4.C).
fn compile_selection_plan(
    ctx: &Ctx<'_>,
    parent_type: &str,
    selections: &[Spanning<Selection>],
    depth: usize,
    parent_path: &[ArcStr],
) -> Result<SelectionPlan, CompileError> {
    if QueryLimits::exceeds(ctx.limits.max_depth, depth) {
        return Err(limit_err("maximum selection depth exceeded", zero_span()));
    }

    let mut fragment_stack = Vec::new();
    let flat = flatten_selections(ctx, selections, &mut fragment_stack)?;

    if QueryLimits::exceeds(ctx.limits.max_fields, flat.len()) {
        return Err(limit_err("maximum field count exceeded", zero_span()));
    }

    let mut fields = Vec::with_capacity(flat.len());
    for ff in &flat {
        let response_key = ArcStr::from(ff.field.response_key());

        if ff.field.name == "__typename" {
            fields.push(BoundField {
                response_key,
                span: ff.span,
                type_condition: ff.type_condition.clone().map(|s| ArcStr::from(s.as_str())),
                skip_guards: ff.skip_guards.clone(),
                include_guards: ff.include_guards.clone(),
                kind: BoundFieldKind::TypeName,
            });
            continue;
        }

        let target_type = ff.type_condition.as_deref().unwrap_or(parent_type);
        let has_field = ctx
            .graph
            .with_type(target_type, |node| node.field(&ff.field.name).is_some())
            .unwrap_or(false);
        if !has_field {
            return Err(validation_err(
                format!("unknown field {:?} on type {:?}", ff.field.name, target_type),
                ff.span,
            ));
        }

        let field_path: Vec<ArcStr> = parent_path.iter().cloned().chain(std::iter::once(response_key.clone())).collect();

        let resolved_kind = ctx
            .graph
            .with_type(target_type, |node| {
                let f = node.field(&ff.field.name).expect("checked above");
                match &f.kind {
                    FieldKind::Plain(accessor) => ResolvedFieldKind::Plain(Arc::clone(accessor), f.result_type.clone()),
                    FieldKind::Resolver(func) => ResolvedFieldKind::Resolver(Arc::clone(func)),
                }
            })
            .expect("type checked above");

        let kind = match resolved_kind {
            ResolvedFieldKind::Resolver(func) => {
                let args = bind_args(ctx, &func, &ff.field.arguments, ff.span, &field_path)?;
                let children = compile_field_children(ctx, &func.base_return_type, ff.field, ff.span, depth, &field_path)?;
                BoundFieldKind::Resolver {
                    function: func,
                    args,
                    children,
                }
            }
            ResolvedFieldKind::Plain(accessor, result_type) => {
                if !ff.field.arguments.is_empty() {
                    return Err(validation_err_at(
                        format!("field {:?} takes no arguments", ff.field.name),
                        ff.span,
                        &field_path,
                    ));
                }
                let children = compile_field_children(ctx, &result_type, ff.field, ff.span, depth, &field_path)?;
                BoundFieldKind::Plain {
                    accessor,
                    result_type,
                    children,
                }
            }
        };

        fields.push(BoundField {
            response_key,
            span: ff.span,
            type_condition: ff.type_condition.clone().map(|s| ArcStr::from(s.as_str())),
            skip_guards: ff.skip_guards.clone(),
            include_guards: ff.include_guards.clone(),
            kind,
        });
    }

    Ok(SelectionPlan { fields })
}

impl fmt::Debug for RequestStub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestStub")
            .field("operation_name", &self.operation_name)
            .field("operation_kind", &self.operation_kind.to_string())
            .field("root_selections", &self.root_selections.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use futures::FutureExt;
    use indexmap::IndexMap;
    use serde_json::json;

    use crate::error::{CompileError, PathSegment};
    use crate::registry::{
        boxed, field_fn, EnumValue, FieldKind, FieldLookup, FunctionBuilder, FunctionMode, InvokeArgs, Resolved, TypeBuilder, TypeGraph,
        TypeLookup,
    };
    use crate::validation::QueryLimits;

    use super::{compile, ArgGuard, BoundFieldKind, RequestStub};

    fn hero_graph() -> TypeGraph {
        let graph = TypeGraph::new();
        graph
            .register_type(
                TypeBuilder::enum_type("Episode", vec![EnumValue::new("JEDI"), EnumValue::new("EMPIRE")]).build(),
            )
            .expect("Episode registers cleanly");
        graph
            .register_type(
                TypeBuilder::object("Character")
                    .field(FieldLookup {
                        name: "name".into(),
                        result_type: TypeLookup::named("String"),
                        kind: FieldKind::Plain(field_fn::<&'static str, _>(|c| Resolved::Leaf(json!(c)))),
                        description: None,
                        is_deprecated: false,
                        deprecated_reason: None,
                    })
                    .build(),
            )
            .expect("Character registers cleanly");

        let hero = FunctionBuilder::new("hero", FunctionMode::Query)
            .param("episode", TypeLookup::named("Episode").optional(), None)
            .returns(TypeLookup::named("Character"))
            .build_unary(|_args: InvokeArgs| async { Ok(Resolved::Node(boxed("R2-D2"))) }.boxed())
            .expect("hero has a return type set");
        graph.register_query(hero);
        graph
    }

    fn compile_source(graph: &TypeGraph, source: &str) -> Result<RequestStub, CompileError> {
        let document = crate::parser::parse_document(source).expect("source parses");
        compile(graph, &document, None, &QueryLimits::unlimited())
    }

    #[test]
    fn invalid_enum_literal_reports_the_enclosing_field_path() {
        let graph = hero_graph();
        let err = compile_source(&graph, "{ hero(episode: INVALID) { name } }").expect_err("INVALID is not a valid Episode");

        match err {
            CompileError::Validation { path, .. } => {
                assert_eq!(path, vec![PathSegment::Field("hero".to_string())]);
            }
            other => panic!("expected a Validation error, got {other:?}"),
        }
    }

    #[test]
    fn nested_invalid_argument_reports_the_full_path() {
        let graph = hero_graph();
        // `name` takes no arguments; the failing path should read hero -> name,
        // not just the root selection.
        let err = compile_source(&graph, "{ hero { name(loud: true) } }").expect_err("name takes no arguments");

        match err {
            CompileError::Validation { path, .. } => {
                assert_eq!(
                    path,
                    vec![PathSegment::Field("hero".to_string()), PathSegment::Field("name".to_string())]
                );
            }
            other => panic!("expected a Validation error, got {other:?}"),
        }
    }

    #[test]
    fn fragments_and_aliases_compile_into_one_flattened_plan() {
        let graph = hero_graph();
        let stub = compile_source(
            &graph,
            "query { luke: hero(episode: JEDI) { ...nameFields } } fragment nameFields on Character { name }",
        )
        .expect("valid document compiles");

        assert_eq!(stub.root_selections.len(), 1);
        assert_eq!(stub.root_selections[0].response_key.as_str(), "luke");
        let BoundFieldKind::Resolver { children, .. } = &stub.root_selections[0].kind else {
            panic!("hero is a resolver field");
        };
        assert_eq!(children.fields.len(), 1);
        assert_eq!(children.fields[0].response_key.as_str(), "name");
    }

    #[test]
    fn skip_directive_compiles_into_a_literal_guard() {
        let graph = hero_graph();
        let stub = compile_source(&graph, "{ hero { name @skip(if: true) } }").expect("valid document compiles");

        let BoundFieldKind::Resolver { children, .. } = &stub.root_selections[0].kind else {
            panic!("hero is a resolver field");
        };
        assert_eq!(children.fields[0].skip_guards, vec![ArgGuard::Literal(true)]);
        assert!(!children.fields[0].is_active(&IndexMap::new()));
    }

    #[test]
    fn unknown_root_field_is_reported_as_unknown_command() {
        let graph = hero_graph();
        let err = compile_source(&graph, "{ heroic { name } }").expect_err("heroic is not registered");
        assert!(matches!(err, CompileError::UnknownCommand(_, _)));
    }

    #[test]
    fn max_depth_limit_rejects_overly_nested_selections() {
        let graph = hero_graph();
        let document = crate::parser::parse_document("{ hero { name } }").expect("source parses");
        let mut limits = QueryLimits::unlimited();
        limits.max_depth = 1;
        let err = compile(&graph, &document, None, &limits).expect_err("depth 2 exceeds the limit of 1");
        assert!(matches!(err, CompileError::LimitExceeded { .. }));
    }
}

