//! `__schema`/`__type` introspection response model (spec.md §4.E).
//!
//! Grounded on the teacher's `introspection/mod.rs`, which defines the
//! standard `__Schema`/`__Type`/`__Field`/`__InputValue`/`__EnumValue`/
//! `__TypeKind` shapes. Unlike the teacher, which walks a build-time
//! `SchemaType` produced by its derive macros, these builders walk this
//! crate's runtime [`TypeGraph`] directly and return plain, already-complete
//! `Serialize` trees — there is no per-field resolver indirection, since the
//! whole tree is cheap to materialize eagerly.

use std::collections::BTreeMap;

use arcstr::ArcStr;
use serde::Serialize;
use serde_json::Value as Json;

use crate::registry::{FieldKind, FieldLookup, FunctionMode, GraphFunction, ParamBinding, TypeGraph, TypeKind, TypeLookup, TypeNode};

use super::meta::{collect_meta, iface_name, TypeMeta};

/// `__TypeKind` (spec.md §4.E).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum IntrospectionTypeKind {
    #[serde(rename = "SCALAR")]
    Scalar,
    #[serde(rename = "OBJECT")]
    Object,
    #[serde(rename = "INTERFACE")]
    Interface,
    #[serde(rename = "UNION")]
    Union,
    #[serde(rename = "ENUM")]
    Enum,
    #[serde(rename = "INPUT_OBJECT")]
    InputObject,
    #[serde(rename = "LIST")]
    List,
    #[serde(rename = "NON_NULL")]
    NonNull,
}

/// A `__Type` node. Wrapper kinds (`LIST`/`NON_NULL`) carry `name: None` and a
/// non-null `of_type`, matching the standard introspection shape.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionTypeRef {
    pub kind: IntrospectionTypeKind,
    pub name: Option<String>,
    pub description: Option<String>,
    pub fields: Option<Vec<IntrospectionField>>,
    pub interfaces: Option<Vec<IntrospectionTypeRef>>,
    pub possible_types: Option<Vec<IntrospectionTypeRef>>,
    pub enum_values: Option<Vec<IntrospectionEnumValue>>,
    pub input_fields: Option<Vec<IntrospectionInputValue>>,
    pub of_type: Option<Box<IntrospectionTypeRef>>,
}

/// Alias kept for readability at call sites; a full `__Type` and a bare type
/// reference share the same shape in this model.
pub type IntrospectionType = IntrospectionTypeRef;

impl IntrospectionTypeRef {
    fn named(kind: IntrospectionTypeKind, name: impl Into<String>) -> Self {
        IntrospectionTypeRef {
            kind,
            name: Some(name.into()),
            description: None,
            fields: None,
            interfaces: None,
            possible_types: None,
            enum_values: None,
            input_fields: None,
            of_type: None,
        }
    }

    fn wrapper(kind: IntrospectionTypeKind, of_type: IntrospectionTypeRef) -> Self {
        IntrospectionTypeRef {
            kind,
            name: None,
            description: None,
            fields: None,
            interfaces: None,
            possible_types: None,
            enum_values: None,
            input_fields: None,
            of_type: Some(Box::new(of_type)),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionField {
    pub name: String,
    pub description: Option<String>,
    pub args: Vec<IntrospectionInputValue>,
    #[serde(rename = "type")]
    pub type_ref: IntrospectionTypeRef,
    pub is_deprecated: bool,
    pub deprecation_reason: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionInputValue {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub type_ref: IntrospectionTypeRef,
    pub default_value: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionEnumValue {
    pub name: String,
    pub description: Option<String>,
    pub is_deprecated: bool,
    pub deprecation_reason: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionDirective {
    pub name: String,
    pub description: Option<String>,
    pub locations: Vec<String>,
    pub args: Vec<IntrospectionInputValue>,
}

/// `__Schema` (spec.md §4.E).
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionSchema {
    pub query_type: IntrospectionTypeRef,
    pub mutation_type: Option<IntrospectionTypeRef>,
    pub subscription_type: Option<IntrospectionTypeRef>,
    pub types: Vec<IntrospectionTypeRef>,
    pub directives: Vec<IntrospectionDirective>,
}

/// Builds the full `__schema` response (spec.md §4.E, §6 "introspection").
pub fn introspect_schema(graph: &TypeGraph) -> IntrospectionSchema {
    let meta = collect_meta(graph);
    let mut names = graph.type_names();
    names.sort_by(|a, b| a.as_str().cmp(b.as_str()));

    let mut types: Vec<IntrospectionTypeRef> = Vec::new();
    for n in &names {
        graph.with_type(n, |node| {
            if let Some(iface) = interface_entry(&meta, node) {
                types.push(iface);
            }
            types.push(full_type(&meta, node));
        });
    }

    for (name, members) in virtual_unions(graph, &names) {
        types.push(union_type(&name, &members));
    }

    let root_type = |title: &str| IntrospectionTypeRef::named(IntrospectionTypeKind::Object, title);

    IntrospectionSchema {
        query_type: root_type("Query"),
        mutation_type: (!graph.root_function_names(FunctionMode::Mutation).is_empty()).then(|| root_type("Mutation")),
        subscription_type: (!graph.root_function_names(FunctionMode::Subscription).is_empty())
            .then(|| root_type("Subscription")),
        types,
        directives: standard_directives(),
    }
}

fn standard_directives() -> Vec<IntrospectionDirective> {
    let if_arg = |description: &str| IntrospectionInputValue {
        name: "if".to_string(),
        description: Some(description.to_string()),
        type_ref: non_null(IntrospectionTypeRef::named(IntrospectionTypeKind::Scalar, "Boolean")),
        default_value: None,
    };
    vec![
        IntrospectionDirective {
            name: "skip".to_string(),
            description: Some("Skips this field or fragment when the condition is true.".to_string()),
            locations: vec!["FIELD".to_string(), "FRAGMENT_SPREAD".to_string(), "INLINE_FRAGMENT".to_string()],
            args: vec![if_arg("Skipped when true.")],
        },
        IntrospectionDirective {
            name: "include".to_string(),
            description: Some("Includes this field or fragment only when the condition is true.".to_string()),
            locations: vec!["FIELD".to_string(), "FRAGMENT_SPREAD".to_string(), "INLINE_FRAGMENT".to_string()],
            args: vec![if_arg("Included when true.")],
        },
        IntrospectionDirective {
            name: "deprecated".to_string(),
            description: Some("Marks an element of a GraphQL schema as no longer supported.".to_string()),
            locations: vec!["FIELD_DEFINITION".to_string(), "ENUM_VALUE".to_string()],
            args: vec![IntrospectionInputValue {
                name: "reason".to_string(),
                description: Some("Explains why this element was deprecated.".to_string()),
                type_ref: IntrospectionTypeRef::named(IntrospectionTypeKind::Scalar, "String"),
                default_value: Some("\"No longer supported\"".to_string()),
            }],
        },
    ]
}

/// Builds a single `__type(name: ...)` response, or `None` if `name` isn't
/// registered (and isn't one of the synthesized root/union/interface names
/// either).
pub fn introspect_type(graph: &TypeGraph, name: &str) -> Option<IntrospectionType> {
    let meta = collect_meta(graph);
    match name {
        "Query" | "Mutation" | "Subscription" => Some(IntrospectionTypeRef::named(IntrospectionTypeKind::Object, name)),
        _ => {
            if let Some(t) = graph.with_type(name, |node| full_type(&meta, node)) {
                return Some(t);
            }
            if let Some(base) = name.strip_prefix('I') {
                if let Some(t) = graph.with_type(base, |node| interface_entry(&meta, node)).flatten() {
                    return Some(t);
                }
            }
            let all_names = graph.type_names();
            virtual_unions(graph, &all_names).into_iter().find(|(n, _)| n.as_str() == name).map(|(n, members)| union_type(&n, &members))
        }
    }
}

fn union_type(name: &str, members: &[ArcStr]) -> IntrospectionTypeRef {
    let mut t = IntrospectionTypeRef::named(IntrospectionTypeKind::Union, name);
    t.possible_types = Some(members.iter().map(|m| IntrospectionTypeRef::named(IntrospectionTypeKind::Object, m.as_str())).collect());
    t
}

fn full_type(meta: &BTreeMap<ArcStr, TypeMeta>, node: &TypeNode) -> IntrospectionTypeRef {
    match node.kind {
        TypeKind::Object => {
            if node.implemented_by.is_empty() {
                object_type(meta, node, node.name.as_str(), &[])
            } else if node.interface_only {
                interface_type(meta, node, node.name.as_str(), implementors(&node.implemented_by))
            } else {
                object_type(meta, node, node.name.as_str(), std::slice::from_ref(&iface_name(&node.name)))
            }
        }
        TypeKind::InputObject => input_object_type(meta, node),
        TypeKind::Enum => enum_type(node),
        TypeKind::Union => union_type(node.name.as_str(), &node.union_members.iter().cloned().collect::<Vec<_>>()),
        TypeKind::Scalar => scalar_type(node),
        TypeKind::Interface => object_type(meta, node, node.name.as_str(), &[]),
    }
}

/// When an embedded base type is not `interfaceOnly`, the synthesized
/// `I<Name>` interface is emitted *in addition to* the base type's own
/// `full_type` entry (spec.md §4.E/§9 "interface naming").
fn interface_entry(meta: &BTreeMap<ArcStr, TypeMeta>, node: &TypeNode) -> Option<IntrospectionTypeRef> {
    if node.implemented_by.is_empty() || node.interface_only {
        return None;
    }
    Some(interface_type(meta, node, &iface_name(&node.name), implementors(&node.implemented_by)))
}

fn implementors(implemented_by: &std::collections::BTreeSet<ArcStr>) -> Vec<ArcStr> {
    implemented_by.iter().cloned().collect()
}

fn object_type(meta: &BTreeMap<ArcStr, TypeMeta>, node: &TypeNode, name: &str, interfaces: &[String]) -> IntrospectionTypeRef {
    let mut t = IntrospectionTypeRef::named(IntrospectionTypeKind::Object, name);
    t.description = node.description.as_ref().map(ArcStr::to_string);
    t.fields = Some(sorted_fields(node).into_iter().map(|f| field_entry(meta, f)).collect());
    t.interfaces = Some(interfaces.iter().map(|i| IntrospectionTypeRef::named(IntrospectionTypeKind::Interface, i.clone())).collect());
    t
}

fn interface_type(meta: &BTreeMap<ArcStr, TypeMeta>, node: &TypeNode, name: &str, possible: Vec<ArcStr>) -> IntrospectionTypeRef {
    let mut t = IntrospectionTypeRef::named(IntrospectionTypeKind::Interface, name);
    t.description = node.description.as_ref().map(ArcStr::to_string);
    t.fields = Some(sorted_fields(node).into_iter().map(|f| field_entry(meta, f)).collect());
    let mut possible_types: Vec<IntrospectionTypeRef> =
        possible.iter().map(|p| IntrospectionTypeRef::named(IntrospectionTypeKind::Object, p.as_str())).collect();
    if !node.interface_only {
        possible_types.push(IntrospectionTypeRef::named(IntrospectionTypeKind::Object, node.name.as_str()));
    }
    possible_types.sort_by(|a, b| a.name.cmp(&b.name));
    t.possible_types = Some(possible_types);
    t
}

fn input_object_type(meta: &BTreeMap<ArcStr, TypeMeta>, node: &TypeNode) -> IntrospectionTypeRef {
    let mut t = IntrospectionTypeRef::named(IntrospectionTypeKind::InputObject, node.name.as_str());
    t.description = node.description.as_ref().map(ArcStr::to_string);
    t.input_fields = Some(
        sorted_fields(node)
            .into_iter()
            .map(|f| IntrospectionInputValue {
                name: f.name.to_string(),
                description: f.description.as_ref().map(ArcStr::to_string),
                type_ref: type_ref(meta, &f.result_type),
                default_value: None,
            })
            .collect(),
    );
    t
}

fn enum_type(node: &TypeNode) -> IntrospectionTypeRef {
    let mut t = IntrospectionTypeRef::named(IntrospectionTypeKind::Enum, node.name.as_str());
    t.description = node.description.as_ref().map(ArcStr::to_string);
    let mut values: Vec<&crate::registry::EnumValue> = node.enum_values.iter().collect();
    values.sort_by_cached_key(|v| v.name.to_ascii_lowercase());
    t.enum_values = Some(
        values
            .into_iter()
            .map(|v| IntrospectionEnumValue {
                name: v.name.to_string(),
                description: v.description.as_ref().map(ArcStr::to_string),
                is_deprecated: v.deprecated_reason.is_some(),
                deprecation_reason: v.deprecated_reason.as_ref().map(ArcStr::to_string),
            })
            .collect(),
    );
    t
}

fn scalar_type(node: &TypeNode) -> IntrospectionTypeRef {
    let mut t = IntrospectionTypeRef::named(IntrospectionTypeKind::Scalar, node.name.as_str());
    t.description = node.description.as_ref().map(ArcStr::to_string);
    t
}

fn sorted_fields(node: &TypeNode) -> Vec<&FieldLookup> {
    let mut fields: Vec<&FieldLookup> = node.fields().collect();
    fields.sort_by_cached_key(|f| f.name.to_ascii_lowercase());
    fields
}

fn field_entry(meta: &BTreeMap<ArcStr, TypeMeta>, field: &FieldLookup) -> IntrospectionField {
    let args = match &field.kind {
        FieldKind::Resolver(f) => args_for(meta, f),
        FieldKind::Plain(_) => Vec::new(),
    };
    let type_ref = match &field.kind {
        FieldKind::Resolver(f) if f.return_union_name.is_some() => {
            let name = f.return_union_name.as_ref().expect("checked Some above").to_string();
            wrap(IntrospectionTypeRef::named(IntrospectionTypeKind::Union, name), &field.result_type)
        }
        _ => type_ref(meta, &field.result_type),
    };
    IntrospectionField {
        name: field.name.to_string(),
        description: field.description.as_ref().map(ArcStr::to_string),
        args,
        type_ref,
        is_deprecated: field.is_deprecated,
        deprecation_reason: field.deprecated_reason.as_ref().map(ArcStr::to_string),
    }
}

fn args_for(meta: &BTreeMap<ArcStr, TypeMeta>, f: &GraphFunction) -> Vec<IntrospectionInputValue> {
    let mut args: Vec<&ParamBinding> = f.params_by_name.values().collect();
    args.sort_by_key(|p| p.index);
    args.into_iter()
        .map(|p| IntrospectionInputValue {
            name: p.name.to_string(),
            description: None,
            type_ref: type_ref(meta, &p.arg_type),
            default_value: p.default_value.as_ref().map(literal_string),
        })
        .collect()
}

fn literal_string(v: &Json) -> String {
    match v {
        Json::String(s) => format!("{s:?}"),
        other => other.to_string(),
    }
}

/// Builds a `__Type` reference for a use-site ([`TypeLookup`]), wrapping
/// `NON_NULL`/`LIST` as appropriate and substituting the `I<Name>` interface
/// name for embedded-type references (spec.md §4.E "interface naming").
fn type_ref(meta: &BTreeMap<ArcStr, TypeMeta>, tl: &TypeLookup) -> IntrospectionTypeRef {
    let named = match meta.get(&tl.root) {
        Some(m) if m.embedded && !m.interface_only => IntrospectionTypeRef::named(IntrospectionTypeKind::Interface, iface_name(&tl.root)),
        Some(m) => IntrospectionTypeRef::named(kind_of(m.kind), tl.root.as_str()),
        None => IntrospectionTypeRef::named(IntrospectionTypeKind::Scalar, tl.root.as_str()),
    };
    wrap(named, tl)
}

fn kind_of(kind: TypeKind) -> IntrospectionTypeKind {
    match kind {
        TypeKind::Scalar => IntrospectionTypeKind::Scalar,
        TypeKind::Enum => IntrospectionTypeKind::Enum,
        TypeKind::Object => IntrospectionTypeKind::Object,
        TypeKind::Interface => IntrospectionTypeKind::Interface,
        TypeKind::Union => IntrospectionTypeKind::Union,
        TypeKind::InputObject => IntrospectionTypeKind::InputObject,
    }
}

fn wrap(named: IntrospectionTypeRef, tl: &TypeLookup) -> IntrospectionTypeRef {
    let item = if tl.is_slice {
        let inner = if tl.inner_is_pointer { named } else { IntrospectionTypeRef::wrapper(IntrospectionTypeKind::NonNull, named) };
        IntrospectionTypeRef::wrapper(IntrospectionTypeKind::List, inner)
    } else {
        named
    };
    if tl.is_pointer {
        item
    } else {
        IntrospectionTypeRef::wrapper(IntrospectionTypeKind::NonNull, item)
    }
}

fn non_null(t: IntrospectionTypeRef) -> IntrospectionTypeRef {
    IntrospectionTypeRef::wrapper(IntrospectionTypeKind::NonNull, t)
}

fn virtual_unions(graph: &TypeGraph, registered: &[ArcStr]) -> Vec<(ArcStr, Vec<ArcStr>)> {
    let known: std::collections::BTreeSet<&ArcStr> = registered.iter().collect();
    let mut found: BTreeMap<ArcStr, Vec<ArcStr>> = BTreeMap::new();

    let mut note = |f: &GraphFunction| {
        if let Some(u) = &f.return_union_name {
            if !known.contains(u) && !f.return_any_override.is_empty() {
                found.entry(u.clone()).or_insert_with(|| f.return_any_override.clone());
            }
        }
    };

    for mode in [FunctionMode::Query, FunctionMode::Mutation, FunctionMode::Subscription] {
        for name in graph.root_function_names(mode) {
            if let Some(f) = graph.root_function(mode, &name) {
                note(&f);
            }
        }
    }
    for name in registered {
        graph.with_type(name, |node| {
            for field in node.fields() {
                if let FieldKind::Resolver(f) = &field.kind {
                    note(f);
                }
            }
        });
    }

    found.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;

    use crate::registry::{boxed, field_fn, FieldKind, FieldLookup, FunctionBuilder, FunctionMode, InvokeArgs, Resolved, TypeBuilder, TypeGraph, TypeLookup};

    use super::{introspect_schema, introspect_type, IntrospectionTypeKind};

    fn sample_graph() -> TypeGraph {
        let graph = TypeGraph::new();
        graph
            .register_type(
                TypeBuilder::object("Zebra")
                    .field(FieldLookup {
                        name: "id".into(),
                        result_type: TypeLookup::named("String"),
                        kind: FieldKind::Plain(field_fn::<(), _>(|_| Resolved::Null)),
                        description: None,
                        is_deprecated: false,
                        deprecated_reason: None,
                    })
                    .build(),
            )
            .expect("Zebra registers cleanly");
        graph
            .register_type(
                TypeBuilder::object("Apple")
                    .field(FieldLookup {
                        name: "id".into(),
                        result_type: TypeLookup::named("String"),
                        kind: FieldKind::Plain(field_fn::<(), _>(|_| Resolved::Null)),
                        description: None,
                        is_deprecated: false,
                        deprecated_reason: None,
                    })
                    .build(),
            )
            .expect("Apple registers cleanly");
        let hero = FunctionBuilder::new("hero", FunctionMode::Query)
            .returns(TypeLookup::named("Zebra"))
            .build_unary(|_args: InvokeArgs| async { Ok(Resolved::Node(boxed(()))) }.boxed())
            .expect("hero has a return type set");
        graph.register_query(hero);
        graph
    }

    #[test]
    fn introspect_schema_orders_types_alphabetically() {
        let graph = sample_graph();
        let schema = introspect_schema(&graph);
        let names: Vec<&str> = schema.types.iter().filter_map(|t| t.name.as_deref()).collect();
        let apple_pos = names.iter().position(|n| *n == "Apple").expect("Apple present");
        let zebra_pos = names.iter().position(|n| *n == "Zebra").expect("Zebra present");
        assert!(apple_pos < zebra_pos, "expected Apple before Zebra in {names:?}");
    }

    #[test]
    fn introspect_schema_has_no_mutation_type_when_none_registered() {
        let graph = sample_graph();
        let schema = introspect_schema(&graph);
        assert!(schema.mutation_type.is_none());
        assert!(schema.subscription_type.is_none());
    }

    #[test]
    fn introspect_type_finds_a_registered_object() {
        let graph = sample_graph();
        let t = introspect_type(&graph, "Zebra").expect("Zebra is registered");
        assert_eq!(t.kind, IntrospectionTypeKind::Object);
        assert_eq!(t.name.as_deref(), Some("Zebra"));
    }

    #[test]
    fn introspect_type_returns_none_for_unknown_type() {
        let graph = sample_graph();
        assert!(introspect_type(&graph, "Nonexistent").is_none());
    }
}
