//! Installs the `__schema`/`__type` introspection root fields as ordinary
//! registered types and query functions (spec.md §4.A, §4.E, §6
//! "introspection").
//!
//! Grounded on the teacher's `introspection/mod.rs`, which exposes the same
//! meta-schema as synthesized `GraphQLType` impls; here the meta-types are
//! just another [`TypeBuilder`]/[`FunctionBuilder`] registration, so the
//! executor resolves `__schema { ... }` through the exact same
//! `FieldKind::Plain` machinery as any other field — no special-casing in the
//! executor is needed.

use std::sync::Arc;

use arcstr::ArcStr;
use futures::FutureExt;
use serde_json::Value as Json;

use crate::registry::{
    boxed, field_fn, AnyValue, EnumValue, FieldKind, FieldLookup, FunctionBuilder, FunctionMode, InvokeArgs, Resolved, TypeBuilder,
    TypeGraph, TypeLookup, TypeNode,
};

use super::introspection::{
    introspect_schema, introspect_type, IntrospectionDirective, IntrospectionEnumValue, IntrospectionField, IntrospectionInputValue,
    IntrospectionSchema, IntrospectionTypeKind, IntrospectionTypeRef,
};

/// Registers the `__Schema`/`__Type`/... meta-types and the `__schema`/`__type`
/// root query fields, and marks the graph as introspectable. Hosts that want
/// introspection served call this once, right after populating their own
/// application types (spec.md §6 "ServerConfig.introspectionEnabled" governs
/// whether a host calls this at all).
pub fn install_introspection(graph: &Arc<TypeGraph>) {
    for node in meta_type_nodes() {
        // Calling this twice on the same graph would otherwise be a duplicate-name
        // registration error; ignore it so setup stays idempotent.
        let _ = graph.register_type(node);
    }

    let schema_graph = Arc::clone(graph);
    let schema_query = FunctionBuilder::new("__schema", FunctionMode::Query)
        .returns(TypeLookup::named("__Schema"))
        .description("Access the current type schema of this server.")
        .build_unary(move |_args: InvokeArgs| {
            let g = Arc::clone(&schema_graph);
            async move { Ok(Resolved::Node(boxed(introspect_schema(&g)))) }.boxed()
        })
        .expect("__schema has a return type set");
    graph.register_query(schema_query);

    let type_graph = Arc::clone(graph);
    let type_query = FunctionBuilder::new("__type", FunctionMode::Query)
        .param("name", TypeLookup::named("String"), None)
        .returns(TypeLookup::named("__Type").optional())
        .description("Request the type information of a single type.")
        .build_unary(move |args: InvokeArgs| {
            let g = Arc::clone(&type_graph);
            async move {
                let name = args.args.get("name").and_then(Json::as_str).unwrap_or_default().to_string();
                Ok(match introspect_type(&g, &name) {
                    Some(t) => Resolved::Node(boxed(t)),
                    None => Resolved::Null,
                })
            }
            .boxed()
        })
        .expect("__type has a return type set");
    graph.register_query(type_query);

    graph.enable_introspection();
}

fn field(name: &str, result_type: TypeLookup, accessor: Arc<dyn Fn(&AnyValue) -> Resolved + Send + Sync>) -> FieldLookup {
    FieldLookup {
        name: ArcStr::from(name),
        result_type,
        kind: FieldKind::Plain(accessor),
        description: None,
        is_deprecated: false,
        deprecated_reason: None,
    }
}

fn req_string(s: &str) -> Resolved {
    Resolved::Leaf(Json::String(s.to_string()))
}

fn req_bool(b: bool) -> Resolved {
    Resolved::Leaf(Json::Bool(b))
}

fn opt_string(v: &Option<String>) -> Resolved {
    match v {
        Some(s) => Resolved::Leaf(Json::String(s.clone())),
        None => Resolved::Null,
    }
}

fn opt_node<T: Clone + Send + Sync + 'static>(v: &Option<T>) -> Resolved {
    match v {
        Some(t) => Resolved::Node(boxed(t.clone())),
        None => Resolved::Null,
    }
}

fn opt_boxed_node<T: Clone + Send + Sync + 'static>(v: &Option<Box<T>>) -> Resolved {
    match v {
        Some(t) => Resolved::Node(boxed((**t).clone())),
        None => Resolved::Null,
    }
}

fn list_nodes<T: Clone + Send + Sync + 'static>(v: &[T]) -> Resolved {
    Resolved::List(v.iter().cloned().map(|t| Resolved::Node(boxed(t))).collect())
}

fn opt_list_nodes<T: Clone + Send + Sync + 'static>(v: &Option<Vec<T>>) -> Resolved {
    match v {
        Some(items) => list_nodes(items),
        None => Resolved::Null,
    }
}

fn list_strings(v: &[String]) -> Resolved {
    Resolved::List(v.iter().map(|s| Resolved::Leaf(Json::String(s.clone()))).collect())
}

fn kind_str(kind: IntrospectionTypeKind) -> &'static str {
    match kind {
        IntrospectionTypeKind::Scalar => "SCALAR",
        IntrospectionTypeKind::Object => "OBJECT",
        IntrospectionTypeKind::Interface => "INTERFACE",
        IntrospectionTypeKind::Union => "UNION",
        IntrospectionTypeKind::Enum => "ENUM",
        IntrospectionTypeKind::InputObject => "INPUT_OBJECT",
        IntrospectionTypeKind::List => "LIST",
        IntrospectionTypeKind::NonNull => "NON_NULL",
    }
}

fn non_null(root: &str) -> TypeLookup {
    TypeLookup::named(root)
}

fn nullable(root: &str) -> TypeLookup {
    TypeLookup::named(root).optional()
}

fn non_null_list(root: &str) -> TypeLookup {
    TypeLookup::named(root).list(false)
}

fn nullable_list(root: &str) -> TypeLookup {
    TypeLookup::named(root).list(false).optional()
}

fn meta_type_nodes() -> Vec<TypeNode> {
    vec![
        TypeBuilder::object("__Schema")
            .description("A GraphQL schema, as described by the introspection system.")
            .field(field("types", non_null_list("__Type"), field_fn::<IntrospectionSchema, _>(|s| {
                list_nodes(&s.types)
            })))
            .field(field("queryType", non_null("__Type"), field_fn::<IntrospectionSchema, _>(|s| {
                Resolved::Node(boxed(s.query_type.clone()))
            })))
            .field(field("mutationType", nullable("__Type"), field_fn::<IntrospectionSchema, _>(|s| {
                opt_node(&s.mutation_type)
            })))
            .field(field("subscriptionType", nullable("__Type"), field_fn::<IntrospectionSchema, _>(|s| {
                opt_node(&s.subscription_type)
            })))
            .field(field("directives", non_null_list("__Directive"), field_fn::<IntrospectionSchema, _>(|s| {
                list_nodes(&s.directives)
            })))
            .build(),
        TypeBuilder::object("__Type")
            .description("The fundamental unit of any GraphQL schema.")
            .field(field("kind", non_null("__TypeKind"), field_fn::<IntrospectionTypeRef, _>(|t| {
                req_string(kind_str(t.kind))
            })))
            .field(field("name", nullable("String"), field_fn::<IntrospectionTypeRef, _>(|t| {
                opt_string(&t.name)
            })))
            .field(field("description", nullable("String"), field_fn::<IntrospectionTypeRef, _>(|t| {
                opt_string(&t.description)
            })))
            .field(field("fields", nullable_list("__Field"), field_fn::<IntrospectionTypeRef, _>(|t| {
                opt_list_nodes(&t.fields)
            })))
            .field(field("interfaces", nullable_list("__Type"), field_fn::<IntrospectionTypeRef, _>(|t| {
                opt_list_nodes(&t.interfaces)
            })))
            .field(field("possibleTypes", nullable_list("__Type"), field_fn::<IntrospectionTypeRef, _>(|t| {
                opt_list_nodes(&t.possible_types)
            })))
            .field(field("enumValues", nullable_list("__EnumValue"), field_fn::<IntrospectionTypeRef, _>(|t| {
                opt_list_nodes(&t.enum_values)
            })))
            .field(field("inputFields", nullable_list("__InputValue"), field_fn::<IntrospectionTypeRef, _>(|t| {
                opt_list_nodes(&t.input_fields)
            })))
            .field(field("ofType", nullable("__Type"), field_fn::<IntrospectionTypeRef, _>(|t| {
                opt_boxed_node(&t.of_type)
            })))
            .build(),
        TypeBuilder::object("__Field")
            .field(field("name", non_null("String"), field_fn::<IntrospectionField, _>(|f| {
                req_string(&f.name)
            })))
            .field(field("description", nullable("String"), field_fn::<IntrospectionField, _>(|f| {
                opt_string(&f.description)
            })))
            .field(field("args", non_null_list("__InputValue"), field_fn::<IntrospectionField, _>(|f| {
                list_nodes(&f.args)
            })))
            .field(field("type", non_null("__Type"), field_fn::<IntrospectionField, _>(|f| {
                Resolved::Node(boxed(f.type_ref.clone()))
            })))
            .field(field("isDeprecated", non_null("Boolean"), field_fn::<IntrospectionField, _>(|f| {
                req_bool(f.is_deprecated)
            })))
            .field(field("deprecationReason", nullable("String"), field_fn::<IntrospectionField, _>(|f| {
                opt_string(&f.deprecation_reason)
            })))
            .build(),
        TypeBuilder::object("__InputValue")
            .field(field("name", non_null("String"), field_fn::<IntrospectionInputValue, _>(|v| {
                req_string(&v.name)
            })))
            .field(field("description", nullable("String"), field_fn::<IntrospectionInputValue, _>(|v| {
                opt_string(&v.description)
            })))
            .field(field("type", non_null("__Type"), field_fn::<IntrospectionInputValue, _>(|v| {
                Resolved::Node(boxed(v.type_ref.clone()))
            })))
            .field(field("defaultValue", nullable("String"), field_fn::<IntrospectionInputValue, _>(|v| {
                opt_string(&v.default_value)
            })))
            .build(),
        TypeBuilder::object("__EnumValue")
            .field(field("name", non_null("String"), field_fn::<IntrospectionEnumValue, _>(|v| {
                req_string(&v.name)
            })))
            .field(field("description", nullable("String"), field_fn::<IntrospectionEnumValue, _>(|v| {
                opt_string(&v.description)
            })))
            .field(field("isDeprecated", non_null("Boolean"), field_fn::<IntrospectionEnumValue, _>(|v| {
                req_bool(v.is_deprecated)
            })))
            .field(field("deprecationReason", nullable("String"), field_fn::<IntrospectionEnumValue, _>(|v| {
                opt_string(&v.deprecation_reason)
            })))
            .build(),
        TypeBuilder::object("__Directive")
            .field(field("name", non_null("String"), field_fn::<IntrospectionDirective, _>(|d| {
                req_string(&d.name)
            })))
            .field(field("description", nullable("String"), field_fn::<IntrospectionDirective, _>(|d| {
                opt_string(&d.description)
            })))
            .field(field("locations", non_null_list("String"), field_fn::<IntrospectionDirective, _>(|d| {
                list_strings(&d.locations)
            })))
            .field(field("args", non_null_list("__InputValue"), field_fn::<IntrospectionDirective, _>(|d| {
                list_nodes(&d.args)
            })))
            .build(),
        TypeBuilder::enum_type(
            "__TypeKind",
            vec![
                EnumValue::new("SCALAR"),
                EnumValue::new("OBJECT"),
                EnumValue::new("INTERFACE"),
                EnumValue::new("UNION"),
                EnumValue::new("ENUM"),
                EnumValue::new("INPUT_OBJECT"),
                EnumValue::new("LIST"),
                EnumValue::new("NON_NULL"),
            ],
        )
        .build(),
    ]
}
