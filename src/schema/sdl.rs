//! SDL printing (spec.md §4.E "SchemaDefinition").
//!
//! Grounded on the teacher's `schema/model.rs` type-walking structure, with the
//! ordering rules spelled out in spec.md §4.E: type categories are emitted
//! interfaces → objects → inputs → enums → unions → scalars, and within each
//! category names/fields/values are alphabetized (fields case-insensitively,
//! with the original registration order as a stable tiebreak).

use std::collections::BTreeMap;
use std::fmt::Write as _;

use arcstr::ArcStr;
use serde_json::Value as Json;

use crate::registry::{FieldKind, FieldLookup, FunctionMode, GraphFunction, ParamBinding, TypeGraph, TypeKind, TypeLookup, TypeNode};

use super::meta::{collect_meta, iface_name, type_ref_name, TypeMeta};

/// Renders the full SDL text for `graph` (spec.md §4.E).
pub fn emit_sdl(graph: &TypeGraph) -> String {
    let meta = collect_meta(graph);
    let mut out = String::new();
    emit_root_operation_types(graph, &meta, &mut out);

    let mut names = graph.type_names();
    names.sort_by(|a, b| a.as_str().cmp(b.as_str()));

    let mut interfaces = Vec::new();
    let mut objects = Vec::new();
    let mut inputs = Vec::new();
    let mut enums = Vec::new();
    let mut unions = Vec::new();
    let mut scalars = Vec::new();

    for name in &names {
        graph.with_type(name, |node| match node.kind {
            TypeKind::Object => {
                if node.implemented_by.is_empty() {
                    objects.push(emit_object(&meta, node, None));
                } else if node.interface_only {
                    interfaces.push(emit_interface(&meta, node, node.name.as_str()));
                } else {
                    let iface = iface_name(&node.name);
                    interfaces.push(emit_interface(&meta, node, &iface));
                    objects.push(emit_object(&meta, node, Some(&iface)));
                }
            }
            TypeKind::InputObject => inputs.push(emit_input(&meta, node)),
            TypeKind::Enum => enums.push(emit_enum(node)),
            TypeKind::Union => unions.push(emit_union(node)),
            TypeKind::Scalar => {
                if node.scalar.is_some() {
                    scalars.push(emit_scalar(node));
                }
            }
            TypeKind::Interface => {
                // Never constructed directly: embedded-type relationships are
                // tracked on the `Object` node via `implemented_by`/`interface_only`.
            }
        });
    }

    for (name, members) in virtual_unions(graph, &names) {
        let joined = members.iter().map(ArcStr::as_str).collect::<Vec<_>>().join(" | ");
        unions.push(format!("union {name} = {joined}"));
    }

    for section in [interfaces, objects, inputs, enums, unions, scalars] {
        for item in section {
            out.push_str(&item);
            out.push_str("\n\n");
        }
    }
    out.trim_end().to_string() + "\n"
}

fn emit_root_operation_types(graph: &TypeGraph, meta: &BTreeMap<ArcStr, TypeMeta>, out: &mut String) {
    for (mode, title) in [
        (FunctionMode::Query, "Query"),
        (FunctionMode::Mutation, "Mutation"),
        (FunctionMode::Subscription, "Subscription"),
    ] {
        let mut names = graph.root_function_names(mode);
        if names.is_empty() {
            continue;
        }
        names.sort_by_key(|n| n.to_ascii_lowercase());
        let _ = writeln!(out, "type {title} {{");
        for name in &names {
            if let Some(f) = graph.root_function(mode, name) {
                let _ = writeln!(out, "{}", emit_field_from_function(meta, &f));
            }
        }
        out.push_str("}\n\n");
    }
}

fn sorted_fields(node: &TypeNode) -> Vec<&FieldLookup> {
    let mut fields: Vec<&FieldLookup> = node.fields().collect();
    fields.sort_by_cached_key(|f| f.name.to_ascii_lowercase());
    fields
}

fn emit_object(meta: &BTreeMap<ArcStr, TypeMeta>, node: &TypeNode, implements: Option<&str>) -> String {
    let mut s = String::new();
    if let Some(desc) = &node.description {
        let _ = writeln!(s, "\"\"\"{desc}\"\"\"");
    }
    match implements {
        Some(iface) => {
            let _ = writeln!(s, "type {} implements {} {{", node.name, iface);
        }
        None => {
            let _ = writeln!(s, "type {} {{", node.name);
        }
    }
    for field in sorted_fields(node) {
        let _ = writeln!(s, "{}", emit_field(meta, field));
    }
    s.push('}');
    s
}

fn emit_interface(meta: &BTreeMap<ArcStr, TypeMeta>, node: &TypeNode, iface_name: &str) -> String {
    let mut s = String::new();
    if let Some(desc) = &node.description {
        let _ = writeln!(s, "\"\"\"{desc}\"\"\"");
    }
    let _ = writeln!(s, "interface {iface_name} {{");
    for field in sorted_fields(node) {
        let _ = writeln!(s, "{}", emit_field(meta, field));
    }
    s.push('}');
    s
}

fn emit_input(meta: &BTreeMap<ArcStr, TypeMeta>, node: &TypeNode) -> String {
    let mut s = String::new();
    if let Some(desc) = &node.description {
        let _ = writeln!(s, "\"\"\"{desc}\"\"\"");
    }
    let _ = writeln!(s, "input {} {{", node.name);
    for field in sorted_fields(node) {
        let ty = render_type_lookup(meta, &field.result_type);
        let _ = writeln!(s, "  {}: {}", field.name, ty);
    }
    s.push('}');
    s
}

fn emit_enum(node: &TypeNode) -> String {
    let mut s = String::new();
    if let Some(desc) = &node.description {
        let _ = writeln!(s, "\"\"\"{desc}\"\"\"");
    }
    let _ = writeln!(s, "enum {} {{", node.name);
    let mut values: Vec<&crate::registry::EnumValue> = node.enum_values.iter().collect();
    values.sort_by_cached_key(|v| v.name.to_ascii_lowercase());
    for v in values {
        if let Some(desc) = &v.description {
            let _ = writeln!(s, "  \"\"\"{desc}\"\"\"");
        }
        let _ = write!(s, "  {}", v.name);
        if let Some(reason) = &v.deprecated_reason {
            let _ = write!(s, " @deprecated(reason: {:?})", reason.as_str());
        }
        s.push('\n');
    }
    s.push('}');
    s
}

fn emit_union(node: &TypeNode) -> String {
    let joined = node.union_members.iter().map(ArcStr::as_str).collect::<Vec<_>>().join(" | ");
    format!("union {} = {}", node.name, joined)
}

fn emit_scalar(node: &TypeNode) -> String {
    let mut s = String::new();
    if let Some(desc) = &node.description {
        let _ = writeln!(s, "\"\"\"{desc}\"\"\"");
    }
    let _ = write!(s, "scalar {}", node.name);
    s
}

fn emit_field(meta: &BTreeMap<ArcStr, TypeMeta>, field: &FieldLookup) -> String {
    let mut s = String::new();
    if let Some(desc) = &field.description {
        let _ = writeln!(s, "  \"\"\"{desc}\"\"\"");
    }
    let _ = write!(s, "  {}", field.name);
    if let FieldKind::Resolver(function) = &field.kind {
        write_args(meta, &mut s, function);
    }
    let type_str = match &field.kind {
        FieldKind::Resolver(function) if function.return_union_name.is_some() => {
            let name = function.return_union_name.as_ref().expect("checked Some above").to_string();
            wrap_type_modifiers(&name, &field.result_type)
        }
        _ => render_type_lookup(meta, &field.result_type),
    };
    let _ = write!(s, ": {type_str}");
    if field.is_deprecated {
        s.push_str(" @deprecated");
        if let Some(reason) = &field.deprecated_reason {
            let _ = write!(s, "(reason: {:?})", reason.as_str());
        }
    }
    s
}

fn emit_field_from_function(meta: &BTreeMap<ArcStr, TypeMeta>, f: &GraphFunction) -> String {
    let mut s = String::new();
    if let Some(desc) = &f.description {
        let _ = writeln!(s, "  \"\"\"{desc}\"\"\"");
    }
    let _ = write!(s, "  {}", f.name);
    write_args(meta, &mut s, f);
    let name = match &f.return_union_name {
        Some(u) => u.to_string(),
        None => type_ref_name(meta, &f.base_return_type.root),
    };
    let _ = write!(s, ": {}", wrap_type_modifiers(&name, &f.base_return_type));
    if f.is_deprecated {
        s.push_str(" @deprecated");
        if let Some(reason) = &f.deprecated_reason {
            let _ = write!(s, "(reason: {:?})", reason.as_str());
        }
    }
    s
}

fn write_args(meta: &BTreeMap<ArcStr, TypeMeta>, s: &mut String, f: &GraphFunction) {
    if f.params_by_name.is_empty() {
        return;
    }
    let mut args: Vec<&ParamBinding> = f.params_by_name.values().collect();
    args.sort_by_key(|p| p.index);
    let rendered: Vec<String> = args.iter().map(|p| render_arg(meta, p)).collect();
    let _ = write!(s, "({})", rendered.join(", "));
}

fn render_arg(meta: &BTreeMap<ArcStr, TypeMeta>, p: &ParamBinding) -> String {
    let ty = render_type_lookup(meta, &p.arg_type);
    match &p.default_value {
        Some(d) => format!("{}: {} = {}", p.name, ty, json_to_sdl_literal(d)),
        None => format!("{}: {}", p.name, ty),
    }
}

fn wrap_type_modifiers(name: &str, tl: &TypeLookup) -> String {
    if tl.is_slice {
        let inner = if tl.inner_is_pointer { name.to_string() } else { format!("{name}!") };
        let list = format!("[{inner}]");
        if tl.is_pointer { list } else { format!("{list}!") }
    } else if tl.is_pointer {
        name.to_string()
    } else {
        format!("{name}!")
    }
}

fn render_type_lookup(meta: &BTreeMap<ArcStr, TypeMeta>, tl: &TypeLookup) -> String {
    let name = type_ref_name(meta, &tl.root);
    wrap_type_modifiers(&name, tl)
}

/// Resolver return types can be dynamically typed among a closed set of
/// concrete types (spec.md §3.1/§4.A "Return-any"); when the host didn't also
/// register an explicit union type under that name, we still owe the schema a
/// `union` declaration so the field's declared type resolves.
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

fn json_to_sdl_literal(v: &Json) -> String {
    match v {
        Json::Null => "null".to_string(),
        Json::Bool(b) => b.to_string(),
        Json::Number(n) => n.to_string(),
        Json::String(s) => format!("{s:?}"),
        Json::Array(items) => format!("[{}]", items.iter().map(json_to_sdl_literal).collect::<Vec<_>>().join(", ")),
        Json::Object(map) => {
            let body = map.iter().map(|(k, v)| format!("{k}: {}", json_to_sdl_literal(v))).collect::<Vec<_>>().join(", ");
            format!("{{{body}}}")
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::registry::{field_fn, EnumValue, FieldKind, FieldLookup, Resolved, TypeBuilder, TypeGraph, TypeLookup};

    use super::emit_sdl;

    fn sample_graph() -> TypeGraph {
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
                        name: "zebra".into(),
                        result_type: TypeLookup::named("String"),
                        kind: FieldKind::Plain(field_fn::<(), _>(|_| Resolved::Null)),
                        description: None,
                        is_deprecated: false,
                        deprecated_reason: None,
                    })
                    .field(FieldLookup {
                        name: "apple".into(),
                        result_type: TypeLookup::named("String"),
                        kind: FieldKind::Plain(field_fn::<(), _>(|_| Resolved::Null)),
                        description: None,
                        is_deprecated: false,
                        deprecated_reason: None,
                    })
                    .build(),
            )
            .expect("Character registers cleanly");
        graph
    }

    #[test]
    fn emit_sdl_is_deterministic_across_calls() {
        let graph = sample_graph();
        assert_eq!(emit_sdl(&graph), emit_sdl(&graph));
    }

    #[test]
    fn emit_sdl_orders_fields_alphabetically_case_insensitively() {
        let graph = sample_graph();
        let sdl = emit_sdl(&graph);
        let apple_pos = sdl.find("apple").expect("apple field present");
        let zebra_pos = sdl.find("zebra").expect("zebra field present");
        assert!(apple_pos < zebra_pos, "expected apple before zebra in:\n{sdl}");
    }

    #[test]
    fn emit_sdl_includes_enum_values() {
        let graph = sample_graph();
        let sdl = emit_sdl(&graph);
        assert!(sdl.contains("enum Episode"));
        assert!(sdl.contains("JEDI"));
        assert!(sdl.contains("EMPIRE"));
    }
}
