//! A one-shot snapshot of every registered type's name/kind/embedding status.
//!
//! [`TypeGraph::with_type`] takes its own read lock per call and the lock is
//! held for the duration of the closure; resolving a field's *referenced*
//! type from inside another type's `with_type` closure would reacquire that
//! same lock on the same thread, which `std::sync::RwLock` does not guarantee
//! is safe. SDL/introspection emission needs exactly this kind of
//! cross-reference, so we snapshot the cheap bits once up front and have the
//! renderers consult the snapshot instead of the graph.

use std::collections::BTreeMap;

use arcstr::ArcStr;

use crate::registry::{TypeGraph, TypeKind};

#[derive(Clone, Copy)]
pub(super) struct TypeMeta {
    pub(super) kind: TypeKind,
    pub(super) embedded: bool,
    pub(super) interface_only: bool,
}

pub(super) fn collect_meta(graph: &TypeGraph) -> BTreeMap<ArcStr, TypeMeta> {
    let names = graph.type_names();
    let mut map = BTreeMap::new();
    for name in &names {
        graph.with_type(name, |node| {
            map.insert(
                node.name.clone(),
                TypeMeta {
                    kind: node.kind,
                    embedded: !node.implemented_by.is_empty(),
                    interface_only: node.interface_only,
                },
            );
        });
    }
    map
}

pub(super) fn iface_name(name: &str) -> String {
    format!("I{name}")
}

/// The name a reference to `root` should render as: `I<Name>` if `root` is
/// embedded by at least one other type (and isn't itself `interfaceOnly`),
/// else `root` unchanged (spec.md §4.E "interface naming").
pub(super) fn type_ref_name(meta: &BTreeMap<ArcStr, TypeMeta>, root: &str) -> String {
    match meta.get(root) {
        Some(m) if m.embedded && !m.interface_only => iface_name(root),
        _ => root.to_string(),
    }
}
