//! Component E: Schema Emitter & Introspection (spec.md §3.4, §4.E).
//!
//! Grounded on the teacher's `schema/model.rs` (the canonical meta-type model
//! that both SDL printing and introspection read from) and
//! `introspection/mod.rs` (the `__Schema`/`__Type`/... response shapes), adapted
//! to read from this crate's runtime [`TypeGraph`] instead of a build-time
//! `SchemaType`.

mod introspection;
mod meta;
mod registration;
mod sdl;

pub use self::introspection::{
    IntrospectionEnumValue, IntrospectionField, IntrospectionInputValue, IntrospectionSchema, IntrospectionType,
    IntrospectionTypeKind, IntrospectionTypeRef, introspect_schema, introspect_type,
};
pub use self::registration::install_introspection;
pub use self::sdl::emit_sdl;
