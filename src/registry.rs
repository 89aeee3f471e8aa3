//! Component A: the Type Graph (spec.md §3.1, §4.A).
//!
//! Grounded on the teacher's `schema/meta.rs` meta-type shapes, generalized from
//! compile-time trait impls (`GraphQLType::meta`) into a runtime registry that the
//! host populates with plain builder calls — see SPEC_FULL.md §0 "Runtime
//! reflection over callables" for why Rust needs this shape instead of reflection.

use std::any::{Any, TypeId};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use arcstr::ArcStr;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::ast::InputValue;
use crate::cancel::CancellationToken;
use crate::error::{FieldError, RegistrationError};

/// A type-erased host value flowing through the graph: field receivers, resolver
/// return values, and subscription stream items are all boxed this way so the
/// executor can walk them without knowing their concrete Rust type.
pub type AnyValue = Arc<dyn Any + Send + Sync>;

/// Boxes a concrete host value as an [`AnyValue`].
pub fn boxed<T: Send + Sync + 'static>(value: T) -> AnyValue {
    Arc::new(value)
}

/// What an invoked resolver produced, before the executor walks it against the
/// declared selection set (spec.md §4.D phase 3).
#[derive(Clone)]
pub enum Resolved {
    /// A nil pointer / absent optional.
    Null,
    /// A scalar leaf, already serialized to JSON.
    Leaf(Json),
    /// An object-typed result that still needs its selection set resolved.
    Node(AnyValue),
    /// A list of further results (each resolved against the same field type).
    List(Vec<Resolved>),
}

/// Builds a [`Resolved::Node`] accessor for a typed field, downcasting the
/// type-erased receiver back to `T` before calling `f`.
///
/// This is the Rust expression of spec.md §9's builder note: instead of
/// reflecting over a struct's fields, the host supplies one small closure per
/// field at registration time.
pub fn field_fn<T, F>(f: F) -> Arc<dyn Fn(&AnyValue) -> Resolved + Send + Sync>
where
    T: Send + Sync + 'static,
    F: Fn(&T) -> Resolved + Send + Sync + 'static,
{
    Arc::new(move |receiver: &AnyValue| {
        let t = receiver
            .downcast_ref::<T>()
            .expect("plain-field accessor called with mismatched receiver type");
        f(t)
    })
}

/// GraphQL type categories (spec.md §3.1).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TypeKind {
    /// A leaf scalar (built-in or custom).
    Scalar,
    /// An enumeration.
    Enum,
    /// A concrete output object.
    Object,
    /// An interface (embedded-type relationship, emitted as `I<Name>`).
    Interface,
    /// A union of several object types.
    Union,
    /// An input object (used only in argument/variable position).
    InputObject,
}

/// An enum value descriptor (spec.md §3.1 "Enum").
#[derive(Clone, Debug, PartialEq)]
pub struct EnumValue {
    /// The value's GraphQL name, e.g. `JEDI`.
    pub name: ArcStr,
    /// Documentation string.
    pub description: Option<ArcStr>,
    /// Deprecation reason, if deprecated.
    pub deprecated_reason: Option<ArcStr>,
}

impl EnumValue {
    /// Builds an [`EnumValue`] with no documentation or deprecation.
    pub fn new(name: impl Into<ArcStr>) -> Self {
        EnumValue {
            name: name.into(),
            description: None,
            deprecated_reason: None,
        }
    }
}

/// A custom scalar's serialize/parse callbacks (spec.md §3.1 "Scalar").
///
/// `parse_literal` defaults to applying `parse_value` to the literal's JSON
/// equivalent, per spec.md §9: "the two parse functions can differ deliberately
/// ... `parseLiteral` defaulting to `parseValue`".
pub struct ScalarDef {
    /// GraphQL scalar name.
    pub name: ArcStr,
    /// Documentation string.
    pub description: Option<ArcStr>,
    /// Converts an internal host-scalar JSON value into wire JSON.
    pub serialize: Arc<dyn Fn(&Json) -> Json + Send + Sync>,
    /// Parses a JSON value (from a variables document) into internal form.
    pub parse_value: Arc<dyn Fn(&Json) -> Result<Json, String> + Send + Sync>,
    /// Parses a document literal into internal form.
    pub parse_literal: Arc<dyn Fn(&InputValue) -> Result<Json, String> + Send + Sync>,
}

/// A use-site reference to a registered type, carrying the optionality/list
/// modifiers spec.md §3.1 attaches to `TypeLookup` (`isPointer`, `isSlice`,
/// `innerIsPointer`). The canonical per-name entry lives in [`TypeNode`]; `root`
/// is the key that looks it up.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeLookup {
    /// Canonical registry key this reference resolves to.
    pub root: ArcStr,
    /// `true` if this use site is optional (a nil host pointer maps to GraphQL
    /// `null` instead of a non-null type).
    pub is_pointer: bool,
    /// `true` if this use site is a list.
    pub is_slice: bool,
    /// `true` if, for a list use site, the list's items are themselves optional.
    pub inner_is_pointer: bool,
}

impl TypeLookup {
    /// A required (non-null), non-list reference to `root`.
    pub fn named(root: impl Into<ArcStr>) -> Self {
        TypeLookup {
            root: root.into(),
            is_pointer: false,
            is_slice: false,
            inner_is_pointer: false,
        }
    }

    /// Marks this reference as optional.
    pub fn optional(mut self) -> Self {
        self.is_pointer = true;
        self
    }

    /// Marks this reference as a list, optionally with optional items.
    pub fn list(mut self, item_optional: bool) -> Self {
        self.is_slice = true;
        self.inner_is_pointer = item_optional;
        self
    }
}

/// The canonical, per-name descriptor for a type (spec.md §3.1 "TypeLookup").
pub struct TypeNode {
    /// GraphQL type name.
    pub name: ArcStr,
    /// Type category.
    pub kind: TypeKind,
    /// `true` for built-in or registered custom scalars.
    pub fundamental: bool,
    /// Documentation string.
    pub description: Option<ArcStr>,
    /// Deprecation reason for the type itself (rare, but mirrors field/enum
    /// deprecation uniformly).
    pub deprecated: Option<ArcStr>,
    /// When `true`, suppresses emitting the concrete object form even though
    /// `implemented_by` is non-empty (spec.md §3.1 invariant 3).
    pub interface_only: bool,
    /// Whether this node is only usable in argument/variable position.
    pub is_input: bool,
    fields: IndexMap<ArcStr, FieldLookup>,
    field_ci: HashMap<String, ArcStr>,
    /// Types this one structurally embeds ("is-a").
    pub implements: BTreeSet<ArcStr>,
    /// Types that embed this one; closure computed after all registrations.
    pub implemented_by: BTreeSet<ArcStr>,
    /// Member type names, if this node is a union.
    pub union_members: BTreeSet<ArcStr>,
    /// Ordered enum values, if this node is an enum.
    pub enum_values: Vec<EnumValue>,
    /// Scalar callbacks, if this node is a scalar.
    pub scalar: Option<Arc<ScalarDef>>,
}

impl TypeNode {
    fn new(name: ArcStr, kind: TypeKind) -> Self {
        TypeNode {
            name,
            kind,
            fundamental: false,
            description: None,
            deprecated: None,
            interface_only: false,
            is_input: false,
            fields: IndexMap::new(),
            field_ci: HashMap::new(),
            implements: BTreeSet::new(),
            implemented_by: BTreeSet::new(),
            union_members: BTreeSet::new(),
            enum_values: Vec::new(),
            scalar: None,
        }
    }

    /// Inserts a field, keeping a case-insensitive mirror for lookup tolerance
    /// while emission always uses the original name (spec.md §3.1 "fields").
    pub fn insert_field(&mut self, field: FieldLookup) {
        let lower = field.name.to_ascii_lowercase();
        self.field_ci.insert(lower, field.name.clone());
        self.fields.insert(field.name.clone(), field);
    }

    /// Looks up a field, case-sensitive first then case-insensitive.
    pub fn field(&self, name: &str) -> Option<&FieldLookup> {
        if let Some(f) = self.fields.get(name) {
            return Some(f);
        }
        let canon = self.field_ci.get(&name.to_ascii_lowercase())?;
        self.fields.get(canon)
    }

    /// Fields in registration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldLookup> {
        self.fields.values()
    }

    /// Tests whether `iface_name` applies to this node directly: either it IS
    /// that type, or it structurally embeds it (spec.md §4.C
    /// "ImplementsInterface"). Union membership can't be decided from a single
    /// node in isolation; see [`TypeGraph::implements_interface`].
    pub fn implements_interface(&self, iface_name: &str) -> bool {
        self.name.as_str() == iface_name || self.implements.iter().any(|n| n.as_str() == iface_name)
    }
}

/// A field of an object/interface/input-object type (spec.md §3.1 "FieldLookup").
pub struct FieldLookup {
    /// GraphQL field name.
    pub name: ArcStr,
    /// Declared result type, including use-site modifiers.
    pub result_type: TypeLookup,
    /// How the field's value is produced.
    pub kind: FieldKind,
    /// Documentation string.
    pub description: Option<ArcStr>,
    /// `true` if deprecated.
    pub is_deprecated: bool,
    /// Deprecation reason, if any.
    pub deprecated_reason: Option<ArcStr>,
}

/// How a [`FieldLookup`]'s value is produced.
pub enum FieldKind {
    /// A direct accessor into the receiver (spec.md: "plain-field").
    Plain(Arc<dyn Fn(&AnyValue) -> Resolved + Send + Sync>),
    /// A registered callable invoked with the receiver (spec.md: "resolver-function").
    Resolver(Arc<GraphFunction>),
}

/// `query` / `mutation` / `subscription` / `field` (spec.md §3.1 "GraphFunction.mode").
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FunctionMode {
    /// A root query field.
    Query,
    /// A root mutation field.
    Mutation,
    /// A root subscription field.
    Subscription,
    /// A field resolver on a non-root type.
    Field,
}

/// How arguments bind to parameters (spec.md §3.1/§4.A "Parameter mode inference").
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParamMode {
    /// No arguments.
    None,
    /// Arguments destructured from a registered input-object type's fields.
    Struct,
    /// Arguments matched by explicit name.
    Named,
    /// Arguments matched by position (`arg1`, `arg2`, ...).
    Positional,
}

/// One bound parameter of a [`GraphFunction`] (spec.md §3.1 "paramsByName").
#[derive(Clone)]
pub struct ParamBinding {
    /// GraphQL argument name.
    pub name: ArcStr,
    /// Position in the host callable's parameter list.
    pub index: usize,
    /// Declared argument type.
    pub arg_type: TypeLookup,
    /// Literal default, if the argument is optional with a default.
    pub default_value: Option<Json>,
}

/// Bundles the receiver (if any) and bound argument values passed into an
/// invocation (spec.md §4.D phase 2 "Build the argument tuple").
pub struct InvokeArgs {
    /// The field's receiver object, absent for root query/mutation/subscription
    /// selections.
    pub receiver: Option<AnyValue>,
    /// Argument values already bound from literals/variables.
    pub args: IndexMap<ArcStr, Json>,
    /// The ambient cancellation/timeout context (spec.md §4.D "Resolver-function
    /// semantics" — "the executor supplies the ambient cancellation/timeout
    /// context"). Resolvers that run long operations should poll or race on
    /// this; resolvers that don't care may ignore it.
    pub cancellation: CancellationToken,
}

/// How a [`GraphFunction`] is actually called.
pub enum Invocation {
    /// An ordinary query/mutation/field resolver.
    Unary(Arc<dyn Fn(InvokeArgs) -> BoxFuture<'static, Result<Resolved, FieldError>> + Send + Sync>),
    /// A subscription: resolves to a lazy stream of values (spec.md §5
    /// "Subscriptions").
    Stream(
        Arc<
            dyn Fn(InvokeArgs) -> BoxFuture<'static, Result<BoxStream<'static, Result<Resolved, FieldError>>, FieldError>>
                + Send
                + Sync,
        >,
    ),
}

/// A callable exposed as a query/mutation/subscription/field resolver
/// (spec.md §3.1 "GraphFunction").
pub struct GraphFunction {
    /// GraphQL field name this callable is exposed as.
    pub name: ArcStr,
    /// Which root (or field) this callable serves.
    pub mode: FunctionMode,
    /// How its arguments are matched.
    pub param_mode: ParamMode,
    /// Ordered argument bindings, keyed by GraphQL argument name.
    pub params_by_name: IndexMap<ArcStr, ParamBinding>,
    /// The principal output type.
    pub base_return_type: TypeLookup,
    /// Override name for the anonymous union emitted when this callable can
    /// return more than one result type.
    pub return_union_name: Option<ArcStr>,
    /// Closed set of concrete types a dynamically-typed return may produce
    /// (spec.md §3.1/§4.A "Return-any").
    pub return_any_override: Vec<ArcStr>,
    /// Documentation string.
    pub description: Option<ArcStr>,
    /// `true` if deprecated.
    pub is_deprecated: bool,
    /// Deprecation reason, if any.
    pub deprecated_reason: Option<ArcStr>,
    pub(crate) invoke: Invocation,
}

impl GraphFunction {
    /// `true` if this function is a subscription (stream-producing).
    pub fn is_subscription(&self) -> bool {
        matches!(self.mode, FunctionMode::Subscription)
    }
}

/// Builder for a [`GraphFunction`] (spec.md §9's "builder that accepts either a
/// record type, an explicit name list, or positional arguments").
pub struct FunctionBuilder {
    name: ArcStr,
    mode: FunctionMode,
    param_mode: ParamMode,
    params: IndexMap<ArcStr, ParamBinding>,
    next_positional: usize,
    base_return_type: Option<TypeLookup>,
    return_union_name: Option<ArcStr>,
    return_any_override: Vec<ArcStr>,
    description: Option<ArcStr>,
    is_deprecated: bool,
    deprecated_reason: Option<ArcStr>,
}

impl FunctionBuilder {
    /// Starts building a callable named `name` for the given `mode`.
    pub fn new(name: impl Into<ArcStr>, mode: FunctionMode) -> Self {
        FunctionBuilder {
            name: name.into(),
            mode,
            param_mode: ParamMode::None,
            params: IndexMap::new(),
            next_positional: 0,
            base_return_type: None,
            return_union_name: None,
            return_any_override: Vec::new(),
            description: None,
            is_deprecated: false,
            deprecated_reason: None,
        }
    }

    /// Adds a named argument (named-params / struct-params mode).
    pub fn param(mut self, name: impl Into<ArcStr>, arg_type: TypeLookup, default: Option<Json>) -> Self {
        self.param_mode = ParamMode::Named;
        let name: ArcStr = name.into();
        let index = self.params.len();
        self.params.insert(
            name.clone(),
            ParamBinding {
                name,
                index,
                arg_type,
                default_value: default,
            },
        );
        self
    }

    /// Adds a positional argument, auto-named `arg1`, `arg2`, ... in call order
    /// (spec.md §9 "positional arguments named arg1…argN at emission time").
    pub fn positional_param(mut self, arg_type: TypeLookup, default: Option<Json>) -> Self {
        self.param_mode = ParamMode::Positional;
        self.next_positional += 1;
        let name = ArcStr::from(format!("arg{}", self.next_positional));
        let index = self.params.len();
        self.params.insert(
            name.clone(),
            ParamBinding {
                name,
                index,
                arg_type,
                default_value: default,
            },
        );
        self
    }

    /// Marks this function as using struct-params: `fields`, taken from a
    /// registered input-object's own field order, become named arguments.
    pub fn struct_params(mut self, fields: impl IntoIterator<Item = (ArcStr, TypeLookup, Option<Json>)>) -> Self {
        self.param_mode = ParamMode::Struct;
        for (name, arg_type, default) in fields {
            let index = self.params.len();
            self.params.insert(
                name.clone(),
                ParamBinding {
                    name,
                    index,
                    arg_type,
                    default_value: default,
                },
            );
        }
        self
    }

    /// Sets the principal output type.
    pub fn returns(mut self, t: TypeLookup) -> Self {
        self.base_return_type = Some(t);
        self
    }

    /// Overrides the name of the anonymous union emitted for a
    /// multi-optional-result return (default is `<Name>ResultUnion`).
    pub fn return_union_name(mut self, name: impl Into<ArcStr>) -> Self {
        self.return_union_name = Some(name.into());
        self
    }

    /// Declares the closed set of concrete types a dynamic return may be.
    pub fn return_any_override(mut self, names: impl IntoIterator<Item = impl Into<ArcStr>>) -> Self {
        self.return_any_override = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the documentation string.
    pub fn description(mut self, d: impl Into<ArcStr>) -> Self {
        self.description = Some(d.into());
        self
    }

    /// Marks the function deprecated with a reason.
    pub fn deprecated(mut self, reason: impl Into<ArcStr>) -> Self {
        self.is_deprecated = true;
        self.deprecated_reason = Some(reason.into());
        self
    }

    /// Finishes the builder with a unary (non-streaming) invocation.
    pub fn build_unary(
        self,
        invoke: impl Fn(InvokeArgs) -> BoxFuture<'static, Result<Resolved, FieldError>> + Send + Sync + 'static,
    ) -> Result<GraphFunction, RegistrationError> {
        self.finish(Invocation::Unary(Arc::new(invoke)))
    }

    /// Finishes the builder with a subscription (stream-producing) invocation.
    pub fn build_stream(
        self,
        invoke: impl Fn(InvokeArgs) -> BoxFuture<'static, Result<BoxStream<'static, Result<Resolved, FieldError>>, FieldError>>
            + Send
            + Sync
            + 'static,
    ) -> Result<GraphFunction, RegistrationError> {
        self.finish(Invocation::Stream(Arc::new(invoke)))
    }

    fn finish(self, invoke: Invocation) -> Result<GraphFunction, RegistrationError> {
        let base_return_type = self
            .base_return_type
            .ok_or_else(|| RegistrationError::UnknownType("<unset>".into(), self.name.to_string()))?;
        Ok(GraphFunction {
            name: self.name,
            mode: self.mode,
            param_mode: self.param_mode,
            params_by_name: self.params,
            base_return_type,
            return_union_name: self.return_union_name,
            return_any_override: self.return_any_override,
            description: self.description,
            is_deprecated: self.is_deprecated,
            deprecated_reason: self.deprecated_reason,
            invoke,
        })
    }
}

/// Builder for a [`TypeNode`] (object / interface / input-object / union / enum).
pub struct TypeBuilder {
    node: TypeNode,
}

impl TypeBuilder {
    /// Starts building an object type.
    pub fn object(name: impl Into<ArcStr>) -> Self {
        TypeBuilder {
            node: TypeNode::new(name.into(), TypeKind::Object),
        }
    }

    /// Starts building an input-object type.
    pub fn input_object(name: impl Into<ArcStr>) -> Self {
        let mut node = TypeNode::new(name.into(), TypeKind::InputObject);
        node.is_input = true;
        TypeBuilder { node }
    }

    /// Starts building an enum type.
    pub fn enum_type(name: impl Into<ArcStr>, values: Vec<EnumValue>) -> Self {
        let mut node = TypeNode::new(name.into(), TypeKind::Enum);
        node.enum_values = values;
        TypeBuilder { node }
    }

    /// Starts building an explicit union type.
    pub fn union(name: impl Into<ArcStr>, members: impl IntoIterator<Item = impl Into<ArcStr>>) -> Self {
        let mut node = TypeNode::new(name.into(), TypeKind::Union);
        node.union_members = members.into_iter().map(Into::into).collect();
        TypeBuilder { node }
    }

    /// Adds a field to an object/interface/input-object builder.
    pub fn field(mut self, field: FieldLookup) -> Self {
        self.node.insert_field(field);
        self
    }

    /// Declares that this type structurally embeds `iface`, the Rust expression
    /// of spec.md §9's "embedded-record is-a relationship" (which Rust lacks, so
    /// it is stated explicitly instead of discovered via struct embedding).
    pub fn implements(mut self, iface: impl Into<ArcStr>) -> Self {
        self.node.implements.insert(iface.into());
        self
    }

    /// Suppresses emitting the concrete object form (spec.md §3.1 invariant 3).
    pub fn interface_only(mut self) -> Self {
        self.node.interface_only = true;
        self
    }

    /// Sets the documentation string.
    pub fn description(mut self, d: impl Into<ArcStr>) -> Self {
        self.node.description = Some(d.into());
        self
    }

    /// Finishes the builder.
    pub fn build(self) -> TypeNode {
        self.node
    }
}

/// The Type Graph: component A of spec.md §2/§4.A.
///
/// Read-mostly: registration takes the writer lock; every other operation
/// (compiling a stub, executing a request, emitting schema/introspection) takes
/// the reader lock, per spec.md §5 "Mutability domains".
pub struct TypeGraph {
    inner: RwLock<Inner>,
}

struct Inner {
    types: IndexMap<ArcStr, TypeNode>,
    queries: IndexMap<ArcStr, Arc<GraphFunction>>,
    mutations: IndexMap<ArcStr, Arc<GraphFunction>>,
    subscriptions: IndexMap<ArcStr, Arc<GraphFunction>>,
    introspection_enabled: bool,
    host_types: HashMap<TypeId, ArcStr>,
}

const FUNDAMENTAL_SCALARS: &[&str] = &["String", "Int", "Float", "Boolean", "ID"];

impl Default for TypeGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeGraph {
    /// Creates an empty graph, pre-seeded with the five built-in scalars
    /// (spec.md §3.1 "Scalars are matched ... otherwise fundamental kinds map to
    /// String, Int, Float, Boolean, ID").
    pub fn new() -> Self {
        let mut types = IndexMap::new();
        for name in FUNDAMENTAL_SCALARS {
            let mut node = TypeNode::new(ArcStr::from(*name), TypeKind::Scalar);
            node.fundamental = true;
            types.insert(node.name.clone(), node);
        }
        TypeGraph {
            inner: RwLock::new(Inner {
                types,
                queries: IndexMap::new(),
                mutations: IndexMap::new(),
                subscriptions: IndexMap::new(),
                introspection_enabled: false,
                host_types: HashMap::new(),
            }),
        }
    }

    /// Associates a concrete host type `T` with the GraphQL type named `name`,
    /// so the executor can recover a runtime value's GraphQL type for union and
    /// interface field resolution (spec.md §4.D phase 3 "the value's dynamic
    /// TypeLookup").
    pub fn bind_host_type<T: Any + Send + Sync + 'static>(&self, name: impl Into<ArcStr>) {
        let mut inner = self.inner.write().expect("type graph lock poisoned");
        inner.host_types.insert(TypeId::of::<T>(), name.into());
    }

    /// Recovers the GraphQL type name bound to `value`'s concrete Rust type, if any.
    pub fn concrete_type_name(&self, value: &AnyValue) -> Option<ArcStr> {
        let inner = self.inner.read().expect("type graph lock poisoned");
        inner.host_types.get(&value.as_ref().type_id()).cloned()
    }

    fn validate_name(name: &str) -> Result<(), RegistrationError> {
        let mut chars = name.chars();
        let ok = matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
            && chars.all(|c| c == '_' || c.is_ascii_alphanumeric());
        if ok && !name.is_empty() {
            Ok(())
        } else {
            Err(RegistrationError::InvalidName(name.to_string()))
        }
    }

    /// Registers (or replaces) a type node. Input-side name collisions with an
    /// existing output type of the same name are resolved by suffixing `Input`
    /// (spec.md §3.1 invariant 4).
    pub fn register_type(&self, node: TypeNode) -> Result<ArcStr, RegistrationError> {
        Self::validate_name(&node.name)?;
        let mut inner = self.inner.write().expect("type graph lock poisoned");

        let mut node = node;
        if node.is_input {
            if let Some(existing) = inner.types.get(&node.name) {
                if !existing.is_input {
                    node.name = ArcStr::from(format!("{}Input", node.name));
                }
            }
        } else if inner.types.contains_key(&node.name) {
            return Err(RegistrationError::DuplicateTypeName(node.name.to_string()));
        }

        let key = node.name.clone();
        inner.types.insert(key.clone(), node);
        drop(inner);
        self.recompute_interface_closure();
        self.detect_unions();
        crate::__dynagql_trace_debug!("registered type {}", key);
        Ok(key)
    }

    /// Forces inclusion of types not reachable from any registered callable
    /// (spec.md §4.A "RegisterTypes").
    pub fn register_types(&self, nodes: impl IntoIterator<Item = TypeNode>) -> Result<(), RegistrationError> {
        for n in nodes {
            self.register_type(n)?;
        }
        Ok(())
    }

    /// Registers a custom scalar.
    pub fn register_scalar(&self, scalar: ScalarDef) -> Result<(), RegistrationError> {
        Self::validate_name(&scalar.name)?;
        let mut inner = self.inner.write().expect("type graph lock poisoned");
        if inner.types.contains_key(&scalar.name) {
            return Err(RegistrationError::DuplicateTypeName(scalar.name.to_string()));
        }
        let mut node = TypeNode::new(scalar.name.clone(), TypeKind::Scalar);
        node.fundamental = true;
        node.description = scalar.description.clone();
        node.scalar = Some(Arc::new(scalar));
        let name = node.name.clone();
        inner.types.insert(name, node);
        Ok(())
    }

    fn insert_function(&self, table: impl FnOnce(&mut Inner) -> &mut IndexMap<ArcStr, Arc<GraphFunction>>, f: GraphFunction) {
        let mut inner = self.inner.write().expect("type graph lock poisoned");
        let name = f.name.clone();
        table(&mut inner).insert(name.clone(), Arc::new(f));
        crate::__dynagql_trace_debug!("registered root function {}", name);
    }

    /// Registers a root query field.
    pub fn register_query(&self, f: GraphFunction) {
        self.insert_function(|i| &mut i.queries, f);
    }

    /// Registers a root mutation field.
    pub fn register_mutation(&self, f: GraphFunction) {
        self.insert_function(|i| &mut i.mutations, f);
    }

    /// Registers a root subscription field.
    pub fn register_subscription(&self, f: GraphFunction) {
        self.insert_function(|i| &mut i.subscriptions, f);
    }

    /// Registers a callable by its declared [`FunctionMode`] (spec.md §4.A
    /// "the generic RegisterFunction").
    pub fn register_function(&self, f: GraphFunction) {
        match f.mode {
            FunctionMode::Query => self.register_query(f),
            FunctionMode::Mutation => self.register_mutation(f),
            FunctionMode::Subscription => self.register_subscription(f),
            FunctionMode::Field => {
                // Field-mode functions are attached to a type's fields directly via
                // `FieldKind::Resolver`, not stored at the root; registering one here
                // would have no root selection to serve.
            }
        }
    }

    /// Enables the hidden `__schema`/`__type` introspection root fields
    /// (spec.md §4.A, §6).
    pub fn enable_introspection(&self) {
        self.inner.write().expect("type graph lock poisoned").introspection_enabled = true;
    }

    /// `true` if introspection has been enabled.
    pub fn introspection_enabled(&self) -> bool {
        self.inner.read().expect("type graph lock poisoned").introspection_enabled
    }

    /// Looks up a root query/mutation/subscription callable by name,
    /// case-sensitive then case-insensitive (spec.md §4.C "Resolution rules").
    pub fn root_function(&self, mode: FunctionMode, name: &str) -> Option<Arc<GraphFunction>> {
        let inner = self.inner.read().expect("type graph lock poisoned");
        let table = match mode {
            FunctionMode::Query => &inner.queries,
            FunctionMode::Mutation => &inner.mutations,
            FunctionMode::Subscription => &inner.subscriptions,
            FunctionMode::Field => return None,
        };
        if let Some(f) = table.get(name) {
            return Some(Arc::clone(f));
        }
        table
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, f)| Arc::clone(f))
    }

    /// Every registered root callable name for `mode`, for building
    /// `UnknownCommandError` messages and for schema emission.
    pub fn root_function_names(&self, mode: FunctionMode) -> Vec<ArcStr> {
        let inner = self.inner.read().expect("type graph lock poisoned");
        let table = match mode {
            FunctionMode::Query => &inner.queries,
            FunctionMode::Mutation => &inner.mutations,
            FunctionMode::Subscription => &inner.subscriptions,
            FunctionMode::Field => return Vec::new(),
        };
        table.keys().cloned().collect()
    }

    /// Runs `f` with read access to a type node, by canonical name.
    pub fn with_type<R>(&self, name: &str, f: impl FnOnce(&TypeNode) -> R) -> Option<R> {
        let inner = self.inner.read().expect("type graph lock poisoned");
        inner.types.get(name).map(f)
    }

    /// Tests whether `type_name` satisfies `iface_or_union`: the type itself,
    /// its `implements` set, or it's a member of `iface_or_union` when that name
    /// is a union (spec.md §4.C "ImplementsInterface" — "the type itself, its
    /// implements set, and unions"). An inline fragment or spread whose type
    /// condition names a union must match every concrete member value, not just
    /// object types that structurally embed it.
    pub fn implements_interface(&self, type_name: &str, iface_or_union: &str) -> bool {
        let inner = self.inner.read().expect("type graph lock poisoned");
        if let Some(node) = inner.types.get(type_name) {
            if node.implements_interface(iface_or_union) {
                return true;
            }
        }
        match inner.types.get(iface_or_union) {
            Some(union_node) if union_node.kind == TypeKind::Union => union_node.union_members.iter().any(|m| m.as_str() == type_name),
            _ => false,
        }
    }

    /// `true` if `name` is a registered type.
    pub fn has_type(&self, name: &str) -> bool {
        self.inner.read().expect("type graph lock poisoned").types.contains_key(name)
    }

    /// All registered type names, in registration order.
    pub fn type_names(&self) -> Vec<ArcStr> {
        self.inner.read().expect("type graph lock poisoned").types.keys().cloned().collect()
    }

    /// Recomputes `implemented_by` as the inverse of every node's `implements`
    /// set, so A ∈ implementedBy(B) ⇔ B ∈ implements(A) holds after every
    /// registration (spec.md §3.1 invariant 2).
    fn recompute_interface_closure(&self) {
        let mut inner = self.inner.write().expect("type graph lock poisoned");
        for node in inner.types.values_mut() {
            node.implemented_by.clear();
        }
        let edges: Vec<(ArcStr, ArcStr)> = inner
            .types
            .values()
            .flat_map(|n| n.implements.iter().map(move |i| (n.name.clone(), i.clone())))
            .collect();
        for (child, iface) in edges {
            if let Some(iface_node) = inner.types.get_mut(&iface) {
                iface_node.implemented_by.insert(child);
            }
        }
    }

    /// Detects implicit unions by naming convention: a record type named
    /// `*Union` whose fields are all optional references to distinct types
    /// (spec.md §4.A "Union types").
    fn detect_unions(&self) {
        let mut inner = self.inner.write().expect("type graph lock poisoned");
        let candidates: Vec<ArcStr> = inner
            .types
            .values()
            .filter(|n| n.kind == TypeKind::Object && n.name.ends_with("Union"))
            .map(|n| n.name.clone())
            .collect();

        for name in candidates {
            let members: Option<Vec<ArcStr>> = {
                let node = &inner.types[&name];
                let mut seen = BTreeSet::new();
                let mut members = Vec::new();
                let mut all_optional_distinct = true;
                for field in node.fields() {
                    if !field.result_type.is_pointer || field.result_type.is_slice {
                        all_optional_distinct = false;
                        break;
                    }
                    if !seen.insert(field.result_type.root.clone()) {
                        all_optional_distinct = false;
                        break;
                    }
                    members.push(field.result_type.root.clone());
                }
                if all_optional_distinct && !members.is_empty() {
                    Some(members)
                } else {
                    None
                }
            };
            if let Some(members) = members {
                if let Some(node) = inner.types.get_mut(&name) {
                    node.kind = TypeKind::Union;
                    node.union_members = members.into_iter().collect();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pet_dog_cat_graph() -> TypeGraph {
        let graph = TypeGraph::new();
        graph
            .register_type(TypeBuilder::object("Pet").interface_only().build())
            .expect("Pet registers cleanly");
        graph
            .register_type(TypeBuilder::object("Dog").implements("Pet").build())
            .expect("Dog registers cleanly");
        graph
            .register_type(TypeBuilder::object("Cat").build())
            .expect("Cat registers cleanly");
        graph
            .register_type(TypeBuilder::union("SearchResult", ["Dog", "Cat"]).build())
            .expect("SearchResult registers cleanly");
        graph
    }

    #[test]
    fn implements_interface_is_true_for_structural_embedding() {
        let graph = pet_dog_cat_graph();
        assert!(graph.implements_interface("Dog", "Pet"));
        assert!(graph.implements_interface("Dog", "Dog"));
    }

    #[test]
    fn implements_interface_is_true_for_union_membership() {
        let graph = pet_dog_cat_graph();
        assert!(graph.implements_interface("Dog", "SearchResult"));
        assert!(graph.implements_interface("Cat", "SearchResult"));
    }

    #[test]
    fn implements_interface_is_false_for_unrelated_type_condition() {
        let graph = pet_dog_cat_graph();
        assert!(!graph.implements_interface("Cat", "Pet"));
        assert!(!graph.implements_interface("Dog", "Nonexistent"));
    }

    #[test]
    fn type_node_implements_interface_does_not_see_unions() {
        // Direct node-level check can't resolve union membership in isolation;
        // only the graph-level method does (see doc comment above).
        let node = TypeNode::new(ArcStr::from("Dog"), TypeKind::Object);
        assert!(!node.implements_interface("SearchResult"));
    }

    #[test]
    fn recompute_interface_closure_is_bidirectional() {
        let graph = pet_dog_cat_graph();
        let saw_dog = graph.with_type("Pet", |n| n.implemented_by.contains("Dog")).unwrap_or(false);
        assert!(saw_dog);
    }
}
