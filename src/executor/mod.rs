//! Component D: the Executor (spec.md §3.3, §4.D).
//!
//! Takes a compiled [`RequestStub`] plus a JSON variables document and drives it
//! to a [`Value`]/`errors` pair: binds variables, invokes root callables bounded
//! by a concurrency semaphore, walks resolver output against the declared
//! selection set (dispatching union/interface fields via
//! [`TypeGraph::concrete_type_name`]), and applies null propagation the way the
//! GraphQL spec requires.
//!
//! Grounded on the teacher's `executor/mod.rs` (`Executor::resolve_into_value`'s
//! phase structure) generalized from compile-time trait dispatch to the runtime
//! [`crate::registry::GraphFunction`]/[`crate::stub::BoundField`] shapes.

mod semaphore;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use arcstr::ArcStr;
use futures::future::{join_all, Either};
use futures::stream::{BoxStream, StreamExt};
use futures::FutureExt;
use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::ast::Span;
use crate::cancel::CancellationToken;
use crate::config::ServerConfig;
use crate::error::{GraphError, PathSegment, VariableError};
use crate::registry::{AnyValue, Invocation, InvokeArgs, Resolved, TypeGraph, TypeKind, TypeLookup};
use crate::stub::{BoundField, BoundFieldKind, RequestStub};
use crate::value::{Object, Value};

use self::semaphore::Semaphore;

/// The result of running a [`RequestStub`] to completion (spec.md §6 "Request
/// API").
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionOutcome {
    /// The response's `data` field.
    pub data: Value,
    /// The response's `errors` field, in the order they were encountered.
    pub errors: Vec<GraphError>,
}

struct ExecCtx<'a> {
    graph: &'a TypeGraph,
    variables: IndexMap<String, Json>,
    semaphore: Arc<Semaphore>,
    max_array_size: usize,
    dev_mode: bool,
    cancellation: CancellationToken,
}

/// Runs `stub` against `graph`, parsing `variables_json` (an empty string is
/// treated as `{}`) according to the stub's declared variable types
/// (spec.md §4.D phase 1). Never cancellable; see
/// [`execute_with_cancellation`] for callers that need spec.md §5's
/// cancellation contract.
pub async fn execute(graph: &TypeGraph, stub: &RequestStub, variables_json: &str, config: &ServerConfig) -> ExecutionOutcome {
    execute_with_cancellation(graph, stub, variables_json, config, CancellationToken::none()).await
}

/// Like [`execute`], but propagates `cancellation` into every resolver
/// invocation (spec.md §5 "Cancellation & timeouts"). On cancellation,
/// in-flight resolver results are abandoned and the outcome carries whatever
/// fields had already completed plus a top-level error.
pub async fn execute_with_cancellation(
    graph: &TypeGraph,
    stub: &RequestStub,
    variables_json: &str,
    config: &ServerConfig,
    cancellation: CancellationToken,
) -> ExecutionOutcome {
    let variables = match bind_variables(graph, stub, variables_json) {
        Ok(v) => v,
        Err(e) => {
            return ExecutionOutcome {
                data: Value::Object(Object::new()),
                errors: vec![GraphError::new(e.message).at(e.span)],
            }
        }
    };

    let permits = config.query_limits.max_concurrent_resolvers;
    let ctx = ExecCtx {
        graph,
        variables,
        semaphore: Arc::new(Semaphore::new(if permits == 0 { usize::MAX / 2 } else { permits })),
        max_array_size: config.query_limits.max_array_size,
        dev_mode: !config.production_mode,
        cancellation,
    };

    let active: Vec<&BoundField> = stub.root_selections.iter().filter(|f| f.is_active(&ctx.variables)).collect();
    let results = resolve_many(&ctx, &active, None, &[]).await;

    let mut data = Object::with_capacity(results.len());
    let mut errors = Vec::new();
    let mut root_failed = false;
    for (key, value, propagate, mut errs) in results {
        errors.append(&mut errs);
        if propagate {
            root_failed = true;
            continue;
        }
        data.insert(key.to_string(), value);
    }

    if ctx.cancellation.is_cancelled() {
        errors.push(GraphError::new("execution cancelled"));
    }

    ExecutionOutcome {
        data: if root_failed { Value::Object(Object::new()) } else { Value::Object(data) },
        errors,
    }
}

/// Runs a subscription's root field, returning a stream of [`ExecutionOutcome`]s,
/// one per event the underlying stream produces (spec.md §4.D item 2, §5
/// "Subscriptions"). `stub.operation_kind` must be `Subscription` with exactly
/// one active root selection, per the GraphQL single-root-field rule.
pub async fn execute_subscription(
    graph: Arc<TypeGraph>,
    stub: Arc<RequestStub>,
    variables_json: &str,
    config: &ServerConfig,
) -> Result<BoxStream<'static, ExecutionOutcome>, GraphError> {
    execute_subscription_with_cancellation(graph, stub, variables_json, config, CancellationToken::none()).await
}

/// Like [`execute_subscription`], but terminates the returned stream as soon as
/// `cancellation` fires and releases the producer (spec.md §5 "Subscriptions
/// terminate their lazy sequence on cancellation and release producer
/// resources").
pub async fn execute_subscription_with_cancellation(
    graph: Arc<TypeGraph>,
    stub: Arc<RequestStub>,
    variables_json: &str,
    config: &ServerConfig,
    cancellation: CancellationToken,
) -> Result<BoxStream<'static, ExecutionOutcome>, GraphError> {
    let variables = bind_variables(&graph, &stub, variables_json).map_err(|e| GraphError::new(e.message).at(e.span))?;

    let field_index = stub
        .root_selections
        .iter()
        .position(|f| f.is_active(&variables))
        .ok_or_else(|| GraphError::new("subscription has no active root field"))?;
    if stub.root_selections.iter().skip(field_index + 1).any(|f| f.is_active(&variables)) {
        return Err(GraphError::new("a subscription operation must select exactly one root field"));
    }
    let field = &stub.root_selections[field_index];

    let (function, args) = match &field.kind {
        BoundFieldKind::Resolver { function, args, .. } => (Arc::clone(function), args),
        _ => return Err(GraphError::new("subscription root field must be a resolver")),
    };
    let Invocation::Stream(make_stream) = &function.invoke else {
        return Err(GraphError::new(format!("{:?} is not a subscription field", function.name)));
    };

    let json_args: IndexMap<ArcStr, Json> = args.iter().map(|(k, v)| (k.clone(), v.resolve(&variables))).collect();
    let source = (make_stream)(InvokeArgs {
        receiver: None,
        args: json_args,
        cancellation: cancellation.clone(),
    })
    .await
    .map_err(|e| GraphError::new(e.message).with_path(vec![PathSegment::Field(field.response_key.to_string())]))?;

    let result_type = function.base_return_type.clone();
    let response_key = field.response_key.clone();
    let permits = config.query_limits.max_concurrent_resolvers;
    let semaphore = Arc::new(Semaphore::new(if permits == 0 { usize::MAX / 2 } else { permits }));
    let max_array_size = config.query_limits.max_array_size;
    let dev_mode = !config.production_mode;

    // `stub`/`graph` are kept alive for the stream's whole lifetime so each item
    // can re-borrow `children` from the same root selection without copying it.
    let stub_keepalive = Arc::clone(&stub);
    let graph_keepalive = Arc::clone(&graph);
    let cancellation_for_items = cancellation.clone();

    let out = source.then(move |item| {
        // Each call clones its own owned handles so the returned future is fully
        // self-contained (it cannot borrow from this closure invocation's frame).
        let graph_owned = Arc::clone(&graph_keepalive);
        let variables = variables.clone();
        let semaphore = Arc::clone(&semaphore);
        let response_key = response_key.clone();
        let result_type = result_type.clone();
        let cancellation = cancellation_for_items.clone();
        let children = match &stub_keepalive.root_selections[field_index].kind {
            BoundFieldKind::Resolver { children, .. } => children.clone(),
            _ => unreachable!("subscription root field kind is fixed at compile time"),
        };

        async move {
            let ctx = ExecCtx {
                graph: &graph_owned,
                variables,
                semaphore,
                max_array_size,
                dev_mode,
                cancellation,
            };
            let (value, errs) = match item {
                Ok(resolved) => {
                    let (v, _propagate, errs) =
                        render_resolved(&ctx, resolved, &result_type, &children, &[PathSegment::Field(response_key.to_string())]).await;
                    (v, errs)
                }
                Err(e) => (Value::Null, vec![GraphError::new(e.message).with_path(vec![PathSegment::Field(response_key.to_string())])]),
            };
            let mut data = Object::with_capacity(1);
            data.insert(response_key.to_string(), value);
            ExecutionOutcome { data: Value::Object(data), errors: errs }
        }
    });

    Ok(Box::pin(out.take_until(cancellation.cancelled())))
}

/// Converts a caught resolver panic into a [`crate::error::FieldError`]
/// (spec.md §4.D phase 2, §8 "it never returns a partially written stream or
/// panics"). The panic message is only attached as an extension in dev mode,
/// matching how other resolver-produced extensions are gated.
fn panic_field_error(function_name: &str, payload: Box<dyn std::any::Any + Send>, dev_mode: bool) -> crate::error::FieldError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "resolver panicked".to_string());

    let mut err = crate::error::FieldError::new(format!("{function_name:?} panicked: {message}"));
    if dev_mode {
        err = err.with_extensions(serde_json::json!({ "panic": message }));
    }
    err
}

fn bind_variables(graph: &TypeGraph, stub: &RequestStub, variables_json: &str) -> Result<IndexMap<String, Json>, VariableError> {
    let raw: Json = if variables_json.trim().is_empty() {
        Json::Object(serde_json::Map::new())
    } else {
        serde_json::from_str(variables_json).map_err(|e| VariableError {
            message: format!("invalid variables JSON: {e}"),
            span: Span::new(e.line().saturating_sub(1), e.column().saturating_sub(1)),
        })?
    };
    let raw_obj = raw.as_object().cloned().unwrap_or_default();

    let mut out = IndexMap::with_capacity(stub.variable_types.len());
    for (name, decl) in &stub.variable_types {
        match raw_obj.get(name) {
            None => {
                if let Some(default) = &decl.default_value {
                    out.insert(name.clone(), default.clone());
                } else if decl.required {
                    return Err(VariableError {
                        message: format!("missing required variable ${name}"),
                        span: Span::new(0, 0),
                    });
                } else {
                    out.insert(name.clone(), Json::Null);
                }
            }
            Some(value) => {
                let parsed = parse_variable_value(graph, &decl.type_lookup, value)
                    .map_err(|msg| VariableError { message: format!("variable ${name}: {msg}"), span: Span::new(0, 0) })?;
                out.insert(name.clone(), parsed);
            }
        }
    }
    Ok(out)
}

/// Parses one JSON variable value against its declared [`TypeLookup`], applying
/// the same scalar/enum/input-object rules as the stub compiler's literal
/// binder, but over JSON rather than document AST (spec.md §4.D phase 1).
fn parse_variable_value(graph: &TypeGraph, expected: &TypeLookup, value: &Json) -> Result<Json, String> {
    if value.is_null() {
        return if expected.is_pointer {
            Ok(Json::Null)
        } else {
            Err(format!("null is not permitted for non-null type {}", expected.root))
        };
    }

    if expected.is_slice {
        let arr = value.as_array().ok_or_else(|| format!("expected a list for type {}", expected.root))?;
        let item_expected = TypeLookup {
            root: expected.root.clone(),
            is_pointer: expected.inner_is_pointer,
            is_slice: false,
            inner_is_pointer: false,
        };
        let mut out = Vec::with_capacity(arr.len());
        for item in arr {
            out.push(parse_variable_value(graph, &item_expected, item)?);
        }
        return Ok(Json::Array(out));
    }

    match graph.with_type(&expected.root, |n| n.kind) {
        Some(TypeKind::Enum) => {
            let s = value.as_str().ok_or_else(|| format!("expected an enum string for type {}", expected.root))?;
            let valid = graph
                .with_type(&expected.root, |n| n.enum_values.iter().any(|v| v.name.as_str() == s))
                .unwrap_or(false);
            if !valid {
                return Err(format!("invalid enum value {s:?} for type {}", expected.root));
            }
            Ok(Json::String(s.to_string()))
        }
        Some(TypeKind::InputObject) => {
            let obj = value.as_object().ok_or_else(|| format!("expected an object for type {}", expected.root))?;
            let fields: Vec<(ArcStr, TypeLookup)> = graph
                .with_type(&expected.root, |n| n.fields().map(|f| (f.name.clone(), f.result_type.clone())).collect())
                .unwrap_or_default();
            let mut out = serde_json::Map::with_capacity(obj.len());
            for (fname, fty) in &fields {
                match obj.get(fname.as_str()) {
                    Some(v) => {
                        out.insert(fname.to_string(), parse_variable_value(graph, fty, v)?);
                    }
                    None if fty.is_pointer => {}
                    None => return Err(format!("missing required input field {fname:?}")),
                }
            }
            Ok(Json::Object(out))
        }
        Some(TypeKind::Scalar) => match graph.with_type(&expected.root, |n| n.scalar.clone()).flatten() {
            Some(scalar) => (scalar.parse_value)(value),
            None => Ok(value.clone()),
        },
        _ => Ok(value.clone()),
    }
}

/// Runs `fields` concurrently against a shared `receiver`, in document order.
/// `join_all` preserves input order regardless of completion order, which is
/// exactly the ordering guarantee spec.md §5 requires ("emitted in document
/// order ... independent of resolver completion order").
async fn resolve_many<'a>(
    ctx: &'a ExecCtx<'a>,
    fields: &'a [&'a BoundField],
    receiver: Option<AnyValue>,
    parent_path: &'a [PathSegment],
) -> Vec<(ArcStr, Value, bool, Vec<GraphError>)> {
    let futures_vec = fields.iter().copied().map(|f| {
        let mut path = parent_path.to_vec();
        path.push(PathSegment::Field(f.response_key.to_string()));
        resolve_field(ctx, f, receiver.clone(), path)
    });
    let results = join_all(futures_vec).await;
    fields.iter().zip(results).map(|(f, (v, p, e))| (f.response_key.clone(), v, p, e)).collect()
}

fn resolve_field<'a>(
    ctx: &'a ExecCtx<'a>,
    field: &'a BoundField,
    receiver: Option<AnyValue>,
    path: Vec<PathSegment>,
) -> futures::future::BoxFuture<'a, (Value, bool, Vec<GraphError>)> {
    Box::pin(async move {
        match &field.kind {
            BoundFieldKind::TypeName => {
                let name = receiver
                    .as_ref()
                    .and_then(|r| ctx.graph.concrete_type_name(r))
                    .map(|n| n.to_string())
                    .unwrap_or_default();
                (Value::scalar(name), false, Vec::new())
            }
            BoundFieldKind::Plain { accessor, result_type, children } => {
                let resolved = (accessor)(receiver.as_ref().expect("plain field requires a receiver"));
                render_resolved(ctx, resolved, result_type, children, &path).await
            }
            BoundFieldKind::Resolver { function, args, children } => {
                let json_args: IndexMap<ArcStr, Json> = args.iter().map(|(k, v)| (k.clone(), v.resolve(&ctx.variables))).collect();
                let invoke_args = InvokeArgs {
                    receiver: receiver.clone(),
                    args: json_args,
                    cancellation: ctx.cancellation.clone(),
                };

                let permit = ctx.semaphore.acquire().await;
                #[cfg(feature = "tracing")]
                let started = std::time::Instant::now();
                let outcome = match &function.invoke {
                    Invocation::Unary(f) => {
                        let invocation = AssertUnwindSafe((f)(invoke_args)).catch_unwind();
                        match futures::future::select(invocation, ctx.cancellation.cancelled()).await {
                            Either::Left((Ok(result), _)) => result,
                            Either::Left((Err(payload), _)) => Err(panic_field_error(&function.name, payload, ctx.dev_mode)),
                            Either::Right(((), _)) => Err(crate::error::FieldError::new(format!(
                                "{:?} abandoned: execution cancelled",
                                function.name
                            ))),
                        }
                    }
                    Invocation::Stream(_) => Err(crate::error::FieldError::new(format!(
                        "{:?} is a subscription field; use execute_subscription",
                        function.name
                    ))),
                };
                drop(permit);
                #[cfg(feature = "tracing")]
                crate::__dynagql_trace_debug!(
                    "resolved {} in {:?}: {}",
                    function.name,
                    started.elapsed(),
                    if outcome.is_ok() { "ok" } else { "error" }
                );

                match outcome {
                    Err(e) => {
                        let mut err = GraphError::new(e.message.clone()).with_path(path.clone());
                        if ctx.dev_mode {
                            if let Some(ext) = e.extensions.clone() {
                                err = err.with_extensions(ext);
                            }
                        }
                        let propagate = !function.base_return_type.is_pointer;
                        (Value::Null, propagate, vec![err])
                    }
                    Ok(resolved) => render_resolved(ctx, resolved, &function.base_return_type, children, &path).await,
                }
            }
        }
    })
}

/// Renders one [`Resolved`] value against its declared type and children,
/// returning `(value, propagate, errors)` where `propagate` is `true` iff this
/// position's `null` must keep bubbling to the nearest nullable ancestor
/// (spec.md §4.D phase 3, §7 item 7 "Null propagation").
fn render_resolved<'a>(
    ctx: &'a ExecCtx<'a>,
    resolved: Resolved,
    result_type: &'a TypeLookup,
    children: &'a crate::stub::SelectionPlan,
    path: &'a [PathSegment],
) -> futures::future::BoxFuture<'a, (Value, bool, Vec<GraphError>)> {
    Box::pin(async move {
        let (raw, mut errors) = match resolved {
            Resolved::Null => (Value::Null, Vec::new()),
            Resolved::Leaf(json) => (Value::from(serialize_scalar(ctx.graph, &result_type.root, &json)), Vec::new()),
            Resolved::Node(any) => {
                let concrete = ctx.graph.concrete_type_name(&any).unwrap_or_else(|| result_type.root.clone());
                build_object(ctx, &any, &concrete, children, path).await
            }
            Resolved::List(items) => {
                let items: &[Resolved] = if ctx.max_array_size != 0 && items.len() > ctx.max_array_size {
                    &items[..ctx.max_array_size]
                } else {
                    &items[..]
                };
                let item_type = TypeLookup {
                    root: result_type.root.clone(),
                    is_pointer: result_type.inner_is_pointer,
                    is_slice: false,
                    inner_is_pointer: false,
                };

                let mut values = Vec::with_capacity(items.len());
                let mut errs = Vec::new();
                let mut became_null = false;
                for (i, item) in items.iter().enumerate() {
                    let mut item_path = path.to_vec();
                    item_path.push(PathSegment::Index(i));
                    let (v, propagate, mut e) = render_resolved(ctx, item.clone(), &item_type, children, &item_path).await;
                    errs.append(&mut e);
                    if propagate {
                        became_null = true;
                        break;
                    }
                    values.push(v);
                }
                if became_null {
                    (Value::Null, errs)
                } else {
                    (Value::List(values), errs)
                }
            }
        };

        let propagate = raw.is_null() && !result_type.is_pointer;
        if propagate && errors.is_empty() {
            errors.push(GraphError::new("non-null field resolved to null").with_path(path.to_vec()));
        }
        (raw, propagate, errors)
    })
}

fn serialize_scalar(graph: &TypeGraph, root: &str, json: &Json) -> Json {
    match graph.with_type(root, |n| n.scalar.clone()).flatten() {
        Some(scalar) => (scalar.serialize)(json),
        None => json.clone(),
    }
}

/// Builds an object-typed value from `receiver`/`concrete_type`, resolving each
/// active field against `children` and absorbing a non-null child's propagated
/// null into "this whole object is null" (spec.md §7 item 7).
async fn build_object(
    ctx: &ExecCtx<'_>,
    receiver: &AnyValue,
    concrete_type: &str,
    children: &crate::stub::SelectionPlan,
    path: &[PathSegment],
) -> (Value, Vec<GraphError>) {
    let active: Vec<&BoundField> = children
        .fields
        .iter()
        .filter(|f| f.is_active(&ctx.variables))
        .filter(|f| match &f.type_condition {
            Some(tc) => ctx.graph.implements_interface(concrete_type, tc),
            None => true,
        })
        .collect();

    let results = resolve_many(ctx, &active, Some(Arc::clone(receiver)), path).await;

    let mut obj = Object::with_capacity(results.len());
    let mut errors = Vec::new();
    let mut became_null = false;
    for (key, value, propagate, mut errs) in results {
        errors.append(&mut errs);
        if propagate {
            became_null = true;
            continue;
        }
        obj.insert(key.to_string(), value);
    }

    if became_null {
        (Value::Null, errors)
    } else {
        (Value::Object(obj), errors)
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;
    use serde_json::json;

    use crate::registry::{FunctionBuilder, FunctionMode, InvokeArgs, Resolved, TypeGraph, TypeLookup};
    use crate::stub::{compile, RequestStub};
    use crate::validation::QueryLimits;

    use super::*;

    fn config() -> ServerConfig {
        ServerConfig::permissive()
    }

    fn compile_source(graph: &TypeGraph, source: &str) -> RequestStub {
        let document = crate::parser::parse_document(source).expect("source parses");
        compile(graph, &document, None, &QueryLimits::unlimited()).expect("document compiles")
    }

    fn register_leaf_query(graph: &TypeGraph, name: &str, optional: bool, f: impl Fn(InvokeArgs) -> futures::future::BoxFuture<'static, Result<Resolved, crate::error::FieldError>> + Send + Sync + 'static) {
        let mut return_type = TypeLookup::named("String");
        if optional {
            return_type = return_type.optional();
        }
        let func = FunctionBuilder::new(name, FunctionMode::Query)
            .returns(return_type)
            .build_unary(f)
            .expect("query has a return type set");
        graph.register_query(func);
    }

    #[tokio::test]
    async fn panicking_resolver_is_captured_as_a_field_error() {
        let graph = TypeGraph::new();
        register_leaf_query(&graph, "boom", false, |_args: InvokeArgs| async { panic!("kaboom") }.boxed());

        let stub = compile_source(&graph, "{ boom }");
        let outcome = execute(&graph, &stub, "", &config()).await;

        assert_eq!(outcome.data, Value::Object(Object::new()));
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].message.contains("panicked"), "message was {:?}", outcome.errors[0].message);
        assert!(outcome.errors[0].message.contains("kaboom"), "message was {:?}", outcome.errors[0].message);
    }

    #[tokio::test]
    async fn cancelled_token_abandons_in_flight_resolvers() {
        let graph = TypeGraph::new();
        register_leaf_query(&graph, "slow", false, |_args: InvokeArgs| futures::future::pending().boxed());

        let stub = compile_source(&graph, "{ slow }");
        let cancellation = CancellationToken::new();
        cancellation.cancel();

        let outcome = execute_with_cancellation(&graph, &stub, "", &config(), cancellation).await;

        assert_eq!(outcome.data, Value::Object(Object::new()));
        assert!(outcome.errors.iter().any(|e| e.message.contains("execution cancelled")), "errors were {:?}", outcome.errors);
    }

    #[tokio::test]
    async fn non_null_field_resolving_to_null_propagates_to_the_root() {
        let graph = TypeGraph::new();
        register_leaf_query(&graph, "required", false, |_args: InvokeArgs| async { Ok(Resolved::Null) }.boxed());

        let stub = compile_source(&graph, "{ required }");
        let outcome = execute(&graph, &stub, "", &config()).await;

        assert_eq!(outcome.data, Value::Object(Object::new()));
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].message.contains("non-null field resolved to null"));
    }

    #[tokio::test]
    async fn nullable_field_resolving_to_null_is_not_an_error() {
        let graph = TypeGraph::new();
        register_leaf_query(&graph, "optional", true, |_args: InvokeArgs| async { Ok(Resolved::Null) }.boxed());

        let stub = compile_source(&graph, "{ optional }");
        let outcome = execute(&graph, &stub, "", &config()).await;

        assert!(outcome.errors.is_empty());
        let Value::Object(data) = &outcome.data else { panic!("expected an object") };
        assert_eq!(data.get("optional"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn array_size_limit_truncates_list_results() {
        let graph = TypeGraph::new();
        let func = FunctionBuilder::new("numbers", FunctionMode::Query)
            .returns(TypeLookup::named("String").list(false))
            .build_unary(|_args: InvokeArgs| {
                async { Ok(Resolved::List(vec![Resolved::Leaf(json!("a")), Resolved::Leaf(json!("b")), Resolved::Leaf(json!("c"))])) }.boxed()
            })
            .expect("numbers has a return type set");
        graph.register_query(func);

        let stub = compile_source(&graph, "{ numbers }");
        let mut config = config();
        config.query_limits.max_array_size = 2;
        let outcome = execute(&graph, &stub, "", &config).await;

        assert!(outcome.errors.is_empty());
        let Value::Object(data) = &outcome.data else { panic!("expected an object") };
        let Some(Value::List(items)) = data.get("numbers") else { panic!("expected a list") };
        assert_eq!(items.len(), 2);
    }
}
