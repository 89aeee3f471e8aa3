//! Transport-agnostic request/response envelopes (spec.md §6 "Request API").
//!
//! Grounded on the teacher's `http/mod.rs` (`GraphQLRequest`/`GraphQLResponse`),
//! adapted from the teacher's compile-time `RootNode` execution to this crate's
//! parse/compile/execute pipeline and its own [`Value`]/[`GraphError`] shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::cancel::CancellationToken;
use crate::config::ServerConfig;
use crate::error::{CompileError, GraphError};
use crate::executor::{self, ExecutionOutcome};
use crate::registry::TypeGraph;
use crate::stub::{self, RequestStub};
use crate::value::{Object, Value};

/// The decoded shape of an incoming GraphQL-over-HTTP request (spec.md §6).
///
/// Hosts deserialize the POST body (or reconstruct this from GET query
/// parameters) directly into this struct.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GraphQLRequest {
    /// The raw document source text.
    pub query: String,
    /// Which operation to run, if the document defines more than one.
    #[serde(rename = "operationName", skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    /// Variable bindings, as a JSON object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Json>,
}

impl GraphQLRequest {
    /// Builds a request from parts.
    pub fn new(query: String, operation_name: Option<String>, variables: Option<Json>) -> Self {
        GraphQLRequest { query, operation_name, variables }
    }

    fn variables_json(&self) -> String {
        match &self.variables {
            Some(v) => v.to_string(),
            None => String::new(),
        }
    }
}

/// The response envelope actually sent back over the wire (spec.md §6, §7
/// "the JSON envelope is always well-formed").
///
/// Serializes as `{"data": ..., "errors": [...]}`, omitting `errors` when empty,
/// exactly matching the three shapes spec.md §6 distinguishes: pure success
/// (`data` only), partial failure (`data` and `errors` both present), and
/// compile failure (`data` is `{}`, `errors` only is populated).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GraphQLResponse {
    /// The response tree. Always present, even if empty, so the envelope shape
    /// never needs a client-side `data.is_some()` check.
    pub data: Value,
    /// Accumulated errors, in the order they were produced.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphError>,
}

impl GraphQLResponse {
    fn from_outcome(outcome: ExecutionOutcome) -> Self {
        GraphQLResponse { data: outcome.data, errors: outcome.errors }
    }

    fn compile_failure(error: &CompileError) -> Self {
        GraphQLResponse {
            data: Value::Object(Object::new()),
            errors: vec![error.to_graph_error()],
        }
    }

    /// `true` when this response carries no `errors`, the signal hosts typically
    /// use to pick a 200 vs. an alternate status code (GraphQL itself has no
    /// opinion on HTTP status; spec.md only defines the JSON envelope).
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parses, compiles (without caching), and executes `request` against `graph`
/// in one call (spec.md §4.F "Unseen → Parsed → Compiled").
///
/// Hosts that want to reuse compiled stubs across requests with the same
/// document text should call [`parse_and_compile`] once, cache the resulting
/// [`RequestStub`] themselves per spec.md §6's consumed cache interface, and
/// call [`executor::execute`] directly on cache hits.
pub async fn process_request(graph: &TypeGraph, config: &ServerConfig, request: &GraphQLRequest) -> GraphQLResponse {
    process_request_with_cancellation(graph, config, request, CancellationToken::none()).await
}

/// Like [`process_request`], but propagates `cancellation` into the executor
/// (spec.md §5 "a caller-supplied cancellation signal is propagated into every
/// resolver call").
pub async fn process_request_with_cancellation(
    graph: &TypeGraph,
    config: &ServerConfig,
    request: &GraphQLRequest,
    cancellation: CancellationToken,
) -> GraphQLResponse {
    let stub = match parse_and_compile(graph, config, request) {
        Ok(stub) => stub,
        Err(e) => return GraphQLResponse::compile_failure(&e),
    };
    let outcome = executor::execute_with_cancellation(graph, &stub, &request.variables_json(), config, cancellation).await;
    GraphQLResponse::from_outcome(outcome)
}

/// Parses and compiles `request.query` against `graph`, applying the
/// [`ServerConfig`]'s memory limits to the raw document text before handing it
/// to the parser (spec.md §5 "no allocation should exceed a configurable
/// maxRequestBodySize").
pub fn parse_and_compile(graph: &TypeGraph, config: &ServerConfig, request: &GraphQLRequest) -> Result<RequestStub, CompileError> {
    let limits = &config.memory_limits;
    if limits.max_request_body_size != 0 && request.query.len() > limits.max_request_body_size {
        return Err(CompileError::Validation {
            message: "request body exceeds the configured size limit".to_string(),
            span: crate::ast::Span::new(0, 0),
            path: Vec::new(),
        });
    }
    if let Some(vars) = &request.variables {
        let size = vars.to_string().len();
        if limits.max_variable_size != 0 && size > limits.max_variable_size {
            return Err(CompileError::Validation {
                message: "variables document exceeds the configured size limit".to_string(),
                span: crate::ast::Span::new(0, 0),
                path: Vec::new(),
            });
        }
    }

    let document = crate::parser::parse_document(&request.query)?;
    stub::compile(graph, &document, request.operation_name.as_deref(), &config.query_limits)
}

/// A pluggable request-stub cache, consumed by hosts that want to skip
/// re-compiling a document they've already seen (spec.md §6 "Cache interface
/// (consumed)"). Implementations may return stale hits or race on concurrent
/// misses; the core treats both as acceptable per spec.md §5.
pub trait RequestStubCache: Send + Sync {
    /// Looks up a previously compiled stub (or compile failure) for `document`.
    ///
    /// Returns `None` on a cache miss; `Some(Ok(stub))`/`Some(Err(e))` on a hit,
    /// mirroring spec.md's `GetRequestStub(ctx, docString) → (stub, err, found)`.
    fn get(&self, document: &str) -> Option<Result<std::sync::Arc<RequestStub>, CompileError>>;

    /// Stores a freshly compiled stub (or compile failure) for `document`.
    fn set(&self, document: &str, result: &Result<std::sync::Arc<RequestStub>, CompileError>);
}

/// Like [`process_request`], but consults `cache` before compiling, and
/// populates it on a miss (spec.md §6 "Cache interface (consumed)").
pub async fn process_request_cached(
    graph: &TypeGraph,
    config: &ServerConfig,
    request: &GraphQLRequest,
    cache: &dyn RequestStubCache,
) -> GraphQLResponse {
    process_request_cached_with_cancellation(graph, config, request, cache, CancellationToken::none()).await
}

/// Like [`process_request_cached`], but propagates `cancellation` into the
/// executor (spec.md §5 "Cancellation & timeouts").
pub async fn process_request_cached_with_cancellation(
    graph: &TypeGraph,
    config: &ServerConfig,
    request: &GraphQLRequest,
    cache: &dyn RequestStubCache,
    cancellation: CancellationToken,
) -> GraphQLResponse {
    let stub = match cache.get(&request.query) {
        Some(hit) => {
            crate::__dynagql_trace_debug!("request stub cache hit");
            hit
        }
        None => {
            crate::__dynagql_trace_debug!("request stub cache miss");
            let compiled = parse_and_compile(graph, config, request).map(std::sync::Arc::new);
            cache.set(&request.query, &compiled);
            compiled
        }
    };
    let stub = match stub {
        Ok(stub) => stub,
        Err(e) => return GraphQLResponse::compile_failure(&e),
    };
    let outcome = executor::execute_with_cancellation(graph, &stub, &request.variables_json(), config, cancellation).await;
    GraphQLResponse::from_outcome(outcome)
}
