//! Code-first GraphQL runtime: build a query/mutation/subscription endpoint from
//! plain host functions and types, no schema file required.
//!
//! The crate is organized around the five components spec.md describes:
//!
//! - [`registry`] — the Type Graph/Registry (component A): [`registry::TypeGraph`]
//!   is where a host registers its types, scalars, and root callables.
//! - [`parser`] — the Document Parser (component B): turns raw GraphQL source
//!   text into an [`ast::Document`].
//! - [`stub`] — the Request Stub Compiler (component C): binds a parsed document
//!   against a [`registry::TypeGraph`] into a reusable [`stub::RequestStub`].
//! - [`executor`] — the Executor (component D): runs a [`stub::RequestStub`]
//!   against a variables document to produce a [`value::Value`]/error pair.
//! - [`schema`] — the Schema Emitter & Introspection (component E): SDL
//!   printing ([`schema::emit_sdl`]) and the `__schema`/`__type` introspection
//!   root fields ([`schema::install_introspection`]).
//!
//! [`http`] ties the pipeline together behind the request/response envelope a
//! host actually sends over the wire.

pub mod ast;
pub mod cancel;
pub mod config;
pub mod error;
pub mod executor;
pub mod http;
pub mod parser;
pub mod registry;
pub mod schema;
pub mod stub;
mod trace;
pub mod validation;
pub mod value;

pub use self::cancel::CancellationToken;
pub use self::config::{MemoryLimits, ServerConfig};
pub use self::error::GraphError;
pub use self::executor::ExecutionOutcome;
pub use self::http::{GraphQLRequest, GraphQLResponse, RequestStubCache};
pub use self::registry::TypeGraph;
pub use self::stub::RequestStub;
pub use self::value::Value;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::FutureExt;
    use serde_json::json;

    use crate::config::ServerConfig;
    use crate::http::{process_request, GraphQLRequest};
    use crate::registry::{boxed, field_fn, FieldKind, FieldLookup, FunctionBuilder, FunctionMode, InvokeArgs, Resolved, TypeBuilder, TypeGraph, TypeLookup};

    #[derive(Clone)]
    struct Character {
        name: &'static str,
    }

    fn seeded_graph() -> TypeGraph {
        let graph = TypeGraph::new();
        graph.bind_host_type::<Character>("Character");
        graph
            .register_type(
                TypeBuilder::object("Character")
                    .field(FieldLookup {
                        name: "name".into(),
                        result_type: TypeLookup::named("String"),
                        kind: FieldKind::Plain(field_fn::<Character, _>(|c| Resolved::Leaf(json!(c.name)))),
                        description: None,
                        is_deprecated: false,
                        deprecated_reason: None,
                    })
                    .build(),
            )
            .expect("Character registers cleanly");

        let hero = FunctionBuilder::new("hero", FunctionMode::Query)
            .returns(TypeLookup::named("Character"))
            .build_unary(|_args: InvokeArgs| {
                async { Ok(Resolved::Node(boxed(Character { name: "R2-D2" }))) }.boxed()
            })
            .expect("hero has a return type set");
        graph.register_query(hero);

        graph
    }

    #[tokio::test]
    async fn simple_field_end_to_end() {
        let graph = seeded_graph();
        let config = ServerConfig::permissive();
        let request = GraphQLRequest::new("{ hero { name } }".to_string(), None, None);

        let response = process_request(&graph, &config, &request).await;

        assert!(response.is_ok());
        let json = serde_json::to_value(&response).expect("response serializes");
        assert_eq!(json, json!({"data": {"hero": {"name": "R2-D2"}}}));
    }

    #[tokio::test]
    async fn unknown_command_is_reported() {
        let graph = seeded_graph();
        let config = ServerConfig::permissive();
        let request = GraphQLRequest::new("{ heroic { name } }".to_string(), None, None);

        let response = process_request(&graph, &config, &request).await;

        assert!(!response.is_ok());
        let commands = response.errors[0].message.clone();
        assert!(commands.contains("heroic"), "message was {commands:?}");
    }

    #[test]
    fn sdl_is_deterministic() {
        let graph = seeded_graph();
        let first = crate::schema::emit_sdl(&graph);
        let second = crate::schema::emit_sdl(&graph);
        assert_eq!(first, second);
        assert!(first.contains("type Character"));
    }

    #[test]
    fn introspection_can_be_installed() {
        let graph = Arc::new(seeded_graph());
        crate::schema::install_introspection(&graph);
        assert!(graph.introspection_enabled());
        assert!(graph.has_type("__Schema"));
    }
}
