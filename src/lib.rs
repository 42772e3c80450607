//! # tether
//!
//! Correlation ids and censored access logs for HTTP and gRPC services.
//!
//! ## The contract
//!
//! One id follows a request across every hop it makes:
//!
//! - **Inbound HTTP**: [`CorrelationPolicy`](middleware::CorrelationPolicy)
//!   reads `X-Correlation-ID`, generating one at the edge or rejecting the
//!   request between services.
//! - **Handler code**: [`BindContext`](middleware::BindContext) puts the
//!   request into a [`Context`]; code that only has the context gets it
//!   back with [`bridge::unwrap`].
//! - **Outbound**: [`outbound::Client`] and [`outbound::grpc_request`] copy
//!   the id onto downstream HTTP headers and gRPC metadata.
//! - **Inbound gRPC**: [`rpc::RequireMetadata`] and [`rpc::RpcAccessLog`].
//!
//! Each request or call leaves one line in the access log:
//!
//! ```text
//! [tether] 2024/05/01 - 10:00:00 | 7f1c... | 200 |      1.234ms |     203.0.113.9 | POST    /users | {"name":"ana","password":"[HIDDEN_FIELD]"}
//! ```
//!
//! Top-level JSON fields whose names contain a denylisted word are replaced
//! with `[HIDDEN_FIELD]`. Nested objects are not inspected.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use tether::middleware::{AccessLog, BindContext, CorrelationPolicy};
//! use tether::{LogSink, Request, Response, Router, Server, outbound};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .layer(AccessLog::new(LogSink::stdout()))
//!         .layer(CorrelationPolicy::composite())
//!         .layer(BindContext)
//!         .get("/users/{id}", get_user);
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn get_user(req: Request) -> Response {
//!     let client = outbound::Client::new();
//!     // The downstream call carries this request's X-Correlation-ID.
//!     match client.get(req.context(), "http://profiles/internal").await {
//!         Ok(res) => Response::text(res.text().await.unwrap_or_default()),
//!         Err(_) => Response::status(http::StatusCode::BAD_GATEWAY),
//!     }
//! }
//! ```

mod censor;
mod config;
mod context;
mod correlation;
mod error;
mod format;
mod handler;
mod ignore;
mod logger;
mod request;
mod response;
mod router;
mod server;
mod sink;

pub mod bridge;
pub mod health;
pub mod middleware;
pub mod outbound;
pub mod rpc;

pub use censor::{CENSORED_FIELD_TEXT, CensorPolicy, DEFAULT_CENSORED_FIELDS};
pub use config::{Config, DEFAULT_MAX_PENDING_LOGS, ENV_PREFIX};
pub use context::{Context, ContextKey};
pub use correlation::{CORRELATION_ID_HEADER, CORRELATION_ID_METADATA_KEY, CorrelationId};
pub use error::{ContextError, Error};
pub use format::{DEFAULT_TAG, LogFormat, LogRecord, format_latency, http_operation};
pub use handler::{BoxFuture, Handler};
pub use ignore::IgnoreSet;
pub use logger::AccessLogger;
pub use request::{Request, RequestBuilder, RequestHead};
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use sink::{ACCESS_TARGET, LogSink, MemoryBuffer};
