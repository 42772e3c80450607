//! Middleware layer.
//!
//! Middleware wraps every request on a [`Router`](crate::Router), matched or
//! not, and is where the cross-cutting work lives: correlation ids, context
//! binding, access logging.
//!
//! Layers run in registration order. The first [`Router::layer`] call is the
//! outermost: it sees the request first and the response last.
//!
//! ```rust,no_run
//! use tether::middleware::{AccessLog, BindContext, CorrelationPolicy};
//! use tether::{LogSink, Request, Response, Router};
//!
//! async fn hello(_req: Request) -> Response { Response::text("hi") }
//!
//! let app = Router::new()
//!     .layer(AccessLog::new(LogSink::stdout()))
//!     .layer(CorrelationPolicy::composite())
//!     .layer(BindContext)
//!     .get("/hello", hello);
//! ```
//!
//! [`Router::layer`]: crate::Router::layer

mod access_log;
mod bind;
mod correlation;

use std::future::Future;
use std::sync::Arc;

use crate::handler::{BoxFuture, BoxedHandler};
use crate::request::Request;
use crate::response::Response;

pub use access_log::AccessLog;
pub use bind::BindContext;
pub use correlation::CorrelationPolicy;

/// One layer of the request pipeline.
///
/// Call `next.run(req)` to continue; return without calling it to answer the
/// request yourself.
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: Request, next: Next) -> BoxFuture;
}

pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;

/// The rest of the pipeline after the current layer: remaining middleware,
/// then the route handler.
pub struct Next {
    stack: Arc<[BoxedMiddleware]>,
    index: usize,
    endpoint: BoxedHandler,
}

impl Next {
    pub(crate) fn new(stack: Arc<[BoxedMiddleware]>, endpoint: BoxedHandler) -> Self {
        Self { stack, index: 0, endpoint }
    }

    pub fn run(mut self, req: Request) -> BoxFuture {
        match self.stack.get(self.index).cloned() {
            Some(layer) => {
                self.index += 1;
                layer.handle(req, self)
            }
            None => self.endpoint.call(req),
        }
    }
}

/// Middleware from an async function or closure.
///
/// ```rust
/// use tether::middleware::{from_fn, Next};
/// use tether::{Request, Response};
///
/// let stamp = from_fn(|req: Request, next: Next| async move {
///     let mut res = next.run(req).await;
///     res.set_header("x-served-by", "tether");
///     res
/// });
/// ```
pub fn from_fn<F, Fut>(f: F) -> FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    FromFn(f)
}

/// See [`from_fn`].
pub struct FromFn<F>(F);

impl<F, Fut> Middleware for FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        Box::pin((self.0)(req, next))
    }
}
