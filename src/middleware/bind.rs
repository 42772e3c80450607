//! Binding the inbound request into its context.

use super::{Middleware, Next};
use crate::bridge;
use crate::handler::BoxFuture;
use crate::request::Request;

/// Binds the request into its own [`Context`](crate::Context) so handlers can
/// pass `req.context()` to code that only understands contexts.
///
/// Captures the head as it is when this layer runs; register it after any
/// layer that rewrites headers (such as
/// [`CorrelationPolicy`](super::CorrelationPolicy)).
#[derive(Clone, Copy, Debug, Default)]
pub struct BindContext;

impl Middleware for BindContext {
    fn handle(&self, mut req: Request, next: Next) -> BoxFuture {
        let ctx = bridge::wrap(&req);
        req.set_context(ctx);
        next.run(req)
    }
}
