//! Bridge between a generic [`Context`] and the framework's native request.
//!
//! Code below the HTTP layer (outbound clients, gRPC stubs, domain services)
//! takes a `&Context`, not a [`Request`]. [`wrap`] puts the request's
//! [`RequestHead`] into the context under a private key; [`unwrap`] gets it
//! back. A context that never passed through [`wrap`] is normal: callers
//! treat every failure as "no inbound request" and skip whatever needed it.

use std::sync::Arc;

use crate::context::{Context, ContextKey};
use crate::correlation::{CORRELATION_ID_HEADER, CorrelationId};
use crate::error::ContextError;
use crate::request::{Request, RequestHead};

pub(crate) const REQUEST_KEY: ContextKey = ContextKey::new("tether.bridge.request");

/// Shared handle to the inbound request, as stored in a context.
pub type RequestHandle = Arc<RequestHead>;

/// Layers the request's head on top of the request's current context.
pub fn wrap(req: &Request) -> Context {
    req.context().with_value(REQUEST_KEY, Arc::clone(req.head()))
}

/// Reads back the handle stored by [`wrap`].
pub fn unwrap(ctx: &Context) -> Result<RequestHandle, ContextError> {
    ctx.get::<RequestHandle>(REQUEST_KEY).cloned()
}

pub fn lookup(ctx: &Context) -> Option<RequestHandle> {
    unwrap(ctx).ok()
}

/// The inbound request's correlation id, if a request is bound and carries
/// a non-blank one.
pub fn correlation_id(ctx: &Context) -> Option<CorrelationId> {
    match unwrap(ctx) {
        Ok(head) => head.header(CORRELATION_ID_HEADER).and_then(CorrelationId::parse),
        Err(e) => {
            tracing::debug!(error = %e, "no inbound request bound to context");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    fn request(correlation_id: &str) -> Request {
        Request::builder()
            .method(Method::POST)
            .uri("/fake-uri")
            .header(CORRELATION_ID_HEADER, correlation_id)
            .build()
    }

    #[test]
    fn wrap_then_unwrap_returns_the_request() {
        let ctx = wrap(&request("random-uuid"));
        let head = unwrap(&ctx).unwrap();
        assert_eq!(head.path(), "/fake-uri");
        assert_eq!(head.header(CORRELATION_ID_HEADER), Some("random-uuid"));
        assert_eq!(correlation_id(&ctx).unwrap().as_str(), "random-uuid");
    }

    #[test]
    fn wrap_keeps_existing_values() {
        const TENANT: ContextKey = ContextKey::new("test.tenant");
        let mut req = request("random-uuid");
        req.set_context(Context::background().with_value(TENANT, "acme"));
        let ctx = wrap(&req);
        assert_eq!(*ctx.get::<&str>(TENANT).unwrap(), "acme");
        assert!(lookup(&ctx).is_some());
    }

    #[test]
    fn unbound_context_is_not_found() {
        let ctx = request("random-uuid").context().clone();
        assert_eq!(unwrap(&ctx).unwrap_err(), ContextError::NotFound { key: REQUEST_KEY });
        assert!(correlation_id(&ctx).is_none());
    }

    #[test]
    fn foreign_value_is_wrong_type() {
        let ctx = Context::background().with_value(REQUEST_KEY, 1234_u32);
        assert!(matches!(unwrap(&ctx), Err(ContextError::WrongType { .. })));
        assert!(lookup(&ctx).is_none());
        assert!(correlation_id(&ctx).is_none());
    }

    #[test]
    fn blank_header_is_no_id() {
        let ctx = wrap(&request("   "));
        assert!(lookup(&ctx).is_some());
        assert!(correlation_id(&ctx).is_none());
    }
}
