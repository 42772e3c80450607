//! Correlation-id policy for inbound HTTP requests.

use std::fmt;

use http::StatusCode;
use serde_json::json;

use super::{Middleware, Next};
use crate::correlation::{CORRELATION_ID_HEADER, CorrelationId, is_blank};
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;

/// What to do with a request whose `X-Correlation-ID` is missing or blank.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CorrelationPolicy {
    /// Generate a fresh id, put it on the request, and echo the request's id
    /// on the response. Never rejects.
    Composite,
    /// Answer `400 Bad Request` with
    /// `{"status":"fail","message":"X-Correlation-ID is missing"}` and do not
    /// run anything downstream.
    Strict,
}

impl CorrelationPolicy {
    /// For edges facing clients that cannot be expected to send an id.
    pub fn composite() -> Self {
        Self::Composite
    }

    /// For service-to-service edges where every caller must send one.
    pub fn strict() -> Self {
        Self::Strict
    }
}

impl Middleware for CorrelationPolicy {
    fn handle(&self, mut req: Request, next: Next) -> BoxFuture {
        let present = req.header(CORRELATION_ID_HEADER).and_then(CorrelationId::parse);

        match (self, present) {
            (Self::Strict, None) => {
                tracing::debug!(path = req.path(), "rejecting request without correlation id");
                Box::pin(async { missing_id_response() })
            }
            (Self::Strict, Some(_)) => next.run(req),
            (Self::Composite, present) => {
                let id = present.unwrap_or_else(|| {
                    let id = CorrelationId::generate();
                    req.set_header(CORRELATION_ID_HEADER, id.as_str());
                    id
                });
                Box::pin(async move {
                    let mut res = next.run(req).await;
                    let echoed = res.header(CORRELATION_ID_HEADER).is_some_and(|v| !is_blank(v));
                    if !echoed {
                        res.set_header(CORRELATION_ID_HEADER, id.into_string());
                    }
                    res
                })
            }
        }
    }
}

impl fmt::Display for CorrelationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Composite => f.write_str("composite"),
            Self::Strict => f.write_str("strict"),
        }
    }
}

fn missing_id_response() -> Response {
    let body = json!({
        "status": "fail",
        "message": format!("{CORRELATION_ID_HEADER} is missing"),
    });
    Response::builder()
        .status(StatusCode::BAD_REQUEST)
        .json(body.to_string().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Router;
    use serde_json::Value;

    /// Echoes the request's correlation header in the body.
    async fn echo(req: Request) -> String {
        req.header(CORRELATION_ID_HEADER).unwrap_or_default().to_owned()
    }

    fn app(policy: CorrelationPolicy) -> Router {
        Router::new().layer(policy).get("/random", echo)
    }

    fn get(id: Option<&str>) -> Request {
        let builder = Request::builder().uri("/random");
        match id {
            Some(id) => builder.header(CORRELATION_ID_HEADER, id).build(),
            None => builder.build(),
        }
    }

    #[tokio::test]
    async fn composite_keeps_supplied_id() {
        let res = app(CorrelationPolicy::composite()).handle(get(Some("random-uuid"))).await;
        assert_eq!(res.body(), b"random-uuid");
        assert_eq!(res.header(CORRELATION_ID_HEADER), Some("random-uuid"));
    }

    #[tokio::test]
    async fn composite_fills_missing_or_blank_id() {
        for id in [None, Some(""), Some("   ")] {
            let res = app(CorrelationPolicy::composite()).handle(get(id)).await;
            let seen = String::from_utf8(res.body().to_vec()).unwrap();
            assert!(uuid::Uuid::parse_str(&seen).is_ok(), "handler saw {seen:?}");
            assert_eq!(res.header(CORRELATION_ID_HEADER), Some(seen.as_str()));
        }
    }

    #[tokio::test]
    async fn composite_ids_differ_between_requests() {
        let app = app(CorrelationPolicy::composite());
        let a = app.handle(get(None)).await;
        let b = app.handle(get(None)).await;
        assert_ne!(a.header(CORRELATION_ID_HEADER), b.header(CORRELATION_ID_HEADER));
    }

    #[tokio::test]
    async fn strict_passes_supplied_id() {
        let res = app(CorrelationPolicy::strict()).handle(get(Some("random-uuid"))).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), b"random-uuid");
    }

    #[tokio::test]
    async fn strict_rejects_missing_or_blank_id() {
        for id in [None, Some(""), Some(" \t")] {
            let res = app(CorrelationPolicy::strict()).handle(get(id)).await;
            assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
            assert_eq!(res.header("content-type"), Some("application/json"));

            let body: Value = serde_json::from_slice(res.body()).unwrap();
            assert_eq!(body["status"], "fail");
            assert_eq!(body["message"], "X-Correlation-ID is missing");
        }
    }
}
