//! Carrying the correlation id onto downstream calls.
//!
//! Every helper takes the [`Context`] the inbound request was bound to with
//! [`BindContext`](crate::middleware::BindContext). When the context has no
//! bound request, or the request has no usable id, the call goes out without
//! one; propagation never makes a call fail.

use http::Method;
use tonic::metadata::{MetadataMap, MetadataValue};

use crate::bridge;
use crate::context::Context;
use crate::correlation::{CONTENT_TYPE_HEADER, CORRELATION_ID_HEADER, CORRELATION_ID_METADATA_KEY};
use crate::error::Error;

/// HTTP client that forwards the inbound correlation id.
///
/// Timeouts and retries are whatever the wrapped [`reqwest::Client`] is
/// configured with; transport errors come back unchanged as
/// [`Error::Outbound`].
#[derive(Clone, Debug, Default)]
pub struct Client {
    http: reqwest::Client,
}

impl Client {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub async fn get(&self, ctx: &Context, url: &str) -> Result<reqwest::Response, Error> {
        self.send(ctx, Method::GET, url, None, None).await
    }

    pub async fn post(
        &self,
        ctx: &Context,
        url: &str,
        content_type: Option<&str>,
        body: impl Into<reqwest::Body>,
    ) -> Result<reqwest::Response, Error> {
        self.send(ctx, Method::POST, url, content_type, Some(body.into())).await
    }

    pub async fn put(
        &self,
        ctx: &Context,
        url: &str,
        content_type: Option<&str>,
        body: impl Into<reqwest::Body>,
    ) -> Result<reqwest::Response, Error> {
        self.send(ctx, Method::PUT, url, content_type, Some(body.into())).await
    }

    pub async fn delete(
        &self,
        ctx: &Context,
        url: &str,
        content_type: Option<&str>,
        body: impl Into<reqwest::Body>,
    ) -> Result<reqwest::Response, Error> {
        self.send(ctx, Method::DELETE, url, content_type, Some(body.into())).await
    }

    async fn send(
        &self,
        ctx: &Context,
        method: Method,
        url: &str,
        content_type: Option<&str>,
        body: Option<reqwest::Body>,
    ) -> Result<reqwest::Response, Error> {
        let mut req = self.http.request(method, url);
        if let Some(id) = bridge::correlation_id(ctx) {
            req = req.header(CORRELATION_ID_HEADER, id.as_str());
        }
        if let Some(content_type) = content_type {
            req = req.header(CONTENT_TYPE_HEADER, content_type);
        }
        if let Some(body) = body {
            req = req.body(body);
        }
        Ok(req.send().await?)
    }
}

/// Appends the bound request's correlation id to outgoing gRPC metadata.
///
/// Returns whether an id was added.
pub fn inject_metadata(ctx: &Context, metadata: &mut MetadataMap) -> bool {
    let Some(id) = bridge::correlation_id(ctx) else {
        return false;
    };
    match MetadataValue::try_from(id.as_str()) {
        Ok(value) => {
            metadata.append(CORRELATION_ID_METADATA_KEY, value);
            true
        }
        Err(e) => {
            tracing::debug!(error = %e, "correlation id is not valid metadata, not propagated");
            false
        }
    }
}

/// A tonic request for `message` carrying the bound correlation id.
pub fn grpc_request<T>(ctx: &Context, message: T) -> tonic::Request<T> {
    let mut req = tonic::Request::new(message);
    inject_metadata(ctx, req.metadata_mut());
    req
}
