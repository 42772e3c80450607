//! Incoming HTTP request type.
//!
//! A [`Request`] is split in two: the [`RequestHead`] (method, target, headers,
//! peer) lives behind an `Arc` so it can be shared as the request's native
//! handle, and the body is a buffered [`Bytes`] that any number of readers can
//! clone without consuming it.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::Method;

use crate::context::Context;

/// Everything about a request except its body.
#[derive(Clone, Debug)]
pub struct RequestHead {
    method: Method,
    path: String,
    query: Option<String>,
    headers: Vec<(String, String)>,
    remote_addr: Option<SocketAddr>,
}

impl RequestHead {
    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> Option<&str> { self.query.as_deref() }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn remote_addr(&self) -> Option<SocketAddr> { self.remote_addr }

    /// Case-insensitive header lookup. Returns the first match.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Path plus `?query` when the request carried one.
    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{q}", self.path),
            None => self.path.clone(),
        }
    }

    /// Best guess at the originating client.
    ///
    /// Behind a reverse proxy the socket peer is the proxy, so the first
    /// `X-Forwarded-For` hop wins, then `X-Real-IP`, then the peer address.
    pub fn client_ip(&self) -> Option<String> {
        let forwarded = self.header("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return Some(ip.to_owned());
        }

        let real = self.header("x-real-ip").map(str::trim).filter(|v| !v.is_empty());
        if let Some(ip) = real {
            return Some(ip.to_owned());
        }

        self.remote_addr.map(|addr| addr.ip().to_string())
    }

    fn set_header(&mut self, name: &str, value: String) {
        match self.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some((_, v)) => *v = value,
            None => self.headers.push((name.to_owned(), value)),
        }
    }
}

/// An incoming HTTP request.
pub struct Request {
    head: Arc<RequestHead>,
    body: Bytes,
    params: HashMap<String, String>,
    context: Context,
}

impl Request {
    /// Builder for requests that did not come off a socket: tests, or hosts
    /// that drive the [`Router`](crate::Router) from their own server.
    pub fn builder() -> RequestBuilder {
        RequestBuilder {
            head: RequestHead {
                method: Method::GET,
                path: "/".to_owned(),
                query: None,
                headers: Vec::new(),
                remote_addr: None,
            },
            body: Bytes::new(),
        }
    }

    pub fn method(&self) -> &Method { self.head.method() }
    pub fn path(&self) -> &str { self.head.path() }
    pub fn query(&self) -> Option<&str> { self.head.query() }
    pub fn headers(&self) -> &[(String, String)] { self.head.headers() }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn head(&self) -> &Arc<RequestHead> { &self.head }
    pub fn context(&self) -> &Context { &self.context }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.header(name)
    }

    /// Sets a header, replacing any existing value under the same name.
    ///
    /// Handles already taken with [`head`](Request::head) keep the headers
    /// they saw; the request gets its own copy on first write.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        Arc::make_mut(&mut self.head).set_header(name, value.into());
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The buffered body as a cheap, shareable handle.
    pub fn body_bytes(&self) -> Bytes {
        self.body.clone()
    }

    pub fn set_context(&mut self, context: Context) {
        self.context = context;
    }

    pub fn client_ip(&self) -> Option<String> {
        self.head.client_ip()
    }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }
}

/// Fluent builder for [`Request`]. Obtain via [`Request::builder()`].
pub struct RequestBuilder {
    head: RequestHead,
    body: Bytes,
}

impl RequestBuilder {
    pub fn method(mut self, method: Method) -> Self {
        self.head.method = method;
        self
    }

    /// Request target, e.g. `/users/42?verbose=1`.
    pub fn uri(mut self, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((p, q)) => (p, Some(q.to_owned()).filter(|q| !q.is_empty())),
            None => (target, None),
        };
        self.head.path = path.to_owned();
        self.head.query = query;
        self
    }

    /// Appends a header. Repeated names are kept in order.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.head.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
        self.head.remote_addr = Some(addr);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> Request {
        Request {
            head: Arc::new(self.head),
            body: self.body,
            params: HashMap::new(),
            context: Context::background(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_splits_path_and_query() {
        let req = Request::builder().uri("/random?queryParam=123&x=hello%20world").build();
        assert_eq!(req.path(), "/random");
        assert_eq!(req.query(), Some("queryParam=123&x=hello%20world"));
        assert_eq!(req.head().path_and_query(), "/random?queryParam=123&x=hello%20world");

        let bare = Request::builder().uri("/random?").build();
        assert_eq!(bare.query(), None);
        assert_eq!(bare.head().path_and_query(), "/random");
    }

    #[test]
    fn set_header_replaces_case_insensitively() {
        let mut req = Request::builder().header("X-Correlation-ID", "old").build();
        req.set_header("x-correlation-id", "new");
        assert_eq!(req.header("X-CORRELATION-ID"), Some("new"));
        assert_eq!(req.headers().len(), 1);
    }

    #[test]
    fn set_header_does_not_touch_shared_head() {
        let mut req = Request::builder().build();
        let handle = Arc::clone(req.head());
        req.set_header("x-correlation-id", "abc");
        assert_eq!(handle.header("x-correlation-id"), None);
        assert_eq!(req.header("x-correlation-id"), Some("abc"));
    }

    #[test]
    fn client_ip_prefers_forwarding_headers() {
        let peer: SocketAddr = "10.0.0.9:5123".parse().unwrap();

        let req = Request::builder()
            .remote_addr(peer)
            .header("X-Forwarded-For", " 203.0.113.7 , 10.0.0.1")
            .build();
        assert_eq!(req.client_ip().as_deref(), Some("203.0.113.7"));

        let req = Request::builder().remote_addr(peer).header("X-Real-IP", "198.51.100.2").build();
        assert_eq!(req.client_ip().as_deref(), Some("198.51.100.2"));

        let req = Request::builder().remote_addr(peer).build();
        assert_eq!(req.client_ip().as_deref(), Some("10.0.0.9"));

        assert_eq!(Request::builder().build().client_ip(), None);
    }
}
