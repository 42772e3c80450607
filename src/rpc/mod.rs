//! Interceptors for unary gRPC calls.
//!
//! tonic's own [`Interceptor`](tonic::service::Interceptor) only sees the
//! request metadata, never the message or the handler's result, so access
//! logging needs a wider hook. A [`UnaryInterceptor`] wraps the whole call:
//!
//! ```text
//! serve_unary(&interceptors, "/pkg.Svc/Method", request, handler)
//!        ↓
//! outer.intercept(info, req, next) ─→ inner.intercept(info, req, next) ─→ handler(req)
//! ```
//!
//! Interceptors compose with [`UnaryInterceptor::then`]; the result is itself
//! an interceptor, so any number can be stacked in any order. Call
//! [`serve_unary`] from a generated service method:
//!
//! ```rust,ignore
//! async fn get_user(&self, request: Request<GetUser>) -> Result<Response<User>, Status> {
//!     rpc::serve_unary(&self.interceptors, "/users.Users/GetUser", request, |req| async move {
//!         self.load(req.into_inner()).await
//!     })
//!     .await
//! }
//! ```
//!
//! Messages must implement `serde::Serialize` for the access log; with
//! `prost-build`, add `type_attribute(".", "#[derive(serde::Serialize)]")`.

mod background;
mod code;
mod logging;
mod validate;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use tonic::{Request, Response, Status};

pub use background::BackgroundLogger;
pub use code::code_name;
pub use logging::RpcAccessLog;
pub use validate::RequireMetadata;

/// Outcome of a unary call.
pub type UnaryResult<R> = Result<Response<R>, Status>;

/// Boxed future of a unary call, borrowing from the interceptor stack.
pub type RpcFuture<'a, R> = Pin<Box<dyn Future<Output = UnaryResult<R>> + Send + 'a>>;

/// Static facts about the call being intercepted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnaryInfo {
    full_method: String,
}

impl UnaryInfo {
    pub fn new(full_method: impl Into<String>) -> Self {
        Self { full_method: full_method.into() }
    }

    /// `/package.Service/Method`.
    pub fn full_method(&self) -> &str {
        &self.full_method
    }
}

/// The rest of the call after the current interceptor.
pub struct UnaryNext<'a, T, R> {
    handler: Box<dyn FnOnce(Request<T>) -> RpcFuture<'a, R> + Send + 'a>,
}

impl<'a, T, R> UnaryNext<'a, T, R> {
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: FnOnce(Request<T>) -> Fut + Send + 'a,
        Fut: Future<Output = UnaryResult<R>> + Send + 'a,
    {
        Self { handler: Box::new(move |req| Box::pin(handler(req))) }
    }

    pub fn run(self, req: Request<T>) -> RpcFuture<'a, R> {
        (self.handler)(req)
    }
}

/// A layer around unary calls.
///
/// Either call `next.run(req)` and return its result (possibly after looking
/// at it), or return a `Status` without running the handler.
pub trait UnaryInterceptor: Send + Sync {
    fn intercept<'a, T, R>(
        &'a self,
        info: &'a UnaryInfo,
        req: Request<T>,
        next: UnaryNext<'a, T, R>,
    ) -> RpcFuture<'a, R>
    where
        T: Serialize + Send + 'a,
        R: Send + 'a;

    /// Stacks `inner` inside `self`: `self` sees the call first.
    fn then<I>(self, inner: I) -> Chain<Self, I>
    where
        Self: Sized,
        I: UnaryInterceptor,
    {
        Chain { outer: self, inner }
    }
}

/// Two interceptors run outer-then-inner. Built by [`UnaryInterceptor::then`].
#[derive(Clone, Debug)]
pub struct Chain<A, B> {
    outer: A,
    inner: B,
}

impl<A, B> UnaryInterceptor for Chain<A, B>
where
    A: UnaryInterceptor,
    B: UnaryInterceptor,
{
    fn intercept<'a, T, R>(
        &'a self,
        info: &'a UnaryInfo,
        req: Request<T>,
        next: UnaryNext<'a, T, R>,
    ) -> RpcFuture<'a, R>
    where
        T: Serialize + Send + 'a,
        R: Send + 'a,
    {
        let inner = &self.inner;
        self.outer.intercept(info, req, UnaryNext::new(move |req| inner.intercept(info, req, next)))
    }
}

impl<I: UnaryInterceptor> UnaryInterceptor for Arc<I> {
    fn intercept<'a, T, R>(
        &'a self,
        info: &'a UnaryInfo,
        req: Request<T>,
        next: UnaryNext<'a, T, R>,
    ) -> RpcFuture<'a, R>
    where
        T: Serialize + Send + 'a,
        R: Send + 'a,
    {
        I::intercept(self, info, req, next)
    }
}

/// Runs `handler` for `req` behind `interceptor`.
pub async fn serve_unary<I, T, R, F, Fut>(
    interceptor: &I,
    full_method: &str,
    req: Request<T>,
    handler: F,
) -> UnaryResult<R>
where
    I: UnaryInterceptor,
    T: Serialize + Send,
    R: Send,
    F: FnOnce(Request<T>) -> Fut + Send,
    Fut: Future<Output = UnaryResult<R>> + Send,
{
    let info = UnaryInfo::new(full_method);
    interceptor.intercept(&info, req, UnaryNext::new(handler)).await
}
