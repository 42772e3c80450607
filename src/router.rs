//! Radix-tree request router with a middleware stack.
//!
//! One tree per HTTP method, O(path-length) lookup. Middleware registered
//! with [`Router::layer`] wraps every request, including the ones that end in
//! `404` or `405`, so they are logged and correlated like any other.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use matchit::Router as MatchitRouter;

use crate::handler::{BoxFuture, BoxedHandler, Handler, MethodNotAllowed, NotFound};
use crate::middleware::{BoxedMiddleware, Middleware, Next};
use crate::request::Request;

/// The application router.
///
/// Build it once at startup and pass it to [`Server::serve`](crate::Server::serve),
/// or drive it directly with [`Router::handle`].
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    layers: Arc<[BoxedMiddleware]>,
}

enum Route {
    Found(BoxedHandler, HashMap<String, String>),
    WrongMethod,
    Missing,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), layers: Vec::new().into() }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them.
    ///
    /// # Panics
    ///
    /// Panics if the path is not a valid route or conflicts with one already
    /// registered for the same method.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::GET, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::POST, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::PUT, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::DELETE, path, handler)
    }

    /// Adds a middleware layer inside every layer added before it.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        let mut layers = self.layers.to_vec();
        layers.push(Arc::new(middleware));
        self.layers = layers.into();
        self
    }

    /// Runs `req` through the middleware stack and the matching handler.
    pub fn handle(&self, mut req: Request) -> BoxFuture {
        let endpoint: BoxedHandler = match self.lookup(req.method(), req.path()) {
            Route::Found(handler, params) => {
                req.set_params(params);
                handler
            }
            Route::WrongMethod => Arc::new(MethodNotAllowed),
            Route::Missing => Arc::new(NotFound),
        };
        Next::new(Arc::clone(&self.layers), endpoint).run(req)
    }

    fn lookup(&self, method: &Method, path: &str) -> Route {
        if let Some(matched) = self.routes.get(method).and_then(|tree| tree.at(path).ok()) {
            let params = matched.params.iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect();
            return Route::Found(Arc::clone(matched.value), params);
        }

        let elsewhere = self.routes.iter()
            .any(|(m, tree)| m != method && tree.at(path).is_ok());
        if elsewhere { Route::WrongMethod } else { Route::Missing }
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
