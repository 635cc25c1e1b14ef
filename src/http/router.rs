//! Route table.
//!
//! Routes are collected in a [`RouterBuilder`] and frozen into a [`Router`]
//! before the server starts. A `Router` has no mutating methods, so workers
//! share it through an `Arc` and read it without locking.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::http::uri::Uri;

/// Turns a fully parsed request into a response.
///
/// Handlers run on a worker thread shared with other connections and must
/// not block.
pub type Handler = Arc<dyn Fn(&Request) -> Response + Send + Sync>;

type RouteTable = HashMap<Uri, HashMap<Method, Handler>>;

#[derive(Default, Clone)]
pub struct RouterBuilder {
    routes: RouteTable,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `method` on `uri`, replacing any previous
    /// handler for that pair.
    pub fn register<F>(&mut self, uri: impl Into<Uri>, method: Method, handler: F) -> &mut Self
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.routes
            .entry(uri.into())
            .or_default()
            .insert(method, Arc::new(handler));
        self
    }

    pub fn freeze(self) -> Router {
        Router { routes: self.routes }
    }
}

impl fmt::Debug for RouterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("routes", &route_keys(&self.routes))
            .finish()
    }
}

/// Read-only route table consulted by every worker.
pub struct Router {
    routes: RouteTable,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Routes a request to its handler.
    ///
    /// Unknown paths get 404 Not Found; known paths without a handler for the
    /// request method get 405 Method Not Allowed. Otherwise the handler's
    /// response is returned as is.
    pub fn dispatch(&self, request: &Request) -> Response {
        let Some(methods) = self.routes.get(&request.uri) else {
            return Response::not_found();
        };
        let Some(handler) = methods.get(&request.method) else {
            return Response::method_not_allowed();
        };
        handler(request)
    }

    pub fn contains(&self, uri: &Uri, method: Method) -> bool {
        self.routes
            .get(uri)
            .is_some_and(|methods| methods.contains_key(&method))
    }

    /// Number of registered (path, method) pairs.
    pub fn len(&self) -> usize {
        self.routes.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &route_keys(&self.routes))
            .finish()
    }
}

fn route_keys(routes: &RouteTable) -> Vec<(String, Vec<Method>)> {
    let mut keys: Vec<_> = routes
        .iter()
        .map(|(uri, methods)| {
            let mut methods: Vec<Method> = methods.keys().copied().collect();
            methods.sort();
            (uri.path().to_string(), methods)
        })
        .collect();
    keys.sort();
    keys
}
