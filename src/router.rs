//! Radix-tree request router.
//!
//! Routes are keyed by path only. Method enforcement belongs to the
//! [`Dispatcher`], so `POST /items` against a GET-only route reaches its
//! dispatcher and comes back `405`, not `404`.
//!
//! Patterns use `{name}` captures. They are parsed once, when the route is
//! registered; handlers read them by name with [`Request::param`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use matchit::Router as MatchitRouter;
use tracing::info;

use crate::dispatch::{Dispatcher, Outcome};
use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// The application router. Build it once at startup; pass it to
/// [`Server::serve`](crate::Server::serve).
pub struct Router {
    routes: MatchitRouter<BoxedHandler>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: MatchitRouter::new() }
    }

    /// Register a plain handler for `path`, whatever the request method.
    ///
    /// ```rust
    /// # use waypost::{Request, Response, Router};
    /// # async fn view(_: Request) -> Response { Response::text("") }
    /// let app = Router::new().route("/view/{title}", view)?;
    /// # Ok::<(), waypost::Error>(())
    /// ```
    pub fn route(mut self, path: &str, handler: impl Handler) -> Result<Self, Error> {
        self.routes
            .insert(path, handler.into_boxed_handler())
            .map_err(|source| Error::Route { path: path.to_owned(), source })?;
        Ok(self)
    }

    /// Register a plain handler that only `method` reaches. Any other method
    /// is answered `405` with an `allow` header and the handler never runs.
    ///
    /// For handlers that need replies the [`Dispatcher`] cannot give, such as
    /// redirects.
    pub fn route_only(self, method: Method, path: &str, handler: impl Handler) -> Result<Self, Error> {
        let inner = handler.into_boxed_handler();
        self.route(path, move |req: Request| {
            let inner = Arc::clone(&inner);
            async move {
                if method.matches(req.method()) {
                    return inner.call(req).await;
                }
                info!(method = %req.method(), path = %req.path(), status = 405u16, "method not allowed");
                Response::builder()
                    .status(Status::MethodNotAllowed)
                    .header("allow", method.as_str())
                    .text(Status::MethodNotAllowed.reason())
            }
        })
    }

    /// Register a GET-only dispatched handler.
    pub fn get<F, Fut>(self, path: &str, handler: F) -> Result<Self, Error>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        self.dispatch(Method::Get, path, handler)
    }

    /// Register a POST-only dispatched handler.
    pub fn post<F, Fut>(self, path: &str, handler: F) -> Result<Self, Error>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        self.dispatch(Method::Post, path, handler)
    }

    /// Register `handler` behind a [`Dispatcher`] requiring `method`.
    pub fn dispatch<F, Fut>(self, method: Method, path: &str, handler: F) -> Result<Self, Error>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        self.route(path, Dispatcher::new(method, handler).into_handler())
    }

    pub(crate) fn lookup(&self, path: &str) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let matched = self.routes.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), percent_decode(v)))
            .collect();
        Some((handler, params))
    }

    /// Routes one request and produces one response. Unmatched paths get `404`.
    pub async fn handle(&self, mut req: Request) -> Response {
        match self.lookup(req.path()) {
            Some((handler, params)) => {
                req.params = params;
                handler.call(req).await
            }
            None => {
                info!(method = %req.method(), path = %req.path(), status = 404u16, "no route");
                Response::builder().status(Status::NotFound).text("404 page not found")
            }
        }
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

/// Decodes `%XX` escapes in a captured segment. Malformed escapes are kept
/// verbatim; a result that is not UTF-8 falls back to the raw segment.
fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let escaped = (bytes[i] == b'%')
            .then(|| bytes.get(i + 1..i + 3))
            .flatten()
            .and_then(|hex| std::str::from_utf8(hex).ok())
            .and_then(|hex| u8::from_str_radix(hex, 16).ok());
        match escaped {
            Some(b) => {
                out.push(b);
                i += 3;
            }
            None => {
                out.push(bytes[i]);
                i += 1;
            }
        }
    }
    String::from_utf8(out).unwrap_or_else(|_| raw.to_owned())
}
