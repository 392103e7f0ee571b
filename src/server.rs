//! HTTP server and graceful shutdown.
//!
//! On SIGTERM or Ctrl-C the server stops accepting, lets every in-flight
//! connection finish, then returns from [`Server::serve`].

use std::convert::Infallible;
use std::error::Error as StdError;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::status::Status;

/// Largest request body read by default: 1 MiB.
pub const DEFAULT_MAX_BODY: usize = 1 << 20;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    max_body: usize,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    pub fn bind(addr: SocketAddr) -> Self {
        Self { addr, max_body: DEFAULT_MAX_BODY }
    }

    /// Bodies longer than `bytes` are answered `413` without reaching a handler.
    pub fn max_body(mut self, bytes: usize) -> Self {
        self.max_body = bytes;
        self
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a full graceful shutdown.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let router = Arc::new(router);
        let max_body = self.max_body;

        info!(addr = %self.addr, max_body, "waypost listening");

        let mut tasks = tokio::task::JoinSet::new();
        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Shutdown is checked first so a signal stops accepting even
                // with connections queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move { serve_request(router, req, max_body).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("waypost stopped");
        Ok(())
    }
}

/// Reads the whole body, routes, and converts the reply. Every failure is
/// answered here, so hyper never sees an error.
async fn serve_request(
    router: Arc<Router>,
    req: hyper::Request<Incoming>,
    max_body: usize,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    let response = match read_body(body, max_body).await {
        Ok(body) => router.handle(Request::from_parts(&parts, body)).await,
        Err((status, e)) => {
            warn!(method = %parts.method, path = %parts.uri.path(), status = status.code(), "reading request body: {e}");
            Response::builder().status(status).text(status.reason())
        }
    };

    Ok(response.into_http())
}

/// Collects at most `limit` bytes. Too long is `413`; any other read
/// failure is `400`.
async fn read_body<B>(body: B, limit: usize) -> Result<Vec<u8>, (Status, Box<dyn StdError + Send + Sync>)>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes().to_vec()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => Err((Status::ContentTooLarge, e)),
        Err(e) => Err((Status::BadRequest, e)),
    }
}

/// Resolves on the first SIGTERM or SIGINT (Ctrl-C only on non-Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn body_within_limit_is_read_whole() {
        let body = Full::new(Bytes::from_static(b"{\"title\":\"milk\"}"));
        assert_eq!(read_body(body, 64).await.unwrap(), b"{\"title\":\"milk\"}");
    }

    #[tokio::test]
    async fn body_over_limit_is_413() {
        let body = Full::new(Bytes::from(vec![b'x'; 65]));
        let (status, _) = read_body(body, 64).await.unwrap_err();
        assert_eq!(status, Status::ContentTooLarge);
    }

    #[test]
    fn max_body_overrides_default() {
        let server = Server::bind("127.0.0.1:0".parse().unwrap());
        assert_eq!(server.max_body, DEFAULT_MAX_BODY);
        assert_eq!(server.max_body(16).max_body, 16);
    }
}
