//! Liveness and readiness handlers.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? |
//! | **Readiness** | `/readyz` | Can the backing store answer? |
//!
//! [`liveness`] is a plain handler. Readiness depends on a store, so services
//! call [`readiness`] with the result of their own probe:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use waypost::{health, todo::{MemoryTodoStore, TodoStore}, Request, Router};
//!
//! let store: Arc<dyn TodoStore> = Arc::new(MemoryTodoStore::default());
//! let app = Router::new()
//!     .route("/healthz", health::liveness)?
//!     .route("/readyz", move |_req: Request| {
//!         let store = Arc::clone(&store);
//!         async move { health::readiness(store.ping().await) }
//!     })?;
//! # Ok::<(), waypost::Error>(())
//! ```

use tracing::warn;

use crate::{Request, Response, Status};

/// Always `200 OK` with body `"ok"`.
pub async fn liveness(_req: Request) -> Response {
    Response::text("ok")
}

/// `200 OK` / `"ready"` when `probe` succeeded, otherwise
/// `503 Service Unavailable`. The probe error is logged, not returned.
pub fn readiness(probe: anyhow::Result<()>) -> Response {
    match probe {
        Ok(()) => Response::text("ready"),
        Err(e) => {
            warn!(error = %format!("{e:#}"), "readiness probe failed");
            Response::builder()
                .status(Status::ServiceUnavailable)
                .text(Status::ServiceUnavailable.reason())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn liveness_is_ok() {
        let res = liveness(Request::new("GET", "/healthz")).await;
        assert_eq!(res.status(), Status::Ok);
        assert_eq!(res.body(), b"ok");
    }

    #[test]
    fn readiness_reports_probe_failure() {
        let res = readiness(Err(anyhow::anyhow!("pool timed out")));
        assert_eq!(res.status(), Status::ServiceUnavailable);
        assert!(!String::from_utf8_lossy(res.body()).contains("pool"));
    }
}
