//! The request dispatcher.
//!
//! A [`Dispatcher`] wraps a fallible handler and turns every possible outcome
//! into exactly one [`Response`] and exactly one log event:
//!
//! | Outcome | Status | Body |
//! |---|---|---|
//! | method mismatch (handler not called) | 405 | `"Method Not Allowed"` |
//! | `Ok(payload)` | 200 | `payload`, byte-for-byte |
//! | `Err(Classified(e))` | `e.status()` | `e.reason()` as a JSON string |
//! | `Err(Unclassified(e))` | 500 | `"Internal Server Error"`; `e` is logged only |
//!
//! If the reason itself cannot be encoded the reply degrades to a plain-text
//! 500 and the encoder fault is logged; the process carries on.
//!
//! ```rust,no_run
//! use waypost::{Dispatcher, HttpError, Method, Request};
//!
//! async fn add(req: Request) -> Result<Vec<u8>, waypost::HandlerError> {
//!     if req.body().is_empty() {
//!         return Err(HttpError::bad_request("Missing Title in request body").into());
//!     }
//!     Ok(b"1".to_vec())
//! }
//!
//! let handler = Dispatcher::new(Method::Post, add).into_handler();
//! ```

use std::future::Future;
use std::sync::Arc;

use tracing::{error, info};

use crate::error::{HandlerError, HttpError};
use crate::handler::Handler;
use crate::method::Method;
use crate::request::Request;
use crate::response::{ContentType, Response};
use crate::status::Status;

/// What a dispatched handler resolves to.
pub type Outcome = Result<Vec<u8>, HandlerError>;

/// Reason sent in place of any unclassified failure.
pub const INTERNAL_REASON: &str = "Internal Server Error";

type ReasonEncoder = fn(&str) -> serde_json::Result<Vec<u8>>;

fn encode_json_string(reason: &str) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(reason)
}

/// Method check + outcome normalisation around one handler.
pub struct Dispatcher<F> {
    method: Method,
    handler: F,
    content_type: ContentType,
    encode_reason: ReasonEncoder,
}

impl<F, Fut> Dispatcher<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    /// Only requests whose method is `method` reach `handler`.
    pub fn new(method: Method, handler: F) -> Self {
        Self {
            method,
            handler,
            content_type: ContentType::Json,
            encode_reason: encode_json_string,
        }
    }

    /// Content type of successful payloads. Defaults to JSON.
    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    /// Runs one request through the dispatcher. Never fails.
    pub async fn call(&self, req: Request) -> Response {
        let method = req.method().to_owned();
        let path = req.path().to_owned();

        let outcome = if self.method.matches(&method) {
            (self.handler)(req).await
        } else {
            Err(HttpError::method_not_allowed().into())
        };

        let mut fault = None;
        let response = match outcome {
            Ok(payload) => Response::builder().bytes(self.content_type, payload),
            Err(HandlerError::Classified(err)) => {
                self.reason_response(err.status(), err.reason(), &mut fault)
            }
            Err(HandlerError::Unclassified(err)) => {
                fault = Some(format!("{err:#}"));
                self.reason_response(Status::InternalServerError, INTERNAL_REASON, &mut fault)
            }
        };

        let status = response.status().code();
        match fault {
            Some(fault) => error!(%method, %path, status, %fault, "request failed"),
            None => info!(%method, %path, status, "request processed"),
        }
        response
    }

    /// Erases the dispatcher into a router-storable [`Handler`].
    pub fn into_handler(self) -> impl Handler {
        let this = Arc::new(self);
        move |req: Request| {
            let this = Arc::clone(&this);
            async move { this.call(req).await }
        }
    }

    fn reason_response(&self, status: Status, reason: &str, fault: &mut Option<String>) -> Response {
        match (self.encode_reason)(reason) {
            Ok(body) => Response::builder().status(status).json(body),
            Err(e) => {
                let note = format!("encoding reason {reason:?}: {e}");
                *fault = Some(match fault.take() {
                    Some(earlier) => format!("{earlier}; {note}"),
                    None => note,
                });
                Response::builder()
                    .status(Status::InternalServerError)
                    .text(INTERNAL_REASON)
            }
        }
    }
}
