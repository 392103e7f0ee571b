//! # waypost
//!
//! Method-checked request dispatch for small HTTP services.
//!
//! ## The contract
//!
//! A dispatched handler does one thing: take a [`Request`] and produce either
//! the bytes to send or a failure. Everything else happens in the
//! [`Dispatcher`] wrapped around it:
//!
//! - wrong method → `405`, and the handler never runs
//! - `Ok(bytes)` → `200` with exactly those bytes
//! - [`HttpError`] → its status, with the reason as a JSON string
//! - any other error → `500 "Internal Server Error"`, detail logged only
//! - one log line per request with method, path and final status
//!
//! Stores are injected, never global: a handler closes over an
//! `Arc<dyn TodoStore>` (or any other collaborator) that tests replace freely.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use anyhow::Context;
//! use waypost::{HttpError, Outcome, Request, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let app = Router::new()
//!         .get("/items", list)?
//!         .post("/items/add", add)?;
//!
//!     Server::bind("0.0.0.0:8080".parse()?).serve(app).await?;
//!     Ok(())
//! }
//!
//! async fn list(_req: Request) -> Outcome {
//!     Ok(serde_json::to_vec(&["milk", "eggs"]).context("encode items")?)
//! }
//!
//! async fn add(req: Request) -> Outcome {
//!     if req.body().is_empty() {
//!         return Err(HttpError::bad_request("Missing Title in request body").into());
//!     }
//!     Ok(b"3".to_vec())
//! }
//! ```
//!
//! The crate also carries the three services built on the dispatcher:
//! [`album`], [`todo`] and [`wiki`], each with a binary under `src/bin/`.

mod dispatch;
mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod album;
pub mod config;
pub mod health;
pub mod logging;
pub mod mysql;
pub mod todo;
pub mod wiki;

pub use dispatch::{Dispatcher, INTERNAL_REASON, Outcome};
pub use error::{Error, HandlerError, HttpError};
pub use handler::Handler;
pub use method::{Method, UnknownMethod};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::{DEFAULT_MAX_BODY, Server};
pub use status::Status;
