//! To-do list service.
//!
//! | Route | Method | Reply |
//! |---|---|---|
//! | `/items` | GET | JSON array of every [`TodoItem`] |
//! | `/items/add` | POST | id of the inserted item, as JSON |
//! | `/healthz`, `/readyz` | any | probes |
//!
//! `POST /items/add` takes `{"title": "..."}`. New items start in state `0`.

use std::sync::{Arc, Mutex};

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dispatch::Outcome;
use crate::error::{Error, HttpError};
use crate::health;
use crate::request::Request;
use crate::router::Router;

/// One row of the `TodoItems` table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TodoItem {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub state: i32,
}

#[derive(Debug, Deserialize)]
struct NewTodo {
    #[serde(default)]
    title: String,
}

/// Persistence for to-do items.
#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn items(&self) -> anyhow::Result<Vec<TodoItem>>;

    /// Inserts an item with state `0` and returns its new id.
    async fn insert(&self, title: &str) -> anyhow::Result<i64>;

    async fn ping(&self) -> anyhow::Result<()>;
}

/// Process-local store, for tests and running without a database.
#[derive(Debug, Default)]
pub struct MemoryTodoStore {
    items: Mutex<Vec<TodoItem>>,
}

#[async_trait]
impl TodoStore for MemoryTodoStore {
    async fn items(&self) -> anyhow::Result<Vec<TodoItem>> {
        let items = self.items.lock().map_err(|_| anyhow::anyhow!("todo store lock poisoned"))?;
        Ok(items.clone())
    }

    async fn insert(&self, title: &str) -> anyhow::Result<i64> {
        let mut items = self.items.lock().map_err(|_| anyhow::anyhow!("todo store lock poisoned"))?;
        let id = items.last().map_or(1, |last| last.id + 1);
        items.push(TodoItem { id, title: title.to_owned(), description: None, state: 0 });
        Ok(id)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// `GET /items`
pub async fn list_items(store: &dyn TodoStore) -> Outcome {
    let items = store.items().await.context("list todo items")?;
    debug!(count = items.len(), "todo items loaded");
    Ok(serde_json::to_vec(&items).context("encode todo items")?)
}

/// `POST /items/add`
pub async fn add_item(store: &dyn TodoStore, req: Request) -> Outcome {
    let input: NewTodo = req.json()?;
    let title = input.title.trim();
    if title.is_empty() {
        return Err(HttpError::bad_request("Missing Title in request body").into());
    }

    let id = store
        .insert(title)
        .await
        .with_context(|| format!("add todo item {title:?}"))?;
    info!(id, "todo item added");
    Ok(serde_json::to_vec(&id).context("encode todo id")?)
}

/// The service's routes over `store`.
pub fn routes(store: Arc<dyn TodoStore>) -> Result<Router, Error> {
    let list = Arc::clone(&store);
    let add = Arc::clone(&store);
    let ready = store;

    Router::new()
        .get("/items", move |_req: Request| {
            let store = Arc::clone(&list);
            async move { list_items(store.as_ref()).await }
        })?
        .post("/items/add", move |req: Request| {
            let store = Arc::clone(&add);
            async move { add_item(store.as_ref(), req).await }
        })?
        .route("/healthz", health::liveness)?
        .route("/readyz", move |_req: Request| {
            let store = Arc::clone(&ready);
            async move { health::readiness(store.ping().await) }
        })
}
