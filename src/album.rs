//! Album catalogue over the `album` table.
//!
//! [`Catalogue`] is the typed front: it adds context to store failures and
//! turns a missing row into [`AlbumError::NotFound`]. [`routes`] exposes it
//! over HTTP through dispatched handlers:
//!
//! | Route | Method | Reply |
//! |---|---|---|
//! | `/artists/{artist}/albums` | GET | JSON array of [`Album`] |
//! | `/albums/{id}` | GET | one [`Album`] |
//! | `/albums` | POST | id of the inserted album |

use std::sync::{Arc, Mutex};

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dispatch::Outcome;
use crate::error::{Error, HandlerError, HttpError};
use crate::request::Request;
use crate::router::Router;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Album {
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub price: f32,
}

/// An album before the store has assigned it an id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewAlbum {
    pub title: String,
    pub artist: String,
    pub price: f32,
}

#[derive(Debug, thiserror::Error)]
pub enum AlbumError {
    #[error("album {0}: no such album")]
    NotFound(i64),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[async_trait]
pub trait AlbumStore: Send + Sync {
    async fn by_artist(&self, artist: &str) -> anyhow::Result<Vec<Album>>;

    /// At most one row.
    async fn by_id(&self, id: i64) -> anyhow::Result<Option<Album>>;

    async fn insert(&self, album: &NewAlbum) -> anyhow::Result<i64>;
}

#[derive(Debug, Default)]
pub struct MemoryAlbumStore {
    albums: Mutex<Vec<Album>>,
}

impl MemoryAlbumStore {
    pub fn with_albums(albums: Vec<Album>) -> Self {
        Self { albums: Mutex::new(albums) }
    }

    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, Vec<Album>>> {
        self.albums.lock().map_err(|_| anyhow::anyhow!("album store lock poisoned"))
    }
}

#[async_trait]
impl AlbumStore for MemoryAlbumStore {
    async fn by_artist(&self, artist: &str) -> anyhow::Result<Vec<Album>> {
        Ok(self.lock()?.iter().filter(|a| a.artist == artist).cloned().collect())
    }

    async fn by_id(&self, id: i64) -> anyhow::Result<Option<Album>> {
        Ok(self.lock()?.iter().find(|a| a.id == id).cloned())
    }

    async fn insert(&self, album: &NewAlbum) -> anyhow::Result<i64> {
        let mut albums = self.lock()?;
        let id = albums.iter().map(|a| a.id).max().unwrap_or(0) + 1;
        albums.push(Album {
            id,
            title: album.title.clone(),
            artist: album.artist.clone(),
            price: album.price,
        });
        Ok(id)
    }
}

/// Typed album operations over an injected store.
#[derive(Clone)]
pub struct Catalogue {
    store: Arc<dyn AlbumStore>,
}

impl Catalogue {
    pub fn new(store: Arc<dyn AlbumStore>) -> Self {
        Self { store }
    }

    pub async fn albums_by_artist(&self, name: &str) -> Result<Vec<Album>, AlbumError> {
        let albums = self.store
            .by_artist(name)
            .await
            .with_context(|| format!("albums by artist {name:?}"))?;
        Ok(albums)
    }

    pub async fn album_by_id(&self, id: i64) -> Result<Album, AlbumError> {
        self.store
            .by_id(id)
            .await
            .with_context(|| format!("album by id {id}"))?
            .ok_or(AlbumError::NotFound(id))
    }

    pub async fn add_album(&self, album: &NewAlbum) -> Result<i64, AlbumError> {
        let id = self.store
            .insert(album)
            .await
            .with_context(|| format!("add album {:?}", album.title))?;
        info!(id, title = %album.title, "album added");
        Ok(id)
    }
}

impl From<AlbumError> for HandlerError {
    fn from(e: AlbumError) -> Self {
        match e {
            AlbumError::NotFound(_) => HttpError::not_found("Album not found").into(),
            AlbumError::Store(e) => HandlerError::Unclassified(e),
        }
    }
}

/// `GET /artists/{artist}/albums`
pub async fn list_by_artist(catalogue: &Catalogue, req: Request) -> Outcome {
    let artist = req.param("artist").unwrap_or_default();
    let albums = catalogue.albums_by_artist(artist).await?;
    Ok(serde_json::to_vec(&albums).context("encode albums")?)
}

/// `GET /albums/{id}`
pub async fn get_by_id(catalogue: &Catalogue, req: Request) -> Outcome {
    let id: i64 = req
        .param("id")
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| HttpError::bad_request("Invalid album id"))?;
    let album = catalogue.album_by_id(id).await?;
    Ok(serde_json::to_vec(&album).context("encode album")?)
}

/// `POST /albums`
pub async fn add(catalogue: &Catalogue, req: Request) -> Outcome {
    let album: NewAlbum = req.json()?;
    if album.title.trim().is_empty() {
        return Err(HttpError::bad_request("Missing Title in request body").into());
    }
    if album.artist.trim().is_empty() {
        return Err(HttpError::bad_request("Missing Artist in request body").into());
    }
    let id = catalogue.add_album(&album).await?;
    Ok(serde_json::to_vec(&id).context("encode album id")?)
}

pub fn routes(catalogue: Catalogue) -> Result<Router, Error> {
    let by_artist = catalogue.clone();
    let by_id = catalogue.clone();
    let adding = catalogue;

    Router::new()
        .get("/artists/{artist}/albums", move |req: Request| {
            let catalogue = by_artist.clone();
            async move { list_by_artist(&catalogue, req).await }
        })?
        .get("/albums/{id}", move |req: Request| {
            let catalogue = by_id.clone();
            async move { get_by_id(&catalogue, req).await }
        })?
        .post("/albums", move |req: Request| {
            let catalogue = adding.clone();
            async move { add(&catalogue, req).await }
        })
}
