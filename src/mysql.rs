//! MySQL-backed stores.
//!
//! One pool serves both the album catalogue and the to-do list. TLS is
//! always on and the server certificate is verified against
//! [`DatabaseConfig::ca_cert`].

use anyhow::Context;
use async_trait::async_trait;
use sqlx::MySqlPool;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions, MySqlSslMode};
use tracing::info;

use crate::album::{Album, AlbumStore, NewAlbum};
use crate::config::DatabaseConfig;
use crate::error::Error;
use crate::todo::{TodoItem, TodoStore};

#[derive(Clone, Debug)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    /// Opens the pool and checks the server answers before returning.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, Error> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name)
            .ssl_mode(MySqlSslMode::VerifyIdentity)
            .ssl_ca(&config.ca_cert);

        let pool = MySqlPoolOptions::new().connect_with(options).await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        info!(host = %config.host, port = config.port, database = %config.name, "connected");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

/// `price` is cast so a `DECIMAL` column still decodes into `f32`.
const ALBUM_COLUMNS: &str = "id, title, artist, CAST(price AS FLOAT) AS price";

fn inserted_id(last_insert_id: u64) -> anyhow::Result<i64> {
    i64::try_from(last_insert_id).context("inserted id out of range")
}

#[async_trait]
impl AlbumStore for MySqlStore {
    async fn by_artist(&self, artist: &str) -> anyhow::Result<Vec<Album>> {
        let sql = format!("SELECT {ALBUM_COLUMNS} FROM album WHERE artist = ?");
        let albums = sqlx::query_as::<_, Album>(&sql)
            .bind(artist)
            .fetch_all(&self.pool)
            .await?;
        Ok(albums)
    }

    async fn by_id(&self, id: i64) -> anyhow::Result<Option<Album>> {
        let sql = format!("SELECT {ALBUM_COLUMNS} FROM album WHERE id = ?");
        let album = sqlx::query_as::<_, Album>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(album)
    }

    async fn insert(&self, album: &NewAlbum) -> anyhow::Result<i64> {
        let result = sqlx::query("INSERT INTO album (title, artist, price) VALUES (?, ?, ?)")
            .bind(&album.title)
            .bind(&album.artist)
            .bind(album.price)
            .execute(&self.pool)
            .await?;
        inserted_id(result.last_insert_id())
    }
}

#[async_trait]
impl TodoStore for MySqlStore {
    async fn items(&self) -> anyhow::Result<Vec<TodoItem>> {
        let items = sqlx::query_as::<_, TodoItem>(
            "SELECT id, title, description, state FROM TodoItems",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn insert(&self, title: &str) -> anyhow::Result<i64> {
        let result = sqlx::query("INSERT INTO TodoItems (title, state) VALUES (?, 0)")
            .bind(title)
            .execute(&self.pool)
            .await?;
        inserted_id(result.last_insert_id())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
