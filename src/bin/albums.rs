//! Album catalogue against MySQL.
//!
//! `albums` runs the catalogue walkthrough: list John Coltrane's albums,
//! fetch album 2, insert a new album. `albums serve` exposes the catalogue
//! over HTTP instead.

use std::sync::Arc;

use tracing::info;
use waypost::album::{self, Catalogue, NewAlbum};
use waypost::config::{self, DatabaseConfig, ServerConfig};
use waypost::mysql::MySqlStore;
use waypost::{Server, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv()?;
    logging::init();

    let database = DatabaseConfig::from_env()?;
    let store = MySqlStore::connect(&database).await?;
    let catalogue = Catalogue::new(Arc::new(store));

    match std::env::args().nth(1).as_deref() {
        Some("serve") => {
            let server = ServerConfig::from_env()?;
            Server::bind(server.addr).serve(album::routes(catalogue)?).await?;
        }
        Some(other) => anyhow::bail!("unknown command `{other}`; expected `serve` or nothing"),
        None => walkthrough(&catalogue).await?,
    }
    Ok(())
}

async fn walkthrough(catalogue: &Catalogue) -> anyhow::Result<()> {
    let albums = catalogue.albums_by_artist("John Coltrane").await?;
    info!(?albums, "albums found");

    let album = catalogue.album_by_id(2).await?;
    info!(?album, "album found");

    let id = catalogue
        .add_album(&NewAlbum {
            title: "Bla".to_owned(),
            artist: "Who Cares".to_owned(),
            price: 199.99,
        })
        .await?;
    info!(id, "id of added album");
    Ok(())
}
