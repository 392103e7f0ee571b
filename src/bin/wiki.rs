//! File-backed wiki.
//!
//! Run with:
//!   WIKI_DIR=/tmp/wiki cargo run --bin wiki
//!
//! Then open http://localhost:8080/view/FrontPage

use std::sync::Arc;

use tracing::info;
use waypost::config::{self, ServerConfig};
use waypost::wiki::{self, PageStore};
use waypost::{Server, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv()?;
    logging::init();

    let server = ServerConfig::from_env()?;
    let dir = config::wiki_dir();
    info!(dir = %dir.display(), "serving wiki pages");

    let app = wiki::routes(Arc::new(PageStore::new(dir)))?;
    Server::bind(server.addr).serve(app).await?;
    Ok(())
}
