//! To-do list service backed by MySQL.
//!
//! Run with:
//!   DBUSER=… DBPASS=… DBHOST=… DBNAME=… cargo run --bin todo
//!
//! Try:
//!   curl http://localhost:8080/items
//!   curl -X POST http://localhost:8080/items/add -d '{"title":"Buy milk"}'

use std::sync::Arc;

use waypost::config::{self, DatabaseConfig, ServerConfig};
use waypost::mysql::MySqlStore;
use waypost::{Server, logging, todo};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv()?;
    logging::init();

    let server = ServerConfig::from_env()?;
    let database = DatabaseConfig::from_env()?;
    let store = MySqlStore::connect(&database).await?;

    let app = todo::routes(Arc::new(store))?;
    Server::bind(server.addr).serve(app).await?;
    Ok(())
}
