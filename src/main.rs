//! A catalog web service with axum.

use catalog_api::{
    app,
    infra::{config, database, logging},
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    let _guard = logging::init_logging();
    let config = config::load_config()?;
    let db = database::init_db(&config.database);

    let listener = TcpListener::bind(format!(
        "{}:{}",
        config.server.http_address, config.server.http_port
    ))
    .await?;
    app::run_app(listener, db).await?;

    Ok(())
}
