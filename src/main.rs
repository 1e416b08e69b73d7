use std::error::Error;

use recipe_api::config::Config;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;
use warp::Filter;

const DEFAULT_LOG_FILTER: &str = "info,sqlx::query=warn";

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::from_env()?;
    init_logging();

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    if config.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        log::info!("Database migrations applied");
    }

    let routes = recipe_api::api(pool).with(warp::log("recipe_api"));

    let (address, server) =
        warp::serve(routes).bind_with_graceful_shutdown(config.bind_address, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {e}");
            }
        });

    log::info!("Listening on http://{address}");
    server.await;
    log::info!("Server stopped");

    Ok(())
}
