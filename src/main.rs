//! Wardbook
//!
//! Main entry point for the ward management service.

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;
use wardbook::{api, config, db, WardService};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if std::env::var("WARD_LOG_FORMAT").is_ok_and(|format| format == "json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    // Load configuration
    let config = config::load_config().context("failed to load configuration")?;

    // Connect to database
    let database = db::Database::connect(&config.database.url, config.database.max_connections)
        .await
        .with_context(|| format!("failed to connect to {}", config.database.url))?;

    // Run migrations
    database
        .run_migrations()
        .await
        .context("failed to run database migrations")?;

    let service = web::Data::new(WardService::new(database, config.ward.clone()));
    let address = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(%address, "starting wardbook");

    HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .wrap(TracingLogger::default())
            .configure(api::configure)
    })
    .bind(&address)
    .with_context(|| format!("failed to bind {}", address))?
    .run()
    .await
    .context("server error")?;

    Ok(())
}
