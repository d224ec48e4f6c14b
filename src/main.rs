#[macro_use]
extern crate rocket;

use std::sync::Arc;

use rocket_cors::{AllowedOrigins, CorsOptions};
use tracing::{info, warn};

use crate::{
    config::Settings,
    database::{Database, PgConnector},
};

mod config;
mod database;
mod graphql;
mod logging;
mod models;
mod routes;

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env();
    logging::init(&settings.log_level);

    match settings.database_url_source {
        Some(source) => info!(source, mode = settings.database.mode.as_str(), "database configured"),
        None => warn!("no database connection string found, database operations will fail"),
    }

    if settings.debug && settings.is_production() {
        warn!("DEBUG is on in production, error details will reach clients");
    }

    let db = Arc::new(Database::new(settings.database.clone(), PgConnector));
    if let Err(e) = db.init().await {
        warn!("database pool not created at start-up: {}", e);
    }
    db.ensure_schema().await;

    let wildcard = settings.cors_origins.iter().any(|origin| origin == "*");
    let allowed_origins = if wildcard {
        AllowedOrigins::all()
    } else {
        AllowedOrigins::some_exact(&settings.cors_origins)
    };
    let cors = CorsOptions {
        allowed_origins,
        allow_credentials: !wildcard,
        ..Default::default()
    }
    .to_cors()?;

    let figment = rocket::Config::figment()
        .merge(("address", settings.host.clone()))
        .merge(("port", settings.port));

    info!(
        environment = %settings.environment,
        debug = settings.debug,
        "starting server"
    );
    let launched = rocket::custom(figment)
        .mount("/", routes::routes())
        .mount("/graphql", graphql::routes(settings.debug))
        .manage(graphql::schema())
        .manage(db.clone())
        .manage(settings)
        .attach(cors)
        .launch()
        .await;

    db.shutdown().await;
    launched?;
    Ok(())
}
