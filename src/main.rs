mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod utils;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use env_logger::Env;
use log::info;
use std::io;
use std::sync::Arc;

use crate::config::Config;
use crate::db::{FileStore, PgFileStore};
use crate::utils::gemini::{GeminiClient, GenerativeModel};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cfg = Config::from_env().map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    std::fs::create_dir_all(&cfg.upload_dir)?;

    let store = PgFileStore::connect(&cfg.database_url).await.map_err(|err| {
        log::error!("Failed to connect to the database: {}", err);
        io::Error::new(io::ErrorKind::Other, err)
    })?;
    info!("Connected to the metadata store");

    let store: Arc<dyn FileStore> = Arc::new(store);
    let model: Arc<dyn GenerativeModel> = Arc::new(GeminiClient::new(&cfg.api_key, &cfg.model));
    let store = web::Data::from(store);
    let model = web::Data::from(model);

    let bind_address = cfg.bind_address.clone();
    info!("Starting server at {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .app_data(web::Data::new(cfg.clone()))
            .app_data(store.clone())
            .app_data(model.clone())
            .configure(handlers::configure)
    })
    .bind(bind_address)?
    .run()
    .await
}
