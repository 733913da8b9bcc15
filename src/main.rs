use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::config::tracker_config::TrackerConfig;
use crate::logger::init_logger;
use crate::services::log_store::MessageLogStore;
use crate::services::query_service::QueryService;
use crate::services::send_tracker_service::SendTrackerService;
use crate::services::status_service::StatusService;

mod app;
mod config;
mod handlers;
mod logger;
mod models;
mod services;
#[cfg(test)]
mod tests;

async fn setup_database(database_url: &str) -> Pool<Sqlite> {
    // 1) Asegurar el directorio "data"
    std::fs::create_dir_all("data").expect("No se pudo crear directorio 'data'");

    log::info!("Conectando a SQLite en {}", database_url);

    // 2) Conectarnos con SQLx (creando el archivo si no existe)
    let options = SqliteConnectOptions::new()
        .filename(database_url)
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .expect("No se pudo conectar a la base de datos SQLite.")
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok(); // Cargar .env al inicio
    init_logger();

    let tracker_config = TrackerConfig::from_env();

    // Conectarnos a la DB
    let db_pool = setup_database(&tracker_config.database_url).await;

    // Store + migraciones
    let store = MessageLogStore::new(db_pool.clone());
    if let Err(e) = store.run_migrations().await {
        panic!("Fallo en migraciones de 'message_logs': {:?}", e);
    }

    let send_tracker = SendTrackerService::new(store.clone());
    let status_service = StatusService::new(store.clone());
    let query_service = QueryService::new(store.clone());

    // Levantar servidor
    let bind = (tracker_config.bind_addr.clone(), tracker_config.port);
    log::info!("Levantando servidor en {}:{}", bind.0, bind.1);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(tracker_config.clone()))
            .app_data(web::Data::new(send_tracker.clone()))
            .app_data(web::Data::new(status_service.clone()))
            .app_data(web::Data::new(query_service.clone()))
            .configure(app::init_app)
    })
    .bind(bind)?
    .run()
    .await
}
