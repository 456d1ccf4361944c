//! Guestbook append service behind `POST /api/message`.

pub mod error;
pub mod routes;
pub mod store;

pub use error::StoreError;
pub use store::{GuestbookStore, Record};

use crate::config::ServerConfig;
use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};

pub async fn serve(config: ServerConfig) -> std::io::Result<()> {
    let store = web::Data::new(GuestbookStore::new(config.store_path.clone()));
    let (host, port) = config.bind_addr();
    tracing::info!("Guestbook stored at {}", config.store_path.display());
    tracing::info!("Binding to {}:{}", host, port);

    HttpServer::new(move || {
        // Configure CORS to allow all origins
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(86400);

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(store.clone())
            .configure(routes::configure)
    })
    .bind((host, port))?
    .run()
    .await
}
