//! app.rs
use crate::handlers::{log_handler, send_handler, status_handler};
use actix_web::web;

pub fn init_app(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api").service(
            web::scope("/webhooks")
                .route(
                    "/track-send",
                    web::post().to(send_handler::track_send_endpoint),
                )
                .route(
                    "/message-status",
                    web::post().to(status_handler::message_status_endpoint),
                )
                .route(
                    "/message-status-lookup",
                    web::post().to(status_handler::status_lookup_endpoint),
                )
                .route(
                    "/message-logs",
                    web::get().to(log_handler::message_logs_endpoint),
                )
                .route(
                    "/message-logs/latest",
                    web::get().to(log_handler::latest_log_endpoint),
                ),
        ),
    );
}
