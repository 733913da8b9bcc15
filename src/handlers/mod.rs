//! handlers/mod.rs
//! Módulo que agrupa los handlers HTTP (track-send, status, consultas).

pub mod log_handler;
pub mod send_handler;
pub mod status_handler;

use actix_web::HttpRequest;

use crate::config::tracker_config::TrackerConfig;

/// Verifica el token compartido del webhook (header `X-Webhook-Token`).
/// Si no hay secreto configurado se rechaza todo.
pub(crate) fn verify_webhook_token(req: &HttpRequest, config: &TrackerConfig) -> bool {
    let header = req
        .headers()
        .get("X-Webhook-Token")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .trim();

    !config.webhook_secret.is_empty() && header == config.webhook_secret
}
