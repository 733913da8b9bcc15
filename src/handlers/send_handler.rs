//! handlers/send_handler.rs
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::config::tracker_config::TrackerConfig;
use crate::handlers::verify_webhook_token;
use crate::models::error::TrackerError;
use crate::models::message_log_model::TrackSendRequest;
use crate::services::send_tracker_service::SendTrackerService;

/// POST /api/webhooks/track-send
/// Se llama después de un envío exitoso, con el wamid que devolvió el
/// proveedor. Idempotente frente a reintentos del cliente.
pub async fn track_send_endpoint(
    req: HttpRequest,
    config: web::Data<TrackerConfig>,
    tracker: web::Data<SendTrackerService>,
    body: web::Json<TrackSendRequest>,
) -> HttpResponse {
    if !verify_webhook_token(&req, &config) {
        return HttpResponse::Forbidden().json(json!({ "error": "invalid token" }));
    }

    match tracker.record_send(body.into_inner()).await {
        Ok(outcome) => HttpResponse::Ok().json(json!({
            "ok": true,
            "id": outcome.id,
            "wamid": outcome.wamid,
            "standalone": outcome.standalone,
        })),
        Err(TrackerError::Validation(msg)) => HttpResponse::BadRequest().json(json!({
            "ok": false,
            "error": msg
        })),
        Err(e) => {
            log::error!("[TRACK-SEND] Error: {e}");
            HttpResponse::InternalServerError().json(json!({
                "ok": false,
                "error": e.to_string()
            }))
        }
    }
}
