//! handlers/status_handler.rs
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::config::tracker_config::TrackerConfig;
use crate::handlers::verify_webhook_token;
use crate::models::error::TrackerError;
use crate::models::message_log_model::{StatusLookupRequest, StatusUpdateRequest};
use crate::services::query_service::QueryService;
use crate::services::status_service::StatusService;

/// POST /api/webhooks/message-status
/// Callback de estado reenviado desde el webhook del proveedor.
///
/// Un wamid desconocido NO es fallo: se loguea y se responde 200 igual,
/// para no disparar tormentas de reintento del proveedor. Solo una caída
/// real de storage produce un 500 (y el reintento posterior es inocuo
/// porque la reconciliación es idempotente).
pub async fn message_status_endpoint(
    req: HttpRequest,
    config: web::Data<TrackerConfig>,
    status_service: web::Data<StatusService>,
    body: web::Json<StatusUpdateRequest>,
) -> HttpResponse {
    if !verify_webhook_token(&req, &config) {
        return HttpResponse::Forbidden().json(json!({ "error": "invalid token" }));
    }

    let update = body.into_inner();
    if update.wamid.trim().is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "ok": false,
            "error": "missing wamid"
        }));
    }

    match status_service.apply_status(&update).await {
        Ok(status) => HttpResponse::Ok().json(json!({
            "ok": true,
            "status": status
        })),
        Err(TrackerError::NotFound(wamid)) => {
            log::warn!("[MESSAGE-STATUS] wamid desconocido, ignorado: {wamid}");
            HttpResponse::Ok().json(json!({
                "ok": true,
                "ignored": true
            }))
        }
        Err(e) => {
            log::error!("[MESSAGE-STATUS] Error: {e}");
            HttpResponse::InternalServerError().json(json!({
                "ok": false,
                "error": e.to_string()
            }))
        }
    }
}

/// POST /api/webhooks/message-status-lookup
/// Lookup en lote: `{"wamids": [...]}` → `{"statuses": {wamid: snapshot}}`.
/// Los wamid sin registro simplemente no aparecen.
pub async fn status_lookup_endpoint(
    req: HttpRequest,
    config: web::Data<TrackerConfig>,
    query_service: web::Data<QueryService>,
    body: web::Json<StatusLookupRequest>,
) -> HttpResponse {
    if !verify_webhook_token(&req, &config) {
        return HttpResponse::Forbidden().json(json!({ "error": "invalid token" }));
    }

    match query_service.batch_lookup(&body.wamids).await {
        Ok(statuses) => HttpResponse::Ok().json(json!({ "statuses": statuses })),
        Err(e) => {
            log::error!("[MESSAGE-STATUS-LOOKUP] Error: {e}");
            HttpResponse::InternalServerError().json(json!({
                "ok": false,
                "error": e.to_string()
            }))
        }
    }
}
