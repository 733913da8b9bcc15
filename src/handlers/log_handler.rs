//! handlers/log_handler.rs
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::config::tracker_config::TrackerConfig;
use crate::handlers::verify_webhook_token;
use crate::models::message_log_model::LogFilters;
use crate::services::query_service::QueryService;

/// GET /api/webhooks/message-logs
/// Filtros conjuntivos por query string; máximo 50 filas, más recientes
/// primero.
pub async fn message_logs_endpoint(
    req: HttpRequest,
    config: web::Data<TrackerConfig>,
    query_service: web::Data<QueryService>,
    filters: web::Query<LogFilters>,
) -> HttpResponse {
    if !verify_webhook_token(&req, &config) {
        return HttpResponse::Forbidden().json(json!({ "error": "invalid token" }));
    }

    match query_service.list_logs(&filters).await {
        Ok(logs) => HttpResponse::Ok().json(json!({ "logs": logs })),
        Err(e) => {
            log::error!("[MESSAGE-LOGS] Error: {e}");
            HttpResponse::InternalServerError().json(json!({
                "ok": false,
                "error": e.to_string()
            }))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LatestLogQuery {
    pub registration_id: String,
}

/// GET /api/webhooks/message-logs/latest?registration_id=...
/// Devuelve `{"log": null}` si la registration no tiene mensajes (no es 404).
pub async fn latest_log_endpoint(
    req: HttpRequest,
    config: web::Data<TrackerConfig>,
    query_service: web::Data<QueryService>,
    query: web::Query<LatestLogQuery>,
) -> HttpResponse {
    if !verify_webhook_token(&req, &config) {
        return HttpResponse::Forbidden().json(json!({ "error": "invalid token" }));
    }

    match query_service
        .latest_for_registration(&query.registration_id)
        .await
    {
        Ok(log) => HttpResponse::Ok().json(json!({ "log": log })),
        Err(e) => {
            log::error!("[MESSAGE-LOGS-LATEST] Error: {e}");
            HttpResponse::InternalServerError().json(json!({
                "ok": false,
                "error": e.to_string()
            }))
        }
    }
}
