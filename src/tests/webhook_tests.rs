//! tests/webhook_tests.rs
//! Pruebas de los endpoints HTTP (contratos JSON y token del webhook).

#[cfg(test)]
mod tests {
    use actix_web::{test, web, App};
    use serde_json::{json, Value};
    use sqlx::sqlite::SqlitePoolOptions;

    use crate::app;
    use crate::config::tracker_config::TrackerConfig;
    use crate::services::log_store::MessageLogStore;
    use crate::services::query_service::QueryService;
    use crate::services::send_tracker_service::SendTrackerService;
    use crate::services::status_service::StatusService;

    const SECRET: &str = "secreto-de-prueba";

    async fn setup_store() -> MessageLogStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("No se pudo abrir SQLite en memoria");
        let store = MessageLogStore::new(pool);
        store.run_migrations().await.expect("Fallo en migraciones");
        store
    }

    fn config() -> TrackerConfig {
        TrackerConfig {
            webhook_secret: SECRET.to_string(),
            database_url: String::new(),
            bind_addr: "127.0.0.1".to_string(),
            port: 0,
        }
    }

    macro_rules! build_app {
        ($store:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(config()))
                    .app_data(web::Data::new(SendTrackerService::new($store.clone())))
                    .app_data(web::Data::new(StatusService::new($store.clone())))
                    .app_data(web::Data::new(QueryService::new($store.clone())))
                    .configure(app::init_app),
            )
            .await
        };
    }

    #[actix_rt::test]
    async fn test_rejects_missing_or_wrong_token() {
        let store = setup_store().await;
        let app = build_app!(store);

        let req = test::TestRequest::post()
            .uri("/api/webhooks/track-send")
            .set_json(json!({ "wa_id": "919876543210", "template_wamid": "W1" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 403);

        let req = test::TestRequest::post()
            .uri("/api/webhooks/track-send")
            .insert_header(("X-Webhook-Token", "otro"))
            .set_json(json!({ "wa_id": "919876543210", "template_wamid": "W1" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 403);
    }

    #[actix_rt::test]
    async fn test_track_send_contract() {
        let store = setup_store().await;
        let app = build_app!(store);

        let req = test::TestRequest::post()
            .uri("/api/webhooks/track-send")
            .insert_header(("X-Webhook-Token", SECRET))
            .set_json(json!({
                "wa_id": "919876543210",
                "template_wamid": "W1",
                "template_name": "rsvp_invite_v2",
                "flow_type": "rsvp"
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["ok"], json!(true));
        assert_eq!(body["wamid"], json!("W1"));
        assert_eq!(body["standalone"], json!(true));
    }

    #[actix_rt::test]
    async fn test_track_send_validation_is_bad_request() {
        let store = setup_store().await;
        let app = build_app!(store);

        let req = test::TestRequest::post()
            .uri("/api/webhooks/track-send")
            .insert_header(("X-Webhook-Token", SECRET))
            .set_json(json!({ "wa_id": "", "template_wamid": "W1" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_rt::test]
    async fn test_status_webhook_acknowledges_unknown_wamid() {
        let store = setup_store().await;
        let app = build_app!(store);

        // wamid nunca registrado: se ignora pero respondemos 200 para no
        // provocar reintentos del proveedor
        let req = test::TestRequest::post()
            .uri("/api/webhooks/message-status")
            .insert_header(("X-Webhook-Token", SECRET))
            .set_json(json!({
                "wamid": "W_unknown",
                "recipient_id": "919876543210",
                "status": "delivered",
                "timestamp": "2024-01-15T10:30:00Z"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["ok"], json!(true));
        assert_eq!(body["ignored"], json!(true));
    }

    #[actix_rt::test]
    async fn test_status_and_lookup_roundtrip() {
        let store = setup_store().await;
        let app = build_app!(store);

        let req = test::TestRequest::post()
            .uri("/api/webhooks/track-send")
            .insert_header(("X-Webhook-Token", SECRET))
            .set_json(json!({ "wa_id": "919876543210", "template_wamid": "W1" }))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/webhooks/message-status")
            .insert_header(("X-Webhook-Token", SECRET))
            .set_json(json!({
                "wamid": "W1",
                "recipient_id": "919876543210",
                "status": "delivered",
                "timestamp": "2024-01-15T10:30:01Z"
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], json!("delivered"));

        let req = test::TestRequest::post()
            .uri("/api/webhooks/message-status-lookup")
            .insert_header(("X-Webhook-Token", SECRET))
            .set_json(json!({ "wamids": ["W1", "W_missing"] }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["statuses"]["W1"]["status"], json!("delivered"));
        assert!(body["statuses"]["W1"]["delivered_at"].is_string());
        assert!(body["statuses"].get("W_missing").is_none());
    }

    #[actix_rt::test]
    async fn test_latest_log_is_null_when_empty() {
        let store = setup_store().await;
        let app = build_app!(store);

        let req = test::TestRequest::get()
            .uri("/api/webhooks/message-logs/latest?registration_id=REG_missing")
            .insert_header(("X-Webhook-Token", SECRET))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["log"].is_null());
    }

    #[actix_rt::test]
    async fn test_message_logs_contract() {
        let store = setup_store().await;
        let app = build_app!(store);

        let req = test::TestRequest::post()
            .uri("/api/webhooks/track-send")
            .insert_header(("X-Webhook-Token", SECRET))
            .set_json(json!({
                "wa_id": "919876543210",
                "template_wamid": "W1",
                "event_id": "EV1",
                "event_registration_id": "REG1",
                "guest_id": "G1",
                "guest_name": "John Doe"
            }))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get()
            .uri("/api/webhooks/message-logs?registration_id=REG1")
            .insert_header(("X-Webhook-Token", SECRET))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        let logs = body["logs"].as_array().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["wamid"], json!("W1"));
        assert_eq!(logs[0]["status"], json!("sent"));
        assert_eq!(logs[0]["guest_name"], json!("John Doe"));
    }
}
