//! config/tracker_config.rs
//! Configuración global del tracker, leída del entorno (.env vía dotenv).
//! El secreto del webhook viaja como valor explícito hacia los handlers;
//! no hay estado global mutable.

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Secreto compartido que manda el ingress en `X-Webhook-Token`.
    /// Vacío ⇒ se rechazan todas las llamadas.
    pub webhook_secret: String,
    pub database_url: String,
    pub bind_addr: String,
    pub port: u16,
}

impl TrackerConfig {
    pub fn from_env() -> Self {
        TrackerConfig {
            webhook_secret: std::env::var("WEBHOOK_SECRET").unwrap_or_default(),
            database_url: std::env::var("TRACKER_DATABASE_URL")
                .unwrap_or_else(|_| "data/message_logs.db".to_string()),
            bind_addr: std::env::var("TRACKER_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("TRACKER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5023),
        }
    }
}
