//! models/message_log_model.rs
//! Registro de tracking por mensaje y contratos JSON del boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::error::TrackerError;

/// Normaliza un identificador telefónico: solo dígitos, últimos 15.
/// El proveedor manda los números con y sin prefijo "+"/espacios.
pub fn normalize_digits(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let start = digits.len().saturating_sub(15);
    digits[start..].to_string()
}

/// Estado de entrega de un mensaje según los callbacks del proveedor.
///
/// Orden de progresión: sent < delivered < read. `read` y `failed` son
/// terminales; `failed` solo se acepta desde sent/delivered (si ya vimos
/// `read`, un failed tardío se descarta — read es autoritativo).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sent,
    Delivered,
    Read,
    Failed,
}

impl MessageStatus {
    /// Rango de progresión no-terminal. `failed` queda fuera del orden
    /// lineal y se decide aparte en `accepts`.
    pub fn rank(self) -> u8 {
        match self {
            MessageStatus::Sent => 0,
            MessageStatus::Delivered => 1,
            MessageStatus::Read => 2,
            MessageStatus::Failed => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MessageStatus::Sent => "sent",
            MessageStatus::Delivered => "delivered",
            MessageStatus::Read => "read",
            MessageStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<MessageStatus> {
        match s {
            "sent" => Some(MessageStatus::Sent),
            "delivered" => Some(MessageStatus::Delivered),
            "read" => Some(MessageStatus::Read),
            "failed" => Some(MessageStatus::Failed),
            _ => None,
        }
    }

    /// Regla de merge: ¿un evento `incoming` hace avanzar un registro que
    /// está en `current`? Conmutativa e idempotente: cualquier orden de
    /// llegada converge al mismo estado final.
    pub fn accepts(current: MessageStatus, incoming: MessageStatus) -> bool {
        match (current, incoming) {
            // read y failed no regresan nunca
            (MessageStatus::Read, _) | (MessageStatus::Failed, _) => false,
            // failed se acepta desde sent o delivered
            (_, MessageStatus::Failed) => true,
            (cur, inc) => inc.rank() > cur.rank(),
        }
    }
}

/// Un registro de tracking por wamid (id de mensaje asignado por el
/// proveedor). Creado por el Send Tracker, mutado solo por el reconciler.
#[derive(Debug, Clone, Serialize)]
pub struct MessageLog {
    pub id: String,
    pub wamid: String,
    pub recipient_id: String,
    pub status: MessageStatus,
    pub template_name: Option<String>,
    pub flow_type: Option<String>,
    pub message_type: Option<String>,
    // Correlación con evento: o los tres presentes o los tres ausentes.
    pub event_id: Option<String>,
    pub registration_id: Option<String>,
    pub guest_id: Option<String>,
    pub guest_name: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MessageLog {
    /// Standalone ⇔ sin ids de correlación.
    pub fn is_standalone(&self) -> bool {
        self.event_id.is_none() && self.registration_id.is_none() && self.guest_id.is_none()
    }
}

/// Fila cruda tal como sale de SQLite (timestamps como strings RFC-3339).
#[derive(Debug, sqlx::FromRow)]
pub struct MessageLogRow {
    pub id: String,
    pub wamid: String,
    pub recipient_id: String,
    pub status: String,
    pub template_name: Option<String>,
    pub flow_type: Option<String>,
    pub message_type: Option<String>,
    pub event_id: Option<String>,
    pub registration_id: Option<String>,
    pub guest_id: Option<String>,
    pub guest_name: Option<String>,
    pub sent_at: Option<String>,
    pub delivered_at: Option<String>,
    pub read_at: Option<String>,
    pub failed_at: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub created_at: String,
}

fn parse_ts(field: &str, value: Option<String>) -> Result<Option<DateTime<Utc>>, TrackerError> {
    match value {
        None => Ok(None),
        Some(s) => s
            .parse::<DateTime<Utc>>()
            .map(Some)
            .map_err(|e| TrackerError::Corrupt(format!("{field}: {e}"))),
    }
}

impl TryFrom<MessageLogRow> for MessageLog {
    type Error = TrackerError;

    fn try_from(row: MessageLogRow) -> Result<Self, TrackerError> {
        let status = MessageStatus::parse(&row.status)
            .ok_or_else(|| TrackerError::Corrupt(format!("status: {}", row.status)))?;

        Ok(MessageLog {
            id: row.id,
            wamid: row.wamid,
            recipient_id: row.recipient_id,
            status,
            template_name: row.template_name,
            flow_type: row.flow_type,
            message_type: row.message_type,
            event_id: row.event_id,
            registration_id: row.registration_id,
            guest_id: row.guest_id,
            guest_name: row.guest_name,
            sent_at: parse_ts("sent_at", row.sent_at)?,
            delivered_at: parse_ts("delivered_at", row.delivered_at)?,
            read_at: parse_ts("read_at", row.read_at)?,
            failed_at: parse_ts("failed_at", row.failed_at)?,
            error_code: row.error_code,
            error_message: row.error_message,
            created_at: row
                .created_at
                .parse::<DateTime<Utc>>()
                .map_err(|e| TrackerError::Corrupt(format!("created_at: {e}")))?,
        })
    }
}

// ======================================================
// Contratos de entrada/salida (los maneja el webhook ingress)
// ======================================================

/// Request de track-send: se invoca después de un envío exitoso.
/// `template_wamid` es el wamid del proveedor; `wa_id` el teléfono destino.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackSendRequest {
    pub wa_id: String,
    pub template_wamid: String,
    pub template_name: Option<String>,
    pub flow_type: Option<String>,
    pub message_type: Option<String>,
    pub event_id: Option<String>,
    pub event_registration_id: Option<String>,
    pub guest_id: Option<String>,
    pub guest_name: Option<String>,
}

/// Resultado de RecordSend.
#[derive(Debug, Clone, Serialize)]
pub struct TrackSendOutcome {
    pub id: String,
    pub wamid: String,
    pub standalone: bool,
    /// false si el wamid ya estaba registrado (creación idempotente)
    pub created: bool,
}

/// Entrada de error tal como la manda el proveedor en un callback failed.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusErrorEntry {
    pub code: Option<i64>,
    pub title: Option<String>,
    // algunos payloads traen "message" en vez de "title"
    pub message: Option<String>,
}

impl StatusErrorEntry {
    pub fn code_string(&self) -> Option<String> {
        self.code.map(|c| c.to_string())
    }

    pub fn description(&self) -> Option<String> {
        self.title
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| self.message.clone())
    }
}

/// Callback de estado reenviado por el webhook del proveedor.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdateRequest {
    pub wamid: String,
    pub recipient_id: Option<String>,
    pub status: MessageStatus,
    /// ISO-8601; si falta usamos la hora de recepción
    pub timestamp: Option<DateTime<Utc>>,
    pub errors: Option<Vec<StatusErrorEntry>>,
}

/// Request de lookup en lote por wamid.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusLookupRequest {
    #[serde(default)]
    pub wamids: Vec<String>,
}

/// Snapshot de estado que devuelve el lookup. Los campos de error solo
/// se exponen cuando el registro está en failed.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub status: MessageStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub error_code: Option<String>,
    pub error: Option<String>,
}

impl From<&MessageLog> for StatusSnapshot {
    fn from(log: &MessageLog) -> Self {
        let failed = log.status == MessageStatus::Failed;
        StatusSnapshot {
            status: log.status,
            sent_at: log.sent_at,
            delivered_at: log.delivered_at,
            read_at: log.read_at,
            error_code: if failed { log.error_code.clone() } else { None },
            error: if failed {
                log.error_message.clone()
            } else {
                None
            },
        }
    }
}

/// Filtros de listado (query string). Todos opcionales y conjuntivos.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogFilters {
    pub registration_id: Option<String>,
    pub event_id: Option<String>,
    pub guest_id: Option<String>,
    pub recipient_id: Option<String>,
    pub template_name: Option<String>,
    /// true ⇒ solo mensajes sin contexto de evento/registro/guest
    #[serde(default)]
    pub standalone: bool,
}
