//! services/send_tracker_service.rs
//! Registra el envío de un mensaje saliente. Se invoca DESPUÉS de que el
//! cliente de envío obtuvo el wamid del proveedor; este servicio solo crea
//! registros, nunca los muta.

use chrono::Utc;
use uuid::Uuid;

use crate::models::error::TrackerError;
use crate::models::message_log_model::{
    normalize_digits, MessageLog, MessageStatus, TrackSendOutcome, TrackSendRequest,
};
use crate::services::log_store::MessageLogStore;

#[derive(Clone, Debug)]
pub struct SendTrackerService {
    store: MessageLogStore,
}

impl SendTrackerService {
    pub fn new(store: MessageLogStore) -> Self {
        SendTrackerService { store }
    }

    /// Crea el registro de tracking en estado `sent`.
    ///
    /// Creación idempotente: si el wamid ya existe (reintento del cliente)
    /// devolvemos el id existente sin mutar nada. La correlación con evento
    /// es todo-o-nada: event_id, registration_id y guest_id o vienen los
    /// tres o ninguno (standalone).
    pub async fn record_send(
        &self,
        req: TrackSendRequest,
    ) -> Result<TrackSendOutcome, TrackerError> {
        let recipient_id = normalize_digits(&req.wa_id);
        if recipient_id.is_empty() {
            return Err(TrackerError::Validation("missing wa_id".to_string()));
        }

        let wamid = req.template_wamid.trim().to_string();
        if wamid.is_empty() {
            return Err(TrackerError::Validation(
                "missing template_wamid".to_string(),
            ));
        }

        let linked = [&req.event_id, &req.event_registration_id, &req.guest_id]
            .iter()
            .filter(|v| v.is_some())
            .count();
        if linked != 0 && linked != 3 {
            return Err(TrackerError::Validation(
                "partial correlation: event_id, event_registration_id and guest_id \
                 must be given together or not at all"
                    .to_string(),
            ));
        }
        let standalone = linked == 0;

        let now = Utc::now();
        let log = MessageLog {
            id: Uuid::new_v4().to_string(),
            wamid: wamid.clone(),
            recipient_id,
            status: MessageStatus::Sent,
            template_name: req.template_name,
            flow_type: req.flow_type,
            message_type: req.message_type,
            event_id: req.event_id,
            registration_id: req.event_registration_id,
            guest_id: req.guest_id,
            guest_name: req.guest_name,
            sent_at: Some(now),
            delivered_at: None,
            read_at: None,
            failed_at: None,
            error_code: None,
            error_message: None,
            created_at: now,
        };

        let (id, created) = self.store.insert_if_absent(&log).await?;
        if created {
            log::info!(
                "[TRACK-SEND] Registrado wamid={} standalone={}",
                truncate(&wamid),
                standalone
            );
        } else {
            log::info!(
                "[TRACK-SEND] wamid={} ya registrado, devuelvo id existente",
                truncate(&wamid)
            );
        }

        Ok(TrackSendOutcome {
            id,
            wamid,
            standalone,
            created,
        })
    }
}

/// Los wamid son largos; para logs basta el prefijo.
pub(crate) fn truncate(wamid: &str) -> &str {
    let end = wamid
        .char_indices()
        .nth(30)
        .map(|(i, _)| i)
        .unwrap_or(wamid.len());
    &wamid[..end]
}
