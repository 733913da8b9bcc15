//! services/status_service.rs
//! Reconciliación de callbacks de estado del proveedor.
//!
//! El proveedor entrega at-least-once y sin orden garantizado: el mismo
//! evento puede llegar dos veces y un `delivered` puede llegar después del
//! `read`. La regla de merge (`MessageStatus::accepts`) es conmutativa e
//! idempotente, así que cualquier intercalado de entregas para un mismo
//! wamid converge al mismo estado final mientras cada update sea atómico.

use chrono::Utc;

use crate::models::error::TrackerError;
use crate::models::message_log_model::{MessageStatus, StatusUpdateRequest};
use crate::services::log_store::{MessageLogStore, StatusMutation};
use crate::services::send_tracker_service::truncate;

#[derive(Clone, Debug)]
pub struct StatusService {
    store: MessageLogStore,
}

impl StatusService {
    pub fn new(store: MessageLogStore) -> Self {
        StatusService { store }
    }

    /// Aplica un evento de estado sobre el registro del wamid.
    ///
    /// Devuelve el status resultante, que es el actual sin cambios cuando el
    /// evento es viejo/duplicado (descarte silencioso, no es error).
    /// `NotFound` si nadie registró el envío; el caller decide si eso
    /// aborta o se ignora (en el webhook se ignora por ítem).
    pub async fn apply_status(
        &self,
        update: &StatusUpdateRequest,
    ) -> Result<MessageStatus, TrackerError> {
        let event_ts = update.timestamp.unwrap_or_else(Utc::now);

        // Releemos y reintentamos si otro handler avanza el registro entre
        // el fetch y el CAS. El lattice de estados es finito y solo avanza,
        // así que esto termina en un par de vueltas como mucho.
        loop {
            let log = self
                .store
                .fetch_by_wamid(&update.wamid)
                .await?
                .ok_or_else(|| TrackerError::NotFound(update.wamid.clone()))?;

            if !MessageStatus::accepts(log.status, update.status) {
                log::debug!(
                    "[MESSAGE-STATUS] Descarto {} para wamid={} (actual {})",
                    update.status.as_str(),
                    truncate(&update.wamid),
                    log.status.as_str()
                );
                return Ok(log.status);
            }

            let (error_code, error_message) = match update.status {
                MessageStatus::Failed => {
                    let first = update.errors.as_deref().and_then(|e| e.first());
                    (
                        first.and_then(|e| e.code_string()),
                        first.and_then(|e| e.description()),
                    )
                }
                _ => (None, None),
            };

            let mutation = StatusMutation {
                status: update.status,
                timestamp: event_ts,
                error_code,
                error_message,
            };

            if self
                .store
                .compare_and_set_status(&update.wamid, log.status, &mutation)
                .await?
            {
                log::info!(
                    "[MESSAGE-STATUS] wamid={} {} -> {}",
                    truncate(&update.wamid),
                    log.status.as_str(),
                    update.status.as_str()
                );
                return Ok(update.status);
            }

            // Carrera con otra entrega del proveedor: reevaluar.
        }
    }
}
