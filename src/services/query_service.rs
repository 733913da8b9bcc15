//! services/query_service.rs
//! Consultas de solo lectura sobre los registros de tracking.

use std::collections::HashMap;

use crate::models::error::TrackerError;
use crate::models::message_log_model::{
    normalize_digits, LogFilters, MessageLog, StatusSnapshot,
};
use crate::services::log_store::MessageLogStore;

/// Tope duro del listado. No hay cursor de paginación: quien necesite más
/// tiene que acotar los filtros.
pub const LIST_LIMIT: i64 = 50;

#[derive(Clone, Debug)]
pub struct QueryService {
    store: MessageLogStore,
}

impl QueryService {
    pub fn new(store: MessageLogStore) -> Self {
        QueryService { store }
    }

    /// Lookup en lote: wamid -> snapshot. Los wamid sin registro no
    /// aparecen en el mapa (nunca es error).
    pub async fn batch_lookup(
        &self,
        wamids: &[String],
    ) -> Result<HashMap<String, StatusSnapshot>, TrackerError> {
        if wamids.is_empty() {
            return Ok(HashMap::new());
        }

        let logs = self.store.fetch_many(wamids).await?;
        let mut statuses = HashMap::with_capacity(logs.len());
        for log in &logs {
            statuses.insert(log.wamid.clone(), StatusSnapshot::from(log));
        }
        Ok(statuses)
    }

    /// Listado filtrado, más recientes primero, máximo `LIST_LIMIT` filas.
    pub async fn list_logs(&self, filters: &LogFilters) -> Result<Vec<MessageLog>, TrackerError> {
        // El teléfono se filtra por sufijo de los últimos 10 dígitos,
        // igual que hace el resto del sistema con recipient_id.
        let suffix = filters.recipient_id.as_deref().map(|raw| {
            let digits = normalize_digits(raw);
            let start = digits.len().saturating_sub(10);
            digits[start..].to_string()
        });

        self.store.list(filters, suffix, LIST_LIMIT).await
    }

    /// Registro más reciente correlacionado a una registration, o None.
    pub async fn latest_for_registration(
        &self,
        registration_id: &str,
    ) -> Result<Option<MessageLog>, TrackerError> {
        self.store.latest_for_registration(registration_id).await
    }
}
