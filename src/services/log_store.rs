//! services/log_store.rs
//! Capa de persistencia de los registros de tracking (SQLite vía sqlx).
//!
//! Toda mutación de estado pasa por `compare_and_set_status`: un UPDATE
//! condicionado al status observado, para que entregas concurrentes del
//! proveedor no se pisen entre sí. No hay locking entre registros.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite};

use crate::models::error::TrackerError;
use crate::models::message_log_model::{LogFilters, MessageLog, MessageLogRow, MessageStatus};

const COLUMNS: &str = "id, wamid, recipient_id, status, template_name, flow_type, \
     message_type, event_id, registration_id, guest_id, guest_name, \
     sent_at, delivered_at, read_at, failed_at, error_code, error_message, created_at";

/// Mutación que el reconciler quiere aplicar sobre un registro.
/// El timestamp solo se escribe si la columna correspondiente sigue NULL
/// (COALESCE en el SQL): cada `*_at` se fija una única vez.
#[derive(Debug, Clone)]
pub struct StatusMutation {
    pub status: MessageStatus,
    pub timestamp: DateTime<Utc>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Clone, Debug)]
pub struct MessageLogStore {
    db_pool: Pool<Sqlite>,
}

impl MessageLogStore {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        MessageLogStore { db_pool }
    }

    /// Corre migraciones con sqlx
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db_pool)
            .await
            .context("Fallo al correr migraciones de message_logs")?;
        Ok(())
    }

    /// Inserta un registro nuevo; si el wamid ya existe no toca nada y
    /// devuelve el id del registro existente. Devuelve (id, created).
    pub async fn insert_if_absent(&self, log: &MessageLog) -> Result<(String, bool), TrackerError> {
        let result = sqlx::query(
            r#"
            INSERT INTO message_logs (
                id, wamid, recipient_id, status, template_name, flow_type,
                message_type, event_id, registration_id, guest_id, guest_name,
                sent_at, delivered_at, read_at, failed_at,
                error_code, error_message, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(wamid) DO NOTHING
            "#,
        )
        .bind(&log.id)
        .bind(&log.wamid)
        .bind(&log.recipient_id)
        .bind(log.status.as_str())
        .bind(&log.template_name)
        .bind(&log.flow_type)
        .bind(&log.message_type)
        .bind(&log.event_id)
        .bind(&log.registration_id)
        .bind(&log.guest_id)
        .bind(&log.guest_name)
        .bind(log.sent_at.map(|t| t.to_rfc3339()))
        .bind(log.delivered_at.map(|t| t.to_rfc3339()))
        .bind(log.read_at.map(|t| t.to_rfc3339()))
        .bind(log.failed_at.map(|t| t.to_rfc3339()))
        .bind(&log.error_code)
        .bind(&log.error_message)
        .bind(log.created_at.to_rfc3339())
        .execute(&self.db_pool)
        .await?;

        let created = result.rows_affected() > 0;
        if created {
            return Ok((log.id.clone(), true));
        }

        // Conflicto: devolvemos el id del registro ya existente.
        let existing: (String,) = sqlx::query_as("SELECT id FROM message_logs WHERE wamid = ?")
            .bind(&log.wamid)
            .fetch_one(&self.db_pool)
            .await?;
        Ok((existing.0, false))
    }

    pub async fn fetch_by_wamid(&self, wamid: &str) -> Result<Option<MessageLog>, TrackerError> {
        let sql = format!("SELECT {COLUMNS} FROM message_logs WHERE wamid = ?");
        let row = sqlx::query_as::<_, MessageLogRow>(&sql)
            .bind(wamid)
            .fetch_optional(&self.db_pool)
            .await?;

        row.map(MessageLog::try_from).transpose()
    }

    /// Compare-and-set: aplica la mutación solo si el registro sigue en el
    /// status `expected`. Devuelve false si otro handler ganó la carrera
    /// (el caller relee y reevalúa).
    pub async fn compare_and_set_status(
        &self,
        wamid: &str,
        expected: MessageStatus,
        mutation: &StatusMutation,
    ) -> Result<bool, TrackerError> {
        let ts = mutation.timestamp.to_rfc3339();

        let result = match mutation.status {
            MessageStatus::Failed => {
                sqlx::query(
                    r#"
                    UPDATE message_logs
                    SET status = ?,
                        failed_at = COALESCE(failed_at, ?),
                        error_code = COALESCE(error_code, ?),
                        error_message = COALESCE(error_message, ?)
                    WHERE wamid = ? AND status = ?
                    "#,
                )
                .bind(mutation.status.as_str())
                .bind(&ts)
                .bind(&mutation.error_code)
                .bind(&mutation.error_message)
                .bind(wamid)
                .bind(expected.as_str())
                .execute(&self.db_pool)
                .await?
            }
            other => {
                let column = match other {
                    MessageStatus::Sent => "sent_at",
                    MessageStatus::Delivered => "delivered_at",
                    MessageStatus::Read => "read_at",
                    MessageStatus::Failed => unreachable!(),
                };
                let sql = format!(
                    "UPDATE message_logs \
                     SET status = ?, {column} = COALESCE({column}, ?) \
                     WHERE wamid = ? AND status = ?"
                );
                sqlx::query(&sql)
                    .bind(mutation.status.as_str())
                    .bind(&ts)
                    .bind(wamid)
                    .bind(expected.as_str())
                    .execute(&self.db_pool)
                    .await?
            }
        };

        Ok(result.rows_affected() > 0)
    }

    /// Trae los registros cuyos wamid estén en la lista (los que no existen
    /// simplemente no aparecen).
    pub async fn fetch_many(&self, wamids: &[String]) -> Result<Vec<MessageLog>, TrackerError> {
        if wamids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; wamids.len()].join(", ");
        let sql = format!("SELECT {COLUMNS} FROM message_logs WHERE wamid IN ({placeholders})");

        let mut query = sqlx::query_as::<_, MessageLogRow>(&sql);
        for wamid in wamids {
            query = query.bind(wamid);
        }
        let rows = query.fetch_all(&self.db_pool).await?;

        rows.into_iter().map(MessageLog::try_from).collect()
    }

    /// Listado filtrado, más recientes primero, con tope duro de filas.
    /// `recipient_suffix` se compara por sufijo (últimos dígitos) porque
    /// los teléfonos llegan con y sin prefijo de país.
    pub async fn list(
        &self,
        filters: &LogFilters,
        recipient_suffix: Option<String>,
        limit: i64,
    ) -> Result<Vec<MessageLog>, TrackerError> {
        let sql = format!(
            r#"
            SELECT {COLUMNS} FROM message_logs
            WHERE (?1 IS NULL OR registration_id = ?1)
              AND (?2 IS NULL OR event_id = ?2)
              AND (?3 IS NULL OR guest_id = ?3)
              AND (?4 IS NULL OR recipient_id LIKE ?4)
              AND (?5 IS NULL OR template_name = ?5)
              AND (?6 = 0 OR (event_id IS NULL AND registration_id IS NULL AND guest_id IS NULL))
            ORDER BY created_at DESC
            LIMIT ?7
            "#
        );

        let like = recipient_suffix.map(|s| format!("%{s}"));
        let rows = sqlx::query_as::<_, MessageLogRow>(&sql)
            .bind(&filters.registration_id)
            .bind(&filters.event_id)
            .bind(&filters.guest_id)
            .bind(like)
            .bind(&filters.template_name)
            .bind(filters.standalone as i64)
            .bind(limit)
            .fetch_all(&self.db_pool)
            .await?;

        rows.into_iter().map(MessageLog::try_from).collect()
    }

    pub async fn latest_for_registration(
        &self,
        registration_id: &str,
    ) -> Result<Option<MessageLog>, TrackerError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM message_logs \
             WHERE registration_id = ? \
             ORDER BY created_at DESC \
             LIMIT 1"
        );
        let row = sqlx::query_as::<_, MessageLogRow>(&sql)
            .bind(registration_id)
            .fetch_optional(&self.db_pool)
            .await?;

        row.map(MessageLog::try_from).transpose()
    }
}
