//! models/error.rs
//! Taxonomía de errores del tracker.

use thiserror::Error;

/// Errores que pueden salir de los servicios de tracking.
///
/// Solo `Storage` se propaga como fallo HTTP real; `Validation` es un 400
/// y `NotFound` se registra y se ignora a nivel de webhook (ver handlers).
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("no tracking record for wamid {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Fila persistida que no se pudo decodificar (status o timestamp inválido).
    #[error("corrupt tracking record: {0}")]
    Corrupt(String),
}
