//! services/mod.rs
//! Módulo que agrupa distintos "servicios" o "capas de negocio" de la app.

pub mod log_store;
pub mod query_service;
pub mod send_tracker_service;
pub mod status_service;
