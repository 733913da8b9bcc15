//! models/mod.rs
//! Módulo raíz para modelos/estructuras compartidas.

pub mod error;
pub mod message_log_model;
