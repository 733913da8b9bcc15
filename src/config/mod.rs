//! config/mod.rs

pub mod tracker_config;
