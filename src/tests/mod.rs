//! tests/mod.rs

pub mod webhook_tests;
