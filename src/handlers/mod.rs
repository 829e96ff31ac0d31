//! handlers/mod.rs
pub mod health_handler;
pub mod webhook_handler;
