//! services/mod.rs
//! Módulo que agrupa distintos "servicios" o "capas de negocio" de la app.

pub mod dispatch_service;
pub mod message_formatter;
pub mod rate_limiter;
pub mod validation_service;
pub mod whatsapp_transport;
