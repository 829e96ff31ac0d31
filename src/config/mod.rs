//! config/mod.rs
//! Configuración del proceso: variables de entorno y lista de destinatarios.

pub mod app_config;
pub mod recipients;
