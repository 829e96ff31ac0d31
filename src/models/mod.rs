//! models/mod.rs
//! Módulo raíz para modelos/estructuras compartidas.

pub mod attendance_model;
pub mod notification_model;
pub mod webhook_model;
