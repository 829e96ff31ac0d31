//! models/attendance_model.rs
//! Registro de asistencia ya validado.

use serde::{Deserialize, Serialize};

/// Un check-in validado. Sólo `validation_service` construye instancias a
/// partir de JSON externo; el despachador nunca ve datos sin validar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub name: String,
    pub company: String,
    pub role: String,
    /// Formato `YYYY-MM-DD HH:MM:SS` o `DD/MM/YYYY HH:MM`, tal cual llegó.
    pub timestamp: String,
    /// URL http(s) de la foto, si la hay.
    pub photo: Option<String>,
}

impl AttendanceRecord {
    pub fn has_photo(&self) -> bool {
        self.photo.as_deref().map(|p| !p.is_empty()).unwrap_or(false)
    }
}
