//! services/message_formatter.rs
//! Plantilla del mensaje de WhatsApp para una asistencia.

use crate::errors::FormatError;
use crate::models::attendance_model::AttendanceRecord;

/// Arma el cuerpo del mensaje. Es puro: misma entrada, misma salida.
/// No asume que el registro fue validado.
pub fn format_attendance_message(record: &AttendanceRecord) -> Result<String, FormatError> {
    let missing: Vec<String> = [
        ("name", &record.name),
        ("company", &record.company),
        ("role", &record.role),
        ("timestamp", &record.timestamp),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(field, _)| field.to_string())
    .collect();

    if !missing.is_empty() {
        return Err(FormatError::MissingFields(missing));
    }

    Ok(format!(
        "📋 *Nueva Asistencia Registrada*\n\
         \n\
         👤 *Nombre:* {}\n\
         🏢 *Empresa:* {}\n\
         💼 *Cargo:* {}\n\
         📅 *Fecha/Hora:* {}\n\
         \n\
         ✅ Ingreso confirmado al evento",
        record.name, record.company, record.role, record.timestamp
    ))
}
