//! services/validation_service.rs
//! Validación del payload del webhook antes de cualquier llamada de red.

use chrono::NaiveDateTime;
use serde_json::{Map, Value};

use crate::errors::ValidationError;
use crate::models::attendance_model::AttendanceRecord;

/// Mensaje asociado a un payload válido.
#[cfg(test)]
pub const VALID_MESSAGE: &str = "Valid";

pub const REQUIRED_FIELDS: [&str; 4] = ["name", "company", "role", "timestamp"];
pub const PHOTO_FIELD: &str = "photo";

pub const MAX_FIELD_LENGTH: usize = 100;
pub const MAX_PHOTO_URL_LENGTH: usize = 2000;

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%d/%m/%Y %H:%M"];
const IMAGE_EXTENSIONS: [&str; 6] = [".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp"];

/// Valida el payload y, si todo está bien, construye el registro tipado.
/// Cada rama de error lleva un mensaje específico.
pub fn validate_attendance(payload: &Value) -> Result<AttendanceRecord, ValidationError> {
    let data = payload.as_object().ok_or(ValidationError::NotAMapping)?;

    // 1) Presencia: primero claves ausentes, luego vacías
    let mut missing = vec![];
    let mut empty = vec![];
    let mut wrong_type = vec![];
    for field in REQUIRED_FIELDS {
        match data.get(field) {
            None => missing.push(field.to_string()),
            Some(Value::Null) => empty.push(field.to_string()),
            Some(Value::String(s)) if s.trim().is_empty() => empty.push(field.to_string()),
            Some(Value::String(_)) => {}
            Some(_) => wrong_type.push(field.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }
    if !empty.is_empty() {
        return Err(ValidationError::EmptyFields(empty));
    }
    if !wrong_type.is_empty() {
        return Err(ValidationError::InvalidFieldTypes(wrong_type));
    }

    let name = text_field(data, "name");
    let company = text_field(data, "company");
    let role = text_field(data, "role");
    let timestamp = text_field(data, "timestamp");

    // 2) Fecha/hora en alguno de los dos formatos aceptados
    if !is_valid_timestamp(&timestamp) {
        return Err(ValidationError::InvalidTimestamp);
    }

    // 3) Longitudes, en orden fijo; gana el primero
    for (field, value) in [("name", &name), ("company", &company), ("role", &role)] {
        if value.chars().count() > MAX_FIELD_LENGTH {
            return Err(ValidationError::FieldTooLong {
                field: field.to_string(),
                max: MAX_FIELD_LENGTH,
            });
        }
    }

    // 4) Foto opcional
    let photo = validate_photo(data.get(PHOTO_FIELD))?;

    Ok(AttendanceRecord {
        name,
        company,
        role,
        timestamp,
        photo,
    })
}

/// Versión `(ok, mensaje)` para quien sólo necesita el veredicto.
#[cfg(test)]
pub fn check_attendance(payload: &Value) -> (bool, String) {
    match validate_attendance(payload) {
        Ok(_) => (true, VALID_MESSAGE.to_string()),
        Err(e) => (false, e.to_string()),
    }
}

pub fn is_valid_timestamp(raw: &str) -> bool {
    TIMESTAMP_FORMATS
        .iter()
        .any(|fmt| NaiveDateTime::parse_from_str(raw, fmt).is_ok())
}

fn text_field(data: &Map<String, Value>, field: &str) -> String {
    data.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn validate_photo(value: Option<&Value>) -> Result<Option<String>, ValidationError> {
    // Sólo se ignoran valores vacíos de verdad; "   " sí se valida
    let url = match value {
        None => return Ok(None),
        Some(v) if is_blank_value(v) => return Ok(None),
        Some(Value::String(s)) => s.trim(),
        Some(_) => return Err(ValidationError::InvalidPhotoScheme),
    };

    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ValidationError::InvalidPhotoScheme);
    }
    if url.chars().count() > MAX_PHOTO_URL_LENGTH {
        return Err(ValidationError::PhotoUrlTooLong {
            max: MAX_PHOTO_URL_LENGTH,
        });
    }

    // Algunos servicios no exponen extensión: sólo se advierte
    let lower = url.to_lowercase();
    if !IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        log::warn!(
            "(validate_photo) La URL de la foto no tiene una extensión de imagen conocida: {}",
            url
        );
    }

    Ok(Some(url.to_string()))
}

/// `null`, `false`, `0`, `""`, `[]` y `{}` cuentan como foto ausente.
fn is_blank_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
