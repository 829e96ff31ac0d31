//! errors.rs
//! Taxonomía de errores del servicio y su traducción a respuestas HTTP.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Errores del validador de asistencias. El `Display` es el mensaje exacto
/// que se devuelve al cliente del webhook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Attendance data must be a mapping (JSON object)")]
    NotAMapping,

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Empty required fields: {}", .0.join(", "))]
    EmptyFields(Vec<String>),

    #[error("Invalid field types, expected strings for: {}", .0.join(", "))]
    InvalidFieldTypes(Vec<String>),

    #[error("Invalid date format. Expected 'YYYY-MM-DD HH:MM:SS' or 'DD/MM/YYYY HH:MM'")]
    InvalidTimestamp,

    #[error("Field '{field}' exceeds maximum length of {max} characters")]
    FieldTooLong { field: String, max: usize },

    #[error("Photo field must be a valid URL starting with http:// or https://")]
    InvalidPhotoScheme,

    #[error("Photo URL exceeds maximum length of {max} characters")]
    PhotoUrlTooLong { max: usize },
}

/// El formateador vuelve a comprobar los campos obligatorios.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
}

/// Fallo de un envío individual (un destinatario).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider rejected the message (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected provider response: {0}")]
    UnexpectedResponse(String),

    #[error("messaging service unavailable: {0}")]
    Unavailable(String),
}

/// Fallos que ocurren antes de intentar cualquier destinatario.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("No recipients configured: the recipient list is empty")]
    NoRecipients,

    #[error("Could not format attendance message: {0}")]
    Format(#[from] FormatError),

    #[error("WhatsApp service is currently unavailable: {0}")]
    TransportUnavailable(String),
}

/// Errores que cruzan la frontera HTTP.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    InvalidJson(String),

    #[error("The request payload is too large")]
    PayloadTooLarge,

    #[error("Too many requests. Please try again later.")]
    RateLimited,

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl ApiError {
    /// Etiqueta corta para el campo `error` de la respuesta.
    pub fn label(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "Validation error",
            ApiError::InvalidJson(_) => "Invalid JSON",
            ApiError::PayloadTooLarge => "Payload Too Large",
            ApiError::RateLimited => "Rate Limit Exceeded",
            ApiError::Dispatch(DispatchError::TransportUnavailable(_)) => "Service Unavailable",
            ApiError::Dispatch(_) => "Dispatch error",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Dispatch(DispatchError::TransportUnavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Dispatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": self.label(),
            "message": self.to_string()
        }))
    }
}
