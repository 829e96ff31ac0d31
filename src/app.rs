//! app.rs
use actix_web::{error::JsonPayloadError, web};

use crate::errors::ApiError;
use crate::handlers::{health_handler, webhook_handler};

pub fn init_app(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(health_handler::root_endpoint))
        .route("/health", web::get().to(health_handler::health_endpoint))
        .service(
            web::resource("/attendance-webhook")
                .route(web::post().to(webhook_handler::attendance_webhook_endpoint))
                .route(web::get().to(webhook_handler::webhook_verification_endpoint)),
        );
}

/// Extractor JSON con límite de tamaño y errores en el mismo formato que el
/// resto de la API.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            log::warn!("(json_config) Payload rechazado: {}", err);
            let api_error = match err {
                JsonPayloadError::ContentType => {
                    ApiError::InvalidJson("Content-Type must be application/json".to_string())
                }
                JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
                    ApiError::PayloadTooLarge
                }
                _ => ApiError::InvalidJson("Request body must contain valid JSON".to_string()),
            };
            api_error.into()
        })
}
