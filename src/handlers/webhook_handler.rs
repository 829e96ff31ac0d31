//! handlers/webhook_handler.rs
//! Endpoints del webhook de asistencias.

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::{Map, Value};

use crate::{
    config::app_config::WhatsAppConfig,
    errors::ApiError,
    models::webhook_model::{AttendanceNotificationData, VerifyQuery, WebhookResponse},
    services::{
        dispatch_service::DispatchService, rate_limiter::RateLimiter,
        validation_service::validate_attendance,
    },
};

/// Claves que nunca se escriben en el log.
const SENSITIVE_KEYS: [&str; 4] = ["phone", "email", "id", "token"];

/// POST /attendance-webhook
pub async fn attendance_webhook_endpoint(
    req: HttpRequest,
    body: web::Json<Value>,
    dispatch_service: web::Data<DispatchService>,
    rate_limiter: web::Data<RateLimiter>,
) -> Result<HttpResponse, ApiError> {
    // Sólo la IP del socket: los headers de proxy los controla el cliente
    let client = req
        .peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    log::info!(
        "(attendance_webhook) Request de asistencia recibido desde {}",
        client
    );

    if !rate_limiter.check(&client) {
        return Err(ApiError::RateLimited);
    }

    let payload = body.into_inner();
    log::debug!(
        "(attendance_webhook) Payload recibido: {}",
        sanitize_log_data(&payload)
    );

    // 1) Validar antes de cualquier llamada de red
    let record = validate_attendance(&payload).map_err(|e| {
        log::warn!("(attendance_webhook) Validación fallida: {}", e);
        ApiError::from(e)
    })?;

    // 2) Envío masivo a la lista configurada
    let batch = dispatch_service.dispatch(&record, None).await?;
    let data = AttendanceNotificationData::from_batch(&record, &batch);

    if batch.overall_success {
        let photo_status = if batch.has_photo { " with photo" } else { "" };
        log::info!(
            "(attendance_webhook) Asistencia de '{}' ({}) notificada{} a {}/{} destinatarios",
            record.name,
            record.company,
            photo_status,
            batch.success_count,
            batch.total_recipients
        );
        Ok(HttpResponse::Ok().json(WebhookResponse {
            success: true,
            error: None,
            message: format!(
                "Attendance notification sent to {}/{} recipients",
                batch.success_count, batch.total_recipients
            ),
            data,
        }))
    } else {
        log::error!(
            "(attendance_webhook) Lote fallido para '{}': {}/{} exitosos",
            record.name,
            batch.success_count,
            batch.total_recipients
        );
        Ok(HttpResponse::InternalServerError().json(WebhookResponse {
            success: false,
            error: Some("Notification failed".to_string()),
            message: format!(
                "Failed to send WhatsApp notification: only {}/{} recipients reached ({:.2}%)",
                batch.success_count, batch.total_recipients, batch.success_rate_percent
            ),
            data,
        }))
    }
}

/// GET /attendance-webhook?hub.mode=subscribe&hub.verify_token=...&hub.challenge=...
pub async fn webhook_verification_endpoint(
    query: web::Query<VerifyQuery>,
    whatsapp_config: web::Data<WhatsAppConfig>,
) -> HttpResponse {
    let query = query.into_inner();
    let token_matches =
        query.verify_token.as_deref() == Some(whatsapp_config.verify_token.as_str());

    if query.mode.as_deref() == Some("subscribe") && token_matches {
        log::info!("(webhook_verification) Verificación exitosa");
        HttpResponse::Ok()
            .content_type("text/plain")
            .body(query.challenge.unwrap_or_default())
    } else {
        log::warn!(
            "(webhook_verification) Verificación fallida. mode={:?}, token_match={}",
            query.mode,
            token_matches
        );
        HttpResponse::Forbidden()
            .content_type("text/plain")
            .body("Verification failed")
    }
}

/// Copia del payload con las claves sensibles redactadas.
pub fn sanitize_log_data(payload: &Value) -> Value {
    match payload {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let lower = key.to_lowercase();
                    if SENSITIVE_KEYS.iter().any(|s| lower.contains(s)) {
                        (key.clone(), Value::String("[REDACTED]".to_string()))
                    } else {
                        (key.clone(), value.clone())
                    }
                })
                .collect::<Map<String, Value>>(),
        ),
        other => other.clone(),
    }
}
