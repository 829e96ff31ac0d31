//! models/webhook_model.rs
//! Cuerpos de request/response del webhook de asistencias.

use chrono::Local;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::recipients::mask_recipient;
use crate::models::{attendance_model::AttendanceRecord, notification_model::BatchResult};

/// Query de verificación que envía Meta al registrar el webhook.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub total_recipients: usize,
    pub successful_sends: usize,
    pub failed_sends: usize,
    /// Porcentaje redondeado a dos decimales.
    pub success_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedRecipient {
    pub recipient: String,
    pub error: Option<String>,
}

/// Detalle del lote tal como se expone al cliente (números enmascarados).
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceNotificationData {
    pub dispatch_id: Uuid,
    pub employee_name: String,
    pub company: String,
    pub timestamp: String,
    pub message_id: Option<String>,
    pub has_photo: bool,
    pub photo_url: Option<String>,
    pub batch_results: BatchSummary,
    pub successful_numbers: Vec<String>,
    pub failed_numbers: Vec<FailedRecipient>,
}

impl AttendanceNotificationData {
    pub fn from_batch(record: &AttendanceRecord, batch: &BatchResult) -> Self {
        Self {
            dispatch_id: batch.dispatch_id,
            employee_name: record.name.clone(),
            company: record.company.clone(),
            timestamp: Local::now().to_rfc3339(),
            message_id: batch.successes.first().and_then(|o| o.message_id.clone()),
            has_photo: batch.has_photo,
            photo_url: batch.photo_url.clone(),
            batch_results: BatchSummary {
                total_recipients: batch.total_recipients,
                successful_sends: batch.success_count,
                failed_sends: batch.failure_count,
                success_rate: (batch.success_rate_percent * 100.0).round() / 100.0,
            },
            successful_numbers: batch
                .successes
                .iter()
                .map(|o| mask_recipient(&o.recipient))
                .collect(),
            failed_numbers: batch
                .failures
                .iter()
                .map(|o| FailedRecipient {
                    recipient: mask_recipient(&o.recipient),
                    error: o.error.clone(),
                })
                .collect(),
        }
    }
}

/// Respuesta del POST /attendance-webhook.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub message: String,
    pub data: AttendanceNotificationData,
}

/// Estado del servicio para /health.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub service: String,
    pub status: String,
    pub transport: String,
    pub recipient_count: usize,
    pub masked_recipients: Vec<String>,
    pub debug_mode: bool,
    pub timestamp: String,
}
