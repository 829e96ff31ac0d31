//! services/dispatch_service.rs
//! Envío masivo: un registro de asistencia, N destinatarios, un resultado.

use chrono::Local;
use futures::{stream, FutureExt, StreamExt};
use serde_json::Value;
use std::{panic::AssertUnwindSafe, sync::Arc, time::Duration};
use uuid::Uuid;

use crate::{
    config::recipients::{mask_recipient, RecipientList},
    errors::{DispatchError, TransportError},
    models::{
        attendance_model::AttendanceRecord,
        notification_model::{BatchResult, DeliveryOutcome, SuccessPolicy},
        webhook_model::ServiceStatus,
    },
    services::{
        message_formatter::format_attendance_message, whatsapp_transport::MessagingTransport,
    },
};

/// Envíos simultáneos por defecto dentro de un lote.
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

#[derive(Clone)]
pub struct DispatchService {
    transport: Arc<dyn MessagingTransport>,
    recipients: RecipientList,
    policy: SuccessPolicy,
    max_concurrency: usize,
    debug_mode: bool,
}

impl DispatchService {
    pub fn new(transport: Arc<dyn MessagingTransport>, recipients: RecipientList) -> Self {
        Self {
            transport,
            recipients,
            policy: SuccessPolicy::default(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            debug_mode: false,
        }
    }

    pub fn with_policy(mut self, policy: SuccessPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_debug_mode(mut self, debug_mode: bool) -> Self {
        self.debug_mode = debug_mode;
        self
    }

    /// Envía la asistencia a `recipients` o, si viene vacío o ausente, a la
    /// lista del proceso. Cada destinatario recibe exactamente un intento y un
    /// fallo individual nunca corta el lote.
    pub async fn dispatch(
        &self,
        record: &AttendanceRecord,
        recipients: Option<&[String]>,
    ) -> Result<BatchResult, DispatchError> {
        let dispatch_id = Uuid::new_v4();
        let targets: &[String] = match recipients {
            Some(list) if !list.is_empty() => list,
            _ => self.recipients.as_slice(),
        };

        if targets.is_empty() {
            log::error!("(dispatch) [{}] Lista de destinatarios vacía", dispatch_id);
            return Err(DispatchError::NoRecipients);
        }

        log::info!(
            "(dispatch) [{}] Iniciando envío de asistencia de '{}' a {} destinatarios via {}...",
            dispatch_id,
            record.name,
            targets.len(),
            self.transport.name()
        );

        // 1) Verificar el transporte antes de tocar a nadie
        self.transport.ensure_ready().await.map_err(|e| {
            log::error!("(dispatch) [{}] Transporte no disponible: {}", dispatch_id, e);
            DispatchError::TransportUnavailable(e.to_string())
        })?;

        // 2) El mensaje se arma una sola vez para todo el lote
        let message = format_attendance_message(record)?;
        let photo = if record.has_photo() {
            record.photo.clone()
        } else {
            None
        };
        let timeout = self.transport.send_timeout();

        // 3) Envíos concurrentes acotados; `buffered` conserva el orden
        let outcomes: Vec<DeliveryOutcome> = stream::iter(targets)
            .map(|recipient| {
                self.send_one(dispatch_id, recipient, &message, photo.as_deref(), timeout)
            })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        // 4) Agregar
        let result = BatchResult::from_outcomes(dispatch_id, outcomes, photo, &self.policy);
        log::info!(
            "(dispatch) [{}] Finalizado: {}/{} exitosos ({:.1}%), overall_success={}",
            dispatch_id,
            result.success_count,
            result.total_recipients,
            result.success_rate_percent,
            result.overall_success
        );
        Ok(result)
    }

    async fn send_one(
        &self,
        dispatch_id: Uuid,
        recipient: &str,
        message: &str,
        photo: Option<&str>,
        timeout: Duration,
    ) -> DeliveryOutcome {
        let masked = mask_recipient(recipient);
        let attempt = async {
            match photo {
                Some(url) => {
                    log::info!("(send_one) [{}] -> Imagen + caption a {}", dispatch_id, masked);
                    self.transport
                        .send_image(url, strip_address_prefix(recipient), message)
                        .await
                }
                None => {
                    log::info!("(send_one) [{}] -> Texto a {}", dispatch_id, masked);
                    self.transport.send_text(message, recipient).await
                }
            }
        };

        let guarded = AssertUnwindSafe(tokio::time::timeout(timeout, attempt)).catch_unwind();
        let outcome = match guarded.await {
            Ok(Ok(Ok(response))) => match acknowledged_message_id(&response) {
                Some(message_id) => DeliveryOutcome::success(recipient, message_id),
                None => DeliveryOutcome::failure(
                    recipient,
                    TransportError::UnexpectedResponse(response.to_string()).to_string(),
                ),
            },
            Ok(Ok(Err(e))) => DeliveryOutcome::failure(recipient, e.to_string()),
            Ok(Err(_elapsed)) => DeliveryOutcome::failure(
                recipient,
                TransportError::Timeout(timeout.as_secs()).to_string(),
            ),
            Err(_panic) => DeliveryOutcome::failure(recipient, "transport call panicked"),
        };

        if outcome.succeeded {
            log::info!(
                "(send_one) [{}] -> {} OK, message_id={:?}",
                dispatch_id,
                masked,
                outcome.message_id
            );
        } else {
            log::error!(
                "(send_one) [{}] -> Fallo al enviar a {}: {}",
                dispatch_id,
                masked,
                outcome.error.as_deref().unwrap_or_default()
            );
        }
        outcome
    }

    /// Estado para el health-check; los números salen enmascarados.
    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            service: "WhatsApp Attendance Notifier".to_string(),
            status: "active".to_string(),
            transport: self.transport.name().to_string(),
            recipient_count: self.recipients.len(),
            masked_recipients: self.recipients.masked(),
            debug_mode: self.debug_mode,
            timestamp: Local::now().to_rfc3339(),
        }
    }
}

/// Un envío es exitoso sólo si la respuesta trae `messages` con algún `id`.
pub fn acknowledged_message_id(response: &Value) -> Option<String> {
    response
        .get("messages")?
        .as_array()?
        .iter()
        .find_map(|m| m.get("id").and_then(Value::as_str).map(str::to_string))
}

/// Quita la puntuación inicial (`+`, etc.) que la API de imágenes no acepta.
fn strip_address_prefix(recipient: &str) -> &str {
    recipient.trim_start_matches(|c: char| c.is_ascii_punctuation())
}
