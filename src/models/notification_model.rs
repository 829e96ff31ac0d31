//! models/notification_model.rs
//! Resultados de un envío masivo (un mensaje, varios destinatarios).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Porcentaje mínimo de envíos exitosos para considerar el lote exitoso.
pub const DEFAULT_MIN_SUCCESS_RATE: f64 = 50.0;

/// Política de éxito parcial del lote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuccessPolicy {
    pub min_success_rate_percent: f64,
}

impl Default for SuccessPolicy {
    fn default() -> Self {
        Self {
            min_success_rate_percent: DEFAULT_MIN_SUCCESS_RATE,
        }
    }
}

impl SuccessPolicy {
    /// Cero éxitos es siempre un fallo, sin importar el umbral.
    pub fn is_overall_success(&self, success_count: usize, success_rate_percent: f64) -> bool {
        success_count > 0 && success_rate_percent >= self.min_success_rate_percent
    }
}

/// Resultado de un intento de envío a un destinatario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub recipient: String,
    pub succeeded: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl DeliveryOutcome {
    pub fn success(recipient: &str, message_id: String) -> Self {
        Self {
            recipient: recipient.to_string(),
            succeeded: true,
            message_id: Some(message_id),
            error: None,
        }
    }

    pub fn failure(recipient: &str, error: impl Into<String>) -> Self {
        Self {
            recipient: recipient.to_string(),
            succeeded: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

/// Agregado de una llamada a `dispatch`. Nunca se persiste.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub dispatch_id: Uuid,
    pub total_recipients: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub success_rate_percent: f64,
    pub successes: Vec<DeliveryOutcome>,
    pub failures: Vec<DeliveryOutcome>,
    pub has_photo: bool,
    pub photo_url: Option<String>,
    pub overall_success: bool,
}

impl BatchResult {
    /// Arma el resultado a partir de los intentos, en el orden recibido.
    pub fn from_outcomes(
        dispatch_id: Uuid,
        outcomes: Vec<DeliveryOutcome>,
        photo_url: Option<String>,
        policy: &SuccessPolicy,
    ) -> Self {
        let total_recipients = outcomes.len();
        let (successes, failures): (Vec<_>, Vec<_>) =
            outcomes.into_iter().partition(|o| o.succeeded);

        let success_count = successes.len();
        let failure_count = failures.len();
        let success_rate_percent = if total_recipients == 0 {
            0.0
        } else {
            success_count as f64 / total_recipients as f64 * 100.0
        };

        Self {
            dispatch_id,
            total_recipients,
            success_count,
            failure_count,
            success_rate_percent,
            successes,
            failures,
            has_photo: photo_url.is_some(),
            photo_url,
            overall_success: policy.is_overall_success(success_count, success_rate_percent),
        }
    }
}
