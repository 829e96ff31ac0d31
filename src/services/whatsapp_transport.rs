//! services/whatsapp_transport.rs
//! Cliente de la WhatsApp Cloud API y el trait que usa el despachador.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::app_config::WhatsAppConfig;
use crate::errors::TransportError;

/// Envío de mensajes a una dirección. Devuelve la respuesta cruda del
/// proveedor; clasificarla es trabajo del despachador.
#[async_trait]
pub trait MessagingTransport: Send + Sync {
    async fn send_text(&self, body: &str, recipient: &str) -> Result<Value, TransportError>;

    async fn send_image(
        &self,
        image_url: &str,
        recipient: &str,
        caption: &str,
    ) -> Result<Value, TransportError>;

    /// Comprobación previa a un lote. Por defecto no hace nada.
    async fn ensure_ready(&self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Timeout de cada envío individual.
    fn send_timeout(&self) -> Duration {
        Duration::from_secs(30)
    }

    fn name(&self) -> &'static str;
}

#[derive(Clone)]
pub struct WhatsAppCloudClient {
    http_client: Client,
    messages_url: String,
    token: String,
    phone_number_id: String,
    timeout: Duration,
}

impl WhatsAppCloudClient {
    pub fn new(config: &WhatsAppConfig, timeout: Duration) -> Result<Self, TransportError> {
        let http_client = Client::builder().timeout(timeout).build()?;
        let messages_url = format!(
            "{}/{}/{}/messages",
            config.api_url.trim_end_matches('/'),
            config.api_version,
            config.phone_number_id
        );
        log::info!(
            "(WhatsAppCloudClient::new) Cliente inicializado, endpoint={}",
            messages_url
        );
        Ok(Self {
            http_client,
            messages_url,
            token: config.token.clone(),
            phone_number_id: config.phone_number_id.clone(),
            timeout,
        })
    }

    fn request_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(self.timeout.as_secs())
        } else {
            TransportError::Http(e)
        }
    }

    async fn post_message(&self, payload: Value) -> Result<Value, TransportError> {
        let resp = self
            .http_client
            .post(&self.messages_url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = resp.status();
        let body_txt = resp.text().await.map_err(|e| self.request_error(e))?;
        log::debug!("(post_message) status={}, body='{}'", status, body_txt);

        if !status.is_success() {
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                message: provider_error_message(&body_txt),
            });
        }

        serde_json::from_str(&body_txt)
            .map_err(|_| TransportError::UnexpectedResponse(body_txt))
    }
}

#[async_trait]
impl MessagingTransport for WhatsAppCloudClient {
    async fn send_text(&self, body: &str, recipient: &str) -> Result<Value, TransportError> {
        let payload = json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": recipient,
            "type": "text",
            "text": { "preview_url": true, "body": body }
        });
        self.post_message(payload).await
    }

    async fn send_image(
        &self,
        image_url: &str,
        recipient: &str,
        caption: &str,
    ) -> Result<Value, TransportError> {
        let payload = json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": recipient,
            "type": "image",
            "image": { "link": image_url, "caption": caption }
        });
        self.post_message(payload).await
    }

    async fn ensure_ready(&self) -> Result<(), TransportError> {
        if self.token.is_empty() || self.phone_number_id.is_empty() {
            return Err(TransportError::Unavailable(
                "WhatsApp token or phone number id not configured".to_string(),
            ));
        }
        Ok(())
    }

    fn send_timeout(&self) -> Duration {
        self.timeout
    }

    fn name(&self) -> &'static str {
        "whatsapp_cloud"
    }
}

/// Extrae `error.message` del cuerpo de error de Graph API si existe.
fn provider_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}
