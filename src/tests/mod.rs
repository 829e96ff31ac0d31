//! tests/mod.rs
//! Pruebas unitarias y de integración HTTP, más un transporte falso.

mod dispatch_tests;

use async_trait::async_trait;
use serde_json::{json, Value};
use std::{collections::HashMap, sync::Mutex, time::Duration};

use crate::errors::TransportError;
use crate::models::attendance_model::AttendanceRecord;
use crate::services::whatsapp_transport::MessagingTransport;

/// Qué responde el transporte falso para un destinatario.
#[derive(Clone)]
pub enum FakeReply {
    Ack(&'static str),
    Rejected(&'static str),
    Raw(Value),
    Hang,
    Panic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FakeCall {
    pub kind: &'static str,
    pub recipient: String,
    pub body: String,
    pub image_url: Option<String>,
}

pub struct FakeTransport {
    replies: HashMap<String, FakeReply>,
    default_reply: FakeReply,
    ready: bool,
    timeout: Duration,
    pub calls: Mutex<Vec<FakeCall>>,
}

impl FakeTransport {
    pub fn acking() -> Self {
        Self {
            replies: HashMap::new(),
            default_reply: FakeReply::Ack("wamid.default"),
            ready: true,
            timeout: Duration::from_secs(5),
            calls: Mutex::new(vec![]),
        }
    }

    /// Respuesta específica por destinatario (sin el `+` inicial).
    pub fn reply(mut self, recipient: &str, reply: FakeReply) -> Self {
        self.replies
            .insert(recipient.trim_start_matches('+').to_string(), reply);
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.ready = false;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.calls.lock().unwrap().clone()
    }

    async fn answer(&self, call: FakeCall) -> Result<Value, TransportError> {
        let key = call.recipient.trim_start_matches('+').to_string();
        self.calls.lock().unwrap().push(call);
        let reply = self
            .replies
            .get(&key)
            .cloned()
            .unwrap_or_else(|| self.default_reply.clone());

        match reply {
            FakeReply::Ack(id) => Ok(json!({
                "messaging_product": "whatsapp",
                "contacts": [{ "input": key, "wa_id": key }],
                "messages": [{ "id": id }]
            })),
            FakeReply::Rejected(msg) => Err(TransportError::Rejected {
                status: 400,
                message: msg.to_string(),
            }),
            FakeReply::Raw(value) => Ok(value),
            FakeReply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Value::Null)
            }
            FakeReply::Panic => panic!("fake transport exploded"),
        }
    }
}

#[async_trait]
impl MessagingTransport for FakeTransport {
    async fn send_text(&self, body: &str, recipient: &str) -> Result<Value, TransportError> {
        self.answer(FakeCall {
            kind: "text",
            recipient: recipient.to_string(),
            body: body.to_string(),
            image_url: None,
        })
        .await
    }

    async fn send_image(
        &self,
        image_url: &str,
        recipient: &str,
        caption: &str,
    ) -> Result<Value, TransportError> {
        self.answer(FakeCall {
            kind: "image",
            recipient: recipient.to_string(),
            body: caption.to_string(),
            image_url: Some(image_url.to_string()),
        })
        .await
    }

    async fn ensure_ready(&self) -> Result<(), TransportError> {
        if self.ready {
            Ok(())
        } else {
            Err(TransportError::Unavailable("fake transport offline".to_string()))
        }
    }

    fn send_timeout(&self) -> Duration {
        self.timeout
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

pub fn sample_record() -> AttendanceRecord {
    AttendanceRecord {
        name: "Ana García López".to_string(),
        company: "TechSolutions S.A.".to_string(),
        role: "Desarrollador Senior".to_string(),
        timestamp: "2023-12-07 16:30:00".to_string(),
        photo: None,
    }
}

pub fn sample_payload() -> Value {
    json!({
        "name": "Ana García López",
        "company": "TechSolutions S.A.",
        "role": "Desarrollador Senior",
        "timestamp": "2023-12-07 16:30:00"
    })
}
