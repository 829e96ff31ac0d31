//! handlers/health_handler.rs

use actix_web::{web, HttpResponse};
use chrono::Local;
use serde_json::json;

use crate::services::dispatch_service::DispatchService;

/// GET /health
pub async fn health_endpoint(dispatch_service: web::Data<DispatchService>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "success": true,
        "status": "healthy",
        "service_info": dispatch_service.status(),
        "timestamp": Local::now().to_rfc3339()
    }))
}

/// GET /
pub async fn root_endpoint() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "service": "WhatsApp Attendance Notifier",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "active",
        "endpoints": {
            "attendance_webhook": "/attendance-webhook",
            "health_check": "/health",
            "webhook_verification": "/attendance-webhook?hub.mode=subscribe&hub.verify_token=TOKEN&hub.challenge=CHALLENGE"
        },
        "timestamp": Local::now().to_rfc3339()
    }))
}
