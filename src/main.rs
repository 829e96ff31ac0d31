use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use dotenv::dotenv;
use std::sync::Arc;

use crate::config::app_config::AppConfig;
use crate::config::recipients::load_recipients;
use crate::logger::init_logger;
use crate::services::dispatch_service::DispatchService;
use crate::services::rate_limiter::RateLimiter;
use crate::services::whatsapp_transport::WhatsAppCloudClient;

mod app;
mod config;
mod errors;
mod handlers;
mod logger;
mod models;
mod services;

#[cfg(test)]
mod tests;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok(); // Cargar .env al inicio

    let config = AppConfig::from_env().context("Configuración inválida")?;
    init_logger(&config.log_level, config.log_file.as_deref())?;
    log::info!(
        "Iniciando en modo {} (debug={})",
        config.environment.as_str(),
        config.debug
    );

    // Destinatarios: se cargan una sola vez y quedan de sólo lectura
    let recipients = load_recipients(
        &config.whatsapp.recipients_file,
        config.whatsapp.recipient_number.as_deref(),
    )?;

    let transport = WhatsAppCloudClient::new(&config.whatsapp, config.request_timeout)
        .context("No se pudo inicializar el cliente de WhatsApp")?;

    let dispatch_service = DispatchService::new(Arc::new(transport), recipients)
        .with_policy(config.success_policy)
        .with_max_concurrency(config.dispatch_max_concurrency)
        .with_debug_mode(config.debug);

    let dispatch_data = web::Data::new(dispatch_service);
    let rate_limiter = web::Data::new(RateLimiter::new(config.rate_limit));
    let whatsapp_config = web::Data::new(config.whatsapp.clone());
    let max_content_length = config.max_content_length;

    // Levantar servidor
    log::info!("Levantando servidor en {}:{}", config.host, config.port);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default().exclude("/health"))
            .app_data(app::json_config(max_content_length))
            .app_data(dispatch_data.clone())
            .app_data(rate_limiter.clone())
            .app_data(whatsapp_config.clone())
            .configure(app::init_app)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
