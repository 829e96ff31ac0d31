//! config/app_config.rs
//! Configuración global del servicio, leída del entorno (y de `.env` vía dotenv).

use anyhow::{anyhow, bail, Context, Result};
use std::{path::PathBuf, str::FromStr, time::Duration};

use crate::models::notification_model::{SuccessPolicy, DEFAULT_MIN_SUCCESS_RATE};
use crate::services::dispatch_service::DEFAULT_MAX_CONCURRENCY;
use crate::services::rate_limiter::RateLimitConfig;

/// Ambiente de ejecución (`APP_ENV`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnvironment {
    #[default]
    Development,
    Production,
    Testing,
}

impl AppEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        }
    }
}

impl FromStr for AppEnvironment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" | "default" => Ok(AppEnvironment::Development),
            "production" | "prod" => Ok(AppEnvironment::Production),
            "testing" | "test" => Ok(AppEnvironment::Testing),
            other => Err(anyhow!(
                "APP_ENV inválido '{}'. Valores: development, production, testing",
                other
            )),
        }
    }
}

/// Credenciales y destinos de la WhatsApp Cloud API.
#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    pub token: String,
    pub phone_number_id: String,
    pub verify_token: String,
    /// Destinatario de respaldo si no hay archivo de destinatarios.
    pub recipient_number: Option<String>,
    pub recipients_file: PathBuf,
    pub api_url: String,
    pub api_version: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub log_level: String,
    pub log_file: Option<String>,
    pub whatsapp: WhatsAppConfig,
    /// Timeout de cada envío individual.
    pub request_timeout: Duration,
    pub rate_limit: RateLimitConfig,
    pub max_content_length: usize,
    pub dispatch_max_concurrency: usize,
    pub success_policy: SuccessPolicy,
}

const DEFAULT_MAX_CONTENT_LENGTH: usize = 16 * 1024 * 1024;

impl AppConfig {
    /// Lee la configuración de las variables de entorno del proceso.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Igual que `from_env` pero con una fuente de variables arbitraria.
    /// Las variables vacías cuentan como no definidas.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let environment = match get("APP_ENV") {
            Some(raw) => raw.parse()?,
            None => AppEnvironment::default(),
        };
        let is_production = environment == AppEnvironment::Production;
        let is_testing = environment == AppEnvironment::Testing;

        // En testing se usan credenciales ficticias para no tocar la API real
        let required = |key: &str, test_default: &str| {
            get(key).or_else(|| is_testing.then(|| test_default.to_string()))
        };
        let token = required("WHATSAPP_TOKEN", "test_token");
        let phone_number_id = required("WHATSAPP_PHONE_NUMBER_ID", "test_phone_id");
        let verify_token = required("WHATSAPP_VERIFY_TOKEN", "test_verify_token");
        let recipient_number = required("WHATSAPP_RECIPIENT_NUMBER", "+1234567890");

        let missing: Vec<&str> = [
            ("WHATSAPP_TOKEN", token.is_none()),
            ("WHATSAPP_PHONE_NUMBER_ID", phone_number_id.is_none()),
            ("WHATSAPP_VERIFY_TOKEN", verify_token.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, is_missing)| is_missing.then_some(name))
        .collect();
        if !missing.is_empty() {
            bail!(
                "Missing required environment variables: {}",
                missing.join(", ")
            );
        }

        let debug = match get("DEBUG") {
            Some(v) => matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"),
            None => !is_production,
        };
        let log_level = get("LOG_LEVEL")
            .map(|v| v.to_lowercase())
            .unwrap_or_else(|| (if is_production { "warn" } else { "debug" }).to_string());

        let port = parse_or("PORT", get("PORT"), 5000u16)?;
        let timeout_secs = parse_or("REQUEST_TIMEOUT", get("REQUEST_TIMEOUT"), 30u64)?;
        if timeout_secs == 0 {
            bail!("REQUEST_TIMEOUT debe ser mayor a 0 segundos");
        }

        let rate_limit = match get("RATE_LIMIT") {
            Some(raw) => RateLimitConfig::parse(&raw)?,
            None => RateLimitConfig::default(),
        };

        let max_content_length = parse_or(
            "MAX_CONTENT_LENGTH",
            get("MAX_CONTENT_LENGTH"),
            DEFAULT_MAX_CONTENT_LENGTH,
        )?;

        let dispatch_max_concurrency = parse_or(
            "DISPATCH_MAX_CONCURRENCY",
            get("DISPATCH_MAX_CONCURRENCY"),
            DEFAULT_MAX_CONCURRENCY,
        )?;
        if dispatch_max_concurrency == 0 {
            bail!("DISPATCH_MAX_CONCURRENCY debe ser al menos 1");
        }

        let min_success_rate = parse_or(
            "DISPATCH_MIN_SUCCESS_RATE",
            get("DISPATCH_MIN_SUCCESS_RATE"),
            DEFAULT_MIN_SUCCESS_RATE,
        )?;
        if !(0.0..=100.0).contains(&min_success_rate) {
            bail!(
                "DISPATCH_MIN_SUCCESS_RATE debe estar entre 0 y 100 (recibido {})",
                min_success_rate
            );
        }

        Ok(Self {
            environment,
            host: get("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            debug,
            log_level,
            log_file: get("LOG_FILE"),
            whatsapp: WhatsAppConfig {
                token: token.unwrap_or_default(),
                phone_number_id: phone_number_id.unwrap_or_default(),
                verify_token: verify_token.unwrap_or_default(),
                recipient_number,
                recipients_file: get("WHATSAPP_RECIPIENTS_FILE")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("recipients.txt")),
                api_url: get("WHATSAPP_API_URL")
                    .unwrap_or_else(|| "https://graph.facebook.com".to_string()),
                api_version: get("WHATSAPP_API_VERSION").unwrap_or_else(|| "v17.0".to_string()),
            },
            request_timeout: Duration::from_secs(timeout_secs),
            rate_limit,
            max_content_length,
            dispatch_max_concurrency,
            success_policy: SuccessPolicy {
                min_success_rate_percent: min_success_rate,
            },
        })
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(v) => v
            .parse::<T>()
            .with_context(|| format!("Valor inválido para {}: '{}'", key, v)),
        None => Ok(default),
    }
}
