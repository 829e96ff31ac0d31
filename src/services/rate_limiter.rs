//! services/rate_limiter.rs
//! Limitador en memoria por cliente (ventana deslizante) para el webhook.

use anyhow::{anyhow, Result};
use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
    time::{Duration, Instant},
};

/// Tope de clientes rastreados; al llegar se limpia y, si sigue lleno, se
/// rechaza a los clientes nuevos.
const MAX_TRACKED_CLIENTS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(3600),
        }
    }
}

impl RateLimitConfig {
    /// Interpreta expresiones como `100 per hour` o `10/minute`.
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_lowercase().replace('/', " per ");
        let mut parts = normalized.split_whitespace();

        let count = parts.next();
        let per = parts.next();
        let unit = parts.next();
        let (count, unit) = match (count, per, unit, parts.next()) {
            (Some(c), Some("per"), Some(u), None) => (c, u),
            _ => return Err(anyhow!("RATE_LIMIT inválido '{}': se espera 'N per unidad'", raw)),
        };

        let max_requests: u32 = count
            .parse()
            .map_err(|_| anyhow!("RATE_LIMIT inválido '{}': '{}' no es un número", raw, count))?;
        if max_requests == 0 {
            return Err(anyhow!("RATE_LIMIT inválido '{}': debe permitir al menos 1", raw));
        }

        let secs = match unit.trim_end_matches('s') {
            "second" | "sec" => 1,
            "minute" | "min" => 60,
            "hour" => 3600,
            "day" => 86_400,
            other => return Err(anyhow!("RATE_LIMIT inválido '{}': unidad '{}'", raw, other)),
        };

        Ok(Self {
            max_requests,
            window: Duration::from_secs(secs),
        })
    }
}

pub struct RateLimiter {
    config: RateLimitConfig,
    max_tracked_clients: usize,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            max_tracked_clients: MAX_TRACKED_CLIENTS,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Registra un request de `client` y devuelve `false` si excede el límite.
    pub fn check(&self, client: &str) -> bool {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> bool {
        let mut hits = self
            .hits
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if hits.len() >= self.max_tracked_clients && !hits.contains_key(client) {
            let window = self.config.window;
            hits.retain(|_, q| q.back().is_some_and(|t| now.duration_since(*t) < window));

            // Sin espacio tras la limpieza: el cliente nuevo no entra
            if hits.len() >= self.max_tracked_clients {
                log::warn!(
                    "(rate_limiter) {} clientes activos, rechazando a {}",
                    hits.len(),
                    client
                );
                return false;
            }
        }

        let queue = hits.entry(client.to_string()).or_default();
        while queue
            .front()
            .is_some_and(|t| now.duration_since(*t) >= self.config.window)
        {
            queue.pop_front();
        }

        if queue.len() >= self.config.max_requests as usize {
            log::warn!("(rate_limiter) Límite excedido para {}", client);
            return false;
        }
        queue.push_back(now);
        true
    }
}
