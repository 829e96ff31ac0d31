//! config/recipients.rs
//! Lista de destinatarios del proceso: se carga una vez al arrancar y después
//! sólo se lee.

use anyhow::{bail, Result};
use std::{fs, path::Path, sync::Arc};

/// Cantidad de caracteres visibles al enmascarar un número.
const VISIBLE_SUFFIX: usize = 4;

/// Lista ordenada de destinatarios. Clonarla es barato (`Arc`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecipientList {
    addresses: Arc<[String]>,
}

impl RecipientList {
    pub fn new<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let addresses: Vec<String> = addresses.into_iter().map(Into::into).collect();
        Self {
            addresses: addresses.into(),
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.addresses
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn masked(&self) -> Vec<String> {
        self.addresses.iter().map(|a| mask_recipient(a)).collect()
    }
}

/// Carga los destinatarios desde `path` (uno por línea, `#` para comentarios).
/// Si el archivo no existe, no se puede leer o no tiene números, usa
/// `fallback`. Falla sólo si no hay ninguna de las dos fuentes.
pub fn load_recipients(path: &Path, fallback: Option<&str>) -> Result<RecipientList> {
    match fs::read_to_string(path) {
        Ok(content) => {
            let list = parse_recipients(&content);
            if !list.is_empty() {
                log::info!(
                    "(load_recipients) {} destinatarios cargados desde {:?}",
                    list.len(),
                    path
                );
                return Ok(list);
            }
            log::warn!(
                "(load_recipients) {:?} no contiene destinatarios, usando valor de respaldo",
                path
            );
        }
        Err(e) => {
            log::warn!(
                "(load_recipients) No se pudo leer {:?} ({}), usando valor de respaldo",
                path,
                e
            );
        }
    }

    match fallback.map(str::trim).filter(|f| !f.is_empty()) {
        Some(number) => {
            log::info!(
                "(load_recipients) Usando destinatario único {}",
                mask_recipient(number)
            );
            Ok(RecipientList::new([number]))
        }
        None => bail!(
            "No recipients available: {} is missing or empty and WHATSAPP_RECIPIENT_NUMBER is not set",
            path.display()
        ),
    }
}

pub fn parse_recipients(content: &str) -> RecipientList {
    RecipientList::new(
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#')),
    )
}

/// Deja visibles sólo los últimos 4 caracteres; el resto se reemplaza por `*`.
/// Direcciones de 4 caracteres o menos se ocultan completas.
pub fn mask_recipient(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= VISIBLE_SUFFIX {
        return "*".repeat(chars.len());
    }
    let hidden = chars.len() - VISIBLE_SUFFIX;
    let mut masked = "*".repeat(hidden);
    masked.extend(&chars[hidden..]);
    masked
}
