//! logger.rs
//! Configuración del logger usando env_logger.

use anyhow::{Context, Result};
use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
};

/// Escribe cada línea en stdout y en el archivo de log.
struct TeeWriter {
    file: File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()?;
        self.file.flush()
    }
}

/// `RUST_LOG` tiene prioridad; si no está se usa `default_level`.
pub fn init_logger(default_level: &str, log_file: Option<&str>) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_level),
    );
    builder.format_timestamp_secs();

    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("No se pudo abrir el archivo de log {}", path))?;
        builder.target(env_logger::Target::Pipe(Box::new(TeeWriter { file })));
    }

    builder.init();
    log::info!("Logger configurado con nivel '{}'", default_level);
    Ok(())
}
