pub mod file;
pub mod smtp;

pub use file::FileBackend;
pub use smtp::SmtpBackend;

use lettre::Message;
use log::{debug, info};
use thiserror::Error;

use crate::config::BackendConfig;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Delivers a finished report.
///
/// Any error is final: nothing is retried or queued.
pub trait EmailBackend: Send + Sync {
    fn send(&self, message: &Message) -> Result<(), BackendError>;
}

/// Create the backend selected by the start-up configuration.
pub fn create_from_config(config: &BackendConfig) -> Box<dyn EmailBackend> {
    match config {
        BackendConfig::File { path } => {
            info!("Using file backend to {}", path.display());
            Box::new(FileBackend::new(path.clone()))
        }
        BackendConfig::Smtp(smtp) => {
            info!("Using SMTP backend");
            debug!("SMTP: host={} port={}", smtp.host, smtp.port);
            Box::new(SmtpBackend::new(smtp.clone()))
        }
    }
}

/// Envelope addresses as strings, for logging and the file backend.
fn envelope_strings(message: &Message) -> (String, Vec<String>) {
    let envelope = message.envelope();
    let from = envelope
        .from()
        .map(|addr| addr.to_string())
        .unwrap_or_default();
    let to = envelope.to().iter().map(|addr| addr.to_string()).collect();
    (from, to)
}
