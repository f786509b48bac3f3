use anyhow::Context;
use lettre::{
    transport::smtp::{
        authentication::{Credentials, Mechanism},
        client::{CertificateStore, Tls, TlsParameters},
    },
    Message, SmtpTransport, Transport,
};
use log::{debug, info, trace};
use std::time::Duration;

use super::{envelope_strings, BackendError, EmailBackend};
use crate::config::SmtpConfig;

/// Socket timeout for the SMTP session. None: a slow relay is waited on,
/// like the command itself.
const SESSION_TIMEOUT: Option<Duration> = None;

/// Submits the report over SMTP.
///
/// STARTTLS is mandatory and happens before authentication, so a server
/// that does not offer it never sees the credentials or the message.
pub struct SmtpBackend {
    config: SmtpConfig,
}

impl SmtpBackend {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn transport(&self) -> Result<SmtpTransport, BackendError> {
        let tls = TlsParameters::builder(self.config.host.clone())
            .certificate_store(CertificateStore::Default)
            .build_rustls()
            .context("Failed to build TLS parameters")?;

        let transport = SmtpTransport::relay(&self.config.host)
            .context("Invalid host name")?
            .port(self.config.port)
            .timeout(SESSION_TIMEOUT)
            .tls(Tls::Required(tls))
            .authentication(vec![Mechanism::Plain, Mechanism::Login])
            .credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
            .build();
        Ok(transport)
    }
}

impl EmailBackend for SmtpBackend {
    fn send(&self, message: &Message) -> Result<(), BackendError> {
        let (from, to) = envelope_strings(message);
        info!(
            "SMTP backend: sending via {}:{} to {}",
            self.config.host,
            self.config.port,
            to.join(", ")
        );
        debug!("SMTP backend: envelope-from={}", from);
        debug!("SMTP backend: authenticating as {}", self.config.username);

        let transport = self.transport()?;

        debug!("SMTP backend: connecting and sending");
        let response = transport
            .send(message)
            .with_context(|| {
                format!(
                    "Failed to send mail via {}:{}",
                    self.config.host, self.config.port
                )
            })?;
        trace!(
            "SMTP backend: server response={:?}",
            response.message().collect::<Vec<_>>()
        );
        info!("SMTP backend: send complete");
        Ok(())
    }
}
