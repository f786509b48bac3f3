use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use lettre::Message;
use log::{debug, info, trace};

use super::{envelope_strings, BackendError, EmailBackend};

/// Appends each report to a local file instead of sending it.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl EmailBackend for FileBackend {
    fn send(&self, message: &Message) -> Result<(), BackendError> {
        let (from, to) = envelope_strings(message);
        info!(
            "File backend: writing message to {} ({} recipient(s))",
            self.path.display(),
            to.len()
        );
        debug!("File backend: envelope-from={}", from);

        let raw_email = message.formatted();
        trace!("File backend: raw_email_bytes={}", raw_email.len());

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;

        write!(file, "Envelope-From: {}\nEnvelope-To: {}\n---\n", from, to.join(", "))?;
        file.write_all(&raw_email)?;
        writeln!(file, "\n---")?;

        debug!("File backend: write complete");
        Ok(())
    }
}
