//! Turns an [`ExecutionResult`] into the report email.
//!
//! The report is a `multipart/mixed` message: a plain-text part with the
//! command and its exit status, followed by `stdout.txt` and `stderr.txt`
//! attachments. Both attachments are always present and always base64
//! encoded, even when empty or plain ASCII.

use lettre::{
    message::{
        header::{ContentTransferEncoding, ContentType},
        Attachment, Body, Mailbox, MultiPart, SinglePart,
    },
    Address, Message,
};
use log::{debug, trace};
use thiserror::Error;
use uuid::Uuid;

use crate::runner::ExecutionResult;

pub const STDOUT_FILENAME: &str = "stdout.txt";
pub const STDERR_FILENAME: &str = "stderr.txt";
const ATTACHMENT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Error, Debug)]
pub enum MessageError {
    #[error("Invalid recipient address '{0}'")]
    InvalidRecipient(String),
    #[error("Failed to encode attachment {0}")]
    Encoding(&'static str),
    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),
}

/// Subject line for the report.
///
/// The command is included on success with its whitespace collapsed, so a
/// multi-line script still yields a single-line header.
pub fn subject_for(command: &str, exit_code: i32) -> String {
    if exit_code == 0 {
        let command = command.split_whitespace().collect::<Vec<_>>().join(" ");
        format!("command completed successfully: {}", command)
    } else {
        format!("ERROR: script or system returned exit status {}", exit_code)
    }
}

pub fn body_for(command: &str, exit_code: i32) -> String {
    format!("{}\nEXIT STATUS {}", command, exit_code)
}

/// Build the report sent from `sender` to `recipient`.
pub fn build_report(
    sender: &Address,
    recipient: &str,
    command: &str,
    result: &ExecutionResult,
) -> Result<Message, MessageError> {
    let to = recipient
        .parse::<Mailbox>()
        .map_err(|_| MessageError::InvalidRecipient(recipient.to_string()))?;
    let subject = subject_for(command, result.exit_code);
    debug!("Message: to={} subject={}", to, subject);

    let message_id = format!("<{}@{}>", Uuid::new_v4(), sender.domain());
    trace!("Message: message-id={}", message_id);

    let parts = MultiPart::mixed()
        .singlepart(SinglePart::plain(body_for(command, result.exit_code)))
        .singlepart(attachment(STDOUT_FILENAME, &result.stdout)?)
        .singlepart(attachment(STDERR_FILENAME, &result.stderr)?);

    let message = Message::builder()
        .from(Mailbox::new(None, sender.clone()))
        .to(to)
        .date_now()
        .message_id(Some(message_id))
        .subject(subject)
        .multipart(parts)?;
    Ok(message)
}

fn attachment(filename: &'static str, content: &[u8]) -> Result<SinglePart, MessageError> {
    let body = Body::new_with_encoding(content.to_vec(), ContentTransferEncoding::Base64)
        .map_err(|_| MessageError::Encoding(filename))?;
    let content_type =
        ContentType::parse(ATTACHMENT_CONTENT_TYPE).map_err(|_| MessageError::Encoding(filename))?;
    trace!("Message: attachment {} bytes={}", filename, content.len());
    Ok(Attachment::new(filename.to_string()).body(body, content_type))
}
