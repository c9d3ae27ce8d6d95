//! Processing endpoint
//!
//! The remote paraphrasing service consumes a document plus a credential and
//! answers with the processed document as an opaque binary payload.
//!
//! - [`ProcessingEndpoint`] is the seam the session talks to
//! - [`HttpProcessingEndpoint`] is the reqwest implementation
//! - [`ProcessingError`] carries the message the user gets to see

pub mod http;

pub use http::HttpProcessingEndpoint;

use crate::auth::Credential;
use crate::session::SourceFile;
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Fallback when a failure body cannot be parsed at all.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

/// Fallback when a failure body parses but carries no usable detail.
pub const PROCESSING_FAILED_MESSAGE: &str = "Processing failed";

/// Shown when the service could not be reached.
pub const TRANSPORT_FAILED_MESSAGE: &str = "Failed to reach the processing service";

#[async_trait]
pub trait ProcessingEndpoint: Send + Sync {
    /// Submit one document. Exactly one request is made; no retries.
    async fn process(
        &self,
        file: &SourceFile,
        credential: &Credential,
    ) -> Result<ProcessedDocument, ProcessingError>;
}

/// Successful response from the service.
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

impl ProcessedDocument {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProcessingError {
    /// The service answered with a non-2xx status.
    #[error("{message} (status {status})")]
    Rejected { status: u16, message: String },

    /// The request never produced a response.
    #[error("transport failure: {0}")]
    Transport(String),
}

impl ProcessingError {
    /// Text surfaced to the session. Transport details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            ProcessingError::Rejected { message, .. } => message.clone(),
            ProcessingError::Transport(_) => TRANSPORT_FAILED_MESSAGE.to_string(),
        }
    }
}

/// Extract the human-readable message from a failure body.
///
/// The service answers errors as `{"detail": "..."}`. Validation errors use a
/// list of `{"msg": "..."}` objects under `detail` instead.
pub fn error_message_from_body(body: &[u8]) -> String {
    let value: serde_json::Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(_) => return UNKNOWN_ERROR_MESSAGE.to_string(),
    };

    match value.get("detail") {
        Some(serde_json::Value::String(detail)) if !detail.trim().is_empty() => detail.clone(),
        Some(serde_json::Value::Array(items)) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            if messages.is_empty() {
                PROCESSING_FAILED_MESSAGE.to_string()
            } else {
                messages.join("; ")
            }
        }
        _ => PROCESSING_FAILED_MESSAGE.to_string(),
    }
}
