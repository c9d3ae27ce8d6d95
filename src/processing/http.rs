// HTTP adapter for the paraphrasing service
// POST <endpoint> with a multipart `file` part and a bearer credential.

use super::{error_message_from_body, ProcessedDocument, ProcessingEndpoint, ProcessingError};
use crate::auth::Credential;
use crate::config::EndpointConfig;
use crate::session::SourceFile;
use crate::types::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{debug, info, warn};

pub struct HttpProcessingEndpoint {
    client: Client,
    url: String,
}

impl HttpProcessingEndpoint {
    /// Endpoint without a request timeout.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    pub fn from_config(config: &EndpointConfig) -> AppResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn file_part(file: &SourceFile) -> Result<Part, ProcessingError> {
        let mime = mime_guess::from_path(&file.name).first_or_octet_stream();
        Part::bytes(file.content.to_vec())
            .file_name(file.name.clone())
            .mime_str(mime.as_ref())
            .map_err(|e| ProcessingError::Transport(format!("invalid part content type: {}", e)))
    }
}

#[async_trait]
impl ProcessingEndpoint for HttpProcessingEndpoint {
    async fn process(
        &self,
        file: &SourceFile,
        credential: &Credential,
    ) -> Result<ProcessedDocument, ProcessingError> {
        info!(file = %file.name, size = file.size, url = %self.url, "Submitting document");

        let form = Form::new().part("file", Self::file_part(file)?);

        let response = self
            .client
            .post(&self.url)
            .header(AUTHORIZATION, credential.bearer())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Processing request failed before a response arrived");
                ProcessingError::Transport(e.to_string())
            })?;

        let status = response.status();

        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let message = error_message_from_body(&body);
            warn!(status = status.as_u16(), %message, "Processing service rejected the document");
            return Err(ProcessingError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await.map_err(|e| {
            warn!(error = %e, "Failed to read processed document body");
            ProcessingError::Transport(e.to_string())
        })?;

        debug!(bytes = bytes.len(), ?content_type, "Processed document received");

        Ok(ProcessedDocument {
            bytes,
            content_type,
        })
    }
}
