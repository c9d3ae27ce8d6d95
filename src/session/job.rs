// Job and source file types

use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

use crate::artifacts::ArtifactRef;
use crate::types::{AppError, AppResult};

/// Extensions the file picker offers. Advisory only; nothing is rejected.
pub const ACCEPTED_EXTENSIONS: [&str; 2] = ["docx", "pdf"];

/// A document chosen by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub name: String,
    pub size: u64,
    pub content: Bytes,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            size: content.len() as u64,
            content,
        }
    }

    /// Read a document from disk, named after the path's last component.
    pub async fn from_path(path: &Path) -> AppResult<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AppError::Internal(format!("not a file path: {}", path.display())))?
            .to_string();
        let content = fs::read(path).await?;
        Ok(Self::new(name, content))
    }

    /// Size as shown next to the selected file, e.g. "12.3 KB".
    pub fn size_label(&self) -> String {
        format!("{:.1} KB", self.size as f64 / 1024.0)
    }

    pub fn has_accepted_extension(&self) -> bool {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                ACCEPTED_EXTENSIONS
                    .iter()
                    .any(|accepted| e.eq_ignore_ascii_case(accepted))
            })
            .unwrap_or(false)
    }
}

/// Where a job is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Selected,
    InFlight,
    Completed,
    Failed,
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Selected => write!(f, "selected"),
            JobState::InFlight => write!(f, "in-flight"),
            JobState::Completed => write!(f, "completed"),
            JobState::Failed => write!(f, "failed"),
        }
    }
}

/// One processing attempt for a selected file.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub file: SourceFile,
    pub state: JobState,
    pub submitted_at: Option<DateTime<Utc>>,
    pub artifact: Option<ArtifactRef>,
    pub error: Option<String>,
    /// Requests issued for this job that have not resolved yet.
    pub pending: usize,
}

impl Job {
    pub fn new(file: SourceFile) -> Self {
        Self {
            id: Uuid::new_v4(),
            file,
            state: JobState::Selected,
            submitted_at: None,
            artifact: None,
            error: None,
            pending: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, JobState::Completed | JobState::Failed)
    }
}
