//! Artifact Store
//!
//! Turns the binary payload returned by the processing service into a
//! locally referenceable handle, the way a browser allocates an object URL
//! for a blob. Handles live as long as the session that allocated them, or
//! until revoked.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::types::{AppError, AppResult};

/// Handle to a processed document held by an [`ArtifactStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArtifactRef(Uuid);

impl ArtifactRef {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "blob:docuhuman/{}", self.0)
    }
}

/// A processed document kept in memory.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub bytes: Bytes,
    pub content_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

#[derive(Debug, Default)]
pub struct ArtifactStore {
    artifacts: HashMap<Uuid, Artifact>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `bytes` and hand back a handle to them.
    pub fn allocate(&mut self, bytes: Bytes, content_type: Option<String>) -> ArtifactRef {
        let id = Uuid::new_v4();
        debug!(artifact = %id, bytes = bytes.len(), "Allocated artifact");
        self.artifacts.insert(
            id,
            Artifact {
                bytes,
                content_type,
                created_at: Utc::now(),
            },
        );
        ArtifactRef(id)
    }

    pub fn get(&self, artifact: &ArtifactRef) -> Option<&Artifact> {
        self.artifacts.get(&artifact.0)
    }

    pub fn contains(&self, artifact: &ArtifactRef) -> bool {
        self.artifacts.contains_key(&artifact.0)
    }

    /// Release the payload. Returns false if the handle was already gone.
    pub fn revoke(&mut self, artifact: &ArtifactRef) -> bool {
        let removed = self.artifacts.remove(&artifact.0).is_some();
        if removed {
            debug!(artifact = %artifact.0, "Revoked artifact");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Write an artifact into `dir` as `file_name`.
    ///
    /// Only the final path component of `file_name` is used.
    pub async fn save(
        &self,
        artifact: &ArtifactRef,
        dir: &Path,
        file_name: &str,
    ) -> AppResult<PathBuf> {
        let stored = self
            .get(artifact)
            .ok_or_else(|| AppError::NotFound(format!("artifact {}", artifact)))?;

        let base_name = Path::new(file_name)
            .file_name()
            .ok_or_else(|| AppError::Internal(format!("invalid download name: {:?}", file_name)))?;

        fs::create_dir_all(dir).await?;
        let path = dir.join(base_name);
        fs::write(&path, &stored.bytes).await?;

        info!(path = %path.display(), bytes = stored.size(), "Saved artifact");
        Ok(path)
    }
}
