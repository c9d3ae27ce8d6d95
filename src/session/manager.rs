//! Upload Job Manager
//!
//! Owns the whole session: the credential, the selected file and its job,
//! the latest result, the error text and the conversion history.
//!
//! A submission is split in three steps so the network round trip can run
//! away from the owner of the state:
//!
//! ```text
//! begin_submit()  ──▶  PendingJob::run(cancel)  ──▶  finish(outcome)
//!  (&mut self)          (Send + 'static)              (&mut self)
//! ```
//!
//! [`UploadJobManager::submit`] chains the three for callers that can simply
//! await.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::artifacts::{ArtifactRef, ArtifactStore};
use crate::auth::{Credential, UserProfile, LOGIN_FAILED_MESSAGE};
use crate::config::{Config, DEFAULT_HISTORY_PREVIEW};
use crate::history::{History, HistoryEntry};
use crate::processing::{
    HttpProcessingEndpoint, ProcessedDocument, ProcessingEndpoint, ProcessingError,
};
use crate::session::events::SessionEvent;
use crate::session::job::{Job, JobState, SourceFile};
use crate::types::{AppError, AppResult};

const EVENT_CAPACITY: usize = 64;

/// Download name used when the result has no source file to name it after.
const FALLBACK_DOWNLOAD_NAME: &str = "doc.docx";

/// How a submission resolved, as reported to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Completed { entry_id: String, artifact: ArtifactRef },
    Failed { message: String },
    Cancelled,
}

/// What came back from the endpoint for one job.
#[derive(Debug)]
pub enum Resolution {
    Processed(ProcessedDocument),
    Failed(ProcessingError),
    Cancelled,
}

#[derive(Debug)]
pub struct JobOutcome {
    pub job_id: Uuid,
    pub file: SourceFile,
    pub resolution: Resolution,
}

/// A submission that has been accepted and is ready to hit the network.
pub struct PendingJob {
    job_id: Uuid,
    file: SourceFile,
    credential: Credential,
    endpoint: Arc<dyn ProcessingEndpoint>,
}

impl PendingJob {
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Issue the request. Cancelling `cancel` abandons it.
    pub async fn run(self, cancel: CancellationToken) -> JobOutcome {
        let PendingJob {
            job_id,
            file,
            credential,
            endpoint,
        } = self;

        let result = tokio::select! {
            _ = cancel.cancelled() => None,
            result = endpoint.process(&file, &credential) => Some(result),
        };

        let resolution = match result {
            Some(Ok(document)) => Resolution::Processed(document),
            Some(Err(e)) => Resolution::Failed(e),
            None => Resolution::Cancelled,
        };

        JobOutcome {
            job_id,
            file,
            resolution,
        }
    }
}

pub struct UploadJobManager {
    endpoint: Arc<dyn ProcessingEndpoint>,
    artifacts: ArtifactStore,
    history: History,
    history_preview: usize,

    credential: Option<Credential>,
    profile: Option<UserProfile>,

    current: Option<Job>,
    result: Option<ArtifactRef>,
    error: Option<String>,
    in_flight: usize,

    events: broadcast::Sender<SessionEvent>,
}

impl UploadJobManager {
    /// Session with the placeholder history.
    pub fn new(endpoint: Arc<dyn ProcessingEndpoint>) -> Self {
        Self::with_history(endpoint, History::seeded())
    }

    pub fn with_history(endpoint: Arc<dyn ProcessingEndpoint>, history: History) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            endpoint,
            artifacts: ArtifactStore::new(),
            history,
            history_preview: DEFAULT_HISTORY_PREVIEW,
            credential: None,
            profile: None,
            current: None,
            result: None,
            error: None,
            in_flight: 0,
            events,
        }
    }

    /// Session talking HTTP to the configured endpoint.
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let endpoint = Arc::new(HttpProcessingEndpoint::from_config(&config.endpoint)?);
        let history = if config.session.seed_history {
            History::seeded()
        } else {
            History::new()
        };

        let mut manager = Self::with_history(endpoint, history);
        manager.history_preview = config.session.history_preview;

        if let Some(token) = &config.auth.token {
            manager.sign_in(token.clone());
        }

        Ok(manager)
    }

    /// Receive a [`SessionEvent`] for every visible state change.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        self.events.send(event).ok();
    }

    fn set_error(&mut self, error: Option<String>) {
        if self.error != error {
            self.error = error.clone();
            self.emit(SessionEvent::ErrorChanged(error));
        }
    }

    // === Authentication ===

    /// Accept a credential from the sign-in provider.
    pub fn sign_in(&mut self, token: impl Into<String>) {
        let credential = Credential::new(token);
        if credential.is_empty() {
            debug!("Ignoring empty credential");
            return;
        }

        self.profile = match credential.decode_profile() {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!("Failed to decode credential for display: {}", e);
                None
            }
        };
        self.credential = Some(credential);
        self.set_error(None);

        info!(user = UserProfile::card_name(self.profile.as_ref()), "Signed in");
        self.emit(SessionEvent::SignedIn {
            name: self.profile.as_ref().and_then(|p| p.name.clone()),
        });
    }

    /// The sign-in provider reported a failure.
    pub fn sign_in_failed(&mut self) {
        self.set_error(Some(LOGIN_FAILED_MESSAGE.to_string()));
    }

    /// Forget the credential, profile, selection and result.
    pub fn sign_out(&mut self) {
        self.credential = None;
        self.profile = None;
        self.current = None;
        self.result = None;
        info!("Signed out");
        self.emit(SessionEvent::SignedOut);
    }

    pub fn is_signed_in(&self) -> bool {
        self.credential.is_some()
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    // === Job lifecycle ===

    /// Make `file` the current selection, dropping any previous result and error.
    pub fn select_file(&mut self, file: SourceFile) {
        debug!(file = %file.name, size = file.size, "File selected");
        let (name, size) = (file.name.clone(), file.size);
        self.current = Some(Job::new(file));
        self.result = None;
        self.set_error(None);
        self.emit(SessionEvent::FileSelected { name, size });
    }

    /// Start submitting the current selection with the session credential.
    pub fn begin_submit(&mut self) -> AppResult<PendingJob> {
        let file = self.current.as_ref().map(|job| job.file.clone());
        let credential = self.credential.clone();
        self.begin_submit_with(file, credential)
    }

    /// Start submitting `file` with `credential`.
    ///
    /// Fails with [`AppError::Precondition`] and changes nothing when either
    /// is missing.
    pub fn begin_submit_with(
        &mut self,
        file: Option<SourceFile>,
        credential: Option<Credential>,
    ) -> AppResult<PendingJob> {
        let file = file.ok_or(AppError::Precondition("no file selected"))?;
        let credential = credential
            .filter(|c| !c.is_empty())
            .ok_or(AppError::Precondition("no credential"))?;

        if !matches!(&self.current, Some(job) if job.file == file) {
            self.current = Some(Job::new(file.clone()));
            self.result = None;
        }
        let job = self.current.get_or_insert_with(|| Job::new(file.clone()));
        job.state = JobState::InFlight;
        job.submitted_at = Some(Utc::now());
        job.artifact = None;
        job.error = None;
        job.pending += 1;
        let job_id = job.id;

        self.in_flight += 1;
        self.set_error(None);

        info!(job = %job_id, file = %file.name, "Job started");
        self.emit(SessionEvent::JobStarted { job_id });

        Ok(PendingJob {
            job_id,
            file,
            credential,
            endpoint: Arc::clone(&self.endpoint),
        })
    }

    /// Apply the outcome of a [`PendingJob`] to the session.
    pub fn finish(&mut self, outcome: JobOutcome) -> JobStatus {
        self.in_flight = self.in_flight.saturating_sub(1);

        let JobOutcome {
            job_id,
            file,
            resolution,
        } = outcome;
        let is_current = matches!(&self.current, Some(job) if job.id == job_id);
        if is_current {
            if let Some(job) = self.current.as_mut() {
                job.pending = job.pending.saturating_sub(1);
            }
        }

        match resolution {
            Resolution::Processed(document) => {
                let artifact = self.artifacts.allocate(document.bytes, document.content_type);
                let entry_id = self.history.next_id();
                self.history
                    .prepend(HistoryEntry::completed(entry_id.clone(), file.name, artifact));

                if is_current {
                    if let Some(job) = self.current.as_mut() {
                        job.state = JobState::Completed;
                        job.artifact = Some(artifact);
                    }
                    self.result = Some(artifact);
                }

                info!(job = %job_id, entry = %entry_id, "Job completed");
                self.emit(SessionEvent::JobCompleted {
                    job_id,
                    entry_id: entry_id.clone(),
                });
                self.emit(SessionEvent::HistoryChanged {
                    len: self.history.len(),
                });

                JobStatus::Completed { entry_id, artifact }
            }
            Resolution::Failed(err) => {
                let message = err.user_message();

                if is_current {
                    if let Some(job) = self.current.as_mut() {
                        job.state = JobState::Failed;
                        job.error = Some(message.clone());
                    }
                }
                self.set_error(Some(message.clone()));

                warn!(job = %job_id, error = %err, "Job failed");
                self.emit(SessionEvent::JobFailed {
                    job_id,
                    message: message.clone(),
                });

                JobStatus::Failed { message }
            }
            Resolution::Cancelled => {
                // Another request for the same job may still be running
                if let Some(job) = self.current.as_mut().filter(|_| is_current) {
                    if job.pending == 0 && job.state == JobState::InFlight {
                        job.state = JobState::Selected;
                        job.submitted_at = None;
                    }
                }

                info!(job = %job_id, "Job cancelled");
                self.emit(SessionEvent::JobCancelled { job_id });

                JobStatus::Cancelled
            }
        }
    }

    /// Submit the current selection and wait for it to resolve.
    pub async fn submit(&mut self, cancel: &CancellationToken) -> AppResult<JobStatus> {
        let pending = self.begin_submit()?;
        let outcome = pending.run(cancel.clone()).await;
        Ok(self.finish(outcome))
    }

    /// Submit an explicit file and credential and wait for it to resolve.
    pub async fn submit_with(
        &mut self,
        file: Option<SourceFile>,
        credential: Option<Credential>,
        cancel: &CancellationToken,
    ) -> AppResult<JobStatus> {
        let pending = self.begin_submit_with(file, credential)?;
        let outcome = pending.run(cancel.clone()).await;
        Ok(self.finish(outcome))
    }

    /// `None` while idle.
    pub fn job_state(&self) -> Option<JobState> {
        self.current.as_ref().map(|job| job.state)
    }

    pub fn current_job(&self) -> Option<&Job> {
        self.current.as_ref()
    }

    pub fn is_processing(&self) -> bool {
        self.in_flight > 0
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn result(&self) -> Option<ArtifactRef> {
        self.result
    }

    /// File name offered for the current result.
    pub fn download_name(&self) -> Option<String> {
        self.result?;
        let name = self
            .current
            .as_ref()
            .map(|job| job.file.name.as_str())
            .unwrap_or(FALLBACK_DOWNLOAD_NAME);
        Some(format!("humanized_{}", name))
    }

    // === History ===

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Remove one entry. Absent ids are ignored.
    pub fn delete_history_entry(&mut self, id: &str) -> bool {
        let Some(entry) = self.history.remove(id) else {
            return false;
        };
        self.release(entry.artifact);
        debug!(entry = %id, "History entry deleted");
        self.emit(SessionEvent::HistoryChanged {
            len: self.history.len(),
        });
        true
    }

    /// Remove every entry. Returns how many were removed.
    pub fn clear_all_history(&mut self) -> usize {
        let removed = self.history.clear();
        for entry in &removed {
            self.release(entry.artifact);
        }
        info!(removed = removed.len(), "History cleared");
        self.emit(SessionEvent::HistoryChanged { len: 0 });
        removed.len()
    }

    /// Entries whose title contains `query`, ignoring case.
    pub fn filter_history(&self, query: &str) -> Vec<&HistoryEntry> {
        self.history.filter(query)
    }

    /// Filtered entries cut to the preview size unless `show_all`.
    pub fn displayed_history(&self, query: &str, show_all: bool) -> Vec<&HistoryEntry> {
        self.history.preview(query, show_all, self.history_preview)
    }

    // The current result keeps its payload even when its entry goes away
    fn release(&mut self, artifact: Option<ArtifactRef>) {
        if let Some(artifact) = artifact {
            if self.result != Some(artifact) {
                self.artifacts.revoke(&artifact);
            }
        }
    }

    // === Artifacts ===

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    pub async fn save_artifact(
        &self,
        artifact: &ArtifactRef,
        dir: &Path,
        file_name: &str,
    ) -> AppResult<PathBuf> {
        self.artifacts.save(artifact, dir, file_name).await
    }

    /// Save the current result under its download name.
    pub async fn save_result(&self, dir: &Path) -> AppResult<PathBuf> {
        let artifact = self
            .result
            .ok_or_else(|| AppError::NotFound("no processed document".to_string()))?;
        let name = self
            .download_name()
            .unwrap_or_else(|| format!("humanized_{}", FALLBACK_DOWNLOAD_NAME));
        self.artifacts.save(&artifact, dir, &name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::UNKNOWN_ERROR_MESSAGE;
    use async_trait::async_trait;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Endpoint that always answers the same way.
    struct ScriptedEndpoint {
        response: Result<ProcessedDocument, ProcessingError>,
        calls: AtomicUsize,
    }

    impl ScriptedEndpoint {
        fn ok(body: &'static [u8]) -> Arc<Self> {
            Arc::new(Self {
                response: Ok(ProcessedDocument::new(body)),
                calls: AtomicUsize::new(0),
            })
        }

        fn rejected(status: u16, message: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Err(ProcessingError::Rejected {
                    status,
                    message: message.to_string(),
                }),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ProcessingEndpoint for ScriptedEndpoint {
        async fn process(
            &self,
            _file: &SourceFile,
            _credential: &Credential,
        ) -> Result<ProcessedDocument, ProcessingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone()
        }
    }

    /// Endpoint that never answers.
    struct SilentEndpoint;

    #[async_trait]
    impl ProcessingEndpoint for SilentEndpoint {
        async fn process(
            &self,
            _file: &SourceFile,
            _credential: &Credential,
        ) -> Result<ProcessedDocument, ProcessingError> {
            std::future::pending().await
        }
    }

    fn thesis() -> SourceFile {
        SourceFile::new("Thesis.docx", b"machine text".to_vec())
    }

    fn token() -> String {
        encode(
            &Header::default(),
            &serde_json::json!({
                "name": "Siti Rahma",
                "email": "siti@example.com",
                "picture": "https://example.com/siti.png"
            }),
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap()
    }

    fn signed_in(endpoint: Arc<dyn ProcessingEndpoint>) -> UploadJobManager {
        let mut manager = UploadJobManager::new(endpoint);
        manager.sign_in(token());
        manager
    }

    fn history_ids(manager: &UploadJobManager) -> Vec<String> {
        manager.history().iter().map(|e| e.id.clone()).collect()
    }

    #[tokio::test]
    async fn test_submit_success_prepends_completed_entry() {
        let endpoint = ScriptedEndpoint::ok(b"human text");
        let mut manager = signed_in(endpoint.clone());
        manager.select_file(thesis());

        let status = manager.submit(&CancellationToken::new()).await.unwrap();

        let JobStatus::Completed { entry_id, artifact } = status else {
            panic!("expected completion");
        };
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 1);

        let first = manager.history().iter().next().unwrap();
        assert_eq!(first.id, entry_id);
        assert_eq!(first.title, "Thesis.docx");
        assert_eq!(first.date, "Just now");
        assert_eq!(first.status, "Completed");
        assert_eq!(first.artifact, Some(artifact));
        assert_eq!(manager.history().len(), 7);

        assert_eq!(manager.result(), Some(artifact));
        assert_eq!(&manager.artifacts().get(&artifact).unwrap().bytes[..], b"human text");
        assert_eq!(manager.error(), None);
        assert_eq!(manager.job_state(), Some(JobState::Completed));
        assert!(!manager.is_processing());
        assert_eq!(manager.download_name().as_deref(), Some("humanized_Thesis.docx"));
    }

    #[tokio::test]
    async fn test_submit_failure_sets_error_without_entry() {
        let mut manager = signed_in(ScriptedEndpoint::rejected(
            400,
            "Could not extract text from file.",
        ));
        manager.select_file(thesis());
        let before = history_ids(&manager);

        let status = manager.submit(&CancellationToken::new()).await.unwrap();

        assert_eq!(
            status,
            JobStatus::Failed {
                message: "Could not extract text from file.".to_string()
            }
        );
        assert_eq!(manager.error(), Some("Could not extract text from file."));
        assert_eq!(history_ids(&manager), before);
        assert_eq!(manager.job_state(), Some(JobState::Failed));
        assert!(manager.result().is_none());
        assert!(!manager.is_processing());
    }

    #[tokio::test]
    async fn test_submit_yields_exactly_one_outcome() {
        let endpoints: Vec<Arc<dyn ProcessingEndpoint>> = vec![
            ScriptedEndpoint::ok(b"a"),
            ScriptedEndpoint::rejected(500, "boom"),
            ScriptedEndpoint::ok(b""),
            ScriptedEndpoint::rejected(401, "Invalid token"),
        ];

        for endpoint in endpoints {
            let mut manager = signed_in(endpoint);
            manager.select_file(thesis());
            let before = manager.history().len();

            manager.submit(&CancellationToken::new()).await.unwrap();

            let appended = manager.history().len() == before + 1;
            let errored = manager.error().is_some();
            assert!(appended ^ errored, "appended={} errored={}", appended, errored);
            if appended {
                assert_eq!(manager.history().iter().next().unwrap().status, "Completed");
            }
        }
    }

    #[tokio::test]
    async fn test_submit_without_credential_has_no_side_effects() {
        let endpoint = ScriptedEndpoint::ok(b"x");
        let mut manager = UploadJobManager::new(endpoint.clone());
        manager.select_file(thesis());
        let before = history_ids(&manager);

        let result = manager
            .submit_with(Some(thesis()), None, &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(AppError::Precondition(_))));
        assert_eq!(history_ids(&manager), before);
        assert_eq!(manager.error(), None);
        assert_eq!(manager.job_state(), Some(JobState::Selected));
        assert!(!manager.is_processing());
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_submit_without_file_has_no_side_effects() {
        let mut manager = signed_in(ScriptedEndpoint::ok(b"x"));
        manager.sign_in_failed();

        let result = manager.submit(&CancellationToken::new()).await;

        assert!(matches!(result, Err(AppError::Precondition(_))));
        assert_eq!(manager.error(), Some(LOGIN_FAILED_MESSAGE));
        assert_eq!(manager.history().len(), 6);
        assert_eq!(manager.job_state(), None);
    }

    #[tokio::test]
    async fn test_endpoint_500_with_detail() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/paraphrase")
            .with_status(500)
            .with_body(r#"{"detail":"server overloaded"}"#)
            .create_async()
            .await;

        let url = format!("{}/paraphrase", server.url());
        let endpoint = Arc::new(HttpProcessingEndpoint::new(url));
        let mut manager = signed_in(endpoint);
        manager.select_file(thesis());
        let before = history_ids(&manager);

        manager.submit(&CancellationToken::new()).await.unwrap();

        assert_eq!(manager.error(), Some("server overloaded"));
        assert_eq!(history_ids(&manager), before);
    }

    #[tokio::test]
    async fn test_endpoint_500_with_unparseable_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/paraphrase")
            .with_status(500)
            .with_body("Internal Server Error")
            .create_async()
            .await;

        let url = format!("{}/paraphrase", server.url());
        let endpoint = Arc::new(HttpProcessingEndpoint::new(url));
        let mut manager = signed_in(endpoint);
        manager.select_file(thesis());
        let before = history_ids(&manager);

        manager.submit(&CancellationToken::new()).await.unwrap();

        assert_eq!(manager.error(), Some(UNKNOWN_ERROR_MESSAGE));
        assert_eq!(history_ids(&manager), before);
    }

    #[tokio::test]
    async fn test_cancelled_job_returns_to_selected() {
        let mut manager = signed_in(Arc::new(SilentEndpoint));
        manager.select_file(thesis());
        let before = history_ids(&manager);

        let pending = manager.begin_submit().unwrap();
        assert_eq!(manager.job_state(), Some(JobState::InFlight));
        assert!(manager.is_processing());

        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = pending.run(cancel).await;
        let status = manager.finish(outcome);

        assert_eq!(status, JobStatus::Cancelled);
        assert_eq!(manager.job_state(), Some(JobState::Selected));
        assert_eq!(manager.error(), None);
        assert_eq!(history_ids(&manager), before);
        assert!(!manager.is_processing());
    }

    #[tokio::test]
    async fn test_cancelling_one_of_two_requests_keeps_job_in_flight() {
        let mut manager = signed_in(Arc::new(SilentEndpoint));
        manager.select_file(thesis());

        let first = manager.begin_submit().unwrap();
        let second = manager.begin_submit().unwrap();
        assert_eq!(first.job_id(), second.job_id());
        assert_eq!(manager.in_flight(), 2);

        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = first.run(cancel.clone()).await;
        assert_eq!(manager.finish(outcome), JobStatus::Cancelled);
        assert_eq!(manager.in_flight(), 1);
        assert_eq!(manager.job_state(), Some(JobState::InFlight));

        let outcome = second.run(cancel).await;
        manager.finish(outcome);
        assert_eq!(manager.in_flight(), 0);
        assert_eq!(manager.job_state(), Some(JobState::Selected));
    }

    #[tokio::test]
    async fn test_cancel_from_another_task() {
        let mut manager = signed_in(Arc::new(SilentEndpoint));
        manager.select_file(thesis());

        let pending = manager.begin_submit().unwrap();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(pending.run(cancel.clone()));

        cancel.cancel();
        let outcome = handle.await.unwrap();

        assert_eq!(manager.finish(outcome), JobStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_overlapping_jobs_prepend_in_completion_order() {
        let mut manager = signed_in(ScriptedEndpoint::ok(b"out"));

        manager.select_file(SourceFile::new("first.docx", b"1".to_vec()));
        let first = manager.begin_submit().unwrap();
        manager.select_file(SourceFile::new("second.pdf", b"2".to_vec()));
        let second = manager.begin_submit().unwrap();
        assert_eq!(manager.in_flight(), 2);

        let cancel = CancellationToken::new();
        let second_outcome = second.run(cancel.clone()).await;
        manager.finish(second_outcome);
        assert!(manager.is_processing());

        let first_outcome = first.run(cancel).await;
        manager.finish(first_outcome);
        assert!(!manager.is_processing());

        let titles: Vec<&str> = manager
            .history()
            .iter()
            .take(2)
            .map(|e| e.title.as_str())
            .collect();
        assert_eq!(titles, vec!["first.docx", "second.pdf"]);

        // Only the job that is still selected owns the visible result
        assert_eq!(manager.current_job().unwrap().file.name, "second.pdf");
        assert_eq!(manager.download_name().as_deref(), Some("humanized_second.pdf"));
    }

    #[tokio::test]
    async fn test_select_file_clears_result_and_error() {
        let mut manager = signed_in(ScriptedEndpoint::ok(b"out"));
        manager.select_file(thesis());
        manager.submit(&CancellationToken::new()).await.unwrap();
        assert!(manager.result().is_some());

        manager.sign_in_failed();
        manager.select_file(SourceFile::new("Chapter_2.pdf", b"2".to_vec()));

        assert!(manager.result().is_none());
        assert_eq!(manager.error(), None);
        assert_eq!(manager.job_state(), Some(JobState::Selected));
        assert!(manager.download_name().is_none());
    }

    #[tokio::test]
    async fn test_delete_history_entry_is_idempotent() {
        let mut manager = UploadJobManager::new(ScriptedEndpoint::ok(b"x"));

        assert!(manager.delete_history_entry("2"));
        let after_once = history_ids(&manager);
        assert!(!manager.delete_history_entry("2"));
        assert_eq!(history_ids(&manager), after_once);
        assert!(!manager.delete_history_entry("does-not-exist"));
        assert_eq!(manager.history().len(), 5);
    }

    #[tokio::test]
    async fn test_delete_revokes_artifact_except_current_result() {
        let mut manager = signed_in(ScriptedEndpoint::ok(b"out"));

        manager.select_file(SourceFile::new("old.docx", b"1".to_vec()));
        let JobStatus::Completed { entry_id: old_id, artifact: old_artifact } =
            manager.submit(&CancellationToken::new()).await.unwrap()
        else {
            panic!("expected completion");
        };

        manager.select_file(SourceFile::new("new.docx", b"2".to_vec()));
        let JobStatus::Completed { entry_id: new_id, artifact: new_artifact } =
            manager.submit(&CancellationToken::new()).await.unwrap()
        else {
            panic!("expected completion");
        };

        manager.delete_history_entry(&old_id);
        manager.delete_history_entry(&new_id);

        assert!(!manager.artifacts().contains(&old_artifact));
        assert!(manager.artifacts().contains(&new_artifact));
        assert_eq!(manager.result(), Some(new_artifact));
    }

    #[tokio::test]
    async fn test_clear_all_history() {
        let mut manager = UploadJobManager::new(ScriptedEndpoint::ok(b"x"));

        assert_eq!(manager.clear_all_history(), 6);
        assert!(manager.history().is_empty());
        assert!(manager.filter_history("").is_empty());
        assert!(manager.filter_history("thesis").is_empty());
        assert_eq!(manager.clear_all_history(), 0);
    }

    #[tokio::test]
    async fn test_filter_and_displayed_history() {
        let manager = UploadJobManager::new(ScriptedEndpoint::ok(b"x"));

        let all = manager.filter_history("");
        assert_eq!(all.len(), 6);
        assert_eq!(all[0].id, "1");

        let matches: Vec<&str> = manager
            .filter_history("THESIS")
            .iter()
            .map(|e| e.title.as_str())
            .collect();
        assert_eq!(matches, vec!["Thesis_Final_Draft.docx"]);

        assert_eq!(manager.displayed_history("", false).len(), 4);
        assert_eq!(manager.displayed_history("", true).len(), 6);
    }

    #[tokio::test]
    async fn test_sign_in_decodes_profile() {
        let manager = signed_in(ScriptedEndpoint::ok(b"x"));

        assert!(manager.is_signed_in());
        let profile = manager.profile().unwrap();
        assert_eq!(profile.name.as_deref(), Some("Siti Rahma"));
        assert_eq!(profile.email.as_deref(), Some("siti@example.com"));
    }

    #[tokio::test]
    async fn test_undecodable_credential_still_signs_in() {
        let mut manager = UploadJobManager::new(ScriptedEndpoint::ok(b"x"));
        manager.sign_in("opaque-token");

        assert!(manager.is_signed_in());
        assert!(manager.profile().is_none());
        assert_eq!(manager.error(), None);
        assert_eq!(UserProfile::card_name(manager.profile()), "Guest User");
    }

    #[tokio::test]
    async fn test_empty_credential_is_ignored() {
        let mut manager = UploadJobManager::new(ScriptedEndpoint::ok(b"x"));
        manager.sign_in("   ");
        assert!(!manager.is_signed_in());
    }

    #[tokio::test]
    async fn test_sign_out_clears_session() {
        let mut manager = signed_in(ScriptedEndpoint::ok(b"out"));
        manager.select_file(thesis());
        manager.submit(&CancellationToken::new()).await.unwrap();

        manager.sign_out();

        assert!(!manager.is_signed_in());
        assert!(manager.profile().is_none());
        assert!(manager.result().is_none());
        assert_eq!(manager.job_state(), None);
        // History outlives the sign-in
        assert_eq!(manager.history().len(), 7);
    }

    #[tokio::test]
    async fn test_events_are_broadcast() {
        let mut manager = signed_in(ScriptedEndpoint::ok(b"out"));
        let mut events = manager.subscribe();

        manager.select_file(thesis());
        manager.submit(&CancellationToken::new()).await.unwrap();

        let mut received = Vec::new();
        while let Ok(event) = events.try_recv() {
            received.push(event);
        }

        assert_eq!(
            received[0],
            SessionEvent::FileSelected {
                name: "Thesis.docx".to_string(),
                size: 12
            }
        );
        assert!(matches!(received[1], SessionEvent::JobStarted { .. }));
        assert!(matches!(received[2], SessionEvent::JobCompleted { .. }));
        assert_eq!(received[3], SessionEvent::HistoryChanged { len: 7 });
    }

    #[tokio::test]
    async fn test_save_result_uses_download_name() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let mut manager = signed_in(ScriptedEndpoint::ok(b"human text"));
        manager.select_file(thesis());
        manager.submit(&CancellationToken::new()).await.unwrap();

        let path = manager.save_result(temp_dir.path()).await.unwrap();

        assert_eq!(path, temp_dir.path().join("humanized_Thesis.docx"));
        assert_eq!(std::fs::read(path).unwrap(), b"human text");
    }

    #[tokio::test]
    async fn test_from_config_respects_seed_flag_and_token() {
        let mut config = Config::default();
        config.session.seed_history = false;
        config.session.history_preview = 2;
        config.auth.token = Some(token());

        let manager = UploadJobManager::from_config(&config).unwrap();

        assert!(manager.history().is_empty());
        assert!(manager.is_signed_in());
        assert_eq!(
            manager.profile().and_then(|p| p.name.as_deref()),
            Some("Siti Rahma")
        );
    }
}
