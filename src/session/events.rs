// Session change notifications for observers

use uuid::Uuid;

/// Emitted by the session whenever its visible state changes.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SignedIn { name: Option<String> },
    SignedOut,
    FileSelected { name: String, size: u64 },
    JobStarted { job_id: Uuid },
    JobCompleted { job_id: Uuid, entry_id: String },
    JobFailed { job_id: Uuid, message: String },
    JobCancelled { job_id: Uuid },
    /// History contents changed; carries the new length.
    HistoryChanged { len: usize },
    /// Session error text changed.
    ErrorChanged(Option<String>),
}
