//! Session
//!
//! One interactive session: a signed-in user selecting documents, sending
//! them for processing and managing the resulting history.
//!
//! ```text
//!   select_file ──▶ Selected ──submit──▶ InFlight ──┬──▶ Completed
//!        ▲                                   │       └──▶ Failed
//!        └──────────── (any state) ◀─ cancel ┘
//! ```

pub mod events;
pub mod job;
pub mod manager;

pub use events::SessionEvent;
pub use job::{Job, JobState, SourceFile, ACCEPTED_EXTENSIONS};
pub use manager::{JobOutcome, JobStatus, PendingJob, Resolution, UploadJobManager};
