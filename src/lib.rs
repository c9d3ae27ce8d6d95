// DocuHuman - session client for the document humanizing service

pub mod artifacts;
pub mod auth;
pub mod cli;
pub mod config;
pub mod history;
pub mod processing;
pub mod session;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use session::UploadJobManager;
pub use types::{AppError, AppResult};
