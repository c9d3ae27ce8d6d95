//! Authentication
//!
//! The sign-in provider is an external collaborator that hands the client an
//! identity credential. This module only wraps that credential and decodes
//! its display fields.

pub mod credential;

pub use credential::{Credential, UserProfile};

/// Error text shown when the sign-in provider reports a failure.
pub const LOGIN_FAILED_MESSAGE: &str = "Login Failed. Please try again.";
