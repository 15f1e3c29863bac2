// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error taxonomy for the lead submission guard.
//!
//! None of these escape the pipeline: [`crate::pipeline::SubmissionPipeline`]
//! converts every [`GuardError`] into a user-facing outcome.

use crate::validator::ValidationResult;
use thiserror::Error;

/// Errors raised while guarding or performing a lead submission.
#[derive(Debug, Error)]
pub enum GuardError {
    /// One or more fields failed local validation.
    #[error("Form validation failed on {} field(s)", .0.len())]
    Validation(ValidationResult),

    /// The client is inside a throttle window.
    #[error("Too many attempts, retry in {retry_after_secs}s")]
    Throttled { retry_after_secs: u64 },

    /// CSRF or CAPTCHA token could not be acquired.
    #[error("Security token unavailable: {0}")]
    SecurityToken(String),

    /// The backend rejected the submission or could not be reached.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Failures talking to the backend collaborator.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Failures from the CAPTCHA collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptchaError {
    #[error("Challenge rejected: {0}")]
    Rejected(String),

    #[error("Challenge widget not ready")]
    NotReady,
}

/// Failures reading or writing local key/value storage.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage unavailable")]
    Unavailable,
}

impl From<CaptchaError> for GuardError {
    fn from(err: CaptchaError) -> Self {
        GuardError::SecurityToken(err.to_string())
    }
}
