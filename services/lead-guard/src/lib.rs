// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Lead Submission Guard
//!
//! Client-side guard for the workshop landing page's lead-capture form:
//!
//! - Field sanitization and validation (name, email, phone, consent)
//! - Attempt throttling with a time-boxed lock persisted to local storage
//! - Debounced submission so a double click sends once
//! - CAPTCHA and CSRF token acquisition
//! - Interpretation of backend responses, including the duplicate-email
//!   path straight to payment

pub mod backend;
pub mod captcha;
pub mod clock;
pub mod config;
pub mod error;
pub mod form;
pub mod payment;
pub mod pipeline;
pub mod scheduler;
pub mod storage;
pub mod throttle;
pub mod validator;

pub use config::Config;
pub use pipeline::{SubmissionOutcome, SubmissionPipeline};
pub use throttle::{SubmissionThrottler, ThrottleState};
pub use validator::{sanitize, validate_field, validate_form, ValidationResult};
