// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Live state of the lead form: values, per-field errors and the status line.

use crate::pipeline::SubmissionOutcome;
use crate::validator::{validate_field, validate_form, Field, FieldValue, LeadForm, ValidationResult};

/// Status shown under the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormStatus {
    #[default]
    Idle,
    Success(String),
    RateLimited(String),
    Invalid(String),
    Duplicate(String),
    Error(String),
}

#[derive(Debug, Clone, Default)]
pub struct LeadFormState {
    form: LeadForm,
    errors: ValidationResult,
    status: FormStatus,
}

impl LeadFormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form(&self) -> &LeadForm {
        &self.form
    }

    pub fn errors(&self) -> &ValidationResult {
        &self.errors
    }

    pub fn status(&self) -> &FormStatus {
        &self.status
    }

    /// Store a keystroke and revalidate that field only.
    pub fn set_field(&mut self, name: &str, value: impl Into<FieldValue>) {
        let value = value.into();
        let error = validate_field(name, &value);

        if let Ok(field) = name.parse::<Field>() {
            self.form.set(field, value);
            self.errors.set(field, error);
        } else if name == "website" {
            if let FieldValue::Text(s) = value {
                self.form.website = s;
            }
        }
    }

    /// Full-form check run when the visitor presses submit.
    pub fn submit_errors(&mut self) -> &ValidationResult {
        self.errors = validate_form(&self.form);
        &self.errors
    }

    /// Reflect a pipeline outcome in the form.
    pub fn apply(&mut self, outcome: &SubmissionOutcome) {
        let message = outcome.message();
        self.status = match outcome {
            SubmissionOutcome::Success { .. } => {
                self.form = LeadForm::default();
                self.errors = ValidationResult::new();
                FormStatus::Success(message)
            }
            SubmissionOutcome::RateLimited { .. } => FormStatus::RateLimited(message),
            SubmissionOutcome::ValidationFailed { errors } => {
                self.errors = errors.clone();
                FormStatus::Invalid(message)
            }
            SubmissionOutcome::DuplicateEmail { .. } => FormStatus::Duplicate(message),
            SubmissionOutcome::Error { .. } => FormStatus::Error(message),
        };
    }
}
