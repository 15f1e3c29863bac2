// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! End-to-end lead submission.
//!
//! One [`SubmissionPipeline::submit`] call runs, in order:
//! 1. throttle check, then attempt registration
//! 2. full-form validation
//! 3. CAPTCHA challenge when no token is held
//! 4. debounce, so a double click sends once
//! 5. CSRF token acquisition when none is held
//! 6. the submit request and interpretation of its response
//!
//! Steps 1 and 2 never touch the network. The attempt is registered before
//! validation, so invalid submissions spend attempts too; scripted retries
//! against the form hit the lock without ever reaching the backend.
//!
//! Every failure ends as a [`SubmissionOutcome`]; nothing is returned as an
//! error to the caller.

use crate::backend::{BackendResponse, LeadBackend, LeadPayload};
use crate::captcha::CaptchaProvider;
use crate::config::{Config, PaymentConfig};
use crate::error::GuardError;
use crate::payment::{Payer, PaymentRequest, PaymentResult};
use crate::scheduler::{Debounced, Debouncer};
use crate::throttle::SubmissionThrottler;
use crate::validator::{Field, LeadForm, LeadValidator, ValidationError, ValidationResult};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const SUCCESS_MESSAGE: &str =
    "¡Registro exitoso! Ahora puedes completar tu pago para asegurar tu cupo.";
const DUPLICATE_MESSAGE: &str = "Ya existe un registro con este email";
const GENERIC_ERROR: &str =
    "Ocurrió un error al enviar el formulario. Por favor, intenta nuevamente.";
const SECURITY_ERROR: &str =
    "No pudimos verificar tu solicitud. Recarga la página e intenta nuevamente.";

/// Retry delay assumed when a 429 carries no `retry_after`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Result of one submission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Success {
        message: String,
        record_id: Option<String>,
    },
    RateLimited {
        retry_after_secs: u64,
    },
    ValidationFailed {
        errors: ValidationResult,
    },
    /// Not a failure: the lead exists, so the visitor goes straight to payment.
    DuplicateEmail {
        message: String,
        name: String,
        email: String,
    },
    Error {
        message: String,
    },
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Success { .. })
    }

    /// Short tag for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SubmissionOutcome::Success { .. } => "success",
            SubmissionOutcome::RateLimited { .. } => "rate_limited",
            SubmissionOutcome::ValidationFailed { .. } => "validation_failed",
            SubmissionOutcome::DuplicateEmail { .. } => "duplicate_email",
            SubmissionOutcome::Error { .. } => "error",
        }
    }

    /// Status line shown under the form.
    pub fn message(&self) -> String {
        match self {
            SubmissionOutcome::Success { message, .. } => message.clone(),
            SubmissionOutcome::RateLimited { retry_after_secs } => format!(
                "Demasiados intentos. Por favor espera {retry_after_secs} segundos antes de intentar nuevamente."
            ),
            SubmissionOutcome::ValidationFailed { .. } => {
                "Por favor corrige los errores del formulario.".to_string()
            }
            SubmissionOutcome::DuplicateEmail { message, .. } => {
                format!("{message}. Puedes continuar directamente con el pago.")
            }
            SubmissionOutcome::Error { message } => message.clone(),
        }
    }

    /// Lead to carry into the payment step, if this outcome leads there.
    pub fn payer(&self, form: &LeadForm) -> Option<Payer> {
        match self {
            SubmissionOutcome::Success { .. } => Some(Payer {
                name: form.name.trim().to_string(),
                email: form.email.trim().to_string(),
            }),
            SubmissionOutcome::DuplicateEmail { name, email, .. } => Some(Payer {
                name: name.clone(),
                email: email.clone(),
            }),
            _ => None,
        }
    }
}

impl From<GuardError> for SubmissionOutcome {
    fn from(err: GuardError) -> Self {
        match err {
            GuardError::Validation(errors) => SubmissionOutcome::ValidationFailed { errors },
            GuardError::Throttled { retry_after_secs } => {
                SubmissionOutcome::RateLimited { retry_after_secs }
            }
            GuardError::SecurityToken(_) => SubmissionOutcome::Error {
                message: SECURITY_ERROR.to_string(),
            },
            GuardError::Backend(_) => SubmissionOutcome::Error {
                message: GENERIC_ERROR.to_string(),
            },
        }
    }
}

/// Decide what a submit response means for the visitor.
pub fn interpret(response: BackendResponse, form: &LeadForm) -> SubmissionOutcome {
    if response.is_success_status() && response.body.success {
        let body = response.body;
        return SubmissionOutcome::Success {
            message: body.message.unwrap_or_else(|| SUCCESS_MESSAGE.to_string()),
            record_id: body.record_id,
        };
    }

    let status = response.status;
    let body = response.body;

    if status == 429 {
        return SubmissionOutcome::RateLimited {
            retry_after_secs: body.retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        };
    }

    if status == 409 || body.error.as_deref().is_some_and(is_duplicate_email) {
        return SubmissionOutcome::DuplicateEmail {
            message: body.error.unwrap_or_else(|| DUPLICATE_MESSAGE.to_string()),
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
        };
    }

    if let Some(raw) = &body.validation_errors {
        let errors = server_validation_errors(raw);
        if !errors.is_empty() {
            return SubmissionOutcome::ValidationFailed { errors };
        }
    }

    SubmissionOutcome::Error {
        message: body
            .error
            .or(body.message)
            .unwrap_or_else(|| GENERIC_ERROR.to_string()),
    }
}

fn is_duplicate_email(error: &str) -> bool {
    let error = error.to_lowercase();
    error.contains("ya existe") || error.contains("already exists")
}

/// Map backend field errors onto form fields. Unknown keys are dropped.
fn server_validation_errors(raw: &serde_json::Value) -> ValidationResult {
    let Some(map) = raw.as_object() else {
        return ValidationResult::new();
    };

    map.iter()
        .filter_map(|(key, value)| {
            let field = key.parse::<Field>().ok()?;
            let message = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Array(items) => items
                    .iter()
                    .filter_map(serde_json::Value::as_str)
                    .collect::<Vec<_>>()
                    .join(" "),
                other => other.to_string(),
            };
            Some((field, ValidationError::Server { field, message }))
        })
        .collect()
}

#[derive(Debug, Default)]
struct SecurityTokens {
    captcha: Option<String>,
    csrf: Option<String>,
}

/// Clears the in-flight flag when the submission body finishes.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Lead submission pipeline for one form on one client.
pub struct SubmissionPipeline {
    throttler: Mutex<SubmissionThrottler>,
    validator: LeadValidator,
    backend: Arc<dyn LeadBackend>,
    captcha: Arc<dyn CaptchaProvider>,
    debouncer: Debouncer,
    tokens: Mutex<SecurityTokens>,
    is_submitting: AtomicBool,
    pending_payment: Mutex<Option<Payer>>,
    payment: PaymentConfig,
}

impl SubmissionPipeline {
    pub fn new(
        throttler: SubmissionThrottler,
        backend: Arc<dyn LeadBackend>,
        captcha: Arc<dyn CaptchaProvider>,
        config: &Config,
    ) -> Self {
        Self {
            throttler: Mutex::new(throttler),
            validator: LeadValidator::new(config.validation.clone()),
            backend,
            captcha,
            debouncer: Debouncer::new(config.submission.debounce_window()),
            tokens: Mutex::new(SecurityTokens::default()),
            is_submitting: AtomicBool::new(false),
            pending_payment: Mutex::new(None),
            payment: config.payment.clone(),
        }
    }

    /// Run one submission.
    ///
    /// Returns `None` when the call produced no outcome: either a later call
    /// inside the debounce window replaced it, or a submission was already in
    /// flight.
    pub async fn submit(&self, form: &LeadForm) -> Option<SubmissionOutcome> {
        if self.is_submitting() {
            debug!("Submission already in flight, ignoring");
            return None;
        }

        let outcome = match self.admit(form).await {
            Err(err) => {
                debug!(error = %err, "Submission refused before sending");
                SubmissionOutcome::from(err)
            }
            Ok(()) => {
                let form = form.clone();
                match self.debouncer.schedule(|| self.send(form)).await {
                    Debounced::Superseded => return None,
                    Debounced::Fired(result) => result.unwrap_or_else(|err| {
                        warn!(error = %err, "Submission failed");
                        SubmissionOutcome::from(err)
                    }),
                }
            }
        };

        info!(outcome = outcome.kind(), "Submission finished");
        Some(outcome)
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting.load(Ordering::SeqCst)
    }

    /// Drop a submission still waiting out its debounce window.
    pub fn cancel_pending(&self) {
        self.debouncer.cancel_pending();
    }

    /// Seconds left on the throttle lock, 0 when open.
    pub async fn remaining_block_time(&self) -> u64 {
        self.throttler.lock().await.remaining_block_time()
    }

    /// Lead kept from the last successful or duplicate submission.
    pub async fn pending_payment(&self) -> Option<Payer> {
        self.pending_payment.lock().await.clone()
    }

    /// Widget parameters for the pending payer.
    pub async fn payment_request(&self) -> Option<PaymentRequest> {
        self.pending_payment
            .lock()
            .await
            .as_ref()
            .map(|payer| PaymentRequest::new(payer, &self.payment.amount, &self.payment.currency))
    }

    /// Record what the payment widget reported and return the status line.
    pub async fn complete_payment(&self, result: &PaymentResult) -> String {
        match result {
            PaymentResult::Approved { order_id } => {
                info!(%order_id, "Payment approved");
                self.pending_payment.lock().await.take();
            }
            PaymentResult::Failed { message } => {
                warn!(%message, "Payment failed");
            }
        }
        result.status_message()
    }

    /// Throttle, validate and make sure a CAPTCHA token is held.
    async fn admit(&self, form: &LeadForm) -> Result<(), GuardError> {
        {
            let mut throttler = self.throttler.lock().await;
            if throttler.is_blocked() || !throttler.register_attempt() {
                return Err(GuardError::Throttled {
                    retry_after_secs: throttler.remaining_block_time(),
                });
            }
        }

        let errors = self.validator.validate_form(form);
        if !errors.is_valid() {
            return Err(GuardError::Validation(errors));
        }

        self.ensure_captcha().await?;
        Ok(())
    }

    /// The debounced body: tokens, request, interpretation.
    async fn send(&self, form: LeadForm) -> Result<SubmissionOutcome, GuardError> {
        let _in_flight = InFlight::enter(&self.is_submitting);

        let captcha_token = self.ensure_captcha().await?;
        let csrf_token = self.ensure_csrf().await?;
        let payload = LeadPayload::new(&form, csrf_token, captcha_token);

        let result = self.backend.submit(&payload).await;

        // Both tokens are single use.
        *self.tokens.lock().await = SecurityTokens::default();

        let response = result?;
        debug!(status = response.status, "Backend responded");
        let outcome = interpret(response, &form);

        if outcome.is_success() {
            self.throttler.lock().await.reset();
        }
        if let Some(payer) = outcome.payer(&form) {
            *self.pending_payment.lock().await = Some(payer);
        }

        Ok(outcome)
    }

    async fn ensure_captcha(&self) -> Result<String, GuardError> {
        let mut tokens = self.tokens.lock().await;
        if let Some(token) = &tokens.captcha {
            return Ok(token.clone());
        }

        debug!("Running CAPTCHA challenge");
        let token = self.captcha.execute().await?;
        tokens.captcha = Some(token.clone());
        Ok(token)
    }

    async fn ensure_csrf(&self) -> Result<String, GuardError> {
        let mut tokens = self.tokens.lock().await;
        if let Some(token) = &tokens.csrf {
            return Ok(token.clone());
        }

        let token = self
            .backend
            .fetch_csrf_token()
            .await
            .map_err(|e| GuardError::SecurityToken(e.to_string()))?;
        tokens.csrf = Some(token.clone());
        Ok(token)
    }
}
