// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! In-memory stand-ins for the backend, CAPTCHA and storage collaborators.

use async_trait::async_trait;
use lead_guard::backend::{BackendResponse, LeadBackend, LeadPayload, SubmitResponseBody};
use lead_guard::captcha::CaptchaProvider;
use lead_guard::error::{BackendError, CaptchaError, StorageError};
use lead_guard::storage::KeyValueStore;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Scripted reply to one submit call.
#[derive(Debug, Clone)]
pub enum Reply {
    Respond(u16, serde_json::Value),
    Unreachable,
}

impl Reply {
    pub fn created(record_id: &str) -> Self {
        Reply::Respond(
            200,
            serde_json::json!({
                "success": true,
                "record_id": record_id,
                "message": "¡Registro exitoso!"
            }),
        )
    }
}

/// Lead API fake. Replies come from a script, then default to success.
#[derive(Debug, Default)]
pub struct FakeBackend {
    replies: Mutex<VecDeque<Reply>>,
    payloads: Mutex<Vec<LeadPayload>>,
    csrf_fetches: AtomicUsize,
    csrf_down: AtomicBool,
    latency: Mutex<Duration>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn set_csrf_down(&self, down: bool) {
        self.csrf_down.store(down, Ordering::SeqCst);
    }

    /// Delay every submit call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn payloads(&self) -> Vec<LeadPayload> {
        self.payloads.lock().unwrap().clone()
    }

    pub fn submit_count(&self) -> usize {
        self.payloads.lock().unwrap().len()
    }

    pub fn csrf_fetches(&self) -> usize {
        self.csrf_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LeadBackend for FakeBackend {
    async fn fetch_csrf_token(&self) -> Result<String, BackendError> {
        if self.csrf_down.load(Ordering::SeqCst) {
            return Err(BackendError::UnexpectedResponse("csrf endpoint down".to_string()));
        }
        let n = self.csrf_fetches.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("csrf-{n}"))
    }

    async fn submit(&self, payload: &LeadPayload) -> Result<BackendResponse, BackendError> {
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        self.payloads.lock().unwrap().push(payload.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::created("rec-default"));

        match reply {
            Reply::Respond(status, body) => Ok(BackendResponse {
                status,
                body: serde_json::from_value::<SubmitResponseBody>(body)
                    .map_err(|e| BackendError::UnexpectedResponse(e.to_string()))?,
            }),
            Reply::Unreachable => Err(BackendError::UnexpectedResponse(
                "connection refused".to_string(),
            )),
        }
    }
}

/// CAPTCHA fake handing out numbered tokens.
#[derive(Debug, Default)]
pub struct FakeCaptcha {
    executions: AtomicUsize,
    failing: AtomicBool,
}

impl FakeCaptcha {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn executions(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptchaProvider for FakeCaptcha {
    async fn execute(&self) -> Result<String, CaptchaError> {
        let n = self.executions.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing.load(Ordering::SeqCst) {
            return Err(CaptchaError::Rejected("low score".to_string()));
        }
        Ok(format!("captcha-{n}"))
    }
}

/// Storage that refuses every read and write, like a locked-down browser.
#[derive(Debug, Default)]
pub struct UnavailableStore;

impl KeyValueStore for UnavailableStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }
}
