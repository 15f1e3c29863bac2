// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Invisible CAPTCHA collaborator.

use crate::error::CaptchaError;
use async_trait::async_trait;

/// Runs the invisible challenge and yields a proof-of-humanity token.
#[async_trait]
pub trait CaptchaProvider: Send + Sync {
    async fn execute(&self) -> Result<String, CaptchaError>;
}

/// Hands out a preconfigured token, e.g. a provider test key for staging.
#[derive(Debug, Clone)]
pub struct StaticCaptcha {
    token: Option<String>,
}

impl StaticCaptcha {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// A widget that never finished loading.
    pub fn unavailable() -> Self {
        Self { token: None }
    }
}

#[async_trait]
impl CaptchaProvider for StaticCaptcha {
    async fn execute(&self) -> Result<String, CaptchaError> {
        match &self.token {
            Some(token) if !token.is_empty() => Ok(token.clone()),
            Some(_) => Err(CaptchaError::Rejected("empty token".to_string())),
            None => Err(CaptchaError::NotReady),
        }
    }
}
