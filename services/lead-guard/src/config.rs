// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the lead submission guard.
//!
//! Every value has a serde default, so a partial config file or an empty
//! environment both produce a working setup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Configuration for the lead submission guard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Attempt throttling
    #[serde(default)]
    pub throttle: ThrottleConfig,

    /// Field validation limits
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Backend endpoints and request pacing
    #[serde(default)]
    pub submission: SubmissionConfig,

    /// Payment step handed to the payment widget
    #[serde(default)]
    pub payment: PaymentConfig,
}

/// Attempt throttling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Attempts allowed before the lock trips (default: 5)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Lock duration in milliseconds (default: 60000)
    #[serde(default = "default_block_duration_ms")]
    pub block_duration_ms: u64,

    /// Key the throttle record is stored under
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// File backing local storage for the CLI
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,
}

/// Field validation limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_name_min_len")]
    pub name_min_len: usize,

    #[serde(default = "default_name_max_len")]
    pub name_max_len: usize,

    #[serde(default = "default_email_max_len")]
    pub email_max_len: usize,

    /// Minimum digits (and `+`) after stripping separators
    #[serde(default = "default_phone_min_digits")]
    pub phone_min_digits: usize,

    /// Maximum length of the phone number as typed
    #[serde(default = "default_phone_max_len")]
    pub phone_max_len: usize,
}

/// Backend endpoints and request pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionConfig {
    /// Base URL of the lead API (default: http://localhost:8000/api/)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// CSRF token endpoint, relative to `api_base`
    #[serde(default = "default_csrf_path")]
    pub csrf_path: String,

    /// Lead submission endpoint, relative to `api_base`
    #[serde(default = "default_submit_path")]
    pub submit_path: String,

    /// Debounce window in milliseconds (default: 500)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// HTTP request timeout in seconds (default: 15)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Payment step configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// Workshop price as shown to the payment widget (default: 47.00)
    #[serde(default = "default_amount")]
    pub amount: String,

    #[serde(default = "default_currency")]
    pub currency: String,
}

// Default value functions
fn default_max_attempts() -> u32 {
    5
}

fn default_block_duration_ms() -> u64 {
    60_000
}

fn default_storage_key() -> String {
    "lead_submission_throttle".to_string()
}

fn default_storage_path() -> PathBuf {
    PathBuf::from(".lead-guard-storage.json")
}

fn default_name_min_len() -> usize {
    2
}

fn default_name_max_len() -> usize {
    50
}

fn default_email_max_len() -> usize {
    100
}

fn default_phone_min_digits() -> usize {
    8
}

fn default_phone_max_len() -> usize {
    15
}

fn default_api_base() -> String {
    "http://localhost:8000/api/".to_string()
}

fn default_csrf_path() -> String {
    "csrf-token".to_string()
}

fn default_submit_path() -> String {
    "submit".to_string()
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_amount() -> String {
    "47.00".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            block_duration_ms: default_block_duration_ms(),
            storage_key: default_storage_key(),
            storage_path: default_storage_path(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            name_min_len: default_name_min_len(),
            name_max_len: default_name_max_len(),
            email_max_len: default_email_max_len(),
            phone_min_digits: default_phone_min_digits(),
            phone_max_len: default_phone_max_len(),
        }
    }
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            csrf_path: default_csrf_path(),
            submit_path: default_submit_path(),
            debounce_ms: default_debounce_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            amount: default_amount(),
            currency: default_currency(),
        }
    }
}

impl ThrottleConfig {
    /// Get the lock duration
    pub fn block_duration(&self) -> Duration {
        Duration::from_millis(self.block_duration_ms)
    }
}

impl SubmissionConfig {
    /// Get the debounce window
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Get the HTTP request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from `LEAD_GUARD_*` environment variables.
    ///
    /// Unset or unparsable variables keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(base) = lookup("LEAD_GUARD_API_BASE") {
            config.submission.api_base = base;
        }
        if let Some(v) = parsed(&lookup, "LEAD_GUARD_MAX_ATTEMPTS") {
            config.throttle.max_attempts = v;
        }
        if let Some(v) = parsed(&lookup, "LEAD_GUARD_BLOCK_DURATION_MS") {
            config.throttle.block_duration_ms = v;
        }
        if let Some(path) = lookup("LEAD_GUARD_STORAGE_PATH") {
            config.throttle.storage_path = PathBuf::from(path);
        }
        if let Some(v) = parsed(&lookup, "LEAD_GUARD_DEBOUNCE_MS") {
            config.submission.debounce_ms = v;
        }
        if let Some(v) = parsed(&lookup, "LEAD_GUARD_TIMEOUT_SECS") {
            config.submission.timeout_secs = v;
        }
        if let Some(amount) = lookup("LEAD_GUARD_WORKSHOP_PRICE") {
            config.payment.amount = amount;
        }
        if let Some(currency) = lookup("LEAD_GUARD_CURRENCY") {
            config.payment.currency = currency;
        }

        config
    }
}

fn parsed<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key).and_then(|v| v.parse().ok())
}
