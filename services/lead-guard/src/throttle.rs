// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Attempt throttler for lead submissions.
//!
//! Bounded attempts with a time-boxed lockout, persisted to local storage so
//! the lock survives a page reload:
//! 1. `Open`: fewer than `max_attempts` recorded, no block in force
//! 2. `Locked`: `blocked_until` lies in the future
//!
//! The lock trips on the attempt that reaches `max_attempts` and is lifted
//! lazily by the first [`SubmissionThrottler::is_blocked`] call after it
//! expires. There is no background timer.
//!
//! Storage is fail-open. If the record cannot be read the throttler starts
//! from defaults; if it cannot be written the in-memory state still governs
//! this session, so limiting degrades to session-only instead of refusing
//! legitimate submissions.

use crate::clock::{Clock, SystemClock};
use crate::config::ThrottleConfig;
use crate::storage::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Persisted throttle record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThrottleState {
    /// Attempts recorded since the last reset
    pub attempts: u32,
    /// End of the lock in epoch milliseconds, 0 when none was recorded
    pub blocked_until: i64,
}

/// Throttle state machine position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleStatus {
    Open,
    Locked,
}

/// Result of recording one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptDecision {
    /// Attempt counted, more remain
    Allowed,
    /// This attempt reached the cap and started the lock
    Tripped,
    /// A lock was already in force; nothing was counted
    AlreadyLocked,
}

impl ThrottleState {
    pub fn status(&self, now: i64) -> ThrottleStatus {
        if self.blocked_until > now {
            ThrottleStatus::Locked
        } else {
            ThrottleStatus::Open
        }
    }

    /// Clear a recorded lock whose window has passed. Returns whether the
    /// state changed.
    pub fn expire(&mut self, now: i64) -> bool {
        if self.blocked_until != 0 && now > self.blocked_until {
            *self = ThrottleState::default();
            true
        } else {
            false
        }
    }

    /// Whole seconds left on the lock, rounded up.
    pub fn remaining_secs(&self, now: i64) -> u64 {
        if self.blocked_until <= now {
            return 0;
        }
        let remaining_ms = (self.blocked_until - now) as u64;
        remaining_ms.div_ceil(1000)
    }

    pub fn record_attempt(&mut self, now: i64, max_attempts: u32, block_ms: u64) -> AttemptDecision {
        if self.status(now) == ThrottleStatus::Locked {
            return AttemptDecision::AlreadyLocked;
        }

        self.attempts = self.attempts.saturating_add(1);
        if self.attempts >= max_attempts {
            self.blocked_until = now.saturating_add(i64::try_from(block_ms).unwrap_or(i64::MAX));
            AttemptDecision::Tripped
        } else {
            AttemptDecision::Allowed
        }
    }
}

/// Per-client submission throttler backed by local storage.
pub struct SubmissionThrottler {
    config: ThrottleConfig,
    state: ThrottleState,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl SubmissionThrottler {
    /// Create a throttler on the system clock, restoring any stored state.
    pub fn new(config: ThrottleConfig, store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: ThrottleConfig,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let state = load_state(store.as_ref(), &config.storage_key);
        debug!(
            key = %config.storage_key,
            attempts = state.attempts,
            blocked_until = state.blocked_until,
            "Throttle state restored"
        );

        Self {
            config,
            state,
            store,
            clock,
        }
    }

    /// Whether a lock is in force. Lifts an expired lock as a side effect.
    pub fn is_blocked(&mut self) -> bool {
        let now = self.clock.now_millis();
        if self.state.expire(now) {
            info!("Throttle window elapsed, attempts reset");
            self.persist();
            return false;
        }
        self.state.status(now) == ThrottleStatus::Locked
    }

    /// Seconds until the lock lifts, 0 when not blocked.
    pub fn remaining_block_time(&mut self) -> u64 {
        if !self.is_blocked() {
            return 0;
        }
        self.state.remaining_secs(self.clock.now_millis())
    }

    /// Count one submission attempt. Returns `false` when the attempt is
    /// refused, including the attempt that trips the lock.
    pub fn register_attempt(&mut self) -> bool {
        if self.is_blocked() {
            debug!(attempts = self.state.attempts, "Attempt refused, throttle locked");
            return false;
        }

        let now = self.clock.now_millis();
        let decision = self.state.record_attempt(
            now,
            self.config.max_attempts,
            self.config.block_duration_ms,
        );
        self.persist();

        match decision {
            AttemptDecision::Allowed => {
                debug!(
                    attempts = self.state.attempts,
                    max_attempts = self.config.max_attempts,
                    "Attempt registered"
                );
                true
            }
            AttemptDecision::Tripped => {
                warn!(
                    attempts = self.state.attempts,
                    block_ms = self.config.block_duration_ms,
                    "Attempt cap reached, locking submissions"
                );
                false
            }
            AttemptDecision::AlreadyLocked => false,
        }
    }

    /// Zero the record after a confirmed submission.
    pub fn reset(&mut self) {
        self.state = ThrottleState::default();
        self.persist();
        debug!("Throttle state reset");
    }

    pub fn state(&self) -> ThrottleState {
        self.state
    }

    fn persist(&self) {
        let encoded = match serde_json::to_string(&self.state) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "Could not encode throttle state");
                return;
            }
        };

        if let Err(e) = self.store.set(&self.config.storage_key, &encoded) {
            warn!(error = %e, "Could not persist throttle state, limiting is session-only");
        }
    }
}

fn load_state(store: &dyn KeyValueStore, key: &str) -> ThrottleState {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return ThrottleState::default(),
        Err(e) => {
            warn!(error = %e, "Could not read throttle state, starting fresh");
            return ThrottleState::default();
        }
    };

    serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!(error = %e, "Stored throttle state is corrupt, starting fresh");
        ThrottleState::default()
    })
}
