// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test harness for the lead submission guard.
//!
//! Fake collaborators, lead generators and an outcome tally shared by the
//! integration and abuse-simulation tests.

#![allow(dead_code)]

pub mod fakes;
pub mod generators;
pub mod metrics;

use fakes::{FakeBackend, FakeCaptcha};
use lead_guard::clock::ManualClock;
use lead_guard::config::{Config, ThrottleConfig};
use lead_guard::storage::{KeyValueStore, MemoryStore};
use lead_guard::throttle::SubmissionThrottler;
use lead_guard::SubmissionPipeline;
use std::sync::Arc;

/// Fixed wall-clock start so block deadlines are predictable.
pub const START_MILLIS: i64 = 1_760_000_000_000;

/// A pipeline wired to fakes, with handles to inspect them.
pub struct Harness {
    pub pipeline: SubmissionPipeline,
    pub backend: Arc<FakeBackend>,
    pub captcha: Arc<FakeCaptcha>,
    pub store: MemoryStore,
    pub clock: ManualClock,
    pub config: Config,
}

impl Harness {
    pub fn new(max_attempts: u32, block_duration_ms: u64) -> Self {
        Self::with_parts(
            config(max_attempts, block_duration_ms),
            MemoryStore::new(),
            ManualClock::new(START_MILLIS),
            Arc::new(FakeBackend::new()),
            Arc::new(FakeCaptcha::new()),
        )
    }

    pub fn with_parts(
        config: Config,
        store: MemoryStore,
        clock: ManualClock,
        backend: Arc<FakeBackend>,
        captcha: Arc<FakeCaptcha>,
    ) -> Self {
        let throttler = throttler(&config, Arc::new(store.clone()), &clock);
        let pipeline = SubmissionPipeline::new(throttler, backend.clone(), captcha.clone(), &config);

        Self {
            pipeline,
            backend,
            captcha,
            store,
            clock,
            config,
        }
    }

    /// A second page load on the same client: same storage and clock, fresh
    /// pipeline and collaborators.
    pub fn reload(&self) -> Self {
        Self::with_parts(
            self.config.clone(),
            self.store.clone(),
            self.clock.clone(),
            Arc::new(FakeBackend::new()),
            Arc::new(FakeCaptcha::new()),
        )
    }

    /// Raw persisted throttle record.
    pub fn stored_record(&self) -> Option<serde_json::Value> {
        self.store
            .get(&self.config.throttle.storage_key)
            .ok()
            .flatten()
            .and_then(|raw| serde_json::from_str(&raw).ok())
    }
}

pub fn config(max_attempts: u32, block_duration_ms: u64) -> Config {
    Config {
        throttle: ThrottleConfig {
            max_attempts,
            block_duration_ms,
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn throttler(
    config: &Config,
    store: Arc<dyn KeyValueStore>,
    clock: &ManualClock,
) -> SubmissionThrottler {
    SubmissionThrottler::with_clock(config.throttle.clone(), store, Arc::new(clock.clone()))
}
