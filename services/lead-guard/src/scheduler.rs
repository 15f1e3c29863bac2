// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Single-slot debounce scheduler.
//!
//! Each [`Debouncer::schedule`] call takes the one pending slot, replacing
//! whatever was there, then waits out the window. Only the call still
//! holding the slot when its window ends runs; the others come back as
//! [`Debounced::Superseded`] without running their job.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Outcome of a debounced call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Debounced<T> {
    /// The job ran and produced a value
    Fired(T),
    /// A later call (or [`Debouncer::cancel_pending`]) took the slot
    Superseded,
}

impl<T> Debounced<T> {
    pub fn fired(self) -> Option<T> {
        match self {
            Debounced::Fired(v) => Some(v),
            Debounced::Superseded => None,
        }
    }
}

/// Trailing-edge debouncer with one pending slot.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    /// Ticket of the call currently holding the slot
    slot: AtomicU64,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            slot: AtomicU64::new(0),
        }
    }

    /// Register `job` as the pending call and run it once the window passes
    /// undisturbed.
    pub async fn schedule<F, Fut, T>(&self, job: F) -> Debounced<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let ticket = self.slot.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.window).await;

        if self.slot.load(Ordering::SeqCst) != ticket {
            debug!(ticket, "Debounced call superseded");
            return Debounced::Superseded;
        }

        Debounced::Fired(job().await)
    }

    /// Drop whatever call is pending. It will report `Superseded`.
    pub fn cancel_pending(&self) {
        self.slot.fetch_add(1, Ordering::SeqCst);
    }
}
