// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Outcome tally for abuse simulations.

use lead_guard::SubmissionOutcome;
use std::collections::HashMap;
use std::fmt;

/// Counts submission results by kind. Calls without an outcome (debounced
/// away or refused while in flight) are counted as `no_outcome`.
#[derive(Debug, Default)]
pub struct OutcomeTally {
    counts: HashMap<&'static str, usize>,
    sequence: Vec<&'static str>,
}

impl OutcomeTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: Option<&SubmissionOutcome>) {
        let kind = outcome.map(SubmissionOutcome::kind).unwrap_or("no_outcome");
        *self.counts.entry(kind).or_insert(0) += 1;
        self.sequence.push(kind);
    }

    pub fn count(&self, kind: &str) -> usize {
        self.counts.get(kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.sequence.len()
    }

    /// Kinds in the order they were recorded.
    pub fn sequence(&self) -> &[&'static str] {
        &self.sequence
    }
}

impl fmt::Display for OutcomeTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Submission Tally ===")?;
        writeln!(f, "Total calls: {}", self.total())?;
        let mut kinds: Vec<_> = self.counts.iter().collect();
        kinds.sort();
        for (kind, count) in kinds {
            writeln!(f, "  {kind:<18} {count}")?;
        }
        Ok(())
    }
}
