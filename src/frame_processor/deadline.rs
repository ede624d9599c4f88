// SPDX-License-Identifier: GPL-3.0-only

//! Per-call time ceiling for detection

use std::time::{Duration, Instant};

/// Wall-clock budget started at the beginning of a detection call
///
/// The call's deadline is split into slots with [`Deadline::share`]: each
/// region gets a share of what is left, and each decoder a share of its
/// region's slot. Decoders poll [`Deadline::expired`] on their slot between
/// units of work (scan lines, matrix readers, QR grids) and stop early once
/// it fires.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn start(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// A zero budget is expired from the start
    pub fn expired(&self) -> bool {
        self.elapsed() >= self.budget
    }

    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.elapsed())
    }

    /// Slot for one of `parts` steps still to run, starting now
    ///
    /// A step that finishes early leaves its unused time to the steps
    /// after it.
    pub fn share(&self, parts: usize) -> Deadline {
        let parts = u32::try_from(parts.max(1)).unwrap_or(u32::MAX);
        Self::start(self.remaining() / parts)
    }
}
