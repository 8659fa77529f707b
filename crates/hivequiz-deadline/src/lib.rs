//! Single-shot deadline timer for Hivequiz rooms.
//!
//! Every open question has a wall-clock deadline. When it passes, the room
//! reveals the answer exactly as if the host had pressed "reveal". A
//! [`DeadlineTimer`] holds at most one pending deadline:
//!
//! - [`arm`](DeadlineTimer::arm) replaces whatever was pending,
//! - [`cancel`](DeadlineTimer::cancel) clears it,
//! - [`wait`](DeadlineTimer::wait) resolves when it passes and disarms the
//!   timer, or pends forever while nothing is armed.
//!
//! # Integration
//!
//! The timer is owned by a room actor and sits inside its `tokio::select!`
//! loop, so "one timer per room" holds by construction and the timer is
//! dropped together with the room:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* may arm or cancel */ }
//!         fired = deadline.wait() => { room.reveal(); }
//!     }
//! }
//! ```

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// DeadlineFired
// ---------------------------------------------------------------------------

/// Information about a deadline that passed, returned by [`DeadlineTimer::wait`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineFired {
    /// Generation of the deadline that fired. Each [`DeadlineTimer::arm`]
    /// call starts a new generation.
    pub generation: u64,
    /// How long after the scheduled instant the timer was actually observed.
    pub late_by: Duration,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Counters describing how a timer has been used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeadlineMetrics {
    /// Times [`DeadlineTimer::arm`] was called.
    pub armed: u64,
    /// Arms that replaced a still-pending deadline.
    pub superseded: u64,
    /// Cancels that cleared a pending deadline.
    pub cancelled: u64,
    /// Deadlines that passed and were delivered by `wait`.
    pub fired: u64,
}

// ---------------------------------------------------------------------------
// Timer
// ---------------------------------------------------------------------------

/// A cancellable, re-armable, single-shot deadline.
#[derive(Debug, Default)]
pub struct DeadlineTimer {
    /// When the pending deadline passes, if one is armed.
    deadline: Option<Instant>,
    generation: u64,
    metrics: DeadlineMetrics,
}

impl DeadlineTimer {
    /// Creates a disarmed timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the timer to fire `after` from now, superseding any pending
    /// deadline. Returns the new generation.
    pub fn arm(&mut self, after: Duration) -> u64 {
        if self.deadline.is_some() {
            self.metrics.superseded += 1;
            debug!(generation = self.generation, "pending deadline superseded");
        }
        self.generation += 1;
        self.deadline = Some(Instant::now() + after);
        self.metrics.armed += 1;
        debug!(
            generation = self.generation,
            after_ms = after.as_millis() as u64,
            "deadline armed"
        );
        self.generation
    }

    /// Clears the pending deadline. Returns `true` if one was pending.
    ///
    /// Safe to call when nothing is armed, including right after the
    /// deadline fired.
    pub fn cancel(&mut self) -> bool {
        match self.deadline.take() {
            Some(_) => {
                self.metrics.cancelled += 1;
                debug!(generation = self.generation, "deadline cancelled");
                true
            }
            None => false,
        }
    }

    /// Waits for the pending deadline and disarms the timer.
    ///
    /// While disarmed this future never resolves, which lets it sit in a
    /// `tokio::select!` next to the command channel. Dropping the future
    /// before it resolves leaves the deadline armed.
    pub async fn wait(&mut self) -> DeadlineFired {
        let Some(deadline) = self.deadline else {
            std::future::pending::<()>().await;
            unreachable!()
        };

        time::sleep_until(deadline).await;

        let late_by = Instant::now().saturating_duration_since(deadline);
        self.deadline = None;
        self.metrics.fired += 1;
        trace!(
            generation = self.generation,
            late_ms = late_by.as_millis() as u64,
            "deadline fired"
        );

        DeadlineFired {
            generation: self.generation,
            late_by,
        }
    }

    /// Whether a deadline is pending.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left until the pending deadline, if any.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Generation of the most recent arm (0 if never armed).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Usage counters.
    pub fn metrics(&self) -> &DeadlineMetrics {
        &self.metrics
    }
}
