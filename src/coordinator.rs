//! Dual-Timescale Coordinator
//!
//! Decides when the slow estimator may run. A request is dispatched only when
//! a transcript has arrived since the last attempt, the rendered signal has
//! settled onto the baseline, there is context to send, and no other request
//! holds the single slot.
//!
//! The slot is a one-permit semaphore; the flags mirror it for status output
//! and for the pending/in-flight bookkeeping.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use crate::config::CoordinatorConfig;
use crate::context::ContextBuffer;
use crate::errors::Result;

/// Slow-update bookkeeping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SlowFlags {
    /// A transcript arrived since the last slow attempt
    pub pending: bool,
    /// A slow request is executing
    pub in_flight: bool,
}

/// Why a slot was handed out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketKind {
    /// Triggered by settle detection; clears `pending` when done
    Settled,
    /// Startup warm-up; leaves `pending` alone
    Warmup,
}

/// Exclusive right to run one slow request.
///
/// Dropping the ticket clears `in_flight` (and `pending` for settle-triggered
/// requests) and frees the slot, whether the request succeeded, failed or
/// the task was cancelled.
#[derive(Debug)]
pub struct SlowTicket {
    context: String,
    kind: TicketKind,
    flags: Arc<Mutex<SlowFlags>>,
    _permit: OwnedSemaphorePermit,
}

impl SlowTicket {
    /// Text to send to the estimator
    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn kind(&self) -> TicketKind {
        self.kind
    }

    pub fn window_words(&self) -> usize {
        self.context.split_whitespace().count()
    }
}

impl Drop for SlowTicket {
    fn drop(&mut self) {
        let mut flags = self.flags.lock().unwrap_or_else(PoisonError::into_inner);
        flags.in_flight = false;
        if self.kind == TicketKind::Settled {
            flags.pending = false;
        }
    }
}

/// Scheduling state for the slow estimator
#[derive(Debug)]
pub struct SlowCoordinator {
    flags: Arc<Mutex<SlowFlags>>,
    slot: Arc<Semaphore>,
    context: Mutex<ContextBuffer>,
    settle_threshold: f64,
    window_words: usize,
}

impl SlowCoordinator {
    pub fn new(config: &CoordinatorConfig) -> Self {
        Self {
            flags: Arc::new(Mutex::new(SlowFlags::default())),
            slot: Arc::new(Semaphore::new(1)),
            context: Mutex::new(ContextBuffer::new(config.context_capacity)),
            settle_threshold: config.settle_threshold,
            window_words: config.window_words,
        }
    }

    pub fn settle_threshold(&self) -> f64 {
        self.settle_threshold
    }

    /// Settled when every per-dimension distance is strictly below the threshold.
    pub fn is_settled(&self, distance: &[f64]) -> bool {
        distance.iter().all(|d| *d < self.settle_threshold)
    }

    /// Adds transcript words to the rolling context; returns the buffered word count.
    pub fn record_context(&self, text: &str) -> Result<usize> {
        let mut context = self.context.lock()?;
        context.extend_from_text(text);
        Ok(context.len())
    }

    /// Something new happened: consider re-anchoring once things settle.
    pub fn mark_pending(&self) -> Result<()> {
        self.flags.lock()?.pending = true;
        Ok(())
    }

    pub fn flags(&self) -> Result<SlowFlags> {
        Ok(*self.flags.lock()?)
    }

    pub fn context_words(&self) -> Result<usize> {
        Ok(self.context.lock()?.len())
    }

    /// Hands out the slot when pending, idle, settled and context is non-empty.
    pub fn try_dispatch(&self, settled: bool) -> Result<Option<SlowTicket>> {
        let mut flags = self.flags.lock()?;
        if !flags.pending || flags.in_flight || !settled {
            return Ok(None);
        }

        let context = self.context.lock()?.recent_text(self.window_words);
        if context.is_empty() {
            return Ok(None);
        }

        let Ok(permit) = Arc::clone(&self.slot).try_acquire_owned() else {
            debug!("Slow slot busy; skipping dispatch");
            return Ok(None);
        };

        flags.in_flight = true;
        Ok(Some(SlowTicket {
            context,
            kind: TicketKind::Settled,
            flags: Arc::clone(&self.flags),
            _permit: permit,
        }))
    }

    /// Reserves the slot for the startup warm-up, if it is free.
    pub fn try_reserve_warmup(&self, text: &str) -> Result<Option<SlowTicket>> {
        let mut flags = self.flags.lock()?;
        if flags.in_flight {
            return Ok(None);
        }

        let Ok(permit) = Arc::clone(&self.slot).try_acquire_owned() else {
            return Ok(None);
        };

        flags.in_flight = true;
        Ok(Some(SlowTicket {
            context: text.to_string(),
            kind: TicketKind::Warmup,
            flags: Arc::clone(&self.flags),
            _permit: permit,
        }))
    }

    /// Free permits in the slot (0 or 1)
    pub fn available_slots(&self) -> usize {
        self.slot.available_permits()
    }
}
