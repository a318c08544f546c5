//! Cancellation and deadlines for one Terraform operation
//!
//! Every trait method takes a [`Context`] first. Long-running work, most
//! notably the rate-limit retry loop, watches [`Context::done`] and gives up
//! once the operation is cancelled or its deadline passes.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, Instant};

/// Cheap to clone; clones share cancellation
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    deadline: Option<Instant>,
    done: watch::Receiver<bool>,
    done_tx: watch::Sender<bool>,
}

impl Context {
    pub fn new() -> Self {
        let (done_tx, done_rx) = watch::channel(false);

        Self {
            inner: Arc::new(ContextInner {
                deadline: None,
                done: done_rx,
                done_tx,
            }),
        }
    }

    /// Derive a context that is cancelled once `timeout` has elapsed.
    /// Must be called from within a tokio runtime.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a context that is cancelled at `deadline`.
    /// An earlier deadline already on the parent is kept.
    pub fn with_deadline(self, deadline: Instant) -> Self {
        let deadline = match self.inner.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        };

        let (done_tx, done_rx) = watch::channel(self.is_cancelled());

        let timer_tx = done_tx.clone();
        let mut parent_done = self.done();
        tokio::spawn(async move {
            tokio::select! {
                _ = time::sleep_until(deadline) => {}
                // a dropped parent never cancels its children
                Ok(_) = parent_done.wait_for(|cancelled| *cancelled) => {}
                _ = timer_tx.closed() => return,
            }
            let _ = timer_tx.send(true);
        });

        Self {
            inner: Arc::new(ContextInner {
                deadline: Some(deadline),
                done: done_rx,
                done_tx,
            }),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.done.borrow()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Time left before the deadline, `None` when there is no deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.inner
            .deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Returns a channel that flips to `true` when work done on behalf of this
    /// context should be cancelled
    pub fn done(&self) -> watch::Receiver<bool> {
        self.inner.done.clone()
    }

    pub fn cancel(&self) {
        let _ = self.inner.done_tx.send(true);
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("deadline", &self.inner.deadline)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
