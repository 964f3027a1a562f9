//! Periodic timer service used for heartbeats.

use crate::error::{ProtocolError, Result};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub type TickFn = Box<dyn FnMut() + Send + 'static>;

/// Runs a callback every `period` until the connection ends.
pub trait IntervalTimer: Send + Sync {
    fn set_interval(&self, period: Duration, tick: TickFn);
}

/// Interval timer backed by tasks on a tokio runtime.
///
/// All intervals stop when [`shutdown`](Self::shutdown) is called or the timer is dropped.
#[derive(Debug)]
pub struct TokioIntervalTimer {
    handle: Handle,
    shutdown: CancellationToken,
}

impl TokioIntervalTimer {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            shutdown: CancellationToken::new(),
        }
    }

    /// Bind to the runtime of the calling task.
    ///
    /// # Errors
    /// Returns `ProtocolError::ConfigError` when called outside a tokio runtime
    pub fn current() -> Result<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| ProtocolError::ConfigError(format!("No tokio runtime: {e}")))
    }

    /// Stop every interval scheduled through this timer.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl IntervalTimer for TokioIntervalTimer {
    fn set_interval(&self, period: Duration, mut tick: TickFn) {
        if period.is_zero() {
            warn!("Refusing to schedule a zero-length interval");
            return;
        }

        let cancelled = self.shutdown.child_token();
        self.handle.spawn(async move {
            // First tick after one full period, not immediately
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => tick(),
                }
            }
            debug!(period_ms = period.as_millis() as u64, "Interval stopped");
        });
    }
}

impl Drop for TokioIntervalTimer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
