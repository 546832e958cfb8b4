//! Fixed-period tick scheduler.
//!
//! Drives the liveness sweep and the roster rebroadcast. Each scheduler
//! fires once per period, with random jitter on the *first* tick so the
//! two timers (and several servers started together) don't line up.
//!
//! # Overruns
//!
//! When a tick fires late (the sweep took long, or the runtime was busy),
//! the missed ticks are skipped and the next one is scheduled from *now*.
//! A stalled monitor never wakes up to a burst of back-to-back sweeps.
//!
//! # Disabled mode
//!
//! A zero period means the scheduler never fires:
//! [`TickScheduler::wait_for_tick`] pends forever, which is exactly what a
//! `tokio::select!` branch for a disabled timer should do.

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

/// Information about a fired tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickInfo {
    /// Monotonically increasing tick number (starts at 1).
    pub tick: u64,
    /// `true` if the tick fired more than 10% of a period late.
    pub overrun: bool,
    /// How many whole periods were skipped because of the overrun.
    pub ticks_skipped: u64,
}

/// Fixed-period scheduler with skip-on-overrun.
pub struct TickScheduler {
    period: Option<Duration>,
    next_tick: Option<Instant>,
    tick_count: u64,
}

impl TickScheduler {
    /// Creates a scheduler firing every `period`; the first tick is
    /// delayed by an extra random `0..max_jitter`.
    pub fn new(period: Duration, max_jitter: Duration) -> Self {
        if period.is_zero() {
            debug!("tick scheduler created disabled");
            return Self {
                period: None,
                next_tick: None,
                tick_count: 0,
            };
        }

        let jitter = if max_jitter.is_zero() {
            Duration::ZERO
        } else {
            let us = rand::rng().random_range(0..max_jitter.as_micros().max(1) as u64);
            Duration::from_micros(us)
        };
        debug!(
            period_ms = period.as_millis() as u64,
            jitter_us = jitter.as_micros() as u64,
            "tick scheduler created"
        );

        Self {
            period: Some(period),
            next_tick: Some(Instant::now() + period + jitter),
            tick_count: 0,
        }
    }

    /// Waits until the next tick is due.
    ///
    /// Pends forever while disabled.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let (next, period) = match (self.next_tick, self.period) {
            (Some(next), Some(period)) => (next, period),
            _ => std::future::pending().await,
        };

        time::sleep_until(next).await;

        let now = Instant::now();
        self.tick_count += 1;

        let late_by = now.saturating_duration_since(next);
        let overrun = late_by > period / 10;
        let mut ticks_skipped = 0;
        if overrun {
            ticks_skipped = (late_by.as_nanos() / period.as_nanos()) as u64;
            if ticks_skipped > 0 {
                warn!(
                    tick = self.tick_count,
                    skipped = ticks_skipped,
                    late_ms = late_by.as_millis() as u64,
                    "tick overrun, skipping ahead"
                );
            }
        }
        self.next_tick = Some(now + period);

        trace!(tick = self.tick_count, overrun, "tick fired");
        TickInfo {
            tick: self.tick_count,
            overrun,
            ticks_skipped,
        }
    }

    /// `true` if created with a zero period.
    pub fn is_disabled(&self) -> bool {
        self.period.is_none()
    }
}
