//! The liveness monitor: pings quiet sessions, drops dead ones, and keeps
//! every client's roster fresh.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use wordhall_protocol::{ServerMessage, SessionId};
use wordhall_session::{LivenessVerdict, SharedRegistry};

use crate::TickScheduler;

/// Liveness timings.
///
/// Durations are milliseconds; use the accessor methods for
/// [`Duration`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    /// How often sessions are checked.
    pub sweep_interval_ms: u64,
    /// A session silent for this long gets a `PING`, and at most one per
    /// interval after that.
    pub ping_interval_ms: u64,
    /// How often the full roster is rebroadcast. 0 disables it.
    pub roster_interval_ms: u64,
    /// Unanswered pings in a row before a session is disconnected.
    /// 0 never disconnects.
    pub max_missed_pongs: u32,
    /// Upper bound on the random delay added to the first tick.
    pub initial_jitter_ms: u64,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            sweep_interval_ms: 1_000,
            ping_interval_ms: 5_000,
            roster_interval_ms: 60_000,
            max_missed_pongs: 3,
            initial_jitter_ms: 100,
        }
    }
}

impl LivenessConfig {
    /// [`sweep_interval_ms`](Self::sweep_interval_ms) as a [`Duration`].
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// [`ping_interval_ms`](Self::ping_interval_ms) as a [`Duration`].
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    /// [`roster_interval_ms`](Self::roster_interval_ms) as a [`Duration`].
    /// Zero means disabled.
    pub fn roster_interval(&self) -> Duration {
        Duration::from_millis(self.roster_interval_ms)
    }

    /// [`initial_jitter_ms`](Self::initial_jitter_ms) as a [`Duration`].
    pub fn initial_jitter(&self) -> Duration {
        Duration::from_millis(self.initial_jitter_ms)
    }
}

/// What one sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Sessions that were sent a `PING`.
    pub pinged: Vec<SessionId>,
    /// Sessions that were asked to disconnect.
    pub dropped: Vec<SessionId>,
}

/// Walks the registry on a timer. Runs as its own task; see
/// [`run`](Self::run).
pub struct LivenessMonitor {
    config: LivenessConfig,
    registry: SharedRegistry,
}

impl LivenessMonitor {
    /// Creates a monitor over `registry`. Nothing happens until
    /// [`run`](Self::run) or [`sweep`](Self::sweep) is called.
    pub fn new(config: LivenessConfig, registry: SharedRegistry) -> Self {
        Self { config, registry }
    }

    /// Runs until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let jitter = self.config.initial_jitter();
        let mut sweep_timer = TickScheduler::new(self.config.sweep_interval(), jitter);
        let mut roster_timer = TickScheduler::new(self.config.roster_interval(), jitter);
        info!(
            sweep_ms = self.config.sweep_interval_ms,
            ping_ms = self.config.ping_interval_ms,
            roster_ms = self.config.roster_interval_ms,
            max_missed = self.config.max_missed_pongs,
            "liveness monitor started"
        );
        if roster_timer.is_disabled() {
            debug!("periodic roster rebroadcast disabled");
        }

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                tick = sweep_timer.wait_for_tick() => {
                    if tick.overrun {
                        debug!(tick = tick.tick, skipped = tick.ticks_skipped, "late sweep");
                    }
                    self.sweep(Instant::now()).await;
                }
                _ = roster_timer.wait_for_tick() => {
                    let sent = self.broadcast_roster().await;
                    debug!(sent, "roster rebroadcast");
                }
            }
        }

        info!("liveness monitor stopped");
    }

    /// Checks every live session once, as of `now`.
    pub async fn sweep(&self, now: Instant) -> SweepReport {
        let ping_interval = self.config.ping_interval();
        let max_missed = self.config.max_missed_pongs;
        let mut report = SweepReport::default();

        let registry = self.registry.lock().await;
        for handle in registry.handles() {
            if !handle.is_running() {
                continue;
            }
            match handle.check_liveness(now, ping_interval, max_missed) {
                LivenessVerdict::Fresh | LivenessVerdict::AwaitingPong => {}
                LivenessVerdict::Ping => {
                    if handle.send(ServerMessage::Ping).is_ok() {
                        report.pinged.push(handle.id());
                    } else {
                        handle.request_shutdown();
                        report.dropped.push(handle.id());
                    }
                }
                LivenessVerdict::Dead { missed } => {
                    warn!(session_id = %handle.id(), missed, "no pong, disconnecting");
                    handle.request_shutdown();
                    report.dropped.push(handle.id());
                }
            }
        }

        if !report.pinged.is_empty() {
            debug!(count = report.pinged.len(), "pinged idle sessions");
        }
        report
    }

    /// Sends the current roster to every session.
    pub async fn broadcast_roster(&self) -> usize {
        self.registry.lock().await.broadcast_roster()
    }
}
