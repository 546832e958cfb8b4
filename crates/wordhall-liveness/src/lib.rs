//! Liveness monitoring for Wordhall.
//!
//! Sessions only notice a dead peer when a read or write fails, and an
//! idle player produces neither. The [`LivenessMonitor`] closes that gap:
//!
//! - every sweep tick it pings sessions that have been quiet for a ping
//!   interval, and disconnects those that ignored too many pings;
//! - every roster tick it rebroadcasts the lobby roster.
//!
//! Both timers are [`TickScheduler`]s: fixed period, jittered start,
//! missed ticks skipped rather than replayed.

mod monitor;
mod scheduler;

pub use monitor::{LivenessConfig, LivenessMonitor, SweepReport};
pub use scheduler::{TickInfo, TickScheduler};
