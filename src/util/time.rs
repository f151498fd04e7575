//! Time utilities for the arena simulation

use std::time::{Duration, Instant};

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Tick rate configuration
pub const SIMULATION_TPS: u32 = 20; // 20 ticks per second
pub const TICK_DURATION_MILLIS: u64 = 1_000 / SIMULATION_TPS as u64;

/// Duration of one simulation tick
pub fn tick_duration() -> Duration {
    Duration::from_millis(TICK_DURATION_MILLIS)
}

/// Monotonic millisecond clock anchored at engine start.
///
/// Built on `tokio::time::Instant` so that paused-time tests advance it
/// together with the tick interval and the respawn timers.
#[derive(Debug, Clone)]
pub struct EngineClock {
    start: tokio::time::Instant,
}

impl EngineClock {
    pub fn new() -> Self {
        Self {
            start: tokio::time::Instant::now(),
        }
    }

    pub fn now_millis(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Default for EngineClock {
    fn default() -> Self {
        Self::new()
    }
}
