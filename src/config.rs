use embassy_time::Duration;

// Centralize all configuration constants
pub const SAMPLE_PERIOD_MS: u64 = 30;
pub const ENQUEUE_TIMEOUT_MS: u64 = 10;
pub const DEQUEUE_TIMEOUT_MS: u64 = 100;
pub const CHANNEL_LOCK_TIMEOUT_MS: u64 = 10;
pub const RESTART_SETTLE_MS: u64 = 1_000;
pub const STATS_REPORT_INTERVAL_MS: u64 = 10_000;

pub const SERIAL_BAUDRATE: u32 = 115_200;
pub const FAULT_BLINK_MS: u64 = 500;

// Moving average window per analog channel
pub const SMOOTHING_WINDOW: usize = 5;

// Channel sizes
pub const SAMPLE_QUEUE_DEPTH: usize = 100;
pub const LINK_EVENT_DEPTH: usize = 8;
pub const LINK_PAYLOAD_MAX: usize = 16;

/// Longest possible line is 53 bytes plus the `\r\n` terminator.
pub const LINE_CAPACITY: usize = 64;

/// Period and bounded waits used by one pipeline session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub sample_period: Duration,
    pub enqueue_timeout: Duration,
    pub dequeue_timeout: Duration,
    pub channel_lock_timeout: Duration,
    pub restart_settle: Duration,
    pub stats_interval: Duration,
}

impl Timings {
    pub const DEFAULT: Self = Self {
        sample_period: Duration::from_millis(SAMPLE_PERIOD_MS),
        enqueue_timeout: Duration::from_millis(ENQUEUE_TIMEOUT_MS),
        dequeue_timeout: Duration::from_millis(DEQUEUE_TIMEOUT_MS),
        channel_lock_timeout: Duration::from_millis(CHANNEL_LOCK_TIMEOUT_MS),
        restart_settle: Duration::from_millis(RESTART_SETTLE_MS),
        stats_interval: Duration::from_millis(STATS_REPORT_INTERVAL_MS),
    };
}
