//! Domain constants shared across crates.

/// Default polling interval between cycles (15 minutes).
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 900;

/// Default upper bound on one whole cycle before it is abandoned.
pub const DEFAULT_CYCLE_TIMEOUT_SECS: u64 = 120;

/// Default outbound request budget per rolling window.
pub const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 30;

/// Default rolling window for the rate limiter.
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Default bounded wait for a request slot before giving up.
pub const DEFAULT_RATE_LIMIT_MAX_WAIT_SECS: u64 = 10;

/// Default maximum attempts per logical upstream operation.
pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 3;

/// Default base delay for exponential backoff.
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1_000;

/// Default cap applied to any single backoff delay.
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 30_000;

/// Default proportional jitter applied to backoff delays.
pub const DEFAULT_RETRY_JITTER_RATIO: f64 = 0.25;

/// Consecutive failures before the circuit breaker opens.
pub const DEFAULT_BREAKER_FAILURE_THRESHOLD: u32 = 5;

/// Cooldown before an open breaker admits a probe (5 minutes).
pub const DEFAULT_BREAKER_COOLDOWN_SECS: u64 = 300;

/// Window during which a session is reused without a liveness probe.
pub const DEFAULT_SESSION_FRESHNESS_SECS: u64 = 600;

/// How many periods (current + preceding) a cycle tracks.
pub const DEFAULT_MAX_TRACKED_PERIODS: usize = 3;

/// Display bound on grades surfaced per period.
pub const DEFAULT_GRADES_DISPLAY_LIMIT: usize = 11;

/// Display bound on evaluations surfaced per period.
pub const DEFAULT_EVALUATIONS_DISPLAY_LIMIT: usize = 15;

/// Horizon, in days, for canteen menu fetches.
pub const DEFAULT_MENU_DAYS: u32 = 7;

/// Horizon, in days, for timetable fetches.
pub const DEFAULT_TIMETABLE_DAYS: u32 = 15;
