//! Tick timing helpers.
use std::time::Duration;

/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: u64 = 1_000;

/// Ticks without a fresh sampler reading before the held value goes stale.
pub const STALE_TICKS: u32 = 4;

/// Loop period for a configured millisecond cadence, at least 1 ms.
#[inline]
pub fn tick_period(period_ms: u64) -> Duration {
    Duration::from_millis(period_ms.max(1))
}

/// Loop rate in Hz for a millisecond cadence (informational).
#[inline]
pub fn rate_hz(period_ms: u64) -> f32 {
    MILLIS_PER_SEC as f32 / period_ms.max(1) as f32
}

/// Time left in the current tick after `elapsed` of work; zero once overrun.
#[inline]
pub fn sleep_budget(period: Duration, elapsed: Duration) -> Duration {
    period.saturating_sub(elapsed)
}

/// Age beyond which a held sampler reading is no longer used.
#[inline]
pub fn stale_after(period: Duration) -> Duration {
    period.saturating_mul(STALE_TICKS)
}
