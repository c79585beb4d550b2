//! Rolling-window rate limiter
//!
//! A single window of admission timestamps is shared by every fetch path that holds the
//! limiter, so the quota is global rather than per caller. The limits can be changed in
//! place; every holder sees the new values on its next admission.

use crate::config::RateLimitConfig;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Caps outbound requests to `quota` per rolling window
#[derive(Debug)]
pub struct RateLimiter {
    quota: AtomicUsize,
    window_nanos: AtomicU64,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter admitting `quota` requests per `window`
    ///
    /// A quota of zero is treated as one.
    pub fn new(quota: usize, window: Duration) -> Self {
        let quota = quota.max(1);
        Self {
            quota: AtomicUsize::new(quota),
            window_nanos: AtomicU64::new(duration_nanos(window)),
            timestamps: Mutex::new(VecDeque::with_capacity(quota)),
        }
    }

    /// Creates a limiter from configuration
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.requests, Duration::from_millis(config.window_ms))
    }

    /// Returns the configured quota
    pub fn quota(&self) -> usize {
        self.quota.load(Ordering::Relaxed)
    }

    /// Returns the configured window length
    pub fn window(&self) -> Duration {
        Duration::from_nanos(self.window_nanos.load(Ordering::Relaxed))
    }

    /// Changes the quota and window for every holder of this limiter
    ///
    /// Admissions already recorded stay in the window and count against the new quota.
    pub fn reconfigure(&self, quota: usize, window: Duration) {
        self.quota.store(quota.max(1), Ordering::Relaxed);
        self.window_nanos.store(duration_nanos(window), Ordering::Relaxed);
        tracing::debug!("Rate limit set to {} per {:?}", quota.max(1), window);
    }

    /// Waits until one more request fits in the window, then records it
    ///
    /// The window lock is held while sleeping, so the admission check and the timestamp
    /// record happen atomically with respect to other callers.
    pub async fn admit(&self) {
        let mut timestamps = self.timestamps.lock().await;

        loop {
            let now = Instant::now();
            self.purge(&mut timestamps, now);

            if timestamps.len() < self.quota() {
                break;
            }

            let wait = match timestamps.front() {
                Some(earliest) => self.window().saturating_sub(now.duration_since(*earliest)),
                None => Duration::ZERO,
            };

            tracing::trace!(
                "Rate limit reached ({} in window), sleeping {:?}",
                timestamps.len(),
                wait
            );
            tokio::time::sleep(wait).await;
        }

        timestamps.push_back(Instant::now());
    }

    /// Returns the number of admissions still inside the window
    pub async fn in_window(&self) -> usize {
        let mut timestamps = self.timestamps.lock().await;
        self.purge(&mut timestamps, Instant::now());
        timestamps.len()
    }

    /// Drops timestamps older than the window and anything beyond the quota
    fn purge(&self, timestamps: &mut VecDeque<Instant>, now: Instant) {
        let window = self.window();
        while let Some(earliest) = timestamps.front() {
            if now.duration_since(*earliest) >= window {
                timestamps.pop_front();
            } else {
                break;
            }
        }
        while timestamps.len() > self.quota() {
            timestamps.pop_front();
        }
    }
}

fn duration_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::from_config(&RateLimitConfig::default())
    }
}
