//! Fixed-window rate limiting per request source.

use crate::config::ContactConfig;
use crate::error::CommerceError;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
struct Window {
    start: Instant,
    count: u32,
}

/// Allows `max_requests` per source per window.
///
/// At most `max_sources` windows are tracked. When a new source arrives at
/// capacity, expired windows are dropped first, then the oldest ones.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    max_sources: usize,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration, max_sources: usize) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
            max_sources: max_sources.max(1),
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &ContactConfig) -> Self {
        Self::new(
            config.rate_limit_requests,
            config.rate_limit_window(),
            config.rate_limit_max_sources,
        )
    }

    /// Count one request from `source`, failing with `RateLimited` when the
    /// source has used up its window.
    pub async fn check(&self, source: &str) -> Result<(), CommerceError> {
        self.check_at(source, Instant::now()).await
    }

    /// [`RateLimiter::check`] with an explicit clock reading.
    pub async fn check_at(&self, source: &str, now: Instant) -> Result<(), CommerceError> {
        let mut windows = self.windows.lock().await;

        if let Some(window) = windows.get_mut(source) {
            let elapsed = now.saturating_duration_since(window.start);
            if elapsed >= self.window {
                *window = Window { start: now, count: 1 };
                return Ok(());
            }
            if window.count >= self.max_requests {
                let remaining = self.window - elapsed;
                let retry_after_secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
                warn!(source, count = window.count, retry_after_secs, "rate limit exceeded");
                return Err(CommerceError::RateLimited { retry_after_secs });
            }
            window.count += 1;
            return Ok(());
        }

        if windows.len() >= self.max_sources {
            self.prune(&mut windows, now);
        }
        windows.insert(source.to_string(), Window { start: now, count: 1 });
        Ok(())
    }

    /// Number of sources currently tracked.
    pub async fn tracked_sources(&self) -> usize {
        self.windows.lock().await.len()
    }

    fn prune(&self, windows: &mut HashMap<String, Window>, now: Instant) {
        let before = windows.len();
        windows.retain(|_, w| now.saturating_duration_since(w.start) < self.window);

        if windows.len() >= self.max_sources {
            let mut by_age: Vec<(Instant, String)> =
                windows.iter().map(|(k, w)| (w.start, k.clone())).collect();
            by_age.sort();
            let excess = windows.len() + 1 - self.max_sources;
            for (_, key) in by_age.into_iter().take(excess) {
                windows.remove(&key);
            }
        }
        debug!(before, after = windows.len(), "rate limiter pruned");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_limit_within_window() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60), 100);
        let t0 = Instant::now();
        limiter.check_at("1.2.3.4", t0).await.unwrap();
        limiter.check_at("1.2.3.4", t0).await.unwrap();
        match limiter.check_at("1.2.3.4", t0 + Duration::from_secs(10)).await {
            Err(CommerceError::RateLimited { retry_after_secs }) => assert_eq!(retry_after_secs, 50),
            other => panic!("unexpected result: {other:?}"),
        }
        limiter.check_at("5.6.7.8", t0).await.unwrap();
    }

    #[tokio::test]
    async fn test_window_resets() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60), 100);
        let t0 = Instant::now();
        limiter.check_at("a", t0).await.unwrap();
        assert!(limiter.check_at("a", t0 + Duration::from_secs(59)).await.is_err());
        limiter.check_at("a", t0 + Duration::from_secs(60)).await.unwrap();
    }

    #[tokio::test]
    async fn test_tracked_sources_are_bounded() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60), 3);
        let t0 = Instant::now();
        for (i, source) in ["a", "b", "c", "d"].iter().enumerate() {
            limiter
                .check_at(source, t0 + Duration::from_secs(i as u64))
                .await
                .unwrap();
        }
        assert_eq!(limiter.tracked_sources().await, 3);
        // "a" was the oldest and got dropped, so it starts a fresh window.
        limiter.check_at("a", t0 + Duration::from_secs(5)).await.unwrap();
    }
}
