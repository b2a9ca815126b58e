//! Per-provider token-bucket throttling.

use governor::{DefaultDirectRateLimiter, Quota};
use nonzero_ext::nonzero;
use std::sync::Arc;
use std::time::Duration;

/// Errors building a rate limiter
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RateLimitError {
    /// Rate must be a positive, finite number of permits per second
    #[error("invalid rate limit: {0} permits/second")]
    InvalidRate(f64),
}

/// Shared throttle for one external provider.
///
/// Grants one permit at a time at a fixed steady-state rate. Clones share the
/// same bucket, so every request that hits a provider competes for the same
/// permits. Callers are suspended rather than rejected.
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<DefaultDirectRateLimiter>,
    period: Duration,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("period", &self.period)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    /// Create a limiter issuing `permits_per_second` permits, with a burst of one
    pub fn per_second(permits_per_second: f64) -> Result<Self, RateLimitError> {
        if !permits_per_second.is_finite() || permits_per_second <= 0.0 {
            return Err(RateLimitError::InvalidRate(permits_per_second));
        }

        let period = Duration::try_from_secs_f64(1.0 / permits_per_second)
            .map_err(|_| RateLimitError::InvalidRate(permits_per_second))?;
        let quota = Quota::with_period(period)
            .ok_or(RateLimitError::InvalidRate(permits_per_second))?
            .allow_burst(nonzero!(1u32));

        Ok(Self {
            limiter: Arc::new(DefaultDirectRateLimiter::direct(quota)),
            period,
        })
    }

    /// Wait until a permit is available
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    /// Minimum spacing between two grants
    pub fn period(&self) -> Duration {
        self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_invalid_rates() {
        assert!(RateLimiter::per_second(0.0).is_err());
        assert!(RateLimiter::per_second(-1.0).is_err());
        assert!(RateLimiter::per_second(f64::NAN).is_err());
        assert!(RateLimiter::per_second(f64::INFINITY).is_err());
        // Positive but so small the period overflows a Duration.
        assert_eq!(
            RateLimiter::per_second(1e-20).unwrap_err(),
            RateLimitError::InvalidRate(1e-20)
        );
        assert!(RateLimiter::per_second(f64::MIN_POSITIVE).is_err());
    }

    #[test]
    fn test_default_rate_period() {
        let limiter = RateLimiter::per_second(0.4).unwrap();
        assert_eq!(limiter.period(), Duration::from_millis(2500));
    }

    #[tokio::test]
    async fn test_first_permit_is_immediate() {
        let limiter = RateLimiter::per_second(0.4).unwrap();
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_grants_are_spaced() {
        let limiter = RateLimiter::per_second(20.0).unwrap();
        let period = limiter.period();

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move {
                    limiter.acquire().await;
                    Instant::now()
                })
            })
            .collect();

        let mut grants = Vec::new();
        for handle in handles {
            grants.push(handle.await.unwrap());
        }
        grants.sort();

        // Allow a little slack for the gap between the grant and the timestamp.
        let slack = Duration::from_millis(5);
        for pair in grants.windows(2) {
            assert!(
                pair[1] - pair[0] + slack >= period,
                "grants spaced by {:?}, expected at least {:?}",
                pair[1] - pair[0],
                period
            );
        }
    }

    #[tokio::test]
    async fn test_clones_share_bucket() {
        let limiter = RateLimiter::per_second(10.0).unwrap();
        let other = limiter.clone();

        let start = Instant::now();
        limiter.acquire().await;
        other.acquire().await;
        assert!(start.elapsed() + Duration::from_millis(5) >= Duration::from_millis(100));
    }
}
