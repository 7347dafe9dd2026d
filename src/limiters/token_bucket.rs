//! Token bucket rate limiting for outbound requests
//!
//! Tokens are added in whole units: elapsed time since the last refill is divided
//! by the per-token interval and the quotient is added, capped at capacity.
//! Callers that find the bucket empty sleep until the next token is due
//! instead of polling.
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::trace;

/// Bucket state: `0 <= tokens <= capacity` at every observation point
#[derive(Clone, Debug)]
pub struct TokenBucket {
    tokens: u32,
    capacity: u32,
    refill_interval: Duration,
    last_refill: Instant,
}

impl TokenBucket {
    /// A full bucket holding `requests_per_second` tokens, refilled one token per
    /// `1s / requests_per_second`.
    pub fn new(requests_per_second: u32, now: Instant) -> Self {
        let capacity = requests_per_second.max(1);
        let refill_interval = (Duration::from_secs(1) / capacity).max(Duration::from_nanos(1));
        Self {
            tokens: capacity,
            capacity,
            refill_interval,
            last_refill: now,
        }
    }

    /// Function for adding tokens to the bucket.
    /// Only whole tokens are added; the refill timestamp moves only when at least one is.
    pub fn add_tokens_to_bucket(&mut self, now: Instant) -> &mut Self {
        let elapsed = now.saturating_duration_since(self.last_refill);
        let tokens_to_add = elapsed.as_nanos() / self.refill_interval.as_nanos();
        if tokens_to_add > 0 {
            let tokens_to_add = u32::try_from(tokens_to_add).unwrap_or(u32::MAX);
            self.tokens = self.tokens.saturating_add(tokens_to_add).min(self.capacity);
            self.last_refill = now;
        }
        self
    }

    /// Subtract a full token (represents a request)
    pub fn decrement(&mut self) -> &mut Self {
        self.tokens = self.tokens.saturating_sub(1);
        self
    }

    /// Must have at least 1 full token
    pub fn check_if_allowed(&self) -> bool {
        self.tokens >= 1
    }

    pub fn tokens(&self) -> u32 {
        self.tokens
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn refill_interval(&self) -> Duration {
        self.refill_interval
    }

    /// How long until the next whole token accrues
    pub fn time_until_next_token(&self, now: Instant) -> Duration {
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.refill_interval
            .saturating_sub(elapsed)
            .max(Duration::from_millis(1))
    }
}

/// Outbound limiter shared by every caller of a client.
///
/// A rate of zero or below disables limiting: `acquire` returns immediately.
#[derive(Debug)]
pub struct TokenBucketLimiter {
    bucket: Option<Mutex<TokenBucket>>,
}

impl TokenBucketLimiter {
    pub fn new(requests_per_second: i64) -> Self {
        let bucket = u32::try_from(requests_per_second)
            .ok()
            .filter(|rps| *rps > 0)
            .map(|rps| Mutex::new(TokenBucket::new(rps, Instant::now())));
        Self { bucket }
    }

    pub fn unlimited() -> Self {
        Self { bucket: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.bucket.is_some()
    }

    /// Tokens currently in the bucket after a refill, `None` when disabled
    pub fn available(&self) -> Option<u32> {
        self.bucket.as_ref().map(|bucket| {
            let mut bucket = bucket.lock().unwrap_or_else(PoisonError::into_inner);
            bucket.add_tokens_to_bucket(Instant::now()).tokens()
        })
    }

    /// Take a token if one is available right now
    pub fn try_acquire(&self) -> bool {
        match &self.bucket {
            None => true,
            Some(bucket) => {
                let mut bucket = bucket.lock().unwrap_or_else(PoisonError::into_inner);
                bucket.add_tokens_to_bucket(Instant::now());
                if bucket.check_if_allowed() {
                    bucket.decrement();
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Wait until a token is available, then consume it.
    /// The bucket lock is released while sleeping.
    pub async fn acquire(&self) {
        let Some(bucket) = &self.bucket else {
            return;
        };
        loop {
            let wait = {
                let mut bucket = bucket.lock().unwrap_or_else(PoisonError::into_inner);
                let now = Instant::now();
                bucket.add_tokens_to_bucket(now);
                if bucket.check_if_allowed() {
                    bucket.decrement();
                    return;
                }
                bucket.time_until_next_token(now)
            };
            trace!("rate limited, sleeping {:?}", wait);
            sleep(wait).await;
        }
    }
}

impl Default for TokenBucketLimiter {
    fn default() -> Self {
        Self::unlimited()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn check_allowed() {
        let now = Instant::now();
        let mut bucket = TokenBucket::new(2, now);
        bucket.decrement();
        assert!(bucket.check_if_allowed());
        bucket.decrement();
        assert!(!bucket.check_if_allowed());
        // never goes below zero
        bucket.decrement();
        assert_eq!(bucket.tokens(), 0);
    }

    #[test]
    fn test_refill_interval() {
        let bucket = TokenBucket::new(10, Instant::now());
        assert_eq!(bucket.capacity(), 10);
        assert_eq!(bucket.refill_interval(), Duration::from_millis(100));
    }

    #[test]
    fn add_tokens_check_math() {
        let start = Instant::now();
        let mut bucket = TokenBucket::new(10, start);
        for _ in 0..10 {
            bucket.decrement();
        }
        assert_eq!(bucket.tokens(), 0);

        // less than one interval: nothing added, timestamp untouched
        bucket.add_tokens_to_bucket(start + Duration::from_millis(99));
        assert_eq!(bucket.tokens(), 0);

        // 2.5 intervals truncates to two tokens
        bucket.add_tokens_to_bucket(start + Duration::from_millis(250));
        assert_eq!(bucket.tokens(), 2);

        // the refill moved the timestamp to 250ms, so 50ms more adds nothing
        bucket.add_tokens_to_bucket(start + Duration::from_millis(300));
        assert_eq!(bucket.tokens(), 2);
    }

    #[test]
    fn test_token_bucket_overflow_protection() {
        let start = Instant::now();
        let mut bucket = TokenBucket::new(5, start);
        bucket.decrement();
        bucket.add_tokens_to_bucket(start + Duration::from_secs(3600));
        assert_eq!(bucket.tokens(), 5);
    }

    #[test]
    fn test_time_until_next_token() {
        let start = Instant::now();
        let bucket = TokenBucket::new(10, start);
        assert_eq!(
            bucket.time_until_next_token(start + Duration::from_millis(30)),
            Duration::from_millis(70)
        );
        // overdue still waits a little rather than spinning
        assert_eq!(
            bucket.time_until_next_token(start + Duration::from_secs(1)),
            Duration::from_millis(1)
        );
    }

    #[test]
    fn test_disabled_for_zero_and_negative_rates() {
        assert!(!TokenBucketLimiter::new(0).is_enabled());
        assert!(!TokenBucketLimiter::new(-5).is_enabled());
        assert!(TokenBucketLimiter::new(1).is_enabled());
        assert_eq!(TokenBucketLimiter::new(0).available(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_try_acquire_exhausts() {
        let limiter = TokenBucketLimiter::new(3);
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
        assert_eq!(limiter.available(), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_acquire_is_immediate() {
        let limiter = TokenBucketLimiter::new(0);
        let start = Instant::now();
        for _ in 0..10_000 {
            limiter.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_throttles_to_rate() {
        let limiter = TokenBucketLimiter::new(10);
        let start = Instant::now();
        for _ in 0..30 {
            limiter.acquire().await;
        }
        let elapsed = start.elapsed();
        // first ten are free, the remaining twenty cost 100ms each
        assert!(elapsed >= Duration::from_secs(2), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(2500), "elapsed {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_acquire() {
        let limiter = Arc::new(TokenBucketLimiter::new(5));
        let start = Instant::now();

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.acquire().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        // 15 tokens beyond capacity at 200ms each
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert!(limiter.available().unwrap() <= 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_available_never_exceeds_capacity() {
        let limiter = TokenBucketLimiter::new(4);
        limiter.acquire().await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(limiter.available(), Some(4));
    }
}
