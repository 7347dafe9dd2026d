//! Integration tests for outbound rate limiting
use std::sync::Arc;
use std::time::Duration;

use liveosc::limiters::TokenBucketLimiter;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_thirty_requests_at_ten_per_second() {
    let limiter = TokenBucketLimiter::new(10);
    let start = Instant::now();

    for _ in 0..30 {
        limiter.acquire().await;
    }

    // bounded below by (30 - capacity) / rate
    assert!(start.elapsed() >= Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_zero_rate_never_waits() {
    let limiter = TokenBucketLimiter::new(0);
    let start = Instant::now();

    for _ in 0..100_000 {
        limiter.acquire().await;
    }

    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_negative_rate_fails_open() {
    let limiter = TokenBucketLimiter::new(-10);
    assert!(!limiter.is_enabled());
    for _ in 0..100 {
        assert!(limiter.try_acquire());
    }
}

#[tokio::test(start_paused = true)]
async fn test_bucket_refills_after_idle() {
    let limiter = TokenBucketLimiter::new(5);
    for _ in 0..5 {
        assert!(limiter.try_acquire());
    }
    assert!(!limiter.try_acquire());

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(limiter.available(), Some(2));

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(limiter.available(), Some(5));
}

#[tokio::test(start_paused = true)]
async fn test_no_caller_starves() {
    let limiter = Arc::new(TokenBucketLimiter::new(2));
    let start = Instant::now();
    let handles: Vec<_> = (0..10)
        .map(|_| {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move {
                for _ in 0..3 {
                    limiter.acquire().await;
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }
    // 30 tokens, 2 up front, the rest at 500ms each
    assert!(start.elapsed() >= Duration::from_secs(14));
}
