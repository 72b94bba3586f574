//! End-to-end limiter behavior over the in-process backend.
//!
//! These tests drive the full limiter (facade, clock, backend) with a
//! mock clock, covering the decay, lockout, and configuration semantics
//! deterministically.

use adequate_rate_limiter::{
    AdequateRateLimiter, MemoryBackend, MockClock, QuotaError,
};
use std::sync::Arc;

const START: i64 = 1_700_000_000;

fn limiter() -> (AdequateRateLimiter<MemoryBackend>, Arc<MockClock>) {
    let clock = Arc::new(MockClock::new(START));
    let limiter = AdequateRateLimiter::with_clock(MemoryBackend::new(), clock.clone());
    (limiter, clock)
}

#[tokio::test]
async fn first_max_allowed_checks_decrease_then_deny() {
    let (limiter, _clock) = limiter();
    limiter.configure("api", 10, 3600, 300).await.unwrap();

    let mut previous = f64::INFINITY;
    for i in 1..=9 {
        let remaining = limiter.check("api", "keanu", 1).await.unwrap();
        assert!(remaining > 0.0, "check {} should be allowed", i);
        assert!(remaining < previous, "check {} should strictly decrease", i);
        previous = remaining;
    }
    // Nine events consumed: one tenth of the quota left
    assert!((previous - 0.1).abs() < 1e-9);

    // The 10th fills the bucket, the 11th is denied outright
    assert!(limiter.check("api", "keanu", 1).await.unwrap() <= 0.0);
    assert!(limiter.check("api", "keanu", 1).await.unwrap() <= 0.0);
}

#[tokio::test]
async fn allow_interprets_the_fraction() {
    let (limiter, _clock) = limiter();
    limiter.configure("api", 3, 60, 0).await.unwrap();

    assert!(limiter.allow("api", "alice").await.unwrap());
    assert!(limiter.allow("api", "alice").await.unwrap());
    assert!(!limiter.allow("api", "alice").await.unwrap());
}

#[tokio::test]
async fn lockout_denies_and_freezes_state() {
    let (limiter, clock) = limiter();
    limiter.configure("api", 10, 3600, 300).await.unwrap();

    for _ in 0..10 {
        limiter.check("api", "keanu", 1).await.unwrap();
    }
    let blocked = limiter.peek_state("api", "keanu").await.unwrap().unwrap();
    assert_eq!(blocked.score, 10.0);
    assert_eq!(blocked.last_blocked_at, START);

    // Every check inside the lockout window is denied and writes nothing
    for advance in [0, 100, 200] {
        clock.set(START + advance);
        assert!(limiter.check("api", "keanu", 1).await.unwrap() <= 0.0);
        let state = limiter.peek_state("api", "keanu").await.unwrap().unwrap();
        assert_eq!(state, blocked, "state must not move during lockout");
    }

    // The lockout boundary itself is still inside the window
    clock.set(START + 300);
    assert!(limiter.check("api", "keanu", 1).await.unwrap() <= 0.0);
}

#[tokio::test]
async fn partial_decay_past_lockout_still_denies() {
    let (limiter, clock) = limiter();
    limiter.configure("api", 10, 3600, 300).await.unwrap();

    for _ in 0..10 {
        limiter.check("api", "keanu", 1).await.unwrap();
    }

    // Just past the lockout the score has only shed ~0.84 units, so the
    // incoming event refills the bucket and re-arms the lockout.
    clock.set(START + 301);
    assert!(limiter.check("api", "keanu", 1).await.unwrap() <= 0.0);
    let state = limiter.peek_state("api", "keanu").await.unwrap().unwrap();
    assert_eq!(state.last_blocked_at, START + 301);
}

#[tokio::test]
async fn enough_decay_past_lockout_allows_again() {
    let (limiter, clock) = limiter();
    limiter.configure("api", 10, 3600, 300).await.unwrap();

    for _ in 0..10 {
        limiter.check("api", "keanu", 1).await.unwrap();
    }

    // 720s of decay sheds exactly 2.0 units: 8.0 + 1 = 9.0
    clock.set(START + 720);
    let remaining = limiter.check("api", "keanu", 1).await.unwrap();
    assert!((remaining - 0.1).abs() < 1e-9);
}

#[tokio::test]
async fn idle_actor_fully_recovers_after_window() {
    let (limiter, clock) = limiter();
    limiter.configure("api", 10, 3600, 300).await.unwrap();

    for _ in 0..10 {
        limiter.check("api", "keanu", 1).await.unwrap();
    }
    assert!(limiter.check("api", "keanu", 1).await.unwrap() <= 0.0);

    // Idle for the whole window (which also covers the lockout)
    clock.advance(3600);
    let remaining = limiter.check("api", "keanu", 1).await.unwrap();
    assert!((remaining - 0.9).abs() < 1e-9);
}

#[tokio::test]
async fn peek_reports_stored_score_without_decay() {
    let (limiter, clock) = limiter();
    limiter.configure("api", 10, 3600, 0).await.unwrap();

    for _ in 0..5 {
        limiter.check("api", "keanu", 1).await.unwrap();
    }
    assert!((limiter.remaining("api", "keanu").await.unwrap() - 0.5).abs() < 1e-9);

    // Half a window later the peek still reports the stored score; only
    // a consuming check applies decay (1800s sheds 5.0 units here).
    clock.advance(1800);
    assert!((limiter.remaining("api", "keanu").await.unwrap() - 0.5).abs() < 1e-9);

    let remaining = limiter.check("api", "keanu", 1).await.unwrap();
    assert!((remaining - 0.9).abs() < 1e-9);
}

#[tokio::test]
async fn peek_on_unknown_actor_returns_full_quota() {
    let (limiter, _clock) = limiter();
    limiter.configure("api", 10, 3600, 300).await.unwrap();

    assert_eq!(limiter.remaining("api", "nobody").await.unwrap(), 1.0);
    assert_eq!(limiter.peek_state("api", "nobody").await.unwrap(), None);
}

#[tokio::test]
async fn unconfigured_event_type_is_an_error_and_writes_nothing() {
    let (limiter, _clock) = limiter();

    let result = limiter.check("not-defined", "keanu", 1).await;
    assert!(matches!(
        result,
        Err(QuotaError::ConfigNotDefined(ref event)) if event == "not-defined"
    ));
    assert_eq!(limiter.peek_state("not-defined", "keanu").await.unwrap(), None);

    // Repeatedly, not just the first time
    assert!(limiter.check("not-defined", "keanu", 1).await.is_err());
}

#[tokio::test]
async fn configure_is_idempotent() {
    let (limiter, _clock) = limiter();

    limiter.configure("api", 10, 3600, 300).await.unwrap();
    for _ in 0..3 {
        limiter.check("api", "keanu", 1).await.unwrap();
    }

    // Re-applying the identical configuration changes nothing
    limiter.configure("api", 10, 3600, 300).await.unwrap();
    let remaining = limiter.check("api", "keanu", 1).await.unwrap();
    assert!((remaining - 0.6).abs() < 1e-9);
}

#[tokio::test]
async fn reconfigure_fully_replaces() {
    let (limiter, _clock) = limiter();

    limiter.configure("api", 100, 3600, 300).await.unwrap();
    limiter.configure("api", 2, 60, 0).await.unwrap();

    let config = limiter.peek_config("api").await.unwrap().unwrap();
    assert_eq!(config.max_allowed(), 2);
    assert_eq!(config.over_interval(), 60);
    assert_eq!(config.lockout_interval(), 0);

    // The tightened limit applies immediately
    assert!(limiter.allow("api", "keanu").await.unwrap());
    assert!(!limiter.allow("api", "keanu").await.unwrap());
}

#[tokio::test]
async fn invalid_configuration_is_rejected() {
    let (limiter, _clock) = limiter();

    assert!(matches!(
        limiter.configure("api", 0, 3600, 300).await,
        Err(QuotaError::Config(_))
    ));
    assert!(matches!(
        limiter.configure("api", 10, 0, 300).await,
        Err(QuotaError::Config(_))
    ));

    // Nothing was stored
    assert_eq!(limiter.peek_config("api").await.unwrap(), None);
}

#[tokio::test]
async fn state_expires_for_idle_actors() {
    let (limiter, clock) = limiter();
    limiter.configure("api", 10, 3600, 300).await.unwrap();

    limiter.check("api", "keanu", 1).await.unwrap();
    assert!(limiter.peek_state("api", "keanu").await.unwrap().is_some());

    // Past over_interval + lockout_interval the record is gone
    clock.advance(3900);
    assert_eq!(limiter.peek_state("api", "keanu").await.unwrap(), None);
}

#[tokio::test]
async fn actors_and_event_types_are_isolated() {
    let (limiter, _clock) = limiter();
    limiter.configure("login", 1, 60, 0).await.unwrap();
    limiter.configure("search", 100, 60, 0).await.unwrap();

    assert!(!limiter.allow("login", "alice").await.unwrap());
    assert!(limiter.allow("login", "bob").await.unwrap());
    assert!(limiter.allow("search", "alice").await.unwrap());
}
