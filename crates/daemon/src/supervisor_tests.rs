// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::AtomicU32;

#[yare::parameterized(
    normal = { Some(1000), true },
    going_away = { Some(1001), true },
    abnormal = { Some(1006), false },
    internal_error = { Some(1011), false },
    no_code = { None, false },
)]
fn close_code_classification(code: Option<u16>, graceful: bool) {
    let err = CdpError::Closed { code };
    assert_eq!(is_graceful_close(&err), graceful);
}

#[test]
fn backoff_grows_exponentially_with_jitter() {
    for (attempt, expected) in [(0u32, 1.0f64), (1, 2.0), (2, 4.0), (3, 8.0), (4, 16.0)] {
        let d = backoff_delay(attempt).as_secs_f64();
        assert!(
            d >= expected * 0.9 && d <= expected * 1.1,
            "attempt {attempt}: {d} out of ±10% of {expected}"
        );
    }
}

#[test]
fn backoff_is_capped_at_thirty_seconds() {
    for attempt in [5u32, 10, 30, 1000] {
        let d = backoff_delay(attempt).as_secs_f64();
        assert!(d <= 30.0 * 1.1, "attempt {attempt}: {d} above cap");
        assert!(d >= 30.0 * 0.9, "attempt {attempt}: {d} below capped range");
    }
}

#[tokio::test(start_paused = true)]
async fn run_backoff_makes_exactly_max_attempts() {
    let shutdown = CancellationToken::new();
    let calls = Arc::new(AtomicU32::new(0));
    let calls_in = Arc::clone(&calls);

    let ok = run_backoff(5, &shutdown, |_| Duration::from_secs(1), move || {
        let calls = Arc::clone(&calls_in);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("still down".to_string())
        }
    })
    .await;

    assert!(!ok);
    assert_eq!(calls.load(Ordering::SeqCst), 5);
}

#[tokio::test(start_paused = true)]
async fn run_backoff_stops_on_first_success() {
    let shutdown = CancellationToken::new();
    let calls = Arc::new(AtomicU32::new(0));
    let calls_in = Arc::clone(&calls);

    let ok = run_backoff(5, &shutdown, |_| Duration::from_millis(10), move || {
        let calls = Arc::clone(&calls_in);
        async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n >= 2 {
                Ok(())
            } else {
                Err("not yet".to_string())
            }
        }
    })
    .await;

    assert!(ok);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn run_backoff_aborts_when_shutdown_is_cancelled() {
    let shutdown = CancellationToken::new();
    shutdown.cancel();
    let calls = Arc::new(AtomicU32::new(0));
    let calls_in = Arc::clone(&calls);

    let ok = run_backoff(5, &shutdown, |_| Duration::from_secs(3600), move || {
        let calls = Arc::clone(&calls_in);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("unreachable".to_string())
        }
    })
    .await;

    assert!(!ok);
    assert_eq!(calls.load(Ordering::SeqCst), 0, "no attempt after shutdown");
}

#[tokio::test(start_paused = true)]
async fn run_backoff_with_zero_attempts_gives_up_immediately() {
    let shutdown = CancellationToken::new();
    let ok = run_backoff(0, &shutdown, |_| Duration::from_secs(1), || async {
        Err("never called".to_string())
    })
    .await;
    assert!(!ok);
}

#[tokio::test]
async fn try_reconnect_without_browser_handle_fails() {
    let ctx = Arc::new(Ctx::new(std::env::temp_dir().join("bp-supervisor-tests")));
    let err = try_reconnect(&ctx).await.unwrap_err();
    assert!(err.contains("no browser handle"));
}
