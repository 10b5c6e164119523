use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use songbridge_core::{run_with_retry, FlowError, Pacer, PauseKind, RetryPolicy};

/// Records every requested pause instead of sleeping.
#[derive(Default)]
struct RecordingPacer {
    pauses: Mutex<Vec<(PauseKind, Duration)>>,
}

impl RecordingPacer {
    fn take(&self) -> Vec<(PauseKind, Duration)> {
        self.pauses.lock().unwrap().drain(..).collect()
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, kind: PauseKind, duration: Duration) {
        self.pauses.lock().unwrap().push((kind, duration));
    }
}

fn policy_ms(max_attempts: u32, initial: u64, multiplier: f64, max: u64) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_delay: Duration::from_millis(initial),
        backoff_multiplier: multiplier,
        max_delay: Duration::from_millis(max),
    }
}

#[tokio::test]
async fn succeeds_after_transient_failures_with_capped_backoff() {
    let pacer = RecordingPacer::default();
    let policy = policy_ms(5, 100, 2.0, 300);
    let calls = Mutex::new(0u32);
    let calls = &calls;

    let result = run_with_retry(&policy, &pacer, move || async move {
        let mut calls = calls.lock().unwrap();
        *calls += 1;
        if *calls <= 3 {
            Err(FlowError::new(format!("transient failure {}", *calls)))
        } else {
            Ok("loaded")
        }
    })
    .await;

    assert_eq!(result, Ok("loaded"));
    assert_eq!(*calls.lock().unwrap(), 4);

    // Backoff sequence 100, 200, then capped at 300 ms.
    let pauses = pacer.take();
    assert_eq!(
        pauses,
        vec![
            (PauseKind::Backoff, Duration::from_millis(100)),
            (PauseKind::Backoff, Duration::from_millis(200)),
            (PauseKind::Backoff, Duration::from_millis(300)),
        ]
    );
}

#[tokio::test]
async fn first_success_runs_exactly_once_without_pausing() {
    let pacer = RecordingPacer::default();
    let policy = RetryPolicy::default();
    let calls = Mutex::new(0u32);
    let calls = &calls;

    let result = run_with_retry(&policy, &pacer, move || async move {
        *calls.lock().unwrap() += 1;
        Ok(42)
    })
    .await;

    assert_eq!(result, Ok(42));
    assert_eq!(*calls.lock().unwrap(), 1);
    assert!(pacer.take().is_empty());
}

#[tokio::test]
async fn exhaustion_returns_error_from_final_attempt() {
    let pacer = RecordingPacer::default();
    let policy = policy_ms(3, 10, 2.0, 1000);
    let calls = Mutex::new(0u32);
    let calls = &calls;

    let result: Result<(), _> = run_with_retry(&policy, &pacer, move || async move {
        let mut calls = calls.lock().unwrap();
        *calls += 1;
        Err(FlowError::new(format!("boom {}", *calls)))
    })
    .await;

    assert_eq!(*calls.lock().unwrap(), 3);
    assert_eq!(result.unwrap_err().message(), "boom 3");
    // No backoff after the final attempt.
    assert_eq!(pacer.take().len(), 2);
}

#[tokio::test]
async fn zero_attempts_is_clamped_to_one() {
    let pacer = RecordingPacer::default();
    let policy = policy_ms(0, 10, 2.0, 1000);
    let calls = Mutex::new(0u32);
    let calls = &calls;

    let result = run_with_retry(&policy, &pacer, move || async move {
        *calls.lock().unwrap() += 1;
        Ok(())
    })
    .await;

    assert!(result.is_ok());
    assert_eq!(*calls.lock().unwrap(), 1);
}

#[test]
fn delay_after_is_capped_at_max_delay() {
    let policy = policy_ms(10, 1000, 2.0, 10_000);
    assert_eq!(policy.delay_after(1), Duration::from_millis(1000));
    assert_eq!(policy.delay_after(2), Duration::from_millis(2000));
    assert_eq!(policy.delay_after(4), Duration::from_millis(8000));
    assert_eq!(policy.delay_after(5), Duration::from_millis(10_000));
    assert_eq!(policy.delay_after(9), Duration::from_millis(10_000));
}
