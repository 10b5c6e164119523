use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use songbridge_core::{run_to_convergence, ConvergencePlan, FlowError, Pacer, PauseKind};

#[derive(Default)]
struct CountingPacer {
    settles: Mutex<u32>,
}

#[async_trait]
impl Pacer for CountingPacer {
    async fn pause(&self, kind: PauseKind, _duration: Duration) {
        assert_eq!(kind, PauseKind::LoadSettle);
        *self.settles.lock().unwrap() += 1;
    }
}

fn plan(max_rounds: u32) -> ConvergencePlan {
    ConvergencePlan {
        max_rounds,
        round_delay: Duration::from_millis(2000),
    }
}

/// Pops scripted measurements; repeats the last one when the script runs dry.
struct Measurements(Mutex<Vec<usize>>);

impl Measurements {
    fn new(counts: &[usize]) -> Self {
        let mut counts = counts.to_vec();
        counts.reverse();
        Self(Mutex::new(counts))
    }

    fn next(&self) -> usize {
        let mut counts = self.0.lock().unwrap();
        if counts.len() > 1 {
            counts.pop().unwrap()
        } else {
            *counts.last().expect("measurement script is empty")
        }
    }
}

#[tokio::test]
async fn stable_count_converges_after_one_extra_round() {
    let pacer = CountingPacer::default();
    let counts = Measurements::new(&[5, 5]);
    let counts = &counts;
    let advances = Mutex::new(0u32);
    let advances_ref = &advances;

    let outcome = run_to_convergence(
        &plan(100),
        &pacer,
        move || async move {
            *advances_ref.lock().unwrap() += 1;
            Ok(())
        },
        move || async move { Ok(counts.next()) },
    )
    .await
    .expect("measure never fails here");

    assert_eq!(outcome.final_count, 5);
    assert!(!outcome.capped_out);
    assert_eq!(outcome.rounds, 1);
    assert_eq!(*advances.lock().unwrap(), 1);
    assert_eq!(*pacer.settles.lock().unwrap(), 1);
}

#[tokio::test]
async fn growing_count_caps_out_with_last_measurement() {
    let pacer = CountingPacer::default();
    let next = Mutex::new(0usize);
    let next = &next;

    let outcome = run_to_convergence(
        &plan(10),
        &pacer,
        move || async move { Ok(()) },
        move || async move {
            // Strictly increasing: never converges.
            let mut next = next.lock().unwrap();
            *next += 1;
            Ok(*next)
        },
    )
    .await
    .expect("measure never fails here");

    assert!(outcome.capped_out);
    assert_eq!(outcome.rounds, 10);
    assert_eq!(outcome.final_count, 10);
}

#[tokio::test]
async fn zero_items_forever_is_a_success_not_an_error() {
    let pacer = CountingPacer::default();

    let outcome = run_to_convergence(
        &plan(100),
        &pacer,
        move || async move { Ok(()) },
        move || async move { Ok(0) },
    )
    .await
    .expect("empty pages converge");

    assert_eq!(outcome.final_count, 0);
    assert!(!outcome.capped_out);
    assert_eq!(outcome.rounds, 1);
}

#[tokio::test]
async fn advance_failures_are_swallowed() {
    let pacer = CountingPacer::default();
    let counts = Measurements::new(&[3, 7, 7]);
    let counts = &counts;

    let outcome = run_to_convergence(
        &plan(100),
        &pacer,
        move || async move { Err(FlowError::new("scroll container went stale")) },
        move || async move { Ok(counts.next()) },
    )
    .await
    .expect("advance errors must not surface");

    assert_eq!(outcome.final_count, 7);
    assert!(!outcome.capped_out);
}

#[tokio::test]
async fn measure_failure_propagates() {
    let pacer = CountingPacer::default();

    let result = run_to_convergence(
        &plan(100),
        &pacer,
        move || async move { Ok(()) },
        move || async move { Err::<usize, _>(FlowError::new("page crashed")) },
    )
    .await;

    assert_eq!(result.unwrap_err().message(), "page crashed");
}
