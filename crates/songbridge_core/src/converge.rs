use std::future::Future;
use std::time::Duration;

use crate::{FlowResult, Pacer, PauseKind};

/// Parameters for one convergence run. Created fresh per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvergencePlan {
    pub max_rounds: u32,
    pub round_delay: Duration,
}

impl Default for ConvergencePlan {
    fn default() -> Self {
        Self {
            max_rounds: 100,
            round_delay: Duration::from_millis(2000),
        }
    }
}

/// Where a convergence run ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Convergence {
    /// The last measured count.
    pub final_count: usize,
    /// True when the round cap was hit before the count stabilized.
    /// A warning condition, not an error — the caller keeps what was loaded.
    pub capped_out: bool,
    /// Rounds performed before terminating.
    pub rounds: u32,
}

/// Repeatedly triggers `advance` and re-runs `measure` until the count stops
/// growing or `max_rounds` is reached.
///
/// Termination relies solely on `measure`: a failed `advance` is treated as a
/// no-op for that round. One round with no growth means converged — a count
/// that is stable at zero converges successfully with `final_count = 0`.
/// `measure` failures propagate to the caller.
pub async fn run_to_convergence<A, AFut, M, MFut>(
    plan: &ConvergencePlan,
    pacer: &dyn Pacer,
    mut advance: A,
    mut measure: M,
) -> FlowResult<Convergence>
where
    A: FnMut() -> AFut,
    AFut: Future<Output = FlowResult<()>>,
    M: FnMut() -> MFut,
    MFut: Future<Output = FlowResult<usize>>,
{
    let mut previous = 0usize;
    let mut current = 0usize;
    let mut rounds = 0u32;

    while rounds < plan.max_rounds {
        current = measure().await?;

        if current == previous && rounds > 0 {
            return Ok(Convergence {
                final_count: current,
                capped_out: false,
                rounds,
            });
        }

        // Advance failures (e.g. a transient scroll hiccup) are swallowed;
        // the next measurement decides whether anything happened.
        let _ = advance().await;

        pacer.pause(PauseKind::LoadSettle, plan.round_delay).await;

        previous = current;
        rounds += 1;
    }

    Ok(Convergence {
        final_count: current,
        capped_out: true,
        rounds,
    })
}
