use std::time::Duration;

use flow_logging::{flow_debug, flow_success, flow_warn};
use songbridge_core::{run_to_convergence, Convergence, ConvergencePlan, FlowResult, Pacer};

use crate::page::{ElementHandle, PageEngine};

/// One incremental-loading run: which items to count, where to scroll, and
/// how long to keep trying. Created fresh per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadAllPlan {
    /// Selector counted to detect convergence.
    pub item_selector: String,
    /// Scroll-container candidates, first match wins; when none matches the
    /// window itself is scrolled.
    pub container_selectors: Vec<String>,
    /// Item noun used in log lines ("songs", "playlists").
    pub item_name: String,
    pub max_rounds: u32,
    pub round_delay: Duration,
}

impl Default for LoadAllPlan {
    fn default() -> Self {
        Self {
            item_selector: String::new(),
            container_selectors: Vec::new(),
            item_name: "items".to_string(),
            max_rounds: 100,
            round_delay: Duration::from_millis(2000),
        }
    }
}

/// Scrolls until the item count stops growing, then reports what was found.
///
/// Scroll failures are absorbed round by round; only a failing count aborts.
/// Hitting the round cap is reported as a warning, never an error — the
/// caller keeps whatever was loaded.
pub async fn load_all_items(
    engine: &dyn PageEngine,
    pacer: &dyn Pacer,
    plan: &LoadAllPlan,
) -> FlowResult<Convergence> {
    let container = resolve_container(engine, &plan.container_selectors).await;
    let container = container.as_ref();
    let item_selector = plan.item_selector.as_str();
    let item_name = plan.item_name.as_str();

    let convergence_plan = ConvergencePlan {
        max_rounds: plan.max_rounds,
        round_delay: plan.round_delay,
    };

    let outcome = run_to_convergence(
        &convergence_plan,
        pacer,
        move || async move {
            engine.scroll_to_bottom(container).await?;
            // Nudge the last item into view so lazy loaders fire.
            let found = engine.locate(item_selector).await?;
            if let Some(last) = found.last() {
                engine.scroll_into_view(last).await?;
            }
            Ok(())
        },
        move || async move {
            let count = engine.count(item_selector).await?;
            flow_debug!("loaded {count} {item_name} so far");
            Ok(count)
        },
    )
    .await?;

    if outcome.capped_out {
        flow_warn!(
            "reached max scroll limit ({}) with {} {item_name}",
            plan.max_rounds,
            outcome.final_count
        );
    }
    flow_success!(
        "scrolling complete - found {} {item_name}",
        outcome.final_count
    );

    Ok(outcome)
}

async fn resolve_container(
    engine: &dyn PageEngine,
    candidates: &[String],
) -> Option<ElementHandle> {
    for selector in candidates {
        match engine.locate(selector).await {
            Ok(found) => {
                if let Some(handle) = found.into_iter().next() {
                    flow_debug!("using scroll container {selector}");
                    return Some(handle);
                }
            }
            Err(err) => {
                flow_debug!("scroll container probe {selector} failed: {err}");
            }
        }
    }
    None
}
