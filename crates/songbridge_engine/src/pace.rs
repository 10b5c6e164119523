use std::time::Duration;

use async_trait::async_trait;
use flow_logging::flow_trace;
use songbridge_core::{Pacer, PauseKind};

/// Production pacer: real wall-clock suspension on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, kind: PauseKind, duration: Duration) {
        flow_trace!("pausing {:?} for {:?}", kind, duration);
        tokio::time::sleep(duration).await;
    }
}
