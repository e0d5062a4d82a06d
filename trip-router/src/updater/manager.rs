//! Running updaters on a schedule.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ConfigError;
use crate::writer::{ApplyReport, GraphWriter, MutationUnit};

use super::error::UpdaterError;

/// A source of graph changes polled at a fixed period.
pub trait PollingUpdater: Send + 'static {
    fn name(&self) -> &str;

    fn poll_period(&self) -> Duration;

    /// Fetch the outside world and describe the graph changes it implies.
    fn poll(&mut self) -> impl Future<Output = Result<MutationUnit, UpdaterError>> + Send;
}

/// Poll once and wait for the writer to apply the result.
pub async fn poll_and_submit<U: PollingUpdater>(
    writer: &GraphWriter,
    updater: &mut U,
) -> Result<ApplyReport, UpdaterError> {
    let unit = updater.poll().await?;
    if unit.is_empty() {
        return Ok(ApplyReport::default());
    }
    Ok(writer.submit(unit)?.applied().await?)
}

/// Owns the graph writer and one polling task per updater.
pub struct UpdaterManager {
    writer: Arc<GraphWriter>,
    tasks: Vec<JoinHandle<()>>,
}

impl UpdaterManager {
    pub fn new(writer: GraphWriter) -> Self {
        Self {
            writer: Arc::new(writer),
            tasks: Vec::new(),
        }
    }

    pub fn writer(&self) -> &GraphWriter {
        &self.writer
    }

    /// Number of running updaters.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Poll an updater now and then once per period until shutdown.
    ///
    /// A failed poll is logged; the next tick tries again. An updater with a
    /// zero period is refused.
    pub fn spawn<U: PollingUpdater>(&mut self, mut updater: U) -> Result<(), UpdaterError> {
        let period = updater.poll_period();
        if period.is_zero() {
            return Err(ConfigError::InvalidPollPeriod(updater.name().to_string()).into());
        }
        let writer = self.writer.clone();
        info!(updater = %updater.name(), period_secs = period.as_secs(), "starting updater");
        self.tasks.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                // First tick is immediate
                interval.tick().await;
                match poll_and_submit(&writer, &mut updater).await {
                    Ok(report) => debug!(
                        updater = %updater.name(),
                        applied = report.applied,
                        rejected = report.rejected,
                        "update applied"
                    ),
                    Err(e) => warn!(updater = %updater.name(), error = %e, "update failed"),
                }
            }
        }));
        Ok(())
    }

    /// Stop every updater, then let the writer finish its queue.
    pub async fn shutdown(self) {
        for task in &self.tasks {
            task.abort();
        }
        join_all(self.tasks).await;

        if let Ok(writer) = Arc::try_unwrap(self.writer) {
            // Joining the writer thread blocks
            let _ = tokio::task::spawn_blocking(move || writer.shutdown()).await;
        }
        info!("updaters stopped");
    }
}
