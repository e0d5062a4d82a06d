//! The single writer thread that serializes graph mutations.

use std::sync::Arc;
use std::thread::JoinHandle;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::graph::Graph;

use super::error::WriterError;
use super::unit::{ApplyReport, MutationUnit};

struct Job {
    unit: MutationUnit,
    done: oneshot::Sender<ApplyReport>,
}

/// Applies mutation units to a graph one at a time, in submission order.
///
/// Units run on a dedicated OS thread so updaters on the async runtime never
/// block on edge-list copies. Searches keep reading the graph while units
/// apply; they see each vertex's list either before or after a change,
/// never halfway.
pub struct GraphWriter {
    sender: Option<mpsc::UnboundedSender<Job>>,
    thread: Option<JoinHandle<()>>,
}

impl GraphWriter {
    /// Start the writer thread for a graph.
    pub fn spawn(graph: Arc<Graph>) -> Result<Self, WriterError> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
        let thread = std::thread::Builder::new()
            .name("graph-writer".to_string())
            .spawn(move || {
                let mut units = 0u64;
                while let Some(job) = receiver.blocking_recv() {
                    let report = job.unit.apply(&graph);
                    units += 1;
                    // The submitter may have stopped waiting
                    let _ = job.done.send(report);
                }
                info!(units, "graph writer stopped");
            })?;
        Ok(Self {
            sender: Some(sender),
            thread: Some(thread),
        })
    }

    /// Queue a unit behind every unit submitted before it.
    pub fn submit(&self, unit: MutationUnit) -> Result<PendingWrite, WriterError> {
        let sender = self.sender.as_ref().ok_or(WriterError::Closed)?;
        let (done, receiver) = oneshot::channel();
        let source = unit.source().to_string();
        debug!(source = %source, ops = unit.len(), "mutation unit queued");
        sender
            .send(Job { unit, done })
            .map_err(|_| WriterError::Closed)?;
        Ok(PendingWrite { source, receiver })
    }

    /// Stop accepting units, finish the queued ones and join the thread.
    pub fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.sender.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for GraphWriter {
    fn drop(&mut self) {
        self.close();
    }
}

/// A submitted unit that may not have been applied yet.
#[derive(Debug)]
pub struct PendingWrite {
    source: String,
    receiver: oneshot::Receiver<ApplyReport>,
}

impl PendingWrite {
    /// Block until the unit has been applied.
    ///
    /// Must not be called from an async context; use [`PendingWrite::applied`].
    pub fn wait(self) -> Result<ApplyReport, WriterError> {
        let source = self.source;
        self.receiver
            .blocking_recv()
            .map_err(|_| WriterError::Abandoned {
                source_name: source,
            })
    }

    /// Wait until the unit has been applied.
    pub async fn applied(self) -> Result<ApplyReport, WriterError> {
        let source = self.source;
        self.receiver.await.map_err(|_| WriterError::Abandoned {
            source_name: source,
        })
    }
}
