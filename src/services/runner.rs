//! Background transfer runner
//!
//! Executes one service request at a time on a private tokio runtime and
//! hands the outcome back over a channel that the UI loop polls on every tick.

use crate::services::api::{dispatch, IngestApi, ServiceError, ServiceReply, ServiceRequest};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Outcome of a request, tagged with its ticket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub ticket: u64,
    pub outcome: Result<ServiceReply, ServiceError>,
}

struct ActiveTransfer {
    ticket: u64,
    handle: JoinHandle<()>,
    start_instant: Instant,
}

/// Runs service requests off the UI thread
pub struct TransferRunner {
    runtime: Runtime,
    api: Arc<dyn IngestApi>,
    sender: Sender<Settlement>,
    receiver: Receiver<Settlement>,
    active: Option<ActiveTransfer>,
}

impl TransferRunner {
    pub fn new(api: Arc<dyn IngestApi>) -> anyhow::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("chfile-transfer")
            .enable_all()
            .build()?;
        let (sender, receiver) = mpsc::channel();
        Ok(Self {
            runtime,
            api,
            sender,
            receiver,
            active: None,
        })
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// How long the current request has been running
    pub fn elapsed(&self) -> Option<Duration> {
        self.active.as_ref().map(|a| a.start_instant.elapsed())
    }

    /// Start a request, abandoning any previous one
    pub fn spawn(&mut self, request: ServiceRequest) {
        self.cancel();

        let api = Arc::clone(&self.api);
        let tx = self.sender.clone();
        let ticket = request.ticket;
        debug!(ticket, call = request.call.name(), "spawning request");

        let handle = self.runtime.spawn(async move {
            let outcome = dispatch(api.as_ref(), &request.call).await;
            // The receiver is gone once the runner is dropped; nothing to report to
            let _ = tx.send(Settlement { ticket, outcome });
        });

        self.active = Some(ActiveTransfer {
            ticket,
            handle,
            start_instant: Instant::now(),
        });
    }

    /// Collect finished requests
    ///
    /// A task that ended without reporting (it panicked) is turned into a
    /// transport failure so its ticket never stays pending.
    pub fn poll(&mut self) -> Vec<Settlement> {
        let mut settled: Vec<Settlement> = self.receiver.try_iter().collect();

        if let Some(active) = &self.active {
            if settled.iter().any(|s| s.ticket == active.ticket) {
                self.active = None;
            } else if active.handle.is_finished() {
                // The task may have sent just after the drain above
                let late: Vec<Settlement> = self.receiver.try_iter().collect();
                let reported = late.iter().any(|s| s.ticket == active.ticket);
                settled.extend(late);
                if !reported {
                    warn!(ticket = active.ticket, "request task ended without a result");
                    settled.push(Settlement {
                        ticket: active.ticket,
                        outcome: Err(ServiceError::Transport(
                            "request ended unexpectedly".to_string(),
                        )),
                    });
                }
                self.active = None;
            }
        }

        settled
    }

    /// Abort the running request; its result will never be delivered
    pub fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            debug!(ticket = active.ticket, "cancelling request");
            active.handle.abort();
        }
    }
}

impl Drop for TransferRunner {
    fn drop(&mut self) {
        self.cancel();
    }
}
