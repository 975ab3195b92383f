//! Event dispatch for the arbiter
//!
//! `Serial` is a single consumer: an event is handled to completion before
//! the next one is read, so read-then-write sequences of two handlers never
//! interleave. `Concurrent` starts a task per event and lets handlers overlap
//! at their await points (last writer wins).

use super::Arbiter;
use crate::core::config::DispatchMode;
use crate::core::events::{ArbiterEvent, EventSender};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, info};

/// Running arbiter: the event sender plus the consumer task
pub struct ArbiterHandle {
    sender: EventSender,
    task: JoinHandle<()>,
}

impl ArbiterHandle {
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    pub fn send(&self, event: ArbiterEvent) -> Result<(), mpsc::error::SendError<ArbiterEvent>> {
        self.sender.send(event)
    }

    /// Stop accepting events from this handle and wait until every queued
    /// event has been handled. Other senders keep the consumer alive.
    pub async fn join(self) {
        let Self { sender, task } = self;
        drop(sender);
        if let Err(e) = task.await {
            error!("Arbiter task failed: {}", e);
        }
    }
}

/// Start consuming events
pub fn spawn(arbiter: Arc<Arbiter>, mode: DispatchMode) -> ArbiterHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = match mode {
        DispatchMode::Serial => tokio::spawn(run_serial(arbiter, rx)),
        DispatchMode::Concurrent => tokio::spawn(run_concurrent(arbiter, rx)),
    };
    info!("Arbiter started ({:?} dispatch)", mode);

    ArbiterHandle {
        sender: EventSender::new(tx),
        task,
    }
}

async fn run_serial(arbiter: Arc<Arbiter>, mut rx: mpsc::UnboundedReceiver<ArbiterEvent>) {
    while let Some(event) = rx.recv().await {
        // Awaited before the next read; a panicking handler only loses its own event
        let arbiter = Arc::clone(&arbiter);
        log_handler_result(tokio::spawn(async move { arbiter.handle(event).await }).await);
    }
    debug!("Arbiter event channel closed");
}

async fn run_concurrent(arbiter: Arc<Arbiter>, mut rx: mpsc::UnboundedReceiver<ArbiterEvent>) {
    let mut in_flight = JoinSet::new();
    while let Some(event) = rx.recv().await {
        let arbiter = Arc::clone(&arbiter);
        in_flight.spawn(async move { arbiter.handle(event).await });

        // Reap finished handlers so the set does not grow unbounded
        while let Some(result) = in_flight.try_join_next() {
            log_handler_result(result);
        }
    }
    while let Some(result) = in_flight.join_next().await {
        log_handler_result(result);
    }
    debug!("Arbiter event channel closed");
}

fn log_handler_result(result: Result<(), JoinError>) {
    if let Err(e) = result {
        error!("Arbiter handler failed: {}", e);
    }
}
