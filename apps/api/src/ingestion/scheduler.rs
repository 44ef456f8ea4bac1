//! Background task that drives [`ResumeWorker`].
//!
//! A run drains the queue (claim until Idle), then parks until an upload
//! signals new work, the poll interval elapses, or shutdown is requested.
//! There is exactly one task per process; uploads never spawn workers.

use std::sync::Arc;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::worker::{ResumeWorker, Tick};
use crate::config::WorkerConfig;

/// Cheap, cloneable "work is available" signal held by request handlers.
///
/// A signal sent while the task is busy is remembered, so the next park
/// returns immediately.
#[derive(Clone, Default)]
pub struct WorkerSignal {
    notify: Arc<Notify>,
}

impl WorkerSignal {
    pub fn notify(&self) {
        self.notify.notify_one();
    }

    pub(crate) async fn notified(&self) {
        self.notify.notified().await;
    }
}

pub struct WorkerHandle {
    signal: WorkerSignal,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    pub fn spawn(worker: ResumeWorker, config: WorkerConfig) -> Self {
        let signal = WorkerSignal::default();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run(worker, config, signal.clone(), shutdown_rx));
        Self {
            signal,
            shutdown,
            task,
        }
    }

    pub fn signal(&self) -> WorkerSignal {
        self.signal.clone()
    }

    /// Stops the task at its next suspension point and waits for it to exit.
    /// A resume mid-pipeline is finished first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::error!("Resume worker task ended abnormally: {e}");
        }
    }
}

enum Flow {
    Continue,
    Stop,
}

async fn run(
    worker: ResumeWorker,
    config: WorkerConfig,
    signal: WorkerSignal,
    mut shutdown: watch::Receiver<bool>,
) {
    info!("Resume worker started");

    loop {
        if let Flow::Stop = drain(&worker, &config, &mut shutdown).await {
            break;
        }

        tokio::select! {
            _ = signal.notified() => debug!("Resume worker woken by upload"),
            _ = tokio::time::sleep(config.poll) => {}
            _ = shutdown.changed() => break,
        }
    }

    info!("Resume worker stopped");
}

/// Claims until nothing is pending. Every outcome is followed by its pause:
/// `idle` ends the run, `backoff` follows a failed claim, `yield_interval`
/// follows a processed resume.
async fn drain(
    worker: &ResumeWorker,
    config: &WorkerConfig,
    shutdown: &mut watch::Receiver<bool>,
) -> Flow {
    loop {
        if *shutdown.borrow() {
            return Flow::Stop;
        }

        let tick = worker.claim_and_process_next().await;
        let pause = match tick {
            Tick::Idle => config.idle,
            Tick::ClaimFailed => config.backoff,
            Tick::Processed { .. } => config.yield_interval,
        };

        tokio::select! {
            _ = tokio::time::sleep(pause) => {}
            _ = shutdown.changed() => return Flow::Stop,
        }

        if tick == Tick::Idle {
            return Flow::Continue;
        }
    }
}
