//! The poll loop, timeout controller, and the delta stream surface.

use crate::config::FollowConfig;
use crate::error::{Error, Result};
use crate::fetch::build_client;
use crate::follower::{FollowState, PollOutcome};
use crate::resource::Resource;
use chrono::Utc;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Cooperative stop signal for a running follower.
///
/// Observed at the top of each poll cycle and during the inter-cycle
/// sleep, never mid-fetch: a fetch that has started is allowed to finish
/// or fail on its own timeout so the cursor stays consistent.
#[derive(Clone)]
pub struct StopHandle {
    stop_tx: broadcast::Sender<()>,
}

impl StopHandle {
    /// Request a clean stop of the follower.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(());
    }
}

/// A stream of raw deltas: each item is the bytes appended to the
/// followed resource since the previous item.
pub struct DeltaStream {
    receiver: mpsc::UnboundedReceiver<Result<Vec<u8>>>,
    stop_tx: broadcast::Sender<()>,
    _task_handle: JoinHandle<()>,
}

impl DeltaStream {
    /// Start following `target` (a path or URL) with the given config.
    pub fn new(target: &str, config: FollowConfig) -> Result<Self> {
        let resource = Resource::parse(target)?;
        Self::spawn(resource, config)
    }

    pub(crate) fn spawn(resource: Resource, config: FollowConfig) -> Result<Self> {
        // Charset and client construction both fail fast, before any
        // polling starts.
        config.encoding()?;
        let client = build_client(&config.http)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = broadcast::channel(1);

        let state = FollowState::new(resource, client);
        let task_handle = tokio::spawn(poll_loop(state, config, tx, stop_rx));

        Ok(DeltaStream {
            receiver: rx,
            stop_tx,
            _task_handle: task_handle,
        })
    }

    /// A handle that can stop this follower from another task.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            stop_tx: self.stop_tx.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn is_closed(&self) -> bool {
        self.receiver.is_closed()
    }
}

impl Drop for DeltaStream {
    fn drop(&mut self) {
        // Dropping the stream is a stop request; the task also ends on its
        // own when it notices the receiver is gone.
        let _ = self.stop_tx.send(());
    }
}

impl Stream for DeltaStream {
    type Item = Result<Vec<u8>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_recv(cx)
    }
}

/// The poll loop: probe/fetch, forward deltas, sleep, repeat.
///
/// The deadline is computed once at start and never extended by activity;
/// every cycle re-checks it. Transient failures are absorbed as idle
/// cycles, so only a sustained problem outlasting the timeout terminates
/// the loop.
async fn poll_loop(
    mut state: FollowState,
    config: FollowConfig,
    tx: mpsc::UnboundedSender<Result<Vec<u8>>>,
    mut stop_rx: broadcast::Receiver<()>,
) {
    state.initialize().await;

    let started = Instant::now();
    let deadline = config.deadline().map(|timeout| started + timeout);

    loop {
        if stop_rx.try_recv().is_ok() {
            debug!("stop requested, follower exiting");
            return;
        }

        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                let elapsed_secs = started.elapsed().as_secs();
                if config.fail_on_timeout {
                    let _ = tx.send(Err(Error::TimedOut {
                        elapsed_secs,
                        timeout_secs: config.timeout_secs,
                        at: Utc::now(),
                    }));
                } else {
                    info!(elapsed_secs, "follow timeout reached, completing");
                }
                return;
            }
        }

        match state.poll_once().await {
            Ok(PollOutcome::NewData(bytes)) => {
                if tx.send(Ok(bytes)).is_err() {
                    return;
                }
            }
            Ok(PollOutcome::RotatedAndNewData(bytes)) => {
                if !bytes.is_empty() && tx.send(Ok(bytes)).is_err() {
                    return;
                }
            }
            Ok(PollOutcome::NoChange) => debug!("idle cycle"),
            Ok(PollOutcome::Absent) => debug!("resource absent this cycle"),
            // Transient and protocol failures count as idle cycles; the
            // timeout is the only escalation path.
            Err(err) => warn!(error = %err, "poll cycle failed, will retry"),
        }

        tokio::select! {
            _ = tokio::time::sleep(config.poll_period) => {}
            _ = stop_rx.recv() => {
                debug!("stop requested during sleep, follower exiting");
                return;
            }
        }
    }
}
