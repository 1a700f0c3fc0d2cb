//! Polling loops for finalized endpoints.

use std::{fmt, sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    endpoint::{
        EndpointState, PollCycle, PollingEndpoint,
        file::{DEFAULT_POLL_INTERVAL, FileEndpoint},
    },
    error::PollError,
};

/// Runs one independent poll loop per ready endpoint until shut down.
pub struct WatcherRuntime {
    shutdown_token: CancellationToken,
    worker_handles: Vec<(String, JoinHandle<()>)>,
}

impl fmt::Debug for WatcherRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatcherRuntime")
            .field("workers", &self.worker_handles.len())
            .field("cancelled", &self.shutdown_token.is_cancelled())
            .finish()
    }
}

impl Default for WatcherRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl WatcherRuntime {
    pub fn new() -> Self {
        Self {
            shutdown_token: CancellationToken::new(),
            worker_handles: Vec::new(),
        }
    }

    /// Token cancelled by [`WatcherRuntime::shutdown`]; child tokens can be
    /// handed to signal handlers.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub fn len(&self) -> usize {
        self.worker_handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.worker_handles.is_empty()
    }

    /// Start polling a ready [`FileEndpoint`] at its configured interval.
    pub fn spawn_file_endpoint(
        &mut self,
        endpoint: FileEndpoint,
    ) -> Result<(), PollError> {
        if endpoint.state() != EndpointState::Ready {
            return Err(PollError::NotReady {
                uri: endpoint.endpoint_uri().to_string(),
                state: endpoint.state(),
            });
        }

        let label = endpoint.endpoint_uri().to_string();
        let interval = endpoint.poll_interval();
        self.spawn(label, Arc::new(endpoint), interval);
        Ok(())
    }

    /// Start polling `endpoint` every `interval`.
    ///
    /// A zero interval falls back to [`DEFAULT_POLL_INTERVAL`].
    pub fn spawn<P>(&mut self, label: String, endpoint: Arc<P>, interval: Duration)
    where
        P: PollCycle + 'static,
    {
        let interval = if interval.is_zero() {
            warn!(
                endpoint = %label,
                fallback_ms = DEFAULT_POLL_INTERVAL.as_millis() as u64,
                "zero poll interval, using the default"
            );
            DEFAULT_POLL_INTERVAL
        } else {
            interval
        };
        let token = self.shutdown_token.child_token();
        let task_label = label.clone();
        let handle = tokio::spawn(async move {
            poll_loop(task_label, endpoint, interval, token).await;
        });

        debug!(endpoint = %label, interval_ms = interval.as_millis() as u64, "spawned poll loop");
        self.worker_handles.push((label, handle));
    }

    /// Cancel every poll loop and wait for them to finish.
    pub async fn shutdown(self) {
        self.shutdown_token.cancel();
        for (label, handle) in self.worker_handles {
            if let Err(err) = handle.await {
                warn!(endpoint = %label, error = %err, "poll loop ended abnormally");
            }
        }
        info!("watcher runtime stopped");
    }
}

async fn poll_loop<P>(
    label: String,
    endpoint: Arc<P>,
    interval: Duration,
    token: CancellationToken,
) where
    P: PollCycle + ?Sized,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(err) = endpoint.poll_once().await {
                    warn!(endpoint = %label, error = %err, "poll cycle failed");
                }
            }
        }
    }

    debug!(endpoint = %label, "poll loop stopped");
}
