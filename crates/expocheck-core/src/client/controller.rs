use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use super::{ClientState, Finding, ScanTransport};

/// Fixed cadence at which the running job's status snapshot is polled.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Handle used to stop the poll loop. It is checked before issuing a poll and
/// again before acting on a poll response, so a response observed after
/// termination is discarded instead of re-triggering state transitions.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Re-arm the token for a new run. Clones handed out earlier observe the
    /// reset too, so they stay usable across runs.
    fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

/// Live progress sink implemented by the embedding user interface.
pub trait ProgressView: Send {
    /// A fresh progress snapshot for the running job.
    fn progress(&mut self, progress: f32, message: &str);

    /// An in-job error reported by the backend. The job is still running;
    /// polling continues.
    fn scan_error(&mut self, message: &str);
}

/// Lifecycle phases of the scan client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Submitting,
    Polling,
    Terminating,
}

/// Terminal result of one scan lifecycle.
#[derive(Debug)]
pub enum ScanOutcome {
    /// The job ran to completion; `findings` is the full final snapshot.
    Completed { findings: Vec<Finding> },
    /// The backend declined to start a job; `message` is shown verbatim.
    Rejected { message: String },
    /// The submission never reached the backend.
    ConnectFailed,
    /// A request failed mid-job. The backend's state is unknown, so no
    /// results fetch is attempted.
    ConnectionLost,
    /// The poll loop was cancelled through its token before the job finished.
    Cancelled,
}

/// Conditions detected before any network traffic happens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("scan path must not be empty")]
    EmptyPath,
    #[error("a scan is already in progress")]
    AlreadyScanning,
}

/// How a poll loop ended; results are fetched (or not) based on this.
enum PollEnd {
    Terminal,
    Lost,
    Cancelled,
}

/// Drives a single scan job at a time: submit, poll at a fixed cadence, detect
/// the terminal condition, and hand the final findings back to the caller.
///
/// Single-flight is enforced by the state machine itself, not by whatever
/// front-end control happens to be disabled while a job runs.
pub struct ScanController<T: ScanTransport> {
    transport: T,
    poll_interval: Duration,
    state: ClientState,
    phase: Phase,
    cancel: CancelToken,
}

impl<T: ScanTransport> ScanController<T> {
    pub fn new(transport: T) -> Self {
        Self::with_poll_interval(transport, POLL_INTERVAL)
    }

    /// Override the poll cadence; the protocol default is [`POLL_INTERVAL`].
    pub fn with_poll_interval(transport: T, poll_interval: Duration) -> Self {
        Self {
            transport,
            poll_interval,
            state: ClientState::default(),
            phase: Phase::Idle,
            cancel: CancelToken::default(),
        }
    }

    /// Read-only snapshot of the lifecycle state.
    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Cancellation handle for the poll loop. The handle stays valid across
    /// runs; it is re-armed at the start of each submission.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run one full scan lifecycle for `path`.
    ///
    /// Returns `Err` only for conditions detected before any network call: an
    /// empty path or an already-running scan. Every post-submission condition,
    /// success or failure, is a [`ScanOutcome`].
    pub async fn run_scan(
        &mut self,
        path: &str,
        view: &mut dyn ProgressView,
    ) -> Result<ScanOutcome, SubmitError> {
        if self.phase != Phase::Idle {
            return Err(SubmitError::AlreadyScanning);
        }
        if path.trim().is_empty() {
            return Err(SubmitError::EmptyPath);
        }

        self.phase = Phase::Submitting;
        // Reset rather than replace: tokens already obtained through
        // `cancel_token()` must keep pointing at the live flag.
        self.cancel.reset();
        debug!(path, "submitting scan");

        let ack = match self.transport.submit_scan(path).await {
            Ok(ack) => ack,
            Err(err) => {
                warn!(error = %err, "scan submission failed");
                return Ok(self.finish(ScanOutcome::ConnectFailed));
            }
        };
        if !ack.started() {
            debug!(status = %ack.status, "scan submission rejected by backend");
            return Ok(self.finish(ScanOutcome::Rejected {
                message: ack.rejection_message(),
            }));
        }

        self.phase = Phase::Polling;
        self.state.is_scanning = true;
        debug!("scan started, entering poll loop");

        let outcome = match self.poll_until_terminal(view).await {
            PollEnd::Terminal => {
                self.state.is_scanning = false;
                self.fetch_results().await
            }
            PollEnd::Lost => ScanOutcome::ConnectionLost,
            PollEnd::Cancelled => ScanOutcome::Cancelled,
        };
        Ok(self.finish(outcome))
    }

    async fn poll_until_terminal(&mut self, view: &mut dyn ProgressView) -> PollEnd {
        let cancel = self.cancel.clone();
        let mut ticker = interval(self.poll_interval);
        // A slow backend delays the next poll rather than stacking ticks.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a tokio interval completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if cancel.is_cancelled() {
                return PollEnd::Cancelled;
            }

            // Polls are strictly serial: the next tick is not awaited until
            // this response has been fully handled.
            let status = self.transport.get_status().await;
            if cancel.is_cancelled() {
                // Terminated while the request was in flight; the stale
                // response must not drive further transitions.
                return PollEnd::Cancelled;
            }
            let status = match status {
                Ok(status) => status,
                Err(err) => {
                    warn!(error = %err, "status poll failed, connection lost");
                    return PollEnd::Lost;
                }
            };

            // The progress value is applied even when the snapshot carries an
            // error; the error only rides the distinct channel.
            view.progress(status.progress, &status.message);
            if let Some(error) = &status.error {
                view.scan_error(error);
            }

            if !status.is_scanning {
                debug!(progress = status.progress, "backend reported terminal status");
                return PollEnd::Terminal;
            }
        }
    }

    async fn fetch_results(&mut self) -> ScanOutcome {
        match self.transport.get_results().await {
            Ok(findings) => {
                debug!(count = findings.len(), "fetched final findings");
                ScanOutcome::Completed { findings }
            }
            Err(err) => {
                warn!(error = %err, "results fetch failed after scan completion");
                ScanOutcome::ConnectionLost
            }
        }
    }

    /// Single terminal transition: every outcome funnels through here so the
    /// controller is always re-armed for the next submission.
    fn finish(&mut self, outcome: ScanOutcome) -> ScanOutcome {
        self.phase = Phase::Terminating;
        self.cancel.cancel();
        self.state.is_scanning = false;
        self.phase = Phase::Idle;
        outcome
    }
}
