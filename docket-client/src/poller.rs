//! Bounded polling for a report that appears some time after upload.
//!
//! Storage answers `404`/`403` until the pipeline has written the report, so
//! those statuses mean "not yet", not failure. The poller makes at most
//! `max_attempts` reads spaced `interval` apart and gives up with a timeout
//! after the last one, without a trailing wait.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use docket_core::{Capability, DocketError, DocketResult, PollSettings};
use docket_core::config::{DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL};
use tokio_util::sync::CancellationToken;

use crate::transport::ObjectTransport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOptions {
    pub max_attempts: u32,
    pub interval: Duration,
    /// Statuses that end polling at once instead of being retried.
    ///
    /// Empty by default: every non-2xx status is treated as "not ready".
    pub fatal_statuses: Vec<u16>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_POLL_INTERVAL,
            fatal_statuses: Vec::new(),
        }
    }
}

impl From<PollSettings> for PollOptions {
    fn from(settings: PollSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            interval: settings.interval,
            fatal_statuses: Vec::new(),
        }
    }
}

impl PollOptions {
    pub fn with_fatal_statuses(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.fatal_statuses = statuses.into_iter().collect();
        self
    }

    /// Time from the first read to the last when every read comes back empty.
    pub fn window(&self) -> Duration {
        self.interval
            .saturating_mul(self.max_attempts.saturating_sub(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Attempting { attempt: u32 },
    Succeeded,
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    NotReady { status: u16 },
    Rejected { status: u16 },
    TransportError { message: String },
    Success,
}

/// One read against storage, as recorded in the poll history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollAttempt {
    pub number: u32,
    pub outcome: AttemptOutcome,
    pub at: DateTime<Utc>,
}

/// Reads a result capability until it succeeds or attempts run out.
pub struct ResultPoller {
    transport: Arc<dyn ObjectTransport>,
    options: PollOptions,
}

impl ResultPoller {
    pub fn new(transport: Arc<dyn ObjectTransport>, options: PollOptions) -> Self {
        Self { transport, options }
    }

    pub fn options(&self) -> &PollOptions {
        &self.options
    }

    pub async fn poll(&self, capability: &Capability) -> DocketResult<Bytes> {
        self.poll_with_cancel(capability, &CancellationToken::new())
            .await
    }

    pub async fn poll_with_cancel(
        &self,
        capability: &Capability,
        cancel: &CancellationToken,
    ) -> DocketResult<Bytes> {
        let (result, _) = self.poll_recorded(capability, cancel).await;
        result
    }

    /// Poll and also return the attempt history.
    pub async fn poll_recorded(
        &self,
        capability: &Capability,
        cancel: &CancellationToken,
    ) -> (DocketResult<Bytes>, Vec<PollAttempt>) {
        let mut history = Vec::new();
        let result = self.run(capability, cancel, &mut history).await;
        (result, history)
    }

    async fn run(
        &self,
        capability: &Capability,
        cancel: &CancellationToken,
        history: &mut Vec<PollAttempt>,
    ) -> DocketResult<Bytes> {
        if !capability.is_read() {
            return Err(DocketError::validation(format!(
                "cannot poll with a {} capability",
                capability.operation
            )));
        }
        if self.options.max_attempts == 0 {
            return Err(DocketError::validation("max_attempts must be at least 1"));
        }

        let mut state = PollState::Attempting { attempt: 1 };

        while let PollState::Attempting { attempt } = state {
            if cancel.is_cancelled() {
                tracing::info!(key = %capability.key, attempt, "polling cancelled");
                return Err(DocketError::cancelled("polling cancelled"));
            }

            let failure = match self.transport.get(&capability.url).await {
                Ok(response) if response.is_success() => {
                    history.push(self.record(attempt, AttemptOutcome::Success));
                    state = PollState::Succeeded;
                    tracing::info!(key = %capability.key, attempts = attempt, ?state, "result available");
                    return Ok(response.body);
                }
                Ok(response) => {
                    let (outcome, error) = self.classify_status(response.status);
                    history.push(self.record(attempt, outcome));
                    error
                }
                Err(e) => {
                    history.push(self.record(
                        attempt,
                        AttemptOutcome::TransportError {
                            message: e.message.clone(),
                        },
                    ));
                    e
                }
            };

            tracing::debug!(key = %capability.key, attempt, error = %failure, "poll attempt failed");

            if !failure.kind.is_retryable() {
                tracing::warn!(key = %capability.key, attempt, error = %failure, "result read failed permanently");
                return Err(failure);
            }

            if attempt >= self.options.max_attempts {
                state = PollState::Exhausted;
                tracing::warn!(key = %capability.key, attempts = attempt, ?state, "result not available before attempts ran out");
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(key = %capability.key, attempt, "polling cancelled");
                    return Err(DocketError::cancelled("polling cancelled"));
                }
                _ = tokio::time::sleep(self.options.interval) => {}
            }

            state = PollState::Attempting { attempt: attempt + 1 };
        }

        Err(DocketError::timeout(format!(
            "result not available after {} attempts",
            self.options.max_attempts
        )))
    }

    // Statuses named in `fatal_statuses` end polling; every other one means "not yet".
    fn classify_status(&self, status: u16) -> (AttemptOutcome, DocketError) {
        if self.options.fatal_statuses.contains(&status) {
            (
                AttemptOutcome::Rejected { status },
                DocketError::rejected(format!("storage refused result read with status {status}")),
            )
        } else {
            (
                AttemptOutcome::NotReady { status },
                DocketError::not_ready(format!("result not ready (status {status})")),
            )
        }
    }

    fn record(&self, number: u32, outcome: AttemptOutcome) -> PollAttempt {
        PollAttempt {
            number,
            outcome,
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use crate::transport::StorageResponse;
    use docket_core::{ErrorKind, Operation};
    use tokio::time::Instant;

    fn read_cap() -> Capability {
        Capability::received(Operation::Read, "results/Lease_report.txt", "https://store.test/get")
    }

    fn not_found() -> DocketResult<StorageResponse> {
        Ok(StorageResponse::new(404, "NoSuchKey"))
    }

    fn poller(transport: Arc<ScriptedTransport>, options: PollOptions) -> ResultPoller {
        ResultPoller::new(transport, options)
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_exactly_max_attempts_without_trailing_wait() {
        let transport = Arc::new(ScriptedTransport::new((0..20).map(|_| not_found()).collect()));
        let poller = poller(transport.clone(), PollOptions::default());

        let started = Instant::now();
        let (result, history) = poller
            .poll_recorded(&read_cap(), &CancellationToken::new())
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
        assert_eq!(transport.gets().len(), 8);
        assert_eq!(history.len(), 8);
        assert_eq!(started.elapsed(), Duration::from_millis(17_500));
        assert_eq!(poller.options().window(), Duration::from_millis(17_500));
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_third_attempt_waits_twice() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            not_found(),
            Ok(StorageResponse::new(403, "AccessDenied")),
            Ok(StorageResponse::new(200, "No risky clauses found.")),
        ]));
        let poller = poller(transport.clone(), PollOptions::default());

        let started = Instant::now();
        let (result, history) = poller
            .poll_recorded(&read_cap(), &CancellationToken::new())
            .await;

        assert_eq!(result.unwrap(), Bytes::from_static(b"No risky clauses found."));
        assert_eq!(started.elapsed(), Duration::from_millis(5_000));
        assert_eq!(
            history.iter().map(|a| a.outcome.clone()).collect::<Vec<_>>(),
            vec![
                AttemptOutcome::NotReady { status: 404 },
                AttemptOutcome::NotReady { status: 403 },
                AttemptOutcome::Success,
            ]
        );
        assert_eq!(history.iter().map(|a| a.number).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn first_attempt_success_does_not_wait() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(StorageResponse::new(200, "ok"))]));
        let started = Instant::now();
        let body = poller(transport, PollOptions::default())
            .poll(&read_cap())
            .await
            .unwrap();
        assert_eq!(body, Bytes::from_static(b"ok"));
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_errors_are_retried() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Err(DocketError::transport("connection reset")),
            Ok(StorageResponse::new(200, "report")),
        ]));
        let (result, history) = poller(transport, PollOptions::default())
            .poll_recorded(&read_cap(), &CancellationToken::new())
            .await;

        assert_eq!(result.unwrap(), Bytes::from_static(b"report"));
        assert!(matches!(history[0].outcome, AttemptOutcome::TransportError { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn single_attempt_budget_reads_once() {
        let transport = Arc::new(ScriptedTransport::new(vec![not_found(), not_found()]));
        let options = PollOptions {
            max_attempts: 1,
            ..PollOptions::default()
        };
        let started = Instant::now();
        let err = poller(transport.clone(), options)
            .poll(&read_cap())
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Timeout);
        assert_eq!(transport.gets().len(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn zero_attempts_is_rejected_up_front() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let options = PollOptions {
            max_attempts: 0,
            ..PollOptions::default()
        };
        let err = poller(transport.clone(), options)
            .poll(&read_cap())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(transport.gets().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_status_stops_polling() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            not_found(),
            Ok(StorageResponse::new(403, "SignatureDoesNotMatch")),
            Ok(StorageResponse::new(200, "too late")),
        ]));
        let options = PollOptions::default().with_fatal_statuses([403]);
        let (result, history) = poller(transport.clone(), options)
            .poll_recorded(&read_cap(), &CancellationToken::new())
            .await;

        assert_eq!(result.unwrap_err().kind, ErrorKind::Rejected);
        assert_eq!(transport.gets().len(), 2);
        assert_eq!(history[1].outcome, AttemptOutcome::Rejected { status: 403 });
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_transport_failure_stops_polling() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Err(DocketError::transport("connection reset")),
            Err(DocketError::service("proxy misconfigured")),
            Ok(StorageResponse::new(200, "too late")),
        ]));
        let err = poller(transport.clone(), PollOptions::default())
            .poll(&read_cap())
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Service);
        assert_eq!(transport.gets().len(), 2);
    }

    #[test]
    fn window_saturates_instead_of_overflowing() {
        let options = PollOptions {
            max_attempts: u32::MAX,
            interval: Duration::MAX,
            fatal_statuses: Vec::new(),
        };
        assert_eq!(options.window(), Duration::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_wait_stops_further_reads() {
        let transport = Arc::new(ScriptedTransport::new((0..8).map(|_| not_found()).collect()));
        let poller = Arc::new(poller(transport.clone(), PollOptions::default()));
        let cancel = CancellationToken::new();

        let task = {
            let poller = Arc::clone(&poller);
            let cancel = cancel.clone();
            tokio::spawn(async move { poller.poll_with_cancel(&read_cap(), &cancel).await })
        };

        tokio::time::sleep(Duration::from_millis(3_000)).await;
        cancel.cancel();

        let err = task.await.unwrap().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Cancelled);
        assert_eq!(transport.gets().len(), 2);
    }

    #[tokio::test]
    async fn cancelled_before_start_makes_no_request() {
        let transport = Arc::new(ScriptedTransport::new(vec![not_found()]));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = poller(transport.clone(), PollOptions::default())
            .poll_with_cancel(&read_cap(), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Cancelled);
        assert!(transport.gets().is_empty());
    }

    #[test]
    fn options_follow_configured_settings() {
        let options = PollOptions::from(PollSettings {
            max_attempts: 4,
            interval: Duration::from_millis(100),
        });
        assert_eq!(options.max_attempts, 4);
        assert_eq!(options.window(), Duration::from_millis(300));
        assert!(options.fatal_statuses.is_empty());
    }
}
