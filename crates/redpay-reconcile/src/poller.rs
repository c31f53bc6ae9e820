use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use redpay_client::RemoteClient;
use redpay_core::{
    AuthorizationEvent, AuthorizationState, AuthorizationStateMachine, AuthorizeOrder,
};

use crate::error::ReconcileError;
use crate::retry::RetryPolicy;
use crate::traits::{AuthorizeOrderSource, EventSink};

/// Per-pass counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Orders reported through `on_success`.
    pub succeeded: usize,
    /// Orders reported through `on_error`.
    pub failed: usize,
    /// Retries performed across all orders.
    pub retries: usize,
    /// Orders left pending because polling was stopped mid-pass.
    pub abandoned: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Another pass was still running.
    Skipped,
    /// No pending orders.
    Drained,
    Processed(TickReport),
}

struct Schedule {
    generation: u64,
    _task: JoinHandle<()>,
}

struct PollerInner {
    source: Arc<dyn AuthorizeOrderSource>,
    client: Arc<dyn RemoteClient>,
    sink: Arc<dyn EventSink>,
    policy: RetryPolicy,
    interval: Duration,
    /// Held for the duration of a pass.
    ticking: AtomicBool,
    schedule: Mutex<Option<Schedule>>,
    generation: AtomicU64,
    /// Bumped by `stop()`; passes started under an older value wind down.
    stop_epoch: watch::Sender<u64>,
}

/// Recurring reconciliation of pending authorizations.
///
/// At most one pass runs at a time, orders within a pass are handled one
/// after another, and the schedule stops itself once the source is empty.
/// Cloning shares the same schedule.
#[derive(Clone)]
pub struct AuthorizationPoller {
    inner: Arc<PollerInner>,
}

impl AuthorizationPoller {
    pub fn new(
        source: Arc<dyn AuthorizeOrderSource>,
        client: Arc<dyn RemoteClient>,
        sink: Arc<dyn EventSink>,
        policy: RetryPolicy,
        interval: Duration,
    ) -> Result<Self, ReconcileError> {
        if interval.is_zero() {
            return Err(ReconcileError::InvalidPollInterval);
        }
        let (stop_epoch, _) = watch::channel(0);
        Ok(Self {
            inner: Arc::new(PollerInner {
                source,
                client,
                sink,
                policy,
                interval,
                ticking: AtomicBool::new(false),
                schedule: Mutex::new(None),
                generation: AtomicU64::new(0),
                stop_epoch,
            }),
        })
    }

    /// Schedule the recurring pass on the current tokio runtime.
    ///
    /// Returns `false` when a schedule already exists or no runtime is available.
    pub fn start(&self) -> bool {
        let mut schedule = self.inner.lock_schedule();
        if schedule.is_some() {
            tracing::debug!("authorization polling already running");
            return false;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(err) => {
                tracing::error!(error = %err, "cannot start authorization polling without a tokio runtime");
                return false;
            }
        };

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let epoch = *self.inner.stop_epoch.borrow();
        let inner = Arc::clone(&self.inner);
        let task = runtime.spawn(async move { inner.run_schedule(generation, epoch).await });

        *schedule = Some(Schedule {
            generation,
            _task: task,
        });
        tracing::info!(
            generation,
            interval_ms = self.inner.interval.as_millis() as u64,
            "authorization polling started"
        );
        true
    }

    /// Cancel the schedule and interrupt any retry wait in progress.
    ///
    /// A pass already talking to the remote finishes its current order and
    /// leaves the rest pending. Returns whether a schedule was running.
    pub fn stop(&self) -> bool {
        let taken = self.inner.lock_schedule().take();
        self.inner.stop_epoch.send_modify(|epoch| *epoch = epoch.wrapping_add(1));
        match taken {
            Some(schedule) => {
                tracing::info!(generation = schedule.generation, "authorization polling stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock_schedule().is_some()
    }

    /// Run a single pass now, honouring the one-pass-at-a-time guard.
    pub async fn run_once(&self) -> Result<TickOutcome, ReconcileError> {
        let epoch = *self.inner.stop_epoch.borrow();
        self.inner.tick(epoch).await
    }
}

/// Releases the in-progress flag when a pass ends, however it ends.
struct TickGuard<'a>(&'a AtomicBool);

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Clears the schedule when its task ends, including by panic or abort.
struct ScheduleExit {
    inner: Arc<PollerInner>,
    generation: u64,
}

impl Drop for ScheduleExit {
    fn drop(&mut self) {
        self.inner.halt(self.generation, "polling task exited");
    }
}

impl PollerInner {
    fn lock_schedule(&self) -> MutexGuard<'_, Option<Schedule>> {
        self.schedule.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_begin_tick(&self) -> Option<TickGuard<'_>> {
        self.ticking
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| TickGuard(&self.ticking))
    }

    fn is_stopped(&self, epoch: u64) -> bool {
        *self.stop_epoch.borrow() != epoch
    }

    /// Clear the schedule if it still belongs to `generation`.
    fn halt(&self, generation: u64, reason: &str) {
        let mut schedule = self.lock_schedule();
        if schedule.as_ref().is_some_and(|s| s.generation == generation) {
            *schedule = None;
            tracing::info!(generation, reason, "authorization polling stopped itself");
        }
    }

    async fn run_schedule(self: Arc<Self>, generation: u64, epoch: u64) {
        let _exit = ScheduleExit {
            inner: Arc::clone(&self),
            generation,
        };
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut stop_rx = self.stop_epoch.subscribe();

        loop {
            tokio::select! {
                biased;
                _ = stop_rx.wait_for(|current| *current != epoch) => break,
                _ = ticker.tick() => {}
            }

            match self.tick(epoch).await {
                Ok(TickOutcome::Drained) => {
                    self.halt(generation, "no pending authorizations");
                    break;
                }
                Ok(TickOutcome::Skipped) => {}
                Ok(TickOutcome::Processed(report)) => {
                    tracing::debug!(
                        succeeded = report.succeeded,
                        failed = report.failed,
                        retries = report.retries,
                        abandoned = report.abandoned,
                        "authorization pass finished"
                    );
                }
                Err(err) => {
                    tracing::error!(error = %err, "authorization polling halted by an unexpected error");
                    self.halt(generation, "pass failed");
                    break;
                }
            }
        }
    }

    async fn tick(&self, epoch: u64) -> Result<TickOutcome, ReconcileError> {
        let Some(_guard) = self.try_begin_tick() else {
            tracing::debug!("previous authorization pass still running, skipping");
            return Ok(TickOutcome::Skipped);
        };

        let orders = self.source.pending_orders().await?;
        if orders.is_empty() {
            return Ok(TickOutcome::Drained);
        }

        let mut report = TickReport::default();
        for (idx, order) in orders.iter().enumerate() {
            if self.is_stopped(epoch) {
                report.abandoned += orders.len() - idx;
                break;
            }
            self.process_order(order, epoch, &mut report).await?;
        }
        Ok(TickOutcome::Processed(report))
    }

    /// Validate one authorization, retrying while the remote asks to.
    async fn process_order(
        &self,
        order: &AuthorizeOrder,
        epoch: u64,
        report: &mut TickReport,
    ) -> Result<(), ReconcileError> {
        let request = order.validation_request();
        let mut state = AuthorizationState::Pending;
        let mut attempt: u32 = 0;

        loop {
            let err = match self.client.validate_authorization(&request).await {
                Ok(response) => {
                    AuthorizationStateMachine::transition(
                        state,
                        AuthorizationEvent::ValidationSucceeded,
                    )?;
                    tracing::info!(
                        authorization_uuid = %order.authorization_uuid,
                        status_code = %response.status_code,
                        "authorization validated"
                    );
                    self.sink
                        .on_success(order, &response.status_code)
                        .await
                        .map_err(ReconcileError::Implementation)?;
                    report.succeeded += 1;
                    return Ok(());
                }
                Err(err) => err,
            };

            let retryable = err
                .status_code()
                .is_some_and(|code| self.policy.is_retryable(code));
            if retryable && self.policy.allows(attempt + 1) {
                attempt += 1;
                state =
                    AuthorizationStateMachine::transition(state, AuthorizationEvent::RetryRequested)?;
                report.retries += 1;
                tracing::warn!(
                    authorization_uuid = %order.authorization_uuid,
                    status_code = err.status_code().unwrap_or_default(),
                    attempt,
                    delay_ms = self.policy.delay.as_millis() as u64,
                    "authorization not ready, retrying"
                );
                if !self.wait(self.policy.delay, epoch).await {
                    tracing::info!(
                        authorization_uuid = %order.authorization_uuid,
                        "retry cancelled, authorization left pending"
                    );
                    report.abandoned += 1;
                    return Ok(());
                }
                continue;
            }

            if retryable {
                tracing::warn!(
                    authorization_uuid = %order.authorization_uuid,
                    attempts = attempt,
                    "retry attempts exhausted"
                );
            }
            AuthorizationStateMachine::transition(state, AuthorizationEvent::ValidationFailed)?;
            tracing::error!(
                authorization_uuid = %order.authorization_uuid,
                status_code = err.status_code().unwrap_or("-"),
                error = %err,
                "authorization validation failed"
            );
            self.sink
                .on_error(order, err.status_code())
                .await
                .map_err(ReconcileError::Implementation)?;
            report.failed += 1;
            return Ok(());
        }
    }

    /// Sleep for `delay`. Returns `false` if polling was stopped first.
    async fn wait(&self, delay: Duration, epoch: u64) -> bool {
        let mut stop_rx = self.stop_epoch.subscribe();
        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = stop_rx.wait_for(|current| *current != epoch) => false,
        }
    }
}
