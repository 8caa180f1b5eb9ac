//! The action queue service.
//!
//! ```text
//!  enqueue ──► buffer ──(len == max_batch_size)──► batches (FIFO) ──► drain task
//!                                                                       │
//!           ┌──────────── confirmed: pop head, reset retries ◄──────────┤
//!           │             failed, retries left: sleep, resubmit head ◄──┤
//!           │             failed, none left: clear all, revert  ◄───────┘
//! ```
//!
//! One drain task at most, guarded by the `draining` flag under the state
//! lock. Locks are never held across an `.await`.

use crate::config::QueueConfig;
use crate::domain::{classify, ActionBatch, BatchSummary};
use crate::error::{Result, SubmissionError};
use crate::metrics::{QueueMetrics, QueueMetricsSnapshot};
use crate::ports::{ConfirmationObserver, ConfirmationWaiter, LedgerTransport, RevertHandler};
use cc_01_bundling::{bundle_savings, optimize};
use parking_lot::Mutex;
use serde::Serialize;
use shared_bus::{EventPublisher, GameEvent};
use shared_types::{Action, ActionSink, BatchId, TxHash};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

/// Why an action was not queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DropReason {
    /// A revert is in progress; input is blocked.
    Reverting,
    /// The action has no target contract configured.
    MissingTarget,
}

/// What `enqueue` did with an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EnqueueOutcome {
    /// Appended to the buffer, which is still below capacity.
    Buffered,
    /// Appended, and a batch was sealed.
    BatchFormed(BatchId),
    /// Not queued.
    Dropped(DropReason),
}

/// Point-in-time view of the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    /// Actions waiting in the buffer.
    pub buffered: usize,
    /// Sealed batches, head first.
    pub batches: Vec<BatchSummary>,
    /// A drain task is running.
    pub draining: bool,
    /// A revert is in progress.
    pub reverting: bool,
    /// Reverts so far.
    pub revert_counter: u64,
}

/// Outbound collaborators of the queue.
pub struct QueuePorts {
    /// Ledger submission.
    pub transport: Arc<dyn LedgerTransport>,
    /// Optional confirmation step after submission.
    pub confirmer: Option<Arc<dyn ConfirmationWaiter>>,
    /// Rollback after terminal failure.
    pub reverter: Arc<dyn RevertHandler>,
    /// Optional hook run after every confirmation.
    pub observer: Option<Arc<dyn ConfirmationObserver>>,
    /// Event bus.
    pub events: Arc<dyn EventPublisher>,
}

struct QueueState {
    buffer: Vec<Action>,
    batches: VecDeque<ActionBatch>,
    draining: bool,
    reverting: bool,
    next_batch_id: u64,
}

impl QueueState {
    fn seal(&mut self, actions: Vec<Action>) -> BatchId {
        let id = BatchId(self.next_batch_id);
        self.next_batch_id += 1;
        self.batches.push_back(ActionBatch::new(id, actions));
        id
    }

    fn seal_buffer(&mut self) -> Option<BatchId> {
        if self.buffer.is_empty() {
            return None;
        }
        let actions = std::mem::take(&mut self.buffer);
        Some(self.seal(actions))
    }

    /// Mark the queue as draining if it has work and no task yet.
    fn claim_drain(&mut self) -> bool {
        if self.draining || self.batches.is_empty() {
            return false;
        }
        self.draining = true;
        true
    }

    fn head_is(&self, id: BatchId) -> bool {
        self.batches.front().map(|b| b.id) == Some(id)
    }
}

struct QueueInner {
    config: QueueConfig,
    state: Mutex<QueueState>,
    revert_counter: AtomicU64,
    idle: Notify,
    ports: QueuePorts,
    metrics: QueueMetrics,
}

/// Handle to the action queue. Clones share one queue.
#[derive(Clone)]
pub struct ActionQueue {
    inner: Arc<QueueInner>,
}

impl ActionQueue {
    /// Build a queue; the configuration is fixed from here on.
    pub fn new(config: QueueConfig, ports: QueuePorts) -> Result<Self> {
        config.validate()?;
        info!(
            max_batch_size = config.max_batch_size,
            max_retries = config.max_retries,
            retry_delay_ms = config.retry_delay_ms,
            retry_on_rejection = config.retry_on_rejection,
            "[cc-04] Action queue created"
        );
        Ok(Self {
            inner: Arc::new(QueueInner {
                config,
                state: Mutex::new(QueueState {
                    buffer: Vec::new(),
                    batches: VecDeque::new(),
                    draining: false,
                    reverting: false,
                    next_batch_id: 1,
                }),
                revert_counter: AtomicU64::new(0),
                idle: Notify::new(),
                ports,
                metrics: QueueMetrics::new(),
            }),
        })
    }

    // =========================================================================
    // INPUT
    // =========================================================================

    /// Append an action; seal a batch once the buffer is full.
    pub fn enqueue(&self, action: Action) -> EnqueueOutcome {
        if let Some(reason) = self.precheck(&action) {
            return EnqueueOutcome::Dropped(reason);
        }

        let (outcome, start) = {
            let mut state = self.inner.state.lock();
            if state.reverting {
                drop(state);
                return self.drop_reverting(&action);
            }
            state.buffer.push(action);
            self.inner.metrics.record_enqueued();

            if state.buffer.len() >= self.inner.config.max_batch_size {
                let id = state.seal_buffer();
                let start = state.claim_drain();
                (id.map_or(EnqueueOutcome::Buffered, EnqueueOutcome::BatchFormed), start)
            } else {
                (EnqueueOutcome::Buffered, false)
            }
        };

        if let EnqueueOutcome::BatchFormed(id) = outcome {
            self.inner.metrics.record_batch_formed();
            debug!(batch_id = %id, "[cc-04] Batch sealed at capacity");
        }
        if start {
            self.spawn_drain();
        }
        outcome
    }

    /// Queue an action on its own batch, right away.
    ///
    /// Buffered actions are sealed into their own batch first so ordering
    /// is preserved.
    pub fn enqueue_forced(&self, action: Action) -> EnqueueOutcome {
        if let Some(reason) = self.precheck(&action) {
            return EnqueueOutcome::Dropped(reason);
        }

        let (id, start) = {
            let mut state = self.inner.state.lock();
            if state.reverting {
                drop(state);
                return self.drop_reverting(&action);
            }
            if state.seal_buffer().is_some() {
                self.inner.metrics.record_batch_formed();
            }
            let id = state.seal(vec![action]);
            (id, state.claim_drain())
        };

        self.inner.metrics.record_enqueued();
        self.inner.metrics.record_batch_formed();
        debug!(batch_id = %id, "[cc-04] Forced batch sealed");
        if start {
            self.spawn_drain();
        }
        EnqueueOutcome::BatchFormed(id)
    }

    /// Seal a non-empty buffer below capacity and start draining.
    pub fn flush(&self) -> Option<BatchId> {
        let (id, start) = {
            let mut state = self.inner.state.lock();
            let id = state.seal_buffer();
            (id, state.claim_drain())
        };
        if let Some(id) = id {
            self.inner.metrics.record_batch_formed();
            debug!(batch_id = %id, "[cc-04] Buffer flushed");
        }
        if start {
            self.spawn_drain();
        }
        id
    }

    /// Discard every buffered action and batch without retry or revert.
    ///
    /// Returns `(batches, buffered)` discarded.
    pub async fn clear(&self) -> (usize, usize) {
        let (batches, buffered) = {
            let mut state = self.inner.state.lock();
            let counts = (state.batches.len(), state.buffer.len());
            state.batches.clear();
            state.buffer.clear();
            counts
        };
        info!(batches, buffered, "[cc-04] Queue cleared manually");
        self.inner
            .ports
            .events
            .publish(GameEvent::QueueCleared { batches, buffered })
            .await;
        (batches, buffered)
    }

    fn precheck(&self, action: &Action) -> Option<DropReason> {
        if action.target.is_empty() {
            warn!(
                entrypoint = %action.entrypoint,
                "[cc-04] Action dropped: no target contract configured"
            );
            self.inner.metrics.record_dropped();
            return Some(DropReason::MissingTarget);
        }
        None
    }

    fn drop_reverting(&self, action: &Action) -> EnqueueOutcome {
        debug!(entrypoint = %action.entrypoint, "[cc-04] Action dropped: revert in progress");
        self.inner.metrics.record_dropped();
        EnqueueOutcome::Dropped(DropReason::Reverting)
    }

    fn spawn_drain(&self) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(Arc::clone(&self.inner).drain());
            }
            Err(_) => {
                warn!("[cc-04] No async runtime; batches stay queued until the next enqueue");
                self.inner.state.lock().draining = false;
            }
        }
    }

    // =========================================================================
    // OBSERVERS
    // =========================================================================

    /// Sealed batches waiting or in flight.
    pub fn len(&self) -> usize {
        self.inner.state.lock().batches.len()
    }

    /// True when there are no sealed batches.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Actions not yet sealed.
    pub fn buffered(&self) -> usize {
        self.inner.state.lock().buffer.len()
    }

    /// A drain task is running.
    pub fn is_draining(&self) -> bool {
        self.inner.state.lock().draining
    }

    /// A revert is in progress.
    pub fn is_reverting(&self) -> bool {
        self.inner.state.lock().reverting
    }

    /// Nothing buffered, nothing batched and no revert running.
    pub fn is_settled(&self) -> bool {
        let state = self.inner.state.lock();
        state.buffer.is_empty() && state.batches.is_empty() && !state.reverting
    }

    /// Most recently sealed batch, when nothing is buffered behind it.
    ///
    /// Local state observed at that moment is exactly what the ledger holds
    /// once this batch confirms.
    pub fn sealed_tail(&self) -> Option<BatchId> {
        let state = self.inner.state.lock();
        (state.buffer.is_empty() && state.next_batch_id > 1)
            .then(|| BatchId(state.next_batch_id - 1))
    }

    /// Reverts so far.
    pub fn revert_counter(&self) -> u64 {
        self.inner.revert_counter.load(Ordering::SeqCst)
    }

    /// Fixed configuration.
    pub fn config(&self) -> &QueueConfig {
        &self.inner.config
    }

    /// Counters.
    pub fn metrics(&self) -> QueueMetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    /// Full status report.
    pub fn status(&self) -> QueueStatus {
        let state = self.inner.state.lock();
        let batches = state
            .batches
            .iter()
            .enumerate()
            .map(|(i, b)| BatchSummary {
                id: b.id,
                actions: b.len(),
                retries: b.retries,
                last_error: b.last_error.clone(),
                status: b.status(i == 0, state.draining),
            })
            .collect();
        QueueStatus {
            buffered: state.buffer.len(),
            batches,
            draining: state.draining,
            reverting: state.reverting,
            revert_counter: self.revert_counter(),
        }
    }

    /// Wait until no drain task and no revert are running.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let state = self.inner.state.lock();
                if !state.draining && !state.reverting {
                    return;
                }
            }
            notified.await;
        }
    }
}

impl ActionSink for ActionQueue {
    fn push_action(&mut self, action: Action) {
        self.enqueue(action);
    }
}

// =============================================================================
// DRAIN TASK
// =============================================================================

impl QueueInner {
    async fn drain(self: Arc<Self>) {
        debug!("[cc-04] Drain task started");
        loop {
            let head = {
                let mut state = self.state.lock();
                match state.batches.front() {
                    Some(batch) => batch.clone(),
                    None => {
                        state.draining = false;
                        break;
                    }
                }
            };

            let bundled = optimize(&head.actions);
            match self.submit(&bundled).await {
                Ok(tx_hash) => self.on_confirmed(&head, &bundled, tx_hash).await,
                Err(err) => {
                    if self.on_failed(&head, err).await {
                        tokio::time::sleep(self.config.retry_delay()).await;
                    }
                }
            }
        }
        debug!("[cc-04] Drain task finished");
        self.idle.notify_waiters();
    }

    async fn submit(&self, actions: &[Action]) -> std::result::Result<TxHash, SubmissionError> {
        let answer = self.ports.transport.submit(actions).await?;
        let tx_hash = classify(answer)?;

        if let Some(confirmer) = &self.ports.confirmer {
            if !confirmer.confirm(&tx_hash).await? {
                return Err(SubmissionError::Unconfirmed(tx_hash));
            }
        }
        Ok(tx_hash)
    }

    async fn on_confirmed(&self, head: &ActionBatch, bundled: &[Action], tx_hash: TxHash) {
        let settled = {
            let mut state = self.state.lock();
            if state.head_is(head.id) {
                state.batches.pop_front();
            }
            for batch in state.batches.iter_mut() {
                batch.retries = 0;
                batch.last_error = None;
            }
            state.buffer.is_empty() && state.batches.is_empty()
        };

        let savings = bundle_savings(&head.actions, bundled);
        self.metrics.record_confirmed(savings.saved);
        info!(
            batch_id = %head.id,
            tx_hash = %tx_hash,
            actions = savings.before,
            calls = savings.after,
            "[cc-04] Batch confirmed"
        );

        self.ports
            .events
            .publish(GameEvent::BatchConfirmed {
                batch_id: head.id,
                tx_hash,
                actions: head.len(),
            })
            .await;

        if let Some(observer) = &self.ports.observer {
            observer.confirmed(head.id, settled).await;
        }
    }

    /// Record a failed attempt. Returns `true` when the head should be retried.
    async fn on_failed(&self, head: &ActionBatch, err: SubmissionError) -> bool {
        let fail_fast = err.is_rejection() && !self.config.retry_on_rejection;
        let last_error = err.to_string();

        let attempt = {
            let mut state = self.state.lock();
            if !state.head_is(head.id) {
                // cleared while in flight
                return false;
            }
            let retryable = !fail_fast && head.retries + 1 < self.config.max_retries;
            if retryable {
                if let Some(batch) = state.batches.front_mut() {
                    batch.retries += 1;
                    batch.last_error = Some(last_error.clone());
                }
                Some(head.retries + 1)
            } else {
                state.reverting = true;
                state.batches.clear();
                state.buffer.clear();
                None
            }
        };

        match attempt {
            Some(attempt) => {
                self.metrics.record_retry();
                warn!(
                    batch_id = %head.id,
                    attempt,
                    max_retries = self.config.max_retries,
                    error = %last_error,
                    "[cc-04] Submission failed, retrying"
                );
                self.ports
                    .events
                    .publish(GameEvent::BatchRetrying {
                        batch_id: head.id,
                        attempt,
                        error: last_error,
                    })
                    .await;
                true
            }
            None => {
                self.metrics.record_terminal_failure();
                error!(
                    batch_id = %head.id,
                    retries = head.retries,
                    error = %last_error,
                    "[cc-04] Terminal failure, queue discarded"
                );
                self.ports
                    .events
                    .publish(GameEvent::TerminalFailure {
                        batch_id: head.id,
                        last_error,
                    })
                    .await;
                self.run_revert().await;
                false
            }
        }
    }

    async fn run_revert(&self) {
        let revert_counter = self.revert_counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.ports
            .events
            .publish(GameEvent::RevertStarted { revert_counter })
            .await;

        let success = match self.ports.reverter.revert().await {
            Ok(()) => true,
            Err(e) => {
                error!(revert_counter, error = %e, "[cc-04] Revert handler failed");
                false
            }
        };

        self.state.lock().reverting = false;
        info!(revert_counter, success, "[cc-04] Revert complete");
        self.ports
            .events
            .publish(GameEvent::RevertCompleted {
                revert_counter,
                success,
            })
            .await;
        self.idle.notify_waiters();
    }
}
