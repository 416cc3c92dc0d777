//! Concurrency-safe bulk processor
//!
//! `BulkProcessor` owns the current open batch, accepts operations from any
//! number of producer tasks, and ships full batches to the `BulkEngine` when
//! whichever of three independent triggers fires first: operation count,
//! cumulative byte size, or elapsed time. Each trigger is individually
//! disabled at zero.
//!
//! A single lock guards the append/check/swap/execution-id sequence, so a
//! batch leaves the processor exactly once. The engine call and listener
//! callbacks run outside that lock: threshold-triggered flushes are handed to
//! a spawned task, so `add` never blocks on backend I/O and other producers
//! proceed immediately against the freshly swapped-in batch.

use crate::batch::OperationBatch;
use crate::listener::{BulkListener, NoopListener};
use harvest_core::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, trace};

/// State shared between the processor, its flush tasks, and the scheduler
struct Shared<E, L> {
    engine: E,
    listener: L,
    slot: Mutex<Slot>,
    in_flight: AtomicUsize,
    flush_done: Notify,
}

/// The open batch and the execution-id counter, guarded together: the swap
/// is the sole mutation point for both.
struct Slot {
    batch: OperationBatch,
    execution_id: u64,
}

impl Slot {
    /// Swap in a fresh batch (same thresholds) and assign the next
    /// execution id. Callers hold the slot lock.
    fn swap(&mut self) -> (OperationBatch, u64) {
        let fresh = self.batch.fresh();
        let full = std::mem::replace(&mut self.batch, fresh);
        self.execution_id += 1;
        (full, self.execution_id)
    }
}

impl<E, L> Shared<E, L>
where
    E: BulkEngine,
    L: BulkListener,
{
    /// Flush path shared by add-triggered, timer-triggered, and
    /// close-triggered flushes. Engine failures surface only through the
    /// listener; the batch is consumed regardless of outcome.
    async fn flush(&self, batch: OperationBatch, execution_id: u64) {
        self.listener.before_bulk(execution_id, &batch);
        match self.engine.execute(batch.operations()).await {
            Ok(response) => self.listener.after_bulk(execution_id, &batch, &response),
            Err(error) => self.listener.after_bulk_failure(execution_id, &batch, &error),
        }
    }
}

/// Thread-safe accumulator that collects index/delete operations and ships
/// them to the backend in bounded batches.
///
/// Built via [`BulkProcessor::builder`]; only the engine is required. With
/// all three triggers disabled the processor flushes solely on [`close`],
/// which callers should treat as a configuration smell.
///
/// [`close`]: BulkProcessor::close
pub struct BulkProcessor<E, L = NoopListener>
where
    E: BulkEngine + 'static,
    L: BulkListener + 'static,
{
    shared: Arc<Shared<E, L>>,
    scheduler: Mutex<Option<FlushScheduler>>,
    closed: AtomicBool,
}

impl<E> BulkProcessor<E, NoopListener>
where
    E: BulkEngine + 'static,
{
    /// Start building a processor around the given engine
    pub fn builder(engine: E) -> BulkProcessorBuilder<E, NoopListener> {
        BulkProcessorBuilder {
            engine,
            listener: NoopListener,
            max_actions: 0,
            max_bytes: 0,
            flush_interval: Duration::ZERO,
        }
    }
}

impl<E, L> BulkProcessor<E, L>
where
    E: BulkEngine + 'static,
    L: BulkListener + 'static,
{
    /// Append an operation to the open batch.
    ///
    /// If the append reaches an enabled threshold, the open batch is swapped
    /// for a fresh one and dispatched to a background flush task; this call
    /// returns without waiting on the engine.
    ///
    /// Errors with [`HarvestError::ProcessorClosed`] once [`close`] has been
    /// called.
    ///
    /// [`close`]: BulkProcessor::close
    pub async fn add(&self, operation: DocOperation) -> Result<()> {
        let mut slot = self.shared.slot.lock().await;
        if self.closed.load(Ordering::SeqCst) {
            return Err(HarvestError::ProcessorClosed);
        }

        slot.batch.add(operation);
        if slot.batch.is_over_limit() {
            let (batch, execution_id) = slot.swap();
            // Dispatch while still holding the lock so close() cannot miss
            // an in-flight flush.
            self.dispatch(batch, execution_id);
        }
        Ok(())
    }

    /// Hand a swapped-out batch to a background flush task
    fn dispatch(&self, batch: OperationBatch, execution_id: u64) {
        trace!(
            execution_id,
            actions = batch.len(),
            bytes = batch.total_bytes(),
            "Dispatching batch"
        );
        self.shared.in_flight.fetch_add(1, Ordering::SeqCst);
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            shared.flush(batch, execution_id).await;
            shared.in_flight.fetch_sub(1, Ordering::SeqCst);
            shared.flush_done.notify_waiters();
        });
    }

    /// Wait until all dispatched flush tasks have completed
    async fn drain_in_flight(&self) {
        loop {
            // Register the waiter before checking the counter so a flush
            // finishing in between cannot be missed.
            let notified = self.shared.flush_done.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.shared.in_flight.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Stop the flush timer, drain outstanding flushes, and flush whatever
    /// remains in the open batch.
    ///
    /// The timer is stopped before the final flush begins, so no tick can
    /// race it. An empty final flush is silent: no engine call, no listener
    /// callbacks, no execution id consumed. Idempotent; a second call is a
    /// no-op.
    pub async fn close(&self) -> Result<()> {
        {
            // Flip the flag under the batch lock so no add() can slip an
            // operation past the final flush.
            let _slot = self.shared.slot.lock().await;
            if self.closed.swap(true, Ordering::SeqCst) {
                return Ok(());
            }
        }

        if let Some(scheduler) = self.scheduler.lock().await.take() {
            scheduler.shutdown().await;
        }

        self.drain_in_flight().await;

        let swapped = {
            let mut slot = self.shared.slot.lock().await;
            if slot.batch.is_empty() {
                None
            } else {
                Some(slot.swap())
            }
        };
        if let Some((batch, execution_id)) = swapped {
            debug!(execution_id, actions = batch.len(), "Final flush on close");
            self.shared.flush(batch, execution_id).await;
        }

        Ok(())
    }

    /// Check whether the processor has been closed
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Builder for [`BulkProcessor`]
pub struct BulkProcessorBuilder<E, L = NoopListener> {
    engine: E,
    listener: L,
    max_actions: usize,
    max_bytes: u64,
    flush_interval: Duration,
}

impl<E, L> BulkProcessorBuilder<E, L>
where
    E: BulkEngine + 'static,
    L: BulkListener + 'static,
{
    /// Set the lifecycle listener (defaults to [`NoopListener`])
    pub fn listener<L2>(self, listener: L2) -> BulkProcessorBuilder<E, L2>
    where
        L2: BulkListener + 'static,
    {
        BulkProcessorBuilder {
            engine: self.engine,
            listener,
            max_actions: self.max_actions,
            max_bytes: self.max_bytes,
            flush_interval: self.flush_interval,
        }
    }

    /// Flush after this many operations (0 disables the count trigger)
    pub fn max_actions(mut self, max_actions: usize) -> Self {
        self.max_actions = max_actions;
        self
    }

    /// Flush once the batch reaches this many bytes (0 disables the size
    /// trigger)
    pub fn max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Flush any pending operations at this interval (zero disables the
    /// time trigger)
    pub fn flush_interval(mut self, flush_interval: Duration) -> Self {
        self.flush_interval = flush_interval;
        self
    }

    /// Build the processor, starting the flush timer if configured.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build(self) -> BulkProcessor<E, L> {
        let batch = OperationBatch::new()
            .max_actions(self.max_actions)
            .max_bytes(self.max_bytes);

        let shared = Arc::new(Shared {
            engine: self.engine,
            listener: self.listener,
            slot: Mutex::new(Slot {
                batch,
                execution_id: 0,
            }),
            in_flight: AtomicUsize::new(0),
            flush_done: Notify::new(),
        });

        let scheduler = if self.flush_interval.is_zero() {
            None
        } else {
            Some(FlushScheduler::start(
                Arc::clone(&shared),
                self.flush_interval,
            ))
        };

        BulkProcessor {
            shared,
            scheduler: Mutex::new(scheduler),
            closed: AtomicBool::new(false),
        }
    }
}

/// Cancellable periodic timer driving time-based flushes
///
/// Runs the same flush path as threshold-triggered flushes. A tick that
/// finds an empty batch does nothing: no engine call, no listener callbacks,
/// no execution id.
struct FlushScheduler {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl FlushScheduler {
    fn start<E, L>(shared: Arc<Shared<E, L>>, period: Duration) -> Self
    where
        E: BulkEngine + 'static,
        L: BulkListener + 'static,
    {
        let (stop, mut stopped) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = &mut stopped => break,
                    _ = ticker.tick() => {
                        let swapped = {
                            let mut slot = shared.slot.lock().await;
                            if slot.batch.is_empty() {
                                None
                            } else {
                                Some(slot.swap())
                            }
                        };
                        if let Some((batch, execution_id)) = swapped {
                            trace!(execution_id, actions = batch.len(), "Interval flush");
                            shared.flush(batch, execution_id).await;
                        }
                    }
                }
            }
        });
        Self { stop, handle }
    }

    /// Stop the timer and wait for any in-progress tick to finish.
    ///
    /// After this returns no further tick will run.
    async fn shutdown(self) {
        let _ = self.stop.send(());
        let _ = self.handle.await;
    }
}
