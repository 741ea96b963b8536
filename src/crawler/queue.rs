//! Work queue for the scan
//!
//! This module handles:
//! - A bounded FIFO of candidate URLs shared by every worker
//! - Deduplication on the normalized URL, for the whole scan
//! - Tracking pending work (buffered plus in flight)
//! - Closing itself once no pending work remains
//!
//! All state lives behind one `Mutex`, so the seen-check, the pending
//! increment, the decrement in `done()` and the closure decision are a single
//! atomic transition. The lock is never held across an `.await`.

use crate::crawler::types::{Candidate, Provenance};
use crate::url::normalize_key;
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// The capability a worker needs from the queue
///
/// `add` feeds new candidates back into the scan; `done` reports that one
/// taken item (including all of its own `add` calls) is finished.
#[async_trait]
pub trait WorkSink: Send + Sync {
    /// Enqueues the candidates that have not been seen before
    async fn add(&self, candidates: Vec<Candidate>);

    /// Marks one taken item as finished
    fn done(&self);
}

#[derive(Debug, Default)]
struct QueueState {
    /// Normalized keys ever admitted
    seen: HashSet<String>,
    /// Admitted items waiting to be taken
    items: VecDeque<Candidate>,
    /// Buffered + in flight + being pushed + external holds
    pending: usize,
    /// Items taken and not yet done
    in_flight: usize,
    /// Tasks waiting in `take`
    takers: usize,
    /// Tasks waiting for buffer space in `add`
    blocked_adders: usize,
    /// Total items admitted
    admitted: usize,
    closed: bool,
}

impl QueueState {
    /// Whether an adder may wait for space without risking a deadlock
    ///
    /// Waiting is safe while a taker is parked, or while at least one
    /// in-flight item (besides, possibly, the caller's own) belongs to a
    /// worker that is not itself stuck in `add`.
    fn can_wait_for_space(&self) -> bool {
        self.takers > 0 || self.in_flight > self.blocked_adders + 1
    }
}

/// Shared queue of candidate URLs
#[derive(Debug)]
pub struct WorkQueue {
    state: Mutex<QueueState>,
    capacity: usize,
    item_ready: Notify,
    space_ready: Notify,
}

impl WorkQueue {
    /// Creates an empty queue buffering at most `capacity` items
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            capacity: capacity.max(1),
            item_ready: Notify::new(),
            space_ready: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueues the candidates that have not been seen before
    ///
    /// Mangled variants are exempt from deduplication. Candidates added after
    /// the queue closed are dropped. When the buffer is full this waits for
    /// space, unless no other consumer could make room, in which case the
    /// item is admitted over capacity.
    pub async fn add(&self, candidates: Vec<Candidate>) {
        for candidate in candidates {
            let key = normalize_key(&candidate.url);
            {
                let mut state = self.lock();
                if state.closed {
                    tracing::debug!("Queue closed, dropping {}", candidate.url);
                    return;
                }
                let dedup = candidate.provenance != Provenance::Mangled;
                if dedup && !state.seen.insert(key) {
                    tracing::trace!("Already seen: {}", candidate.url);
                    continue;
                }
                state.pending += 1;
                state.admitted += 1;

                if state.items.len() < self.capacity {
                    state.items.push_back(candidate);
                    drop(state);
                    self.item_ready.notify_one();
                    continue;
                }
            }
            self.push_when_space(candidate).await;
        }
    }

    /// Slow path of `add`: the item is admitted but the buffer was full
    async fn push_when_space(&self, candidate: Candidate) {
        loop {
            let space = self.space_ready.notified();
            tokio::pin!(space);
            let waiter = {
                let mut state = self.lock();
                if state.closed {
                    return;
                }
                if state.items.len() < self.capacity || !state.can_wait_for_space() {
                    state.items.push_back(candidate);
                    drop(state);
                    self.item_ready.notify_one();
                    return;
                }
                space.as_mut().enable();
                Waiter::adder(self, &mut state)
            };
            space.await;
            drop(waiter);
        }
    }

    /// Takes the next candidate, waiting until one is available
    ///
    /// Returns `None` once the queue is closed.
    pub async fn take(&self) -> Option<Candidate> {
        loop {
            let ready = self.item_ready.notified();
            tokio::pin!(ready);
            let waiter = {
                let mut state = self.lock();
                if state.closed {
                    return None;
                }
                if let Some(candidate) = state.items.pop_front() {
                    state.in_flight += 1;
                    drop(state);
                    self.space_ready.notify_one();
                    return Some(candidate);
                }
                ready.as_mut().enable();
                Waiter::taker(self, &mut state)
            };
            ready.await;
            drop(waiter);
        }
    }

    /// Marks one taken item as finished
    ///
    /// # Panics
    ///
    /// Panics if there is no taken item outstanding; that is a bug in the
    /// caller, not a runtime condition.
    pub fn done(&self) {
        let mut state = self.lock();
        if state.in_flight == 0 {
            drop(state);
            panic!("WorkQueue::done called without a matching take");
        }
        state.in_flight -= 1;
        self.release(state);
    }

    /// Registers an external producer as pending work
    ///
    /// While the returned guard lives the queue cannot close, even if every
    /// item taken so far is done. The dispatcher holds one while seeding.
    pub fn hold(&self) -> QueueHold<'_> {
        let mut state = self.lock();
        if !state.closed {
            state.pending += 1;
        }
        QueueHold {
            queue: self,
            active: !state.closed,
        }
    }

    fn release(&self, mut state: MutexGuard<'_, QueueState>) {
        state.pending = state.pending.saturating_sub(1);
        if state.pending == 0 && !state.closed {
            tracing::debug!("No pending work left, closing queue");
            state.closed = true;
            drop(state);
            self.wake_all();
        }
    }

    /// Closes the queue immediately, discarding buffered items
    ///
    /// Waiting takers return `None` and waiting adders drop their items.
    pub fn close(&self) {
        {
            let mut state = self.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state.items.clear();
        }
        self.wake_all();
    }

    fn wake_all(&self) {
        self.item_ready.notify_waiters();
        self.space_ready.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Buffered plus in-flight work
    pub fn pending(&self) -> usize {
        self.lock().pending
    }

    /// Items currently buffered
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Total items admitted since the queue was created
    pub fn admitted(&self) -> usize {
        self.lock().admitted
    }
}

#[async_trait]
impl WorkSink for WorkQueue {
    async fn add(&self, candidates: Vec<Candidate>) {
        WorkQueue::add(self, candidates).await
    }

    fn done(&self) {
        WorkQueue::done(self)
    }
}

/// Keeps the queue open while an external producer is still adding
#[must_use = "the hold is released when dropped"]
pub struct QueueHold<'a> {
    queue: &'a WorkQueue,
    active: bool,
}

impl Drop for QueueHold<'_> {
    fn drop(&mut self) {
        if self.active {
            let state = self.queue.lock();
            self.queue.release(state);
        }
    }
}

/// Counts a parked task for as long as it waits
struct Waiter<'a> {
    queue: &'a WorkQueue,
    adder: bool,
}

impl<'a> Waiter<'a> {
    fn adder(queue: &'a WorkQueue, state: &mut QueueState) -> Self {
        state.blocked_adders += 1;
        Self { queue, adder: true }
    }

    fn taker(queue: &'a WorkQueue, state: &mut QueueState) -> Self {
        state.takers += 1;
        Self {
            queue,
            adder: false,
        }
    }
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        let mut state = self.queue.lock();
        if self.adder {
            state.blocked_adders -= 1;
        } else {
            state.takers -= 1;
        }
    }
}
