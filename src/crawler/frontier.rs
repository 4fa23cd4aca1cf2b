//! Shared crawl frontier
//!
//! The frontier is an unbounded priority queue of `(url, depth)` pairs shared
//! by every worker. Entries come out shallowest first, and entries of equal
//! depth come out in arrival order, so breadth-first expansion dominates even
//! while many workers enqueue concurrently.
//!
//! The frontier also tracks how many dequeued entries are still being
//! processed. It is exhausted only when the queue is empty and nothing is in
//! flight, since an in-flight entry may still produce new links.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use url::Url;

/// A URL waiting to be crawled at a given depth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: Url,
    pub depth: u32,
}

impl FrontierEntry {
    pub fn new(url: Url, depth: u32) -> Self {
        Self { url, depth }
    }
}

/// Outcome of waiting on the frontier
#[derive(Debug, PartialEq, Eq)]
pub enum Dequeued {
    /// An entry to process; the caller must call [`Frontier::complete`] afterwards
    Entry(FrontierEntry),

    /// Nothing arrived before the timeout
    Empty,

    /// The queue is empty and no entry is in flight
    Exhausted,
}

#[derive(Debug)]
struct QueuedEntry {
    entry: FrontierEntry,
    seq: u64,
}

// BinaryHeap is a max-heap: reverse both keys so the shallowest, oldest
// entry is on top
impl Ord for QueuedEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .entry
            .depth
            .cmp(&self.entry.depth)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueuedEntry {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for QueuedEntry {}

#[derive(Debug, Default)]
struct FrontierInner {
    heap: BinaryHeap<QueuedEntry>,
    next_seq: u64,
    in_flight: usize,
}

/// Concurrent work queue of URLs to crawl
#[derive(Debug, Default)]
pub struct Frontier {
    inner: Mutex<FrontierInner>,
    notify: Notify,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FrontierInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds an entry to the frontier
    ///
    /// Never blocks and never drops an entry; depth filtering is left to
    /// the consumer.
    pub fn enqueue(&self, entry: FrontierEntry) {
        {
            let mut inner = self.lock();
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.heap.push(QueuedEntry { entry, seq });
        }
        self.notify.notify_one();
    }

    /// Waits up to `timeout` for the next entry
    ///
    /// A returned [`Dequeued::Entry`] counts as in flight until
    /// [`Frontier::complete`] is called for it.
    pub async fn dequeue(&self, timeout: Duration) -> Dequeued {
        let deadline = Instant::now() + timeout;

        loop {
            // Register interest before checking the queue so an enqueue
            // between the check and the wait is not missed
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut inner = self.lock();
                if let Some(queued) = inner.heap.pop() {
                    inner.in_flight += 1;
                    return Dequeued::Entry(queued.entry);
                }
                if inner.in_flight == 0 {
                    return Dequeued::Exhausted;
                }
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Dequeued::Empty;
            }
        }
    }

    /// Marks a previously dequeued entry as fully processed
    pub fn complete(&self) {
        let exhausted = {
            let mut inner = self.lock();
            inner.in_flight = inner.in_flight.saturating_sub(1);
            inner.heap.is_empty() && inner.in_flight == 0
        };

        if exhausted {
            self.notify.notify_waiters();
        }
    }

    /// Number of queued entries
    pub fn len(&self) -> usize {
        self.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().heap.is_empty()
    }

    /// Number of dequeued entries not yet completed
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }
}
