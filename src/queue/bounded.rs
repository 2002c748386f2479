//! Bounded Queue Module
//!
//! FIFO queue with a capacity, a drop strategy, optional content-keyed
//! deduplication and asynchronous consumers.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use futures::stream::{self, Stream};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::Result;
use crate::queue::dedup::DedupCache;
use crate::queue::options::KeyFn;
use crate::queue::{DropStrategy, QueueMetrics, QueueOptions};

// == Queue State ==
#[derive(Debug)]
struct QueueState<T> {
    items: VecDeque<T>,
    /// Suspended consumers, oldest first
    waiters: VecDeque<oneshot::Sender<T>>,
    dedup: Option<DedupCache<T>>,
    metrics: QueueMetrics,
}

impl<T> QueueState<T> {
    /// Counts the item as enqueued and hands it to the oldest live waiter,
    /// buffering it only when nobody is waiting.
    fn accept(&mut self, item: T) {
        self.metrics.enqueued += 1;

        let mut item = item;
        while let Some(waiter) = self.waiters.pop_front() {
            match waiter.send(item) {
                Ok(()) => {
                    self.metrics.dequeued += 1;
                    return;
                }
                // Consumer gave up waiting; try the next one
                Err(returned) => item = returned,
            }
        }
        self.items.push_back(item);
    }
}

// == Waiter ==
/// Receiving end of a suspended `next` call.
///
/// An item handed over but never observed (the consumer future was dropped
/// first) is put back at the head of the queue on drop.
struct Waiter<'a, T> {
    queue: &'a BoundedQueue<T>,
    receiver: oneshot::Receiver<T>,
}

impl<T> Drop for Waiter<'_, T> {
    fn drop(&mut self) {
        self.receiver.close();
        if let Ok(item) = self.receiver.try_recv() {
            let mut state = self.queue.state.lock();
            state.metrics.dequeued = state.metrics.dequeued.saturating_sub(1);
            state.items.push_front(item);
            debug!("returned unclaimed handoff to the queue");
        }
    }
}

// == Bounded Queue ==
/// Backpressure-aware FIFO queue.
///
/// Buffered items are delivered in arrival order, waiting consumers are served
/// oldest first, and a push always prefers a waiting consumer over the buffer.
pub struct BoundedQueue<T> {
    state: Mutex<QueueState<T>>,
    max_size: Option<usize>,
    drop_strategy: DropStrategy,
    key_fn: Option<KeyFn<T>>,
    block_poll: Duration,
    block_timeout: Option<Duration>,
}

impl<T: Clone> BoundedQueue<T> {
    // == Constructor ==
    pub fn new(options: QueueOptions<T>) -> Result<Self> {
        options.validate()?;
        let dedup_enabled = options.dedup_enabled();
        Ok(Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                waiters: VecDeque::new(),
                dedup: dedup_enabled.then(|| DedupCache::new(options.cache_ttl)),
                metrics: QueueMetrics::new(),
            }),
            max_size: options.max_size,
            drop_strategy: options.drop_strategy,
            key_fn: if dedup_enabled { options.cache_key_fn } else { None },
            block_poll: options.block_poll,
            block_timeout: options.block_timeout,
        })
    }

    /// Creates a queue with no capacity limit and no deduplication.
    pub fn unbounded() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                waiters: VecDeque::new(),
                dedup: None,
                metrics: QueueMetrics::new(),
            }),
            max_size: None,
            drop_strategy: DropStrategy::default(),
            key_fn: None,
            block_poll: crate::queue::options::DEFAULT_BLOCK_POLL,
            block_timeout: None,
        }
    }

    // == Push ==
    /// Offers an item to the queue.
    ///
    /// A live deduplication hit delivers the first-seen value for the key
    /// instead of `item` and skips the capacity check. Otherwise the drop
    /// strategy applies when full: `Newest` refuses the item and returns
    /// `false`, `Oldest` evicts the head, and `Block` polls until space
    /// frees up (or the configured block timeout elapses).
    pub async fn push(&self, item: T) -> bool {
        let key = self.key_fn.as_ref().map(|key_fn| key_fn(&item));

        if let Some(key) = &key {
            let mut state = self.state.lock();
            let cached = state.dedup.as_ref().and_then(|dedup| dedup.get(key));
            match cached {
                Some(cached) => {
                    state.metrics.cache_hits += 1;
                    state.accept(cached);
                    return true;
                }
                None => state.metrics.cache_misses += 1,
            }
        }

        let started = Instant::now();
        loop {
            {
                let mut state = self.state.lock();
                let full = self
                    .max_size
                    .map_or(false, |max| state.items.len() >= max);

                if full {
                    match self.drop_strategy {
                        DropStrategy::Newest => {
                            state.metrics.dropped += 1;
                            debug!("queue full, refused incoming item");
                            return false;
                        }
                        DropStrategy::Oldest => {
                            state.items.pop_front();
                            state.metrics.dropped += 1;
                            debug!("queue full, evicted oldest item");
                        }
                        DropStrategy::Block => {}
                    }
                }

                if !full || self.drop_strategy != DropStrategy::Block {
                    if let (Some(key), Some(dedup)) = (key, state.dedup.as_mut()) {
                        dedup.insert(key, item.clone());
                    }
                    state.accept(item);
                    return true;
                }

                if let Some(timeout) = self.block_timeout {
                    if started.elapsed() >= timeout {
                        state.metrics.dropped += 1;
                        warn!(?timeout, "blocked push timed out, item dropped");
                        return false;
                    }
                }
            }

            tokio::time::sleep(self.block_poll).await;
        }
    }

    // == Next ==
    /// Returns the head item, suspending until a producer hands one over
    /// when the queue is empty.
    ///
    /// Dropping the returned future before it resolves loses nothing: the
    /// abandoned registration is skipped by later pushes, and an item already
    /// handed to it goes back to the head of the queue.
    pub async fn next(&self) -> T {
        loop {
            let receiver = {
                let mut state = self.state.lock();
                if let Some(item) = state.items.pop_front() {
                    state.metrics.dequeued += 1;
                    return item;
                }
                let (sender, receiver) = oneshot::channel();
                state.waiters.push_back(sender);
                receiver
            };

            let mut waiter = Waiter {
                queue: self,
                receiver,
            };
            if let Ok(item) = (&mut waiter.receiver).await {
                return item;
            }
        }
    }

    // == Try Next ==
    /// Pops the head item without waiting.
    pub fn try_next(&self) -> Option<T> {
        let mut state = self.state.lock();
        let item = state.items.pop_front()?;
        state.metrics.dequeued += 1;
        Some(item)
    }

    // == Stream ==
    /// Endless stream of items produced by repeatedly awaiting [`next`](Self::next).
    ///
    /// Never terminates on its own; stop polling to stop consuming.
    pub fn stream(&self) -> impl Stream<Item = T> + '_ {
        stream::unfold(self, |queue| async move { Some((queue.next().await, queue)) })
    }

    // == Clear ==
    /// Discards buffered items. Suspended consumers keep waiting.
    pub fn clear(&self) {
        self.state.lock().items.clear();
    }

    // == Clear Cache ==
    /// Empties the deduplication map only.
    pub fn clear_cache(&self) {
        if let Some(dedup) = self.state.lock().dedup.as_mut() {
            dedup.clear();
        }
    }

    // == Metrics ==
    /// Returns a snapshot copy of the counters.
    pub fn metrics(&self) -> QueueMetrics {
        let state = self.state.lock();
        QueueMetrics {
            current_size: state.items.len(),
            ..state.metrics.clone()
        }
    }

    // == Length ==
    /// Number of buffered items.
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    // == Pending ==
    /// Number of consumers currently suspended in `next`.
    pub fn pending(&self) -> usize {
        let mut state = self.state.lock();
        state.waiters.retain(|waiter| !waiter.is_closed());
        state.waiters.len()
    }

    /// Number of live deduplication entries, 0 when deduplication is off.
    pub fn cached_keys(&self) -> usize {
        self.state.lock().dedup.as_ref().map_or(0, DedupCache::len)
    }
}
