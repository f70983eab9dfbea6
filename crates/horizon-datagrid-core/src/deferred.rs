//! Deferred work queue for single-threaded components.
//!
//! Work items are plain values describing what to do later. An item is either
//! posted for the next turn of the event loop or delayed behind a one-shot
//! timer. Restarting a delayed item cancels its pending timer first, which
//! gives debounce semantics: only the last restart within the quiet period
//! produces a ready item.
//!
//! The owning component drains ready items with
//! [`take_ready_at`](DeferredQueue::take_ready_at) and handles them itself, so
//! handlers always see the component's current state and must re-validate
//! anything captured when the work was scheduled.
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use horizon_datagrid_core::DeferredQueue;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! enum Work { Search, Repaint }
//!
//! let mut queue = DeferredQueue::new();
//! let start = Instant::now();
//!
//! queue.post(Work::Repaint);
//! queue.restart_at(Work::Search, Duration::from_millis(500), start);
//! queue.restart_at(Work::Search, Duration::from_millis(500), start + Duration::from_millis(200));
//!
//! assert_eq!(queue.take_ready_at(start + Duration::from_millis(600)), vec![Work::Repaint]);
//! assert_eq!(queue.take_ready_at(start + Duration::from_millis(700)), vec![Work::Search]);
//! ```

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::timer::{TimerId, TimerManager};

/// A queue of deferred work items of type `T`.
#[derive(Debug)]
pub struct DeferredQueue<T> {
    /// Items ready on the next turn.
    ready: VecDeque<T>,
    /// Timers backing delayed items.
    timers: TimerManager,
    /// Delayed items keyed by their timer.
    delayed: HashMap<TimerId, T>,
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self {
            ready: VecDeque::new(),
            timers: TimerManager::new(),
            delayed: HashMap::new(),
        }
    }
}

impl<T: PartialEq> DeferredQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Post an item to run on the next turn.
    pub fn post(&mut self, item: T) {
        self.ready.push_back(item);
    }

    /// Delay an item behind a one-shot timer started now.
    pub fn post_after(&mut self, item: T, delay: Duration) -> TimerId {
        self.post_after_at(item, delay, Instant::now())
    }

    /// Delay an item behind a one-shot timer started at `now`.
    pub fn post_after_at(&mut self, item: T, delay: Duration, now: Instant) -> TimerId {
        let id = self.timers.start_one_shot_at(now, delay);
        self.delayed.insert(id, item);
        id
    }

    /// Cancel any delayed copy of `item` and delay it again.
    pub fn restart(&mut self, item: T, delay: Duration) -> TimerId {
        self.restart_at(item, delay, Instant::now())
    }

    /// Cancel any delayed copy of `item` and delay it again from `now`.
    pub fn restart_at(&mut self, item: T, delay: Duration, now: Instant) -> TimerId {
        let cancelled = self.cancel_matching(&item);
        if cancelled > 0 {
            tracing::trace!(target: "horizon_datagrid_core::deferred", cancelled, "debounce restarted");
        }
        self.post_after_at(item, delay, now)
    }

    /// Cancel a delayed item by its timer.
    pub fn cancel(&mut self, id: TimerId) -> Result<()> {
        self.timers.stop(id)?;
        self.delayed.remove(&id);
        Ok(())
    }

    /// Cancel every pending copy of `item`, ready or delayed.
    ///
    /// Returns the number of items removed.
    pub fn cancel_matching(&mut self, item: &T) -> usize {
        let ids: Vec<TimerId> = self
            .delayed
            .iter()
            .filter(|(_, pending)| *pending == item)
            .map(|(id, _)| *id)
            .collect();
        for id in &ids {
            self.delayed.remove(id);
            let _ = self.timers.stop(*id);
        }

        let before = self.ready.len();
        self.ready.retain(|pending| pending != item);
        ids.len() + (before - self.ready.len())
    }

    /// Whether a copy of `item` is pending.
    pub fn is_pending(&self, item: &T) -> bool {
        self.ready.iter().any(|pending| pending == item)
            || self.delayed.values().any(|pending| pending == item)
    }

    /// Number of pending items.
    pub fn pending_count(&self) -> usize {
        self.ready.len() + self.delayed.len()
    }

    /// Duration from `now` until something becomes ready.
    ///
    /// Returns `Some(Duration::ZERO)` when items are already posted, and
    /// `None` when the queue is idle.
    pub fn time_until_next_at(&mut self, now: Instant) -> Option<Duration> {
        if !self.ready.is_empty() {
            return Some(Duration::ZERO);
        }
        self.timers.time_until_next_at(now)
    }

    /// Take every item ready at `now`.
    ///
    /// Posted items come first in post order, followed by expired delayed
    /// items in fire order.
    pub fn take_ready_at(&mut self, now: Instant) -> Vec<T> {
        let mut items: Vec<T> = self.ready.drain(..).collect();
        for id in self.timers.process_expired_at(now) {
            if let Some(item) = self.delayed.remove(&id) {
                items.push(item);
            }
        }
        if !items.is_empty() {
            tracing::trace!(target: "horizon_datagrid_core::deferred", count = items.len(), "deferred items ready");
        }
        items
    }

    /// Take every item ready now.
    pub fn take_ready(&mut self) -> Vec<T> {
        self.take_ready_at(Instant::now())
    }

    /// Drop all pending work.
    pub fn clear(&mut self) {
        self.ready.clear();
        for id in self.delayed.keys().copied().collect::<Vec<_>>() {
            let _ = self.timers.stop(id);
        }
        self.delayed.clear();
    }
}
