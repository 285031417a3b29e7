//! Virtual-time timer queue for deterministic tests.
//!
//! The scheduler owns a clock that only moves when asked to. Timers are kept
//! in a min-heap ordered by deadline, then by timer id, so:
//!
//! - Same deadline → timers fire in the order they were scheduled
//! - Expiration order is deterministic
//! - No wall-clock dependencies
//!
//! Cancellation is lazy: clearing a timer drops its callback, and the heap
//! entry is skipped when its deadline is reached.
//!
//! Callbacks run one at a time with the queue unborrowed, so a callback may
//! schedule or clear timers. A timer scheduled from a callback with a
//! deadline inside the range being advanced fires in the same call.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use oxide::{Scheduler, Settlement};
//!
//! let scheduler = Scheduler::new();
//! let execution = scheduler.delay(Duration::from_millis(1000), "value").run();
//! assert!(execution.is_pending());
//!
//! scheduler.advance_by(Duration::from_millis(1000));
//! assert_eq!(execution.settlement(), Some(Settlement::Resolved("value")));
//! ```

use core::fmt;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::future::Future;
use std::pin::pin;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::task::{Context, Poll, Wake, Waker};
use std::time::Duration;

use super::config::SchedulerConfig;
use crate::error::{ConfigError, SchedulerError};
use crate::task::{Resolver, Task};
use crate::types::Reason;

type Callback = Box<dyn FnOnce()>;

/// A timer entry in the heap.
#[derive(Debug, Clone, Copy)]
struct TimerEntry {
    deadline: Duration,
    timer_id: u64,
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.timer_id == other.timer_id
    }
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap ordering: earliest deadline first, then lowest timer_id
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.timer_id.cmp(&self.timer_id))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A handle for clearing a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    timer_id: u64,
    deadline: Duration,
}

impl TimerHandle {
    /// Returns the timer ID.
    #[must_use]
    pub const fn timer_id(&self) -> u64 {
        self.timer_id
    }

    /// Returns the virtual time the timer fires at.
    #[must_use]
    pub const fn deadline(&self) -> Duration {
        self.deadline
    }
}

struct TimerQueue {
    heap: BinaryHeap<TimerEntry>,
    callbacks: HashMap<u64, Callback>,
    now: Duration,
    next_timer_id: u64,
}

impl TimerQueue {
    /// Pops the next live timer due at or before `target`.
    fn pop_due(&mut self, target: Duration) -> Option<(TimerEntry, Callback)> {
        while let Some(&entry) = self.heap.peek() {
            if entry.deadline > target {
                return None;
            }
            self.heap.pop();
            // Cleared timers have no callback left.
            if let Some(callback) = self.callbacks.remove(&entry.timer_id) {
                return Some((entry, callback));
            }
        }
        None
    }

    fn next_deadline(&mut self) -> Option<Duration> {
        while let Some(entry) = self.heap.peek() {
            if self.callbacks.contains_key(&entry.timer_id) {
                return Some(entry.deadline);
            }
            self.heap.pop();
        }
        None
    }
}

/// Deterministic single-threaded virtual-time scheduler.
///
/// Cloning a `Scheduler` clones the handle; timer tasks keep a clone so
/// that they can schedule and clear timers when run.
#[derive(Clone)]
pub struct Scheduler {
    queue: Rc<RefCell<TimerQueue>>,
    config: Rc<SchedulerConfig>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Creates a scheduler with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    /// Creates a scheduler configured from `OXIDE_SCHEDULER_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        SchedulerConfig::from_env().map(Self::with_config)
    }

    /// Creates a scheduler with the given configuration.
    #[must_use]
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            queue: Rc::new(RefCell::new(TimerQueue {
                heap: BinaryHeap::new(),
                callbacks: HashMap::new(),
                now: config.start,
                next_timer_id: 0,
            })),
            config: Rc::new(config),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Returns the current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.queue.borrow().now
    }

    /// Returns the number of timers that have neither fired nor been cleared.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().callbacks.len()
    }

    /// Returns the deadline of the next live timer, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.borrow_mut().next_deadline()
    }

    /// Schedules `callback` to run once `after` has elapsed.
    pub fn set_timeout<F>(&self, after: Duration, callback: F) -> TimerHandle
    where
        F: FnOnce() + 'static,
    {
        let mut queue = self.queue.borrow_mut();
        let timer_id = queue.next_timer_id;
        queue.next_timer_id += 1;
        let deadline = queue.now.saturating_add(after);
        queue.heap.push(TimerEntry { deadline, timer_id });
        queue.callbacks.insert(timer_id, Box::new(callback));
        tracing::trace!(timer_id, ?deadline, "timer scheduled");
        TimerHandle { timer_id, deadline }
    }

    /// Clears a timer. Returns false if it already fired or was cleared.
    pub fn clear_timeout(&self, handle: TimerHandle) -> bool {
        let cleared = self
            .queue
            .borrow_mut()
            .callbacks
            .remove(&handle.timer_id)
            .is_some();
        tracing::trace!(timer_id = handle.timer_id, cleared, "timer cleared");
        cleared
    }

    /// Advances virtual time by `by`, firing every timer that comes due.
    ///
    /// Returns the number of timers fired.
    pub fn advance_by(&self, by: Duration) -> usize {
        let target = self.now().saturating_add(by);
        self.advance_to(target)
    }

    /// Advances virtual time to `target`, firing every timer that comes due.
    ///
    /// Time never moves backwards; a target in the past fires nothing.
    pub fn advance_to(&self, target: Duration) -> usize {
        let mut fired = 0;
        loop {
            let due = self.queue.borrow_mut().pop_due(target);
            let Some((entry, callback)) = due else { break };
            self.fire(entry, callback);
            fired += 1;
        }
        let mut queue = self.queue.borrow_mut();
        if target > queue.now {
            queue.now = target;
        }
        fired
    }

    /// Advances to the next timer deadline and fires every timer due then.
    ///
    /// Returns the number of timers fired; zero (and no time change) when
    /// nothing is scheduled.
    pub fn advance_to_next(&self) -> usize {
        match self.next_deadline() {
            Some(deadline) => self.advance_to(deadline),
            None => 0,
        }
    }

    /// Fires timers until none are left.
    ///
    /// Returns the number of timers fired, or an error when more than
    /// `max_steps` deadlines were reached.
    pub fn run_until_idle(&self) -> Result<usize, SchedulerError> {
        let max_steps = self.config.max_steps;
        let mut fired = 0;
        for _ in 0..max_steps {
            if self.next_deadline().is_none() {
                return Ok(fired);
            }
            fired += self.advance_to_next();
        }
        if self.next_deadline().is_none() {
            Ok(fired)
        } else {
            Err(SchedulerError::StepLimitExceeded { max_steps })
        }
    }

    /// Drives `future` to completion, advancing virtual time whenever it is
    /// pending and nothing has woken it.
    ///
    /// Fails with [`SchedulerError::Stalled`] when the future is pending and
    /// no timer is left, and with [`SchedulerError::StepLimitExceeded`]
    /// after `max_steps` polls.
    pub fn block_on<F: Future>(&self, future: F) -> Result<F::Output, SchedulerError> {
        let max_steps = self.config.max_steps;
        let mut future = pin!(future);
        let flag = Arc::new(WakeFlag(AtomicBool::new(false)));
        let waker = Waker::from(Arc::clone(&flag));
        let mut cx = Context::from_waker(&waker);

        for _ in 0..max_steps {
            if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
                return Ok(output);
            }
            if flag.0.swap(false, AtomicOrdering::SeqCst) {
                continue;
            }
            if self.advance_to_next() == 0 {
                tracing::debug!(now = ?self.now(), "block_on stalled");
                return Err(SchedulerError::Stalled);
            }
        }
        Err(SchedulerError::StepLimitExceeded { max_steps })
    }

    /// A task that resolves with `value` after `after` virtual time.
    ///
    /// Cancelling the execution clears its timer.
    #[must_use]
    pub fn delay<T: Clone + 'static>(&self, after: Duration, value: T) -> Task<T> {
        let scheduler = self.clone();
        Task::new(move |resolver: Resolver<T>| {
            let settle = resolver.clone();
            let value = value.clone();
            scheduler.arm(after, &resolver, move || settle.resolve(value));
        })
    }

    /// A task that rejects with `reason` after `after` virtual time.
    ///
    /// Cancelling the execution clears its timer.
    #[must_use]
    pub fn delay_rejected<T: 'static>(
        &self,
        after: Duration,
        reason: impl Into<Reason>,
    ) -> Task<T> {
        let scheduler = self.clone();
        let reason = reason.into();
        Task::new(move |resolver: Resolver<T>| {
            let settle = resolver.clone();
            let reason = reason.clone();
            scheduler.arm(after, &resolver, move || settle.reject(reason));
        })
    }

    /// Schedules `fire` and clears it if `resolver`'s execution is cancelled.
    fn arm<T: 'static>(
        &self,
        after: Duration,
        resolver: &Resolver<T>,
        fire: impl FnOnce() + 'static,
    ) {
        let handle = self.set_timeout(after, fire);
        let scheduler = self.clone();
        resolver.on_cancelled(move || {
            scheduler.clear_timeout(handle);
        });
    }

    fn fire(&self, entry: TimerEntry, callback: Callback) {
        self.queue.borrow_mut().now = entry.deadline;
        if self.config.trace_timers {
            tracing::debug!(timer_id = entry.timer_id, deadline = ?entry.deadline, "timer fired");
        } else {
            tracing::trace!(timer_id = entry.timer_id, deadline = ?entry.deadline, "timer fired");
        }
        callback();
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = self.queue.borrow();
        f.debug_struct("Scheduler")
            .field("now", &queue.now)
            .field("pending", &queue.callbacks.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Waker that records whether it was woken.
struct WakeFlag(AtomicBool);

impl Wake for WakeFlag {
    fn wake(self: Arc<Self>) {
        self.0.store(true, AtomicOrdering::SeqCst);
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.0.store(true, AtomicOrdering::SeqCst);
    }
}
