//! Timer host abstraction.
//!
//! Timers are the only concurrency primitive in the core. A host schedules
//! a [`ScheduledTimer`] and, once it elapses, hands it back through
//! [`crate::SessionContext::handle_timer`]. Cancellation is best-effort: a
//! host may still deliver a timer it was asked to clear, which is why every
//! timer carries the generation it was scheduled under.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use crate::time::{Clock, ManualClock};
use crate::types::Generation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Token enters the warning window.
    Warning,
    /// Token expires.
    Expiry,
    /// Terminal "session expired" message has been visible long enough.
    Grace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScheduledTimer {
    pub kind: TimerKind,
    pub generation: Generation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

/// `setTimeout`/`clearTimeout` equivalent supplied by the host event loop.
pub trait TimerHost {
    fn set_timeout(&self, delay_ms: u64, timer: ScheduledTimer) -> TimerHandle;
    fn clear_timeout(&self, handle: TimerHandle);
}

#[derive(Default)]
struct TimerQueue {
    next_handle: u64,
    /// (due_ms, handle) orders by due time, then scheduling order.
    pending: BTreeMap<(i64, u64), ScheduledTimer>,
    due_by_handle: HashMap<u64, i64>,
}

/// Virtual timer queue driven by a [`ManualClock`].
pub struct ManualTimers {
    clock: ManualClock,
    queue: RefCell<TimerQueue>,
}

impl ManualTimers {
    pub fn new(clock: ManualClock) -> Self {
        ManualTimers {
            clock,
            queue: RefCell::new(TimerQueue::default()),
        }
    }

    /// Pops the earliest timer due at or before `deadline_ms` and moves the
    /// clock to its due time. Returns `None` once nothing else is due; the
    /// clock is then left untouched.
    pub fn fire_next(&self, deadline_ms: i64) -> Option<ScheduledTimer> {
        let mut queue = self.queue.borrow_mut();
        let &(due, handle) = queue.pending.keys().next()?;
        if due > deadline_ms {
            return None;
        }
        let timer = queue.pending.remove(&(due, handle))?;
        queue.due_by_handle.remove(&handle);
        drop(queue);

        if due > self.clock.now_ms() {
            self.clock.set(due);
        }
        Some(timer)
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().pending.len()
    }

    /// Due time of the next outstanding timer, if any.
    pub fn next_due(&self) -> Option<i64> {
        self.queue
            .borrow()
            .pending
            .keys()
            .next()
            .map(|&(due, _)| due)
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }
}

impl TimerHost for ManualTimers {
    fn set_timeout(&self, delay_ms: u64, timer: ScheduledTimer) -> TimerHandle {
        let mut queue = self.queue.borrow_mut();
        let handle = queue.next_handle;
        queue.next_handle += 1;
        let delay = i64::try_from(delay_ms).unwrap_or(i64::MAX);
        let due = self.clock.now_ms().saturating_add(delay);
        queue.pending.insert((due, handle), timer);
        queue.due_by_handle.insert(handle, due);
        TimerHandle(handle)
    }

    fn clear_timeout(&self, handle: TimerHandle) {
        let mut queue = self.queue.borrow_mut();
        if let Some(due) = queue.due_by_handle.remove(&handle.0) {
            queue.pending.remove(&(due, handle.0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer(kind: TimerKind) -> ScheduledTimer {
        ScheduledTimer {
            kind,
            generation: 1,
        }
    }

    #[test]
    fn fires_in_due_order_and_advances_clock() {
        let clock = ManualClock::new(0);
        let timers = ManualTimers::new(clock.clone());
        timers.set_timeout(200, timer(TimerKind::Expiry));
        timers.set_timeout(100, timer(TimerKind::Warning));

        assert_eq!(timers.fire_next(1_000), Some(timer(TimerKind::Warning)));
        assert_eq!(clock.now_ms(), 100);
        assert_eq!(timers.fire_next(1_000), Some(timer(TimerKind::Expiry)));
        assert_eq!(clock.now_ms(), 200);
        assert_eq!(timers.fire_next(1_000), None);
    }

    #[test]
    fn respects_deadline() {
        let clock = ManualClock::new(0);
        let timers = ManualTimers::new(clock.clone());
        timers.set_timeout(500, timer(TimerKind::Expiry));

        assert_eq!(timers.fire_next(499), None);
        assert_eq!(clock.now_ms(), 0);
        assert_eq!(timers.next_due(), Some(500));
    }

    #[test]
    fn cleared_timers_never_fire() {
        let clock = ManualClock::new(0);
        let timers = ManualTimers::new(clock);
        let handle = timers.set_timeout(10, timer(TimerKind::Warning));
        timers.clear_timeout(handle);
        timers.clear_timeout(handle);

        assert_eq!(timers.pending(), 0);
        assert_eq!(timers.fire_next(i64::MAX), None);
    }

    #[test]
    fn equal_due_times_fire_in_scheduling_order() {
        let clock = ManualClock::new(0);
        let timers = ManualTimers::new(clock);
        timers.set_timeout(50, timer(TimerKind::Expiry));
        timers.set_timeout(50, timer(TimerKind::Grace));

        assert_eq!(timers.fire_next(50).map(|t| t.kind), Some(TimerKind::Expiry));
        assert_eq!(timers.fire_next(50).map(|t| t.kind), Some(TimerKind::Grace));
    }
}
