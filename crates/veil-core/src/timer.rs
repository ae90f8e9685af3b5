//! One-shot, cancellable deferred tasks for a single-threaded event loop.
//!
//! Nothing here spawns a thread. The host loop asks the scheduler which
//! timers are due and dispatches them itself, on the same thread as every
//! other operation.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Longest delay a timer is armed for. Longer delays are shortened to this.
pub const MAX_DELAY: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Handle to a scheduled one-shot timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// Cancellable one-shot timer queue.
pub trait Scheduler {
    /// Arm a timer that becomes due after `delay`.
    fn schedule(&mut self, delay: Duration) -> TimerId;

    /// Cancel a pending timer. Returns `false` if it already fired or was
    /// cancelled.
    fn cancel(&mut self, id: TimerId) -> bool;

    /// Remove and return every timer whose deadline has passed, earliest
    /// first.
    fn due(&mut self) -> Vec<TimerId>;

    /// Time left before `id` fires, or `None` if it is not pending.
    fn remaining(&self, id: TimerId) -> Option<Duration>;
}

/// Source of the current instant.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

#[derive(Debug)]
struct Pending {
    id: TimerId,
    deadline: Instant,
}

/// Deadline-ordered timer queue polled by the host event loop.
#[derive(Debug)]
pub struct DeadlineScheduler<K: Clock = SystemClock> {
    clock: K,
    next_id: u64,
    pending: Vec<Pending>,
}

impl DeadlineScheduler<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for DeadlineScheduler<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clock> DeadlineScheduler<K> {
    pub fn with_clock(clock: K) -> Self {
        Self {
            clock,
            next_id: 0,
            pending: Vec::new(),
        }
    }

    /// Earliest pending deadline, used by hosts to size their poll timeout.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|p| p.deadline).min()
    }

    /// Number of timers still pending.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl<K: Clock> Scheduler for DeadlineScheduler<K> {
    fn schedule(&mut self, delay: Duration) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        let now = self.clock.now();
        // An unrepresentable deadline fires right away rather than never.
        let deadline = now.checked_add(delay.min(MAX_DELAY)).unwrap_or(now);
        self.pending.push(Pending { id, deadline });
        id
    }

    fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }

    fn due(&mut self) -> Vec<TimerId> {
        let now = self.clock.now();
        let (mut fired, waiting): (Vec<Pending>, Vec<Pending>) = self
            .pending
            .drain(..)
            .partition(|p| p.deadline <= now);
        self.pending = waiting;
        fired.sort_by_key(|p| p.deadline);
        fired.into_iter().map(|p| p.id).collect()
    }

    fn remaining(&self, id: TimerId) -> Option<Duration> {
        let now = self.clock.now();
        self.pending
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.deadline.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_fires_only_after_delay() {
        let clock = ManualClock::new();
        let mut scheduler = DeadlineScheduler::with_clock(clock.clone());
        let id = scheduler.schedule(Duration::from_secs(10));

        clock.advance(Duration::from_secs(9));
        assert!(scheduler.due().is_empty());
        assert_eq!(scheduler.remaining(id), Some(Duration::from_secs(1)));

        clock.advance(Duration::from_secs(1));
        assert_eq!(scheduler.due(), vec![id]);
        assert!(scheduler.due().is_empty());
        assert_eq!(scheduler.remaining(id), None);
    }

    #[test]
    fn test_huge_delay_is_capped_instead_of_overflowing() {
        let clock = ManualClock::new();
        let mut scheduler = DeadlineScheduler::with_clock(clock.clone());
        let id = scheduler.schedule(Duration::MAX);

        assert_eq!(scheduler.remaining(id), Some(MAX_DELAY));
        assert!(scheduler.due().is_empty());
        clock.advance(MAX_DELAY);
        assert_eq!(scheduler.due(), vec![id]);
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let clock = ManualClock::new();
        let mut scheduler = DeadlineScheduler::with_clock(clock.clone());
        let id = scheduler.schedule(Duration::from_secs(1));

        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));

        clock.advance(Duration::from_secs(5));
        assert!(scheduler.due().is_empty());
    }

    #[test]
    fn test_due_orders_by_deadline() {
        let clock = ManualClock::new();
        let mut scheduler = DeadlineScheduler::with_clock(clock.clone());
        let late = scheduler.schedule(Duration::from_secs(3));
        let early = scheduler.schedule(Duration::from_secs(1));

        assert_eq!(
            scheduler.next_deadline(),
            Some(clock.now() + Duration::from_secs(1))
        );
        clock.advance(Duration::from_secs(3));
        assert_eq!(scheduler.due(), vec![early, late]);
        assert_eq!(scheduler.pending_count(), 0);
    }
}
