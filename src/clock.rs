//! Virtual time for the session: clocks and a cancellable timer queue.
//!
//! The session never sleeps. Callers read a [`Clock`] and hand the current
//! time to the session, which fires every timer due by then in deadline
//! order. Tests drive a [`ManualClock`]; the terminal UI uses a
//! [`MonotonicClock`].

use std::cell::Cell;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

/// Source of elapsed time since some fixed origin.
pub trait Clock {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

/// Wall-clock time measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Starts a clock at zero.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    /// Starts a clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward.
    pub fn advance(&self, dt: Duration) {
        self.now.set(self.now.get().saturating_add(dt));
    }

    /// Moves the clock forward by whole seconds.
    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }

    /// Moves the clock forward by milliseconds.
    pub fn advance_millis(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(u64);

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerEvent {
    /// Decrement the pre-game countdown.
    CountdownTick,
    /// The countdown showed "Go!"; start playing.
    CountdownFinished,
    /// Decrement the game clock.
    RoundTick,
    /// Replace a solved round with a fresh target.
    AdvanceTarget {
        /// Round generation the advance was scheduled for.
        generation: u64,
    },
}

#[derive(Debug, Clone)]
struct Entry {
    id: TimerId,
    due: Duration,
    period: Option<Duration>,
    event: TimerEvent,
}

/// Deadline queue of one-shot and repeating timers.
///
/// Timers due at the same instant fire in scheduling order.
#[derive(Debug, Default)]
pub struct Scheduler {
    now: Duration,
    next_id: u64,
    entries: Vec<Entry>,
}

impl Scheduler {
    /// Creates an empty scheduler at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the scheduler's notion of the current time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Returns the number of live timers.
    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if `id` is still scheduled.
    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Schedules `event` to fire once after `delay`.
    #[instrument(skip(self))]
    pub fn schedule_once(&mut self, delay: Duration, event: TimerEvent) -> TimerId {
        self.push(delay, None, event)
    }

    /// Schedules `event` to fire every `period`, starting one period from now.
    #[instrument(skip(self))]
    pub fn schedule_repeating(&mut self, period: Duration, event: TimerEvent) -> TimerId {
        self.push(period, Some(period), event)
    }

    fn push(&mut self, delay: Duration, period: Option<Duration>, event: TimerEvent) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let due = self.now.saturating_add(delay);
        trace!(?id, ?due, ?event, "Timer scheduled");
        self.entries.push(Entry {
            id,
            due,
            period,
            event,
        });
        id
    }

    /// Cancels a timer. Returns false if it had already fired or been cancelled.
    #[instrument(skip(self))]
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        let removed = self.entries.len() != before;
        if removed {
            debug!(?id, "Timer cancelled");
        }
        removed
    }

    /// Pops the earliest timer due at or before `until`.
    ///
    /// Moves the scheduler's time to the timer's deadline, so timers
    /// scheduled while handling the event are relative to that deadline.
    /// Repeating timers are re-armed one period later.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TimerId, TimerEvent)> {
        let index = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= until)
            .min_by_key(|(_, e)| (e.due, e.id))
            .map(|(i, _)| i)?;

        let Entry {
            id,
            due,
            period,
            event,
        } = self.entries[index];
        self.now = self.now.max(due);

        match period {
            Some(period) if !period.is_zero() => {
                self.entries[index].due = due.saturating_add(period);
            }
            _ => {
                self.entries.remove(index);
            }
        }
        Some((id, event))
    }

    /// Moves time forward to `until` once no more timers are due.
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Duration::ZERO);
        clock.advance_secs(2);
        clock.advance_millis(500);
        assert_eq!(clock.now(), Duration::from_millis(2500));
    }

    #[test]
    fn test_one_shot_fires_once() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_once(secs(1), TimerEvent::CountdownFinished);
        assert!(scheduler.pop_due(Duration::from_millis(999)).is_none());
        assert_eq!(
            scheduler.pop_due(secs(1)).map(|(_, e)| e),
            Some(TimerEvent::CountdownFinished)
        );
        assert!(scheduler.pop_due(secs(10)).is_none());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_repeating_timer_rearms() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_repeating(secs(1), TimerEvent::RoundTick);
        let mut fired = 0;
        while scheduler.pop_due(secs(5)).is_some() {
            fired += 1;
        }
        assert_eq!(fired, 5);
        assert_eq!(scheduler.now(), secs(5));
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_cancel_prevents_firing() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.schedule_repeating(secs(1), TimerEvent::RoundTick);
        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));
        assert!(scheduler.pop_due(secs(10)).is_none());
    }

    #[test]
    fn test_fires_in_deadline_then_schedule_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_once(secs(2), TimerEvent::RoundTick);
        scheduler.schedule_once(secs(1), TimerEvent::CountdownTick);
        scheduler.schedule_once(secs(1), TimerEvent::CountdownFinished);
        let order: Vec<_> = std::iter::from_fn(|| scheduler.pop_due(secs(3)))
            .map(|(_, e)| e)
            .collect();
        assert_eq!(
            order,
            vec![
                TimerEvent::CountdownTick,
                TimerEvent::CountdownFinished,
                TimerEvent::RoundTick
            ]
        );
    }

    #[test]
    fn test_new_timers_are_relative_to_fired_deadline() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_once(secs(1), TimerEvent::CountdownTick);
        scheduler.pop_due(secs(10));
        assert_eq!(scheduler.now(), secs(1));
        scheduler.schedule_once(secs(1), TimerEvent::CountdownFinished);
        assert_eq!(
            scheduler.pop_due(secs(10)).map(|(_, e)| e),
            Some(TimerEvent::CountdownFinished)
        );
        assert_eq!(scheduler.now(), secs(2));
        scheduler.settle(secs(10));
        assert_eq!(scheduler.now(), secs(10));
    }
}
