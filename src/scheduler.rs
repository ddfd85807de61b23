//! Deadline queue for timed steps
//!
//! Steps are not timers: they are deadlines checked whenever the event loop
//! ticks. Each step belongs to a session so a whole run can be dropped at once.

use std::time::{Duration, Instant};

/// Identifies one run of scheduled steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SessionToken(u64);

impl SessionToken {
    pub fn next(self) -> Self {
        SessionToken(self.0.wrapping_add(1))
    }
}

#[derive(Debug)]
struct Pending<T> {
    due: Instant,
    seq: u64,
    session: SessionToken,
    step: T,
}

/// A step whose deadline has passed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<T> {
    pub due: Instant,
    pub session: SessionToken,
    pub step: T,
}

#[derive(Debug)]
pub struct Scheduler<T> {
    pending: Vec<Pending<T>>,
    next_seq: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            next_seq: 0,
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `step` to fire `delay` after `base`
    pub fn schedule(&mut self, base: Instant, delay: Duration, session: SessionToken, step: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Pending {
            due: base + delay,
            seq,
            session,
            step,
        });
    }

    /// Remove the earliest step due at or before `now`. Ties go to the step
    /// scheduled first.
    pub fn pop_due(&mut self, now: Instant) -> Option<Fired<T>> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= now)
            .min_by_key(|(_, p)| (p.due, p.seq))
            .map(|(i, _)| i)?;

        let p = self.pending.swap_remove(idx);
        Some(Fired {
            due: p.due,
            session: p.session,
            step: p.step,
        })
    }

    /// Drop every pending step of `session`, returning how many were dropped
    pub fn cancel_session(&mut self, session: SessionToken) -> usize {
        let before = self.pending.len();
        self.pending.retain(|p| p.session != session);
        before - self.pending.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_nothing_fires_early() {
        let t0 = Instant::now();
        let mut sched = Scheduler::new();
        sched.schedule(t0, ms(100), SessionToken::default(), "a");

        assert!(sched.pop_due(t0 + ms(99)).is_none());
        let fired = sched.pop_due(t0 + ms(100)).unwrap();
        assert_eq!(fired.step, "a");
        assert_eq!(fired.due, t0 + ms(100));
        assert!(sched.is_empty());
    }

    #[test]
    fn test_fires_in_due_order_then_insertion_order() {
        let t0 = Instant::now();
        let s = SessionToken::default();
        let mut sched = Scheduler::new();
        sched.schedule(t0, ms(300), s, "late");
        sched.schedule(t0, ms(100), s, "first");
        sched.schedule(t0, ms(100), s, "second");

        let order: Vec<_> = std::iter::from_fn(|| sched.pop_due(t0 + ms(1000)))
            .map(|f| f.step)
            .collect();
        assert_eq!(order, vec!["first", "second", "late"]);
    }

    #[test]
    fn test_cancel_session_only_drops_that_session() {
        let t0 = Instant::now();
        let old = SessionToken::default();
        let new = old.next();
        let mut sched = Scheduler::new();
        sched.schedule(t0, ms(10), old, 1);
        sched.schedule(t0, ms(20), old, 2);
        sched.schedule(t0, ms(30), new, 3);

        assert_eq!(sched.cancel_session(old), 2);
        assert_eq!(sched.pop_due(t0 + ms(29)), None);
        assert_eq!(sched.pop_due(t0 + ms(30)).map(|f| f.step), Some(3));
        assert!(sched.is_empty());
    }
}
