//! Edit coalescing for the document being typed into.
//!
//! Keystrokes replace a pending value; the pending value becomes the new
//! committed snapshot once no edit arrived for the quiet period, or at once
//! when the field loses focus. Only commits produce a new `Arc`, so the
//! preview memo re-renders once per pause rather than once per keystroke.

use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub struct EditBuffer<T> {
    committed: Arc<T>,
    pending: Option<(T, Instant)>,
    quiet: Duration,
}

impl<T> EditBuffer<T> {
    pub fn new(initial: T) -> Self {
        Self::with_quiet_period(initial, DEFAULT_QUIET_PERIOD)
    }

    pub fn with_quiet_period(initial: T, quiet: Duration) -> Self {
        Self {
            committed: Arc::new(initial),
            pending: None,
            quiet,
        }
    }

    /// Last committed value.
    pub fn snapshot(&self) -> Arc<T> {
        Arc::clone(&self.committed)
    }

    /// What the form shows: the pending value if any, else the snapshot.
    pub fn current(&self) -> &T {
        match &self.pending {
            Some((value, _)) => value,
            None => &self.committed,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Buffer `value`, restarting the quiet period.
    pub fn edit(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    /// Commit the pending value if it has been quiet long enough. Returns the
    /// new snapshot when a commit happened.
    pub fn poll(&mut self, now: Instant) -> Option<Arc<T>> {
        let ready = matches!(&self.pending, Some((_, at)) if now.saturating_duration_since(*at) >= self.quiet);
        if ready {
            self.commit_now()
        } else {
            None
        }
    }

    /// Commit any pending value immediately.
    pub fn commit_now(&mut self) -> Option<Arc<T>> {
        let (value, _) = self.pending.take()?;
        self.committed = Arc::new(value);
        Some(self.snapshot())
    }
}

impl<T: Clone> EditBuffer<T> {
    /// Apply `f` to a copy of the current value and buffer the result.
    pub fn update(&mut self, now: Instant, f: impl FnOnce(&mut T)) {
        let mut next = self.current().clone();
        f(&mut next);
        self.edit(next, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commits_only_after_quiet_period() {
        let t0 = Instant::now();
        let mut buf = EditBuffer::new(String::from("a"));
        let first = buf.snapshot();

        buf.edit("ab".into(), t0);
        buf.edit("abc".into(), t0 + Duration::from_millis(300));
        assert!(buf.poll(t0 + Duration::from_millis(600)).is_none());
        assert_eq!(buf.current(), "abc");
        assert!(Arc::ptr_eq(&first, &buf.snapshot()));

        let committed = buf.poll(t0 + Duration::from_millis(800)).unwrap();
        assert_eq!(*committed, "abc");
        assert!(!buf.has_pending());
    }

    #[test]
    fn blur_commits_immediately() {
        let mut buf = EditBuffer::new(1);
        assert!(buf.commit_now().is_none());
        buf.update(Instant::now(), |v| *v += 1);
        assert_eq!(*buf.commit_now().unwrap(), 2);
    }

    #[test]
    fn idle_polls_keep_the_same_snapshot() {
        let mut buf = EditBuffer::new(vec![1]);
        let a = buf.snapshot();
        assert!(buf.poll(Instant::now() + Duration::from_secs(5)).is_none());
        assert!(Arc::ptr_eq(&a, &buf.snapshot()));
    }
}
