/// Milliseconds since the session started.
pub type Millis = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Screen timers are dropped when the screen with that epoch is left;
/// session timers live until teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tenure {
    Screen(u64),
    Session,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    AutoAdvance,
    FadeComplete,
    AcknowledgeSettle,
    RevealLine(usize),
    AdCountdown,
    NoticeDismiss,
    FlashEnd,
    ClockTick,
}

#[derive(Debug, Clone)]
struct Armed {
    id: TimerId,
    due: Millis,
    kind: TimerKind,
    tenure: Tenure,
    every: Option<Millis>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub id: TimerId,
    pub due: Millis,
    pub kind: TimerKind,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    armed: Vec<Armed>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn once(&mut self, now: Millis, delay: Millis, kind: TimerKind, tenure: Tenure) -> TimerId {
        self.arm(now.saturating_add(delay), kind, tenure, None)
    }

    /// Fires every `interval` ms, first at `now + interval`.
    pub fn repeating(
        &mut self,
        now: Millis,
        interval: Millis,
        kind: TimerKind,
        tenure: Tenure,
    ) -> TimerId {
        let interval = interval.max(1);
        self.arm(now.saturating_add(interval), kind, tenure, Some(interval))
    }

    fn arm(
        &mut self,
        due: Millis,
        kind: TimerKind,
        tenure: Tenure,
        every: Option<Millis>,
    ) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.armed.push(Armed {
            id,
            due,
            kind,
            tenure,
            every,
        });
        id
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.armed.len();
        self.armed.retain(|t| t.id != id);
        self.armed.len() != before
    }

    /// Cancels every timer bound to the given tenure; returns how many.
    pub fn cancel_tenure(&mut self, tenure: Tenure) -> usize {
        let before = self.armed.len();
        self.armed.retain(|t| t.tenure != tenure);
        before - self.armed.len()
    }

    pub fn cancel_all(&mut self) -> usize {
        let count = self.armed.len();
        self.armed.clear();
        count
    }

    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }

    pub fn has_kind(&self, kind: TimerKind) -> bool {
        self.armed.iter().any(|t| t.kind == kind)
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.armed.iter().map(|t| t.due).min()
    }

    /// Removes and returns the earliest timer due at or before `now`.
    /// Ties go to the timer armed first. Repeating timers are re-armed one
    /// interval after their deadline.
    pub fn pop_due(&mut self, now: Millis) -> Option<Fired> {
        let pos = self
            .armed
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= now)
            .min_by_key(|(_, t)| (t.due, t.id))
            .map(|(pos, _)| pos)?;

        let fired = Fired {
            id: self.armed[pos].id,
            due: self.armed[pos].due,
            kind: self.armed[pos].kind,
        };

        match self.armed[pos].every {
            Some(interval) => self.armed[pos].due = fired.due.saturating_add(interval),
            None => {
                self.armed.swap_remove(pos);
            }
        }

        Some(fired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_once_fires_at_deadline_only() {
        let mut timers = TimerQueue::new();
        timers.once(0, 100, TimerKind::AutoAdvance, Tenure::Screen(0));

        assert_eq!(timers.pop_due(99), None);
        let fired = timers.pop_due(100).unwrap();
        assert_eq!(fired.kind, TimerKind::AutoAdvance);
        assert_eq!(fired.due, 100);
        assert_eq!(timers.pop_due(1000), None);
    }

    #[test]
    fn test_pop_due_orders_by_deadline_then_arming() {
        let mut timers = TimerQueue::new();
        timers.once(0, 50, TimerKind::RevealLine(2), Tenure::Screen(0));
        timers.once(0, 10, TimerKind::RevealLine(1), Tenure::Screen(0));
        timers.once(0, 10, TimerKind::AdCountdown, Tenure::Screen(0));

        let order: Vec<TimerKind> = std::iter::from_fn(|| timers.pop_due(100))
            .map(|f| f.kind)
            .collect();
        assert_eq!(
            order,
            vec![
                TimerKind::RevealLine(1),
                TimerKind::AdCountdown,
                TimerKind::RevealLine(2)
            ]
        );
    }

    #[test]
    fn test_repeating_rearms_from_deadline() {
        let mut timers = TimerQueue::new();
        timers.repeating(0, 1000, TimerKind::ClockTick, Tenure::Session);

        // a late poll still yields each beat at its own deadline
        let beats: Vec<Millis> = std::iter::from_fn(|| timers.pop_due(3500))
            .map(|f| f.due)
            .collect();
        assert_eq!(beats, vec![1000, 2000, 3000]);
        assert_eq!(timers.next_due(), Some(4000));
    }

    #[test]
    fn test_cancel_tenure_spares_other_screens_and_session() {
        let mut timers = TimerQueue::new();
        timers.once(0, 10, TimerKind::AutoAdvance, Tenure::Screen(0));
        timers.once(0, 10, TimerKind::RevealLine(0), Tenure::Screen(0));
        let next = timers.once(0, 10, TimerKind::AutoAdvance, Tenure::Screen(1));
        let clock = timers.repeating(0, 1000, TimerKind::ClockTick, Tenure::Session);

        assert_eq!(timers.cancel_tenure(Tenure::Screen(0)), 2);
        assert_eq!(timers.armed_count(), 2);
        assert!(!timers.has_kind(TimerKind::RevealLine(0)));
        assert!(timers.cancel(next));
        assert!(timers.cancel(clock));
    }

    #[test]
    fn test_cancel_single_and_all() {
        let mut timers = TimerQueue::new();
        let a = timers.once(0, 10, TimerKind::AutoAdvance, Tenure::Screen(0));
        timers.once(0, 10, TimerKind::FlashEnd, Tenure::Session);

        assert!(timers.cancel(a));
        assert!(!timers.cancel(a));
        assert!(!timers.has_kind(TimerKind::AutoAdvance));
        assert_eq!(timers.cancel_all(), 1);
        assert_eq!(timers.next_due(), None);
    }
}
