//! Deterministic timer scheduling on a virtual clock.
//!
//! The session never sleeps. It asks the [`Scheduler`] for one-shot and
//! periodic tasks, and whoever drives the session (tests, the tokio driver)
//! advances virtual time and dispatches what comes due. Every task is
//! stamped with the round generation current when it was scheduled; the
//! session drops tasks whose generation is stale.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::types::CardId;

/// Timer slot. At most one task per kind is pending at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerKind {
    /// End of the peek window.
    Peek,
    /// Flip-back of a mismatched pair.
    FlipBack,
    /// Round countdown.
    Countdown,
    /// Auto-progress countdown after a round ends.
    AutoProgress,
}

/// Work a timer performs when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Task {
    /// Hide all cards and start play.
    EndPeek,
    /// Turn a mismatched pair face down.
    FlipBack {
        /// First card of the pair.
        first: CardId,
        /// Second card of the pair.
        second: CardId,
    },
    /// One countdown second elapsed.
    CountdownTick,
    /// One auto-progress second elapsed.
    AutoProgressTick,
}

impl Task {
    /// Slot this task occupies.
    pub fn kind(&self) -> TimerKind {
        match self {
            Self::EndPeek => TimerKind::Peek,
            Self::FlipBack { .. } => TimerKind::FlipBack,
            Self::CountdownTick => TimerKind::Countdown,
            Self::AutoProgressTick => TimerKind::AutoProgress,
        }
    }
}

/// Opaque handle of a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub u64);

/// A task that came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    /// Handle it was scheduled under.
    pub id: TaskId,
    /// The work to perform.
    pub task: Task,
    /// Round generation captured at scheduling time.
    pub generation: u64,
}

#[derive(Debug, Clone)]
struct Entry {
    id: TaskId,
    task: Task,
    due: Duration,
    period: Option<Duration>,
    generation: u64,
}

/// Virtual-time scheduler with one slot per [`TimerKind`].
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now: Duration,
    generation: u64,
    next_id: u64,
    entries: Vec<Entry>,
}

impl Scheduler {
    /// Creates an empty scheduler at time zero, generation zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Current round generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts a new generation; tasks stamped earlier become stale.
    pub fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        debug!(generation = self.generation, "Round generation advanced");
        self.generation
    }

    /// Schedules `task` once after `delay`, replacing any pending task of
    /// the same kind.
    #[instrument(skip(self), fields(now = ?self.now))]
    pub fn schedule_once(&mut self, task: Task, delay: Duration) -> TaskId {
        self.insert(task, delay, None)
    }

    /// Schedules `task` every `period`, first firing one period from now.
    /// Replaces any pending task of the same kind. Periods below one
    /// millisecond are raised to one millisecond.
    #[instrument(skip(self), fields(now = ?self.now))]
    pub fn schedule_every(&mut self, task: Task, period: Duration) -> TaskId {
        let period = period.max(Duration::from_millis(1));
        self.insert(task, period, Some(period))
    }

    /// Schedules `task` every `period`, first firing after `first` instead
    /// of a full period. Used to resume a periodic timer mid-period.
    #[instrument(skip(self), fields(now = ?self.now))]
    pub fn schedule_every_after(
        &mut self,
        task: Task,
        first: Duration,
        period: Duration,
    ) -> TaskId {
        let period = period.max(Duration::from_millis(1));
        self.insert(task, first.min(period), Some(period))
    }

    fn insert(&mut self, task: Task, delay: Duration, period: Option<Duration>) -> TaskId {
        self.cancel(task.kind());
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            task,
            due: self.now + delay,
            period,
            generation: self.generation,
        });
        id
    }

    /// Cancels the pending task of `kind`. Returns whether one existed.
    /// Cancelling an empty slot is a no-op.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.task.kind() != kind);
        let removed = self.entries.len() != before;
        if removed {
            trace!(?kind, "Timer cancelled");
        }
        removed
    }

    /// Cancels every pending task.
    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    /// Whether a task of `kind` is pending.
    pub fn is_scheduled(&self, kind: TimerKind) -> bool {
        self.entries.iter().any(|e| e.task.kind() == kind)
    }

    /// Time left until the pending task of `kind` fires.
    pub fn remaining(&self, kind: TimerKind) -> Option<Duration> {
        self.entries
            .iter()
            .find(|e| e.task.kind() == kind)
            .map(|e| e.due.saturating_sub(self.now))
    }

    /// Number of pending tasks.
    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// Virtual time of the earliest pending task.
    pub fn next_due(&self) -> Option<Duration> {
        self.entries.iter().map(|e| e.due).min()
    }

    /// Removes and returns the earliest task due at or before `until`,
    /// moving the clock to its due time. Periodic tasks are re-armed one
    /// period later. Ties fire in scheduling order.
    pub fn pop_due(&mut self, until: Duration) -> Option<Fired> {
        let position = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= until)
            .min_by_key(|(_, e)| (e.due, e.id))
            .map(|(i, _)| i)?;

        let entry = &mut self.entries[position];
        let fired = Fired {
            id: entry.id,
            task: entry.task,
            generation: entry.generation,
        };
        self.now = self.now.max(entry.due);
        let period = entry.period;
        match period {
            Some(period) => entry.due += period,
            None => {
                self.entries.remove(position);
            }
        }
        Some(fired)
    }

    /// Moves the clock forward to `until` once nothing is due before it.
    pub fn advance_to(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}
