//! Two-phase slide transition: the current card exits, then the target card
//! enters. The machine is busy from the start of the exit until the entry
//! completes.

use std::time::{Duration, Instant};

/// Length of each phase.
pub const PHASE_DURATION: Duration = Duration::from_millis(300);

/// Visual direction of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Current card leaves to the left, next enters from the right
    Forward,
    /// Current card leaves to the right, previous enters from the left
    Backward,
}

impl Direction {
    /// Direction that visually moves from `from` to `to`
    pub fn between(from: usize, to: usize) -> Self {
        if to > from {
            Direction::Forward
        } else {
            Direction::Backward
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Exit,
    Entry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Idle,
    PendingExit {
        target: usize,
        direction: Direction,
        started: Instant,
    },
    PendingEntry {
        direction: Direction,
        started: Instant,
    },
}

/// Result of stepping the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Nothing elapsed yet
    Pending,
    /// Exit finished; the target index should now be shown
    ExitDone { target: usize },
    /// Entry finished; the machine is idle again
    EntryDone,
}

impl Transition {
    pub fn start(target: usize, direction: Direction, now: Instant) -> Self {
        Transition::PendingExit {
            target,
            direction,
            started: now,
        }
    }

    pub fn is_busy(&self) -> bool {
        !matches!(self, Transition::Idle)
    }

    /// Advance at most one phase. The entry phase is timed from the end of
    /// the exit phase so a late poll does not stretch the animation.
    pub fn step(&mut self, now: Instant) -> Step {
        match *self {
            Transition::Idle => Step::Pending,
            Transition::PendingExit {
                target,
                direction,
                started,
            } => {
                if now.saturating_duration_since(started) < PHASE_DURATION {
                    return Step::Pending;
                }
                *self = Transition::PendingEntry {
                    direction,
                    started: started + PHASE_DURATION,
                };
                Step::ExitDone { target }
            }
            Transition::PendingEntry { started, .. } => {
                if now.saturating_duration_since(started) < PHASE_DURATION {
                    return Step::Pending;
                }
                *self = Transition::Idle;
                Step::EntryDone
            }
        }
    }

    /// Current phase, its direction and how far through it we are (0.0..=1.0)
    pub fn progress(&self, now: Instant) -> Option<(Phase, Direction, f32)> {
        let (phase, direction, started) = match *self {
            Transition::Idle => return None,
            Transition::PendingExit {
                direction, started, ..
            } => (Phase::Exit, direction, started),
            Transition::PendingEntry { direction, started } => (Phase::Entry, direction, started),
        };
        let elapsed = now.saturating_duration_since(started).as_secs_f32();
        let fraction = (elapsed / PHASE_DURATION.as_secs_f32()).clamp(0.0, 1.0);
        Some((phase, direction, fraction))
    }
}
