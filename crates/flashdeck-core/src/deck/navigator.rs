//! Navigation controller for the card deck.
//!
//! The navigator owns the display state: the card list, the current index and
//! the transition machine. Navigation requests are rejected while a
//! transition is in flight; an accepted request changes the index at the end
//! of the exit phase, and the new index is persisted at that moment.

use rand::Rng;
use tracing::debug;

use super::clock::Clock;
use super::position::{restore_position, save_position, PositionStore};
use super::transition::{Direction, Phase, Step, Transition};
use crate::models::Card;

/// Emitted by `poll` when the transition machine moves on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEvent {
    /// The card at `index` is now current and should be rendered
    Rendered { index: usize },
    /// The entry animation finished; navigation is accepted again
    Settled,
}

pub struct Navigator<C: Clock, S: PositionStore> {
    cards: Vec<Card>,
    index: usize,
    transition: Transition,
    clock: C,
    store: S,
}

impl<C: Clock, S: PositionStore> Navigator<C, S> {
    /// Build the display state, restoring the saved position
    pub fn new(cards: Vec<Card>, clock: C, store: S) -> Self {
        let index = restore_position(&store, cards.len());
        debug!(cards = cards.len(), index = index, "Navigator ready");
        Self {
            cards,
            index,
            transition: Transition::Idle,
            clock,
            store,
        }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current_card(&self) -> Option<&Card> {
        self.cards.get(self.index)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// True while a transition is in flight
    pub fn is_busy(&self) -> bool {
        self.transition.is_busy()
    }

    pub fn transition(&self) -> Transition {
        self.transition
    }

    /// Current animation phase for rendering
    pub fn animation(&self) -> Option<(Phase, Direction, f32)> {
        self.transition.progress(self.clock.now())
    }

    pub fn can_go_back(&self) -> bool {
        self.index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.index + 1 < self.cards.len()
    }

    /// "3 / 10" style progress indicator
    pub fn progress_label(&self) -> String {
        if self.cards.is_empty() {
            return "0 / 0".to_string();
        }
        format!("{} / {}", self.index + 1, self.cards.len())
    }

    /// Move one card forward or backward. Returns false if rejected.
    pub fn advance(&mut self, direction: Direction) -> bool {
        if self.is_busy() {
            return false;
        }
        let target = match direction {
            Direction::Forward if self.can_go_forward() => self.index + 1,
            Direction::Backward if self.can_go_back() => self.index - 1,
            _ => return false,
        };
        self.begin(target, direction);
        true
    }

    /// Jump to a random card other than the current one. Returns false if
    /// rejected (fewer than two cards, or busy).
    pub fn jump_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.cards.len() < 2 || self.is_busy() {
            return false;
        }
        let target = loop {
            let candidate = rng.gen_range(0..self.cards.len());
            if candidate != self.index {
                break candidate;
            }
        };
        self.begin(target, Direction::between(self.index, target));
        true
    }

    fn begin(&mut self, target: usize, direction: Direction) {
        debug!(from = self.index, to = target, ?direction, "Transition started");
        self.transition = Transition::start(target, direction, self.clock.now());
    }

    /// Drive the transition machine from the clock
    pub fn poll(&mut self) -> Option<NavEvent> {
        match self.transition.step(self.clock.now()) {
            Step::Pending => None,
            Step::ExitDone { target } => {
                self.index = target;
                save_position(&mut self.store, target);
                Some(NavEvent::Rendered { index: target })
            }
            Step::EntryDone => Some(NavEvent::Settled),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::clock::ManualClock;
    use crate::deck::position::{MemoryPositionStore, POSITION_KEY};
    use crate::deck::transition::PHASE_DURATION;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn deck(n: usize) -> Vec<Card> {
        (0..n).map(|i| Card::new(i as i64 + 1, format!("card {}", i))).collect()
    }

    fn navigator(
        n: usize,
        start: usize,
    ) -> (Navigator<ManualClock, MemoryPositionStore>, ManualClock) {
        let clock = ManualClock::new();
        let mut store = MemoryPositionStore::new();
        save_position(&mut store, start);
        (Navigator::new(deck(n), clock.clone(), store), clock)
    }

    /// Run a started transition to completion
    fn finish(nav: &mut Navigator<ManualClock, MemoryPositionStore>, clock: &ManualClock) {
        clock.advance(PHASE_DURATION);
        assert!(matches!(nav.poll(), Some(NavEvent::Rendered { .. })));
        clock.advance(PHASE_DURATION);
        assert_eq!(nav.poll(), Some(NavEvent::Settled));
    }

    // -------------------------------------------------------------------------
    // Advance
    // -------------------------------------------------------------------------

    #[test]
    fn test_advance_forward_every_index() {
        let n = 5;
        for i in 0..n {
            let (mut nav, clock) = navigator(n, i);
            assert_eq!(nav.index(), i);
            let started = nav.advance(Direction::Forward);
            if i < n - 1 {
                assert!(started);
                finish(&mut nav, &clock);
                assert_eq!(nav.index(), i + 1);
            } else {
                assert!(!started);
                assert!(!nav.is_busy());
                assert_eq!(nav.index(), i);
            }
        }
    }

    #[test]
    fn test_advance_backward_every_index() {
        let n = 5;
        for i in 0..n {
            let (mut nav, clock) = navigator(n, i);
            let started = nav.advance(Direction::Backward);
            if i > 0 {
                assert!(started);
                finish(&mut nav, &clock);
                assert_eq!(nav.index(), i - 1);
            } else {
                assert!(!started);
                assert_eq!(nav.index(), 0);
            }
        }
    }

    #[test]
    fn test_index_changes_at_end_of_exit_phase() {
        let (mut nav, clock) = navigator(3, 0);
        assert!(nav.advance(Direction::Forward));

        clock.advance(PHASE_DURATION / 2);
        assert_eq!(nav.poll(), None);
        assert_eq!(nav.index(), 0);

        clock.advance(PHASE_DURATION / 2);
        assert_eq!(nav.poll(), Some(NavEvent::Rendered { index: 1 }));
        assert_eq!(nav.index(), 1);
        assert_eq!(nav.store().get(POSITION_KEY).as_deref(), Some("1"));
        assert!(nav.is_busy());

        clock.advance(PHASE_DURATION);
        assert_eq!(nav.poll(), Some(NavEvent::Settled));
        assert!(!nav.is_busy());
    }

    #[test]
    fn test_navigation_rejected_while_busy() {
        let (mut nav, clock) = navigator(5, 2);
        let mut rng = StdRng::seed_from_u64(7);
        assert!(nav.advance(Direction::Forward));

        assert!(!nav.advance(Direction::Forward));
        assert!(!nav.advance(Direction::Backward));
        assert!(!nav.jump_random(&mut rng));

        // Still busy during the entry phase
        clock.advance(PHASE_DURATION);
        nav.poll();
        assert!(!nav.advance(Direction::Forward));

        clock.advance(PHASE_DURATION);
        nav.poll();
        assert!(nav.advance(Direction::Forward));
    }

    // -------------------------------------------------------------------------
    // Random
    // -------------------------------------------------------------------------

    #[test]
    fn test_jump_random_always_moves() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            for n in 2..6 {
                let start = (seed as usize) % n;
                let (mut nav, clock) = navigator(n, start);
                assert!(nav.jump_random(&mut rng));
                finish(&mut nav, &clock);
                assert_ne!(nav.index(), start);
                assert!(nav.index() < n);
            }
        }
    }

    #[test]
    fn test_jump_random_direction_matches_target() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            let (mut nav, _clock) = navigator(10, 5);
            nav.jump_random(&mut rng);
            match nav.transition() {
                Transition::PendingExit {
                    target, direction, ..
                } => {
                    let expected = if target > 5 {
                        Direction::Forward
                    } else {
                        Direction::Backward
                    };
                    assert_eq!(direction, expected);
                }
                other => panic!("expected exit phase, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_jump_random_needs_two_cards() {
        let mut rng = StdRng::seed_from_u64(3);
        let (mut one, _) = navigator(1, 0);
        assert!(!one.jump_random(&mut rng));
        let (mut none, _) = navigator(0, 0);
        assert!(!none.jump_random(&mut rng));
    }

    // -------------------------------------------------------------------------
    // Display state
    // -------------------------------------------------------------------------

    #[test]
    fn test_empty_deck() {
        let (mut nav, _) = navigator(0, 0);
        assert!(nav.is_empty());
        assert_eq!(nav.current_card(), None);
        assert_eq!(nav.progress_label(), "0 / 0");
        assert!(!nav.advance(Direction::Forward));
        assert!(!nav.advance(Direction::Backward));
        assert_eq!(nav.poll(), None);
    }

    #[test]
    fn test_restores_saved_position() {
        let (nav, _) = navigator(4, 3);
        assert_eq!(nav.index(), 3);
        assert_eq!(nav.progress_label(), "4 / 4");
        assert!(nav.can_go_back());
        assert!(!nav.can_go_forward());

        let (nav, _) = navigator(3, 3);
        assert_eq!(nav.index(), 0);
        assert!(!nav.can_go_back());
        assert!(nav.can_go_forward());
    }

    #[test]
    fn test_animation_progress() {
        let (mut nav, clock) = navigator(3, 0);
        assert_eq!(nav.animation(), None);
        nav.advance(Direction::Forward);
        clock.advance(PHASE_DURATION / 3);
        let (phase, direction, _) = nav.animation().unwrap();
        assert_eq!(phase, Phase::Exit);
        assert_eq!(direction, Direction::Forward);
    }
}
