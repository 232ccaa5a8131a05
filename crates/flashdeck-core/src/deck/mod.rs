//! Card deck navigation.
//!
//! This module provides the foreground half of flashdeck:
//! - `Navigator`: the current index into the card list and the transition
//!   state machine that serialises slide animations
//! - `Clock`: the timer seam that drives transitions
//! - `swipe`: horizontal drag classification
//! - `position`: durable storage of the current index

pub mod clock;
pub mod navigator;
pub mod position;
pub mod swipe;
pub mod transition;

pub use clock::{Clock, ManualClock, SystemClock};
pub use navigator::{NavEvent, Navigator};
pub use position::{
    restore_position, save_position, FilePositionStore, MemoryPositionStore, PositionStore,
    POSITION_KEY,
};
pub use swipe::{classify_swipe, SwipeTracker, SWIPE_THRESHOLD};
pub use transition::{Direction, Phase, Transition, PHASE_DURATION};
