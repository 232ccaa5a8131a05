//! Data models for flashdeck.
//!
//! - `Card`: a single unit of text content with a stable identifier

pub mod card;

pub use card::{parse_cards, Card, EMPTY_CARD_TEXT};
