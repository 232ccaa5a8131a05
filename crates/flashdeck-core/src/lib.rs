//! Core library for flashdeck.
//!
//! Flashdeck is a flashcard viewer that keeps working without a network
//! connection. This crate holds everything that is not terminal rendering:
//!
//! - `models`: the `Card` type parsed from `cards.json`
//! - `deck`: the navigation controller, its transition state machine,
//!   swipe detection and durable position storage
//! - `worker`: the versioned offline asset cache (install, activate and
//!   cache-first fetch interception) and the registration that routes a
//!   client's fetches through it
//! - `loader`: fetching the card list through the registration
//! - `config`: on-disk configuration and directory layout

pub mod config;
pub mod deck;
pub mod loader;
pub mod models;
pub mod worker;

pub use config::Config;
pub use reqwest::Url;
pub use deck::{Direction, Navigator};
pub use loader::{load_cards, LoadError};
pub use models::Card;
pub use worker::{CacheStorage, CacheWorker, HttpNetwork, Registration};
