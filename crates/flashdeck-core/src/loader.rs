//! Loading the card list from `cards.json`.
//!
//! The request goes through the registration like any other page fetch, so
//! a controlled client gets the cached copy when offline.

use thiserror::Error;
use tracing::{debug, error};

use crate::models::{parse_cards, Card};
use crate::worker::{ClientId, Network, Registration, RegistrationError, Request};

/// Relative path of the card data file
pub const CARDS_PATH: &str = "cards.json";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to fetch cards: {0}")]
    Network(#[from] RegistrationError),

    #[error("HTTP error! status: {0}")]
    Status(u16),

    #[error("Malformed card data: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Fetch and parse the card list. An empty list is not an error.
pub async fn load_cards<N: Network>(
    registration: &Registration<N>,
    client: ClientId,
) -> Result<Vec<Card>, LoadError> {
    let result = fetch_cards(registration, client).await;
    match &result {
        Ok(cards) => debug!(count = cards.len(), "Cards loaded"),
        Err(e) => error!(error = %e, "Failed to load cards"),
    }
    result
}

async fn fetch_cards<N: Network>(
    registration: &Registration<N>,
    client: ClientId,
) -> Result<Vec<Card>, LoadError> {
    let response = registration.fetch(client, Request::get(CARDS_PATH)).await?;
    if !response.is_ok() {
        return Err(LoadError::Status(response.status));
    }
    Ok(parse_cards(&response.body)?)
}
