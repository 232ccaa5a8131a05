use serde::{Deserialize, Deserializer, Serialize};

/// Shown in place of a card whose text is missing or blank.
pub const EMPTY_CARD_TEXT: &str = "Empty card";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct Card {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
}

/// `"text": null` is treated like a missing text
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Card {
    pub fn new(id: i64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }

    /// Text to render, falling back to a placeholder for empty cards
    pub fn display_text(&self) -> &str {
        if self.text.trim().is_empty() {
            EMPTY_CARD_TEXT
        } else {
            &self.text
        }
    }
}

/// Parse the body of `cards.json` (a JSON array of `{id, text}` objects)
pub fn parse_cards(body: &[u8]) -> Result<Vec<Card>, serde_json::Error> {
    serde_json::from_slice(body)
}
