//! Stored translations per key and language.

use super::TranslateKeyId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// One translated text for a key in one target language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    key: TranslateKeyId,
    language: String,
    text: String,
    created_at: DateTime<Utc>,
}

impl Translation {
    /// Creates a translation for a key.
    pub fn new(
        key: TranslateKeyId,
        language: impl Into<String>,
        text: impl Into<String>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            key,
            language: language.into(),
            text: text.into(),
            created_at: clock.utc(),
        }
    }

    /// Returns the translated key.
    #[must_use]
    pub const fn key(&self) -> TranslateKeyId {
        self.key
    }

    /// Returns the target language code.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Returns the translated text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the storing instant.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
