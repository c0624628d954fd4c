//! Translation fan-out configuration attached to a task stage.

use crate::graph::domain::StageId;
use serde::{Deserialize, Serialize};

/// Fans schema titles out to translator tasks per target language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationAdapter {
    /// Stage the translator tasks are created at.
    pub translator_stage: StageId,
    /// Language the schema titles are written in.
    pub source_language: String,
    /// Languages translator tasks are created for.
    pub target_languages: Vec<String>,
}

impl TranslationAdapter {
    /// Creates an adapter for a set of target languages.
    pub fn new<I, S>(
        translator_stage: StageId,
        source_language: impl Into<String>,
        target_languages: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            translator_stage,
            source_language: source_language.into(),
            target_languages: target_languages.into_iter().map(Into::into).collect(),
        }
    }
}
