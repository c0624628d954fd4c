//! Translation orchestration services.

mod translator;

pub use translator::{TranslationService, TranslationServiceError, TranslationServiceResult};
