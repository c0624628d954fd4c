//! Port contracts for translation persistence.

mod repository;

pub use repository::{
    TranslationRepository, TranslationRepositoryError, TranslationRepositoryResult,
};
