//! In-memory translation persistence.

mod translation;

pub use translation::InMemoryTranslationRepository;
