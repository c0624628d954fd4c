//! Domain model for translation keys and adapters.

mod adapter;
mod key;
mod translation;

pub use adapter::TranslationAdapter;
pub use key::{TranslateKey, TranslateKeyId, content_hash};
pub use translation::Translation;
