//! Domain model for pipeline rules.

mod copy_field;
mod dynamic_json;
mod integration;
mod linker;
mod quiz;

pub use copy_field::{CopyField, SourceScope};
pub use dynamic_json::DynamicJson;
pub use integration::Integration;
pub use linker::CampaignLinker;
pub use quiz::{Quiz, QuizOutcome, ShowAnswer};
