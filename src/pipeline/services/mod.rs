//! Repository-backed application of pipeline rules.

mod copy;
mod schema;

pub use copy::{FieldCopier, FieldCopyError, FieldCopyResult};
pub use schema::{SchemaProjector, SchemaProjectionError, SchemaProjectionResult};
