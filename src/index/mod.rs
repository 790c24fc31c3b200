//! The in-memory text index. Identity and deduplication live here; filtering
//! beyond simple field lookups is done by the query engine.

pub mod text_index;

pub use text_index::{AddOptions, IndexValidation, ItemUpdate, TextIndex};
