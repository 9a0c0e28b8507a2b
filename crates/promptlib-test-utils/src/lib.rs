//! Test helpers shared across prompt library crates.

pub mod fixtures;
pub mod resolver;
pub mod store;

pub use fixtures::{export_document, legacy_record_json, sample_record, sample_record_at};
pub use resolver::ScriptedResolver;
pub use store::FailingStore;
