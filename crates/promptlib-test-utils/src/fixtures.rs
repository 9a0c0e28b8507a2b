use chrono::{DateTime, Utc};
use promptlib_core::metadata::create_metadata_at;
use promptlib_protocol::{EXPORT_VERSION, Note, PromptRecord, timestamp};
use serde_json::{Value, json};

/// Valid record created now.
pub fn sample_record(id: &str, title: &str, model: &str) -> PromptRecord {
    sample_record_at(id, title, model, timestamp::now())
}

/// Valid record with a fixed creation time and one note.
pub fn sample_record_at(
    id: &str,
    title: &str,
    model: &str,
    created_at: DateTime<Utc>,
) -> PromptRecord {
    let content = format!("Write a haiku about {title}");
    let metadata = match create_metadata_at(model, &content, Some(false), created_at) {
        Ok(metadata) => metadata,
        Err(err) => panic!("fixture metadata for {id} is invalid: {err}"),
    };
    PromptRecord {
        id: id.to_string(),
        title: title.to_string(),
        content,
        rating: 3,
        notes: vec![Note {
            id: format!("{id}-note"),
            content: "works well".to_string(),
            created_at,
            updated_at: created_at,
        }],
        metadata: Some(metadata),
    }
}

/// A record as stored before metadata tracking: epoch-ms note times, no
/// metadata block.
pub fn legacy_record_json(id: &str) -> Value {
    json!({
        "id": id,
        "title": format!("legacy {id}"),
        "content": "An old prompt without metadata",
        "rating": 2,
        "notes": [
            { "id": format!("{id}-n"), "content": "old note", "createdAt": 1_700_000_000_000i64, "updatedAt": 1_700_000_000_000i64 }
        ]
    })
}

/// Export document wrapping `prompts`, serialized as JSON text.
pub fn export_document(prompts: &[PromptRecord]) -> String {
    json!({
        "version": EXPORT_VERSION,
        "exportTimestamp": timestamp::to_iso(&timestamp::now()),
        "stats": { "totalPrompts": prompts.len(), "averageRating": 0, "mostUsedModel": "Unknown" },
        "prompts": prompts,
    })
    .to_string()
}
