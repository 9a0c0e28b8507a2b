//! Record validation shared by edits, exports and imports.

use crate::error::ValidationError;
use crate::estimator::utf16_len;
use promptlib_protocol::{MODEL_MAX_LEN, Metadata, Note, PromptRecord, RATING_MAX, TITLE_MAX_LEN};
use serde_json::Value;

/// Check every invariant of a persisted record, failing on the first one
/// violated.
pub fn validate_record(record: &PromptRecord) -> Result<(), ValidationError> {
    validate_fields(record)?;
    let metadata = record
        .metadata
        .as_ref()
        .ok_or(ValidationError::MissingMetadata)?;
    validate_metadata(metadata)
}

/// Everything except the metadata block; legacy records are held to this.
pub(crate) fn validate_fields(record: &PromptRecord) -> Result<(), ValidationError> {
    if record.id.trim().is_empty() {
        return Err(ValidationError::Empty { field: "id" });
    }
    require_text(&record.title, "title", Some(TITLE_MAX_LEN))?;
    require_text(&record.content, "content", None)?;
    if record.rating > RATING_MAX {
        return Err(ValidationError::RatingOutOfRange(record.rating));
    }
    for (index, note) in record.notes.iter().enumerate() {
        validate_note(note).map_err(|source| ValidationError::Note {
            index,
            source: Box::new(source),
        })?;
    }
    Ok(())
}

pub fn validate_note(note: &Note) -> Result<(), ValidationError> {
    if note.id.trim().is_empty() {
        return Err(ValidationError::Empty { field: "note id" });
    }
    require_text(&note.content, "note content", None)?;
    if note.updated_at < note.created_at {
        return Err(ValidationError::TimestampOrder);
    }
    Ok(())
}

pub fn validate_metadata(metadata: &Metadata) -> Result<(), ValidationError> {
    require_text(&metadata.model, "model", Some(MODEL_MAX_LEN))?;
    let estimate = metadata.token_estimate;
    if estimate.min > estimate.max {
        return Err(ValidationError::TokenRange {
            min: estimate.min,
            max: estimate.max,
        });
    }
    if metadata.updated_at < metadata.created_at {
        return Err(ValidationError::TimestampOrder);
    }
    Ok(())
}

/// Trim `value` and check it is non-empty and within `max` UTF-16 units.
pub fn require_text(
    value: &str,
    field: &'static str,
    max: Option<usize>,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if let Some(max) = max {
        if utf16_len(trimmed) > max {
            return Err(ValidationError::TooLong { field, max });
        }
    }
    Ok(trimmed.to_string())
}

/// Decode raw JSON into a typed record, then validate it.
pub(crate) fn decode_record(value: Value) -> Result<PromptRecord, ValidationError> {
    let record: PromptRecord = serde_json::from_value(value)
        .map_err(|err| ValidationError::Malformed(err.to_string()))?;
    validate_record(&record)?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::create_metadata_at;
    use pretty_assertions::assert_eq;
    use promptlib_protocol::timestamp;
    use serde_json::json;

    fn valid_record() -> PromptRecord {
        let now = timestamp::parse_iso("2024-05-01T10:00:00.000Z").expect("ts");
        PromptRecord {
            id: "p1".to_string(),
            title: "Title".to_string(),
            content: "Content".to_string(),
            rating: 3,
            notes: vec![Note {
                id: "n1".to_string(),
                content: "note".to_string(),
                created_at: now,
                updated_at: now,
            }],
            metadata: Some(create_metadata_at("gpt-4", "Content", None, now).expect("metadata")),
        }
    }

    #[test]
    fn accepts_valid_record() {
        assert_eq!(validate_record(&valid_record()), Ok(()));
    }

    #[test]
    fn reports_first_violation_in_order() {
        let mut record = valid_record();
        record.title = String::new();
        record.content = " ".to_string();
        assert_eq!(
            validate_record(&record),
            Err(ValidationError::Empty { field: "title" })
        );

        record.title = "ok".to_string();
        assert_eq!(
            validate_record(&record),
            Err(ValidationError::Empty { field: "content" })
        );
    }

    #[test]
    fn title_limit_counts_utf16_units() {
        let mut record = valid_record();
        record.title = "t".repeat(120);
        assert_eq!(validate_record(&record), Ok(()));
        // 61 emoji are 122 code units
        record.title = "🙂".repeat(61);
        assert_eq!(
            validate_record(&record),
            Err(ValidationError::TooLong {
                field: "title",
                max: TITLE_MAX_LEN
            })
        );
    }

    #[test]
    fn rejects_rating_above_max() {
        let mut record = valid_record();
        record.rating = 6;
        assert_eq!(
            validate_record(&record),
            Err(ValidationError::RatingOutOfRange(6))
        );
    }

    #[test]
    fn note_errors_carry_index() {
        let mut record = valid_record();
        record.notes[0].content = "  ".to_string();
        assert_eq!(
            validate_record(&record),
            Err(ValidationError::Note {
                index: 0,
                source: Box::new(ValidationError::Empty {
                    field: "note content"
                })
            })
        );
    }

    #[test]
    fn metadata_invariants() {
        let mut record = valid_record();
        record.metadata = None;
        assert_eq!(
            validate_record(&record),
            Err(ValidationError::MissingMetadata)
        );
        assert_eq!(validate_fields(&record), Ok(()));

        let mut record = valid_record();
        if let Some(metadata) = record.metadata.as_mut() {
            metadata.token_estimate.min = 10;
            metadata.token_estimate.max = 2;
        }
        assert_eq!(
            validate_record(&record),
            Err(ValidationError::TokenRange { min: 10, max: 2 })
        );

        let mut record = valid_record();
        if let Some(metadata) = record.metadata.as_mut() {
            metadata.updated_at = metadata.created_at - chrono::Duration::seconds(1);
        }
        assert_eq!(
            validate_record(&record),
            Err(ValidationError::TimestampOrder)
        );
    }

    #[test]
    fn decode_reports_structural_problems() {
        let err = decode_record(json!({
            "id": "x",
            "title": "T",
            "content": "C",
            "rating": -1,
            "notes": []
        }))
        .unwrap_err();
        assert!(matches!(err, ValidationError::Malformed(_)));

        let err = decode_record(json!({
            "id": "x",
            "title": "T",
            "content": "C",
            "metadata": {
                "model": "gpt-4",
                "createdAt": "not a date",
                "updatedAt": "2024-05-01T10:00:00.000Z",
                "tokenEstimate": { "min": 1, "max": 2, "confidence": "high" }
            }
        }))
        .unwrap_err();
        assert!(matches!(err, ValidationError::Malformed(_)));
    }
}
