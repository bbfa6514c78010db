// src/generation.rs
//! Sends one structured generation request and turns the reply into a
//! [`GenerationBundle`].

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::capability::{InstructionPart, StructuredGenerator};
use crate::error::GenerationError;
use crate::schema::{ResponseShape, LOCALIZED_DATA_KEY, VIDEO_SUGGESTIONS_KEY};
use crate::types::{
    AnalysisResult, ContentBundle, GenerationBundle, ImageInput, LocalizedPayload, VideoSuggestion,
};

/// Calls the generator with the instruction (plus the image, if any) and
/// parses the structured reply against `shape`.
pub async fn request_bundle(
    generator: &dyn StructuredGenerator,
    instruction: &str,
    shape: &ResponseShape,
    image: Option<&ImageInput>,
) -> Result<GenerationBundle, GenerationError> {
    let mut parts = vec![InstructionPart::Text(instruction.to_string())];
    if let Some(image) = image {
        parts.push(InstructionPart::Image(image.clone()));
    }

    let schema = shape.to_schema();
    let text = generator
        .generate_structured(&parts, &schema)
        .await?
        .ok_or(GenerationError::EmptyResponse)?;

    tracing::debug!(bytes = text.len(), "Structured reply received");
    parse_bundle(&text, shape)
}

/// Parses a structured reply. Languages and kinds outside `shape` are
/// dropped; requested languages the model skipped become absent slots.
pub fn parse_bundle(
    text: &str,
    shape: &ResponseShape,
) -> Result<GenerationBundle, GenerationError> {
    let mut payload: Value = serde_json::from_str(text.trim())
        .map_err(|e| GenerationError::MalformedResponse(format!("invalid JSON: {}", e)))?;
    if !payload.is_object() {
        return Err(GenerationError::MalformedResponse(
            "top-level value is not an object".to_string(),
        ));
    }
    normalize_payload(&mut payload);

    let localized_data = payload
        .get(LOCALIZED_DATA_KEY)
        .and_then(Value::as_object)
        .ok_or_else(|| {
            GenerationError::MalformedResponse(format!("`{}` is not an object", LOCALIZED_DATA_KEY))
        })?;

    for key in localized_data.keys() {
        if !shape.languages().iter().any(|lang| lang.code() == key) {
            tracing::warn!("Ignoring unrequested language '{}' in reply", key);
        }
    }

    let mut localized = Vec::new();
    for lang in shape.languages() {
        match localized_data.get(lang.code()) {
            None | Some(Value::Null) => {
                tracing::warn!("Reply has no payload for requested language '{}'", lang);
            }
            Some(Value::Object(fields)) if fields.get("analysis").map_or(true, Value::is_null) => {
                tracing::warn!("Reply has no analysis for requested language '{}'", lang);
            }
            Some(entry) => {
                let payload = parse_localized_payload(entry, shape).map_err(|reason| {
                    GenerationError::MalformedResponse(format!(
                        "{}.{}: {}",
                        LOCALIZED_DATA_KEY, lang, reason
                    ))
                })?;
                localized.push((*lang, payload));
            }
        }
    }

    let video_suggestions = if shape.wants_video_suggestions() {
        match payload.get(VIDEO_SUGGESTIONS_KEY) {
            None | Some(Value::Null) => {
                tracing::warn!("Reply has no video suggestions although a video was requested");
                None
            }
            Some(value) => Some(VideoSuggestion::deserialize(value).map_err(|e| {
                GenerationError::MalformedResponse(format!("{}: {}", VIDEO_SUGGESTIONS_KEY, e))
            })?),
        }
    } else {
        None
    };

    Ok(GenerationBundle::new(
        shape.languages().to_vec(),
        localized,
        video_suggestions,
    ))
}

/// Fills in the containers the model may leave out: a missing language map
/// becomes `{}`, a language entry without `content` gets `content: {}`.
/// Applying it twice is the same as applying it once.
pub fn normalize_payload(payload: &mut Value) {
    let Some(root) = payload.as_object_mut() else {
        return;
    };

    let data = root
        .entry(LOCALIZED_DATA_KEY)
        .or_insert_with(|| Value::Object(Map::new()));
    if data.is_null() {
        *data = Value::Object(Map::new());
    }

    if let Some(languages) = data.as_object_mut() {
        for entry in languages.values_mut() {
            if let Some(entry) = entry.as_object_mut() {
                let content = entry
                    .entry("content")
                    .or_insert_with(|| Value::Object(Map::new()));
                if content.is_null() {
                    *content = Value::Object(Map::new());
                }
            }
        }
    }
}

fn parse_localized_payload(
    entry: &Value,
    shape: &ResponseShape,
) -> Result<LocalizedPayload, String> {
    let entry = entry.as_object().ok_or("entry is not an object")?;

    let analysis = entry.get("analysis").ok_or("missing `analysis`")?;
    let mut analysis =
        AnalysisResult::deserialize(analysis).map_err(|e| format!("analysis: {}", e))?;
    analysis.selling_points.retain(|point| !point.trim().is_empty());

    let content = entry
        .get("content")
        .and_then(Value::as_object)
        .ok_or("`content` is not an object")?;

    let mut entries = Vec::with_capacity(shape.content_kinds().len());
    for kind in shape.content_kinds() {
        match content.get(kind.key()) {
            Some(Value::String(text)) if !text.trim().is_empty() => {
                entries.push((*kind, text.clone()));
            }
            Some(Value::String(_)) | Some(Value::Null) | None => {
                tracing::warn!("Reply is missing content for '{}'", kind);
            }
            Some(_) => return Err(format!("content.{} is not a string", kind)),
        }
    }

    Ok(LocalizedPayload {
        analysis,
        content: ContentBundle::from_entries(entries),
    })
}
