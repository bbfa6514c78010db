// src/schema.rs
//! Response schema construction.
//!
//! [`ResponseShape`] captures what a generation call asks for using the
//! closed `ContentKind` / `LanguageCode` sets, and renders it into the
//! OpenAPI-subset schema the Gemini API accepts as `responseSchema`. The
//! prompt builder reads the same shape, so the instruction text and the
//! schema cannot drift apart.

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

use crate::types::{resolve_languages, ContentKind, ContentSelection, LanguageCode};

/// Key of the per-language map in the structured reply.
pub const LOCALIZED_DATA_KEY: &str = "localizedData";
/// Key of the English-only video block in the structured reply.
pub const VIDEO_SUGGESTIONS_KEY: &str = "videoSuggestions";

/// A node of the response schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    String {
        description: Option<String>,
    },
    Array {
        items: Box<Schema>,
        description: Option<String>,
    },
    Object {
        fields: Vec<Field>,
        description: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub schema: Schema,
    pub required: bool,
}

impl Field {
    fn required(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            required: true,
        }
    }
}

impl Schema {
    fn string(description: impl Into<String>) -> Self {
        Schema::String {
            description: Some(description.into()),
        }
    }

    /// Looks up a direct child of an object node.
    pub fn field(&self, name: &str) -> Option<&Schema> {
        match self {
            Schema::Object { fields, .. } => fields
                .iter()
                .find(|field| field.name == name)
                .map(|field| &field.schema),
            _ => None,
        }
    }

    /// Names of the required children of an object node, in order.
    pub fn required_keys(&self) -> Vec<&str> {
        match self {
            Schema::Object { fields, .. } => fields
                .iter()
                .filter(|field| field.required)
                .map(|field| field.name.as_str())
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Schema::String { description } => {
                let mut state = serializer.serialize_struct("Schema", 2)?;
                state.serialize_field("type", "STRING")?;
                if let Some(description) = description {
                    state.serialize_field("description", description)?;
                }
                state.end()
            }
            Schema::Array { items, description } => {
                let mut state = serializer.serialize_struct("Schema", 3)?;
                state.serialize_field("type", "ARRAY")?;
                state.serialize_field("items", items)?;
                if let Some(description) = description {
                    state.serialize_field("description", description)?;
                }
                state.end()
            }
            Schema::Object { fields, description } => {
                let mut state = serializer.serialize_struct("Schema", 5)?;
                state.serialize_field("type", "OBJECT")?;
                state.serialize_field("properties", &Properties(fields))?;
                state.serialize_field("required", &self.required_keys())?;
                let ordering: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
                state.serialize_field("propertyOrdering", &ordering)?;
                if let Some(description) = description {
                    state.serialize_field("description", description)?;
                }
                state.end()
            }
        }
    }
}

struct Properties<'a>(&'a [Field]);

impl Serialize for Properties<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for field in self.0 {
            map.serialize_entry(&field.name, &field.schema)?;
        }
        map.end()
    }
}

/// What one generation request asks the model for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseShape {
    languages: Vec<LanguageCode>,
    content_kinds: Vec<ContentKind>,
    video_suggestions: bool,
}

impl ResponseShape {
    pub fn new(selection: &ContentSelection, languages: &[LanguageCode]) -> Self {
        Self {
            languages: resolve_languages(languages),
            content_kinds: selection.text_kinds().to_vec(),
            video_suggestions: selection.wants_video(),
        }
    }

    /// Languages the reply must contain, deduplicated, never empty.
    pub fn languages(&self) -> &[LanguageCode] {
        &self.languages
    }

    /// Non-video kinds every language's `content` object must contain.
    pub fn content_kinds(&self) -> &[ContentKind] {
        &self.content_kinds
    }

    pub fn has_content(&self) -> bool {
        !self.content_kinds.is_empty()
    }

    pub fn wants_video_suggestions(&self) -> bool {
        self.video_suggestions
    }

    pub fn to_schema(&self) -> Schema {
        let payload = self.localized_payload_schema();

        let mut fields = vec![Field::required(
            LOCALIZED_DATA_KEY,
            Schema::Object {
                fields: self
                    .languages
                    .iter()
                    .map(|lang| Field::required(lang.code(), payload.clone()))
                    .collect(),
                description: Some(
                    "Localized analysis and content, keyed by language code.".to_string(),
                ),
            },
        )];

        if self.video_suggestions {
            fields.push(Field::required(
                VIDEO_SUGGESTIONS_KEY,
                Schema::Object {
                    fields: vec![
                        Field::required(
                            "caption",
                            Schema::string("A short, catchy caption for the video, with hashtags."),
                        ),
                        Field::required(
                            "audioSuggestion",
                            Schema::string("A suggestion for background music or audio style."),
                        ),
                    ],
                    description: Some(
                        "English-only suggestions for the short video ad.".to_string(),
                    ),
                },
            ));
        }

        Schema::Object {
            fields,
            description: None,
        }
    }

    fn localized_payload_schema(&self) -> Schema {
        let analysis = Schema::Object {
            fields: vec![
                Field::required(
                    "targetAudience",
                    Schema::string("The ideal customer for this product."),
                ),
                Field::required(
                    "sellingPoints",
                    Schema::Array {
                        items: Box::new(Schema::String { description: None }),
                        description: Some("List of unique selling points.".to_string()),
                    },
                ),
                Field::required("sentiment", Schema::string("The sentiment the product evokes.")),
            ],
            description: None,
        };

        let mut fields = vec![Field::required("analysis", analysis)];
        if self.has_content() {
            fields.push(Field::required(
                "content",
                Schema::Object {
                    fields: self
                        .content_kinds
                        .iter()
                        .map(|kind| {
                            Field::required(
                                kind.key(),
                                Schema::string(format!(
                                    "The generated content for: {}",
                                    kind.prompt_label()
                                )),
                            )
                        })
                        .collect(),
                    description: None,
                },
            ));
        }

        Schema::Object {
            fields,
            description: None,
        }
    }
}
