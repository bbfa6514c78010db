// types.rs - Data model shared by request building, parsing and pagination
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::RequestError;

/// A marketing artifact the user can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Social,
    Description,
    Email,
    Blog,
    Seo,
    Video,
}

impl ContentKind {
    pub const ALL: [ContentKind; 6] = [
        ContentKind::Social,
        ContentKind::Description,
        ContentKind::Email,
        ContentKind::Blog,
        ContentKind::Seo,
        ContentKind::Video,
    ];

    /// Key used for this kind in the structured reply.
    pub fn key(self) -> &'static str {
        match self {
            ContentKind::Social => "social",
            ContentKind::Description => "description",
            ContentKind::Email => "email",
            ContentKind::Blog => "blog",
            ContentKind::Seo => "seo",
            ContentKind::Video => "video",
        }
    }

    /// English label used when instructing the model. Never shown to users.
    pub fn prompt_label(self) -> &'static str {
        match self {
            ContentKind::Social => "Social Media Post (e.g., Instagram, Facebook)",
            ContentKind::Description => "Product Description (for e-commerce sites)",
            ContentKind::Email => "Email Newsletter Announcement",
            ContentKind::Blog => "Short Blog Post",
            ContentKind::Seo => "SEO Keywords & Meta Description",
            ContentKind::Video => "Short Video Ad (e.g., Instagram Reels, YouTube Shorts)",
        }
    }

    pub fn is_video(self) -> bool {
        matches!(self, ContentKind::Video)
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ContentKind {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ContentKind::ALL
            .into_iter()
            .find(|kind| kind.key() == wanted)
            .ok_or_else(|| RequestError::UnknownContentKind(s.to_string()))
    }
}

/// One of the six supported output languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    En,
    Hi,
    Bn,
    Ta,
    Te,
    Mr,
}

impl LanguageCode {
    pub const ALL: [LanguageCode; 6] = [
        LanguageCode::En,
        LanguageCode::Hi,
        LanguageCode::Bn,
        LanguageCode::Ta,
        LanguageCode::Te,
        LanguageCode::Mr,
    ];

    /// Used whenever the user selects no language at all.
    pub const DEFAULT: LanguageCode = LanguageCode::En;

    pub fn code(self) -> &'static str {
        match self {
            LanguageCode::En => "en",
            LanguageCode::Hi => "hi",
            LanguageCode::Bn => "bn",
            LanguageCode::Ta => "ta",
            LanguageCode::Te => "te",
            LanguageCode::Mr => "mr",
        }
    }

    pub fn prompt_label(self) -> &'static str {
        match self {
            LanguageCode::En => "English",
            LanguageCode::Hi => "Hindi",
            LanguageCode::Bn => "Bengali",
            LanguageCode::Ta => "Tamil",
            LanguageCode::Te => "Telugu",
            LanguageCode::Mr => "Marathi",
        }
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for LanguageCode {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        LanguageCode::ALL
            .into_iter()
            .find(|lang| lang.code() == wanted)
            .ok_or_else(|| RequestError::UnknownLanguage(s.to_string()))
    }
}

/// Deduplicates the selection (first occurrence wins) and falls back to
/// the default language when nothing was selected.
pub fn resolve_languages(selected: &[LanguageCode]) -> Vec<LanguageCode> {
    let mut resolved: Vec<LanguageCode> = Vec::with_capacity(selected.len());
    for lang in selected {
        if !resolved.contains(lang) {
            resolved.push(*lang);
        }
    }
    if resolved.is_empty() {
        resolved.push(LanguageCode::DEFAULT);
    }
    resolved
}

/// The user's content selection with the video kind split off, since video
/// is produced by a separate job and never by the per-language loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentSelection {
    text_kinds: Vec<ContentKind>,
    wants_video: bool,
}

impl ContentSelection {
    pub fn new(kinds: &[ContentKind]) -> Self {
        let mut selection = Self::default();
        for kind in kinds {
            if kind.is_video() {
                selection.wants_video = true;
            } else if !selection.text_kinds.contains(kind) {
                selection.text_kinds.push(*kind);
            }
        }
        selection
    }

    /// Requested non-video kinds, in selection order.
    pub fn text_kinds(&self) -> &[ContentKind] {
        &self.text_kinds
    }

    pub fn wants_video(&self) -> bool {
        self.wants_video
    }

    pub fn is_empty(&self) -> bool {
        self.text_kinds.is_empty() && !self.wants_video
    }
}

/// Image bytes with their declared media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageInput {
    /// Uses the declared media type when it names an image, otherwise
    /// sniffs the file signature.
    pub fn new(bytes: Vec<u8>, declared_mime: Option<&str>) -> Self {
        let mime_type = match declared_mime {
            Some(mime) if mime.starts_with("image/") => mime.to_string(),
            _ => sniff_image_mime(&bytes).to_string(),
        };
        Self { bytes, mime_type }
    }
}

fn sniff_image_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        "image/png"
    } else if bytes.starts_with(&[0x47, 0x49, 0x46]) {
        "image/gif"
    } else if bytes.starts_with(&[0x52, 0x49, 0x46, 0x46]) {
        "image/webp"
    } else {
        "image/png"
    }
}

/// Per-language strategic summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub target_audience: String,
    pub selling_points: Vec<String>,
    pub sentiment: String,
}

/// Generated text per requested non-video kind. Kinds that were not
/// generated are absent, never empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentBundle {
    entries: Vec<(ContentKind, String)>,
}

impl ContentBundle {
    pub(crate) fn from_entries(entries: Vec<(ContentKind, String)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, kind: ContentKind) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, text)| text.as_str())
    }

    /// Kinds present, in key order.
    pub fn kinds(&self) -> impl Iterator<Item = ContentKind> + '_ {
        self.entries.iter().map(|(kind, _)| *kind)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ContentBundle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (kind, text) in &self.entries {
            map.serialize_entry(kind.key(), text)?;
        }
        map.end()
    }
}

/// Analysis plus generated content for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalizedPayload {
    pub analysis: AnalysisResult,
    pub content: ContentBundle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSuggestion {
    pub caption: String,
    pub audio_suggestion: String,
}

/// Whether the model returned data for a requested language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageSlot<'a> {
    Present(&'a LocalizedPayload),
    Absent,
}

/// Result of one generation request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationBundle {
    requested: Vec<LanguageCode>,
    localized: Vec<(LanguageCode, LocalizedPayload)>,
    video_suggestions: Option<VideoSuggestion>,
}

impl GenerationBundle {
    pub(crate) fn new(
        requested: Vec<LanguageCode>,
        localized: Vec<(LanguageCode, LocalizedPayload)>,
        video_suggestions: Option<VideoSuggestion>,
    ) -> Self {
        Self {
            requested,
            localized,
            video_suggestions,
        }
    }

    pub fn slot(&self, lang: LanguageCode) -> LanguageSlot<'_> {
        match self.payload(lang) {
            Some(payload) => LanguageSlot::Present(payload),
            None => LanguageSlot::Absent,
        }
    }

    /// Every requested language with its slot, in request order.
    pub fn slots(&self) -> impl Iterator<Item = (LanguageCode, LanguageSlot<'_>)> + '_ {
        self.requested.iter().map(move |lang| (*lang, self.slot(*lang)))
    }

    pub fn payload(&self, lang: LanguageCode) -> Option<&LocalizedPayload> {
        self.localized
            .iter()
            .find(|(l, _)| *l == lang)
            .map(|(_, payload)| payload)
    }

    /// Languages with a payload, in map order.
    pub fn languages(&self) -> impl Iterator<Item = LanguageCode> + '_ {
        self.localized.iter().map(|(lang, _)| *lang)
    }

    pub fn is_empty(&self) -> bool {
        self.localized.is_empty()
    }

    pub fn video_suggestions(&self) -> Option<&VideoSuggestion> {
        self.video_suggestions.as_ref()
    }
}

struct LocalizedMap<'a>(&'a [(LanguageCode, LocalizedPayload)]);

impl Serialize for LocalizedMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (lang, payload) in self.0 {
            map.serialize_entry(lang.code(), payload)?;
        }
        map.end()
    }
}

impl Serialize for GenerationBundle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("GenerationBundle", 2)?;
        state.serialize_field("localizedData", &LocalizedMap(&self.localized))?;
        state.serialize_field("videoSuggestions", &self.video_suggestions)?;
        state.end()
    }
}
