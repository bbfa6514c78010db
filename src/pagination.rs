// src/pagination.rs
//! Flattens a [`GenerationBundle`] into displayable pages.

use serde::Serialize;

use crate::types::{
    AnalysisResult, ContentKind, GenerationBundle, LanguageCode, LanguageSlot, LocalizedPayload,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OutputPage {
    Analysis,
    Content {
        #[serde(rename = "contentType")]
        content_type: ContentKind,
    },
}

/// Pages and languages derived from one bundle. Recomputed, never stored
/// alongside the bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputLayout {
    pub available_languages: Vec<LanguageCode>,
    pub pages: Vec<OutputPage>,
}

impl OutputLayout {
    /// One analysis page when any language is present, then one page per
    /// content kind of the first available language, in its key order.
    pub fn derive(bundle: &GenerationBundle) -> Self {
        let present: Vec<(LanguageCode, &LocalizedPayload)> = bundle
            .slots()
            .filter_map(|(lang, slot)| match slot {
                LanguageSlot::Present(payload) => Some((lang, payload)),
                LanguageSlot::Absent => None,
            })
            .collect();

        let mut pages = Vec::new();
        if let Some((_, first)) = present.first() {
            pages.push(OutputPage::Analysis);
            pages.extend(
                first
                    .content
                    .kinds()
                    .map(|content_type| OutputPage::Content { content_type }),
            );
        }
        let available_languages = present.into_iter().map(|(lang, _)| lang).collect();

        Self {
            available_languages,
            pages,
        }
    }

    /// Nothing to display; not an error.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// The preferred language if available, else the first available one.
    pub fn resolve_language(&self, preferred: LanguageCode) -> Option<LanguageCode> {
        if self.available_languages.contains(&preferred) {
            Some(preferred)
        } else {
            self.available_languages.first().copied()
        }
    }

    pub fn clamp_index(&self, index: usize) -> usize {
        index.min(self.pages.len().saturating_sub(1))
    }
}

/// What one page shows for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "lowercase")]
pub enum PageView<'a> {
    Analysis {
        language: LanguageCode,
        analysis: &'a AnalysisResult,
    },
    Content {
        language: LanguageCode,
        #[serde(rename = "contentType")]
        content_type: ContentKind,
        text: &'a str,
    },
    /// The display language has nothing for this page.
    Unavailable {
        language: LanguageCode,
        page: OutputPage,
    },
}

/// Current page and display language over a fixed bundle.
///
/// Switching languages never moves the page index.
#[derive(Debug, Clone)]
pub struct OutputNavigator<'a> {
    bundle: &'a GenerationBundle,
    layout: OutputLayout,
    page_index: usize,
    selected_language: LanguageCode,
}

impl<'a> OutputNavigator<'a> {
    pub fn new(bundle: &'a GenerationBundle) -> Self {
        Self {
            bundle,
            layout: OutputLayout::derive(bundle),
            page_index: 0,
            selected_language: LanguageCode::DEFAULT,
        }
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_count(&self) -> usize {
        self.layout.pages.len()
    }

    /// 1-based "current of total" indicator.
    pub fn indicator(&self) -> (usize, usize) {
        (self.page_index + 1, self.page_count())
    }

    pub fn has_next(&self) -> bool {
        self.page_index + 1 < self.page_count()
    }

    pub fn has_previous(&self) -> bool {
        self.page_index > 0
    }

    pub fn next(&mut self) {
        self.go_to(self.page_index + 1);
    }

    pub fn back(&mut self) {
        self.go_to(self.page_index.saturating_sub(1));
    }

    pub fn go_to(&mut self, index: usize) {
        self.page_index = self.layout.clamp_index(index);
    }

    pub fn select_language(&mut self, language: LanguageCode) {
        self.selected_language = language;
    }

    /// The language actually displayed, after falling back.
    pub fn display_language(&self) -> Option<LanguageCode> {
        self.layout.resolve_language(self.selected_language)
    }

    /// `None` when there is nothing to display.
    pub fn current(&self) -> Option<PageView<'a>> {
        let page = *self.layout.pages.get(self.page_index)?;
        let language = self.display_language()?;

        let view = match (page, self.bundle.slot(language)) {
            (OutputPage::Analysis, LanguageSlot::Present(payload)) => PageView::Analysis {
                language,
                analysis: &payload.analysis,
            },
            (OutputPage::Content { content_type }, LanguageSlot::Present(payload)) => {
                match payload.content.get(content_type) {
                    Some(text) => PageView::Content {
                        language,
                        content_type,
                        text,
                    },
                    None => PageView::Unavailable { language, page },
                }
            }
            (page, LanguageSlot::Absent) => PageView::Unavailable { language, page },
        };
        Some(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContentBundle, LocalizedPayload};

    fn payload(kinds: &[ContentKind]) -> LocalizedPayload {
        LocalizedPayload {
            analysis: AnalysisResult {
                target_audience: "Collectors".to_string(),
                selling_points: vec!["Handmade".to_string()],
                sentiment: "Earthy".to_string(),
            },
            content: ContentBundle::from_entries(
                kinds.iter().map(|k| (*k, format!("{} text", k))).collect(),
            ),
        }
    }

    fn bundle(entries: Vec<(LanguageCode, LocalizedPayload)>) -> GenerationBundle {
        let requested = entries.iter().map(|(lang, _)| *lang).collect();
        GenerationBundle::new(requested, entries, None)
    }

    #[test]
    fn test_pages_follow_first_language() {
        let b = bundle(vec![
            (LanguageCode::En, payload(&[ContentKind::Social, ContentKind::Blog])),
            (LanguageCode::Hi, payload(&[ContentKind::Email])),
        ]);
        let layout = OutputLayout::derive(&b);

        assert_eq!(layout.available_languages, vec![LanguageCode::En, LanguageCode::Hi]);
        assert_eq!(
            layout.pages,
            vec![
                OutputPage::Analysis,
                OutputPage::Content { content_type: ContentKind::Social },
                OutputPage::Content { content_type: ContentKind::Blog },
            ]
        );
    }

    #[test]
    fn test_empty_bundle_has_no_pages() {
        let b = GenerationBundle::new(vec![LanguageCode::En], Vec::new(), None);
        let layout = OutputLayout::derive(&b);
        assert!(layout.is_empty());
        assert_eq!(layout.resolve_language(LanguageCode::En), None);
        assert_eq!(layout.clamp_index(3), 0);

        let nav = OutputNavigator::new(&b);
        assert!(nav.current().is_none());
    }

    #[test]
    fn test_language_switch_keeps_page_index_and_count() {
        let b = bundle(vec![
            (LanguageCode::En, payload(&[ContentKind::Social, ContentKind::Blog])),
            (LanguageCode::Hi, payload(&[ContentKind::Social])),
        ]);
        let mut nav = OutputNavigator::new(&b);
        nav.next();
        nav.next();
        assert_eq!(nav.page_index(), 2);

        nav.select_language(LanguageCode::Hi);
        assert_eq!(nav.page_index(), 2);
        assert_eq!(nav.page_count(), 3);
        // Hindi has no blog entry
        assert_eq!(
            nav.current(),
            Some(PageView::Unavailable {
                language: LanguageCode::Hi,
                page: OutputPage::Content { content_type: ContentKind::Blog },
            })
        );

        nav.back();
        assert_eq!(
            nav.current(),
            Some(PageView::Content {
                language: LanguageCode::Hi,
                content_type: ContentKind::Social,
                text: "social text",
            })
        );
    }

    #[test]
    fn test_unavailable_language_falls_back_to_first() {
        let b = bundle(vec![(LanguageCode::Ta, payload(&[ContentKind::Seo]))]);
        let mut nav = OutputNavigator::new(&b);
        nav.select_language(LanguageCode::Mr);

        assert_eq!(nav.display_language(), Some(LanguageCode::Ta));
        assert!(matches!(
            nav.current(),
            Some(PageView::Analysis { language: LanguageCode::Ta, .. })
        ));
    }

    #[test]
    fn test_navigation_is_clamped() {
        let b = bundle(vec![(LanguageCode::En, payload(&[ContentKind::Social]))]);
        let mut nav = OutputNavigator::new(&b);

        nav.back();
        assert_eq!(nav.page_index(), 0);
        assert!(!nav.has_previous());
        nav.next();
        nav.next();
        assert_eq!(nav.page_index(), 1);
        assert!(!nav.has_next());
        assert_eq!(nav.indicator(), (2, 2));
    }

    #[test]
    fn test_page_serialization() {
        let page = OutputPage::Content { content_type: ContentKind::Seo };
        assert_eq!(
            serde_json::to_value(page).unwrap(),
            serde_json::json!({ "kind": "content", "contentType": "seo" })
        );
        assert_eq!(
            serde_json::to_value(OutputPage::Analysis).unwrap(),
            serde_json::json!({ "kind": "analysis" })
        );
    }
}
