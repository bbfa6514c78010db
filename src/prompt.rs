// src/prompt.rs
//! Instruction text for the text/analysis call and for the video job.

use crate::schema::ResponseShape;

/// Builds the single instruction sent alongside the response schema.
///
/// Callers guarantee a non-blank description; this is plain string assembly.
pub fn build_content_prompt(description: &str, shape: &ResponseShape, has_image: bool) -> String {
    let languages = shape
        .languages()
        .iter()
        .map(|lang| lang.prompt_label())
        .collect::<Vec<_>>()
        .join(", ");

    let subject = if has_image {
        "product description and image"
    } else {
        "product description"
    };

    let mut prompt = format!(
        "Analyze the following {subject} for an artisan craft.\n\
         Based on the analysis, generate marketing content as requested.\n\
         \n\
         **Product Description:** \"{description}\"\n\
         \n\
         **Main Task:**\n\
         For EACH of the following languages ({languages}):\n\
         1.  **Analysis Task:**\n\
         \x20   -   **Target Audience:** Describe the ideal customer for this product in 1-2 sentences.\n\
         \x20   -   **Key Selling Points:** List 3-5 unique selling points or emotional hooks.\n\
         \x20   -   **Overall Sentiment:** Describe the sentiment or feeling the product evokes (e.g., rustic, modern, whimsical).\n"
    );

    if shape.has_content() {
        let content_types = shape
            .content_kinds()
            .iter()
            .map(|kind| kind.prompt_label())
            .collect::<Vec<_>>()
            .join(", ");
        prompt.push_str(&format!(
            "2.  **Content Generation Task:**\n\
             \x20   -   Generate the following content types: {content_types}.\n"
        ));
    }

    if shape.wants_video_suggestions() {
        prompt.push_str(
            "\n**Video Task (English only, do this once, not per language):**\n\
             -   **Caption:** Write a short, catchy caption for a vertical short video ad of this product, including relevant hashtags.\n\
             -   **Audio Suggestion:** Suggest a background music or audio style that fits the product.\n\
             Put these in the `videoSuggestions` object.\n",
        );
    }

    prompt.push_str(
        "\nReturn the entire response as a single JSON object. Do not include any markdown formatting (e.g., ```json).\n\
         The JSON structure should follow the provided schema precisely.\n",
    );

    prompt
}

/// Instruction for the image-to-video job.
pub fn build_video_prompt(description: &str) -> String {
    format!(
        "Create an engaging, 9:16 vertical short video ad for an artisan product, suitable for \
         Instagram Reels and YouTube Shorts. Description: \"{description}\". Focus on the \
         craftsmanship and unique qualities."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContentKind, ContentSelection, LanguageCode};

    fn shape(kinds: &[ContentKind], langs: &[LanguageCode]) -> ResponseShape {
        ResponseShape::new(&ContentSelection::new(kinds), langs)
    }

    #[test]
    fn test_prompt_lists_labels_and_languages() {
        let prompt = build_content_prompt(
            "hand-carved mango-wood bowl",
            &shape(
                &[ContentKind::Social, ContentKind::Description],
                &[LanguageCode::En, LanguageCode::Hi],
            ),
            false,
        );

        assert!(prompt.contains("\"hand-carved mango-wood bowl\""));
        assert!(prompt.contains("Social Media Post"));
        assert!(prompt.contains("Product Description (for e-commerce sites)"));
        assert!(prompt.contains("(English, Hindi)"));
        assert!(prompt.contains("Content Generation Task"));
        assert!(!prompt.contains("and image"));
        assert!(!prompt.contains("videoSuggestions"));
        assert!(prompt.contains("Do not include any markdown formatting"));
    }

    #[test]
    fn test_prompt_defaults_to_english() {
        let prompt = build_content_prompt("a shawl", &shape(&[ContentKind::Seo], &[]), true);
        assert!(prompt.contains("(English)"));
        assert!(prompt.contains("description and image"));
    }

    #[test]
    fn test_video_only_prompt_has_analysis_but_no_content_task() {
        let prompt = build_content_prompt(
            "terracotta lamp",
            &shape(&[ContentKind::Video], &[LanguageCode::Ta]),
            true,
        );

        assert!(prompt.contains("Analysis Task"));
        assert!(!prompt.contains("Content Generation Task"));
        assert!(prompt.contains("English only"));
        assert!(prompt.contains("videoSuggestions"));
    }

    #[test]
    fn test_video_prompt_embeds_description() {
        let prompt = build_video_prompt("brass diya");
        assert!(prompt.contains("9:16 vertical"));
        assert!(prompt.contains("Description: \"brass diya\""));
    }
}
