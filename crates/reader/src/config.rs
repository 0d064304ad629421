//! Reader configuration
//!
//! Every heuristic threshold and selector table lives here so extraction
//! can be tuned without touching control flow. Missing fields fall back to
//! the defaults below, which are the values the heuristics were tuned with.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Selector cascade, tried in order; broad containers first
    pub container_selectors: Vec<String>,
    /// Minimum rendered text length (exclusive) for a cascade match
    pub min_container_text: usize,
    /// Elements counted as nested sub-articles of a cascade match
    pub nested_article_selector: String,
    /// More nested sub-articles than this marks a listing page
    pub max_nested_articles: usize,

    /// Elements scanned by the density fallback
    pub density_candidates: String,
    /// Landmarks a density candidate must not sit inside (unless it is one)
    pub landmarks: String,
    /// id/class substrings that disqualify a density candidate
    pub denylist_keywords: Vec<String>,
    /// Minimum rendered height in CSS pixels
    pub min_container_height: f64,
    /// Minimum number of `<p>` descendants
    pub min_paragraphs: usize,

    /// Tags the filter enumerates inside the container
    pub content_tags: Vec<String>,
    /// Junk markers checked on the node and every ancestor
    pub junk_selectors: String,
    /// Advertisement markers checked on image ancestors
    pub ad_selectors: String,
    /// Minimum natural width and height of a kept image
    pub min_image_natural_size: f64,
    /// Minimum rendered width of a kept image
    pub min_image_rendered_width: f64,

    pub title_meta_selector: String,
    pub author_meta_selector: String,
    pub byline_selectors: String,
    /// Title used when no source yields one
    pub title_sentinel: String,
    /// Prefix put in front of sub-heading text
    pub heading_marker: String,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            container_selectors: [
                "article",
                ".article-content",
                "#storytext",
                ".storytext",
                "article.story",
                ".entry-content",
                ".post-content",
                ".article-body",
                "#main-content",
                "#article-body",
                "[role=\"main\"]",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            min_container_text: 500,
            nested_article_selector: "article".to_string(),
            max_nested_articles: 3,

            density_candidates: "div, main".to_string(),
            landmarks: "article, main".to_string(),
            denylist_keywords: ["nav", "footer", "sidebar", "comment", "header", "menu"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            min_container_height: 300.0,
            min_paragraphs: 3,

            content_tags: ["p", "h2", "h3", "h4", "img", "pre", "ul", "ol", "blockquote"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            junk_selectors: ".sr-only, .visually-hidden, .screen-reader-text, \
                [aria-hidden=\"true\"], .ad, .advertisement, footer, .footer, \
                .comments, #comments, .related-posts, .author-bio, .social-links"
                .to_string(),
            ad_selectors: ".ad, .advertisement".to_string(),
            min_image_natural_size: 100.0,
            min_image_rendered_width: 50.0,

            title_meta_selector: "meta[property=\"og:title\"]".to_string(),
            author_meta_selector: "meta[name=\"author\"]".to_string(),
            byline_selectors: ".byline, .author, *[rel=\"author\"], .author-name".to_string(),
            title_sentinel: "NO_TITLE_DETECTED".to_string(),
            heading_marker: "-> ".to_string(),
        }
    }
}

impl ReaderConfig {
    /// Parse a JSON configuration; absent fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ReaderConfig::from_json_str(
            r#"{ "min_container_text": 200, "denylist_keywords": ["promo"] }"#,
        )
        .unwrap();

        assert_eq!(config.min_container_text, 200);
        assert_eq!(config.denylist_keywords, vec!["promo"]);
        assert_eq!(config.min_container_height, 300.0);
        assert_eq!(config.container_selectors[0], "article");
        assert_eq!(config.title_sentinel, "NO_TITLE_DETECTED");
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(ReaderConfig::from_json_str("{ not json").is_err());
        assert!(ReaderConfig::from_json_str(r#"{ "min_paragraphs": "three" }"#).is_err());
    }

    #[test]
    fn test_roundtrips_through_serde() {
        let config = ReaderConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(ReaderConfig::from_json_str(&json).unwrap(), config);
    }
}
