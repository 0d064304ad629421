//! Title and byline extraction

use dom::{utils, NodeId, SelectorList};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ReaderConfig;
use crate::document::Document;
use crate::rules::Rules;

/// Leading "by" word of a byline, e.g. `By`, `by:`, `BY :`
static BY_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*by\b\s*:?\s*").unwrap());

/// First non-empty of og:title, first `<h1>`, `<title>`, then the sentinel
pub fn title(doc: &Document, config: &ReaderConfig, rules: &Rules) -> String {
    meta_content(doc, &rules.title_meta)
        .or_else(|| first_text_of_tag(doc, "h1", |id| doc.inner_text(id)))
        .or_else(|| first_text_of_tag(doc, "title", |id| utils::collapse_whitespace(&doc.text_content(id))))
        .unwrap_or_else(|| config.title_sentinel.clone())
}

/// Author from the meta tag, else from the first byline element
///
/// Only the first byline match is consulted; if it has no text there is
/// no author.
pub fn author(doc: &Document, rules: &Rules) -> Option<String> {
    if let Some(author) = meta_content(doc, &rules.author_meta) {
        return Some(author);
    }

    let byline_id = doc.arena().query_selector(&rules.byline)?;
    let byline = doc.inner_text(byline_id);

    let stripped = strip_by_prefix(&byline);
    (!stripped.is_empty()).then_some(stripped)
}

/// Byline text without a leading "by" word, trimmed
pub fn strip_by_prefix(text: &str) -> String {
    BY_PREFIX.replace(text, "").trim().to_string()
}

fn meta_content(doc: &Document, selector: &SelectorList) -> Option<String> {
    let arena = doc.arena();
    let node_id = arena.query_selector(selector)?;
    let content = arena.get(node_id).ok()?.attr("content")?.trim();
    (!content.is_empty()).then(|| content.to_string())
}

fn first_text_of_tag(doc: &Document, tag: &str, text_of: impl Fn(NodeId) -> String) -> Option<String> {
    let node_id = doc.arena().find_by_tag(tag).into_iter().next()?;
    let text = text_of(node_id).trim().to_string();
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> (String, Option<String>) {
        let config = ReaderConfig::default();
        let rules = Rules::compile(&config).unwrap();
        let doc = Document::from_html(html).unwrap();
        (title(&doc, &config, &rules), author(&doc, &rules))
    }

    #[test]
    fn test_title_precedence() {
        let (t, _) = extract(
            "<head><title>Site | Story</title><meta property='og:title' content='Story'></head>\
             <body><h1>Headline</h1></body>",
        );
        assert_eq!(t, "Story");

        let (t, _) = extract("<head><title>Site | Story</title></head><body><h1> Headline </h1></body>");
        assert_eq!(t, "Headline");

        let (t, _) = extract("<head><title>\n  Site |\n Story </title></head><body><h1> </h1></body>");
        assert_eq!(t, "Site | Story");
    }

    #[test]
    fn test_empty_og_title_falls_through() {
        let (t, _) = extract("<head><meta property='og:title' content='  '></head><body><h1>H</h1></body>");
        assert_eq!(t, "H");
    }

    #[test]
    fn test_title_sentinel() {
        let (t, _) = extract("<p>nothing to see</p>");
        assert_eq!(t, "NO_TITLE_DETECTED");
    }

    #[test]
    fn test_author_meta_wins() {
        let (_, a) = extract(
            "<head><meta name='author' content=' Jane Doe '></head>\
             <body><span class='byline'>By Someone Else</span></body>",
        );
        assert_eq!(a.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_byline_prefix_is_stripped() {
        let (_, a) = extract("<p class='byline'>  BY: Ada Lovelace </p>");
        assert_eq!(a.as_deref(), Some("Ada Lovelace"));

        let (_, a) = extract("<a rel='author' href='/ada'>by Ada</a>");
        assert_eq!(a.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_byline_uses_first_match_only() {
        let (_, a) = extract("<span class='author'></span><span class='author-name'>Grace</span>");
        assert_eq!(a, None);

        let (_, a) = extract("<span class='author-name'>Grace</span><span class='author'>Ada</span>");
        assert_eq!(a.as_deref(), Some("Grace"));
    }

    #[test]
    fn test_byline_that_is_only_the_prefix_is_omitted() {
        let (_, a) = extract("<span class='byline'>By</span>");
        assert_eq!(a, None);
        let (_, a) = extract("<p>no author here</p>");
        assert_eq!(a, None);
    }

    #[test]
    fn test_strip_by_prefix_keeps_names_starting_with_by() {
        assert_eq!(strip_by_prefix("Byron Smith"), "Byron Smith");
        assert_eq!(strip_by_prefix("by : Byron"), "Byron");
        assert_eq!(strip_by_prefix("Written by Ada"), "Written by Ada");
    }
}
