//! Compiled rule tables
//!
//! Selector strings from [`ReaderConfig`] are parsed once here. The
//! pipeline only ever sees compiled tables, so a bad selector fails at
//! construction time instead of halfway through an extraction.

use dom::{DomNode, SelectorList};

use crate::config::ReaderConfig;
use crate::error::Result;

/// Rule tables shared by every pipeline stage
#[derive(Debug, Clone)]
pub struct Rules {
    /// Selector cascade, in precedence order
    pub containers: Vec<SelectorList>,
    pub nested_articles: SelectorList,
    pub density_candidates: SelectorList,
    pub landmarks: SelectorList,
    /// Lowercased denylist keywords
    pub denylist: Vec<String>,
    /// Lowercased content tag names
    pub content_tags: Vec<String>,
    pub junk: SelectorList,
    pub ads: SelectorList,
    pub title_meta: SelectorList,
    pub author_meta: SelectorList,
    pub byline: SelectorList,
}

impl Rules {
    pub fn compile(config: &ReaderConfig) -> Result<Self> {
        let containers = config
            .container_selectors
            .iter()
            .map(|s| s.parse::<SelectorList>())
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            containers,
            nested_articles: config.nested_article_selector.parse()?,
            density_candidates: config.density_candidates.parse()?,
            landmarks: config.landmarks.parse()?,
            denylist: config
                .denylist_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            content_tags: config
                .content_tags
                .iter()
                .map(|t| t.to_ascii_lowercase())
                .collect(),
            junk: config.junk_selectors.parse()?,
            ads: config.ad_selectors.parse()?,
            title_meta: config.title_meta_selector.parse()?,
            author_meta: config.author_meta_selector.parse()?,
            byline: config.byline_selectors.parse()?,
        })
    }

    /// First denylist keyword contained in `id_and_class`
    pub fn denylisted<'a>(&'a self, id_and_class: &str) -> Option<&'a str> {
        self.denylist
            .iter()
            .find(|keyword| id_and_class.contains(keyword.as_str()))
            .map(String::as_str)
    }

    pub fn is_content_node(&self, node: &DomNode) -> bool {
        node.tag_name()
            .map(|tag| self.content_tags.iter().any(|t| tag.eq_ignore_ascii_case(t)))
            .unwrap_or(false)
    }
}
