//! Read-only source document handed to the pipeline

use dom::{utils, DomArena, DomService, NodeId};
use url::Url;

use crate::error::{ReaderError, Result};

/// A rooted source tree plus the URL its links resolve against
///
/// Only shared access to the arena is exposed; extraction never mutates
/// the page it reads.
#[derive(Debug)]
pub struct Document {
    arena: DomArena,
    root_id: NodeId,
    base_url: Option<Url>,
}

impl Document {
    /// Wrap a built arena; fails if it has no root
    pub fn new(arena: DomArena) -> Result<Self> {
        let root_id = arena.root_id().ok_or(ReaderError::EmptyDocument)?;
        Ok(Self {
            arena,
            root_id,
            base_url: None,
        })
    }

    /// Take the arena and document URL out of a service
    pub fn from_service(service: DomService) -> Result<Self> {
        let url = service.document_url().map(str::to_string);
        let document = Self::new(service.into_arena())?;
        match url {
            Some(url) => document.with_base_url(&url),
            None => Ok(document),
        }
    }

    /// Parse an HTML string into a document without rendering data
    pub fn from_html(html: &str) -> Result<Self> {
        let mut service = DomService::new();
        service.parse_html(html)?;
        Self::from_service(service)
    }

    pub fn with_base_url(mut self, url: &str) -> Result<Self> {
        self.base_url = Some(Url::parse(url)?);
        Ok(self)
    }

    pub fn arena(&self) -> &DomArena {
        &self.arena
    }

    pub fn root_id(&self) -> NodeId {
        self.root_id
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Element by `id` attribute
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.arena.find_by_id(id)
    }

    /// Rendered text of a node (see [`utils::inner_text`])
    pub fn inner_text(&self, node_id: NodeId) -> String {
        utils::inner_text(&self.arena, node_id)
    }

    /// Raw concatenated text of a node (`textContent`)
    pub fn text_content(&self, node_id: NodeId) -> String {
        utils::get_text_content(&self.arena, node_id).unwrap_or_default()
    }

    /// Resolve a link target the way `HTMLAnchorElement.href` does
    ///
    /// Falls back to the raw value when there is no base URL or the value
    /// does not resolve.
    pub fn resolve_url(&self, href: &str) -> String {
        let href = href.trim();
        self.base_url
            .as_ref()
            .and_then(|base| base.join(href).ok())
            .map(|url| url.to_string())
            .unwrap_or_else(|| href.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_arena_is_rejected() {
        assert!(matches!(
            Document::new(DomArena::new()),
            Err(ReaderError::EmptyDocument)
        ));
    }

    #[test]
    fn test_resolve_url() {
        let doc = Document::from_html("<p>x</p>")
            .unwrap()
            .with_base_url("https://news.test/world/story.html")
            .unwrap();

        assert_eq!(doc.resolve_url("/about"), "https://news.test/about");
        assert_eq!(doc.resolve_url("next.html"), "https://news.test/world/next.html");
        assert_eq!(doc.resolve_url("https://x.test"), "https://x.test/");
    }

    #[test]
    fn test_resolve_without_base_keeps_raw_value() {
        let doc = Document::from_html("<p>x</p>").unwrap();
        assert_eq!(doc.resolve_url("https://x.test"), "https://x.test");
        assert_eq!(doc.resolve_url("/about"), "/about");
    }

    #[test]
    fn test_invalid_base_url() {
        let doc = Document::from_html("<p>x</p>").unwrap();
        assert!(matches!(doc.with_base_url("not a url"), Err(ReaderError::Url(_))));
    }
}
