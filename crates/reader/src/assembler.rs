//! Document Assembler - the reader pipeline entry point
//!
//! Locator, filter and transformer run in that order over a read-only
//! [`Document`]; metadata is extracted alongside. A [`Surface`] guards
//! against showing a second overlay.

use dom::SelectorList;

use crate::config::ReaderConfig;
use crate::document::Document;
use crate::error::Result;
use crate::filter::NodeFilter;
use crate::geometry::Geometry;
use crate::locator::Locator;
use crate::metadata;
use crate::output::{classes, OutputDocument};
use crate::rules::Rules;
use crate::surface::Surface;
use crate::transform::Transformer;

/// Outcome of an activation
#[derive(Debug, Clone, PartialEq)]
pub enum Assembly {
    Assembled(OutputDocument),
    /// An overlay is already shown; nothing was built
    AlreadyShown,
}

impl Assembly {
    pub fn into_document(self) -> Option<OutputDocument> {
        match self {
            Assembly::Assembled(doc) => Some(doc),
            Assembly::AlreadyShown => None,
        }
    }
}

/// Reader with compiled rule tables
///
/// Construction is the only fallible step: once built, extraction always
/// produces a document.
#[derive(Debug, Clone)]
pub struct Reader {
    config: ReaderConfig,
    rules: Rules,
    overlay: SelectorList,
}

impl Reader {
    pub fn new() -> Result<Self> {
        Self::with_config(ReaderConfig::default())
    }

    pub fn with_config(config: ReaderConfig) -> Result<Self> {
        let rules = Rules::compile(&config)?;
        let overlay: SelectorList = format!("#{}", classes::OVERLAY_ID).parse()?;
        Ok(Self {
            config,
            rules,
            overlay,
        })
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Build the reader view without touching any surface
    pub fn extract(&self, doc: &Document, geometry: &dyn Geometry) -> OutputDocument {
        let located = Locator::new(&self.config, &self.rules).locate(doc, geometry);

        let decisions = NodeFilter::new(&self.config, &self.rules).classify(doc, located.node_id, geometry);
        let transformer = Transformer::new(&self.config, doc);
        let body = decisions
            .iter()
            .filter(|d| d.is_kept())
            .map(|d| transformer.transform(d.node_id))
            .collect();

        let title = metadata::title(doc, &self.config, &self.rules);
        let byline = metadata::author(doc, &self.rules);

        OutputDocument::new(title, byline, body)
    }

    /// Extract and claim `surface`, unless an overlay is already shown
    ///
    /// An overlay counts as shown when the surface is claimed or when the
    /// source document already contains the overlay element.
    pub fn assemble(&self, doc: &Document, geometry: &dyn Geometry, surface: &dyn Surface) -> Assembly {
        if doc.arena().query_selector(&self.overlay).is_some() {
            tracing::debug!("overlay element already in document");
            return Assembly::AlreadyShown;
        }
        if !surface.try_claim() {
            tracing::debug!("surface already claimed");
            return Assembly::AlreadyShown;
        }

        let output = self.extract(doc, geometry);
        tracing::debug!(
            title = %output.title,
            body_nodes = output.body.len(),
            has_byline = output.byline.is_some(),
            "assembled reader view"
        );
        Assembly::Assembled(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::StaticGeometry;
    use crate::output::OutputNode;
    use crate::surface::LocalSurface;

    fn breaking_news() -> Document {
        let sentence = "The committee confirmed the report late on Tuesday evening. ";
        let paragraph = sentence.repeat(3);
        Document::from_html(&format!(
            "<html><head><title>Breaking News</title></head><body>\
             <nav><a href='/'>Home</a></nav>\
             <h1>Breaking News</h1>\
             <article>\
             <p>{p}</p><p>{p}</p><p>{p}</p>\
             <p>{p}Read the <a href='https://x.test'>source</a></p>\
             </article></body></html>",
            p = paragraph
        ))
        .unwrap()
    }

    #[test]
    fn test_breaking_news_scenario() {
        let doc = breaking_news();
        let output = Reader::new().unwrap().extract(&doc, &StaticGeometry::new());

        assert_eq!(output.title, "Breaking News");
        assert_eq!(output.byline, None);
        assert_eq!(output.body.len(), 4);
        assert!(output.body.iter().all(|n| n.tag() == Some("p")));

        let anchor = output.body[3]
            .children()
            .iter()
            .find(|n| n.tag() == Some("a"))
            .unwrap();
        assert_eq!(anchor.text_content(), "[source]");
        assert_eq!(anchor.attr("title"), Some("https://x.test"));
        assert_eq!(output.marker, OutputNode::with_class_and_text("span", "terminal-cursor", "_"));
    }

    #[test]
    fn test_second_activation_is_a_no_op() {
        let doc = breaking_news();
        let reader = Reader::new().unwrap();
        let surface = LocalSurface::new();
        let geometry = StaticGeometry::new();

        let first = reader.assemble(&doc, &geometry, &surface);
        let second = reader.assemble(&doc, &geometry, &surface);
        assert!(matches!(first, Assembly::Assembled(_)));
        assert_eq!(second, Assembly::AlreadyShown);

        surface.release();
        assert!(reader.assemble(&doc, &geometry, &surface).into_document().is_some());
    }

    #[test]
    fn test_overlay_in_source_blocks_activation() {
        let doc = Document::from_html("<div id='terminal-view-overlay'></div><p>x</p>").unwrap();
        let surface = LocalSurface::new();

        let result = Reader::new().unwrap().assemble(&doc, &StaticGeometry::new(), &surface);
        assert_eq!(result, Assembly::AlreadyShown);
        assert!(!surface.is_claimed());
    }

    #[test]
    fn test_small_images_dropped_large_kept_and_wrapped() {
        let filler = "<p>Paragraph text that makes the article long enough to qualify.</p>".repeat(10);
        let doc = Document::from_html(&format!(
            "<article>{filler}<img id='icon' src='icon.png'><img id='photo' src='photo.jpg'></article>"
        ))
        .unwrap();
        let icon = doc.element_by_id("icon").unwrap();
        let photo = doc.element_by_id("photo").unwrap();
        let mut geometry = StaticGeometry::new();
        geometry.set_natural(icon, 50.0, 50.0).set_box(icon, 50.0, 50.0);
        geometry.set_natural(photo, 200.0, 200.0).set_box(photo, 200.0, 200.0);

        let output = Reader::new().unwrap().extract(&doc, &geometry);
        let wrappers: Vec<&OutputNode> = output
            .body
            .iter()
            .filter(|n| n.attr("class") == Some(classes::IMAGE_WRAPPER))
            .collect();

        assert_eq!(wrappers.len(), 1);
        assert_eq!(wrappers[0].children()[0].attr("src"), Some("photo.jpg"));
        assert_eq!(output.body.len(), 11);
    }

    #[test]
    fn test_fallback_document_still_assembles() {
        let doc = Document::from_html("<p>tiny</p>").unwrap();
        let output = Reader::new().unwrap().extract(&doc, &StaticGeometry::new());

        assert_eq!(output.title, "NO_TITLE_DETECTED");
        assert_eq!(output.body.len(), 1);
        assert_eq!(output.body[0].to_html(), "<p>tiny</p>");
    }

    #[test]
    fn test_invalid_config_fails_construction() {
        let config = ReaderConfig {
            byline_selectors: ".byline >".to_string(),
            ..Default::default()
        };
        assert!(Reader::with_config(config).is_err());
    }
}
