//! Owned output tree and overlay rendering
//!
//! Output nodes are plain values: they are built by copying source nodes
//! and share nothing with the source arena.
//!
//! The ids and class names in [`classes`] are the contract with the host
//! stylesheet; renaming any of them is a breaking change.

use serde::Serialize;

/// Presentational ids and classes the host stylesheet relies on
pub mod classes {
    /// Id of the overlay root; its presence means an overlay is shown
    pub const OVERLAY_ID: &str = "terminal-view-overlay";
    pub const EXIT_BUTTON_ID: &str = "terminal-exit-btn";
    pub const CONTENT: &str = "terminal-content";
    pub const BYLINE: &str = "byline";
    pub const IMAGE_WRAPPER: &str = "terminal-image-wrapper";
    pub const CURSOR: &str = "terminal-cursor";
}

/// Void (self-closing) HTML elements
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutputNode {
    Element(OutputElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputElement {
    /// Lowercase tag name
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<OutputNode>,
}

impl OutputNode {
    pub fn element(tag: &str) -> Self {
        OutputNode::Element(OutputElement {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            children: Vec::new(),
        })
    }

    pub fn text(content: impl Into<String>) -> Self {
        OutputNode::Text(content.into())
    }

    /// Element with a `class` attribute and a single text child
    pub fn with_class_and_text(tag: &str, class: &str, text: impl Into<String>) -> Self {
        let mut node = Self::element(tag);
        node.set_attr("class", class);
        node.push(Self::text(text));
        node
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            OutputNode::Element(el) => Some(&el.tag),
            OutputNode::Text(_) => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            OutputNode::Element(el) => el
                .attributes
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str()),
            OutputNode::Text(_) => None,
        }
    }

    /// Set or replace an attribute; no-op on text nodes
    pub fn set_attr(&mut self, name: &str, value: &str) {
        if let OutputNode::Element(el) = self {
            match el.attributes.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
                Some((_, existing)) => *existing = value.to_string(),
                None => el.attributes.push((name.to_string(), value.to_string())),
            }
        }
    }

    pub fn children(&self) -> &[OutputNode] {
        match self {
            OutputNode::Element(el) => &el.children,
            OutputNode::Text(_) => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<OutputNode>> {
        match self {
            OutputNode::Element(el) => Some(&mut el.children),
            OutputNode::Text(_) => None,
        }
    }

    /// Append a child; no-op on text nodes
    pub fn push(&mut self, child: OutputNode) {
        if let Some(children) = self.children_mut() {
            children.push(child);
        }
    }

    /// Concatenated text of this node and its descendants
    pub fn text_content(&self) -> String {
        match self {
            OutputNode::Text(text) => text.clone(),
            OutputNode::Element(el) => el.children.iter().map(OutputNode::text_content).collect(),
        }
    }

    /// Replace all children with one text node, like assigning `textContent`
    pub fn set_text_content(&mut self, text: impl Into<String>) {
        match self {
            OutputNode::Text(existing) => *existing = text.into(),
            OutputNode::Element(el) => el.children = vec![OutputNode::Text(text.into())],
        }
    }

    /// Serialize to HTML
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            OutputNode::Text(text) => out.push_str(&escape_text(text)),
            OutputNode::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attr(value));
                    out.push('"');
                }
                out.push('>');

                if VOID_ELEMENTS.contains(&el.tag.as_str()) {
                    return;
                }

                for child in &el.children {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
    }
}

/// The assembled reader view
///
/// Built once per activation and not modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputDocument {
    pub title: String,
    pub byline: Option<String>,
    pub body: Vec<OutputNode>,
    /// Trailing end-of-content marker
    pub marker: OutputNode,
}

impl OutputDocument {
    pub fn new(title: String, byline: Option<String>, body: Vec<OutputNode>) -> Self {
        Self {
            title,
            byline,
            body,
            marker: OutputNode::with_class_and_text("span", classes::CURSOR, "_"),
        }
    }

    /// Heading shown above the content
    pub fn title_node(&self) -> OutputNode {
        let mut h1 = OutputNode::element("h1");
        h1.push(OutputNode::text(format!("> LOAD_DATA: \"{}\"", self.title)));
        h1
    }

    /// Byline paragraph; `None` when there is no author
    pub fn byline_node(&self) -> Option<OutputNode> {
        self.byline.as_ref().map(|author| {
            OutputNode::with_class_and_text(
                "p",
                classes::BYLINE,
                format!("//_SOURCE_ACKNOWLEDGED: \"{}\"", author),
            )
        })
    }

    /// Full overlay tree: close button plus content wrapper
    pub fn to_overlay(&self) -> OutputNode {
        let mut exit = OutputNode::element("button");
        exit.set_attr("id", classes::EXIT_BUTTON_ID);
        exit.set_attr("type", "button");
        exit.push(OutputNode::text("[X] CLOSE"));

        let mut content = OutputNode::element("div");
        content.set_attr("class", classes::CONTENT);
        content.push(self.title_node());
        if let Some(byline) = self.byline_node() {
            content.push(byline);
        }
        for node in &self.body {
            content.push(node.clone());
        }
        content.push(self.marker.clone());

        let mut overlay = OutputNode::element("div");
        overlay.set_attr("id", classes::OVERLAY_ID);
        overlay.push(exit);
        overlay.push(content);
        overlay
    }

    /// Overlay serialized to HTML, ready for insertion
    pub fn to_html(&self) -> String {
        self.to_overlay().to_html()
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
