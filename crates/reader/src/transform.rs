//! Node Transformer - deep-copies kept nodes into the output tree
//!
//! Rewrites only change text and attributes of the copy; which nodes
//! survive was settled by the filter.

use dom::{NodeId, NodeType};

use crate::config::ReaderConfig;
use crate::document::Document;
use crate::output::{classes, OutputNode};

const SUB_HEADINGS: &[&str] = &["h2", "h3", "h4"];

pub struct Transformer<'a> {
    config: &'a ReaderConfig,
    doc: &'a Document,
}

impl<'a> Transformer<'a> {
    pub fn new(config: &'a ReaderConfig, doc: &'a Document) -> Self {
        Self { config, doc }
    }

    /// Output node for a kept source node
    ///
    /// Images come back inside their presentational wrapper.
    pub fn transform(&self, node_id: NodeId) -> OutputNode {
        let Some(mut copy) = self.deep_copy(node_id) else {
            // Kept nodes are always elements; anything else copies as empty text
            return OutputNode::text("");
        };

        let tag = copy.tag().unwrap_or_default().to_string();

        if SUB_HEADINGS.contains(&tag.as_str()) {
            let text = format!("{}{}", self.config.heading_marker, copy.text_content());
            copy.set_text_content(text);
        }

        if tag == "a" {
            self.rewrite_anchor(&mut copy);
        }
        if let Some(children) = copy.children_mut() {
            for child in children {
                self.rewrite_nested_anchors(child);
            }
        }

        if tag == "img" {
            let mut wrapper = OutputNode::element("div");
            wrapper.set_attr("class", classes::IMAGE_WRAPPER);
            wrapper.push(copy);
            return wrapper;
        }

        copy
    }

    /// Structural copy of a source subtree; comments and other non-content
    /// nodes are not carried over
    fn deep_copy(&self, node_id: NodeId) -> Option<OutputNode> {
        let node = self.doc.arena().get(node_id).ok()?;

        match node.node_type {
            NodeType::Text | NodeType::CdataSection => Some(OutputNode::text(node.node_value.clone())),
            NodeType::Element => {
                let mut copy = OutputNode::element(&node.node_name);

                let mut attributes: Vec<(&String, &String)> = node.attributes.iter().collect();
                attributes.sort();
                for (name, value) in attributes {
                    copy.set_attr(name, value);
                }

                for &child_id in &node.children_ids {
                    if let Some(child) = self.deep_copy(child_id) {
                        copy.push(child);
                    }
                }
                Some(copy)
            }
            _ => None,
        }
    }

    /// `[text]` with the link target exposed as a hover title
    fn rewrite_anchor(&self, anchor: &mut OutputNode) {
        let text = format!("[{}]", anchor.text_content());
        let target = anchor
            .attr("href")
            .map(|href| self.doc.resolve_url(href))
            .unwrap_or_default();

        anchor.set_text_content(text);
        anchor.set_attr("title", &target);
    }

    fn rewrite_nested_anchors(&self, node: &mut OutputNode) {
        if node.tag() == Some("a") {
            // Rewriting replaces the children, so nothing below remains
            self.rewrite_anchor(node);
            return;
        }
        if let Some(children) = node.children_mut() {
            for child in children {
                self.rewrite_nested_anchors(child);
            }
        }
    }
}
