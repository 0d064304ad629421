//! Utility functions for DOM processing

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::{DomNode, NodeId, NodeType};

/// Block-level HTML elements
pub const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4",
    "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section",
    "table", "tr", "ul",
];

/// Elements whose text never renders
pub const NON_RENDERED_ELEMENTS: &[&str] = &["head", "script", "style", "noscript", "template"];

/// Check if a tag is a block-level element
pub fn is_block(tag: &str) -> bool {
    BLOCK_ELEMENTS.iter().any(|b| b.eq_ignore_ascii_case(tag))
}

fn is_non_rendered(node: &DomNode) -> bool {
    node.tag_name()
        .map(|tag| NON_RENDERED_ELEMENTS.iter().any(|t| t.eq_ignore_ascii_case(tag)))
        .unwrap_or(false)
}

/// Concatenated text of a node and all its descendants (DOM `textContent`)
pub fn get_text_content(arena: &DomArena, node_id: NodeId) -> Result<String> {
    let mut text = String::new();

    arena.traverse_df(node_id, |node| {
        if node.node_type == NodeType::Text {
            text.push_str(&node.node_value);
        }
        Ok(())
    })?;

    Ok(text)
}

/// Approximation of DOM `innerText` without a layout engine
///
/// Text of descendants that would render, with block boundaries and `<br>`
/// treated as breaks, whitespace runs collapsed to one space, and trimmed.
pub fn inner_text(arena: &DomArena, node_id: NodeId) -> String {
    let mut raw = String::new();
    let mut stack = vec![(node_id, false)];

    while let Some((id, closing)) = stack.pop() {
        let Ok(node) = arena.get(id) else {
            continue;
        };

        if closing {
            raw.push(' ');
            continue;
        }

        match node.node_type {
            NodeType::Text => raw.push_str(&node.node_value),
            NodeType::Element | NodeType::Document | NodeType::DocumentFragment => {
                if id != node_id && is_non_rendered(node) {
                    continue;
                }
                let tag = node.tag_name().unwrap_or("");
                if tag.eq_ignore_ascii_case("br") {
                    raw.push(' ');
                    continue;
                }
                let block = is_block(tag);
                if block {
                    raw.push(' ');
                    stack.push((id, true));
                }
                for &child_id in node.children_ids.iter().rev() {
                    stack.push((child_id, false));
                }
            }
            _ => {}
        }
    }

    collapse_whitespace(&raw)
}

/// Collapse whitespace runs to a single space and trim
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased concatenation of `id` and `class`, as used by keyword denylists
pub fn id_and_class(node: &DomNode) -> String {
    let mut out = String::new();
    out.push_str(node.attr("id").unwrap_or(""));
    out.push_str(node.attr("class").unwrap_or(""));
    out.to_lowercase()
}

/// Generate XPath for a node
pub fn generate_xpath(arena: &DomArena, node_id: NodeId) -> Result<String> {
    let mut path_parts = Vec::new();
    let mut current_id = Some(node_id);

    while let Some(id) = current_id {
        let node = arena.get(id)?;

        if node.node_type == NodeType::Element {
            // Get position among siblings with same tag name
            let position = if let Some(parent_id) = node.parent_id {
                let parent = arena.get(parent_id)?;
                parent
                    .children_ids
                    .iter()
                    .filter_map(|&child_id| arena.get(child_id).ok())
                    .filter(|child| {
                        child.node_type == NodeType::Element
                            && child.node_name.eq_ignore_ascii_case(&node.node_name)
                    })
                    .position(|child| child.node_id == node.node_id)
                    .map(|p| p + 1) // XPath is 1-indexed
                    .unwrap_or(1)
            } else {
                1
            };

            path_parts.push(format!("{}[{}]", node.node_name.to_lowercase(), position));
        }

        current_id = node.parent_id;
    }

    path_parts.reverse();
    Ok(format!("/{}", path_parts.join("/")))
}
