//! Core type definitions for the source document tree
//!
//! Key design principles:
//! 1. Use u32 for indices (4 bytes vs 8 bytes pointer)
//! 2. Use SmallVec for small arrays (avoid heap allocation)
//! 3. Use Option<Box<T>> for large optional fields (reduce struct size)

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Node identifier (index into arena)
/// u32 allows 4 billion nodes, enough for any webpage
pub type NodeId = u32;

/// Node type matching DOM specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeType {
    Element = 1,
    Attribute = 2,
    Text = 3,
    CdataSection = 4,
    EntityReference = 5,
    Entity = 6,
    ProcessingInstruction = 7,
    Comment = 8,
    Document = 9,
    DocumentType = 10,
    DocumentFragment = 11,
    Notation = 12,
}

impl NodeType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(NodeType::Element),
            2 => Some(NodeType::Attribute),
            3 => Some(NodeType::Text),
            4 => Some(NodeType::CdataSection),
            5 => Some(NodeType::EntityReference),
            6 => Some(NodeType::Entity),
            7 => Some(NodeType::ProcessingInstruction),
            8 => Some(NodeType::Comment),
            9 => Some(NodeType::Document),
            10 => Some(NodeType::DocumentType),
            11 => Some(NodeType::DocumentFragment),
            12 => Some(NodeType::Notation),
            _ => None,
        }
    }
}

/// Rectangle with coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DomRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Build from the flat `[x, y, width, height]` layout used by DOMSnapshot
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match values {
            [x, y, width, height, ..] => Some(Self::new(*x, *y, *width, *height)),
            _ => None,
        }
    }
}

/// Intrinsic pixel size of a replaced element (images)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NaturalSize {
    pub width: f64,
    pub height: f64,
}

impl NaturalSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Rendering data captured from the live page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotNode {
    /// Layout box in document coordinates
    pub bounds: Option<DomRect>,
    /// Intrinsic size for images, if known
    pub natural_size: Option<NaturalSize>,
}

/// The main DOM tree node structure
///
/// Design philosophy:
/// - Small fixed-size fields first (better packing)
/// - Use indices instead of pointers
/// - Use Option<Box<T>> for large optional data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomNode {
    // IDs
    pub node_id: NodeId,
    pub backend_node_id: u32,
    pub node_type: NodeType,

    // Navigation indices
    pub parent_id: Option<NodeId>,
    pub children_ids: SmallVec<[NodeId; 4]>, // Most nodes have <4 children

    pub node_name: String,
    pub node_value: String,
    pub attributes: HashMap<String, String>,

    // Rendering data (boxed, most nodes never get any)
    pub snapshot_node: Option<Box<SnapshotNode>>,
}

impl DomNode {
    /// Create a new node with required fields
    pub fn new(node_id: NodeId, backend_node_id: u32, node_type: NodeType, node_name: String) -> Self {
        Self {
            node_id,
            backend_node_id,
            node_type,
            node_name,
            node_value: String::new(),
            attributes: HashMap::new(),
            parent_id: None,
            children_ids: SmallVec::new(),
            snapshot_node: None,
        }
    }

    /// Get tag name for element nodes
    pub fn tag_name(&self) -> Option<&str> {
        if self.node_type == NodeType::Element {
            Some(&self.node_name)
        } else {
            None
        }
    }

    /// Case-insensitive tag comparison; false for non-elements
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag_name()
            .map(|name| name.eq_ignore_ascii_case(tag))
            .unwrap_or(false)
    }

    /// Check if node is an element
    pub fn is_element(&self) -> bool {
        self.node_type == NodeType::Element
    }

    /// Check if node is text
    pub fn is_text(&self) -> bool {
        self.node_type == NodeType::Text
    }

    /// Get attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    /// Whitespace-separated class tokens
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Layout box, if the page was snapshotted
    pub fn bounds(&self) -> Option<DomRect> {
        self.snapshot_node.as_ref().and_then(|s| s.bounds)
    }

    /// Intrinsic image size, if known
    pub fn natural_size(&self) -> Option<NaturalSize> {
        self.snapshot_node.as_ref().and_then(|s| s.natural_size)
    }

    /// Mutable access to rendering data, creating it on first use
    pub fn snapshot_mut(&mut self) -> &mut SnapshotNode {
        self.snapshot_node.get_or_insert_with(Default::default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_tokens() {
        let mut node = DomNode::new(0, 0, NodeType::Element, "DIV".to_string());
        node.attributes
            .insert("class".to_string(), "  entry-content\tpost ".to_string());

        assert!(node.has_class("entry-content"));
        assert!(node.has_class("post"));
        assert!(!node.has_class("entry"));
        assert!(node.has_tag("div"));
    }

    #[test]
    fn test_rect_from_slice() {
        assert_eq!(
            DomRect::from_slice(&[1.0, 2.0, 3.0, 4.0]),
            Some(DomRect::new(1.0, 2.0, 3.0, 4.0))
        );
        assert_eq!(DomRect::from_slice(&[1.0, 2.0]), None);
    }

    #[test]
    fn test_snapshot_mut_creates_data() {
        let mut node = DomNode::new(0, 0, NodeType::Element, "IMG".to_string());
        assert!(node.natural_size().is_none());

        node.snapshot_mut().natural_size = Some(NaturalSize::new(200.0, 100.0));
        assert_eq!(node.natural_size(), Some(NaturalSize::new(200.0, 100.0)));
        assert!(node.bounds().is_none());
    }
}
