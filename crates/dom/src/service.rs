//! DOM Service - Main entry point for building source documents
//!
//! This handles:
//! - CDP integration (parsing `DOM.getDocument` responses)
//! - HTML string parsing (via scraper/html5ever)
//! - Snapshot data merging (layout bounds, natural image sizes)

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::types::*;
use scraper::{ElementRef, Html, Node as ScraperNode};
use serde_json::Value;
use std::collections::HashMap;

/// Main DOM service
pub struct DomService {
    arena: DomArena,
    document_url: Option<String>,
}

impl DomService {
    /// Create new DOM service
    pub fn new() -> Self {
        Self {
            arena: DomArena::new(),
            document_url: None,
        }
    }

    /// Get reference to internal arena
    pub fn arena(&self) -> &DomArena {
        &self.arena
    }

    /// Get mutable reference to internal arena
    pub fn arena_mut(&mut self) -> &mut DomArena {
        &mut self.arena
    }

    /// Hand the built arena to the caller
    pub fn into_arena(self) -> DomArena {
        self.arena
    }

    /// Base (or document) URL reported for the parsed document
    pub fn document_url(&self) -> Option<&str> {
        self.document_url.as_deref()
    }

    /// Parse CDP DOM tree response and build arena
    ///
    /// Input format matches CDP's DOM.getDocument response:
    /// ```json
    /// {
    ///   "root": {
    ///     "nodeId": 1,
    ///     "backendNodeId": 1,
    ///     "nodeType": 9,
    ///     "nodeName": "#document",
    ///     "documentURL": "https://example.com/",
    ///     "children": [...]
    ///   }
    /// }
    /// ```
    ///
    /// Frame documents and shadow roots are not descended into; only the
    /// main document takes part in extraction.
    pub fn parse_cdp_dom_tree(&mut self, cdp_response: &Value) -> Result<NodeId> {
        let root = cdp_response
            .get("root")
            .ok_or_else(|| DomError::CdpError("Missing 'root' in CDP response".to_string()))?;

        self.arena.clear();
        self.document_url = root["baseURL"]
            .as_str()
            .or_else(|| root["documentURL"].as_str())
            .filter(|url| !url.is_empty())
            .map(String::from);

        let root_id = self.parse_node(root, None)?;
        self.arena.set_root(root_id)?;

        Ok(root_id)
    }

    /// Recursively parse a CDP node
    fn parse_node(&mut self, cdp_node: &Value, parent_id: Option<NodeId>) -> Result<NodeId> {
        let node_id = cdp_node["nodeId"]
            .as_u64()
            .ok_or_else(|| DomError::CdpError("Missing nodeId".to_string()))?
            as u32;

        let backend_node_id = cdp_node["backendNodeId"]
            .as_u64()
            .ok_or_else(|| DomError::CdpError("Missing backendNodeId".to_string()))?
            as u32;

        let node_type_val = cdp_node["nodeType"]
            .as_u64()
            .ok_or_else(|| DomError::CdpError("Missing nodeType".to_string()))?
            as u8;

        let node_type =
            NodeType::from_u8(node_type_val).ok_or_else(|| DomError::InvalidNodeType {
                expected: "valid NodeType".to_string(),
                actual: format!("{}", node_type_val),
            })?;

        let node_name = cdp_node["nodeName"].as_str().unwrap_or("").to_string();
        let node_value = cdp_node["nodeValue"].as_str().unwrap_or("").to_string();

        // CDP stores attributes as flat array: [name, value, name, value, ...]
        let mut attributes = HashMap::new();
        if let Some(attrs) = cdp_node["attributes"].as_array() {
            for pair in attrs.chunks_exact(2) {
                if let (Some(key), Some(value)) = (pair[0].as_str(), pair[1].as_str()) {
                    attributes.insert(key.to_ascii_lowercase(), value.to_string());
                }
            }
        }

        let mut node = DomNode::new(node_id, backend_node_id, node_type, node_name);
        node.node_value = node_value;
        node.attributes = attributes;
        node.parent_id = parent_id;

        let current_node_id = self.arena.add_node(node);

        if let Some(children) = cdp_node["children"].as_array() {
            let mut child_ids = smallvec::SmallVec::new();

            for child in children {
                let child_id = self.parse_node(child, Some(current_node_id))?;
                child_ids.push(child_id);
            }

            self.arena.get_mut(current_node_id)?.children_ids = child_ids;
        }

        Ok(current_node_id)
    }

    /// Parse an HTML document string and build arena
    ///
    /// Used when no live page is available (files, tests). The tree carries
    /// no rendering data; callers supply geometry separately.
    pub fn parse_html(&mut self, html: &str) -> Result<NodeId> {
        let document = Html::parse_document(html);

        self.arena.clear();
        self.document_url = None;

        let mut next_backend_id = 1;
        let root_id = self.arena.add_node(DomNode::new(
            0,
            next_backend_id,
            NodeType::Document,
            "#document".to_string(),
        ));
        self.arena.set_root(root_id)?;

        let html_id = self.add_scraper_element(document.root_element(), &mut next_backend_id)?;
        self.arena.append_child(root_id, html_id)?;

        Ok(root_id)
    }

    /// Convert a scraper element (and its subtree) into arena nodes
    fn add_scraper_element(&mut self, element: ElementRef, next_backend_id: &mut u32) -> Result<NodeId> {
        *next_backend_id += 1;
        let mut node = DomNode::new(
            0,
            *next_backend_id,
            NodeType::Element,
            element.value().name().to_uppercase(),
        );
        node.attributes = element
            .value()
            .attrs()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
            .collect();

        let node_id = self.arena.add_node(node);

        for child in element.children() {
            match child.value() {
                ScraperNode::Text(text) => {
                    let value: &str = text;
                    *next_backend_id += 1;
                    let mut text_node =
                        DomNode::new(0, *next_backend_id, NodeType::Text, "#text".to_string());
                    text_node.node_value = value.to_string();
                    let text_id = self.arena.add_node(text_node);
                    self.arena.append_child(node_id, text_id)?;
                }
                ScraperNode::Element(_) => {
                    if let Some(child_element) = ElementRef::wrap(child) {
                        let child_id = self.add_scraper_element(child_element, next_backend_id)?;
                        self.arena.append_child(node_id, child_id)?;
                    }
                }
                _ => {}
            }
        }

        Ok(node_id)
    }

    /// Merge layout bounds from DOMSnapshot.captureSnapshot
    ///
    /// Only the `layout.nodeIndex`/`layout.bounds` tables are consumed.
    /// Bounds are reported in device pixels and are scaled back to CSS
    /// pixels with `device_pixel_ratio`. Returns how many nodes were updated.
    pub fn merge_snapshot(&mut self, snapshot: &Value, device_pixel_ratio: f64) -> Result<usize> {
        let documents = snapshot["documents"]
            .as_array()
            .ok_or_else(|| DomError::CdpError("Missing 'documents' in snapshot".to_string()))?;

        let ratio = if device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        let mut merged = 0;

        for document in documents {
            let backend_ids = document["nodes"]["backendNodeId"]
                .as_array()
                .ok_or_else(|| DomError::CdpError("Missing 'nodes.backendNodeId'".to_string()))?;
            let (Some(node_index), Some(bounds)) = (
                document["layout"]["nodeIndex"].as_array(),
                document["layout"]["bounds"].as_array(),
            ) else {
                continue;
            };

            for (index, rect) in node_index.iter().zip(bounds) {
                let Some(backend_id) = index
                    .as_u64()
                    .and_then(|i| backend_ids.get(i as usize))
                    .and_then(Value::as_u64)
                else {
                    continue;
                };
                let Some(node_id) = self.arena.get_node_id_by_backend(backend_id as u32) else {
                    continue;
                };
                let values: Vec<f64> = rect
                    .as_array()
                    .map(|a| a.iter().filter_map(Value::as_f64).map(|v| v / ratio).collect())
                    .unwrap_or_default();
                if let Some(rect) = DomRect::from_slice(&values) {
                    self.arena.get_mut(node_id)?.snapshot_mut().bounds = Some(rect);
                    merged += 1;
                }
            }
        }

        Ok(merged)
    }

    /// Attach natural image sizes, listed in document order of `<img>` elements
    ///
    /// Extra entries on either side are ignored. Returns how many images were updated.
    pub fn merge_natural_sizes(&mut self, sizes: &[NaturalSize]) -> Result<usize> {
        let images = self.arena.find_by_tag("img");
        let mut merged = 0;

        for (&image_id, size) in images.iter().zip(sizes) {
            self.arena.get_mut(image_id)?.snapshot_mut().natural_size = Some(*size);
            merged += 1;
        }

        Ok(merged)
    }
}

impl Default for DomService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cdp_document() -> Value {
        serde_json::json!({
            "root": {
                "nodeId": 1,
                "backendNodeId": 1,
                "nodeType": 9,
                "nodeName": "#document",
                "nodeValue": "",
                "documentURL": "https://news.test/story",
                "baseURL": "https://news.test/",
                "children": [{
                    "nodeId": 2,
                    "backendNodeId": 2,
                    "nodeType": 1,
                    "nodeName": "HTML",
                    "nodeValue": "",
                    "attributes": [],
                    "children": [{
                        "nodeId": 3,
                        "backendNodeId": 3,
                        "nodeType": 1,
                        "nodeName": "IMG",
                        "nodeValue": "",
                        "attributes": ["src", "a.png", "ID", "hero"]
                    }, {
                        "nodeId": 4,
                        "backendNodeId": 4,
                        "nodeType": 3,
                        "nodeName": "#text",
                        "nodeValue": "Hello"
                    }]
                }]
            }
        })
    }

    #[test]
    fn test_parse_simple_dom() {
        let mut service = DomService::new();
        let root_id = service.parse_cdp_dom_tree(&cdp_document()).unwrap();

        assert_eq!(root_id, 0);
        assert_eq!(service.arena().len(), 4);
        assert_eq!(service.document_url(), Some("https://news.test/"));

        let img = service.arena().find_by_id("hero").unwrap();
        assert_eq!(service.arena().get(img).unwrap().attr("src"), Some("a.png"));
        assert_eq!(service.arena().get(img).unwrap().parent_id, Some(1));
    }

    #[test]
    fn test_parse_rejects_missing_root() {
        let mut service = DomService::new();
        let err = service
            .parse_cdp_dom_tree(&serde_json::json!({ "nodes": [] }))
            .unwrap_err();
        assert!(matches!(err, DomError::CdpError(_)));
    }

    #[test]
    fn test_parse_html_builds_full_document() {
        let mut service = DomService::new();
        service
            .parse_html("<title>T</title><p class='lead'>Hi <a href='/x'>there</a></p>")
            .unwrap();
        let arena = service.arena();

        assert!(arena.root().unwrap().node_type == NodeType::Document);
        assert!(arena.body().is_some());
        assert_eq!(arena.find_by_tag("title").len(), 1);

        let p = arena.find_by_tag("p")[0];
        let p_node = arena.get(p).unwrap();
        assert_eq!(p_node.node_name, "P");
        assert!(p_node.has_class("lead"));
        assert_eq!(p_node.children_ids.len(), 2);
    }

    #[test]
    fn test_merge_snapshot_scales_bounds() {
        let mut service = DomService::new();
        service.parse_cdp_dom_tree(&cdp_document()).unwrap();

        let snapshot = serde_json::json!({
            "documents": [{
                "nodes": { "backendNodeId": [1, 2, 3, 4] },
                "layout": {
                    "nodeIndex": [1, 2],
                    "bounds": [[0, 0, 1600, 2400], [10, 20, 400, 300]]
                }
            }],
            "strings": []
        });

        let merged = service.merge_snapshot(&snapshot, 2.0).unwrap();
        assert_eq!(merged, 2);

        let img = service.arena().find_by_id("hero").unwrap();
        assert_eq!(
            service.arena().get(img).unwrap().bounds(),
            Some(DomRect::new(5.0, 10.0, 200.0, 150.0))
        );
    }

    #[test]
    fn test_merge_natural_sizes_in_document_order() {
        let mut service = DomService::new();
        service
            .parse_html("<img id='a' src='a.png'><p><img id='b' src='b.png'></p>")
            .unwrap();

        let merged = service
            .merge_natural_sizes(&[
                NaturalSize::new(640.0, 480.0),
                NaturalSize::new(1.0, 1.0),
                NaturalSize::new(9.0, 9.0),
            ])
            .unwrap();
        assert_eq!(merged, 2);

        let arena = service.arena();
        let b = arena.find_by_id("b").unwrap();
        assert_eq!(
            arena.get(b).unwrap().natural_size(),
            Some(NaturalSize::new(1.0, 1.0))
        );
    }
}
