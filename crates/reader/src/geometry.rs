//! Rendering geometry as an injected capability
//!
//! Container scoring and image filtering depend on layout (rendered
//! height, rendered width, intrinsic image size). The pipeline asks a
//! [`Geometry`] provider instead of reading a layout engine directly, so
//! the heuristics run the same against a live snapshot or synthetic numbers.

use ahash::AHashMap;
use dom::{DomArena, NaturalSize, NodeId};

/// Provider of rendered metrics for source nodes
///
/// Unknown metrics are reported as `0.0`, matching what a browser reports
/// for detached or not-yet-loaded elements.
pub trait Geometry {
    /// Rendered height in CSS pixels (`clientHeight`)
    fn client_height(&self, arena: &DomArena, node_id: NodeId) -> f64;

    /// Rendered width in CSS pixels (`offsetWidth`)
    fn offset_width(&self, arena: &DomArena, node_id: NodeId) -> f64;

    /// Intrinsic image size (`naturalWidth`/`naturalHeight`)
    fn natural_size(&self, arena: &DomArena, node_id: NodeId) -> NaturalSize;
}

/// Geometry read from snapshot data merged into the arena
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotGeometry;

impl Geometry for SnapshotGeometry {
    fn client_height(&self, arena: &DomArena, node_id: NodeId) -> f64 {
        arena
            .get(node_id)
            .ok()
            .and_then(|node| node.bounds())
            .map(|rect| rect.height)
            .unwrap_or(0.0)
    }

    fn offset_width(&self, arena: &DomArena, node_id: NodeId) -> f64 {
        arena
            .get(node_id)
            .ok()
            .and_then(|node| node.bounds())
            .map(|rect| rect.width)
            .unwrap_or(0.0)
    }

    fn natural_size(&self, arena: &DomArena, node_id: NodeId) -> NaturalSize {
        arena
            .get(node_id)
            .ok()
            .and_then(|node| node.natural_size())
            .unwrap_or(NaturalSize::new(0.0, 0.0))
    }
}

/// Metrics for one node in a [`StaticGeometry`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodeMetrics {
    pub height: f64,
    pub width: f64,
    pub natural_width: f64,
    pub natural_height: f64,
}

/// Geometry from an explicit table, keyed by node id
///
/// Handy for tests and for hosts that measure nodes themselves.
#[derive(Debug, Clone, Default)]
pub struct StaticGeometry {
    metrics: AHashMap<NodeId, NodeMetrics>,
}

impl StaticGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, node_id: NodeId, metrics: NodeMetrics) -> &mut Self {
        self.metrics.insert(node_id, metrics);
        self
    }

    /// Set the rendered box of a node
    pub fn set_box(&mut self, node_id: NodeId, width: f64, height: f64) -> &mut Self {
        let entry = self.metrics.entry(node_id).or_default();
        entry.width = width;
        entry.height = height;
        self
    }

    /// Set the intrinsic size of an image
    pub fn set_natural(&mut self, node_id: NodeId, width: f64, height: f64) -> &mut Self {
        let entry = self.metrics.entry(node_id).or_default();
        entry.natural_width = width;
        entry.natural_height = height;
        self
    }

    fn metrics(&self, node_id: NodeId) -> NodeMetrics {
        self.metrics.get(&node_id).copied().unwrap_or_default()
    }
}

impl Geometry for StaticGeometry {
    fn client_height(&self, _arena: &DomArena, node_id: NodeId) -> f64 {
        self.metrics(node_id).height
    }

    fn offset_width(&self, _arena: &DomArena, node_id: NodeId) -> f64 {
        self.metrics(node_id).width
    }

    fn natural_size(&self, _arena: &DomArena, node_id: NodeId) -> NaturalSize {
        let m = self.metrics(node_id);
        NaturalSize::new(m.natural_width, m.natural_height)
    }
}
