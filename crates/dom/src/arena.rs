//! Arena-based DOM tree storage
//!
//! Nodes live in one `Vec` and refer to each other by `u32` index:
//!
//! ```text
//! Arena: Vec<DomNode>
//!        [Node0][Node1][Node2]...
//!         ↑ parent_id / children_ids are indices, not pointers
//! ```
//!
//! Parent links make upward queries (`closest`, `ancestors`) as cheap as
//! downward ones, which the extraction heuristics lean on heavily.

use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId, NodeType};
use ahash::AHashMap;

/// Arena allocator for DOM nodes
///
/// Design:
/// - Single Vec<DomNode> for sequential allocation
/// - HashMap for backend_node_id → NodeId lookup (CDP uses backend IDs)
/// - No Rc/Arc: use indices everywhere
#[derive(Debug)]
pub struct DomArena {
    /// All nodes stored sequentially (cache-friendly)
    nodes: Vec<DomNode>,

    /// Backend node ID → NodeId lookup (for CDP integration)
    backend_id_map: AHashMap<u32, NodeId>,

    /// Root node ID (if set)
    root_id: Option<NodeId>,
}

impl DomArena {
    /// Create a new empty arena
    pub fn new() -> Self {
        Self {
            nodes: Vec::with_capacity(1024), // Pre-allocate for typical page
            backend_id_map: AHashMap::with_capacity(1024),
            root_id: None,
        }
    }

    /// Create arena with specific capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            backend_id_map: AHashMap::with_capacity(capacity),
            root_id: None,
        }
    }

    /// Add a node to the arena, returns its ID
    ///
    /// The stored node's `node_id` is rewritten to its arena index.
    pub fn add_node(&mut self, mut node: DomNode) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        node.node_id = node_id;
        self.backend_id_map.insert(node.backend_node_id, node_id);
        self.nodes.push(node);
        node_id
    }

    /// Link `child` as the last child of `parent`
    pub fn append_child(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<()> {
        self.get(child_id)?;
        self.get_mut(parent_id)?.children_ids.push(child_id);
        self.get_mut(child_id)?.parent_id = Some(parent_id);
        Ok(())
    }

    /// Get node by ID (immutable)
    pub fn get(&self, node_id: NodeId) -> Result<&DomNode> {
        self.nodes
            .get(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by ID (mutable)
    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        self.nodes
            .get_mut(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by backend node ID (from CDP)
    pub fn get_by_backend_id(&self, backend_id: u32) -> Result<&DomNode> {
        let node_id = self
            .backend_id_map
            .get(&backend_id)
            .ok_or(DomError::NodeNotFound(backend_id))?;
        self.get(*node_id)
    }

    /// Get node ID by backend node ID
    pub fn get_node_id_by_backend(&self, backend_id: u32) -> Option<NodeId> {
        self.backend_id_map.get(&backend_id).copied()
    }

    /// Set root node
    pub fn set_root(&mut self, node_id: NodeId) -> Result<()> {
        // Verify node exists
        self.get(node_id)?;
        self.root_id = Some(node_id);
        Ok(())
    }

    /// Get root node ID
    pub fn root_id(&self) -> Option<NodeId> {
        self.root_id
    }

    /// Get root node
    pub fn root(&self) -> Result<&DomNode> {
        let root_id = self
            .root_id
            .ok_or_else(|| DomError::CdpError("No root node set".to_string()))?;
        self.get(root_id)
    }

    /// Total number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if arena is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterator over all nodes (storage order)
    pub fn iter(&self) -> impl Iterator<Item = &DomNode> {
        self.nodes.iter()
    }

    /// Iterator over all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(|i| i as NodeId)
    }

    /// Get children of a node
    pub fn children(&self, node_id: NodeId) -> Result<Vec<&DomNode>> {
        let node = self.get(node_id)?;
        node.children_ids
            .iter()
            .map(|&child_id| self.get(child_id))
            .collect()
    }

    /// Get parent of a node
    pub fn parent(&self, node_id: NodeId) -> Result<Option<&DomNode>> {
        let node = self.get(node_id)?;
        match node.parent_id {
            Some(parent_id) => Ok(Some(self.get(parent_id)?)),
            None => Ok(None),
        }
    }

    /// Traverse tree depth-first (iterative, no recursion)
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&DomNode) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node)?;

            // Push children in reverse order (so they're visited left-to-right)
            for &child_id in node.children_ids.iter().rev() {
                stack.push(child_id);
            }
        }

        Ok(())
    }

    /// All descendants of `start_id` in document order, excluding `start_id`
    pub fn descendants(&self, start_id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match self.nodes.get(start_id as usize) {
            Some(node) => node.children_ids.iter().rev().copied().collect(),
            None => return out,
        };

        while let Some(node_id) = stack.pop() {
            let Some(node) = self.nodes.get(node_id as usize) else {
                continue;
            };
            out.push(node_id);
            stack.extend(node.children_ids.iter().rev().copied());
        }

        out
    }

    /// Root followed by every descendant, in document order
    pub fn document_order(&self) -> Vec<NodeId> {
        match self.root_id {
            Some(root_id) => {
                let mut ids = vec![root_id];
                ids.extend(self.descendants(root_id));
                ids
            }
            None => self.node_ids().collect(),
        }
    }

    /// Ancestors of a node, nearest first, excluding the node itself
    pub fn ancestors(&self, node_id: NodeId) -> Ancestors<'_> {
        let next = self
            .nodes
            .get(node_id as usize)
            .and_then(|node| node.parent_id);
        Ancestors { arena: self, next }
    }

    /// Nearest node, starting with `node_id` itself, that satisfies `predicate`
    ///
    /// Same semantics as DOM `Element.closest`.
    pub fn closest<F>(&self, node_id: NodeId, predicate: F) -> Option<NodeId>
    where
        F: Fn(&DomNode) -> bool,
    {
        let node = self.nodes.get(node_id as usize)?;
        if predicate(node) {
            return Some(node_id);
        }
        self.ancestors(node_id)
            .find(|&id| self.nodes.get(id as usize).is_some_and(&predicate))
    }

    /// Find nodes matching predicate, in document order
    pub fn find<F>(&self, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&DomNode) -> bool,
    {
        self.document_order()
            .into_iter()
            .filter(|&id| self.nodes.get(id as usize).is_some_and(&predicate))
            .collect()
    }

    /// Find first node matching predicate, in document order
    pub fn find_one<F>(&self, predicate: F) -> Option<NodeId>
    where
        F: Fn(&DomNode) -> bool,
    {
        self.document_order()
            .into_iter()
            .find(|&id| self.nodes.get(id as usize).is_some_and(&predicate))
    }

    /// Find all elements by tag name
    pub fn find_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.find(|node| node.has_tag(tag))
    }

    /// Find element by ID attribute
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.find_one(|node| node.node_type == NodeType::Element && node.attr("id") == Some(id))
    }

    /// The `<body>` element, if present
    pub fn body(&self) -> Option<NodeId> {
        self.find_one(|node| node.has_tag("body"))
    }

    /// The top-level element (`<html>`), if present
    pub fn document_element(&self) -> Option<NodeId> {
        let root = self.root().ok()?;
        if root.is_element() {
            return self.root_id;
        }
        root.children_ids
            .iter()
            .copied()
            .find(|&id| self.nodes.get(id as usize).is_some_and(DomNode::is_element))
    }

    /// Clear arena (reuse allocation)
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.backend_id_map.clear();
        self.root_id = None;
    }
}

impl Default for DomArena {
    fn default() -> Self {
        Self::new()
    }
}

/// Upward walk produced by [`DomArena::ancestors`]
pub struct Ancestors<'a> {
    arena: &'a DomArena,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self
            .arena
            .nodes
            .get(current as usize)
            .and_then(|node| node.parent_id);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(backend_id: u32, name: &str) -> DomNode {
        DomNode::new(0, backend_id, NodeType::Element, name.to_string())
    }

    /// root(div) -> [section -> [p], span]
    fn small_tree() -> (DomArena, [NodeId; 4]) {
        let mut arena = DomArena::new();
        let root = arena.add_node(element(100, "DIV"));
        let section = arena.add_node(element(101, "SECTION"));
        let p = arena.add_node(element(102, "P"));
        let span = arena.add_node(element(103, "SPAN"));

        arena.append_child(root, section).unwrap();
        arena.append_child(section, p).unwrap();
        arena.append_child(root, span).unwrap();
        arena.set_root(root).unwrap();

        (arena, [root, section, p, span])
    }

    #[test]
    fn test_arena_basic() {
        let mut arena = DomArena::new();
        let id = arena.add_node(element(100, "div"));
        assert_eq!(id, 0);

        let retrieved = arena.get(id).unwrap();
        assert_eq!(retrieved.node_name, "div");
        assert_eq!(retrieved.backend_node_id, 100);
        assert!(matches!(arena.get(7), Err(DomError::NodeNotFound(7))));
    }

    #[test]
    fn test_backend_lookup() {
        let (arena, [_, section, _, _]) = small_tree();

        let found = arena.get_by_backend_id(101).unwrap();
        assert_eq!(found.node_name, "SECTION");
        assert_eq!(arena.get_node_id_by_backend(101), Some(section));
    }

    #[test]
    fn test_traverse_df() {
        let (arena, [root, ..]) = small_tree();

        let mut visited = Vec::new();
        arena
            .traverse_df(root, |node| {
                visited.push(node.node_name.clone());
                Ok(())
            })
            .unwrap();

        assert_eq!(visited, vec!["DIV", "SECTION", "P", "SPAN"]);
    }

    #[test]
    fn test_descendants_in_document_order() {
        let (arena, [root, section, p, span]) = small_tree();
        assert_eq!(arena.descendants(root), vec![section, p, span]);
        assert_eq!(arena.descendants(p), Vec::<NodeId>::new());
    }

    #[test]
    fn test_ancestors_and_closest() {
        let (arena, [root, section, p, _]) = small_tree();

        assert_eq!(arena.ancestors(p).collect::<Vec<_>>(), vec![section, root]);
        assert_eq!(arena.closest(p, |n| n.has_tag("p")), Some(p));
        assert_eq!(arena.closest(p, |n| n.has_tag("div")), Some(root));
        assert_eq!(arena.closest(p, |n| n.has_tag("article")), None);
    }

    #[test]
    fn test_find_by_tag_is_case_insensitive() {
        let (arena, [_, _, p, _]) = small_tree();
        assert_eq!(arena.find_by_tag("p"), vec![p]);
        assert_eq!(arena.document_element(), arena.root_id());
    }
}
