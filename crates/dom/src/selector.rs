//! CSS selector matching over the arena
//!
//! Selector strings are parsed by the `selectors` crate with scraper's
//! selector implementation, so rule tables accept full CSS: combinators,
//! `:not()`, `:is()`, attribute operators and quoted values. Matching runs
//! against [`ArenaElement`], a borrowed element handle into a [`DomArena`].
//!
//! Pseudo-classes that depend on live state (`:hover`, `:visited`) never
//! match; the tree is a snapshot.

use std::fmt;
use std::str::FromStr;

use cssparser::ParserInput;
use scraper::selector::{CssLocalName, CssString, NonTSPseudoClass, PseudoElement, Simple};
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::bloom::BloomFilter;
use selectors::matching::{self, ElementSelectorFlags, MatchingContext};
use selectors::parser::{self, ParseRelative, SelectorImpl};
use selectors::{Element, OpaqueElement};

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId, NodeType};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Parsed comma-separated selector group; matches if any member matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    source: String,
    selectors: parser::SelectorList<Simple>,
}

impl SelectorList {
    /// Whether the element at `node_id` matches; false for non-elements
    pub fn matches(&self, arena: &DomArena, node_id: NodeId) -> bool {
        let Some(element) = ArenaElement::new(arena, node_id) else {
            return false;
        };

        let mut caches = matching::SelectorCaches::default();
        let mut context = MatchingContext::new(
            matching::MatchingMode::Normal,
            None,
            &mut caches,
            matching::QuirksMode::NoQuirks,
            matching::NeedsSelectorFlags::No,
            matching::MatchingForInvalidation::No,
        );

        self.selectors
            .slice()
            .iter()
            .any(|selector| matching::matches_selector(selector, 0, None, &element, &mut context))
    }

    /// Selector text as configured
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for SelectorList {
    type Err = DomError;

    fn from_str(source: &str) -> Result<Self> {
        let mut input = ParserInput::new(source);
        let mut css = cssparser::Parser::new(&mut input);

        let selectors = parser::SelectorList::parse(&scraper::selector::Parser, &mut css, ParseRelative::No)
            .map_err(|e| DomError::InvalidSelector {
                selector: source.to_string(),
                reason: format!("{:?}", e.kind),
            })?;

        Ok(Self {
            source: source.trim().to_string(),
            selectors,
        })
    }
}

/// Element node borrowed from an arena, as seen by the selector matcher
#[derive(Clone, Copy)]
pub struct ArenaElement<'a> {
    arena: &'a DomArena,
    id: NodeId,
    node: &'a DomNode,
}

impl<'a> ArenaElement<'a> {
    /// `None` unless `node_id` is an element
    pub fn new(arena: &'a DomArena, id: NodeId) -> Option<Self> {
        let node = arena.get(id).ok()?;
        node.is_element().then_some(Self { arena, id, node })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node(&self) -> &'a DomNode {
        self.node
    }

    fn parent_node(&self) -> Option<&'a DomNode> {
        self.node.parent_id.and_then(|id| self.arena.get(id).ok())
    }

    fn siblings(&self) -> &'a [NodeId] {
        self.parent_node()
            .map(|parent| parent.children_ids.as_slice())
            .unwrap_or(&[])
    }

    fn element(&self, id: NodeId) -> Option<Self> {
        Self::new(self.arena, id)
    }
}

impl fmt::Debug for ArenaElement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaElement")
            .field("id", &self.id)
            .field("tag", &self.node.node_name)
            .finish()
    }
}

impl Element for ArenaElement<'_> {
    type Impl = Simple;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(self.node)
    }

    fn parent_element(&self) -> Option<Self> {
        self.node.parent_id.and_then(|id| self.element(id))
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        let siblings = self.siblings();
        let position = siblings.iter().position(|&id| id == self.id)?;
        siblings[..position]
            .iter()
            .rev()
            .find_map(|&id| self.element(id))
    }

    fn next_sibling_element(&self) -> Option<Self> {
        let siblings = self.siblings();
        let position = siblings.iter().position(|&id| id == self.id)?;
        siblings[position + 1..]
            .iter()
            .find_map(|&id| self.element(id))
    }

    fn first_element_child(&self) -> Option<Self> {
        self.node
            .children_ids
            .iter()
            .find_map(|&id| self.element(id))
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(&self, name: &CssLocalName) -> bool {
        self.node.has_tag(&name.0)
    }

    fn has_namespace(&self, namespace: &<Simple as SelectorImpl>::BorrowedNamespaceUrl) -> bool {
        &**namespace == HTML_NAMESPACE
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.node.node_name.eq_ignore_ascii_case(&other.node.node_name)
    }

    fn attr_matches(
        &self,
        namespace: &NamespaceConstraint<&<Simple as SelectorImpl>::NamespaceUrl>,
        local_name: &CssLocalName,
        operation: &AttrSelectorOperation<&CssString>,
    ) -> bool {
        // Attributes are stored without a namespace
        if let NamespaceConstraint::Specific(url) = namespace {
            if !url.is_empty() {
                return false;
            }
        }

        self.node
            .attributes
            .iter()
            .any(|(name, value)| name.eq_ignore_ascii_case(&local_name.0) && operation.eval_str(value))
    }

    fn match_non_ts_pseudo_class(
        &self,
        _pc: &NonTSPseudoClass,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        false
    }

    fn match_pseudo_element(
        &self,
        _pe: &PseudoElement,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        false
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn is_link(&self) -> bool {
        (self.node.has_tag("a") || self.node.has_tag("area")) && self.node.attr("href").is_some()
    }

    fn is_html_slot_element(&self) -> bool {
        self.node.has_tag("slot")
    }

    fn has_id(&self, id: &CssLocalName, case_sensitivity: CaseSensitivity) -> bool {
        self.node
            .attr("id")
            .is_some_and(|value| case_sensitivity.eq(id.0.as_bytes(), value.as_bytes()))
    }

    fn has_class(&self, name: &CssLocalName, case_sensitivity: CaseSensitivity) -> bool {
        self.node
            .classes()
            .any(|class| case_sensitivity.eq(name.0.as_bytes(), class.as_bytes()))
    }

    fn has_custom_state(&self, _name: &CssLocalName) -> bool {
        false
    }

    fn imported_part(&self, _name: &CssLocalName) -> Option<CssLocalName> {
        None
    }

    fn is_part(&self, _name: &CssLocalName) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        !self.node.children_ids.iter().any(|&id| {
            self.arena
                .get(id)
                .is_ok_and(|child| child.is_element() || (child.is_text() && !child.node_value.is_empty()))
        })
    }

    fn is_root(&self) -> bool {
        match self.parent_node() {
            Some(parent) => parent.node_type == NodeType::Document,
            None => self.node.has_tag("html"),
        }
    }

    fn add_element_unique_hashes(&self, _filter: &mut BloomFilter) -> bool {
        false
    }
}

impl DomArena {
    /// First element in the whole document matching `selectors`
    pub fn query_selector(&self, selectors: &SelectorList) -> Option<NodeId> {
        self.document_order()
            .into_iter()
            .find(|&id| selectors.matches(self, id))
    }

    /// Every element in the document matching `selectors`, in document order
    pub fn select(&self, selectors: &SelectorList) -> Vec<NodeId> {
        self.document_order()
            .into_iter()
            .filter(|&id| selectors.matches(self, id))
            .collect()
    }

    /// Every descendant of `scope` (excluding `scope`) matching `selectors`
    ///
    /// Combinators may reach above `scope`, as in DOM `querySelectorAll`.
    pub fn query_selector_all(&self, scope: NodeId, selectors: &SelectorList) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&id| selectors.matches(self, id))
            .collect()
    }

    /// Self-inclusive nearest ancestor matching `selectors`
    pub fn closest_matching(&self, node_id: NodeId, selectors: &SelectorList) -> Option<NodeId> {
        std::iter::once(node_id)
            .chain(self.ancestors(node_id))
            .find(|&id| selectors.matches(self, id))
    }
}
