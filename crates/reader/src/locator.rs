//! Container Locator - finds the subtree holding the article body
//!
//! Three stages, strict priority:
//!
//! 1. **Selector cascade**: first match of each configured selector, in
//!    order; accepted when it has enough text and is not a listing page.
//! 2. **Density fallback**: score every block container by paragraph count
//!    and text length, damped when links outnumber paragraphs.
//! 3. **Final fallback**: `<body>` (or whatever root element exists).
//!
//! `locate` is total. Every document yields some container.

use dom::{utils, NodeId};

use crate::config::ReaderConfig;
use crate::document::Document;
use crate::geometry::Geometry;
use crate::rules::Rules;

/// Which stage produced the container
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocateStage {
    /// Index into the selector cascade
    Selector(usize),
    /// Winning density score
    Density(f64),
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Located {
    pub node_id: NodeId,
    pub stage: LocateStage,
}

pub struct Locator<'a> {
    config: &'a ReaderConfig,
    rules: &'a Rules,
}

impl<'a> Locator<'a> {
    pub fn new(config: &'a ReaderConfig, rules: &'a Rules) -> Self {
        Self { config, rules }
    }

    pub fn locate(&self, doc: &Document, geometry: &dyn Geometry) -> Located {
        let located = self
            .by_selector(doc)
            .or_else(|| self.by_density(doc, geometry))
            .unwrap_or_else(|| Located {
                node_id: Self::fallback(doc),
                stage: LocateStage::Fallback,
            });

        tracing::debug!(
            stage = ?located.stage,
            xpath = %utils::generate_xpath(doc.arena(), located.node_id).unwrap_or_default(),
            "located article container"
        );

        located
    }

    /// Stage A: selector cascade; order is precedence, not quality
    fn by_selector(&self, doc: &Document) -> Option<Located> {
        let arena = doc.arena();

        for (index, selector) in self.rules.containers.iter().enumerate() {
            let Some(node_id) = arena.query_selector(selector) else {
                continue;
            };

            let text_len = doc.inner_text(node_id).chars().count();
            if text_len <= self.config.min_container_text {
                continue;
            }

            let nested = arena
                .query_selector_all(node_id, &self.rules.nested_articles)
                .len();
            if nested > self.config.max_nested_articles {
                tracing::debug!(
                    selector = %selector,
                    nested,
                    "skipping listing-like container"
                );
                continue;
            }

            return Some(Located {
                node_id,
                stage: LocateStage::Selector(index),
            });
        }

        None
    }

    /// Stage B: highest density score; ties keep the earliest container
    fn by_density(&self, doc: &Document, geometry: &dyn Geometry) -> Option<Located> {
        let mut best: Option<NodeId> = None;
        let mut max_score = -1.0;

        for node_id in doc.arena().select(&self.rules.density_candidates) {
            let Some(score) = self.density_score(doc, geometry, node_id) else {
                continue;
            };
            if score > max_score {
                max_score = score;
                best = Some(node_id);
            }
        }

        best.map(|node_id| Located {
            node_id,
            stage: LocateStage::Density(max_score),
        })
    }

    /// Score for one candidate, or `None` if it is disqualified
    pub fn density_score(&self, doc: &Document, geometry: &dyn Geometry, node_id: NodeId) -> Option<f64> {
        let arena = doc.arena();
        let node = arena.get(node_id).ok()?;

        if self.rules.denylisted(&utils::id_and_class(node)).is_some() {
            return None;
        }

        let landmarks = &self.rules.landmarks;
        if arena.closest_matching(node_id, landmarks).is_some() && !landmarks.matches(arena, node_id) {
            return None;
        }

        if geometry.client_height(arena, node_id) < self.config.min_container_height {
            return None;
        }

        let descendants = arena.descendants(node_id);
        let count_tag = |tag: &str| {
            descendants
                .iter()
                .filter(|&&id| arena.get(id).is_ok_and(|n| n.has_tag(tag)))
                .count()
        };

        let p_count = count_tag("p");
        if p_count < self.config.min_paragraphs {
            return None;
        }
        let link_count = count_tag("a");
        let text_len = doc.inner_text(node_id).chars().count();

        let mut score = (p_count as f64 * 20.0) + (text_len as f64 / 10.0);
        if link_count > p_count {
            score /= (link_count - p_count + 1) as f64;
        }

        Some(score)
    }

    /// Stage C: body, else root element, else the document itself
    fn fallback(doc: &Document) -> NodeId {
        let arena = doc.arena();
        arena
            .body()
            .or_else(|| arena.document_element())
            .unwrap_or_else(|| doc.root_id())
    }
}
