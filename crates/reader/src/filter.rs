//! Node Filter - keep/drop decisions for content nodes in the container
//!
//! Junk markers are checked on the node *and* all its ancestors: sites put
//! `aria-hidden` or `.sr-only` on wrappers at least as often as on leaves.
//! Images get a second pass against live geometry of the source node.

use dom::NodeId;

use crate::config::ReaderConfig;
use crate::document::Document;
use crate::geometry::Geometry;
use crate::rules::Rules;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DropReason {
    /// The node or the ancestor `marker` matched a junk selector
    Junk { marker: NodeId },
    /// Image without a usable `src`
    MissingSource,
    /// Image smaller than the natural size threshold
    TooSmall { width: f64, height: f64 },
    /// Image rendered narrower than the width threshold
    TooNarrow { width: f64 },
    /// Image inside an advertisement container
    Advertisement { marker: NodeId },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    Keep,
    Drop(DropReason),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub node_id: NodeId,
    pub verdict: Verdict,
}

impl Decision {
    pub fn is_kept(&self) -> bool {
        self.verdict == Verdict::Keep
    }
}

pub struct NodeFilter<'a> {
    config: &'a ReaderConfig,
    rules: &'a Rules,
}

impl<'a> NodeFilter<'a> {
    pub fn new(config: &'a ReaderConfig, rules: &'a Rules) -> Self {
        Self { config, rules }
    }

    /// Decisions for every content node under `container`, in document order
    pub fn classify(&self, doc: &Document, container: NodeId, geometry: &dyn Geometry) -> Vec<Decision> {
        let arena = doc.arena();
        let decisions: Vec<Decision> = arena
            .descendants(container)
            .into_iter()
            .filter(|&id| arena.get(id).is_ok_and(|node| self.rules.is_content_node(node)))
            .map(|node_id| Decision {
                node_id,
                verdict: self.verdict(doc, node_id, geometry),
            })
            .collect();

        let kept = decisions.iter().filter(|d| d.is_kept()).count();
        tracing::debug!(
            kept,
            dropped = decisions.len() - kept,
            "filtered content nodes"
        );

        decisions
    }

    /// Decide a single node
    pub fn verdict(&self, doc: &Document, node_id: NodeId, geometry: &dyn Geometry) -> Verdict {
        let arena = doc.arena();

        if let Some(marker) = arena.closest_matching(node_id, &self.rules.junk) {
            return Verdict::Drop(DropReason::Junk { marker });
        }

        let is_image = arena.get(node_id).is_ok_and(|node| node.has_tag("img"));
        if is_image {
            if let Some(reason) = self.image_drop_reason(doc, node_id, geometry) {
                return Verdict::Drop(reason);
            }
        }

        Verdict::Keep
    }

    /// Tracking pixels, icons and spacers; checked on the source node
    fn image_drop_reason(&self, doc: &Document, node_id: NodeId, geometry: &dyn Geometry) -> Option<DropReason> {
        let arena = doc.arena();
        let has_source = arena
            .get(node_id)
            .ok()
            .and_then(|node| node.attr("src"))
            .is_some_and(|src| !src.is_empty());
        if !has_source {
            return Some(DropReason::MissingSource);
        }

        let natural = geometry.natural_size(arena, node_id);
        let min_natural = self.config.min_image_natural_size;
        if natural.width < min_natural || natural.height < min_natural {
            return Some(DropReason::TooSmall {
                width: natural.width,
                height: natural.height,
            });
        }

        let width = geometry.offset_width(arena, node_id);
        if width < self.config.min_image_rendered_width {
            return Some(DropReason::TooNarrow { width });
        }

        arena
            .closest_matching(node_id, &self.rules.ads)
            .map(|marker| DropReason::Advertisement { marker })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::StaticGeometry;

    fn classify(doc: &Document, geometry: &StaticGeometry) -> Vec<Decision> {
        let config = ReaderConfig::default();
        let rules = Rules::compile(&config).unwrap();
        let container = doc.element_by_id("c").unwrap();
        NodeFilter::new(&config, &rules).classify(doc, container, geometry)
    }

    fn verdict_of(decisions: &[Decision], node_id: NodeId) -> Verdict {
        decisions
            .iter()
            .find(|d| d.node_id == node_id)
            .map(|d| d.verdict)
            .unwrap()
    }

    #[test]
    fn test_enumerates_content_tags_in_order() {
        let doc = Document::from_html(
            "<div id='c'><h1>T</h1><p id='a'>a</p><div><h3 id='b'>b</h3></div>\
             <span>s</span><blockquote id='q'><p id='qp'>q</p></blockquote></div>",
        )
        .unwrap();

        let ids: Vec<NodeId> = classify(&doc, &StaticGeometry::new())
            .iter()
            .map(|d| d.node_id)
            .collect();
        let expected: Vec<NodeId> = ["a", "b", "q", "qp"]
            .iter()
            .map(|id| doc.element_by_id(id).unwrap())
            .collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_hidden_ancestor_drops_plain_node() {
        let doc = Document::from_html(
            "<div id='c'><div aria-hidden='true' id='h'><section><p id='p1'>x</p></section></div>\
             <div class='sr-only'><p id='p2'>y</p></div><p id='p3'>z</p></div>",
        )
        .unwrap();
        let decisions = classify(&doc, &StaticGeometry::new());

        let hidden = doc.element_by_id("h").unwrap();
        assert_eq!(
            verdict_of(&decisions, doc.element_by_id("p1").unwrap()),
            Verdict::Drop(DropReason::Junk { marker: hidden })
        );
        assert!(matches!(
            verdict_of(&decisions, doc.element_by_id("p2").unwrap()),
            Verdict::Drop(DropReason::Junk { .. })
        ));
        assert_eq!(verdict_of(&decisions, doc.element_by_id("p3").unwrap()), Verdict::Keep);
    }

    #[test]
    fn test_junk_marker_on_node_itself() {
        let doc = Document::from_html(
            "<div id='c'><p class='social-links' id='s'>share</p><footer><p id='f'>f</p></footer></div>",
        )
        .unwrap();
        let decisions = classify(&doc, &StaticGeometry::new());

        let s = doc.element_by_id("s").unwrap();
        assert_eq!(verdict_of(&decisions, s), Verdict::Drop(DropReason::Junk { marker: s }));
        assert_ne!(verdict_of(&decisions, doc.element_by_id("f").unwrap()), Verdict::Keep);
    }

    #[test]
    fn test_image_size_rules() {
        let doc = Document::from_html(
            "<div id='c'><img id='big' src='big.jpg'><img id='icon' src='icon.png'>\
             <img id='narrow' src='n.jpg'><img id='nosrc'><img id='empty' src=''></div>",
        )
        .unwrap();
        let id = |name: &str| doc.element_by_id(name).unwrap();

        let mut geometry = StaticGeometry::new();
        geometry.set_natural(id("big"), 200.0, 200.0).set_box(id("big"), 200.0, 200.0);
        geometry.set_natural(id("icon"), 50.0, 50.0).set_box(id("icon"), 50.0, 50.0);
        geometry.set_natural(id("narrow"), 800.0, 600.0).set_box(id("narrow"), 40.0, 30.0);
        geometry.set_natural(id("nosrc"), 800.0, 600.0).set_box(id("nosrc"), 800.0, 600.0);

        let decisions = classify(&doc, &geometry);
        assert_eq!(verdict_of(&decisions, id("big")), Verdict::Keep);
        assert_eq!(
            verdict_of(&decisions, id("icon")),
            Verdict::Drop(DropReason::TooSmall { width: 50.0, height: 50.0 })
        );
        assert_eq!(
            verdict_of(&decisions, id("narrow")),
            Verdict::Drop(DropReason::TooNarrow { width: 40.0 })
        );
        assert_eq!(
            verdict_of(&decisions, id("nosrc")),
            Verdict::Drop(DropReason::MissingSource)
        );
        assert_eq!(
            verdict_of(&decisions, id("empty")),
            Verdict::Drop(DropReason::MissingSource)
        );
    }

    #[test]
    fn test_advertisement_wrapper_drops_image() {
        let doc = Document::from_html(
            "<div id='c'><div class='ad'><img id='i' src='promo.jpg'></div></div>",
        )
        .unwrap();
        let img = doc.element_by_id("i").unwrap();
        let mut geometry = StaticGeometry::new();
        geometry.set_natural(img, 600.0, 400.0).set_box(img, 600.0, 400.0);

        // `.ad` is also a junk marker, so the generic check fires first.
        let decisions = classify(&doc, &geometry);
        assert!(matches!(
            verdict_of(&decisions, img),
            Verdict::Drop(DropReason::Junk { .. })
        ));
    }

    #[test]
    fn test_ad_rule_applies_when_not_junk() {
        let config = ReaderConfig {
            junk_selectors: ".sr-only".to_string(),
            ad_selectors: ".sponsor".to_string(),
            ..Default::default()
        };
        let rules = Rules::compile(&config).unwrap();
        let doc = Document::from_html(
            "<div id='c'><div class='sponsor' id='s'><img id='i' src='promo.jpg'></div></div>",
        )
        .unwrap();
        let img = doc.element_by_id("i").unwrap();
        let mut geometry = StaticGeometry::new();
        geometry.set_natural(img, 600.0, 400.0).set_box(img, 600.0, 400.0);

        let verdict = NodeFilter::new(&config, &rules).verdict(&doc, img, &geometry);
        assert_eq!(
            verdict,
            Verdict::Drop(DropReason::Advertisement {
                marker: doc.element_by_id("s").unwrap()
            })
        );
    }
}
