use std::collections::HashSet;

use eframe::egui::Vec2;

use crate::kg::GraphSnapshot;

/// Hover recomputation is coalesced to at most one per window; the last
/// submission inside a window wins.
pub const HOVER_WINDOW_SECS: f64 = 0.1;
/// 2D recenter-and-zoom duration.
pub const FOCUS_MOVE_SECS: f64 = 1.0;
/// Settle delay after the move completes, before the synthetic re-hover.
pub const FOCUS_SETTLE_SECS: f64 = 1.0;
pub const FOCUS_ZOOM: f32 = 1.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Element {
    Node(usize),
    Link(usize),
}

/// The transient active-element pair. Replaced wholesale on every hover,
/// click, or focus event; never patched in place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HighlightSet {
    pub nodes: HashSet<usize>,
    pub links: HashSet<usize>,
}

impl HighlightSet {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }
}

/// Linked context handed to the details panel on click-selection.
#[derive(Clone, Debug)]
pub struct Selection {
    pub target: Element,
    pub linked_nodes: Vec<usize>,
    pub linked_links: Vec<usize>,
}

#[derive(Clone, Copy, Debug)]
pub struct FocusTransition {
    pub element: Element,
    pub target: Vec2,
    pub zoom: f32,
    pub started_secs: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractionPhase {
    Idle,
    HoverActive,
    Selected,
    FocusTransition,
}

pub struct Interaction {
    hover: Option<Element>,
    pending_hover: Option<Option<Element>>,
    /// Set when a coalescing window opens (first pending submission).
    window_opened_secs: f64,
    pub highlight: HighlightSet,
    pub selected: Option<Selection>,
    pub focus: Option<FocusTransition>,
}

impl Interaction {
    pub fn new() -> Self {
        Self {
            hover: None,
            pending_hover: None,
            window_opened_secs: 0.0,
            highlight: HighlightSet::default(),
            selected: None,
            focus: None,
        }
    }

    pub fn phase(&self) -> InteractionPhase {
        if self.focus.is_some() {
            InteractionPhase::FocusTransition
        } else if self.selected.is_some() {
            InteractionPhase::Selected
        } else if self.hover.is_some() {
            InteractionPhase::HoverActive
        } else {
            InteractionPhase::Idle
        }
    }

    pub fn hovered(&self) -> Option<Element> {
        self.hover
    }

    /// Records the latest hover target; `None` means the pointer left every
    /// element. Actual recomputation happens in `tick_hover` once the
    /// coalescing window closes; the last submission wins.
    pub fn submit_hover(&mut self, element: Option<Element>, now_secs: f64) {
        if self.pending_hover.is_none() {
            self.window_opened_secs = now_secs;
        }
        self.pending_hover = Some(element);
    }

    /// Applies the pending hover if the coalescing window has elapsed.
    /// Returns true when the HighlightSet was recomputed. Masks describe the
    /// currently rendered subgraph; the highlight never references anything
    /// outside it.
    pub fn tick_hover(
        &mut self,
        snapshot: &GraphSnapshot,
        node_mask: &[bool],
        link_mask: &[bool],
        now_secs: f64,
    ) -> bool {
        if self.pending_hover.is_none() {
            return false;
        }
        if now_secs - self.window_opened_secs < HOVER_WINDOW_SECS {
            return false;
        }
        let element = self.pending_hover.take().unwrap_or(None);
        self.hover = element;
        self.highlight = match element {
            Some(element) => neighborhood(snapshot, element, node_mask, link_mask),
            None => HighlightSet::default(),
        };
        true
    }

    /// Click-selection records the node plus its neighborhood as the linked
    /// context. Hover highlighting is left intact; the two compose visually.
    pub fn select_node(&mut self, snapshot: &GraphSnapshot, index: usize) {
        if index >= snapshot.node_count() {
            return;
        }
        self.selected = Some(Selection {
            target: Element::Node(index),
            linked_nodes: snapshot.neighbors(index).to_vec(),
            linked_links: snapshot.incident_links(index).to_vec(),
        });
    }

    /// Link endpoints are resolved by identifier against the canonical node
    /// list, not the filtered one.
    pub fn select_link(&mut self, snapshot: &GraphSnapshot, link_index: usize) {
        let Some(link) = snapshot.links.get(link_index) else {
            return;
        };
        let linked_nodes = [&link.source_id, &link.target_id]
            .into_iter()
            .filter_map(|id| snapshot.node_index(id))
            .collect();
        self.selected = Some(Selection {
            target: Element::Link(link_index),
            linked_nodes,
            linked_links: vec![link_index],
        });
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Starts the timed camera move toward the element. The caller closes
    /// any open search-result list.
    pub fn begin_focus(&mut self, snapshot: &GraphSnapshot, element: Element, now_secs: f64) {
        let target = match element {
            Element::Node(index) => match snapshot.nodes.get(index) {
                Some(node) => node.pos,
                None => return,
            },
            Element::Link(index) => match snapshot.links.get(index) {
                Some(link) => (snapshot.nodes[link.source].pos + snapshot.nodes[link.target].pos) * 0.5,
                None => return,
            },
        };
        self.focus = Some(FocusTransition {
            element,
            target,
            zoom: FOCUS_ZOOM,
            started_secs: now_secs,
        });
    }

    /// Advances the focus transition. Once settled, re-issues a synthetic
    /// hover on the focused element and returns it.
    pub fn tick_focus(&mut self, now_secs: f64) -> Option<Element> {
        let focus = self.focus?;
        if now_secs - focus.started_secs < FOCUS_MOVE_SECS + FOCUS_SETTLE_SECS {
            return None;
        }
        self.focus = None;
        self.submit_hover(Some(focus.element), now_secs - HOVER_WINDOW_SECS);
        Some(focus.element)
    }

    /// Camera interpolation factor in [0, 1] for the render surface.
    pub fn focus_progress(&self, now_secs: f64) -> Option<(FocusTransition, f32)> {
        let focus = self.focus?;
        let t = ((now_secs - focus.started_secs) / FOCUS_MOVE_SECS).clamp(0.0, 1.0) as f32;
        Some((focus, t))
    }

    /// Drops any state that refers to a replaced snapshot's indices.
    pub fn reset_for_snapshot(&mut self) {
        self.hover = None;
        self.pending_hover = None;
        self.highlight = HighlightSet::default();
        self.selected = None;
        self.focus = None;
    }
}

fn neighborhood(
    snapshot: &GraphSnapshot,
    element: Element,
    node_mask: &[bool],
    link_mask: &[bool],
) -> HighlightSet {
    let node_visible = |index: usize| node_mask.get(index).copied().unwrap_or(false);
    let link_visible = |index: usize| link_mask.get(index).copied().unwrap_or(false);

    let mut set = HighlightSet::default();
    match element {
        Element::Node(index) => {
            if !node_visible(index) {
                return set;
            }
            set.nodes.insert(index);
            for &neighbor in snapshot.neighbors(index) {
                if node_visible(neighbor) {
                    set.nodes.insert(neighbor);
                }
            }
            for &link_index in snapshot.incident_links(index) {
                if link_visible(link_index) {
                    set.links.insert(link_index);
                }
            }
        }
        Element::Link(link_index) => {
            if !link_visible(link_index) {
                return set;
            }
            set.links.insert(link_index);
            if let Some(link) = snapshot.links.get(link_index) {
                for endpoint in [link.source, link.target] {
                    if node_visible(endpoint) {
                        set.nodes.insert(endpoint);
                    }
                }
            }
        }
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kg::NodeKind;
    use crate::kg::testkit::{link, node, snapshot};

    fn star() -> GraphSnapshot {
        snapshot(
            vec![
                node("hub", NodeKind::Person),
                node("a", NodeKind::Person),
                node("b", NodeKind::Event),
                node("c", NodeKind::Location),
            ],
            vec![link("hub", "a"), link("hub", "b"), link("a", "c")],
        )
    }

    fn all_visible(graph: &GraphSnapshot) -> (Vec<bool>, Vec<bool>) {
        (
            vec![true; graph.node_count()],
            vec![true; graph.links.len()],
        )
    }

    #[test]
    fn ten_hovers_in_fifty_ms_recompute_once_with_the_last_target() {
        let graph = star();
        let (nodes, links) = all_visible(&graph);
        let mut interaction = Interaction::new();

        let mut recomputes = 0;
        for step in 0..10 {
            let now = step as f64 * 0.005;
            interaction.submit_hover(Some(Element::Node(step % 4)), now);
            if interaction.tick_hover(&graph, &nodes, &links, now) {
                recomputes += 1;
            }
        }
        // Window still open at 90 ms; nothing has applied yet.
        if interaction.tick_hover(&graph, &nodes, &links, 0.09) {
            recomputes += 1;
        }
        // Window closes: the single recomputation reflects the last event.
        if interaction.tick_hover(&graph, &nodes, &links, 0.11) {
            recomputes += 1;
        }
        assert_eq!(recomputes, 1);
        assert_eq!(interaction.hovered(), Some(Element::Node(1)));
        assert!(interaction.highlight.nodes.contains(&1));
    }

    #[test]
    fn hover_highlight_is_element_plus_neighborhood() {
        let graph = star();
        let (nodes, links) = all_visible(&graph);
        let mut interaction = Interaction::new();
        let hub = graph.node_index("hub").unwrap();

        interaction.submit_hover(Some(Element::Node(hub)), 0.0);
        assert!(interaction.tick_hover(&graph, &nodes, &links, 0.1));
        assert_eq!(interaction.phase(), InteractionPhase::HoverActive);
        assert_eq!(interaction.highlight.nodes.len(), 3);
        assert_eq!(interaction.highlight.links.len(), 2);

        interaction.submit_hover(None, 1.0);
        assert!(interaction.tick_hover(&graph, &nodes, &links, 1.1));
        assert!(interaction.highlight.is_empty());
        assert_eq!(interaction.phase(), InteractionPhase::Idle);
    }

    #[test]
    fn hover_highlight_excludes_hidden_elements() {
        let graph = star();
        let hub = graph.node_index("hub").unwrap();
        let b = graph.node_index("b").unwrap();
        let mut node_mask = vec![true; graph.node_count()];
        node_mask[b] = false;
        let mut link_mask = vec![true; graph.links.len()];
        link_mask[1] = false; // hub - b

        let mut interaction = Interaction::new();
        interaction.submit_hover(Some(Element::Node(hub)), 0.0);
        assert!(interaction.tick_hover(&graph, &node_mask, &link_mask, 0.1));
        assert!(!interaction.highlight.nodes.contains(&b));
        assert!(!interaction.highlight.links.contains(&1));
    }

    #[test]
    fn selecting_a_link_resolves_both_endpoints_from_the_canonical_list() {
        let graph = star();
        let mut interaction = Interaction::new();
        interaction.select_link(&graph, 2); // a - c
        let selection = interaction.selected.as_ref().unwrap();
        assert_eq!(selection.target, Element::Link(2));
        assert_eq!(
            selection.linked_nodes,
            vec![
                graph.node_index("a").unwrap(),
                graph.node_index("c").unwrap()
            ]
        );
        assert_eq!(selection.linked_links, vec![2]);
    }

    #[test]
    fn selection_does_not_clear_hover_highlight() {
        let graph = star();
        let (nodes, links) = all_visible(&graph);
        let mut interaction = Interaction::new();
        interaction.submit_hover(Some(Element::Node(0)), 0.0);
        assert!(interaction.tick_hover(&graph, &nodes, &links, 0.1));
        let highlight_before = interaction.highlight.clone();

        interaction.select_node(&graph, 3);
        assert_eq!(interaction.phase(), InteractionPhase::Selected);
        assert_eq!(interaction.highlight, highlight_before);
    }

    #[test]
    fn focus_settles_into_a_synthetic_hover_on_the_element() {
        let graph = star();
        let mut interaction = Interaction::new();
        interaction.begin_focus(&graph, Element::Node(2), 10.0);
        assert_eq!(interaction.phase(), InteractionPhase::FocusTransition);

        // Camera move still running, then the settle delay.
        assert_eq!(interaction.tick_focus(10.5), None);
        assert_eq!(interaction.tick_focus(11.5), None);
        assert_eq!(interaction.tick_focus(12.0), Some(Element::Node(2)));
        assert!(interaction.focus.is_none());

        // The synthetic hover flows through the normal coalescer.
        let (nodes, links) = all_visible(&graph);
        assert!(interaction.tick_hover(&graph, &nodes, &links, 12.0));
        assert_eq!(interaction.hovered(), Some(Element::Node(2)));
    }

    #[test]
    fn focus_on_a_link_targets_the_midpoint() {
        let mut graph = star();
        graph.nodes[0].pos = eframe::egui::vec2(0.0, 0.0);
        graph.nodes[1].pos = eframe::egui::vec2(10.0, 20.0);
        let mut interaction = Interaction::new();
        interaction.begin_focus(&graph, Element::Link(0), 0.0);
        let (focus, _) = interaction.focus_progress(0.0).unwrap();
        assert_eq!(focus.target, eframe::egui::vec2(5.0, 10.0));
    }
}
