use crate::kg::{GraphSnapshot, NodeKind};

/// Inclusion flags for the four gated categories. Entities, relationships,
/// and everything else are always shown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CategoryFlags {
    pub documents: bool,
    pub text_units: bool,
    pub communities: bool,
    pub claims: bool,
}

impl CategoryFlags {
    pub fn set_documents(&mut self, on: bool, presence: CategoryPresence) {
        if presence.documents {
            self.documents = on;
        }
    }

    pub fn set_communities(&mut self, on: bool, presence: CategoryPresence) {
        if presence.communities {
            self.communities = on;
        }
    }

    /// Claims only make sense with their text units; disabling text units
    /// drags claims off with it.
    pub fn set_text_units(&mut self, on: bool, presence: CategoryPresence) {
        if !presence.text_units {
            return;
        }
        self.text_units = on;
        if !on {
            self.claims = false;
        }
    }

    /// Enabling claims forces text units on.
    pub fn set_claims(&mut self, on: bool, presence: CategoryPresence) {
        if !presence.claims {
            return;
        }
        self.claims = on;
        if on {
            self.text_units = true;
        }
    }
}

/// Whether each gated category exists in the snapshot at all; absent
/// categories get their toggles disabled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CategoryPresence {
    pub documents: bool,
    pub text_units: bool,
    pub communities: bool,
    pub claims: bool,
}

impl CategoryPresence {
    pub fn scan(snapshot: &GraphSnapshot) -> Self {
        let mut presence = Self::default();
        for node in &snapshot.nodes {
            if node.is_claim() {
                presence.claims = true;
                continue;
            }
            match node.kind {
                NodeKind::Document => presence.documents = true,
                NodeKind::TextUnit => presence.text_units = true,
                NodeKind::Community => presence.communities = true,
                _ => {}
            }
        }
        presence
    }
}

#[derive(Clone, Debug, Default)]
pub struct FilteredGraph {
    pub node_indices: Vec<usize>,
    pub node_mask: Vec<bool>,
    pub link_indices: Vec<usize>,
    pub link_mask: Vec<bool>,
}

/// Pure function of snapshot + flags. `admitted` caps the node set to the
/// progressively revealed prefix of the snapshot's original order. Links
/// survive only when both endpoints do.
pub fn apply(snapshot: &GraphSnapshot, flags: CategoryFlags, admitted: usize) -> FilteredGraph {
    let mut node_mask = vec![false; snapshot.node_count()];
    let mut node_indices = Vec::new();
    for (index, node) in snapshot.nodes.iter().enumerate().take(admitted) {
        let keep = if node.is_claim() {
            flags.claims
        } else {
            match node.kind {
                NodeKind::Document => flags.documents,
                NodeKind::TextUnit => flags.text_units,
                NodeKind::Community => flags.communities,
                _ => true,
            }
        };
        if keep {
            node_mask[index] = true;
            node_indices.push(index);
        }
    }

    let mut link_mask = vec![false; snapshot.links.len()];
    let mut link_indices = Vec::new();
    for (index, link) in snapshot.links.iter().enumerate() {
        if node_mask[link.source] && node_mask[link.target] {
            link_mask[index] = true;
            link_indices.push(index);
        }
    }

    FilteredGraph {
        node_indices,
        node_mask,
        link_indices,
        link_mask,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kg::testkit::{link, node, snapshot};

    fn mixed_snapshot() -> GraphSnapshot {
        snapshot(
            vec![
                node("person", NodeKind::Person),
                node("doc", NodeKind::Document),
                node("unit", NodeKind::TextUnit),
                node("community", NodeKind::Community),
                node("claim", NodeKind::Claim),
            ],
            vec![
                link("person", "doc"),
                link("doc", "unit"),
                link("unit", "claim"),
                link("person", "community"),
            ],
        )
    }

    fn all_present() -> CategoryPresence {
        CategoryPresence {
            documents: true,
            text_units: true,
            communities: true,
            claims: true,
        }
    }

    #[test]
    fn no_dangling_links_for_any_flag_combination() {
        let graph = mixed_snapshot();
        for bits in 0..16u8 {
            let flags = CategoryFlags {
                documents: bits & 1 != 0,
                text_units: bits & 2 != 0,
                communities: bits & 4 != 0,
                claims: bits & 8 != 0,
            };
            let filtered = apply(&graph, flags, graph.node_count());
            for &link_index in &filtered.link_indices {
                let link = &graph.links[link_index];
                assert!(filtered.node_mask[link.source], "dangling source at {bits:04b}");
                assert!(filtered.node_mask[link.target], "dangling target at {bits:04b}");
            }
        }
    }

    #[test]
    fn ungated_nodes_always_survive() {
        let graph = mixed_snapshot();
        let filtered = apply(&graph, CategoryFlags::default(), graph.node_count());
        assert_eq!(filtered.node_indices, vec![0]);
        assert!(filtered.link_indices.is_empty());
    }

    #[test]
    fn admitted_prefix_caps_the_node_set() {
        let graph = mixed_snapshot();
        let flags = CategoryFlags {
            documents: true,
            text_units: true,
            communities: true,
            claims: true,
        };
        let filtered = apply(&graph, flags, 2);
        assert_eq!(filtered.node_indices, vec![0, 1]);
        assert_eq!(filtered.link_indices.len(), 1);
    }

    #[test]
    fn claims_force_text_units_on() {
        let mut flags = CategoryFlags::default();
        flags.set_claims(true, all_present());
        assert!(flags.claims);
        assert!(flags.text_units);
    }

    #[test]
    fn disabling_text_units_drags_claims_off() {
        let mut flags = CategoryFlags::default();
        flags.set_claims(true, all_present());
        flags.set_text_units(false, all_present());
        assert!(!flags.text_units);
        assert!(!flags.claims);
    }

    #[test]
    fn toggling_an_absent_category_is_a_no_op() {
        let mut flags = CategoryFlags::default();
        let presence = CategoryPresence::default();
        flags.set_documents(true, presence);
        flags.set_claims(true, presence);
        assert_eq!(flags, CategoryFlags::default());
    }
}
