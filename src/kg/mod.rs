use std::collections::HashMap;

use eframe::egui::Vec2;
use serde_json::Value;

mod load;

pub use load::load_dataset;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Organization,
    Event,
    Location,
    Person,
    Document,
    TextUnit,
    Community,
    Claim,
    Default,
}

impl NodeKind {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "organization" => Self::Organization,
            "event" => Self::Event,
            "geo" | "location" => Self::Location,
            "person" => Self::Person,
            "document" => Self::Document,
            "text_unit" | "text unit" | "chunk" => Self::TextUnit,
            "community" => Self::Community,
            "claim" | "covariate" => Self::Claim,
            _ => Self::Default,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::Event => "event",
            Self::Location => "location",
            Self::Person => "person",
            Self::Document => "document",
            Self::TextUnit => "text unit",
            Self::Community => "community",
            Self::Claim => "claim",
            Self::Default => "entity",
        }
    }
}

#[derive(Clone, Debug)]
pub struct NodeRecord {
    pub id: String,
    pub uuid: Option<String>,
    pub name: String,
    pub kind: NodeKind,
    pub human_readable_id: Option<String>,
    pub description: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub text: Option<String>,
    pub covariate_type: Option<String>,
    /// World position, written only by the layout solver or an explicit drag.
    pub pos: Vec2,
}

impl NodeRecord {
    pub fn is_claim(&self) -> bool {
        self.kind == NodeKind::Claim || self.covariate_type.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct LinkRecord {
    pub source_id: String,
    pub target_id: String,
    pub source: usize,
    pub target: usize,
    pub kind: String,
    pub human_readable_id: Option<String>,
    pub description: Option<String>,
}

/// One immutable generation of the canonical dataset. Replaced wholesale on
/// every data change; node positions are the only in-place mutation.
#[derive(Clone, Debug, Default)]
pub struct GraphSnapshot {
    pub version: u64,
    pub nodes: Vec<NodeRecord>,
    pub links: Vec<LinkRecord>,
    pub index_by_id: HashMap<String, usize>,
    neighbors: Vec<Vec<usize>>,
    incident: Vec<Vec<usize>>,
}

impl GraphSnapshot {
    /// Resolves raw link endpoints against the node set, drops links whose
    /// endpoints are missing (and self-loops), and derives the adjacency
    /// indices. Every surviving link references in-snapshot nodes.
    pub fn build(version: u64, nodes: Vec<NodeRecord>, raw_links: Vec<LinkRecord>) -> Self {
        let mut index_by_id = HashMap::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            index_by_id.entry(node.id.clone()).or_insert(index);
        }

        let mut links = Vec::with_capacity(raw_links.len());
        for mut link in raw_links {
            let (Some(&source), Some(&target)) = (
                index_by_id.get(&link.source_id),
                index_by_id.get(&link.target_id),
            ) else {
                continue;
            };
            if source == target {
                continue;
            }
            link.source = source;
            link.target = target;
            links.push(link);
        }

        let mut neighbors = vec![Vec::new(); nodes.len()];
        let mut incident = vec![Vec::new(); nodes.len()];
        for (link_index, link) in links.iter().enumerate() {
            neighbors[link.source].push(link.target);
            neighbors[link.target].push(link.source);
            incident[link.source].push(link_index);
            incident[link.target].push(link_index);
        }
        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }

        Self {
            version,
            nodes,
            links,
            index_by_id,
            neighbors,
            incident,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn degree(&self, index: usize) -> usize {
        self.neighbors.get(index).map_or(0, Vec::len)
    }

    pub fn neighbors(&self, index: usize) -> &[usize] {
        self.neighbors.get(index).map_or(&[], Vec::as_slice)
    }

    pub fn incident_links(&self, index: usize) -> &[usize] {
        self.incident.get(index).map_or(&[], Vec::as_slice)
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }
}

/// External reference ids arrive as JSON strings or numbers depending on the
/// index build; both compare against the dataset's string form.
pub fn external_id(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[cfg(test)]
pub mod testkit {
    use super::*;

    pub fn node(id: &str, kind: NodeKind) -> NodeRecord {
        NodeRecord {
            id: id.to_owned(),
            uuid: None,
            name: id.to_owned(),
            kind,
            human_readable_id: None,
            description: None,
            title: None,
            summary: None,
            text: None,
            covariate_type: None,
            pos: Vec2::ZERO,
        }
    }

    pub fn link(source: &str, target: &str) -> LinkRecord {
        LinkRecord {
            source_id: source.to_owned(),
            target_id: target.to_owned(),
            source: 0,
            target: 0,
            kind: "related".to_owned(),
            human_readable_id: None,
            description: None,
        }
    }

    pub fn snapshot(nodes: Vec<NodeRecord>, links: Vec<LinkRecord>) -> GraphSnapshot {
        GraphSnapshot::build(1, nodes, links)
    }
}
