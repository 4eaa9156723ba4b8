use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use eframe::egui::Vec2;
use serde::Deserialize;
use serde_json::Value;

use super::{GraphSnapshot, LinkRecord, NodeKind, NodeRecord, external_id};

#[derive(Debug, Deserialize)]
struct RawNode {
    id: String,
    #[serde(default)]
    uuid: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    human_readable_id: Option<Value>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    covariate_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLink {
    source: String,
    target: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    human_readable_id: Option<Value>,
    #[serde(default)]
    description: Option<String>,
}

/// Reads `nodes.json` and `links.json` from the dataset directory and builds
/// the base snapshot. Positions start at the origin; the caller runs the
/// layout solver before first paint.
pub fn load_dataset(data_dir: &Path) -> Result<GraphSnapshot> {
    let nodes_path = data_dir.join("nodes.json");
    let raw_nodes = fs::read_to_string(&nodes_path)
        .with_context(|| format!("failed to read {}", nodes_path.display()))?;
    let raw_nodes: Vec<RawNode> = serde_json::from_str(&raw_nodes)
        .with_context(|| format!("invalid node JSON in {}", nodes_path.display()))?;

    let links_path = data_dir.join("links.json");
    let raw_links = fs::read_to_string(&links_path)
        .with_context(|| format!("failed to read {}", links_path.display()))?;
    let raw_links: Vec<RawLink> = serde_json::from_str(&raw_links)
        .with_context(|| format!("invalid link JSON in {}", links_path.display()))?;

    if raw_nodes.is_empty() {
        return Err(anyhow!("dataset {} contains no nodes", data_dir.display()));
    }

    let nodes = raw_nodes
        .into_iter()
        .map(|raw| {
            let name = raw.name.unwrap_or_else(|| raw.id.clone());
            NodeRecord {
                uuid: raw.uuid,
                kind: raw.kind.as_deref().map_or(NodeKind::Default, NodeKind::parse),
                human_readable_id: raw.human_readable_id.as_ref().and_then(external_id),
                description: raw.description,
                title: raw.title,
                summary: raw.summary,
                text: raw.text,
                covariate_type: raw.covariate_type,
                pos: Vec2::ZERO,
                id: raw.id,
                name,
            }
        })
        .collect::<Vec<_>>();

    let links = raw_links
        .into_iter()
        .map(|raw| LinkRecord {
            source_id: raw.source,
            target_id: raw.target,
            source: 0,
            target: 0,
            kind: raw.kind.unwrap_or_else(|| "related".to_owned()),
            human_readable_id: raw.human_readable_id.as_ref().and_then(external_id),
            description: raw.description,
        })
        .collect::<Vec<_>>();

    Ok(GraphSnapshot::build(1, nodes, links))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_records() {
        let raw = r#"[
            {"id": "n1", "name": "Alpha Corp", "type": "ORGANIZATION", "human_readable_id": 5},
            {"id": "n2", "type": "text_unit", "text": "some passage"}
        ]"#;
        let nodes: Vec<RawNode> = serde_json::from_str(raw).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(
            nodes[0].human_readable_id.as_ref().and_then(external_id),
            Some("5".to_owned())
        );
        assert_eq!(
            nodes[1].kind.as_deref().map(NodeKind::parse),
            Some(NodeKind::TextUnit)
        );
    }
}
