use std::collections::HashMap;

use crate::api::{ContextData, RemoteItem};
use crate::kg::{GraphSnapshot, external_id};

/// Reconciles a remote search response against the base (original,
/// unfiltered) snapshot and builds the replacement subgraph: exactly the
/// matched nodes and links, plus matched links' endpoints so no link ever
/// dangles. Unmatched items are dropped silently.
pub fn map_search_context(
    base: &GraphSnapshot,
    context: &ContextData,
    version: u64,
) -> GraphSnapshot {
    let mut by_external: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut by_uuid: HashMap<&str, usize> = HashMap::new();
    let mut by_text: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, node) in base.nodes.iter().enumerate() {
        if let Some(id) = node.human_readable_id.as_deref() {
            by_external.entry(id).or_default().push(index);
        }
        if let Some(uuid) = node.uuid.as_deref() {
            by_uuid.entry(uuid).or_insert(index);
        }
        if let Some(text) = node.text.as_deref() {
            by_text.entry(text).or_default().push(index);
        }
    }
    let mut links_by_external: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, link) in base.links.iter().enumerate() {
        if let Some(id) = link.human_readable_id.as_deref() {
            links_by_external.entry(id).or_default().push(index);
        }
    }

    let mut keep_nodes = vec![false; base.node_count()];
    let mut keep_links = vec![false; base.links.len()];

    for id in item_ids(&context.relationships) {
        for &link_index in links_by_external.get(id.as_str()).into_iter().flatten() {
            keep_links[link_index] = true;
            let link = &base.links[link_index];
            keep_nodes[link.source] = true;
            keep_nodes[link.target] = true;
        }
    }

    for id in item_ids(&context.entities) {
        for &index in by_external.get(id.as_str()).into_iter().flatten() {
            if !base.nodes[index].is_claim() {
                keep_nodes[index] = true;
            }
        }
    }

    for id in item_ids(&context.reports) {
        if let Some(&index) = by_uuid.get(id.as_str()) {
            keep_nodes[index] = true;
        }
    }

    for item in &context.sources {
        let Some(text) = item.text.as_deref() else {
            continue;
        };
        for &index in by_text.get(text).into_iter().flatten() {
            keep_nodes[index] = true;
        }
    }

    for id in item_ids(&context.covariates) {
        for &index in by_external.get(id.as_str()).into_iter().flatten() {
            if base.nodes[index].is_claim() {
                keep_nodes[index] = true;
            }
        }
    }

    let nodes = base
        .nodes
        .iter()
        .zip(&keep_nodes)
        .filter(|&(_, &keep)| keep)
        .map(|(node, _)| node.clone())
        .collect::<Vec<_>>();
    let links = base
        .links
        .iter()
        .zip(&keep_links)
        .filter(|&(_, &keep)| keep)
        .map(|(link, _)| link.clone())
        .collect::<Vec<_>>();

    GraphSnapshot::build(version, nodes, links)
}

fn item_ids(items: &[RemoteItem]) -> impl Iterator<Item = String> + '_ {
    items
        .iter()
        .filter_map(|item| item.id.as_ref().and_then(external_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kg::NodeKind;
    use crate::kg::testkit::{link, node, snapshot};
    use serde_json::Value;

    fn base() -> GraphSnapshot {
        let mut entity = node("e1", NodeKind::Organization);
        entity.human_readable_id = Some("5".to_owned());
        let mut other = node("e2", NodeKind::Person);
        other.human_readable_id = Some("6".to_owned());
        let mut claim = node("c1", NodeKind::Claim);
        claim.human_readable_id = Some("5".to_owned());
        claim.covariate_type = Some("claim".to_owned());
        let mut report = node("r1", NodeKind::Community);
        report.uuid = Some("uuid-9".to_owned());
        let mut source = node("t1", NodeKind::TextUnit);
        source.text = Some("some passage".to_owned());

        let mut relation = link("e1", "e2");
        relation.human_readable_id = Some("100".to_owned());

        snapshot(
            vec![entity, other, claim, report, source],
            vec![relation, link("e1", "c1")],
        )
    }

    fn items(ids: &[Value]) -> Vec<RemoteItem> {
        ids.iter()
            .map(|id| RemoteItem {
                id: Some(id.clone()),
                text: None,
            })
            .collect()
    }

    #[test]
    fn entity_match_yields_exactly_that_node_and_no_links() {
        let context = ContextData {
            entities: items(&[Value::from("5")]),
            ..ContextData::default()
        };
        let mapped = map_search_context(&base(), &context, 2);
        assert_eq!(mapped.node_count(), 1);
        assert_eq!(mapped.nodes[0].id, "e1");
        assert!(mapped.links.is_empty());
        assert_eq!(mapped.version, 2);
    }

    #[test]
    fn numeric_ids_match_string_external_ids() {
        let context = ContextData {
            entities: items(&[Value::from(5)]),
            ..ContextData::default()
        };
        let mapped = map_search_context(&base(), &context, 2);
        assert_eq!(mapped.node_count(), 1);
        assert_eq!(mapped.nodes[0].id, "e1");
    }

    #[test]
    fn entity_rule_skips_claim_marked_nodes_and_covariate_rule_requires_them() {
        let context = ContextData {
            covariates: items(&[Value::from("5")]),
            ..ContextData::default()
        };
        let mapped = map_search_context(&base(), &context, 2);
        assert_eq!(mapped.node_count(), 1);
        assert_eq!(mapped.nodes[0].id, "c1");
    }

    #[test]
    fn relationship_match_pulls_its_endpoints() {
        let context = ContextData {
            relationships: items(&[Value::from("100")]),
            ..ContextData::default()
        };
        let mapped = map_search_context(&base(), &context, 2);
        assert_eq!(mapped.links.len(), 1);
        assert_eq!(mapped.node_count(), 2);
        for link in &mapped.links {
            assert!(link.source < mapped.node_count());
            assert!(link.target < mapped.node_count());
        }
    }

    #[test]
    fn reports_match_by_uuid_and_sources_by_text() {
        let context = ContextData {
            reports: items(&[Value::from("uuid-9")]),
            sources: vec![RemoteItem {
                id: None,
                text: Some("some passage".to_owned()),
            }],
            ..ContextData::default()
        };
        let mapped = map_search_context(&base(), &context, 2);
        let ids = mapped
            .nodes
            .iter()
            .map(|node| node.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["r1", "t1"]);
    }

    #[test]
    fn unmatched_items_are_silently_dropped() {
        let context = ContextData {
            entities: items(&[Value::from("999")]),
            reports: items(&[Value::from("nope")]),
            relationships: items(&[Value::from("nope")]),
            ..ContextData::default()
        };
        let mapped = map_search_context(&base(), &context, 2);
        assert_eq!(mapped.node_count(), 0);
        assert!(mapped.links.is_empty());
    }
}
