use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use super::highlight::Element;
use crate::kg::GraphSnapshot;

/// Normalized distance cutoff; 0 is an exact match of the query.
pub const MATCH_DISTANCE_THRESHOLD: f64 = 0.3;

#[derive(Clone, Debug)]
pub struct SearchHit {
    pub element: Element,
    pub score: i64,
    pub label: String,
}

struct IndexEntry {
    element: Element,
    label: String,
    fields: Vec<String>,
}

/// Immutable per snapshot version; rebuilt whenever the snapshot changes.
pub struct SearchIndex {
    version: u64,
    entries: Vec<IndexEntry>,
}

impl SearchIndex {
    pub fn build(snapshot: &GraphSnapshot) -> Self {
        let mut entries = Vec::with_capacity(snapshot.node_count() + snapshot.links.len());

        for (index, node) in snapshot.nodes.iter().enumerate() {
            let mut fields = vec![
                node.id.clone(),
                node.name.clone(),
                node.kind.label().to_owned(),
            ];
            for optional in [
                &node.human_readable_id,
                &node.description,
                &node.title,
                &node.summary,
            ] {
                if let Some(value) = optional {
                    fields.push(value.clone());
                }
            }
            entries.push(IndexEntry {
                element: Element::Node(index),
                label: node.name.clone(),
                fields,
            });
        }

        for (index, link) in snapshot.links.iter().enumerate() {
            let source = snapshot.nodes[link.source].name.as_str();
            let target = snapshot.nodes[link.target].name.as_str();
            let mut fields = vec![
                link.kind.clone(),
                link.source_id.clone(),
                link.target_id.clone(),
            ];
            for optional in [&link.human_readable_id, &link.description] {
                if let Some(value) = optional {
                    fields.push(value.clone());
                }
            }
            entries.push(IndexEntry {
                element: Element::Link(index),
                label: format!("{source} \u{2192} {target}"),
                fields,
            });
        }

        Self {
            version: snapshot.version,
            entries,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Ranked by matcher score within each partition; node hits always
    /// precede link hits in the combined output.
    pub fn search(&self, term: &str) -> Vec<SearchHit> {
        let term = term.trim();
        if term.is_empty() {
            return Vec::new();
        }

        let matcher = SkimMatcherV2::default();
        let Some(exact_score) = matcher.fuzzy_match(term, term) else {
            return Vec::new();
        };

        let mut node_hits = Vec::new();
        let mut link_hits = Vec::new();
        for entry in &self.entries {
            let best = entry
                .fields
                .iter()
                .filter_map(|field| matcher.fuzzy_match(field, term))
                .max();
            let Some(score) = best else {
                continue;
            };
            let distance = 1.0 - (score as f64 / exact_score as f64).min(1.0);
            if distance > MATCH_DISTANCE_THRESHOLD {
                continue;
            }
            let hit = SearchHit {
                element: entry.element,
                score,
                label: entry.label.clone(),
            };
            match entry.element {
                Element::Node(_) => node_hits.push(hit),
                Element::Link(_) => link_hits.push(hit),
            }
        }

        node_hits.sort_by(|a, b| b.score.cmp(&a.score));
        link_hits.sort_by(|a, b| b.score.cmp(&a.score));
        node_hits.extend(link_hits);
        node_hits
    }
}
