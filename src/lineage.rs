//! Lineage traversal.
//!
//! The backend returns a relation graph around the root entity. Process
//! nodes sitting between datasets are collapsed into direct dataset edges,
//! then the graph is walked breadth-first from the root with an explicit
//! frontier and visited set. A node keeps the level at which it was first
//! reached; later paths never re-level it.

use std::collections::{HashMap, HashSet, VecDeque};

use catalog_client::{EntityHeader, LineageInfo, LineageQueryDirection};
use metadata_types::{Badge, Lineage, LineageDirection, LineageItem, ResourceType};
use tracing::{debug, instrument};

use crate::error::{ProxyError, Result};
use crate::fetcher::int_value;
use crate::keys::{ColumnKey, TableKey};
use crate::AtlasProxy;

impl AtlasProxy {
    #[instrument(skip(self))]
    pub async fn get_lineage(
        &self,
        id: &str,
        resource_type: ResourceType,
        direction: &str,
        depth: u32,
    ) -> Result<Lineage> {
        let parsed_direction = LineageDirection::from_str(direction).ok_or_else(|| {
            ProxyError::bad_request(format!("invalid lineage direction '{direction}'"))
        })?;
        let root = match resource_type {
            ResourceType::Table => {
                let key = TableKey::parse(id)?;
                self.get_table_entity(&key).await?
            }
            ResourceType::Column => {
                let key = ColumnKey::parse(id)?;
                self.fetch_unique(&key.type_name(), &key.qualified_name())
                    .await?
            }
            other => {
                return Err(ProxyError::NotImplemented(format!(
                    "lineage for resource type {other}"
                )))
            }
        };
        let guid = root.entity.guid.as_str();
        let node_suffix = resource_type.as_str().to_ascii_lowercase();

        let mut upstream_entities = Vec::new();
        if parsed_direction.includes_upstream() {
            let info = self
                .client
                .get_lineage_info(guid, LineageQueryDirection::Input, depth)
                .await?;
            upstream_entities = leveled_items(&info, id, &node_suffix, depth, Side::Upstream);
        }

        let mut downstream_entities = Vec::new();
        if parsed_direction.includes_downstream() {
            let info = self
                .client
                .get_lineage_info(guid, LineageQueryDirection::Output, depth)
                .await?;
            downstream_entities = leveled_items(&info, id, &node_suffix, depth, Side::Downstream);
        }

        debug!(
            upstream = upstream_entities.len(),
            downstream = downstream_entities.len(),
            "lineage resolved"
        );
        Ok(Lineage {
            key: id.to_string(),
            direction: parsed_direction,
            depth,
            upstream_entities,
            downstream_entities,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Upstream,
    Downstream,
}

/// Dataset-to-dataset edges, with process nodes collapsed away.
///
/// Returns `(from, to)` pairs in data-flow direction, deduplicated, in the
/// order the backend listed the relations.
fn dataset_edges(info: &LineageInfo, is_dataset: impl Fn(&str) -> bool) -> Vec<(String, String)> {
    let mut outgoing: HashMap<&str, Vec<&str>> = HashMap::new();
    for relation in &info.relations {
        outgoing
            .entry(relation.from_entity_id.as_str())
            .or_default()
            .push(relation.to_entity_id.as_str());
    }

    let mut seen = HashSet::new();
    let mut edges = Vec::new();
    for relation in &info.relations {
        let from = relation.from_entity_id.as_str();
        if !is_dataset(from) {
            continue;
        }
        // Step through non-dataset nodes until datasets are reached.
        let mut frontier: VecDeque<&str> = VecDeque::from([relation.to_entity_id.as_str()]);
        let mut passed: HashSet<&str> = HashSet::new();
        while let Some(node) = frontier.pop_front() {
            if is_dataset(node) {
                if node != from && seen.insert((from, node)) {
                    edges.push((from.to_string(), node.to_string()));
                }
                continue;
            }
            if !passed.insert(node) {
                continue;
            }
            if let Some(next) = outgoing.get(node) {
                frontier.extend(next.iter().copied());
            }
        }
    }
    edges
}

/// Walk the relation graph from the root and emit one item per dataset node
/// within `depth` hops, sorted by key.
fn leveled_items(
    info: &LineageInfo,
    root_key: &str,
    node_suffix: &str,
    depth: u32,
    side: Side,
) -> Vec<LineageItem> {
    let root = info.base_entity_guid.as_str();
    let is_dataset = |guid: &str| {
        info.guid_entity_map
            .get(guid)
            .is_some_and(|h| h.type_name.to_ascii_lowercase().ends_with(node_suffix))
    };

    // Adjacency in traversal direction; each entry keeps the data-flow source.
    let mut neighbours: HashMap<String, Vec<(String, String)>> = HashMap::new();
    for (from, to) in dataset_edges(info, is_dataset) {
        let (at, next) = match side {
            Side::Upstream => (to.clone(), from.clone()),
            Side::Downstream => (from.clone(), to.clone()),
        };
        neighbours.entry(at).or_default().push((next, from));
    }

    let key_of = |guid: &str| -> String {
        if guid == root {
            return root_key.to_string();
        }
        info.guid_entity_map
            .get(guid)
            .map(lineage_key)
            .unwrap_or_else(|| guid.to_string())
    };

    let mut levels: HashMap<String, u32> = HashMap::new();
    let mut parents: HashMap<String, String> = HashMap::new();
    let mut visited: HashSet<String> = HashSet::from([root.to_string()]);
    let mut frontier: VecDeque<(String, u32)> = VecDeque::from([(root.to_string(), 0)]);

    while let Some((node, level)) = frontier.pop_front() {
        if level >= depth {
            continue;
        }
        let Some(next_nodes) = neighbours.get(&node) else {
            continue;
        };
        for (next, source) in next_nodes {
            // The node on the receiving end of this edge.
            let target = if side == Side::Upstream { &node } else { next };
            parents
                .entry(target.clone())
                .or_insert_with(|| key_of(source));

            if visited.insert(next.clone()) {
                levels.insert(next.clone(), level + 1);
                frontier.push_back((next.clone(), level + 1));
            }
        }
    }

    let mut items: Vec<LineageItem> = levels
        .into_iter()
        .filter_map(|(guid, level)| {
            let header = info.guid_entity_map.get(&guid)?;
            Some(LineageItem {
                key: lineage_key(header),
                parent: parents.get(&guid).cloned().unwrap_or_default(),
                level,
                source: header.type_name.clone(),
                badges: header
                    .classification_names
                    .iter()
                    .map(|name| Badge::classification(name.clone()))
                    .collect(),
                usage: header
                    .attributes
                    .get("popularityScore")
                    .and_then(int_value)
                    .unwrap_or(0),
            })
        })
        .collect();
    items.sort_by(|a, b| a.key.cmp(&b.key));
    items
}

/// Resource key of a lineage node: table or column key when the
/// qualifiedName parses, else the qualifiedName, else the guid.
fn lineage_key(header: &EntityHeader) -> String {
    let Some(qn) = header.qualified_name() else {
        return header.guid.clone();
    };
    let type_name = header.type_name.as_str();
    if type_name.to_ascii_lowercase().ends_with("column") {
        if let Some(key) = ColumnKey::from_qualified_name(type_name, qn) {
            return key.to_string();
        }
    } else if let Some(key) = TableKey::from_qualified_name(type_name, qn) {
        return key.to_string();
    }
    qn.to_string()
}
