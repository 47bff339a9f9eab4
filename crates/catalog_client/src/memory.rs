//! In-process catalog backend.
//!
//! Holds the whole graph in a `tokio::sync::RwLock`-guarded map and
//! implements enough of the backend's behaviour for the proxy to be driven
//! end to end: unique-attribute lookups with referred entities, faceted
//! search with filters/sorting/paging, process-aware lineage, glossary term
//! assignment and ownership edges.
//!
//! Every trait call is recorded in a call log, and the catalog can be switched
//! offline so that every call fails with `ClientError::Unavailable`.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::ClientError;
use crate::model::*;
use crate::{CatalogClient, Result};

const ASSIGNED_ENTITIES: &str = "assignedEntities";
const MEANINGS: &str = "meanings";

#[derive(Default)]
struct CatalogState {
    entities: HashMap<String, GraphEntity>,
    /// Insertion order, so searches are deterministic.
    order: Vec<String>,
    relationships: HashMap<String, Relationship>,
    glossaries: Vec<Glossary>,
    metrics: Option<MetricsSnapshot>,
    /// qualifiedName of entities whose attributes were stripped, by guid.
    stripped: HashMap<String, String>,
    offline: bool,
    calls: Vec<String>,
}

impl CatalogState {
    fn begin(&mut self, call: &str) -> Result<()> {
        self.calls.push(call.to_string());
        debug!(call, offline = self.offline, "in-memory catalog call");
        if self.offline {
            return Err(ClientError::Unavailable(format!("{call}: catalog offline")));
        }
        Ok(())
    }

    fn insert(&mut self, mut entity: GraphEntity) -> String {
        if entity.guid.is_empty() {
            entity.guid = new_guid();
        }
        let guid = entity.guid.clone();
        if self.entities.insert(guid.clone(), entity).is_none() {
            self.order.push(guid.clone());
        }
        guid
    }

    fn ordered(&self) -> impl Iterator<Item = &GraphEntity> {
        self.order.iter().filter_map(|guid| self.entities.get(guid))
    }

    fn find_unique(&self, type_name: &str, attribute: &str, value: &str) -> Option<&GraphEntity> {
        self.ordered().find(|e| {
            e.type_name == type_name
                && (e.attribute(attribute).and_then(Value::as_str) == Some(value)
                    || (attribute == QUALIFIED_NAME
                        && self.stripped.get(&e.guid).map(String::as_str) == Some(value)))
        })
    }

    fn with_ext_info(&self, entity: &GraphEntity) -> EntityWithExtInfo {
        let mut referred_entities = HashMap::new();
        if let Some(attributes) = &entity.attributes {
            for value in attributes.values() {
                for guid in ref_guids(value) {
                    if let Some(referred) = self.entities.get(&guid) {
                        referred_entities.insert(guid, referred.clone());
                    }
                }
            }
        }
        EntityWithExtInfo {
            entity: entity.clone(),
            referred_entities,
        }
    }

    fn entity_mut(&mut self, guid: &str) -> Result<&mut GraphEntity> {
        self.entities
            .get_mut(guid)
            .ok_or_else(|| ClientError::NotFound(format!("entity {guid}")))
    }

    fn header(&self, guid: &str) -> Option<EntityHeader> {
        self.entities.get(guid).map(EntityHeader::from)
    }

    fn processes(&self) -> impl Iterator<Item = &GraphEntity> {
        self.ordered()
            .filter(|e| e.type_name.to_ascii_lowercase().ends_with("process"))
    }
}

/// In-memory `CatalogClient`.
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    state: Arc<RwLock<CatalogState>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entity; an empty guid is assigned. Returns the guid.
    pub async fn insert(&self, entity: GraphEntity) -> String {
        self.state.write().await.insert(entity)
    }

    /// Seed an entity from its JSON wire form.
    pub async fn insert_json(&self, value: Value) -> serde_json::Result<String> {
        let entity: GraphEntity = serde_json::from_value(value)?;
        Ok(self.insert(entity).await)
    }

    pub async fn entity(&self, guid: &str) -> Option<GraphEntity> {
        self.state.read().await.entities.get(guid).cloned()
    }

    pub async fn find(&self, type_name: &str, qualified_name: &str) -> Option<GraphEntity> {
        self.state
            .read()
            .await
            .find_unique(type_name, QUALIFIED_NAME, qualified_name)
            .cloned()
    }

    /// Drop an entity's attributes while keeping it reachable by its
    /// qualifiedName. Returns false for an unknown guid.
    pub async fn strip_attributes(&self, guid: &str) -> bool {
        let mut state = self.state.write().await;
        let Some(entity) = state.entities.get_mut(guid) else {
            return false;
        };
        let qualified_name = entity.qualified_name().map(str::to_string);
        entity.attributes = None;
        if let Some(qualified_name) = qualified_name {
            state.stripped.insert(guid.to_string(), qualified_name);
        }
        true
    }

    pub async fn set_metrics(&self, metrics: Option<MetricsSnapshot>) {
        self.state.write().await.metrics = metrics;
    }

    /// While offline every call fails with `ClientError::Unavailable`.
    pub async fn set_offline(&self, offline: bool) {
        self.state.write().await.offline = offline;
    }

    /// Names of the trait calls made so far, in order.
    pub async fn calls(&self) -> Vec<String> {
        self.state.read().await.calls.clone()
    }

    pub async fn relationships(&self) -> Vec<Relationship> {
        self.state
            .read()
            .await
            .relationships
            .values()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CatalogClient for InMemoryCatalog {
    async fn get_entity_by_unique_attribute(
        &self,
        type_name: &str,
        attribute: &str,
        value: &str,
    ) -> Result<Option<EntityWithExtInfo>> {
        let mut state = self.state.write().await;
        state.begin("get_entity_by_unique_attribute")?;
        Ok(state
            .find_unique(type_name, attribute, value)
            .map(|entity| state.with_ext_info(entity)))
    }

    async fn get_entity_by_guid(&self, guid: &str) -> Result<Option<EntityWithExtInfo>> {
        let mut state = self.state.write().await;
        state.begin("get_entity_by_guid")?;
        Ok(state
            .entities
            .get(guid)
            .map(|entity| state.with_ext_info(entity)))
    }

    async fn get_entities_by_guids(&self, guids: &[String]) -> Result<Vec<GraphEntity>> {
        let mut state = self.state.write().await;
        state.begin("get_entities_by_guids")?;
        Ok(guids
            .iter()
            .filter_map(|guid| state.entities.get(guid).cloned())
            .collect())
    }

    async fn faceted_search(&self, params: &SearchParameters) -> Result<SearchResult> {
        let mut state = self.state.write().await;
        state.begin("faceted_search")?;

        let mut matched: Vec<GraphEntity> = state
            .ordered()
            .filter(|e| type_matches(&e.type_name, &params.type_name, params.include_sub_types))
            .filter(|e| !params.exclude_deleted_entities || e.is_active())
            .filter(|e| {
                params
                    .entity_filters
                    .as_ref()
                    .map_or(true, |filters| filters_match(e, filters))
            })
            .cloned()
            .collect();

        if let Some(sort_by) = &params.sort_by {
            matched.sort_by(|a, b| {
                let left = a.attribute(sort_by).and_then(as_number);
                let right = b.attribute(sort_by).and_then(as_number);
                left.partial_cmp(&right).unwrap_or(std::cmp::Ordering::Equal)
            });
            if params.sort_order == Some(SortOrder::Descending) {
                matched.reverse();
            }
        }

        let approximate_count = matched.len() as i64;
        let entities = matched
            .into_iter()
            .skip(params.offset)
            .take(params.limit.unwrap_or(usize::MAX))
            .collect();

        Ok(SearchResult {
            entities,
            approximate_count,
        })
    }

    async fn get_lineage_info(
        &self,
        guid: &str,
        direction: LineageQueryDirection,
        depth: u32,
    ) -> Result<LineageInfo> {
        let mut state = self.state.write().await;
        state.begin("get_lineage_info")?;
        if !state.entities.contains_key(guid) {
            return Err(ClientError::NotFound(format!("entity {guid}")));
        }

        let mut collector = LineageCollector::default();
        collector.touch(&state, guid);
        if matches!(
            direction,
            LineageQueryDirection::Input | LineageQueryDirection::Both
        ) {
            collector.walk(&state, guid, depth, true);
        }
        if matches!(
            direction,
            LineageQueryDirection::Output | LineageQueryDirection::Both
        ) {
            collector.walk(&state, guid, depth, false);
        }

        Ok(LineageInfo {
            base_entity_guid: guid.to_string(),
            lineage_direction: direction,
            lineage_depth: depth,
            guid_entity_map: collector.headers,
            relations: collector.relations,
        })
    }

    async fn get_metrics(&self) -> Result<Option<MetricsSnapshot>> {
        let mut state = self.state.write().await;
        state.begin("get_metrics")?;
        Ok(state.metrics.clone())
    }

    async fn create_entity(&self, entity: GraphEntity) -> Result<String> {
        let mut state = self.state.write().await;
        state.begin("create_entity")?;

        let existing = entity.qualified_name().and_then(|qn| {
            state
                .find_unique(&entity.type_name, QUALIFIED_NAME, qn)
                .map(|e| e.guid.clone())
        });
        match existing {
            Some(guid) => {
                let target = state.entity_mut(&guid)?;
                merge_attributes(target, entity.attributes.unwrap_or_default());
                Ok(guid)
            }
            None => Ok(state.insert(entity)),
        }
    }

    async fn update_entity(&self, entity: GraphEntity) -> Result<()> {
        let mut state = self.state.write().await;
        state.begin("update_entity")?;
        let target = state.entity_mut(&entity.guid)?;
        target.status = entity.status;
        merge_attributes(target, entity.attributes.unwrap_or_default());
        Ok(())
    }

    async fn partial_update_entity_by_guid(
        &self,
        guid: &str,
        attribute: &str,
        value: Value,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        state.begin("partial_update_entity_by_guid")?;
        let target = state.entity_mut(guid)?;
        target
            .attributes
            .get_or_insert_with(Map::new)
            .insert(attribute.to_string(), value);
        Ok(())
    }

    async fn create_relationship(&self, relationship: Relationship) -> Result<Relationship> {
        let mut state = self.state.write().await;
        state.begin("create_relationship")?;

        let end1_name = display_name(&state, &relationship.end1.guid)?;
        let end2_name = display_name(&state, &relationship.end2.guid)?;

        let guid = new_guid();
        let stored = Relationship {
            guid: Some(guid.clone()),
            ..relationship
        };

        if stored.type_name == OWNERSHIP_RELATIONSHIP {
            link(
                state.entity_mut(&stored.end1.guid)?,
                "ownedBy",
                &stored.end2,
                &end2_name,
                &guid,
                &stored.type_name,
            );
            link(
                state.entity_mut(&stored.end2.guid)?,
                "owns",
                &stored.end1,
                &end1_name,
                &guid,
                &stored.type_name,
            );
        }

        state.relationships.insert(guid, stored.clone());
        Ok(stored)
    }

    async fn delete_relationship_by_guid(&self, guid: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state.begin("delete_relationship_by_guid")?;

        let mut found = state.relationships.remove(guid).is_some();
        for entity in state.entities.values_mut() {
            for value in entity.relationship_attributes.values_mut() {
                let refs: Vec<&mut Value> = match value {
                    Value::Array(items) => items.iter_mut().collect(),
                    single @ Value::Object(_) => vec![single],
                    _ => Vec::new(),
                };
                for item in refs {
                    if item.get("relationshipGuid").and_then(Value::as_str) == Some(guid) {
                        item["relationshipStatus"] = json!("DELETED");
                        found = true;
                    }
                }
            }
        }

        if found {
            Ok(())
        } else {
            Err(ClientError::NotFound(format!("relationship {guid}")))
        }
    }

    async fn get_all_glossaries(&self) -> Result<Vec<Glossary>> {
        let mut state = self.state.write().await;
        state.begin("get_all_glossaries")?;
        Ok(state.glossaries.clone())
    }

    async fn create_glossary(&self, name: &str) -> Result<Glossary> {
        let mut state = self.state.write().await;
        state.begin("create_glossary")?;
        if state.glossaries.iter().any(|g| g.name == name) {
            return Err(ClientError::Conflict(format!("glossary {name} exists")));
        }
        let glossary = Glossary {
            guid: new_guid(),
            name: name.to_string(),
            qualified_name: Some(name.to_string()),
        };
        state.glossaries.push(glossary.clone());
        Ok(glossary)
    }

    async fn create_glossary_term(&self, name: &str, glossary_guid: &str) -> Result<GraphEntity> {
        let mut state = self.state.write().await;
        state.begin("create_glossary_term")?;

        let glossary = state
            .glossaries
            .iter()
            .find(|g| g.guid == glossary_guid)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("glossary {glossary_guid}")))?;

        let qualified_name = format!("{name}@{}", glossary.name);
        if state
            .find_unique(GLOSSARY_TERM_TYPE, QUALIFIED_NAME, &qualified_name)
            .is_some()
        {
            return Err(ClientError::Conflict(format!("term {qualified_name} exists")));
        }

        let mut attributes = Map::new();
        attributes.insert("name".into(), json!(name));
        attributes.insert(QUALIFIED_NAME.into(), json!(qualified_name));
        attributes.insert(ASSIGNED_ENTITIES.into(), json!([]));
        attributes.insert("anchor".into(), json!({ "glossaryGuid": glossary.guid }));

        let guid = state.insert(GraphEntity::new(GLOSSARY_TERM_TYPE, attributes));
        state
            .entities
            .get(&guid)
            .cloned()
            .ok_or_else(|| ClientError::Internal(anyhow::anyhow!("term {guid} vanished")))
    }

    async fn get_entities_assigned_with_term(
        &self,
        term_guid: &str,
    ) -> Result<Vec<RelatedObjectId>> {
        let mut state = self.state.write().await;
        state.begin("get_entities_assigned_with_term")?;
        let term = state
            .entities
            .get(term_guid)
            .ok_or_else(|| ClientError::NotFound(format!("term {term_guid}")))?;
        Ok(assigned_entities(term))
    }

    async fn assign_term_to_entities(
        &self,
        term_guid: &str,
        entities: &[RelatedObjectId],
    ) -> Result<()> {
        let mut state = self.state.write().await;
        state.begin("assign_term_to_entities")?;

        let term = state
            .entities
            .get(term_guid)
            .ok_or_else(|| ClientError::NotFound(format!("term {term_guid}")))?;
        let term_name = term.str_attribute("name").unwrap_or_default().to_string();
        let already: HashSet<String> = assigned_entities(term).into_iter().map(|r| r.guid).collect();

        for target in entities {
            if already.contains(&target.guid) {
                return Err(ClientError::Conflict(format!(
                    "term {term_guid} already assigned to {}",
                    target.guid
                )));
            }
            let target_name = display_name(&state, &target.guid)?;
            let relationship_guid = new_guid();

            let assigned = RelatedObjectId {
                guid: target.guid.clone(),
                type_name: target.type_name.clone(),
                relationship_guid: Some(relationship_guid.clone()),
                display_text: Some(target_name),
            };
            let term = state.entity_mut(term_guid)?;
            push_attribute(term, ASSIGNED_ENTITIES, to_json(&assigned)?);

            let meaning = json!({
                "guid": term_guid,
                "typeName": GLOSSARY_TERM_TYPE,
                "relationshipGuid": relationship_guid,
                "relationshipStatus": "ACTIVE",
                "entityStatus": "ACTIVE",
                "displayText": term_name,
            });
            let entity = state.entity_mut(&target.guid)?;
            push_relationship(entity, MEANINGS, meaning);
        }
        Ok(())
    }

    async fn disassociate_term_from_entities(
        &self,
        term_guid: &str,
        entities: &[RelatedObjectId],
    ) -> Result<()> {
        let mut state = self.state.write().await;
        state.begin("disassociate_term_from_entities")?;

        for target in entities {
            let term = state.entity_mut(term_guid)?;
            let assigned = term
                .attributes
                .as_mut()
                .and_then(|attrs| attrs.get_mut(ASSIGNED_ENTITIES))
                .and_then(Value::as_array_mut);
            let Some(assigned) = assigned else {
                return Err(ClientError::InvalidRequest(format!(
                    "term {term_guid} has no assigned entities"
                )));
            };
            let before = assigned.len();
            assigned.retain(|item| item.get("guid").and_then(Value::as_str) != Some(&target.guid));
            if assigned.len() == before {
                return Err(ClientError::InvalidRequest(format!(
                    "term {term_guid} is not assigned to {}",
                    target.guid
                )));
            }

            if let Some(entity) = state.entities.get_mut(&target.guid) {
                if let Some(Value::Array(meanings)) =
                    entity.relationship_attributes.get_mut(MEANINGS)
                {
                    meanings
                        .retain(|item| item.get("guid").and_then(Value::as_str) != Some(term_guid));
                }
            }
        }
        Ok(())
    }
}

// ── Lineage collection ────────────────────────────────────────

#[derive(Default)]
struct LineageCollector {
    headers: HashMap<String, EntityHeader>,
    relations: Vec<LineageRelation>,
    seen: HashSet<(String, String)>,
}

impl LineageCollector {
    fn touch(&mut self, state: &CatalogState, guid: &str) {
        if !self.headers.contains_key(guid) {
            if let Some(header) = state.header(guid) {
                self.headers.insert(guid.to_string(), header);
            }
        }
    }

    fn relate(&mut self, from: &str, to: &str) {
        if self.seen.insert((from.to_string(), to.to_string())) {
            self.relations.push(LineageRelation {
                from_entity_id: from.to_string(),
                to_entity_id: to.to_string(),
                relationship_id: None,
            });
        }
    }

    /// Breadth-first over process entities, `depth` dataset hops from `root`.
    fn walk(&mut self, state: &CatalogState, root: &str, depth: u32, upstream: bool) {
        let mut visited: HashSet<String> = HashSet::from([root.to_string()]);
        let mut frontier: VecDeque<(String, u32)> = VecDeque::from([(root.to_string(), 0)]);

        while let Some((node, hops)) = frontier.pop_front() {
            if hops >= depth {
                continue;
            }
            for process in state.processes() {
                let inputs = process.attribute("inputs").map(ref_guids).unwrap_or_default();
                let outputs = process.attribute("outputs").map(ref_guids).unwrap_or_default();
                let (near, far) = if upstream {
                    (&outputs, &inputs)
                } else {
                    (&inputs, &outputs)
                };
                if !near.contains(&node) {
                    continue;
                }

                self.touch(state, &process.guid);
                if upstream {
                    self.relate(&process.guid, &node);
                } else {
                    self.relate(&node, &process.guid);
                }
                for next in far {
                    self.touch(state, next);
                    if upstream {
                        self.relate(next, &process.guid);
                    } else {
                        self.relate(&process.guid, next);
                    }
                    if visited.insert(next.clone()) {
                        frontier.push_back((next.clone(), hops + 1));
                    }
                }
            }
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────

fn new_guid() -> String {
    Uuid::new_v4().to_string()
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| ClientError::Internal(e.into()))
}

/// Guids referenced by an attribute value: `{"guid": ..}` or a list of them.
fn ref_guids(value: &Value) -> Vec<String> {
    match value {
        Value::Object(obj) => obj
            .get("guid")
            .and_then(Value::as_str)
            .map(|g| vec![g.to_string()])
            .unwrap_or_default(),
        Value::Array(items) => items.iter().flat_map(ref_guids).collect(),
        _ => Vec::new(),
    }
}

fn type_matches(entity_type: &str, wanted: &str, include_sub_types: bool) -> bool {
    entity_type == wanted
        || (include_sub_types
            && entity_type
                .to_ascii_lowercase()
                .ends_with(&format!("_{}", wanted.to_ascii_lowercase())))
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn criterion_matches(entity: &GraphEntity, criterion: &Criterion) -> bool {
    let Some(actual) = entity.attribute(&criterion.attribute_name) else {
        return false;
    };
    let expected = criterion.attribute_value.as_str();
    match criterion.operator {
        FilterOperator::Gte | FilterOperator::Lte => {
            let (Some(actual), Ok(expected)) = (as_number(actual), expected.parse::<f64>()) else {
                return false;
            };
            if criterion.operator == FilterOperator::Gte {
                actual >= expected
            } else {
                actual <= expected
            }
        }
        operator => {
            let Some(actual) = as_text(actual) else {
                return false;
            };
            match operator {
                FilterOperator::Eq => actual == expected,
                FilterOperator::Neq => actual != expected,
                FilterOperator::StartsWith => actual.starts_with(expected),
                FilterOperator::EndsWith => actual.ends_with(expected),
                FilterOperator::Contains => actual.contains(expected),
                FilterOperator::Gte | FilterOperator::Lte => unreachable!(),
            }
        }
    }
}

fn filters_match(entity: &GraphEntity, filters: &FilterCriteria) -> bool {
    let mut results = filters.criterion.iter().map(|c| criterion_matches(entity, c));
    match filters.condition {
        Condition::And => results.all(|m| m),
        Condition::Or => results.any(|m| m),
    }
}

fn merge_attributes(target: &mut GraphEntity, attributes: Map<String, Value>) {
    let existing = target.attributes.get_or_insert_with(Map::new);
    for (key, value) in attributes {
        existing.insert(key, value);
    }
}

fn push_attribute(entity: &mut GraphEntity, name: &str, value: Value) {
    let attrs = entity.attributes.get_or_insert_with(Map::new);
    match attrs.get_mut(name) {
        Some(Value::Array(items)) => items.push(value),
        _ => {
            attrs.insert(name.to_string(), Value::Array(vec![value]));
        }
    }
}

fn push_relationship(entity: &mut GraphEntity, name: &str, value: Value) {
    match entity.relationship_attributes.get_mut(name) {
        Some(Value::Array(items)) => items.push(value),
        _ => {
            entity
                .relationship_attributes
                .insert(name.to_string(), Value::Array(vec![value]));
        }
    }
}

fn display_name(state: &CatalogState, guid: &str) -> Result<String> {
    let entity = state
        .entities
        .get(guid)
        .ok_or_else(|| ClientError::NotFound(format!("entity {guid}")))?;
    Ok(entity
        .qualified_name()
        .or_else(|| entity.str_attribute("name"))
        .unwrap_or(guid)
        .to_string())
}

fn link(
    holder: &mut GraphEntity,
    attribute: &str,
    other: &ObjectId,
    other_name: &str,
    relationship_guid: &str,
    relationship_type: &str,
) {
    push_relationship(
        holder,
        attribute,
        json!({
            "guid": other.guid,
            "typeName": other.type_name,
            "relationshipGuid": relationship_guid,
            "relationshipType": relationship_type,
            "relationshipStatus": "ACTIVE",
            "entityStatus": "ACTIVE",
            "displayText": other_name,
        }),
    );
}

fn assigned_entities(term: &GraphEntity) -> Vec<RelatedObjectId> {
    term.attribute(ASSIGNED_ENTITIES)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}
