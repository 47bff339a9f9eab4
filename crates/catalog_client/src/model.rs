//! Wire model of the graph catalog.
//!
//! Field names follow the backend's camelCase JSON so fixtures and real
//! responses deserialize without translation. Attribute maps stay loosely
//! typed here; the proxy validates them into explicit records at its mapping
//! boundary.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const QUALIFIED_NAME: &str = "qualifiedName";

/// Entity type of glossary terms.
pub const GLOSSARY_TERM_TYPE: &str = "AtlasGlossaryTerm";

/// Relationship type linking a dataset (end1) to its owning user (end2).
pub const OWNERSHIP_RELATIONSHIP: &str = "DataSet_Users_Owner";

// ── Status ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Active,
    Inactive,
    Deleted,
    Purged,
}

// ── Entities ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub type_name: String,
    #[serde(default)]
    pub entity_guid: Option<String>,
    #[serde(default)]
    pub entity_status: Option<Status>,
}

/// A node of the metadata graph.
///
/// `attributes` is optional on the wire: a record without it is malformed
/// and rejected by the proxy rather than defaulted here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEntity {
    #[serde(default)]
    pub guid: String,
    pub type_name: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,
    #[serde(default)]
    pub relationship_attributes: Map<String, Value>,
    #[serde(default)]
    pub classifications: Vec<Classification>,
    /// Epoch milliseconds.
    #[serde(default)]
    pub update_time: Option<i64>,
    #[serde(default)]
    pub create_time: Option<i64>,
}

impl GraphEntity {
    pub fn new(type_name: impl Into<String>, attributes: Map<String, Value>) -> Self {
        Self {
            type_name: type_name.into(),
            attributes: Some(attributes),
            ..Self::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.as_ref().and_then(|attrs| attrs.get(name))
    }

    pub fn str_attribute(&self, name: &str) -> Option<&str> {
        self.attribute(name).and_then(Value::as_str)
    }

    pub fn qualified_name(&self) -> Option<&str> {
        self.str_attribute(QUALIFIED_NAME)
    }

    /// Relationship refs under `name`, accepting either a list or a single ref.
    /// Entries that do not decode as refs are skipped.
    pub fn relationship_refs(&self, name: &str) -> Vec<RelationshipRef> {
        match self.relationship_attributes.get(name) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect(),
            Some(single @ Value::Object(_)) => serde_json::from_value(single.clone())
                .map(|r| vec![r])
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// First relationship ref under `name`.
    pub fn relationship_ref(&self, name: &str) -> Option<RelationshipRef> {
        self.relationship_refs(name).into_iter().next()
    }

    /// Refs under `name` whose relationship and entity are both active.
    pub fn active_relationship_refs(&self, name: &str) -> Vec<RelationshipRef> {
        self.relationship_refs(name)
            .into_iter()
            .filter(RelationshipRef::is_active)
            .collect()
    }
}

/// An edge end as carried in `relationshipAttributes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipRef {
    #[serde(default)]
    pub guid: Option<String>,
    #[serde(default)]
    pub type_name: Option<String>,
    #[serde(default)]
    pub relationship_guid: Option<String>,
    #[serde(default)]
    pub relationship_type: Option<String>,
    #[serde(default)]
    pub relationship_status: Option<Status>,
    #[serde(default)]
    pub entity_status: Option<Status>,
    #[serde(default)]
    pub display_text: Option<String>,
}

impl RelationshipRef {
    pub fn is_active(&self) -> bool {
        self.relationship_status == Some(Status::Active) && self.entity_status == Some(Status::Active)
    }
}

/// A detail fetch: the entity plus the entities it embeds inline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityWithExtInfo {
    pub entity: GraphEntity,
    #[serde(default)]
    pub referred_entities: HashMap<String, GraphEntity>,
}

/// Reference to an entity by guid and type, as used for term assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedObjectId {
    pub guid: String,
    #[serde(default)]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_guid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_text: Option<String>,
}

impl RelatedObjectId {
    pub fn new(guid: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            type_name: Some(type_name.into()),
            ..Self::default()
        }
    }
}

// ── Relationships ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectId {
    pub guid: String,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    #[serde(default)]
    pub guid: Option<String>,
    pub type_name: String,
    pub end1: ObjectId,
    pub end2: ObjectId,
}

// ── Glossary ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Glossary {
    pub guid: String,
    pub name: String,
    #[serde(default)]
    pub qualified_name: Option<String>,
}

// ── Search ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Condition {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Neq,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "startsWith")]
    StartsWith,
    #[serde(rename = "endsWith")]
    EndsWith,
    #[serde(rename = "contains")]
    Contains,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    pub attribute_name: String,
    pub operator: FilterOperator,
    pub attribute_value: String,
}

impl Criterion {
    pub fn new(
        attribute_name: impl Into<String>,
        operator: FilterOperator,
        attribute_value: impl Into<String>,
    ) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            operator,
            attribute_value: attribute_value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub condition: Condition,
    pub criterion: Vec<Criterion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Faceted search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParameters {
    pub type_name: String,
    pub exclude_deleted_entities: bool,
    pub include_sub_types: bool,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: Option<SortOrder>,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub entity_filters: Option<FilterCriteria>,
}

impl SearchParameters {
    /// Search active entities of `type_name` and its sub-types.
    pub fn for_type(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            exclude_deleted_entities: true,
            include_sub_types: true,
            limit: None,
            offset: 0,
            sort_by: None,
            sort_order: None,
            attributes: Vec::new(),
            entity_filters: None,
        }
    }

    /// AND a criterion onto the entity filters.
    pub fn with_filter(mut self, criterion: Criterion) -> Self {
        match self.entity_filters.as_mut() {
            Some(filters) => filters.criterion.push(criterion),
            None => {
                self.entity_filters = Some(FilterCriteria {
                    condition: Condition::And,
                    criterion: vec![criterion],
                })
            }
        }
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn sorted_by(mut self, attribute: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(attribute.into());
        self.sort_order = Some(order);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(default)]
    pub entities: Vec<GraphEntity>,
    #[serde(default)]
    pub approximate_count: i64,
}

// ── Lineage ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LineageQueryDirection {
    /// Upstream.
    Input,
    /// Downstream.
    Output,
    Both,
}

/// Entity summary embedded in lineage responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityHeader {
    pub guid: String,
    pub type_name: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub classification_names: Vec<String>,
    #[serde(default)]
    pub display_text: Option<String>,
}

impl EntityHeader {
    pub fn qualified_name(&self) -> Option<&str> {
        self.attributes.get(QUALIFIED_NAME).and_then(Value::as_str)
    }
}

impl From<&GraphEntity> for EntityHeader {
    fn from(entity: &GraphEntity) -> Self {
        Self {
            guid: entity.guid.clone(),
            type_name: entity.type_name.clone(),
            status: entity.status,
            attributes: entity.attributes.clone().unwrap_or_default(),
            classification_names: entity
                .classifications
                .iter()
                .map(|c| c.type_name.clone())
                .collect(),
            display_text: entity.qualified_name().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageRelation {
    pub from_entity_id: String,
    pub to_entity_id: String,
    #[serde(default)]
    pub relationship_id: Option<String>,
}

/// Relation graph around a base entity. May contain cycles and interposed
/// process nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageInfo {
    pub base_entity_guid: String,
    pub lineage_direction: LineageQueryDirection,
    pub lineage_depth: u32,
    #[serde(default)]
    pub guid_entity_map: HashMap<String, EntityHeader>,
    #[serde(default)]
    pub relations: Vec<LineageRelation>,
}

// ── Metrics ───────────────────────────────────────────────────

/// Admin metrics snapshot, kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricsSnapshot(pub Value);

impl MetricsSnapshot {
    /// `general.stats.<field>`
    pub fn general_stat(&self, field: &str) -> Option<&Value> {
        self.0.get("general")?.get("stats")?.get(field)
    }

    /// Names under `tag.tagEntities`.
    pub fn tag_entity_names(&self) -> Vec<String> {
        self.0
            .get("tag")
            .and_then(|tag| tag.get("tagEntities"))
            .and_then(Value::as_object)
            .map(|entities| entities.keys().cloned().collect())
            .unwrap_or_default()
    }
}
