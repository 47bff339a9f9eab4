//! Table and column mapping.

use catalog_client::{EntityWithExtInfo, GraphEntity, Status};
use metadata_types::{Column, PopularTable, ProgrammaticDescription, Table};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::config::Settings;
use crate::error::{ProxyError, Result};
use crate::fetcher::{first_str_attribute, int_attribute, int_value, require_attributes};
use crate::keys::{TableKey, TableQualifiedName};
use crate::stats::StatRules;
use crate::tags::{entity_badges, entity_tags};
use crate::watermarks::table_watermarks;
use crate::AtlasProxy;

const DEFAULT_COLUMN_POSITION: i64 = 9999;

impl AtlasProxy {
    #[instrument(skip(self))]
    pub async fn get_table(&self, table_uri: &str) -> Result<Table> {
        let key = TableKey::parse(table_uri)?;
        let detail = self.get_table_entity(&key).await?;
        let entity = &detail.entity;
        let attributes = require_attributes(entity)?;

        let parsed = entity.qualified_name().and_then(TableQualifiedName::parse);
        let (cluster, schema, parsed_name) = match parsed {
            Some(qn) => (qn.cluster, qn.schema, qn.table),
            None => (key.cluster.clone(), key.schema.clone(), key.table.clone()),
        };
        let name = entity
            .str_attribute("name")
            .map(str::to_string)
            .unwrap_or(parsed_name);

        let columns = map_columns(&detail, &self.settings.stat_rules)?;
        let report_guids: Vec<String> = entity
            .relationship_refs("reports")
            .into_iter()
            .filter_map(|r| r.guid)
            .collect();
        let resource_reports = self.get_reports(&report_guids).await?;
        let table_readers = self
            .get_readers(entity, self.settings.top_readers)
            .await?;

        let partition_names: Vec<String> = entity
            .active_relationship_refs("partitions")
            .into_iter()
            .filter_map(|r| r.display_text)
            .collect();

        let table = Table {
            database: key.database.clone(),
            cluster,
            schema,
            name,
            description: first_str_attribute(entity, &["description", "comment"])
                .map(str::to_string),
            tags: entity_tags(entity),
            badges: entity_badges(entity),
            table_readers,
            owners: self.get_owners(entity),
            watermarks: table_watermarks(&partition_names, &self.settings.watermark_formats),
            columns,
            resource_reports,
            programmatic_descriptions: programmatic_descriptions(attributes, &self.settings),
            is_view: entity
                .str_attribute("tableType")
                .is_some_and(|t| t.to_ascii_lowercase().contains("view")),
            last_updated_timestamp: entity.update_time.and_then(epoch_seconds),
        };
        debug!(table = %key, columns = table.columns.len(), "table mapped");
        Ok(table)
    }

    #[instrument(skip(self))]
    pub async fn get_table_description(&self, table_uri: &str) -> Result<Option<String>> {
        let key = TableKey::parse(table_uri)?;
        let detail = self.get_table_entity(&key).await?;
        require_attributes(&detail.entity)?;
        Ok(detail.entity.str_attribute("description").map(str::to_string))
    }

    #[instrument(skip(self, description))]
    pub async fn put_table_description(&self, table_uri: &str, description: &str) -> Result<()> {
        let key = TableKey::parse(table_uri)?;
        let detail = self.get_table_entity(&key).await?;
        self.client
            .partial_update_entity_by_guid(&detail.entity.guid, "description", json!(description))
            .await?;
        info!(table = %key, "table description updated");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_column_description(
        &self,
        table_uri: &str,
        column_name: &str,
    ) -> Result<Option<String>> {
        let key = TableKey::parse(table_uri)?;
        let detail = self.get_table_entity(&key).await?;
        let column = find_column(&detail, column_name)?;
        Ok(column.str_attribute("description").map(str::to_string))
    }

    #[instrument(skip(self, description))]
    pub async fn put_column_description(
        &self,
        table_uri: &str,
        column_name: &str,
        description: &str,
    ) -> Result<()> {
        let key = TableKey::parse(table_uri)?;
        let detail = self.get_table_entity(&key).await?;
        let column = find_column(&detail, column_name)?;
        self.client
            .partial_update_entity_by_guid(&column.guid, "description", json!(description))
            .await?;
        info!(table = %key, column = column_name, "column description updated");
        Ok(())
    }
}

/// Live column named `column_name` among the columns the table lists.
fn find_column<'a>(detail: &'a EntityWithExtInfo, column_name: &str) -> Result<&'a GraphEntity> {
    column_guids(&detail.entity)
        .iter()
        .filter_map(|guid| detail.referred_entities.get(guid))
        .filter(|column| column.status != Status::Deleted)
        .find(|column| column.str_attribute("name") == Some(column_name))
        .ok_or_else(|| ProxyError::not_found(format!("column '{column_name}'")))
}

/// Whole-second epoch from a millisecond timestamp: its first ten digits.
fn epoch_seconds(update_time: i64) -> Option<i64> {
    if update_time <= 0 {
        return None;
    }
    let digits = update_time.to_string();
    if digits.len() < 10 {
        return None;
    }
    digits[..10].parse().ok()
}

/// Column guids listed on the table, from attributes or relationships.
fn column_guids(entity: &GraphEntity) -> Vec<String> {
    let listed = entity
        .attribute("columns")
        .or_else(|| entity.relationship_attributes.get("columns"));
    match listed {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.get("guid").and_then(Value::as_str))
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

#[derive(Debug, Deserialize)]
struct RawStat {
    stat_name: String,
    #[serde(default)]
    stat_val: Option<Value>,
    #[serde(default)]
    start_epoch: Option<Value>,
    #[serde(default)]
    end_epoch: Option<Value>,
}

impl RawStat {
    /// Stats arrive either as `{attributes: {...}}` records or bare maps.
    fn from_value(value: &Value) -> Option<Self> {
        let inner = value.get("attributes").unwrap_or(value);
        serde_json::from_value(inner.clone()).ok()
    }
}

fn map_columns(detail: &EntityWithExtInfo, stat_rules: &StatRules) -> Result<Vec<Column>> {
    let mut columns = Vec::new();
    for guid in column_guids(&detail.entity) {
        let column = detail.referred_entities.get(&guid).ok_or_else(|| {
            ProxyError::bad_request(format!("column {guid} missing from referred entities"))
        })?;
        if column.status == Status::Deleted {
            continue;
        }
        require_attributes(column)?;
        let name = column
            .str_attribute("name")
            .ok_or_else(|| ProxyError::bad_request(format!("column {guid} has no name")))?;

        let stats = column
            .attribute("statistics")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        let Some(raw) = RawStat::from_value(item) else {
                            warn!(column = name, "malformed statistic, skipping");
                            return None;
                        };
                        stat_rules.apply(
                            &raw.stat_name,
                            raw.stat_val.as_ref(),
                            raw.start_epoch.as_ref().and_then(int_value),
                            raw.end_epoch.as_ref().and_then(int_value),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();

        columns.push(Column {
            name: name.to_string(),
            description: first_str_attribute(column, &["description", "comment"])
                .map(str::to_string),
            col_type: first_str_attribute(column, &["type", "dataType", "data_type"])
                .unwrap_or_default()
                .to_string(),
            sort_order: int_attribute(column, "position").unwrap_or(DEFAULT_COLUMN_POSITION),
            stats,
            badges: entity_badges(column),
        });
    }
    columns.sort_by_key(|c| c.sort_order);
    Ok(columns)
}

/// `testParameterKeyA` -> `test parameter key a`
fn split_camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if i > 0 && ch.is_uppercase() {
            out.push(' ');
        }
        out.extend(ch.to_lowercase());
    }
    out
}

fn programmatic_descriptions(
    attributes: &Map<String, Value>,
    settings: &Settings,
) -> Vec<ProgrammaticDescription> {
    let Some(Value::Object(parameters)) = attributes.get("parameters") else {
        return Vec::new();
    };
    let mut descriptions: Vec<ProgrammaticDescription> = parameters
        .iter()
        .filter(|(key, _)| !settings.is_excluded(key))
        .map(|(key, value)| ProgrammaticDescription {
            source: split_camel_case(key),
            text: match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        })
        .collect();
    descriptions.sort_by(|a, b| a.source.cmp(&b.source));
    descriptions
}

/// Lightweight table view of an entity. `None` when its qualifiedName does
/// not parse.
pub(crate) fn popular_table(entity: &GraphEntity) -> Option<PopularTable> {
    let Some(qn) = entity.qualified_name().and_then(TableQualifiedName::parse) else {
        warn!(guid = %entity.guid, "table with unparseable qualifiedName, skipping");
        return None;
    };
    Some(PopularTable {
        database: entity.type_name.clone(),
        cluster: qn.cluster,
        schema: qn.schema,
        name: entity
            .str_attribute("name")
            .map(str::to_string)
            .unwrap_or(qn.table),
        description: first_str_attribute(entity, &["description", "comment"]).map(str::to_string),
    })
}
