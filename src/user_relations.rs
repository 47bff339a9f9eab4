//! Resources related to a user: bookmarks, ownership, reads, popularity.

use std::collections::HashSet;

use catalog_client::{
    Criterion, FilterOperator, GraphEntity, SearchParameters, SortOrder, QUALIFIED_NAME,
};
use metadata_types::{PopularTable, ResourceType, UserResourceRel};
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::error::{ProxyError, Result};
use crate::fetcher::{int_attribute, int_value, USER_TYPE};
use crate::keys::TableKey;
use crate::tables::popular_table;
use crate::AtlasProxy;

pub(crate) const BOOKMARK_TYPE: &str = "Bookmark";
const TABLE_SEARCH_TYPE: &str = "Table";
const ENTITY_URI: &str = "entityUri";

impl AtlasProxy {
    /// Tables the user follows (bookmarks) or owns.
    #[instrument(skip(self))]
    pub async fn get_table_by_user_relation(
        &self,
        user_email: &str,
        relation_type: UserResourceRel,
    ) -> Result<Vec<PopularTable>> {
        match relation_type {
            UserResourceRel::Follow => self.get_followed_tables(user_email).await,
            UserResourceRel::Own => self.get_owned_tables(user_email).await,
            UserResourceRel::Read => Err(ProxyError::NotImplemented(
                "read relations are served by get_frequently_used_tables".into(),
            )),
        }
    }

    async fn get_followed_tables(&self, user_id: &str) -> Result<Vec<PopularTable>> {
        let params = SearchParameters::for_type(BOOKMARK_TYPE)
            .with_filter(Criterion::new("active", FilterOperator::Eq, "true"))
            .with_filter(Criterion::new(
                QUALIFIED_NAME,
                FilterOperator::Contains,
                format!(".{user_id}.bookmark"),
            ))
            .with_attributes([ENTITY_URI]);
        let bookmarks = self.client.faceted_search(&params).await?;
        debug!(user_id, bookmarks = bookmarks.entities.len(), "fetched bookmarks");

        Ok(bookmarks
            .entities
            .iter()
            .filter_map(|bookmark| {
                let uri = bookmark.str_attribute(ENTITY_URI)?;
                match TableKey::parse(uri) {
                    Ok(key) => Some(PopularTable {
                        database: key.database,
                        cluster: key.cluster,
                        schema: key.schema,
                        name: key.table,
                        description: None,
                    }),
                    Err(_) => {
                        warn!(guid = %bookmark.guid, uri, "bookmark with unparseable entityUri, skipping");
                        None
                    }
                }
            })
            .collect())
    }

    /// Tables owned through ownership edges or named by their `owner` attribute.
    async fn get_owned_tables(&self, user_id: &str) -> Result<Vec<PopularTable>> {
        let user = self.get_user_entity(user_id).await?;

        let mut guids: Vec<String> = user
            .entity
            .active_relationship_refs("owns")
            .into_iter()
            .filter(|r| {
                r.type_name
                    .as_deref()
                    .is_some_and(|t| t.to_ascii_lowercase().ends_with("table"))
            })
            .filter_map(|r| r.guid)
            .collect();

        let params = SearchParameters::for_type(TABLE_SEARCH_TYPE)
            .with_filter(Criterion::new("owner", FilterOperator::StartsWith, user_id))
            .with_attributes(["owner"]);
        let by_attribute = self.client.faceted_search(&params).await?;
        guids.extend(by_attribute.entities.into_iter().map(|e| e.guid));

        let mut seen = HashSet::new();
        guids.retain(|guid| seen.insert(guid.clone()));

        Ok(self
            .fetch_by_guids(&guids)
            .await?
            .iter()
            .filter(|e| e.is_active())
            .filter_map(popular_table)
            .collect())
    }

    /// Tables the user reads, most-read first.
    #[instrument(skip(self))]
    pub async fn get_frequently_used_tables(&self, user_email: &str) -> Result<Vec<PopularTable>> {
        let user = self.get_user_entity(user_email).await?;
        let reader_guids: Vec<String> = user
            .entity
            .active_relationship_refs("entityReads")
            .into_iter()
            .filter_map(|r| r.guid)
            .collect();

        let mut reads: Vec<(i64, PopularTable)> = self
            .fetch_by_guids(&reader_guids)
            .await?
            .iter()
            .filter(|reader| reader.is_active())
            .filter_map(|reader| {
                let count = int_attribute(reader, "count").filter(|c| *c > 0)?;
                let uri = reader.str_attribute(ENTITY_URI)?;
                let Ok(key) = TableKey::parse(uri) else {
                    warn!(guid = %reader.guid, uri, "reader with unparseable entityUri, skipping");
                    return None;
                };
                Some((
                    count,
                    PopularTable {
                        database: key.database,
                        cluster: key.cluster,
                        schema: key.schema,
                        name: key.table,
                        description: None,
                    },
                ))
            })
            .collect();

        reads.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(reads.into_iter().map(|(_, table)| table).collect())
    }

    /// Most popular tables with at least the configured reader count.
    #[instrument(skip(self))]
    pub async fn get_popular_tables(&self, num_entries: usize) -> Result<Vec<PopularTable>> {
        let params = SearchParameters::for_type(TABLE_SEARCH_TYPE)
            .with_filter(Criterion::new(
                "popularityScore",
                FilterOperator::Gte,
                self.settings.min_reader_count.to_string(),
            ))
            .sorted_by("popularityScore", SortOrder::Descending)
            .with_limit(num_entries)
            .with_attributes(["name", "description", QUALIFIED_NAME]);
        let result = self.client.faceted_search(&params).await?;
        Ok(result.entities.iter().filter_map(popular_table).collect())
    }

    /// Timestamp of the last processed catalog update, 0 when unknown.
    #[instrument(skip(self))]
    pub async fn get_latest_updated_ts(&self) -> Result<i64> {
        let Some(metrics) = self.client.get_metrics().await? else {
            return Ok(0);
        };
        Ok(metrics
            .general_stat(&self.settings.latest_updated_ts_field)
            .and_then(|value| match value {
                Value::Number(n) => n.as_i64(),
                Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
                    int_value(value)
                }
                _ => None,
            })
            .unwrap_or(0))
    }

    #[instrument(skip(self))]
    pub async fn add_resource_relation_by_user(
        &self,
        id: &str,
        user_id: &str,
        relation_type: UserResourceRel,
        resource_type: ResourceType,
    ) -> Result<()> {
        self.set_bookmark(id, user_id, relation_type, resource_type, true)
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete_resource_relation_by_user(
        &self,
        id: &str,
        user_id: &str,
        relation_type: UserResourceRel,
        resource_type: ResourceType,
    ) -> Result<()> {
        self.set_bookmark(id, user_id, relation_type, resource_type, false)
            .await
    }

    async fn set_bookmark(
        &self,
        id: &str,
        user_id: &str,
        relation_type: UserResourceRel,
        resource_type: ResourceType,
        active: bool,
    ) -> Result<()> {
        if resource_type != ResourceType::Table || relation_type != UserResourceRel::Follow {
            return Err(ProxyError::NotImplemented(format!(
                "{relation_type:?} relation on {resource_type} is not supported"
            )));
        }
        let key = TableKey::parse(id)?;
        let mut bookmark = self.get_or_create_bookmark(&key, user_id).await?;
        bookmark
            .attributes
            .get_or_insert_with(Map::new)
            .insert("active".into(), json!(active));
        self.client.update_entity(bookmark).await?;
        info!(table = %key, user_id, active, "bookmark updated");
        Ok(())
    }

    async fn get_or_create_bookmark(&self, key: &TableKey, user_id: &str) -> Result<GraphEntity> {
        let qualified_name = key.bookmark_qualified_name(user_id);
        match self.fetch_unique(BOOKMARK_TYPE, &qualified_name).await {
            Ok(found) => return Ok(found.entity),
            Err(ProxyError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let table = self.get_table_entity(key).await?;
        let user = self.get_user_entity(user_id).await?;

        let mut attributes = Map::new();
        attributes.insert(QUALIFIED_NAME.into(), json!(qualified_name));
        attributes.insert("name".into(), json!(qualified_name));
        attributes.insert("active".into(), json!(true));
        attributes.insert(ENTITY_URI.into(), json!(key.to_string()));
        attributes.insert(
            "user".into(),
            json!({"guid": user.entity.guid, "typeName": USER_TYPE}),
        );
        attributes.insert(
            "entity".into(),
            json!({"guid": table.entity.guid, "typeName": table.entity.type_name}),
        );
        let guid = self
            .client
            .create_entity(GraphEntity::new(BOOKMARK_TYPE, attributes))
            .await?;
        info!(table = %key, user_id, guid = %guid, "bookmark created");

        Ok(self.fetch_unique(BOOKMARK_TYPE, &qualified_name).await?.entity)
    }
}
