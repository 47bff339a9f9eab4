//! Entity fetching.
//!
//! Thin wrappers over the catalog client. Unique-attribute lookups normalize
//! every backend failure to `NotFound`; bulk fetches and searches pass
//! backend errors through.

use catalog_client::{EntityWithExtInfo, GraphEntity, QUALIFIED_NAME};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ProxyError, Result};
use crate::keys::TableKey;
use crate::AtlasProxy;

pub(crate) const USER_TYPE: &str = "User";

impl AtlasProxy {
    pub(crate) async fn fetch_unique(
        &self,
        type_name: &str,
        qualified_name: &str,
    ) -> Result<EntityWithExtInfo> {
        debug!(type_name, qualified_name, "fetching entity");
        match self
            .client
            .get_entity_by_unique_attribute(type_name, QUALIFIED_NAME, qualified_name)
            .await
        {
            Ok(Some(found)) => Ok(found),
            Ok(None) => Err(ProxyError::not_found(format!(
                "{type_name} '{qualified_name}'"
            ))),
            Err(e) => {
                debug!(type_name, qualified_name, error = %e, "lookup failed, reporting not found");
                Err(ProxyError::not_found(format!(
                    "{type_name} '{qualified_name}'"
                )))
            }
        }
    }

    pub(crate) async fn get_table_entity(&self, key: &TableKey) -> Result<EntityWithExtInfo> {
        self.fetch_unique(key.type_name(), &key.qualified_name())
            .await
    }

    pub(crate) async fn get_user_entity(&self, user_id: &str) -> Result<EntityWithExtInfo> {
        self.fetch_unique(USER_TYPE, user_id).await
    }

    /// Bulk fetch in chunks of `bulk_fetch_chunk_size`. No call for an empty list.
    pub(crate) async fn fetch_by_guids(&self, guids: &[String]) -> Result<Vec<GraphEntity>> {
        let mut entities = Vec::with_capacity(guids.len());
        for chunk in guids.chunks(self.settings.chunk_size) {
            debug!(count = chunk.len(), "bulk fetching entities");
            entities.extend(self.client.get_entities_by_guids(chunk).await?);
        }
        Ok(entities)
    }
}

/// The entity's attribute map; its absence marks a malformed record.
pub(crate) fn require_attributes(entity: &GraphEntity) -> Result<&Map<String, Value>> {
    entity.attributes.as_ref().ok_or_else(|| {
        ProxyError::bad_request(format!(
            "{} {} has no attributes",
            entity.type_name, entity.guid
        ))
    })
}

/// Integer from a JSON number (truncating floats) or a numeric string.
pub(crate) fn int_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn int_attribute(entity: &GraphEntity, name: &str) -> Option<i64> {
    entity.attribute(name).and_then(int_value)
}

/// First non-empty string among `names`.
pub(crate) fn first_str_attribute<'a>(entity: &'a GraphEntity, names: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .filter_map(|name| entity.str_attribute(name))
        .find(|s| !s.is_empty())
}

/// Guids of active refs under `relation`.
pub(crate) fn active_ref_guids(entity: &GraphEntity, relation: &str) -> Vec<String> {
    entity
        .active_relationship_refs(relation)
        .into_iter()
        .filter_map(|r| r.guid)
        .collect()
}
