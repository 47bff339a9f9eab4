//! Tags (glossary terms) and badges.
//!
//! A tag is a glossary term assigned to entities. Terms live in a single
//! glossary created on first use.
//!
//! Term creation is check-then-act against the backend: two concurrent
//! `add_tag` calls for a new tag name can both miss the lookup and both try
//! to create the term. Whether the second create fails or produces a
//! duplicate depends on the backend; a failure surfaces as
//! `ProxyError::Backend`.

use catalog_client::{
    Criterion, FilterOperator, GraphEntity, Glossary, RelatedObjectId, SearchParameters,
    GLOSSARY_TERM_TYPE,
};
use metadata_types::{Badge, ResourceType, Tag, TagDetail, DEFAULT_TAG_TYPE};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::error::{ProxyError, Result};
use crate::keys::TableKey;
use crate::AtlasProxy;

/// Glossary holding every tag term.
pub const TAG_GLOSSARY: &str = "default_glossary";

pub(crate) const DASHBOARD_TYPE: &str = "Dashboard";

impl AtlasProxy {
    /// All tags with the number of entities each is assigned to.
    #[instrument(skip(self))]
    pub async fn get_tags(&self) -> Result<Vec<TagDetail>> {
        let params = SearchParameters::for_type(GLOSSARY_TERM_TYPE)
            .with_attributes(["name", "assignedEntities"]);
        let result = self.client.faceted_search(&params).await?;
        debug!(terms = result.entities.len(), "fetched glossary terms");

        Ok(result
            .entities
            .iter()
            .filter_map(|term| {
                let Some(tag_name) = term.str_attribute("name") else {
                    warn!(guid = %term.guid, "glossary term without name, skipping");
                    return None;
                };
                let tag_count = term
                    .attribute("assignedEntities")
                    .and_then(Value::as_array)
                    .map_or(0, Vec::len);
                Some(TagDetail {
                    tag_name: tag_name.to_string(),
                    tag_count,
                })
            })
            .collect())
    }

    /// Badges known to the backend, from the metrics snapshot.
    #[instrument(skip(self))]
    pub async fn get_badges(&self) -> Result<Vec<Badge>> {
        let Some(metrics) = self.client.get_metrics().await? else {
            return Ok(Vec::new());
        };
        let mut names = metrics.tag_entity_names();
        names.sort();
        Ok(names.into_iter().map(Badge::classification).collect())
    }

    #[instrument(skip(self))]
    pub async fn add_tag(
        &self,
        id: &str,
        tag: &str,
        tag_type: &str,
        resource_type: ResourceType,
    ) -> Result<()> {
        let target = self.resolve_resource(id, resource_type).await?;
        let term = self.get_or_create_glossary_term(tag).await?;

        self.client
            .assign_term_to_entities(
                &term.guid,
                &[RelatedObjectId::new(target.guid.clone(), resource_type.as_str())],
            )
            .await?;
        info!(id, tag, term_guid = %term.guid, "tag assigned");
        Ok(())
    }

    /// Remove `tag` from the resource. A resource that does not carry the tag
    /// is left untouched.
    #[instrument(skip(self))]
    pub async fn delete_tag(
        &self,
        id: &str,
        tag: &str,
        tag_type: &str,
        resource_type: ResourceType,
    ) -> Result<()> {
        let target = self.resolve_resource(id, resource_type).await?;
        let term = self
            .find_glossary_term(tag)
            .await?
            .ok_or_else(|| ProxyError::not_found(format!("tag '{tag}'")))?;

        let assigned = self
            .client
            .get_entities_assigned_with_term(&term.guid)
            .await?;
        let Some(matched) = assigned.into_iter().find(|e| e.guid == target.guid) else {
            debug!(id, tag, "tag not assigned, nothing to remove");
            return Ok(());
        };

        self.client
            .disassociate_term_from_entities(&term.guid, &[matched])
            .await?;
        info!(id, tag, term_guid = %term.guid, "tag removed");
        Ok(())
    }

    pub(crate) async fn find_glossary_term(&self, name: &str) -> Result<Option<GraphEntity>> {
        let params = SearchParameters::for_type(GLOSSARY_TERM_TYPE)
            .with_filter(Criterion::new("name", FilterOperator::Eq, name))
            .with_limit(1);
        let result = self.client.faceted_search(&params).await?;
        Ok(result.entities.into_iter().next())
    }

    pub(crate) async fn get_or_create_glossary_term(&self, name: &str) -> Result<GraphEntity> {
        if let Some(term) = self.find_glossary_term(name).await? {
            return Ok(term);
        }
        let glossary = self.get_or_create_glossary().await?;
        let term = self
            .client
            .create_glossary_term(name, &glossary.guid)
            .await?;
        info!(name, guid = %term.guid, "glossary term created");
        Ok(term)
    }

    async fn get_or_create_glossary(&self) -> Result<Glossary> {
        let existing = self.client.get_all_glossaries().await?;
        if let Some(glossary) = existing.into_iter().find(|g| g.name == TAG_GLOSSARY) {
            return Ok(glossary);
        }
        let glossary = self.client.create_glossary(TAG_GLOSSARY).await?;
        info!(guid = %glossary.guid, "tag glossary created");
        Ok(glossary)
    }

    /// Backend entity behind a resource id.
    pub(crate) async fn resolve_resource(
        &self,
        id: &str,
        resource_type: ResourceType,
    ) -> Result<GraphEntity> {
        match resource_type {
            ResourceType::Table => {
                let key = TableKey::parse(id)?;
                Ok(self.get_table_entity(&key).await?.entity)
            }
            ResourceType::Dashboard => Ok(self.fetch_unique(DASHBOARD_TYPE, id).await?.entity),
            other => Err(ProxyError::NotImplemented(format!(
                "resource type {other} is not supported"
            ))),
        }
    }
}

/// Tags from the entity's active glossary-term refs.
pub(crate) fn entity_tags(entity: &GraphEntity) -> Vec<Tag> {
    entity
        .active_relationship_refs("meanings")
        .into_iter()
        .filter_map(|r| r.display_text)
        .map(|tag_name| Tag {
            tag_name,
            tag_type: DEFAULT_TAG_TYPE.to_string(),
        })
        .collect()
}

/// One badge per classification whose status is ACTIVE or unset.
pub(crate) fn entity_badges(entity: &GraphEntity) -> Vec<Badge> {
    entity
        .classifications
        .iter()
        .filter(|c| {
            c.entity_status
                .map_or(true, |s| s == catalog_client::Status::Active)
        })
        .map(|c| Badge::classification(c.type_name.clone()))
        .collect()
}
