//! Owners, readers and users.

use std::collections::HashSet;

use catalog_client::{
    GraphEntity, ObjectId, Relationship, RelationshipRef, Status, OWNERSHIP_RELATIONSHIP,
    QUALIFIED_NAME,
};
use metadata_types::{Reader, User};
use serde_json::{json, Map};
use tracing::{info, instrument, warn};

use crate::error::{ProxyError, Result};
use crate::fetcher::{active_ref_guids, int_attribute, USER_TYPE};
use crate::keys::TableKey;
use crate::user_details::{resolve_user, UserDetailResolver};
use crate::AtlasProxy;

/// Resolve owner refs into unique users.
///
/// Only refs whose relationship and entity are both ACTIVE are kept. The
/// fallback owner is appended last unless a user with the same identity key
/// is already present.
pub fn resolve_owners(
    resolver: &dyn UserDetailResolver,
    data_owners: &[RelationshipRef],
    fallback_owner: Option<&str>,
) -> Vec<User> {
    let mut seen = HashSet::new();
    let mut owners = Vec::new();

    let active_ids = data_owners
        .iter()
        .filter(|owner| owner.is_active())
        .filter_map(|owner| owner.display_text.as_deref().or(owner.guid.as_deref()));
    let fallback = fallback_owner.filter(|id| !id.is_empty());

    for user_id in active_ids.chain(fallback) {
        let user = resolve_user(resolver, user_id);
        let fresh = match user.identity_key() {
            Some(key) => seen.insert(key.to_string()),
            None => true,
        };
        if fresh {
            owners.push(user);
        }
    }
    owners
}

impl AtlasProxy {
    pub(crate) fn get_owners(&self, entity: &GraphEntity) -> Vec<User> {
        resolve_owners(
            self.user_details.as_ref(),
            &entity.relationship_refs("ownedBy"),
            entity.str_attribute("owner"),
        )
    }

    /// Readers of `entity`, most reads first, at most `limit`.
    pub(crate) async fn get_readers(&self, entity: &GraphEntity, limit: usize) -> Result<Vec<Reader>> {
        let guids = active_ref_guids(entity, "readers");
        if guids.is_empty() {
            return Ok(Vec::new());
        }

        let mut readers: Vec<Reader> = self
            .fetch_by_guids(&guids)
            .await?
            .into_iter()
            .filter(GraphEntity::is_active)
            .filter_map(|reader| {
                let read_count = int_attribute(&reader, "count").unwrap_or(0);
                if read_count < self.settings.min_reader_count {
                    return None;
                }
                let Some(user_id) = reader.relationship_ref("user").and_then(|u| u.display_text)
                else {
                    warn!(guid = %reader.guid, "reader without user, skipping");
                    return None;
                };
                Some(Reader {
                    user: resolve_user(self.user_details.as_ref(), &user_id),
                    read_count,
                })
            })
            .collect();

        readers.sort_by(|a, b| b.read_count.cmp(&a.read_count));
        readers.truncate(limit);
        Ok(readers)
    }

    /// Make `owner` an owner of the table, creating the user entity if needed.
    #[instrument(skip(self))]
    pub async fn add_owner(&self, table_uri: &str, owner: &str) -> Result<()> {
        let key = TableKey::parse(table_uri)?;
        let table = self.get_table_entity(&key).await?;

        let mut attributes = Map::new();
        attributes.insert(QUALIFIED_NAME.into(), json!(owner));
        attributes.insert("name".into(), json!(owner));
        attributes.insert("email".into(), json!(owner));
        let user_guid = self
            .client
            .create_entity(GraphEntity::new(USER_TYPE, attributes))
            .await?;

        self.client
            .create_relationship(Relationship {
                guid: None,
                type_name: OWNERSHIP_RELATIONSHIP.to_string(),
                end1: ObjectId {
                    guid: table.entity.guid.clone(),
                    type_name: "Table".to_string(),
                },
                end2: ObjectId {
                    guid: user_guid.clone(),
                    type_name: USER_TYPE.to_string(),
                },
            })
            .await?;

        info!(table = %key, owner, user_guid = %user_guid, "owner added");
        Ok(())
    }

    /// Remove the active ownership edge between the table and `owner`.
    #[instrument(skip(self))]
    pub async fn delete_owner(&self, table_uri: &str, owner: &str) -> Result<()> {
        let key = TableKey::parse(table_uri)?;
        let table = self.get_table_entity(&key).await?;

        let relationship_guid = table
            .entity
            .relationship_refs("ownedBy")
            .into_iter()
            .find(|r| {
                r.relationship_status == Some(Status::Active)
                    && r.display_text.as_deref() == Some(owner)
            })
            .and_then(|r| r.relationship_guid)
            .ok_or_else(|| ProxyError::bad_request("You can not delete this owner"))?;

        self.client
            .delete_relationship_by_guid(&relationship_guid)
            .await?;
        info!(table = %key, owner, "owner removed");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, user_id: &str) -> Result<User> {
        Ok(resolve_user(self.user_details.as_ref(), user_id))
    }
}
