//! CatalogClient trait: the sole boundary between the metadata proxy and the
//! graph catalog backend.
//!
//! The proxy only ever talks to `Arc<dyn CatalogClient>`. Transport, retries
//! and backoff belong to the implementation; the proxy adds none of its own.
//!
//! `InMemoryCatalog` is an in-process implementation backed by a
//! `tokio::sync::RwLock`, used for tests and local wiring.

pub mod error;
pub mod memory;
pub mod model;

use async_trait::async_trait;
use serde_json::Value;

pub use error::ClientError;
pub use memory::InMemoryCatalog;
pub use model::*;

pub type Result<T> = std::result::Result<T, ClientError>;

#[async_trait]
pub trait CatalogClient: Send + Sync {
    // ── Reads ──────────────────────────────────────────────────

    /// Detail fetch by unique attribute, with referred entities.
    /// `Ok(None)` when no entity matches.
    async fn get_entity_by_unique_attribute(
        &self,
        type_name: &str,
        attribute: &str,
        value: &str,
    ) -> Result<Option<EntityWithExtInfo>>;

    async fn get_entity_by_guid(&self, guid: &str) -> Result<Option<EntityWithExtInfo>>;

    /// Bulk fetch. Unknown guids are omitted from the result.
    async fn get_entities_by_guids(&self, guids: &[String]) -> Result<Vec<GraphEntity>>;

    async fn faceted_search(&self, params: &SearchParameters) -> Result<SearchResult>;

    async fn get_lineage_info(
        &self,
        guid: &str,
        direction: LineageQueryDirection,
        depth: u32,
    ) -> Result<LineageInfo>;

    /// `None` when the backend has no metrics to report.
    async fn get_metrics(&self) -> Result<Option<MetricsSnapshot>>;

    // ── Entity mutations ───────────────────────────────────────

    /// Create an entity, or update the one with the same type and
    /// qualifiedName. Returns the assigned guid.
    async fn create_entity(&self, entity: GraphEntity) -> Result<String>;

    async fn update_entity(&self, entity: GraphEntity) -> Result<()>;

    async fn partial_update_entity_by_guid(
        &self,
        guid: &str,
        attribute: &str,
        value: Value,
    ) -> Result<()>;

    // ── Relationships ──────────────────────────────────────────

    async fn create_relationship(&self, relationship: Relationship) -> Result<Relationship>;

    async fn delete_relationship_by_guid(&self, guid: &str) -> Result<()>;

    // ── Glossary ───────────────────────────────────────────────

    async fn get_all_glossaries(&self) -> Result<Vec<Glossary>>;

    async fn create_glossary(&self, name: &str) -> Result<Glossary>;

    async fn create_glossary_term(&self, name: &str, glossary_guid: &str) -> Result<GraphEntity>;

    async fn get_entities_assigned_with_term(&self, term_guid: &str)
        -> Result<Vec<RelatedObjectId>>;

    async fn assign_term_to_entities(
        &self,
        term_guid: &str,
        entities: &[RelatedObjectId],
    ) -> Result<()>;

    async fn disassociate_term_from_entities(
        &self,
        term_guid: &str,
        entities: &[RelatedObjectId],
    ) -> Result<()>;
}
