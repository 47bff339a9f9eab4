//! Metadata proxy.
//!
//! Adapts a property-graph metadata catalog (entities, typed attributes,
//! relationship edges) into the table/column/owner/tag/lineage/dashboard
//! model of `metadata_types`. All state lives in the backend; the proxy only
//! reads, maps and forwards mutations through a shared `CatalogClient`.
//!
//! Components:
//! - `fetcher`: unique/bulk fetches over the client
//! - `tables`: table and column mapping, descriptions
//! - `watermarks`: partition boundary parsing
//! - `owners`: owner resolution, readers, ownership edges
//! - `reports`: report aggregation
//! - `tags`: glossary terms, tags and badges
//! - `lineage`: leveled upstream/downstream traversal
//! - `user_relations`: bookmarks, owned/read/popular tables
//! - `dashboards`: dashboard detail and summaries

pub mod config;
mod dashboards;
pub mod error;
mod fetcher;
pub mod keys;
mod lineage;
mod owners;
mod proxy;
mod reports;
pub mod stats;
mod tables;
mod tags;
pub mod telemetry;
pub mod user_details;
mod user_relations;
pub mod watermarks;

pub use config::{ProxyConfig, StatFormatRule};
pub use error::{ProxyError, Result};
pub use owners::resolve_owners;
pub use proxy::AtlasProxy;
pub use tags::TAG_GLOSSARY;
pub use user_details::{DefaultUserDetails, FnUserDetails, UserDetailResolver};
