//! Metadata domain types.
//!
//! These are the strongly-shaped values the metadata proxy hands to the API
//! layer. They are pure value types: no backend handles, no I/O. Every type is
//! `PartialEq` so callers and tests can compare whole results structurally.
//!
//! - `table`: tables, columns, stats, watermarks, reports
//! - `user`: user profiles and readers
//! - `lineage`: leveled upstream/downstream lineage
//! - `dashboard`: dashboard detail and summaries
//! - `resource`: resource/relation discriminators and tag counts

pub mod dashboard;
pub mod lineage;
pub mod resource;
pub mod table;
pub mod user;

pub use dashboard::{DashboardDetail, DashboardQuery, DashboardSummary};
pub use lineage::{Lineage, LineageDirection, LineageItem};
pub use resource::{ResourceType, TagDetail, UserResourceRel};
pub use table::{
    Badge, Column, PopularTable, ProgrammaticDescription, ResourceReport, Stat, Table, Tag,
    Watermark, WatermarkType,
};
pub use user::{Reader, User};

/// Category assigned to every badge derived from a backend classification.
pub const DEFAULT_BADGE_CATEGORY: &str = "default";

/// Tag type assigned to glossary-term tags.
pub const DEFAULT_TAG_TYPE: &str = "default";
