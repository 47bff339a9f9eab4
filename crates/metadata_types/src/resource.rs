//! Resource and relation discriminators.

#![allow(clippy::should_implement_trait)]

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Table,
    Column,
    Dashboard,
    User,
}

impl ResourceType {
    /// Name used as `typeName` when the resource is referenced in a relation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "Table",
            Self::Column => "Column",
            Self::Dashboard => "Dashboard",
            Self::User => "User",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Some(Self::Table),
            "column" => Some(Self::Column),
            "dashboard" => Some(Self::Dashboard),
            "user" => Some(Self::User),
            _ => None,
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a user relates to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserResourceRel {
    Follow,
    Own,
    Read,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDetail {
    pub tag_name: String,
    /// Number of entities currently assigned the tag.
    pub tag_count: usize,
}
