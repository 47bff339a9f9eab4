//! Lineage results.

// `from_str() -> Option<Self>` mirrors the other discriminators in this crate:
// unknown input is a `None`, not an error type.
#![allow(clippy::should_implement_trait)]

use serde::{Deserialize, Serialize};

use crate::table::Badge;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineageDirection {
    Upstream,
    Downstream,
    Both,
}

impl LineageDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upstream => "upstream",
            Self::Downstream => "downstream",
            Self::Both => "both",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "upstream" => Some(Self::Upstream),
            "downstream" => Some(Self::Downstream),
            "both" => Some(Self::Both),
            _ => None,
        }
    }

    pub fn includes_upstream(&self) -> bool {
        matches!(self, Self::Upstream | Self::Both)
    }

    pub fn includes_downstream(&self) -> bool {
        matches!(self, Self::Downstream | Self::Both)
    }
}

impl std::fmt::Display for LineageDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One node of a lineage result.
///
/// `level` is the shortest hop distance from the query root (the root itself
/// never appears). `parent` is the key of the node feeding this one, empty
/// when no such edge was traversed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageItem {
    pub key: String,
    pub parent: String,
    pub level: u32,
    pub source: String,
    #[serde(default)]
    pub badges: Vec<Badge>,
    #[serde(default)]
    pub usage: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lineage {
    pub key: String,
    pub direction: LineageDirection,
    pub depth: u32,
    pub upstream_entities: Vec<LineageItem>,
    pub downstream_entities: Vec<LineageItem>,
}
