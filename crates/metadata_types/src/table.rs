//! Table-shaped domain values.

use serde::{Deserialize, Serialize};

use crate::user::{Reader, User};
use crate::DEFAULT_BADGE_CATEGORY;

// ── Badges & tags ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Badge {
    pub badge_name: String,
    pub category: String,
}

impl Badge {
    /// Badge in the default category, as derived from a classification.
    pub fn classification(name: impl Into<String>) -> Self {
        Self {
            badge_name: name.into(),
            category: DEFAULT_BADGE_CATEGORY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub tag_name: String,
    pub tag_type: String,
}

// ── Columns ───────────────────────────────────────────────────

/// A single column statistic after format-spec processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stat {
    pub stat_type: String,
    #[serde(default)]
    pub stat_val: Option<String>,
    #[serde(default)]
    pub start_epoch: Option<i64>,
    #[serde(default)]
    pub end_epoch: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub col_type: String,
    pub sort_order: i64,
    #[serde(default)]
    pub stats: Vec<Stat>,
    #[serde(default)]
    pub badges: Vec<Badge>,
}

// ── Watermarks ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatermarkType {
    LowWatermark,
    HighWatermark,
}

/// Earliest or latest partition boundary of a table.
///
/// `partition_value` is always rendered in the canonical
/// `%Y-%m-%d %H:%M:%S` form, whatever format the raw value used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watermark {
    pub watermark_type: WatermarkType,
    pub partition_key: String,
    pub partition_value: String,
    #[serde(default)]
    pub create_time: Option<String>,
}

// ── Reports & descriptions ────────────────────────────────────

/// Field order matters: the derived `Ord` sorts by name first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceReport {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgrammaticDescription {
    pub source: String,
    pub text: String,
}

// ── Table ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub database: String,
    pub cluster: String,
    pub schema: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub badges: Vec<Badge>,
    #[serde(default)]
    pub table_readers: Vec<Reader>,
    #[serde(default)]
    pub owners: Vec<User>,
    /// Either empty or exactly a (low, high) pair.
    #[serde(default)]
    pub watermarks: Vec<Watermark>,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub resource_reports: Vec<ResourceReport>,
    #[serde(default)]
    pub programmatic_descriptions: Vec<ProgrammaticDescription>,
    #[serde(default)]
    pub is_view: bool,
    /// Whole-second epoch.
    #[serde(default)]
    pub last_updated_timestamp: Option<i64>,
}

impl Table {
    /// Resource key in `{database}://{cluster}.{schema}/{name}` form.
    pub fn key(&self) -> String {
        format!(
            "{}://{}.{}/{}",
            self.database, self.cluster, self.schema, self.name
        )
    }
}

/// Lightweight table reference used by popularity, bookmark and ownership listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularTable {
    pub database: String,
    pub cluster: String,
    pub schema: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_sort_by_name_then_url() {
        let mut reports = vec![
            ResourceReport {
                name: "b".into(),
                url: "http://a".into(),
            },
            ResourceReport {
                name: "a".into(),
                url: "http://z".into(),
            },
            ResourceReport {
                name: "a".into(),
                url: "http://b".into(),
            },
        ];
        reports.sort();
        let names: Vec<_> = reports.iter().map(|r| (&*r.name, &*r.url)).collect();
        assert_eq!(
            names,
            vec![("a", "http://b"), ("a", "http://z"), ("b", "http://a")]
        );
    }

    #[test]
    fn table_key_round_trips_components() {
        let table = Table {
            database: "hive_table".into(),
            cluster: "gold".into(),
            schema: "sales".into(),
            name: "orders".into(),
            description: None,
            tags: vec![],
            badges: vec![],
            table_readers: vec![],
            owners: vec![],
            watermarks: vec![],
            columns: vec![],
            resource_reports: vec![],
            programmatic_descriptions: vec![],
            is_view: false,
            last_updated_timestamp: None,
        };
        assert_eq!(table.key(), "hive_table://gold.sales/orders");
    }

    #[test]
    fn watermark_type_serializes_snake_case() {
        let json = serde_json::to_value(WatermarkType::LowWatermark).unwrap();
        assert_eq!(json, serde_json::json!("low_watermark"));
    }
}
