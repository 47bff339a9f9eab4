//! Dashboard-shaped domain values.

use serde::{Deserialize, Serialize};

use crate::table::{Badge, PopularTable, Tag};
use crate::user::User;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardQuery {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub query_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardDetail {
    pub uri: String,
    pub cluster: String,
    pub group_name: String,
    #[serde(default)]
    pub group_url: Option<String>,
    pub product: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_timestamp: i64,
    pub updated_timestamp: i64,
    /// 0 when the dashboard never ran successfully.
    pub last_successful_run_timestamp: i64,
    pub last_run_timestamp: i64,
    pub last_run_state: String,
    #[serde(default)]
    pub owners: Vec<User>,
    #[serde(default)]
    pub frequent_users: Vec<User>,
    #[serde(default)]
    pub chart_names: Vec<String>,
    #[serde(default)]
    pub query_names: Vec<String>,
    #[serde(default)]
    pub queries: Vec<DashboardQuery>,
    #[serde(default)]
    pub tables: Vec<PopularTable>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub badges: Vec<Badge>,
    #[serde(default)]
    pub recent_view_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub uri: String,
    pub cluster: String,
    pub group_name: String,
    #[serde(default)]
    pub group_url: Option<String>,
    pub product: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    pub last_successful_run_timestamp: i64,
}
