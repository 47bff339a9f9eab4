//! Proxy configuration.
//!
//! Loaded from YAML. Every field defaults when absent, so an empty document
//! is a valid configuration. The raw `ProxyConfig` is compiled once into
//! `Settings` (regexes built, format strings parsed) when the proxy is
//! constructed; nothing is re-read per request.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use chrono::format::{Item, StrftimeItems};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ProxyError, Result};
use crate::stats::StatRules;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "METADATA_PROXY_CONFIG";

/// Default configuration path
pub const DEFAULT_CONFIG_PATH: &str = "config/metadata_proxy.yaml";

/// Per-stat formatting rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatFormatRule {
    /// Display name replacing the raw stat name
    #[serde(default)]
    pub new_name: Option<String>,
    /// Format string, e.g. `"{:,.2f}"`
    #[serde(default)]
    pub format: Option<String>,
    /// Omit the stat entirely
    #[serde(default)]
    pub drop: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub statistics_format_spec: HashMap<String, StatFormatRule>,
    /// Parameter keys matching any of these (anchored at the key start) are
    /// not exposed as programmatic descriptions.
    pub programmatic_descriptions_exclude_filters: Vec<String>,
    /// Tried in order; the first format that parses a partition value wins.
    pub watermark_date_formats: Vec<String>,
    pub popular_table_minimum_reader_count: i64,
    /// Field under the metrics snapshot's `general.stats`.
    pub latest_updated_ts_field: String,
    pub top_readers: usize,
    pub dashboard_frequent_users: usize,
    pub bulk_fetch_chunk_size: usize,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            statistics_format_spec: HashMap::new(),
            programmatic_descriptions_exclude_filters: Vec::new(),
            watermark_date_formats: Vec::new(),
            popular_table_minimum_reader_count: 0,
            latest_updated_ts_field: "Notification:lastMessageProcessedTime".to_string(),
            top_readers: 15,
            dashboard_frequent_users: 5,
            bulk_fetch_chunk_size: 100,
        }
    }
}

impl ProxyConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Load configuration from a YAML string
    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load from `$METADATA_PROXY_CONFIG`, or the default path.
    ///
    /// A missing default file yields the default configuration; a missing
    /// file named by the environment variable is an error.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(path),
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::from_file(DEFAULT_CONFIG_PATH),
            Err(_) => Ok(Self::default()),
        }
    }

    pub(crate) fn compile(&self) -> Result<Settings> {
        let exclude_filters = self
            .programmatic_descriptions_exclude_filters
            .iter()
            .map(|pattern| {
                Regex::new(&format!("^(?:{pattern})")).map_err(|e| {
                    ProxyError::Config(format!("invalid exclude filter '{pattern}': {e}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        for format in &self.watermark_date_formats {
            if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                return Err(ProxyError::Config(format!(
                    "invalid watermark date format '{format}'"
                )));
            }
        }

        if self.bulk_fetch_chunk_size == 0 {
            return Err(ProxyError::Config(
                "bulk_fetch_chunk_size must be positive".into(),
            ));
        }

        Ok(Settings {
            stat_rules: StatRules::compile(&self.statistics_format_spec)?,
            exclude_filters,
            watermark_formats: self.watermark_date_formats.clone(),
            min_reader_count: self.popular_table_minimum_reader_count,
            latest_updated_ts_field: self.latest_updated_ts_field.clone(),
            top_readers: self.top_readers,
            dashboard_frequent_users: self.dashboard_frequent_users,
            chunk_size: self.bulk_fetch_chunk_size,
        })
    }
}

/// Validated, immutable configuration held by the proxy.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub stat_rules: StatRules,
    pub exclude_filters: Vec<Regex>,
    pub watermark_formats: Vec<String>,
    pub min_reader_count: i64,
    pub latest_updated_ts_field: String,
    pub top_readers: usize,
    pub dashboard_frequent_users: usize,
    pub chunk_size: usize,
}

impl Settings {
    pub fn is_excluded(&self, key: &str) -> bool {
        self.exclude_filters.iter().any(|re| re.is_match(key))
    }
}
