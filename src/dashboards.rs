//! Dashboard mapping.

use std::collections::HashMap;

use catalog_client::GraphEntity;
use metadata_types::{DashboardDetail, DashboardQuery, DashboardSummary};
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::fetcher::{active_ref_guids, int_attribute, require_attributes};
use crate::keys::TableKey;
use crate::tables::popular_table;
use crate::tags::{entity_badges, entity_tags, DASHBOARD_TYPE};
use crate::AtlasProxy;

const SUCCEEDED: &str = "succeeded";

/// Run history derived from a dashboard's executions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ExecutionSummary {
    last_run_timestamp: i64,
    last_run_state: String,
    last_successful_run_timestamp: i64,
}

fn summarize_executions(executions: &[GraphEntity]) -> ExecutionSummary {
    let mut runs: Vec<(i64, &str)> = executions
        .iter()
        .filter(|e| e.is_active())
        .map(|e| {
            (
                int_attribute(e, "timestamp").unwrap_or(0),
                e.str_attribute("state").unwrap_or_default(),
            )
        })
        .collect();
    runs.sort_by(|a, b| b.0.cmp(&a.0));

    let Some(&(last_run_timestamp, last_run_state)) = runs.first() else {
        return ExecutionSummary::default();
    };
    ExecutionSummary {
        last_run_timestamp,
        last_run_state: last_run_state.to_string(),
        last_successful_run_timestamp: runs
            .iter()
            .find(|(_, state)| *state == SUCCEEDED)
            .map_or(0, |(ts, _)| *ts),
    }
}

impl AtlasProxy {
    async fn dashboard_executions(&self, dashboard: &GraphEntity) -> Result<ExecutionSummary> {
        let guids = active_ref_guids(dashboard, "executions");
        let executions = self.fetch_by_guids(&guids).await?;
        Ok(summarize_executions(&executions))
    }

    /// Group name and url for a dashboard; the url needs the group entity.
    async fn dashboard_group(&self, dashboard: &GraphEntity) -> Result<(String, Option<String>)> {
        let Some(group) = dashboard
            .active_relationship_refs("group")
            .into_iter()
            .next()
        else {
            return Ok((String::new(), None));
        };
        let entities = match &group.guid {
            Some(guid) => self.fetch_by_guids(std::slice::from_ref(guid)).await?,
            None => Vec::new(),
        };
        let entity = entities.first();
        let name = entity
            .and_then(|e| e.str_attribute("name"))
            .map(str::to_string)
            .or(group.display_text)
            .unwrap_or_default();
        let url = entity.and_then(|e| e.str_attribute("url")).map(str::to_string);
        Ok((name, url))
    }

    #[instrument(skip(self))]
    pub async fn get_dashboard(&self, uri: &str) -> Result<DashboardDetail> {
        let detail = self.fetch_unique(DASHBOARD_TYPE, uri).await?;
        let entity = &detail.entity;
        require_attributes(entity)?;

        let (group_name, group_url) = self.dashboard_group(entity).await?;
        let runs = self.dashboard_executions(entity).await?;

        let queries: Vec<DashboardQuery> = self
            .fetch_by_guids(&active_ref_guids(entity, "queries"))
            .await?
            .iter()
            .filter(|q| q.is_active())
            .filter_map(|q| {
                Some(DashboardQuery {
                    name: q.str_attribute("name")?.to_string(),
                    url: q.str_attribute("url").map(str::to_string),
                    query_text: q.str_attribute("queryText").map(str::to_string),
                })
            })
            .collect();

        let tables = self
            .fetch_by_guids(&active_ref_guids(entity, "tables"))
            .await?
            .iter()
            .filter(|t| t.is_active())
            .filter_map(popular_table)
            .collect();

        let frequent_users = self
            .get_readers(entity, self.settings.dashboard_frequent_users)
            .await?
            .into_iter()
            .map(|reader| reader.user)
            .collect();

        let dashboard = DashboardDetail {
            uri: uri.to_string(),
            cluster: entity.str_attribute("cluster").unwrap_or_default().to_string(),
            group_name,
            group_url,
            product: entity.str_attribute("product").unwrap_or_default().to_string(),
            name: entity.str_attribute("name").unwrap_or_default().to_string(),
            url: entity.str_attribute("url").unwrap_or_default().to_string(),
            description: entity.str_attribute("description").map(str::to_string),
            created_timestamp: int_attribute(entity, "createdTimestamp").unwrap_or(0),
            updated_timestamp: int_attribute(entity, "lastModifiedTimestamp").unwrap_or(0),
            last_successful_run_timestamp: runs.last_successful_run_timestamp,
            last_run_timestamp: runs.last_run_timestamp,
            last_run_state: runs.last_run_state,
            owners: self.get_owners(entity),
            frequent_users,
            chart_names: entity
                .active_relationship_refs("charts")
                .into_iter()
                .filter_map(|c| c.display_text)
                .collect(),
            query_names: queries.iter().map(|q| q.name.clone()).collect(),
            queries,
            tables,
            tags: entity_tags(entity),
            badges: entity_badges(entity),
            recent_view_count: int_attribute(entity, "popularityScore").unwrap_or(0),
        };
        debug!(uri, "dashboard mapped");
        Ok(dashboard)
    }

    #[instrument(skip(self))]
    pub async fn get_dashboard_description(&self, uri: &str) -> Result<Option<String>> {
        let detail = self.fetch_unique(DASHBOARD_TYPE, uri).await?;
        require_attributes(&detail.entity)?;
        Ok(detail.entity.str_attribute("description").map(str::to_string))
    }

    #[instrument(skip(self, description))]
    pub async fn put_dashboard_description(&self, uri: &str, description: &str) -> Result<()> {
        let detail = self.fetch_unique(DASHBOARD_TYPE, uri).await?;
        self.client
            .partial_update_entity_by_guid(&detail.entity.guid, "description", json!(description))
            .await?;
        info!(uri, "dashboard description updated");
        Ok(())
    }

    /// Dashboards built on the table, sorted by name.
    #[instrument(skip(self))]
    pub async fn get_dashboards_using_table(&self, table_uri: &str) -> Result<Vec<DashboardSummary>> {
        let key = TableKey::parse(table_uri)?;
        let table = self.get_table_entity(&key).await?;
        let dashboards = self
            .fetch_by_guids(&active_ref_guids(&table.entity, "dashboards"))
            .await?;

        let group_guids: Vec<String> = dashboards
            .iter()
            .filter_map(|d| d.active_relationship_refs("group").into_iter().next())
            .filter_map(|g| g.guid)
            .collect();
        let groups: HashMap<String, GraphEntity> = self
            .fetch_by_guids(&group_guids)
            .await?
            .into_iter()
            .map(|g| (g.guid.clone(), g))
            .collect();

        let mut summaries = Vec::new();
        for dashboard in dashboards.iter().filter(|d| d.is_active()) {
            let group_ref = dashboard.active_relationship_refs("group").into_iter().next();
            let group = group_ref
                .as_ref()
                .and_then(|g| g.guid.as_ref())
                .and_then(|guid| groups.get(guid));
            let runs = self.dashboard_executions(dashboard).await?;

            summaries.push(DashboardSummary {
                uri: dashboard.qualified_name().unwrap_or_default().to_string(),
                cluster: dashboard.str_attribute("cluster").unwrap_or_default().to_string(),
                group_name: group
                    .and_then(|g| g.str_attribute("name"))
                    .map(str::to_string)
                    .or_else(|| group_ref.and_then(|g| g.display_text))
                    .unwrap_or_default(),
                group_url: group.and_then(|g| g.str_attribute("url")).map(str::to_string),
                product: dashboard.str_attribute("product").unwrap_or_default().to_string(),
                name: dashboard.str_attribute("name").unwrap_or_default().to_string(),
                url: dashboard.str_attribute("url").unwrap_or_default().to_string(),
                description: dashboard.str_attribute("description").map(str::to_string),
                last_successful_run_timestamp: runs.last_successful_run_timestamp,
            });
        }
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(summaries)
    }
}
