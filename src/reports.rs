use catalog_client::GraphEntity;
use metadata_types::ResourceReport;
use tracing::warn;

use crate::error::Result;
use crate::AtlasProxy;

impl AtlasProxy {
    /// Active reports among `guids`, sorted by name.
    pub(crate) async fn get_reports(&self, guids: &[String]) -> Result<Vec<ResourceReport>> {
        if guids.is_empty() {
            return Ok(Vec::new());
        }
        let entities = self.fetch_by_guids(guids).await?;
        Ok(collect_reports(&entities))
    }
}

pub(crate) fn collect_reports(entities: &[GraphEntity]) -> Vec<ResourceReport> {
    let mut reports: Vec<ResourceReport> = entities
        .iter()
        .filter(|e| e.is_active())
        .filter_map(|e| match (e.str_attribute("name"), e.str_attribute("url")) {
            (Some(name), Some(url)) => Some(ResourceReport {
                name: name.to_string(),
                url: url.to_string(),
            }),
            _ => {
                warn!(guid = %e.guid, "report without name or url, skipping");
                None
            }
        })
        .collect();
    reports.sort();
    reports
}
