use std::sync::Arc;

use catalog_client::CatalogClient;

use crate::config::{ProxyConfig, Settings};
use crate::error::Result;
use crate::user_details::{DefaultUserDetails, UserDetailResolver};

/// Adapter from the graph catalog to the metadata domain model.
///
/// Stateless between calls: every operation re-fetches from the backend and
/// holds only the compiled configuration and the shared client handle. The
/// operations are spread over the component modules (`tables`, `owners`,
/// `tags`, `lineage`, `user_relations`, `dashboards`).
#[derive(Clone)]
pub struct AtlasProxy {
    pub(crate) client: Arc<dyn CatalogClient>,
    pub(crate) settings: Arc<Settings>,
    pub(crate) user_details: Arc<dyn UserDetailResolver>,
}

impl AtlasProxy {
    /// Fails with `ProxyError::Config` when the configuration does not compile.
    pub fn new(client: Arc<dyn CatalogClient>, config: &ProxyConfig) -> Result<Self> {
        Ok(Self {
            client,
            settings: Arc::new(config.compile()?),
            user_details: Arc::new(DefaultUserDetails),
        })
    }

    pub fn with_user_details(mut self, resolver: Arc<dyn UserDetailResolver>) -> Self {
        self.user_details = resolver;
        self
    }

    pub fn client(&self) -> &Arc<dyn CatalogClient> {
        &self.client
    }
}

impl std::fmt::Debug for AtlasProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtlasProxy")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
