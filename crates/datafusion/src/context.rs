use std::sync::Arc;

use async_trait::async_trait;
use datafusion::common::plan_datafusion_err;
use datafusion::error::{DataFusionError, Result};
use datafusion::prelude::SessionContext;
use tracing::debug;

use crate::catalog::{OpenDicCatalog, SqlOutcome, rest_config};
use crate::client::RestCatalogClient;
use crate::config::OpenDicConfig;
use crate::error::OpenDicResult;

/// Run `OPEN` statements against a [`SessionContext`].
///
/// The session doubles as the host engine: native statements and dumped
/// platform statements are executed on it. The REST client is kept in the
/// session config and reused while the `opendic.catalog` options are unchanged.
#[async_trait]
pub trait OpenDicContextExt {
    /// Build an interpreter from the session's `opendic` configuration.
    fn open_catalog(&self) -> Result<OpenDicCatalog>;

    /// Run a single statement, `OPEN` dialect or native SQL.
    async fn sql_open(&self, sql: &str) -> OpenDicResult<SqlOutcome>;
}

#[async_trait]
impl OpenDicContextExt for SessionContext {
    fn open_catalog(&self) -> Result<OpenDicCatalog> {
        let state = self.state();
        let config = state
            .config()
            .options()
            .extensions
            .get::<OpenDicConfig>()
            .ok_or(plan_datafusion_err!("opendic config not found."))?;
        let rest_config = rest_config(config)?;

        let client = match state.config().get_extension::<RestCatalogClient>() {
            Some(client) if client.config() == &rest_config => client,
            _ => {
                debug!("Creating catalog client for {}", rest_config.base_url);
                let client = Arc::new(
                    RestCatalogClient::try_new(rest_config)
                        .map_err(|e| DataFusionError::Configuration(e.to_string()))?,
                );
                self.state_ref()
                    .write()
                    .config_mut()
                    .set_extension(client.clone());
                client
            }
        };

        Ok(OpenDicCatalog::new(client, Arc::new(self.clone())).with_sync_config(config))
    }

    async fn sql_open(&self, sql: &str) -> OpenDicResult<SqlOutcome> {
        self.open_catalog()?.sql(sql).await
    }
}
