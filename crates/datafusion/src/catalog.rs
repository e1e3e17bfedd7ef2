use std::fmt;
use std::sync::Arc;

use datafusion::arrow::array::RecordBatch;
use datafusion::error::{DataFusionError, Result};
use tracing::debug;

use crate::client::{
    CatalogClient, RestCatalogClient, RestCatalogConfig, invoke, sync_route,
};
use crate::config::OpenDicConfig;
use crate::error::{OpenDicError, OpenDicResult};
use crate::host::HostEngine;
use crate::request::CatalogRequest;
use crate::response::{
    OpenDicResponse, dump_statements, statements_from_response, success_message,
};
use crate::sql::{CreateModifiers, OpenDicParser, OpenDicStatement, Statement};

/// Result of running one statement through [`OpenDicCatalog::sql`].
#[derive(Debug)]
pub enum SqlOutcome {
    /// Batches produced by the host engine for a native statement.
    Native(Vec<RecordBatch>),
    /// Normalized catalog response for an `OPEN` statement.
    Catalog(OpenDicResponse),
}

impl SqlOutcome {
    pub fn into_catalog_response(self) -> Option<OpenDicResponse> {
        match self {
            SqlOutcome::Catalog(response) => Some(response),
            SqlOutcome::Native(_) => None,
        }
    }
}

/// Interpreter for the `OPEN` statement dialect.
///
/// Each call to [`sql`](Self::sql) is independent: the statement is matched,
/// built into a request, sent with a single catalog call and normalized.
/// Statements outside the dialect run on the host engine unchanged.
#[derive(Clone)]
pub struct OpenDicCatalog {
    client: Arc<dyn CatalogClient>,
    host: Arc<dyn HostEngine>,
    default_platform: String,
    dump_on_create: bool,
}

impl OpenDicCatalog {
    pub fn new(client: Arc<dyn CatalogClient>, host: Arc<dyn HostEngine>) -> Self {
        Self {
            client,
            host,
            default_platform: "datafusion".to_string(),
            dump_on_create: true,
        }
    }

    /// Build an interpreter talking to the catalog configured under `opendic.catalog`.
    pub fn try_new_with_config(config: &OpenDicConfig, host: Arc<dyn HostEngine>) -> Result<Self> {
        let client = RestCatalogClient::try_new(rest_config(config)?)
            .map_err(|e| DataFusionError::Configuration(e.to_string()))?;
        Ok(Self::new(Arc::new(client), host).with_sync_config(config))
    }

    /// Apply the `opendic.sync` options.
    pub(crate) fn with_sync_config(self, config: &OpenDicConfig) -> Self {
        self.with_default_platform(&config.sync.default_platform)
            .with_dump_on_create(config.sync.dump_on_create)
    }

    pub fn with_default_platform(mut self, platform: impl Into<String>) -> Self {
        self.default_platform = platform.into();
        self
    }

    pub fn with_dump_on_create(mut self, enabled: bool) -> Self {
        self.dump_on_create = enabled;
        self
    }

    /// Run one statement.
    ///
    /// Errors in `OPEN` statements are returned before any network call when
    /// they stem from the statement itself; host engine errors are only
    /// returned for native statements.
    pub async fn sql(&self, sql: &str) -> OpenDicResult<SqlOutcome> {
        match OpenDicParser::parse_sql(sql) {
            Statement::Native(sql) => {
                debug!("Falling back to host engine");
                Ok(SqlOutcome::Native(self.host.execute(&sql).await?))
            }
            Statement::OpenDic(statement) => Ok(SqlOutcome::Catalog(
                self.execute_statement(statement).await?,
            )),
        }
    }

    pub async fn execute_statement(
        &self,
        statement: OpenDicStatement,
    ) -> OpenDicResult<OpenDicResponse> {
        let command = statement.command_name();
        let request = CatalogRequest::try_new(statement, &self.default_platform)?;
        self.execute_request(command, request).await
    }

    async fn execute_request(
        &self,
        command: &'static str,
        request: CatalogRequest,
    ) -> OpenDicResult<OpenDicResponse> {
        let body = request
            .body()
            .map_err(|e| OpenDicError::validation(command, e.to_string()))?;
        let response = self.call(command, &request, body).await?;

        match &request {
            CatalogRequest::CreateUdo { request: create, modifiers } => {
                if *modifiers != CreateModifiers::default() {
                    debug!("CREATE modifiers are not forwarded to the catalog: {modifiers:?}");
                }
                if !self.dump_on_create {
                    return Ok(OpenDicResponse::success(success_message(&request), response));
                }
                let route = sync_route(&create.udo.object_type);
                let synced = match invoke(self.client.as_ref(), &route, None).await {
                    Ok(synced) => synced,
                    Err(source) => {
                        return Err(OpenDicError::CreateFollowUp {
                            route: route.to_string(),
                            response,
                            source,
                        });
                    }
                };
                let statements = statements_from_response(command, &synced)?;
                let report = dump_statements(self.host.as_ref(), statements).await;
                Ok(OpenDicResponse::success(success_message(&request), response)
                    .with_executions(report))
            }
            CatalogRequest::Sync { .. } | CatalogRequest::SyncAll { .. } => {
                let statements = statements_from_response(command, &response)?;
                let report = dump_statements(self.host.as_ref(), statements).await;
                Ok(OpenDicResponse::success(success_message(&request), response)
                    .with_executions(report))
            }
            _ => Ok(OpenDicResponse::success(success_message(&request), response)),
        }
    }

    async fn call(
        &self,
        command: &'static str,
        request: &CatalogRequest,
        body: Option<serde_json::Value>,
    ) -> OpenDicResult<serde_json::Value> {
        invoke(self.client.as_ref(), &request.route(), body)
            .await
            .map_err(|source| OpenDicError::Transport { command, source })
    }
}

/// REST client settings from the `opendic.catalog` options.
pub(crate) fn rest_config(config: &OpenDicConfig) -> Result<RestCatalogConfig> {
    let uri = config.catalog.uri.as_ref().ok_or_else(|| {
        DataFusionError::Configuration("opendic.catalog.uri is not set".to_string())
    })?;
    let mut rest_config = RestCatalogConfig::new(uri);
    if let Some(token) = &config.catalog.token {
        rest_config = rest_config.with_token(token);
    }
    if let Some(timeout) = config.catalog.timeout_secs {
        rest_config = rest_config.with_timeout(timeout);
    }
    Ok(rest_config)
}

impl fmt::Debug for OpenDicCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenDicCatalog")
            .field("client", &self.client)
            .field("default_platform", &self.default_platform)
            .field("dump_on_create", &self.dump_on_create)
            .finish_non_exhaustive()
    }
}
