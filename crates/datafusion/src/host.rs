use async_trait::async_trait;
use datafusion::arrow::array::RecordBatch;
use datafusion::error::Result;
use datafusion::prelude::SessionContext;
use tracing::debug;

/// The engine that runs native SQL and replays dumped platform statements.
#[async_trait]
pub trait HostEngine: Send + Sync {
    /// Plan and run a single statement to completion.
    async fn execute(&self, sql: &str) -> Result<Vec<RecordBatch>>;
}

#[async_trait]
impl HostEngine for SessionContext {
    async fn execute(&self, sql: &str) -> Result<Vec<RecordBatch>> {
        debug!("Executing on DataFusion: {sql}");
        self.sql(sql).await?.collect().await
    }
}
