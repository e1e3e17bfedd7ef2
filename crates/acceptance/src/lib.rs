//! Recording fakes for exercising the `OPEN` interpreter without a catalog
//! server or a real host engine.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use datafusion::arrow::array::RecordBatch;
use datafusion::error::{DataFusionError, Result};
use opendic_datafusion::client::{ClientResult, Method};
use opendic_datafusion::{CatalogClient, ClientError, HostEngine, OpenDicCatalog};
use parking_lot::Mutex;
use serde_json::{Value, json};

/// A call received by [`RecordingCatalogClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

/// [`CatalogClient`] that records every call and answers from a script.
///
/// Unscripted endpoints answer `{"success": true}`.
#[derive(Debug, Default)]
pub struct RecordingCatalogClient {
    responses: Mutex<HashMap<(Method, String), Result<Value, u16>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingCatalogClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method path` with `body`.
    pub fn respond(&self, method: Method, path: impl Into<String>, body: Value) -> &Self {
        self.responses.lock().insert((method, path.into()), Ok(body));
        self
    }

    /// Answer `method path` with an HTTP error status.
    pub fn fail(&self, method: Method, path: impl Into<String>, status: u16) -> &Self {
        self.responses
            .lock()
            .insert((method, path.into()), Err(status));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Number of calls made to `method path`.
    pub fn calls_to(&self, method: Method, path: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.method == method && call.path == path)
            .count()
    }

    fn record(&self, method: Method, path: &str, body: Option<Value>) -> ClientResult<Value> {
        self.calls.lock().push(RecordedCall {
            method,
            path: path.to_string(),
            body,
        });
        match self.responses.lock().get(&(method, path.to_string())) {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(status)) => Err(ClientError::Status {
                status: *status,
                body: format!("scripted failure for {method} {path}"),
            }),
            None => Ok(json!({"success": true})),
        }
    }
}

#[async_trait]
impl CatalogClient for RecordingCatalogClient {
    async fn get(&self, path: &str) -> ClientResult<Value> {
        self.record(Method::Get, path, None)
    }

    async fn post(&self, path: &str, body: Value) -> ClientResult<Value> {
        self.record(Method::Post, path, Some(body))
    }

    async fn put(&self, path: &str, body: Value) -> ClientResult<Value> {
        self.record(Method::Put, path, Some(body))
    }

    async fn delete(&self, path: &str) -> ClientResult<Value> {
        self.record(Method::Delete, path, None)
    }
}

/// [`HostEngine`] that records statements and fails those containing a
/// configured marker.
#[derive(Debug, Default)]
pub struct RecordingHost {
    failing_markers: Mutex<Vec<String>>,
    executed: Mutex<Vec<String>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every statement containing `marker`.
    pub fn fail_on(&self, marker: impl Into<String>) -> &Self {
        self.failing_markers.lock().push(marker.into());
        self
    }

    /// Every statement received, in order, including failed ones.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().clone()
    }
}

#[async_trait]
impl HostEngine for RecordingHost {
    async fn execute(&self, sql: &str) -> Result<Vec<RecordBatch>> {
        self.executed.lock().push(sql.to_string());
        let failing = self
            .failing_markers
            .lock()
            .iter()
            .any(|marker| sql.contains(marker.as_str()));
        if failing {
            return Err(DataFusionError::Execution(format!(
                "statement rejected by host: {sql}"
            )));
        }
        Ok(vec![])
    }
}

/// An interpreter wired to fresh recording fakes.
pub fn recording_catalog() -> (OpenDicCatalog, Arc<RecordingCatalogClient>, Arc<RecordingHost>) {
    let client = Arc::new(RecordingCatalogClient::new());
    let host = Arc::new(RecordingHost::new());
    let catalog = OpenDicCatalog::new(client.clone(), host.clone());
    (catalog, client, host)
}
