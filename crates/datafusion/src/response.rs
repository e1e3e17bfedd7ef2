//! Normalization of catalog responses and replay of returned statements.

use std::fmt;
use std::sync::Arc;

use datafusion::arrow::array::{RecordBatch, StringArray};
use datafusion::arrow::datatypes::{DataType, Field, Schema};
use datafusion::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ErrorKind, OpenDicError, OpenDicResult};
use crate::host::HostEngine;
use crate::model::{Execution, ExecutionReport, StatementEntry};
use crate::request::CatalogRequest;

/// Displayable outcome of an `OPEN` statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OpenDicResponse {
    Success {
        message: String,
        /// The catalog's response body, unchanged.
        response: Value,
        /// Statements replayed on the host engine, for commands that dump.
        #[serde(skip_serializing_if = "Option::is_none")]
        executions: Option<ExecutionReport>,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
}

impl OpenDicResponse {
    pub fn success(message: impl Into<String>, response: Value) -> Self {
        Self::Success {
            message: message.into(),
            response,
            executions: None,
        }
    }

    pub fn with_executions(self, report: ExecutionReport) -> Self {
        match self {
            Self::Success {
                message, response, ..
            } => Self::Success {
                message,
                response,
                executions: Some(report),
            },
            error => error,
        }
    }

    pub fn from_error(error: &OpenDicError) -> Self {
        Self::Error {
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success { message, .. } | Self::Error { message, .. } => message,
        }
    }

    pub fn executions(&self) -> Option<&ExecutionReport> {
        match self {
            Self::Success { executions, .. } => executions.as_ref(),
            Self::Error { .. } => None,
        }
    }

    /// Render as a one-row batch with `status`, `kind`, `message` and
    /// `response` (JSON text) columns.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("status", DataType::Utf8, false),
            Field::new("kind", DataType::Utf8, true),
            Field::new("message", DataType::Utf8, false),
            Field::new("response", DataType::Utf8, true),
        ]));
        let (status, kind, response) = match self {
            Self::Success { response, .. } => ("success", None, Some(response.to_string())),
            Self::Error { kind, .. } => ("error", Some(format!("{kind:?}")), None),
        };
        Ok(RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec![status])),
                Arc::new(StringArray::from(vec![kind])),
                Arc::new(StringArray::from(vec![self.message()])),
                Arc::new(StringArray::from(vec![response])),
            ],
        )?)
    }
}

impl From<&OpenDicError> for OpenDicResponse {
    fn from(error: &OpenDicError) -> Self {
        Self::from_error(error)
    }
}

impl fmt::Display for OpenDicResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string_pretty(self) {
            Ok(json) => write!(f, "{json}"),
            Err(_) => write!(f, "{}", self.message()),
        }
    }
}

/// Success message reported for each command.
pub fn success_message(request: &CatalogRequest) -> &'static str {
    use CatalogRequest::*;

    match request {
        CreateUdo { .. } => "Object created successfully",
        CreateBatch { .. } => "Batch created",
        Show { .. } => "Objects retrieved successfully",
        ShowTypes => "Object types retrieved successfully",
        ShowMappingForPlatformAndType { .. } => "Mapping retrieved successfully",
        ShowPlatformsForType { .. } | ShowAllPlatforms => "Platforms retrieved successfully",
        ShowMappingsForPlatform { .. } => "Mappings for platform retrieved successfully",
        Sync { .. } | SyncAll { .. } => "Objects synchronized successfully",
        Define(_) => "Object defined successfully",
        Alter(_) => "Object altered successfully",
        Drop { .. } => "Object dropped successfully",
        DropMapping { .. } => "Platform's mappings dropped successfully",
        AddMapping(_) => "Mapping added successfully",
    }
}

/// Extract the platform statements carried by a catalog response.
///
/// Accepts an array of strings or of `{"definition": ...}` objects, or an
/// object holding such an array under `statements`. An object without
/// `statements` carries nothing to replay.
pub fn statements_from_response(command: &'static str, value: &Value) -> OpenDicResult<Vec<String>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(fields) => match fields.get("statements") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(OpenDicError::UnexpectedResponse {
                    command,
                    message: format!("'statements' must be an array, found {other}"),
                });
            }
            None => return Ok(vec![]),
        },
        Value::Null => return Ok(vec![]),
        other => {
            return Err(OpenDicError::UnexpectedResponse {
                command,
                message: format!("expected a list of statements, found {other}"),
            });
        }
    };

    items
        .iter()
        .map(|item| {
            StatementEntry::deserialize(item)
                .map(StatementEntry::into_sql)
                .map_err(|_| OpenDicError::UnexpectedResponse {
                    command,
                    message: format!("unexpected statement entry: {item}"),
                })
        })
        .collect()
}

/// Execute each statement on the host engine in order.
///
/// A failing statement is recorded and does not stop the remaining ones.
pub async fn dump_statements(host: &dyn HostEngine, statements: Vec<String>) -> ExecutionReport {
    let mut report = ExecutionReport::default();
    for sql in statements {
        match host.execute(&sql).await {
            Ok(_) => {
                debug!("Executed dumped statement: {sql}");
                report.push(Execution::executed(sql));
            }
            Err(e) => {
                warn!("Dumped statement failed: {e}");
                report.push(Execution::failed(sql, e));
            }
        }
    }
    report
}
