//! Request and response payloads exchanged with the open catalog service.
//!
//! Field names follow the catalog's REST schema (camelCase where the service
//! expects it). Optional fields are always serialized, as `null` when absent,
//! so request bodies have a stable shape.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use datafusion::arrow::array::{RecordBatch, StringArray};
use datafusion::arrow::datatypes::{DataType, Field, Schema};
use datafusion::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A user defined object as stored by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Udo {
    #[serde(rename = "type")]
    pub object_type: String,
    pub name: String,
    pub alias: Option<String>,
    pub props: Option<Map<String, Value>>,
}

impl Udo {
    pub fn new(object_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            name: name.into(),
            alias: None,
            props: None,
        }
    }

    pub fn with_alias(mut self, alias: Option<String>) -> Self {
        self.alias = alias;
        self
    }

    pub fn with_props(mut self, props: Option<Map<String, Value>>) -> Self {
        self.props = props;
        self
    }
}

/// Body of `POST /objects/{type}` and `PUT /objects/{type}/{name}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateUdoRequest {
    pub udo: Udo,
}

/// Body of `POST /objects`: declares the property schema of an object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefineUdoRequest {
    pub udo_type: String,
    /// Property name to declared type name.
    pub properties: BTreeMap<String, String>,
}

/// How a single UDO property is rendered into a platform statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformMappingObjectDumpMapValue {
    pub prop_type: String,
    pub format: String,
    pub delimiter: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformMapping {
    pub type_name: String,
    pub platform_name: String,
    /// Statement template with `{field}` placeholders.
    pub syntax: String,
    pub object_dump_map: BTreeMap<String, PlatformMappingObjectDumpMapValue>,
}

/// Body of `POST /objects/{type}/platforms/{platform}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlatformMappingRequest {
    pub platform_mapping: PlatformMapping,
}

/// A platform statement returned by the catalog for replay on the host engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformStatement {
    pub definition: String,
}

/// Entry of a statement list: either bare SQL text or a [`PlatformStatement`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StatementEntry {
    Sql(String),
    Definition(PlatformStatement),
}

impl StatementEntry {
    pub fn into_sql(self) -> String {
        match self {
            StatementEntry::Sql(sql) => sql,
            StatementEntry::Definition(statement) => statement.definition,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Executed,
    Failed,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStatus::Executed => write!(f, "executed"),
            ExecutionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of replaying one statement on the host engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub sql: String,
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Execution {
    pub fn executed(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            status: ExecutionStatus::Executed,
            error: None,
        }
    }

    pub fn failed(sql: impl Into<String>, error: impl ToString) -> Self {
        Self {
            sql: sql.into(),
            status: ExecutionStatus::Failed,
            error: Some(error.to_string()),
        }
    }
}

/// Ordered per-statement results of a dump.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionReport(pub Vec<Execution>);

impl ExecutionReport {
    pub fn push(&mut self, execution: Execution) {
        self.0.push(execution);
    }

    pub fn executions(&self) -> &[Execution] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.0
            .iter()
            .filter(|e| e.status == ExecutionStatus::Failed)
            .count()
    }

    /// One row per statement with columns `sql`, `status` and `error`.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("sql", DataType::Utf8, false),
            Field::new("status", DataType::Utf8, false),
            Field::new("error", DataType::Utf8, true),
        ]));
        let sql: Vec<_> = self.0.iter().map(|e| e.sql.as_str()).collect();
        let status: Vec<_> = self.0.iter().map(|e| e.status.to_string()).collect();
        let error: Vec<_> = self.0.iter().map(|e| e.error.as_deref()).collect();
        Ok(RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(sql)),
                Arc::new(StringArray::from(status)),
                Arc::new(StringArray::from(error)),
            ],
        )?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn absent_udo_fields_serialize_as_null() {
        let request = CreateUdoRequest {
            udo: Udo::new("function", "f"),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"udo": {"type": "function", "name": "f", "alias": null, "props": null}})
        );
    }

    #[test]
    fn statement_entries_accept_text_and_definitions() {
        let entries: Vec<StatementEntry> = serde_json::from_value(json!([
            "SELECT 1",
            {"definition": "SELECT 2", "platform": "spark"}
        ]))
        .unwrap();
        assert_eq!(
            entries.into_iter().map(StatementEntry::into_sql).collect::<Vec<_>>(),
            vec!["SELECT 1", "SELECT 2"]
        );
        assert!(serde_json::from_value::<StatementEntry>(json!({"sql": "SELECT 1"})).is_err());
    }

    #[test]
    fn platform_mapping_uses_camel_case() {
        let mut dump_map = BTreeMap::new();
        dump_map.insert(
            "def".to_string(),
            PlatformMappingObjectDumpMapValue {
                prop_type: "string".to_string(),
                format: "<value>".to_string(),
                delimiter: String::new(),
            },
        );
        let request = CreatePlatformMappingRequest {
            platform_mapping: PlatformMapping {
                type_name: "function".to_string(),
                platform_name: "spark".to_string(),
                syntax: "CREATE FUNCTION {name} AS {def}".to_string(),
                object_dump_map: dump_map,
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["platformMapping"]["typeName"], "function");
        assert_eq!(value["platformMapping"]["platformName"], "spark");
        assert_eq!(
            value["platformMapping"]["objectDumpMap"]["def"]["propType"],
            "string"
        );
    }

    #[test]
    fn report_renders_one_row_per_statement() {
        let mut report = ExecutionReport::default();
        report.push(Execution::executed("SELECT 1"));
        report.push(Execution::failed("SELEC 2", "syntax error"));

        assert_eq!(report.failed_count(), 1);
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!([
                {"sql": "SELECT 1", "status": "executed"},
                {"sql": "SELEC 2", "status": "failed", "error": "syntax error"}
            ])
        );

        let batch = report.to_record_batch().unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 3);
    }
}
