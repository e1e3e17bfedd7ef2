//! Conversion of parsed `OPEN` statements into typed catalog requests.
//!
//! All JSON islands are decoded here, before any network call is made, so a
//! malformed block never reaches the catalog service.

use std::collections::BTreeMap;

use itertools::Itertools;
use serde_json::{Map, Value};

use crate::error::{OpenDicError, OpenDicResult};
use crate::model::{
    CreatePlatformMappingRequest, CreateUdoRequest, DefineUdoRequest, PlatformMapping,
    PlatformMappingObjectDumpMapValue, Udo,
};
use crate::sql::{CreateModifiers, OpenDicStatement};

/// Type names accepted in `DEFINE OPEN <type> PROPS {...}`, compared
/// case-insensitively.
pub const DEFINE_TYPES: &[&str] = &[
    "string",
    "number",
    "int",
    "integer",
    "long",
    "float",
    "double",
    "decimal",
    "boolean",
    "bool",
    "list",
    "array",
    "map",
    "object",
    "date",
    "timestamp",
    "variant",
];

/// A fully validated request for the catalog service, one variant per command.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogRequest {
    CreateUdo {
        request: CreateUdoRequest,
        modifiers: CreateModifiers,
    },
    CreateBatch {
        object_type: String,
        objects: Vec<Udo>,
    },
    Show {
        object_type: String,
    },
    ShowTypes,
    ShowMappingForPlatformAndType {
        object_type: String,
        platform: String,
    },
    ShowPlatformsForType {
        object_type: String,
    },
    ShowAllPlatforms,
    ShowMappingsForPlatform {
        platform: String,
    },
    Sync {
        object_type: String,
        platform: String,
    },
    SyncAll {
        platform: String,
    },
    Define(DefineUdoRequest),
    Alter(CreateUdoRequest),
    Drop {
        object_type: String,
    },
    DropMapping {
        platform: String,
    },
    AddMapping(CreatePlatformMappingRequest),
}

impl CatalogRequest {
    /// Build the request for `statement`.
    ///
    /// `default_platform` is used by `SYNC OPEN <type>` without a `FOR` clause.
    pub fn try_new(statement: OpenDicStatement, default_platform: &str) -> OpenDicResult<Self> {
        let command = statement.command_name();
        let request = match statement {
            OpenDicStatement::CreateUdo {
                object_type,
                name,
                alias,
                props,
                modifiers,
            } => {
                let name = require(command, name, "object name")?;
                let props = props
                    .map(|raw| decode_object(command, "PROPS", &raw))
                    .transpose()?;
                CatalogRequest::CreateUdo {
                    request: CreateUdoRequest {
                        udo: Udo::new(object_type, name)
                            .with_alias(alias)
                            .with_props(props),
                    },
                    modifiers,
                }
            }
            OpenDicStatement::CreateBatch {
                object_type,
                objects,
                ..
            } => {
                let raw = require(command, objects, "OBJECTS block")?;
                let objects = expand_batch(&object_type, &raw)?;
                CatalogRequest::CreateBatch {
                    object_type,
                    objects,
                }
            }
            OpenDicStatement::Show { object_type } => CatalogRequest::Show { object_type },
            OpenDicStatement::ShowTypes => CatalogRequest::ShowTypes,
            OpenDicStatement::ShowMappingForPlatformAndType {
                object_type,
                platform,
            } => CatalogRequest::ShowMappingForPlatformAndType {
                object_type,
                platform: platform.to_lowercase(),
            },
            OpenDicStatement::ShowPlatformsForType { object_type } => {
                CatalogRequest::ShowPlatformsForType { object_type }
            }
            OpenDicStatement::ShowAllPlatforms => CatalogRequest::ShowAllPlatforms,
            OpenDicStatement::ShowMappingsForPlatform { platform } => {
                CatalogRequest::ShowMappingsForPlatform {
                    platform: platform.to_lowercase(),
                }
            }
            OpenDicStatement::Sync {
                object_type,
                platform,
            } => CatalogRequest::Sync {
                object_type,
                platform: platform.as_deref().unwrap_or(default_platform).to_lowercase(),
            },
            OpenDicStatement::SyncAll { platform } => CatalogRequest::SyncAll {
                platform: platform.to_lowercase(),
            },
            OpenDicStatement::Define { object_type, props } => {
                let raw = require(command, props, "PROPS block")?;
                CatalogRequest::Define(build_define(object_type, &raw)?)
            }
            OpenDicStatement::Alter {
                object_type,
                name,
                props,
            } => {
                let raw = require(command, props, "PROPS block")?;
                let props = decode_object(command, "PROPS", &raw)?;
                CatalogRequest::Alter(CreateUdoRequest {
                    udo: Udo::new(object_type, name).with_props(Some(props)),
                })
            }
            OpenDicStatement::Drop { object_type } => CatalogRequest::Drop { object_type },
            OpenDicStatement::DropMapping { platform } => CatalogRequest::DropMapping {
                platform: platform.to_lowercase(),
            },
            OpenDicStatement::AddMapping {
                object_type,
                platform,
                syntax,
                props,
            } => {
                let syntax = decode_syntax(&require(command, syntax, "SYNTAX block")?)?;
                let raw = require(command, props, "PROPS block")?;
                CatalogRequest::AddMapping(CreatePlatformMappingRequest {
                    platform_mapping: PlatformMapping {
                        type_name: object_type,
                        platform_name: platform.to_lowercase(),
                        syntax,
                        object_dump_map: decode_dump_map(&raw)?,
                    },
                })
            }
        };
        Ok(request)
    }
}

fn require<T>(command: &'static str, value: Option<T>, what: &str) -> OpenDicResult<T> {
    value.ok_or_else(|| OpenDicError::validation(command, format!("missing {what}")))
}

fn decode_island(block: &'static str, raw: &str) -> OpenDicResult<Value> {
    serde_json::from_str(raw)
        .map_err(|source| OpenDicError::InvalidPropertiesSyntax { block, source })
}

fn decode_object(
    command: &'static str,
    block: &'static str,
    raw: &str,
) -> OpenDicResult<Map<String, Value>> {
    match decode_island(block, raw)? {
        Value::Object(map) => Ok(map),
        other => Err(OpenDicError::validation(
            command,
            format!("{block} must be a JSON object, found {}", json_type(&other)),
        )),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Expand an `OBJECTS [...]` block into one UDO per element.
///
/// Each element needs a string `name`; an optional string `alias` is lifted
/// out and every other field becomes part of the object's props.
fn expand_batch(object_type: &str, raw: &str) -> OpenDicResult<Vec<Udo>> {
    const COMMAND: &str = "CreateBatch";

    let items = match decode_island("OBJECTS", raw)? {
        Value::Array(items) => items,
        other => {
            return Err(OpenDicError::validation(
                COMMAND,
                format!("OBJECTS must be a JSON array, found {}", json_type(&other)),
            ));
        }
    };
    if items.is_empty() {
        return Err(OpenDicError::validation(
            COMMAND,
            "OBJECTS must contain at least one object",
        ));
    }

    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            let Value::Object(mut fields) = item else {
                return Err(OpenDicError::validation(
                    COMMAND,
                    format!("OBJECTS[{idx}] must be a JSON object"),
                ));
            };
            let name = match fields.remove("name") {
                Some(Value::String(name)) => name,
                _ => {
                    return Err(OpenDicError::validation(
                        COMMAND,
                        format!("OBJECTS[{idx}] requires a string 'name'"),
                    ));
                }
            };
            let alias = match fields.remove("alias") {
                None | Some(Value::Null) => None,
                Some(Value::String(alias)) => Some(alias),
                Some(_) => {
                    return Err(OpenDicError::validation(
                        COMMAND,
                        format!("OBJECTS[{idx}] 'alias' must be a string"),
                    ));
                }
            };
            let props = (!fields.is_empty()).then_some(fields);
            Ok(Udo::new(object_type, name)
                .with_alias(alias)
                .with_props(props))
        })
        .collect()
}

fn build_define(object_type: String, raw: &str) -> OpenDicResult<DefineUdoRequest> {
    let props = decode_object("Define", "PROPS", raw)?;
    let mut properties = BTreeMap::new();
    for (key, value) in props {
        match value {
            Value::String(type_name) if is_define_type(&type_name) => {
                properties.insert(key, type_name);
            }
            Value::String(type_name) => return Err(invalid_define_type(key, type_name)),
            other => return Err(invalid_define_type(key, other.to_string())),
        }
    }
    Ok(DefineUdoRequest {
        udo_type: object_type,
        properties,
    })
}

fn is_define_type(type_name: &str) -> bool {
    DEFINE_TYPES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(type_name))
}

fn invalid_define_type(key: String, value: String) -> OpenDicError {
    OpenDicError::InvalidDefineType {
        key,
        value,
        allowed: DEFINE_TYPES.iter().join(", "),
    }
}

/// Extract the statement template of a `SYNTAX` block.
///
/// Accepts a JSON string, a single-entry set such as `{ "CREATE ..." }` (not
/// valid JSON on its own), or a JSON object or array holding a single string.
fn decode_syntax(raw: &str) -> OpenDicResult<String> {
    const COMMAND: &str = "AddMapping";

    let raw = raw.trim();
    let value = match serde_json::from_str::<Value>(raw) {
        Ok(value) => value,
        Err(source) => {
            let Some(inner) = raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) else {
                return Err(OpenDicError::InvalidPropertiesSyntax {
                    block: "SYNTAX",
                    source,
                });
            };
            return serde_json::from_str::<String>(inner.trim()).map_err(|source| {
                OpenDicError::InvalidPropertiesSyntax {
                    block: "SYNTAX",
                    source,
                }
            });
        }
    };

    let single = match value {
        Value::String(syntax) => return Ok(syntax),
        Value::Object(map) if map.len() == 1 => map.into_iter().next().map(|(_, v)| v),
        Value::Array(items) if items.len() == 1 => items.into_iter().next(),
        _ => None,
    };
    match single {
        Some(Value::String(syntax)) => Ok(syntax),
        _ => Err(OpenDicError::validation(
            COMMAND,
            "SYNTAX must be a JSON string or a block holding a single string",
        )),
    }
}

fn decode_dump_map(
    raw: &str,
) -> OpenDicResult<BTreeMap<String, PlatformMappingObjectDumpMapValue>> {
    const COMMAND: &str = "AddMapping";

    let props = decode_object(COMMAND, "PROPS", raw)?;
    let mut dump_map = BTreeMap::new();
    for (key, value) in props {
        let entry = serde_json::from_value(value).map_err(|e| {
            OpenDicError::validation(COMMAND, format!("invalid mapping for '{key}': {e}"))
        })?;
        dump_map.insert(key, entry);
    }
    Ok(dump_map)
}
