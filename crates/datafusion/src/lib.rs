//! `OPEN` statement dialect for DataFusion sessions.
//!
//! Statements such as `CREATE OPEN function f PROPS {...}` or
//! `SYNC OPEN function FOR spark` are sent to an open catalog service that
//! manages user defined objects and their platform mappings. Platform
//! statements returned by the catalog are replayed on the session, and any
//! other SQL runs on DataFusion unchanged.

pub mod catalog;
pub mod client;
pub mod config;
mod context;
pub mod error;
pub mod host;
pub mod model;
pub mod request;
pub mod response;
pub mod sql;

pub use catalog::{OpenDicCatalog, SqlOutcome};
pub use client::{CatalogClient, ClientError, RestCatalogClient, RestCatalogConfig};
pub use config::OpenDicConfig;
pub use context::OpenDicContextExt;
pub use error::{ErrorKind, OpenDicError, OpenDicResult};
pub use host::HostEngine;
pub use response::OpenDicResponse;
