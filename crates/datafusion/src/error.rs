use datafusion::error::DataFusionError;
use serde::Serialize;

use crate::client::ClientError;

pub type OpenDicResult<T, E = OpenDicError> = std::result::Result<T, E>;

/// Failure of a single statement passed to the interpreter.
#[derive(Debug, thiserror::Error)]
pub enum OpenDicError {
    #[error("Invalid JSON syntax in {block}: {source}")]
    InvalidPropertiesSyntax {
        block: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid data type '{value}' for property '{key}'. Allowed types: {allowed}")]
    InvalidDefineType {
        key: String,
        value: String,
        allowed: String,
    },

    #[error("{command} validation error: {message}")]
    Validation {
        command: &'static str,
        message: String,
    },

    #[error("{command} request failed: {source}")]
    Transport {
        command: &'static str,
        #[source]
        source: ClientError,
    },

    /// The object was created but reading back its platform statements failed.
    #[error("Object created, but the follow-up read {route} failed: {source}")]
    CreateFollowUp {
        route: String,
        /// Response of the create call.
        response: serde_json::Value,
        #[source]
        source: ClientError,
    },

    #[error("Unexpected {command} response: {message}")]
    UnexpectedResponse {
        command: &'static str,
        message: String,
    },

    #[error(transparent)]
    Host(#[from] DataFusionError),
}

impl OpenDicError {
    pub(crate) fn validation(command: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            command,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            OpenDicError::InvalidPropertiesSyntax { .. } => ErrorKind::InvalidPropertiesSyntax,
            OpenDicError::InvalidDefineType { .. } => ErrorKind::InvalidDefineType,
            OpenDicError::Validation { .. } => ErrorKind::ValidationError,
            OpenDicError::Transport { .. } | OpenDicError::CreateFollowUp { .. } => {
                ErrorKind::TransportError
            }
            OpenDicError::UnexpectedResponse { .. } => ErrorKind::UnexpectedResponse,
            OpenDicError::Host(_) => ErrorKind::HostError,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    InvalidPropertiesSyntax,
    InvalidDefineType,
    ValidationError,
    TransportError,
    UnexpectedResponse,
    HostError,
}
