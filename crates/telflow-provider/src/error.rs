//! Reconciliation error types

use crate::client::{ApiError, ApiErrorKind};
use crate::kind::ResourceKind;
use crate::store::FieldError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    /// Declared input rejected before any remote call
    #[error("Invalid {kind} configuration: {message}")]
    Validation {
        kind: ResourceKind,
        message: String,
    },

    /// Remote call failed
    #[error("Failed to {operation} {kind}{}: {source}", fmt_id(.id))]
    Remote {
        kind: ResourceKind,
        id: Option<String>,
        operation: &'static str,
        #[source]
        source: ApiError,
    },

    /// Attach/detach between a phone number and a messaging service failed
    #[error(
        "Failed to {action} phone number {phone_number_sid} (messaging service {service_sid}): {source}"
    )]
    Association {
        action: &'static str,
        service_sid: String,
        phone_number_sid: String,
        #[source]
        source: ApiError,
    },

    /// The record refers to a remote object that no longer exists
    #[error("{kind} {id} no longer exists remotely: {source}")]
    RemoteObjectMissing {
        kind: ResourceKind,
        id: String,
        #[source]
        source: ApiError,
    },

    #[error("{message}")]
    NotFound {
        kind: ResourceKind,
        message: String,
    },

    #[error("{message}")]
    Ambiguous {
        kind: ResourceKind,
        message: String,
    },

    /// Decoding a remote response into the record failed
    #[error("Failed to map {kind}{} attribute '{field}': {message}", fmt_id(.id))]
    Mapping {
        kind: ResourceKind,
        id: Option<String>,
        field: String,
        message: String,
    },

    #[error("{operation} is not supported for {kind}")]
    Unsupported {
        kind: ResourceKind,
        operation: &'static str,
    },
}

fn fmt_id(id: &Option<String>) -> String {
    match id {
        Some(id) if !id.is_empty() => format!(" {}", id),
        _ => String::new(),
    }
}

impl ProviderError {
    pub fn validation(kind: ResourceKind, message: impl Into<String>) -> Self {
        ProviderError::Validation {
            kind,
            message: message.into(),
        }
    }

    pub fn remote(
        kind: ResourceKind,
        id: Option<&str>,
        operation: &'static str,
        source: ApiError,
    ) -> Self {
        ProviderError::Remote {
            kind,
            id: id.map(str::to_string),
            operation,
            source,
        }
    }

    pub fn mapping(kind: ResourceKind, id: Option<&str>, err: FieldError) -> Self {
        ProviderError::Mapping {
            kind,
            id: id.map(str::to_string),
            field: err.field,
            message: err.message,
        }
    }

    pub fn unsupported(kind: ResourceKind, operation: &'static str) -> Self {
        ProviderError::Unsupported { kind, operation }
    }

    /// Resource kind the error is about, when there is one
    pub fn kind(&self) -> Option<ResourceKind> {
        match self {
            ProviderError::Validation { kind, .. }
            | ProviderError::Remote { kind, .. }
            | ProviderError::RemoteObjectMissing { kind, .. }
            | ProviderError::NotFound { kind, .. }
            | ProviderError::Ambiguous { kind, .. }
            | ProviderError::Mapping { kind, .. }
            | ProviderError::Unsupported { kind, .. } => Some(*kind),
            ProviderError::Association { .. } => None,
        }
    }

    /// Remote error kind underneath, if the failure came from the API
    pub fn api_error_kind(&self) -> Option<ApiErrorKind> {
        match self {
            ProviderError::Remote { source, .. }
            | ProviderError::Association { source, .. }
            | ProviderError::RemoteObjectMissing { source, .. } => Some(source.kind),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;
