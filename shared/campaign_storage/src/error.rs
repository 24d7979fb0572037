//! Error types for campaign storage operations

use thiserror::Error;

use crate::store::StoreError;

/// Result type alias for campaign storage operations
pub type CampaignStorageResult<T> = Result<T, CampaignStorageError>;

/// Error types surfaced by the campaign storage services
#[derive(Debug, Error)]
pub enum CampaignStorageError {
    /// The backing store failed or rejected the request
    #[error("{context}: {source}")]
    BackendUnavailable {
        /// Entity-specific message prefix, e.g. `Error fetching actions`
        context: String,
        /// Underlying store error
        #[source]
        source: StoreError,
    },

    /// A pagination cursor could not be decoded into a resume position
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    /// A filter clause is malformed or names an unknown field
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// A record or request payload has the wrong shape
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The requested record or list value does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The record changed between read and conditional write
    #[error("Conflicting update: {0}")]
    Conflict(String),

    /// Failed to convert a stored item
    #[error("Failed to parse record: {0}")]
    SerializationError(String),
}

impl CampaignStorageError {
    /// Wraps a store error with an entity-specific message prefix
    #[must_use]
    pub fn backend(context: impl Into<String>, source: StoreError) -> Self {
        Self::BackendUnavailable {
            context: context.into(),
            source,
        }
    }

    /// Checks if this error was caused by an upstream (5xx) store failure
    #[must_use]
    pub fn is_upstream_error(&self) -> bool {
        match self {
            Self::BackendUnavailable { source, .. } => source.is_upstream_error(),
            _ => false,
        }
    }
}

impl From<serde_dynamo::Error> for CampaignStorageError {
    fn from(err: serde_dynamo::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
